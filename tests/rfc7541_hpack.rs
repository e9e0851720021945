//! RFC 7541 HPACK compliance tests.
//!
//! https://www.rfc-editor.org/rfc/rfc7541
//!
//! Exercises the encoder and decoder against the Appendix C examples and
//! the table-management edge cases.

use h2core::{HpackDecoder, HpackEncoder, HpackError};

fn fields(pairs: &[(&[u8], &[u8])]) -> Vec<(Vec<u8>, Vec<u8>)> {
    pairs
        .iter()
        .map(|&(n, v)| (n.to_vec(), v.to_vec()))
        .collect()
}

#[test]
fn test_rfc_c3_request_sequence_without_huffman() {
    // Appendix C.3: three requests on one connection, literal strings.
    let mut decoder = HpackDecoder::new();

    // C.3.1
    let block = [
        0x82, 0x86, 0x84, 0x41, 0x0f, 0x77, 0x77, 0x77, 0x2e, 0x65, 0x78, 0x61, 0x6d, 0x70,
        0x6c, 0x65, 0x2e, 0x63, 0x6f, 0x6d,
    ];
    assert_eq!(
        decoder.decode(&block).unwrap(),
        fields(&[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
        ])
    );
    assert_eq!(decoder.dynamic_table_size(), 57);

    // C.3.2: :authority now at index 62.
    let block = [
        0x82, 0x86, 0x84, 0xbe, 0x58, 0x08, 0x6e, 0x6f, 0x2d, 0x63, 0x61, 0x63, 0x68, 0x65,
    ];
    assert_eq!(
        decoder.decode(&block).unwrap(),
        fields(&[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
            (b"cache-control", b"no-cache"),
        ])
    );
    assert_eq!(decoder.dynamic_table_size(), 110);

    // C.3.3: cache-control at 62, :authority at 63.
    let block = [
        0x82, 0x87, 0x85, 0xbf, 0x40, 0x0a, 0x63, 0x75, 0x73, 0x74, 0x6f, 0x6d, 0x2d, 0x6b,
        0x65, 0x79, 0x0c, 0x63, 0x75, 0x73, 0x74, 0x6f, 0x6d, 0x2d, 0x76, 0x61, 0x6c, 0x75,
        0x65,
    ];
    assert_eq!(
        decoder.decode(&block).unwrap(),
        fields(&[
            (b":method", b"GET"),
            (b":scheme", b"https"),
            (b":path", b"/index.html"),
            (b":authority", b"www.example.com"),
            (b"custom-key", b"custom-value"),
        ])
    );
    assert_eq!(decoder.dynamic_table_size(), 164);
}

#[test]
fn test_rfc_c4_request_sequence_with_huffman() {
    // Appendix C.4: the C.3 requests with Huffman-coded literals. Our
    // encoder always Huffman-codes, so these are byte-exact both ways.
    let mut encoder = HpackEncoder::new();
    let mut decoder = HpackDecoder::new();

    let expected_blocks: [&[u8]; 3] = [
        &[
            0x82, 0x86, 0x84, 0x41, 0x8c, 0xf1, 0xe3, 0xc2, 0xe5, 0xf2, 0x3a, 0x6b, 0xa0, 0xab,
            0x90, 0xf4, 0xff,
        ],
        &[0x82, 0x86, 0x84, 0xbe, 0x58, 0x86, 0xa8, 0xeb, 0x10, 0x64, 0x9c, 0xbf],
        &[
            0x82, 0x87, 0x85, 0xbf, 0x40, 0x88, 0x25, 0xa8, 0x49, 0xe9, 0x5b, 0xa9, 0x7d, 0x7f,
            0x89, 0x25, 0xa8, 0x49, 0xe9, 0x5b, 0xb8, 0xe8, 0xb4, 0xbf,
        ],
    ];
    let requests: [&[(&[u8], &[u8])]; 3] = [
        &[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
        ],
        &[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
            (b"cache-control", b"no-cache"),
        ],
        &[
            (b":method", b"GET"),
            (b":scheme", b"https"),
            (b":path", b"/index.html"),
            (b":authority", b"www.example.com"),
            (b"custom-key", b"custom-value"),
        ],
    ];

    for (request, expected) in requests.iter().zip(expected_blocks) {
        let block = encoder.encode(request);
        assert_eq!(block, expected);
        assert_eq!(decoder.decode(&block).unwrap(), fields(request));
    }
    assert_eq!(encoder.dynamic_table_size(), 164);
    assert_eq!(decoder.dynamic_table_size(), 164);
}

#[test]
fn test_rfc_c5_response_sequence_with_eviction() {
    // Appendix C.5: responses against a 256-byte dynamic table, literal
    // strings. The third response evicts all but its own insertions.
    let mut decoder = HpackDecoder::new();
    decoder.set_max_table_size(256);

    let block = [
        0x48, 0x03, 0x33, 0x30, 0x32, 0x58, 0x07, 0x70, 0x72, 0x69, 0x76, 0x61, 0x74, 0x65,
        0x61, 0x1d, 0x4d, 0x6f, 0x6e, 0x2c, 0x20, 0x32, 0x31, 0x20, 0x4f, 0x63, 0x74, 0x20,
        0x32, 0x30, 0x31, 0x33, 0x20, 0x32, 0x30, 0x3a, 0x31, 0x33, 0x3a, 0x32, 0x31, 0x20,
        0x47, 0x4d, 0x54, 0x6e, 0x17, 0x68, 0x74, 0x74, 0x70, 0x73, 0x3a, 0x2f, 0x2f, 0x77,
        0x77, 0x77, 0x2e, 0x65, 0x78, 0x61, 0x6d, 0x70, 0x6c, 0x65, 0x2e, 0x63, 0x6f, 0x6d,
    ];
    assert_eq!(
        decoder.decode(&block).unwrap(),
        fields(&[
            (b":status", b"302"),
            (b"cache-control", b"private"),
            (b"date", b"Mon, 21 Oct 2013 20:13:21 GMT"),
            (b"location", b"https://www.example.com"),
        ])
    );
    assert_eq!(decoder.dynamic_table_size(), 222);

    // C.5.2: ":status: 307" evicts ":status: 302".
    let block = [0x48, 0x03, 0x33, 0x30, 0x37, 0xc1, 0xc0, 0xbf];
    assert_eq!(
        decoder.decode(&block).unwrap(),
        fields(&[
            (b":status", b"307"),
            (b"cache-control", b"private"),
            (b"date", b"Mon, 21 Oct 2013 20:13:21 GMT"),
            (b"location", b"https://www.example.com"),
        ])
    );
    assert_eq!(decoder.dynamic_table_size(), 222);
}

#[test]
fn test_encoder_strategies() {
    let mut encoder = HpackEncoder::new();

    // Exact static match: single indexed byte.
    assert_eq!(encoder.encode(&[(b":method", b"GET")]), [0x82]);

    // Name-only static match: literal with incremental indexing.
    let block = encoder.encode(&[(b":status", b"999")]);
    assert_eq!(block[0], 0x48);

    // The literal was inserted, so repeating it yields one indexed byte.
    assert_eq!(encoder.encode(&[(b":status", b"999")]), [0xbe]);
}

#[test]
fn test_sensitive_headers_bypass_the_table() {
    let mut encoder = HpackEncoder::new();
    encoder.append_never_indexed(b"authorization", b"Bearer s3cr3t");
    let block = encoder.take_block();
    assert_eq!(block[0] & 0xf0, 0x10);

    let mut decoder = HpackDecoder::new();
    let decoded = decoder.decode(&block).unwrap();
    assert_eq!(decoded, fields(&[(b"authorization", b"Bearer s3cr3t")]));
    assert_eq!(decoder.dynamic_table_size(), 0);
}

#[test]
fn test_table_size_update_round_trip() {
    let mut encoder = HpackEncoder::new();
    let mut decoder = HpackDecoder::new();

    decoder.decode(&encoder.encode(&[(b"x-a", b"1"), (b"x-b", b"2")])).unwrap();
    assert!(decoder.dynamic_table_size() > 0);

    encoder.set_max_dynamic_table_size(0, true);
    encoder.set_max_dynamic_table_size(4096, true);
    encoder.append(b"x-c", b"3");
    let block = encoder.take_block();

    // Shrinking to zero then growing again leaves exactly the new entry.
    let decoded = decoder.decode(&block).unwrap();
    assert_eq!(decoded, fields(&[(b"x-c", b"3")]));
    assert_eq!(decoder.dynamic_table_size(), 3 + 1 + 32);
    assert_eq!(encoder.dynamic_table_size(), decoder.dynamic_table_size());
}

#[test]
fn test_decoder_error_cases() {
    // Index 0.
    assert_eq!(
        HpackDecoder::new().decode(&[0x80]),
        Err(HpackError::InvalidIndexedHeader(0))
    );
    // Beyond the table.
    assert_eq!(
        HpackDecoder::new().decode(&[0xff, 0x00]),
        Err(HpackError::IndexOutOfRange { index: 127, length: 61 })
    );
    // Static entry with empty value cannot be emitted as an indexed field.
    assert_eq!(
        HpackDecoder::new().decode(&[0x81]),
        Err(HpackError::IndexedHeaderWithNoValue(1))
    );
    // String literal runs past the block.
    assert_eq!(
        HpackDecoder::new().decode(&[0x40, 0x7f]),
        Err(HpackError::TruncatedBlock)
    );
    // Huffman-flagged literal with a bad code.
    assert_eq!(
        HpackDecoder::new().decode(&[0x40, 0x81, 0x00, 0x01, b'x']),
        Err(HpackError::InvalidHuffmanEncoding)
    );
}

#[test]
fn test_large_header_lists_round_trip() {
    let mut encoder = HpackEncoder::new();
    let mut decoder = HpackDecoder::new();

    for round in 0..8 {
        let owned: Vec<(Vec<u8>, Vec<u8>)> = (0..32)
            .map(|i| {
                (
                    format!("x-header-{i}").into_bytes(),
                    format!("value-{round}-{i}").into_bytes(),
                )
            })
            .collect();
        let list: Vec<(&[u8], &[u8])> = owned
            .iter()
            .map(|(n, v)| (n.as_slice(), v.as_slice()))
            .collect();

        let block = encoder.encode(&list);
        assert_eq!(decoder.decode(&block).unwrap(), owned);
        assert_eq!(encoder.dynamic_table_size(), decoder.dynamic_table_size());
    }
}
