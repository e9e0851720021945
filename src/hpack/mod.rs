//! HPACK header compression (RFC 7541).
//!
//! Encoder and decoder with a shared table model: the immutable static
//! table, a byte-budgeted dynamic table, and the combined index space the
//! wire format addresses.

mod decoder;
mod dynamic_table;
mod encoder;
mod error;
mod huffman;
mod integer;
mod static_table;
mod table;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::HpackError;
pub use huffman::{decode as huffman_decode, encoded_len as huffman_encoded_len, HuffmanEncoder};
pub use table::HeaderTable;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let mut encoder = Encoder::new();
        let block = encoder.encode(&[
            (b":method", b"GET"),
            (b":scheme", b"https"),
            (b":path", b"/index.html"),
            (b":authority", b"www.example.com"),
            (b"user-agent", b"h2core-test/1.0"),
        ]);

        let fields = Decoder::new().decode(&block).unwrap();
        assert_eq!(
            fields,
            [
                (b":method".to_vec(), b"GET".to_vec()),
                (b":scheme".to_vec(), b"https".to_vec()),
                (b":path".to_vec(), b"/index.html".to_vec()),
                (b":authority".to_vec(), b"www.example.com".to_vec()),
                (b"user-agent".to_vec(), b"h2core-test/1.0".to_vec()),
            ]
        );
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let mut encoder = Encoder::new();
        let block = encoder.encode(&[
            (b"set-cookie", b"a=1"),
            (b"set-cookie", b"b=2"),
            (b"set-cookie", b"a=1"),
        ]);

        let fields = Decoder::new().decode(&block).unwrap();
        assert_eq!(
            fields,
            [
                (b"set-cookie".to_vec(), b"a=1".to_vec()),
                (b"set-cookie".to_vec(), b"b=2".to_vec()),
                (b"set-cookie".to_vec(), b"a=1".to_vec()),
            ]
        );
    }

    #[test]
    fn test_tables_stay_synchronized_across_blocks() {
        let mut encoder = Encoder::new();
        let mut decoder = Decoder::new();

        for path in [&b"/a"[..], b"/b", b"/a", b"/c", b"/b"] {
            let block = encoder.encode(&[
                (b":method", b"GET"),
                (b":path", path),
                (b"x-request-id", b"0001"),
            ]);
            let fields = decoder.decode(&block).unwrap();
            assert_eq!(fields[1].1, path);
            assert_eq!(decoder.dynamic_table_size(), encoder.dynamic_table_size());
        }
    }

    #[test]
    fn test_size_update_travels_in_band() {
        let mut encoder = Encoder::new();
        let mut decoder = Decoder::new();

        let block = encoder.encode(&[(b"x-first", b"1")]);
        decoder.decode(&block).unwrap();
        assert!(decoder.dynamic_table_size() > 0);

        encoder.set_max_dynamic_table_size(0, true);
        encoder.append(b":method", b"GET");
        let block = encoder.take_block();

        let fields = decoder.decode(&block).unwrap();
        assert_eq!(fields, [(b":method".to_vec(), b"GET".to_vec())]);
        assert_eq!(decoder.dynamic_table_size(), 0);
    }
}
