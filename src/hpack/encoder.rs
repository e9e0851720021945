//! HPACK encoder (RFC 7541).
//!
//! The encoder keeps its own dynamic table as a mirror of the peer
//! decoder's, so the two stay synchronized as long as blocks are delivered
//! in emit order. String literals are always Huffman-coded.

use super::huffman::HuffmanEncoder;
use super::integer::encode_integer;
use super::table::HeaderTable;

/// Initial capacity of the output buffer.
const OUTPUT_BUF_SIZE: usize = 128;

pub struct Encoder {
    table: HeaderTable,
    huffman: HuffmanEncoder,
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_table_size(super::table::DEFAULT_TABLE_SIZE)
    }

    pub fn with_table_size(max_size: usize) -> Self {
        Self {
            table: HeaderTable::with_max_size(max_size),
            huffman: HuffmanEncoder::new(),
            buf: Vec::with_capacity(OUTPUT_BUF_SIZE),
        }
    }

    pub fn dynamic_table_size(&self) -> usize {
        self.table.dynamic_size()
    }

    /// Append a header field, choosing the most compact representation:
    /// a full indexed field when the table holds an exact match, otherwise a
    /// literal with incremental indexing (indexed name when available).
    /// The field is inserted into the dynamic table on the literal paths.
    pub fn append(&mut self, name: &[u8], value: &[u8]) {
        match self.table.first_match(name, value) {
            Some((index, true)) => {
                encode_integer(index as u64, 7, 0x80, &mut self.buf);
            }
            Some((index, false)) => {
                encode_integer(index as u64, 6, 0x40, &mut self.buf);
                self.string_literal(value);
                self.table.insert(name.to_vec(), value.to_vec());
            }
            None => {
                self.buf.push(0x40);
                self.string_literal(name);
                self.string_literal(value);
                self.table.insert(name.to_vec(), value.to_vec());
            }
        }
    }

    /// Append a header field as a literal without indexing (RFC 7541
    /// Section 6.2.2). The dynamic table is left untouched.
    pub fn append_non_indexed(&mut self, name: &[u8], value: &[u8]) {
        self.literal_without_insert(name, value, 0x00);
    }

    /// Append a header field as never indexed (RFC 7541 Section 6.2.3),
    /// instructing intermediaries not to compress it either.
    pub fn append_never_indexed(&mut self, name: &[u8], value: &[u8]) {
        self.literal_without_insert(name, value, 0x10);
    }

    /// Resize the local dynamic table, optionally emitting the size-update
    /// representation into the current block so the peer follows.
    pub fn set_max_dynamic_table_size(&mut self, max_size: usize, send_update: bool) {
        self.table.set_max_dynamic_size(max_size);
        if send_update {
            encode_integer(max_size as u64, 5, 0x20, &mut self.buf);
        }
    }

    /// Discard any buffered output. Dynamic table state persists; HPACK
    /// requires it to survive across header blocks.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Current encoded block.
    pub fn block(&self) -> &[u8] {
        &self.buf
    }

    /// Take the encoded block, leaving the encoder ready for the next one.
    pub fn take_block(&mut self) -> Vec<u8> {
        std::mem::replace(&mut self.buf, Vec::with_capacity(OUTPUT_BUF_SIZE))
    }

    /// Encode a whole field list as one block.
    pub fn encode(&mut self, fields: &[(&[u8], &[u8])]) -> Vec<u8> {
        self.reset();
        for &(name, value) in fields {
            self.append(name, value);
        }
        self.take_block()
    }

    fn literal_without_insert(&mut self, name: &[u8], value: &[u8], tag: u8) {
        // Only a name index is usable here; an exact match still cannot be
        // emitted as an indexed field under these representations.
        match self.table.first_match(name, value) {
            Some((index, _)) => {
                encode_integer(index as u64, 4, tag, &mut self.buf);
            }
            None => {
                self.buf.push(tag);
                self.string_literal(name);
            }
        }
        self.string_literal(value);
    }

    /// Emit a string literal, Huffman-coded with the H bit set.
    fn string_literal(&mut self, data: &[u8]) {
        let encoded = self.huffman.encode(data);
        encode_integer(encoded.len() as u64, 7, 0x80, &mut self.buf);
        self.buf.extend_from_slice(encoded);
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_static_field() {
        let mut encoder = Encoder::new();
        assert_eq!(encoder.encode(&[(b":method", b"GET")]), [0x82]);
    }

    #[test]
    fn test_rfc_c4_1_request_with_huffman() {
        // RFC 7541 Appendix C.4.1, byte-exact.
        let mut encoder = Encoder::new();
        let block = encoder.encode(&[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
        ]);
        assert_eq!(
            block,
            [
                0x82, 0x86, 0x84, 0x41, 0x8c, 0xf1, 0xe3, 0xc2, 0xe5, 0xf2, 0x3a, 0x6b, 0xa0,
                0xab, 0x90, 0xf4, 0xff
            ]
        );
        assert_eq!(encoder.dynamic_table_size(), 57);
    }

    #[test]
    fn test_rfc_c4_2_second_request_uses_dynamic_index() {
        let mut encoder = Encoder::new();
        encoder.encode(&[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
        ]);
        let block = encoder.encode(&[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
            (b"cache-control", b"no-cache"),
        ]);
        assert_eq!(
            block,
            [0x82, 0x86, 0x84, 0xbe, 0x58, 0x86, 0xa8, 0xeb, 0x10, 0x64, 0x9c, 0xbf]
        );
    }

    #[test]
    fn test_new_name_literal_prefix() {
        let mut encoder = Encoder::new();
        let block = encoder.encode(&[(b"x-custom", b"v")]);
        // Literal with incremental indexing, name index 0.
        assert_eq!(block[0], 0x40);
        assert_eq!(encoder.table.dynamic_len(), 1);
    }

    #[test]
    fn test_non_indexed_leaves_table_alone() {
        let mut encoder = Encoder::new();
        encoder.append_non_indexed(b":path", b"/secret");
        let block = encoder.take_block();
        // 4-bit prefix with static name index 4.
        assert_eq!(block[0], 0x04);
        assert_eq!(encoder.table.dynamic_len(), 0);
    }

    #[test]
    fn test_never_indexed_prefix() {
        let mut encoder = Encoder::new();
        encoder.append_never_indexed(b"authorization", b"token");
        let block = encoder.take_block();
        // 0001xxxx; static name index 23 overflows the 4-bit prefix.
        assert_eq!(&block[..2], [0x1f, 0x08]);
        assert_eq!(encoder.table.dynamic_len(), 0);
    }

    #[test]
    fn test_size_update_emitted_inline() {
        let mut encoder = Encoder::new();
        encoder.set_max_dynamic_table_size(0, true);
        encoder.append(b":method", b"GET");
        let block = encoder.take_block();
        assert_eq!(block, [0x20, 0x82]);
        assert_eq!(encoder.dynamic_table_size(), 0);
    }

    #[test]
    fn test_reset_clears_output_not_table() {
        let mut encoder = Encoder::new();
        encoder.append(b"x-custom", b"v");
        encoder.reset();
        assert!(encoder.block().is_empty());
        assert_eq!(encoder.table.dynamic_len(), 1);
    }

    #[test]
    fn test_oversized_field_still_encodes() {
        let mut encoder = Encoder::with_table_size(32);
        let value = vec![b'v'; 100];
        encoder.append(b"x-big", &value);
        // Not stored, but the literal representation is still emitted.
        assert_eq!(encoder.table.dynamic_len(), 0);
        assert!(!encoder.block().is_empty());
    }
}
