//! HPACK decoder (RFC 7541).
//!
//! Consumes one header block and yields header fields in wire order. Any
//! error invalidates the compression state for the rest of the connection.

use super::error::HpackError;
use super::huffman;
use super::integer::decode_integer;
use super::table::HeaderTable;

pub struct Decoder {
    table: HeaderTable,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            table: HeaderTable::new(),
        }
    }

    pub fn with_table_size(max_size: usize) -> Self {
        Self {
            table: HeaderTable::with_max_size(max_size),
        }
    }

    /// Apply a SETTINGS_HEADER_TABLE_SIZE change from the peer.
    pub fn set_max_table_size(&mut self, size: usize) {
        self.table.set_max_dynamic_size(size);
    }

    pub fn dynamic_table_size(&self) -> usize {
        self.table.dynamic_size()
    }

    /// Decode a whole header block into an ordered field list.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, HpackError> {
        let mut fields = Vec::new();
        self.decode_with_cb(data, |name, value| {
            fields.push((name.to_vec(), value.to_vec()));
        })?;
        Ok(fields)
    }

    /// Decode a header block, invoking `cb` with each `(name, value)` in
    /// wire order. Representations are dispatched on the high bits of their
    /// first octet (RFC 7541 Section 6).
    pub fn decode_with_cb<F>(&mut self, data: &[u8], mut cb: F) -> Result<(), HpackError>
    where
        F: FnMut(&[u8], &[u8]),
    {
        let mut pos = 0;

        while pos < data.len() {
            let byte = data[pos];

            // Indexed header field: 1xxxxxxx
            if byte & 0x80 != 0 {
                let (index, consumed) = decode_integer(&data[pos..], 7)?;
                pos += consumed;

                let index = index as usize;
                let (name, value) = self.indexed_entry(index)?;
                if value.is_empty() {
                    return Err(HpackError::IndexedHeaderWithNoValue(index));
                }
                cb(name, value);
                continue;
            }

            // Literal with incremental indexing: 01xxxxxx
            if byte & 0xc0 == 0x40 {
                let (name, value, consumed) = self.literal(&data[pos..], 6)?;
                pos += consumed;
                cb(&name, &value);
                self.table.insert(name, value);
                continue;
            }

            // Dynamic table size update: 001xxxxx
            if byte & 0xe0 == 0x20 {
                let (size, consumed) = decode_integer(&data[pos..], 5)?;
                pos += consumed;
                self.table.set_max_dynamic_size(size as usize);
                continue;
            }

            // Literal never indexed: 0001xxxx
            if byte & 0xf0 == 0x10 {
                let (name, value, consumed) = self.literal(&data[pos..], 4)?;
                pos += consumed;
                cb(&name, &value);
                continue;
            }

            // Literal without indexing: 0000xxxx
            if byte & 0xf0 == 0x00 {
                let (name, value, consumed) = self.literal(&data[pos..], 4)?;
                pos += consumed;
                cb(&name, &value);
                continue;
            }

            return Err(HpackError::InvalidRepresentation(byte));
        }

        Ok(())
    }

    /// Resolve an indexed-header index against the combined table.
    fn indexed_entry(&self, index: usize) -> Result<(&[u8], &[u8]), HpackError> {
        if index == 0 {
            return Err(HpackError::InvalidIndexedHeader(0));
        }
        self.table.entry(index).ok_or(HpackError::IndexOutOfRange {
            index,
            length: self.table.len(),
        })
    }

    /// Parse a literal representation body: prefixed name index, then the
    /// name (when the index is 0) and value string literals.
    fn literal(
        &self,
        data: &[u8],
        prefix_bits: u8,
    ) -> Result<(Vec<u8>, Vec<u8>, usize), HpackError> {
        let (name_index, mut pos) = decode_integer(data, prefix_bits)?;

        let name = if name_index == 0 {
            let (name, consumed) = self.string_literal(&data[pos..])?;
            pos += consumed;
            name
        } else {
            let index = name_index as usize;
            let (name, _) = self.table.entry(index).ok_or(HpackError::IndexOutOfRange {
                index,
                length: self.table.len(),
            })?;
            name.to_vec()
        };

        let (value, consumed) = self.string_literal(&data[pos..])?;
        pos += consumed;

        Ok((name, value, pos))
    }

    /// Parse a string literal (RFC 7541 Section 5.2): H flag, 7-bit prefixed
    /// length, then the octets, Huffman-decoded when H is set.
    fn string_literal(&self, data: &[u8]) -> Result<(Vec<u8>, usize), HpackError> {
        if data.is_empty() {
            return Err(HpackError::TruncatedBlock);
        }
        let huffman_coded = data[0] & 0x80 != 0;
        let (length, mut pos) = decode_integer(data, 7)?;
        let length = length as usize;

        if data.len() - pos < length {
            return Err(HpackError::TruncatedBlock);
        }
        let raw = &data[pos..pos + length];
        pos += length;

        let decoded = if huffman_coded {
            huffman::decode(raw)?
        } else {
            raw.to_vec()
        };

        if std::str::from_utf8(&decoded).is_err() {
            return Err(HpackError::InvalidStringEncoding);
        }
        Ok((decoded, pos))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
