//! Combined header table: the logical concatenation [static | dynamic].
//!
//! Wire indices 1..=61 address the static table; 62 and up address the
//! dynamic table, newest entry first. Index 0 never addresses an entry; in
//! literal representations it means "name follows as a literal".

use super::dynamic_table::DynamicTable;
use super::static_table;

/// Default dynamic table budget before any size update: the initial value
/// of SETTINGS_HEADER_TABLE_SIZE (RFC 9113 Section 6.5.2).
pub const DEFAULT_TABLE_SIZE: usize = 4096;

pub struct HeaderTable {
    dynamic: DynamicTable,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_TABLE_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            dynamic: DynamicTable::new(max_size),
        }
    }

    /// Total addressable entries (static + dynamic).
    pub fn len(&self) -> usize {
        static_table::LENGTH + self.dynamic.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the static half is always present
    }

    pub fn dynamic_len(&self) -> usize {
        self.dynamic.len()
    }

    pub fn dynamic_size(&self) -> usize {
        self.dynamic.current_size()
    }

    pub fn max_dynamic_size(&self) -> usize {
        self.dynamic.max_size()
    }

    pub fn set_max_dynamic_size(&mut self, max_size: usize) {
        self.dynamic.set_max_size(max_size);
    }

    /// Insert into the dynamic half, with eviction.
    pub fn insert(&mut self, name: Vec<u8>, value: Vec<u8>) {
        self.dynamic.insert(name, value);
    }

    /// Look up an entry by combined 1-based index.
    pub fn entry(&self, index: usize) -> Option<(&[u8], &[u8])> {
        if index <= static_table::LENGTH {
            static_table::entry(index)
        } else {
            self.dynamic
                .entry(index - static_table::LENGTH)
                .map(|e| (e.name(), e.value()))
        }
    }

    /// Best indexed match for a header field.
    ///
    /// Returns `(index, true)` for an exact (name, value) match and
    /// `(index, false)` for a name-only match. Exact matches are preferred
    /// over name matches regardless of table half; within each pass the
    /// static table is scanned before the dynamic table and the first hit
    /// wins.
    pub fn first_match(&self, name: &[u8], value: &[u8]) -> Option<(usize, bool)> {
        if let Some(index) = static_table::find(name, value) {
            return Some((index, true));
        }
        if let Some(index) = self.dynamic.find(name, value) {
            return Some((static_table::LENGTH + index, true));
        }
        if let Some(index) = static_table::find_name(name) {
            return Some((index, false));
        }
        if let Some(index) = self.dynamic.find_name(name) {
            return Some((static_table::LENGTH + index, false));
        }
        None
    }
}

impl Default for HeaderTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_indices_pass_through() {
        let table = HeaderTable::new();
        assert_eq!(table.entry(2), Some((b":method".as_slice(), b"GET".as_slice())));
        assert_eq!(table.entry(0), None);
        assert_eq!(table.entry(62), None);
    }

    #[test]
    fn test_dynamic_entries_start_at_62() {
        let mut table = HeaderTable::new();
        table.insert(b"custom-key".to_vec(), b"custom-header".to_vec());

        assert_eq!(
            table.entry(62),
            Some((b"custom-key".as_slice(), b"custom-header".as_slice()))
        );
        assert_eq!(table.len(), 62);
    }

    #[test]
    fn test_first_match_prefers_exact_over_name() {
        let mut table = HeaderTable::new();
        // ":method: PATCH" only name-matches the static table.
        assert_eq!(table.first_match(b":method", b"PATCH"), Some((2, false)));

        // A dynamic exact match beats the static name match.
        table.insert(b":method".to_vec(), b"PATCH".to_vec());
        assert_eq!(table.first_match(b":method", b"PATCH"), Some((62, true)));

        // But a static exact match still wins first.
        assert_eq!(table.first_match(b":method", b"GET"), Some((2, true)));
    }

    #[test]
    fn test_first_match_dynamic_name_only() {
        let mut table = HeaderTable::new();
        table.insert(b"x-trace-id".to_vec(), b"abc".to_vec());

        assert_eq!(table.first_match(b"x-trace-id", b"def"), Some((62, false)));
        assert_eq!(table.first_match(b"x-missing", b""), None);
    }
}
