//! Storage pool for interned string literals
//!
//! All identifier and literal text referenced by the opcode stream lives in
//! a single append-only pool. Addresses handed out by [`StoragePool::register`]
//! are already the final byte offsets of the entries in the packaged image:
//! the pool starts right after the initial `Jump` header (1 opcode byte +
//! 4 address bytes), and every entry occupies `8 (hash) + 2 (length) +
//! text` bytes. Address 0 is therefore never a valid storage address and
//! doubles as the "no name" sentinel for anonymous subroutines.

use rustc_hash::FxHashMap;
use tyvm_bytecode::runtime_hash;

/// Byte offset of the first storage entry: `Op::Jump` + u32 address.
const FIRST_ENTRY_ADDRESS: u32 = 1 + 4;

/// An interned string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    /// The interned text
    pub text: String,
    /// Final byte offset of this entry in the packaged image
    pub address: u32,
}

/// Pool of interned strings with content deduplication
#[derive(Debug)]
pub struct StoragePool {
    entries: Vec<StorageEntry>,
    next_address: u32,
    /// hash -> entries with that hash; a list because different texts can
    /// collide on the hash.
    dedup_index: FxHashMap<u64, Vec<usize>>,
}

impl Default for StoragePool {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_address: FIRST_ENTRY_ADDRESS,
            dedup_index: FxHashMap::default(),
        }
    }

    /// Intern `text` and return its address.
    ///
    /// Registering the same text twice returns the first address.
    pub fn register(&mut self, text: &str) -> u32 {
        let hash = runtime_hash(text);

        if let Some(indices) = self.dedup_index.get(&hash) {
            for &index in indices {
                if self.entries[index].text == text {
                    return self.entries[index].address;
                }
            }
        }

        let address = self.next_address;
        self.next_address += 8 + 2 + text.len() as u32;
        self.dedup_index
            .entry(hash)
            .or_default()
            .push(self.entries.len());
        self.entries.push(StorageEntry {
            text: text.to_string(),
            address,
        });
        address
    }

    /// The interned entries in insertion order
    pub fn entries(&self) -> &[StorageEntry] {
        &self.entries
    }

    /// Total packaged size of the storage section in bytes
    pub fn byte_size(&self) -> u32 {
        self.next_address - FIRST_ENTRY_ADDRESS
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_address_skips_header() {
        let mut pool = StoragePool::new();
        assert_eq!(pool.register("X"), 5);
    }

    #[test]
    fn test_addresses_advance_by_entry_size() {
        let mut pool = StoragePool::new();
        let a = pool.register("ab");
        let b = pool.register("c");
        let c = pool.register("defg");

        assert_eq!(a, 5);
        assert_eq!(b, 5 + 8 + 2 + 2);
        assert_eq!(c, b + 8 + 2 + 1);
        assert_eq!(pool.byte_size(), (8 + 2 + 2) + (8 + 2 + 1) + (8 + 2 + 4));
    }

    #[test]
    fn test_dedup_returns_first_address() {
        let mut pool = StoragePool::new();
        let a = pool.register("hello");
        let b = pool.register("world");
        let c = pool.register("hello");

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_zero_is_never_a_valid_address() {
        let mut pool = StoragePool::new();
        assert_ne!(pool.register(""), 0);
    }
}
