//! Bitmask packing and unpacking.
//!
//! A [`BitTable`] fixes the bit position of every named flag for one
//! protocol version and one flag enumeration. Packing ORs `1 << bit`
//! for each flag present in the set; unpacking tests each defined bit
//! and drops bits the table gives no meaning to. Tables reject
//! duplicate bit positions at construction, so two flags can never
//! silently overwrite each other.

use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named collection of independent boolean capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSet<F: Ord>(BTreeSet<F>);

impl<F: Ord> Default for FlagSet<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Ord> FlagSet<F> {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Builder-style insertion.
    pub fn with(mut self, flag: F) -> Self {
        self.0.insert(flag);
        self
    }

    pub fn insert(&mut self, flag: F) {
        self.0.insert(flag);
    }

    pub fn contains(&self, flag: &F) -> bool {
        self.0.contains(flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.0.iter()
    }
}

impl<F: Ord> FromIterator<F> for FlagSet<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fixed (bit position, flag) assignments for one flag enumeration at
/// one protocol version.
#[derive(Debug, Clone, Copy)]
pub struct BitTable<F: 'static> {
    entries: &'static [(u8, F)],
}

impl<F: Copy + Ord> BitTable<F> {
    /// Validates the table. Duplicate bit positions are a construction
    /// error, not a last-write-wins overwrite, and every position must
    /// fit a 32-bit word.
    pub fn new(entries: &'static [(u8, F)]) -> Result<Self, CodecError> {
        let mut seen = 0u32;
        for &(bit, _) in entries {
            if bit >= 32 {
                return Err(CodecError::InvalidFieldValue {
                    field: "flag bit position",
                    value: bit as u32,
                });
            }
            let mask = 1u32 << bit;
            if seen & mask != 0 {
                return Err(CodecError::DuplicateFlagBit { bit });
            }
            seen |= mask;
        }
        Ok(Self { entries })
    }

    /// ORs together `1 << bit` for every flag present in `set`. Flags
    /// the table does not define contribute nothing, and undefined bits
    /// stay zero.
    pub fn pack(&self, set: &FlagSet<F>) -> u32 {
        let mut word = 0u32;
        for &(bit, flag) in self.entries {
            if set.contains(&flag) {
                word |= 1 << bit;
            }
        }
        word
    }

    /// Collects every defined flag whose bit is set in `word`. Set bits
    /// with no table entry are dropped, not surfaced as an error.
    ///
    /// All matching bits combine into the result; a word carrying a
    /// multi-bit combination decodes to every flag it names.
    pub fn unpack(&self, word: u32) -> FlagSet<F> {
        self.entries
            .iter()
            .filter(|&&(bit, _)| word & (1 << bit) != 0)
            .map(|&(_, flag)| flag)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum TestFlag {
        A,
        B,
        C,
    }

    const TABLE: &[(u8, TestFlag)] = &[(0, TestFlag::A), (1, TestFlag::B), (2, TestFlag::C)];

    #[test]
    fn test_pack_bits_0_and_2() {
        let table = BitTable::new(TABLE).unwrap();
        let set = FlagSet::new().with(TestFlag::A).with(TestFlag::C);
        // 16-bit field: bit 0 and bit 2 set
        assert_eq!(table.pack(&set) as u16, 0x0005);
    }

    #[test]
    fn test_unpack_bits_0_and_2() {
        let table = BitTable::new(TABLE).unwrap();
        let set = table.unpack(0x0005);
        assert!(set.contains(&TestFlag::A));
        assert!(!set.contains(&TestFlag::B));
        assert!(set.contains(&TestFlag::C));
    }

    #[test]
    fn test_all_set_all_clear() {
        let table = BitTable::new(TABLE).unwrap();

        let all: FlagSet<TestFlag> = [TestFlag::A, TestFlag::B, TestFlag::C]
            .into_iter()
            .collect();
        assert_eq!(table.pack(&all), 0b111);
        assert_eq!(table.unpack(0b111), all);

        let none = FlagSet::new();
        assert_eq!(table.pack(&none), 0);
        assert_eq!(table.unpack(0), none);
    }

    #[test]
    fn test_undefined_bits_dropped() {
        let table = BitTable::new(TABLE).unwrap();
        let set = table.unpack(0xFFFF_FFF8);
        assert!(set.is_empty());
    }

    #[test]
    fn test_multi_bit_combination_combines() {
        // Bits 1 and 2 both set must yield both flags, not just the
        // first match.
        let table = BitTable::new(TABLE).unwrap();
        let set = table.unpack(0b110);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&TestFlag::B));
        assert!(set.contains(&TestFlag::C));
    }

    #[test]
    fn test_duplicate_bit_rejected() {
        const DUP: &[(u8, TestFlag)] = &[(3, TestFlag::A), (3, TestFlag::B)];
        let result = BitTable::new(DUP);
        assert!(matches!(
            result,
            Err(CodecError::DuplicateFlagBit { bit: 3 })
        ));
    }

    #[test]
    fn test_oversized_bit_rejected() {
        const WIDE: &[(u8, TestFlag)] = &[(32, TestFlag::A)];
        assert!(matches!(
            BitTable::new(WIDE),
            Err(CodecError::InvalidFieldValue {
                field: "flag bit position",
                value: 32
            })
        ));
    }

    #[test]
    fn test_roundtrip() {
        let table = BitTable::new(TABLE).unwrap();
        let set = FlagSet::new().with(TestFlag::B);
        assert_eq!(table.unpack(table.pack(&set)), set);
    }
}
