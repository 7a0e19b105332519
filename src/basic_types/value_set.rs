//! The [`ValueSet`] is the atomic unit of domain narrowing: propagation never assigns a single
//! value directly, it intersects the current set with (or subtracts from it) another set.

use std::fmt::Debug;
use std::fmt::Formatter;

use crate::warren_assert_eq_simple;
use crate::warren_assert_simple;

const WORD_BITS: usize = u64::BITS as usize;

/// A fixed-size bitset over the indices of a variable's domain.
///
/// The size is fixed at construction; all binary operations assume both operands were created
/// with the same size. Bits beyond `len` are kept zero so that equality and hashing are
/// structural.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ValueSet {
    words: Box<[u64]>,
    len: usize,
}

impl ValueSet {
    pub fn new_empty(len: usize) -> ValueSet {
        warren_assert_simple!(len > 0, "a value set must cover at least one value");
        ValueSet {
            words: vec![0; len.div_ceil(WORD_BITS)].into_boxed_slice(),
            len,
        }
    }

    pub fn new_full(len: usize) -> ValueSet {
        let mut set = ValueSet::new_empty(len);
        for word in set.words.iter_mut() {
            *word = u64::MAX;
        }
        set.clear_excess_bits();
        set
    }

    pub fn from_indices(len: usize, indices: impl IntoIterator<Item = usize>) -> ValueSet {
        let mut set = ValueSet::new_empty(len);
        for index in indices {
            set.set(index);
        }
        set
    }

    pub fn singleton(len: usize, index: usize) -> ValueSet {
        let mut set = ValueSet::new_empty(len);
        set.set(index);
        set
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    pub fn contains(&self, index: usize) -> bool {
        warren_assert_simple!(index < self.len);
        self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    pub fn set(&mut self, index: usize) {
        warren_assert_simple!(index < self.len);
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    pub fn clear(&mut self, index: usize) {
        warren_assert_simple!(index < self.len);
        self.words[index / WORD_BITS] &= !(1 << (index % WORD_BITS));
    }

    /// Keep only the values also present in `other`.
    pub fn intersect(&mut self, other: &ValueSet) {
        warren_assert_eq_simple!(self.len, other.len);
        for (word, other_word) in self.words.iter_mut().zip(other.words.iter()) {
            *word &= other_word;
        }
    }

    /// Add every value present in `other`.
    pub fn include(&mut self, other: &ValueSet) {
        warren_assert_eq_simple!(self.len, other.len);
        for (word, other_word) in self.words.iter_mut().zip(other.words.iter()) {
            *word |= other_word;
        }
    }

    /// Remove every value present in `other`.
    pub fn exclude(&mut self, other: &ValueSet) {
        warren_assert_eq_simple!(self.len, other.len);
        for (word, other_word) in self.words.iter_mut().zip(other.words.iter()) {
            *word &= !other_word;
        }
    }

    pub fn intersection(&self, other: &ValueSet) -> ValueSet {
        let mut result = self.clone();
        result.intersect(other);
        result
    }

    pub fn union(&self, other: &ValueSet) -> ValueSet {
        let mut result = self.clone();
        result.include(other);
        result
    }

    pub fn difference(&self, other: &ValueSet) -> ValueSet {
        let mut result = self.clone();
        result.exclude(other);
        result
    }

    pub fn inverted(&self) -> ValueSet {
        let mut result = ValueSet {
            words: self.words.iter().map(|&word| !word).collect(),
            len: self.len,
        };
        result.clear_excess_bits();
        result
    }

    pub fn is_subset_of(&self, other: &ValueSet) -> bool {
        warren_assert_eq_simple!(self.len, other.len);
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(word, other_word)| word & !other_word == 0)
    }

    /// Whether the two sets have any value in common.
    pub fn intersects(&self, other: &ValueSet) -> bool {
        warren_assert_eq_simple!(self.len, other.len);
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(word, other_word)| word & other_word != 0)
    }

    pub fn count(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    pub fn is_singleton(&self) -> bool {
        self.count() == 1
    }

    /// The index of the single remaining value. Only meaningful for singleton sets.
    pub fn singleton_index(&self) -> usize {
        warren_assert_simple!(self.is_singleton());
        self.first_set().unwrap()
    }

    pub fn first_set(&self) -> Option<usize> {
        for (word_index, &word) in self.words.iter().enumerate() {
            if word != 0 {
                return Some(word_index * WORD_BITS + word.trailing_zeros() as usize);
            }
        }
        None
    }

    pub fn last_set(&self) -> Option<usize> {
        for (word_index, &word) in self.words.iter().enumerate().rev() {
            if word != 0 {
                return Some(word_index * WORD_BITS + (WORD_BITS - 1 - word.leading_zeros() as usize));
            }
        }
        None
    }

    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&index| self.contains(index))
    }

    /// Serialize to a string of `0`/`1` characters, least significant index first. The inverse
    /// of [`ValueSet::from_bit_string`].
    pub fn to_bit_string(&self) -> String {
        (0..self.len)
            .map(|index| if self.contains(index) { '1' } else { '0' })
            .collect()
    }

    pub fn from_bit_string(bits: &str) -> Option<ValueSet> {
        if bits.is_empty() {
            return None;
        }
        let mut set = ValueSet::new_empty(bits.len());
        for (index, character) in bits.chars().enumerate() {
            match character {
                '1' => set.set(index),
                '0' => {}
                _ => return None,
            }
        }
        Some(set)
    }

    fn clear_excess_bits(&mut self) {
        let used = self.len % WORD_BITS;
        if used != 0 {
            *self.words.last_mut().unwrap() &= (1 << used) - 1;
        }
    }
}

impl Debug for ValueSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValueSet[{}]", self.to_bit_string())
    }
}

#[cfg(test)]
mod tests {
    use super::ValueSet;

    #[test]
    fn double_inversion_is_identity() {
        let set = ValueSet::from_indices(70, [0, 3, 63, 64, 69]);
        assert_eq!(set.inverted().inverted(), set);
    }

    #[test]
    fn include_then_exclude_covers_original() {
        let set = ValueSet::from_indices(10, [1, 4, 7]);
        let other = ValueSet::from_indices(10, [4, 5]);

        let mut modified = set.clone();
        modified.include(&other);
        modified.exclude(&other);

        // Excluding can also take away values the set already had, so the result is a subset.
        assert!(modified.is_subset_of(&set));
        assert!(modified.contains(1) && modified.contains(7) && !modified.contains(4));
    }

    #[test]
    fn cardinality_of_union_and_intersection() {
        let set = ValueSet::from_indices(130, [0, 1, 64, 128]);
        let other = ValueSet::from_indices(130, [1, 2, 64, 129]);

        assert_eq!(
            set.union(&other).count() + set.intersection(&other).count(),
            set.count() + other.count()
        );
    }

    #[test]
    fn inversion_respects_set_size() {
        let set = ValueSet::new_empty(3);
        let inverted = set.inverted();
        assert_eq!(inverted.count(), 3);
        assert_eq!(inverted.last_set(), Some(2));
    }

    #[test]
    fn first_and_last_set_bits() {
        let set = ValueSet::from_indices(200, [5, 66, 199]);
        assert_eq!(set.first_set(), Some(5));
        assert_eq!(set.last_set(), Some(199));
        assert_eq!(set.iter_set().collect::<Vec<_>>(), vec![5, 66, 199]);
    }

    #[test]
    fn bit_string_round_trip() {
        let set = ValueSet::from_indices(9, [0, 2, 8]);
        let round_tripped = ValueSet::from_bit_string(&set.to_bit_string()).unwrap();
        assert_eq!(round_tripped, set);
    }

    #[test]
    fn subset_and_intersects() {
        let small = ValueSet::from_indices(65, [64]);
        let large = ValueSet::from_indices(65, [0, 64]);
        assert!(small.is_subset_of(&large));
        assert!(!large.is_subset_of(&small));
        assert!(small.intersects(&large));
        assert!(!small.intersects(&large.difference(&small)));
    }
}
