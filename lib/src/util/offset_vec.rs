use std::fmt::{Debug, Error, Formatter};
use std::iter::Enumerate;
use std::slice::Iter;

/// Elements with a width (eg. when used in an `OffsetVec`)
pub trait Width {
    fn width(&self) -> usize;
}

/// A vector of elements of different logical "widths", where offsets into the vector are given in
/// terms of the sum of the widths of the previous elements (as opposed to the number of preceding
/// elements).
///
/// The constants pool is the motivating example: most entries have width 1, but `long` and
/// `double` entries have width 2 and the offset in the middle of them is not addressable.
#[derive(Clone)]
pub struct OffsetVec<T: Sized> {
    /// Entries, along with their offset
    entries: Vec<(Offset, T)>,

    /// Offset of the next element to be added
    offset_len: Offset,
}

/// Offset into an `OffsetVec`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Offset(pub usize);

impl<T: Sized + Width> OffsetVec<T> {
    /// New empty offset vector, with a custom starting offset
    pub fn new_starting_at(initial_offset: Offset) -> OffsetVec<T> {
        OffsetVec {
            entries: vec![],
            offset_len: initial_offset,
        }
    }

    /// Length of the `OffsetVec` (aka. number of entries)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Current offset size of the `OffsetVec` (aka. offset of the next element
    /// to be added)
    pub fn offset_len(&self) -> Offset {
        self.offset_len
    }

    /// Double the backing storage if fewer than `min_headroom` more entries fit without
    /// reallocating
    pub fn ensure_headroom(&mut self, min_headroom: usize) {
        let spare = self.entries.capacity() - self.entries.len();
        if spare < min_headroom {
            let additional = self.entries.capacity().max(min_headroom);
            self.entries.reserve_exact(additional);
        }
    }

    /// Add an entry to the back
    pub fn push(&mut self, slot: T) -> Offset {
        let offset = self.offset_len;
        self.offset_len.0 += slot.width();
        self.entries.push((offset, slot));

        offset
    }

    /// Get an entry (and its index) by its offset in the vector
    ///
    /// Note: this uses binary search to find the offset
    pub fn get_offset(&self, offset: Offset) -> OffsetResult<T> {
        match self.entries.binary_search_by_key(&offset, |(off, _)| *off) {
            Err(insert_at) if insert_at == self.entries.len() => OffsetResult::TooLarge,
            Err(0) => OffsetResult::TooSmall,
            Err(insert_at) => OffsetResult::InvalidOffset(insert_at - 1),
            Ok(found_idx) => OffsetResult::Ok(found_idx, &self.entries[found_idx].1),
        }
    }

    pub fn iter(&self) -> OffsetVecIter<'_, T> {
        OffsetVecIter(self.entries.iter().enumerate())
    }

    /// Consume the vector, keeping only the entries and their offsets
    pub fn into_entries(self) -> impl Iterator<Item = (Offset, T)> {
        self.entries.into_iter()
    }
}

#[derive(Debug, PartialEq)]
pub enum OffsetResult<'a, T> {
    /// Element was accessed
    Ok(usize, &'a T),

    /// Offset was invalid, and falls in the middle of the element at this index
    InvalidOffset(usize),

    /// Offset is before the first element
    TooSmall,

    /// Offset is too big
    TooLarge,
}

impl<'a, T> OffsetResult<'a, T> {
    /// Convert to an `Option` and keep only the value found
    pub fn ok(&self) -> Option<&'a T> {
        match self {
            OffsetResult::Ok(_, found) => Some(found),
            _ => None,
        }
    }
}

/// Iterator for borrowed `OffsetVec`
pub struct OffsetVecIter<'a, T>(Enumerate<Iter<'a, (Offset, T)>>);

impl<'a, T> Iterator for OffsetVecIter<'a, T> {
    type Item = (Offset, usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(idx, (off, elem))| (*off, idx, elem))
    }
}

impl<T: Debug> Debug for OffsetVec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut list = f.debug_list();
        for (off, elem) in &self.entries {
            list.entry(&format_args!("#{} = {:?}", off.0, elem));
        }
        list.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    enum Slot {
        Narrow(u8),
        Wide(u8),
    }

    impl Width for Slot {
        fn width(&self) -> usize {
            match self {
                Slot::Narrow(_) => 1,
                Slot::Wide(_) => 2,
            }
        }
    }

    fn slots() -> OffsetVec<Slot> {
        let mut slots = OffsetVec::new_starting_at(Offset(1));
        slots.push(Slot::Narrow(1));
        slots.push(Slot::Wide(2));
        slots.push(Slot::Narrow(3));
        slots
    }

    #[test]
    fn offsets_skip_wide_slots() {
        let slots = slots();
        assert_eq!(
            slots.iter().map(|(off, idx, slot)| (off, idx, *slot)).collect::<Vec<_>>(),
            vec![
                (Offset(1), 0, Slot::Narrow(1)),
                (Offset(2), 1, Slot::Wide(2)),
                (Offset(4), 2, Slot::Narrow(3)),
            ]
        );
        assert_eq!(slots.offset_len(), Offset(5));
    }

    #[test]
    fn lookup_by_offset() {
        let slots = slots();
        assert_eq!(slots.get_offset(Offset(0)), OffsetResult::TooSmall);
        assert_eq!(slots.get_offset(Offset(2)).ok(), Some(&Slot::Wide(2)));
        assert_eq!(slots.get_offset(Offset(3)), OffsetResult::InvalidOffset(1));
        assert_eq!(slots.get_offset(Offset(4)).ok(), Some(&Slot::Narrow(3)));
        assert_eq!(slots.get_offset(Offset(5)), OffsetResult::TooLarge);
    }

    #[test]
    fn headroom_doubles_capacity() {
        let mut slots = slots();
        slots.ensure_headroom(64);
        let capacity = slots.entries.capacity();
        assert!(capacity - slots.len() >= 64);
        slots.ensure_headroom(1);
        assert_eq!(slots.entries.capacity(), capacity);
    }
}
