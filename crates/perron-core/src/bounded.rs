//! Fixed-capacity lists.

use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::CapacityExceeded;

/// List holding at most `CAP` items.
///
/// Unlike text fields, lists never truncate silently on push: a push beyond
/// capacity is rejected with [`CapacityExceeded`]. Bulk construction through
/// [`BoundedVec::clamped`] keeps the first `CAP` items.
///
/// # Invariants
///
/// - `self.len() <= CAP` at all times, including after deserialization
///   (oversized input fails to decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedVec<T, const CAP: usize> {
    items: Vec<T>,
}

impl<T, const CAP: usize> BoundedVec<T, CAP> {
    /// Capacity of the list.
    pub const CAPACITY: usize = CAP;

    /// Create an empty list.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build from `items`, keeping the first `CAP` and dropping the rest.
    pub fn clamped(items: impl IntoIterator<Item = T>) -> Self {
        Self { items: items.into_iter().take(CAP).collect() }
    }

    /// Append an item.
    ///
    /// # Errors
    ///
    /// [`CapacityExceeded`] if the list is full. The list is unchanged.
    pub fn push(&mut self, item: T) -> Result<(), CapacityExceeded> {
        if self.is_full() {
            return Err(CapacityExceeded { capacity: CAP });
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove and return the item at `index`, shifting later items down.
    /// `None` if out of range.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Whether no further item fits.
    pub fn is_full(&self) -> bool {
        self.items.len() >= CAP
    }

    /// Items as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Consume into a plain vector.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T, const CAP: usize> Default for BoundedVec<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAP: usize> Deref for BoundedVec<T, CAP> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T, const CAP: usize> TryFrom<Vec<T>> for BoundedVec<T, CAP> {
    type Error = CapacityExceeded;

    fn try_from(items: Vec<T>) -> Result<Self, Self::Error> {
        if items.len() > CAP {
            return Err(CapacityExceeded { capacity: CAP });
        }
        Ok(Self { items })
    }
}

impl<T, const CAP: usize> IntoIterator for BoundedVec<T, CAP> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T, const CAP: usize> IntoIterator for &'a BoundedVec<T, CAP> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize, const CAP: usize> Serialize for BoundedVec<T, CAP> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>, const CAP: usize> Deserialize<'de> for BoundedVec<T, CAP> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Self::try_from(items).map_err(serde::de::Error::custom)
    }
}
