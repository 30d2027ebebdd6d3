//! Ordered model sequence used by multi-row repository operations.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    OutOfBounds { index: usize, len: usize },
}

impl Display for CollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for collection of {len}")
            }
        }
    }
}

impl Error for CollectionError {}

/// Ordered, 0-indexed sequence of models. No dedup, no identity semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<M> {
    items: Vec<M>,
}

impl<M> Collection<M> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&M> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut M> {
        self.items.get_mut(index)
    }

    /// Replaces the item at `index` and returns the previous one.
    pub fn set(&mut self, index: usize, item: M) -> Result<M, CollectionError> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(CollectionError::OutOfBounds { index, len })?;
        Ok(std::mem::replace(slot, item))
    }

    pub fn push(&mut self, item: M) {
        self.items.push(item);
    }

    pub fn first(&self) -> Option<&M> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, M> {
        self.items.iter_mut()
    }

    pub fn into_vec(self) -> Vec<M> {
        self.items
    }
}

impl<M> Default for Collection<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> From<Vec<M>> for Collection<M> {
    fn from(items: Vec<M>) -> Self {
        Self { items }
    }
}

impl<M> FromIterator<M> for Collection<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<M> IntoIterator for Collection<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, M> IntoIterator for &'a Collection<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<M> Index<usize> for Collection<M> {
    type Output = M;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<M> IndexMut<usize> for Collection<M> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.items[index]
    }
}

#[cfg(test)]
mod tests {
    use super::{Collection, CollectionError};

    #[test]
    fn keeps_insertion_order_and_allows_duplicates() {
        let mut collection = Collection::new();
        collection.push("b");
        collection.push("a");
        collection.push("b");

        assert_eq!(collection.count(), 3);
        assert_eq!(collection.iter().copied().collect::<Vec<_>>(), vec!["b", "a", "b"]);
        assert_eq!(collection[1], "a");
    }

    #[test]
    fn set_replaces_in_place_and_rejects_out_of_range() {
        let mut collection = Collection::from(vec![1, 2]);

        assert_eq!(collection.set(0, 10), Ok(1));
        assert_eq!(collection.first(), Some(&10));
        assert_eq!(
            collection.set(2, 3),
            Err(CollectionError::OutOfBounds { index: 2, len: 2 })
        );
    }
}
