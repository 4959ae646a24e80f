//! Ordered collections of shard references.
//!
//! The registry of shards belongs to the placement layer; this type only
//! borrows an ordered group of them for aggregate lookups when callers fan
//! operations out across shards.

use crate::shard::Shard;

/// An ordered list of borrowed shards.
#[derive(Debug, Default)]
pub struct Shards<'a> {
    shards: Vec<&'a Shard>,
}

impl<'a> Shards<'a> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifiers of all held shards, in held order.
    pub fn ids(&self) -> Vec<u64> {
        self.shards.iter().map(|shard| shard.id()).collect()
    }

    /// Returns the number of held shards.
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Returns whether the collection holds no shards.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Iterates over the held shards in order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Shard> + '_ {
        self.shards.iter().copied()
    }
}

impl<'a> From<Vec<&'a Shard>> for Shards<'a> {
    fn from(shards: Vec<&'a Shard>) -> Self {
        Self { shards }
    }
}

impl<'a> FromIterator<&'a Shard> for Shards<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Shard>>(iter: I) -> Self {
        Self {
            shards: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_preserve_order() {
        let a = Shard::new(3, 0, 10).unwrap();
        let b = Shard::new(1, 10, 20).unwrap();
        let c = Shard::new(2, 20, 30).unwrap();

        let shards = Shards::from(vec![&a, &b, &c]);
        assert_eq!(shards.ids(), vec![3, 1, 2]);
        assert_eq!(shards.len(), 3);
    }

    #[test]
    fn test_empty_collection() {
        let shards = Shards::new();
        assert!(shards.is_empty());
        assert!(shards.ids().is_empty());
    }

    #[test]
    fn test_collect_from_iterator() {
        let owned: Vec<Shard> = (0..4).map(|id| Shard::new(id, 0, 1).unwrap()).collect();
        let shards: Shards = owned.iter().collect();
        assert_eq!(shards.ids(), vec![0, 1, 2, 3]);
    }
}
