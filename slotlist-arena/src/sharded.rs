use slotlist_libs::{ahash, parking_lot::RwLock, tracing};
use std::hash::{Hash, Hasher};

use crate::{ArrayLinkedList, ArrayLinkedListError};

/// Independent values, each behind its own lock, with keys routed to a fixed shard.
///
/// A single `ArrayLinkedList` has no synchronization. Workers that share lists either
/// lock one list or partition their elements across shards, this type does the latter.
#[derive(Debug)]
pub struct Sharded<T, K> {
    pub inner: Vec<RwLock<T>>,
    pub phantom: std::marker::PhantomData<K>,
}

#[inline]
pub fn get_index<K>(key: &K, count: usize) -> usize
where
    K: Hash + Eq + Clone,
{
    let mut s = ahash::AHasher::default();
    key.hash(&mut s);
    s.finish() as usize % count
}

impl<T, K> Sharded<T, K> {
    #[inline]
    pub fn shard(&self, key: &K) -> &RwLock<T>
    where
        K: Hash + Eq + Clone,
    {
        &self.inner[get_index(key, self.inner.len())]
    }

    #[inline]
    pub fn get_shard_by_index(&self, idx: usize) -> Option<&RwLock<T>> {
        self.inner.get(idx)
    }

    pub fn num_shards(&self) -> usize {
        self.inner.len()
    }
}

pub type ShardedArrayLinkedList<T> = Sharded<ArrayLinkedList<T>, u64>;

impl<T> Sharded<ArrayLinkedList<T>, u64> {
    pub fn with_capacity(
        num_shards: usize,
        capacity_per_shard: u32,
    ) -> Result<Self, ArrayLinkedListError> {
        if num_shards == 0 {
            return Err(ArrayLinkedListError::NoShards);
        }
        let inner = (0..num_shards)
            .map(|_| ArrayLinkedList::with_capacity(capacity_per_shard).map(RwLock::new))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            "sharded array linked list created, {} shards of {} slots",
            num_shards,
            capacity_per_shard
        );
        Ok(Self {
            inner,
            phantom: std::marker::PhantomData::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.iter().map(|x| x.read().len() as usize).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.iter().all(|x| x.read().is_empty())
    }

    pub fn capacity(&self) -> usize {
        self.inner
            .iter()
            .map(|x| x.read().capacity() as usize)
            .sum::<usize>()
    }

    pub fn clear(&self) {
        self.inner.iter().for_each(|x| x.write().clear());
    }
}

#[cfg(test)]
mod sharded_tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_no_shards() {
        assert_eq!(
            ShardedArrayLinkedList::<u64>::with_capacity(0, 4).unwrap_err(),
            ArrayLinkedListError::NoShards
        );
        assert_eq!(
            ShardedArrayLinkedList::<u64>::with_capacity(2, 0).unwrap_err(),
            ArrayLinkedListError::InvalidCapacity(0)
        );
    }

    #[test]
    fn test_same_key_same_shard() {
        let sharded = ShardedArrayLinkedList::<u64>::with_capacity(8, 4).unwrap();
        assert_eq!(sharded.num_shards(), 8);
        assert_eq!(sharded.capacity(), 32);
        for key in 0..100u64 {
            let a = sharded.shard(&key) as *const _;
            let b = sharded.shard(&key) as *const _;
            assert_eq!(a, b);
            assert!(get_index(&key, 8) < 8);
        }
        assert!(sharded.get_shard_by_index(7).is_some());
        assert!(sharded.get_shard_by_index(8).is_none());
    }

    #[test]
    fn test_concurrent_workers() {
        let sharded = Arc::new(ShardedArrayLinkedList::<u64>::with_capacity(4, 64).unwrap());
        let handles: Vec<std::thread::JoinHandle<_>> = (0..4usize)
            .map(|worker| {
                let sharded = sharded.clone();
                std::thread::spawn(move || {
                    let shard = sharded.get_shard_by_index(worker).unwrap();
                    for round in 0..100u64 {
                        let mut list = shard.write();
                        let index = list.insert_first(round).unwrap();
                        if round % 2 == 0 {
                            list.remove(index).unwrap();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(sharded.len(), 4 * 50);
        for idx in 0..4 {
            sharded
                .get_shard_by_index(idx)
                .unwrap()
                .read()
                .check_integrity()
                .unwrap();
        }
        sharded.clear();
        assert!(sharded.is_empty());
    }
}
