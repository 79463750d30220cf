//! Bounded LRU cache that hands every value it gives up to a release hook.
//!
//! The `lru` crate silently drops evicted values. Surfaces hold decoded
//! buffers that must be freed deterministically, so this wrapper routes every
//! value leaving the cache (eviction, replacement, removal, clear, drop)
//! through [`Release::release`] exactly once.

use crate::error::{ArtworkError, Result};
use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Hook invoked with every value the cache gives up.
pub trait Release<V> {
    fn release(&mut self, value: V);
}

/// Release hook that simply drops the value.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRelease;

impl<V> Release<V> for NoRelease {
    fn release(&mut self, _value: V) {}
}

impl<V, F> Release<V> for F
where
    F: FnMut(V),
{
    fn release(&mut self, value: V) {
        self(value)
    }
}

/// LRU cache with a fixed, non-zero capacity and a release hook.
///
/// Not synchronized; the owner serializes access.
pub struct LruCache<K: Hash + Eq, V, R: Release<V> = NoRelease> {
    entries: lru::LruCache<K, V>,
    release: R,
}

impl<K: Hash + Eq, V> LruCache<K, V, NoRelease> {
    /// Creates a cache whose evicted values are dropped.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_release(capacity, NoRelease)
    }
}

impl<K: Hash + Eq, V, R: Release<V>> LruCache<K, V, R> {
    /// Creates a cache that passes every evicted value to `release`.
    ///
    /// Fails with [`ArtworkError::InvalidCapacity`] when `capacity` is zero.
    pub fn with_release(capacity: usize, release: R) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ArtworkError::InvalidCapacity)?;
        Ok(Self {
            entries: lru::LruCache::new(capacity),
            release,
        })
    }

    /// Looks up `key` and marks it most recently used.
    pub fn try_get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Mutable lookup; marks `key` most recently used.
    pub fn try_get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get_mut(key)
    }

    /// Looks up `key` without touching its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.peek(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains(key)
    }

    /// Inserts or replaces `key`.
    ///
    /// A replaced value is released. When the cache is full the least
    /// recently used entry, never `key` itself, is evicted and released.
    pub fn add(&mut self, key: K, value: V) {
        if let Some((_, old)) = self.entries.push(key, value) {
            self.release.release(old);
        }
    }

    /// Removes `key`, releasing its value. Returns whether it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.pop(key) {
            Some(value) => {
                self.release.release(value);
                true
            }
            None => false,
        }
    }

    /// Changes the capacity, releasing least recently used entries that no
    /// longer fit.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ArtworkError::InvalidCapacity)?;
        while self.entries.len() > capacity.get() {
            if let Some((_, value)) = self.entries.pop_lru() {
                self.release.release(value);
            }
        }
        self.entries.resize(capacity);
        Ok(())
    }

    /// Releases every entry.
    pub fn clear(&mut self) {
        while let Some((_, value)) = self.entries.pop_lru() {
            self.release.release(value);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Every value, without touching recency.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Mutable access to every value, without touching recency.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn release_hook(&self) -> &R {
        &self.release
    }
}

impl<K: Hash + Eq, V, R: Release<V>> Drop for LruCache<K, V, R> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{ArtworkError, LruCache};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_cache(
        capacity: usize,
    ) -> (
        LruCache<&'static str, u32, impl FnMut(u32)>,
        Rc<RefCell<Vec<u32>>>,
    ) {
        let released = Rc::new(RefCell::new(Vec::new()));
        let sink = released.clone();
        let cache =
            LruCache::with_release(capacity, move |value: u32| sink.borrow_mut().push(value))
                .unwrap();
        (cache, released)
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            LruCache::<u32, u32>::new(0),
            Err(ArtworkError::InvalidCapacity)
        ));
    }

    #[test]
    fn evicts_least_recently_used_after_access() {
        let (mut cache, released) = recording_cache(3);
        cache.add("one", 1);
        cache.add("two", 2);
        cache.add("three", 3);

        // "one" becomes most recent, so "two" is now the oldest.
        assert_eq!(cache.try_get("one"), Some(&1));
        cache.add("four", 4);

        assert_eq!(cache.len(), 3);
        assert!(cache.contains("one"));
        assert!(!cache.contains("two"));
        assert_eq!(*released.borrow(), vec![2]);
    }

    #[test]
    fn peek_does_not_promote() {
        let (mut cache, released) = recording_cache(2);
        cache.add("a", 1);
        cache.add("b", 2);
        assert_eq!(cache.peek("a"), Some(&1));
        cache.add("c", 3);

        assert!(!cache.contains("a"));
        assert_eq!(*released.borrow(), vec![1]);
    }

    #[test]
    fn replacing_a_value_releases_the_old_one() {
        let (mut cache, released) = recording_cache(2);
        cache.add("a", 1);
        cache.add("a", 10);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek("a"), Some(&10));
        assert_eq!(*released.borrow(), vec![1]);
    }

    #[test]
    fn remove_releases_once() {
        let (mut cache, released) = recording_cache(2);
        cache.add("a", 1);

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert_eq!(*released.borrow(), vec![1]);
    }

    #[test]
    fn shrinking_releases_oldest_entries() {
        let (mut cache, released) = recording_cache(4);
        for (key, value) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            cache.add(key, value);
        }

        cache.resize(2).unwrap();

        assert_eq!(cache.capacity(), 2);
        assert_eq!(*released.borrow(), vec![1, 2]);
        assert!(cache.resize(0).is_err());
    }

    #[test]
    fn drop_releases_everything_left() {
        let (mut cache, released) = recording_cache(3);
        cache.add("a", 1);
        cache.add("b", 2);
        drop(cache);

        let mut values = released.borrow().clone();
        values.sort();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn every_value_is_released_exactly_once() {
        let (mut cache, released) = recording_cache(3);
        for value in 0..50u32 {
            cache.add(["a", "b", "c", "d", "e"][(value % 5) as usize], value);
        }
        cache.clear();
        drop(cache);

        let mut values = released.borrow().clone();
        values.sort();
        assert_eq!(values, (0..50).collect::<Vec<_>>());
    }
}
