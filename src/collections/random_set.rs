//! Associative container with O(1) uniform sampling.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use rand::Rng;

/// A map over unique keys with O(1) insert, O(1) remove and O(1) uniform
/// random sampling.
///
/// Pairs live in a dense vector; a key→position index makes removal a
/// swap with the last element. Removal therefore does not preserve order.
///
/// There is deliberately no overwrite: adding a present key or removing an
/// absent one is a caller bug and panics.
///
/// # Examples
///
/// ```
/// use u_assign::collections::IndexedRandomSet;
///
/// let mut set = IndexedRandomSet::new();
/// set.add("a", 1);
/// set.add("b", 2);
/// set.remove(&"a");
///
/// let mut rng = rand::rng();
/// assert_eq!(set.get_random_item(&mut rng), Some((&"b", &2)));
/// ```
#[derive(Debug, Clone)]
pub struct IndexedRandomSet<K, V> {
    elements: Vec<(K, V)>,
    positions: HashMap<K, usize>,
}

impl<K, V> Default for IndexedRandomSet<K, V> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + Debug, V> IndexedRandomSet<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key` with `value`.
    ///
    /// # Panics
    ///
    /// If `key` is already present.
    pub fn add(&mut self, key: K, value: V) {
        let position = self.elements.len();
        let previous = self.positions.insert(key, position);
        assert!(previous.is_none(), "key {key:?} is already present");
        self.elements.push((key, value));
    }

    /// Removes `key`, returning its value.
    ///
    /// # Panics
    ///
    /// If `key` is absent.
    pub fn remove(&mut self, key: &K) -> V {
        let position = self
            .positions
            .remove(key)
            .unwrap_or_else(|| panic!("key {key:?} is not present"));
        let (_, value) = self.elements.swap_remove(position);
        if let Some(&(moved, _)) = self.elements.get(position) {
            self.positions.insert(moved, position);
        }
        value
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.positions.get(key).map(|&i| &self.elements[i].1)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Uniformly samples a stored pair. `None` only when empty.
    pub fn get_random_item<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&K, &V)> {
        if self.elements.is_empty() {
            return None;
        }
        let (key, value) = &self.elements[rng.random_range(0..self.elements.len())];
        Some((key, value))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Pairs in storage order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &V)> {
        self.elements.iter().map(|(k, v)| (k, v))
    }

    /// The dense storage, for index-based views.
    pub fn as_slice(&self) -> &[(K, V)] {
        &self.elements
    }
}

impl<K: Copy + Eq + Hash + Debug> IndexedRandomSet<K, ()> {
    /// Builds a set holding `keys` with unit values.
    pub fn from_keys<I: IntoIterator<Item = K>>(keys: I) -> Self {
        let mut set = Self::new();
        for key in keys {
            set.add(key, ());
        }
        set
    }
}
