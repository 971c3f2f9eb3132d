//! Implementations for the unordered standard collections.
//!
//! Entries are written in the container's iteration order, which for hash
//! containers is unspecified but internally consistent within one save. A
//! reload rebuilds the container under its own ordering rules, so equality
//! across a round trip is multiset equality.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::archive::{Archive, NodeRef};
use crate::error::Error;
use crate::impls::alloc::{load_map_entries, save_map_entries};
use crate::traits::{Load, Save};

impl<A: Archive, K: Save<A>, V: Save<A>> Save<A> for HashMap<K, V> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        save_map_entries(self.iter(), self.len(), archive, node)
    }
}

impl<A: Archive, K: Load<A> + Hash + Eq, V: Load<A>> Load<A> for HashMap<K, V> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let mut map = HashMap::new();
        load_map_entries(archive, node, |key, value| {
            map.insert(key, value);
        })?;
        Ok(map)
    }
}

impl<A: Archive, T: Save<A>> Save<A> for HashSet<T> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        archive.set_size(node, self.len())?;
        for (index, element) in self.iter().enumerate() {
            let child = archive.element(node, index)?;
            element.save(archive, child)?;
        }
        Ok(())
    }
}

impl<A: Archive, T: Load<A> + Hash + Eq> Load<A> for HashSet<T> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let len = archive.size(node)?;
        let mut values = HashSet::new();
        for index in 0..len {
            let child = archive.element(node, index)?;
            values.insert(T::load(archive, child)?);
        }
        Ok(values)
    }
}
