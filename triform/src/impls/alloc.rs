//! Implementations for owning types: strings, boxes, shared handles, and
//! the ordered collections.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use crate::archive::{Archive, NodeRef, NULL_CLASS};
use crate::error::Error;
use crate::tag::Tag;
use crate::traits::{Load, Save};
use crate::util::bounded_capacity;

impl<A: Archive> Save<A> for str {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        archive.put_str(node, self)
    }
}

impl<A: Archive> Save<A> for String {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        archive.put_str(node, self)
    }
}

impl<A: Archive> Load<A> for String {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        archive.get_str(node)
    }
}

// A box is a unique handle: the pointee is saved in place, with no handle
// framing of its own.

impl<A: Archive, T: Save<A>> Save<A> for Box<T> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        (**self).save(archive, node)
    }
}

impl<A: Archive, T: Load<A>> Load<A> for Box<T> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        Ok(Box::new(T::load(archive, node)?))
    }
}

impl<'a, A: Archive, T: ToOwned + Save<A> + ?Sized> Save<A> for Cow<'a, T> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        (**self).save(archive, node)
    }
}

impl<'a, A: Archive, T: ToOwned + ?Sized> Load<A> for Cow<'a, T>
where
    T::Owned: Load<A>,
{
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        Ok(Cow::Owned(T::Owned::load(archive, node)?))
    }
}

// Shared handles write the pointee's type identity alongside the value.
// Sharing itself is not preserved: each handle archives its target by
// value, and loading produces a freshly owned target.

fn save_shared<A: Archive, T: Save<A> + Tag>(
    value: &T,
    archive: &mut A,
    node: NodeRef,
) -> Result<(), Error> {
    archive.put_class(node, &T::tag())?;
    value.save(archive, node)
}

fn load_shared<A: Archive, T: Load<A> + Tag>(
    archive: &mut A,
    node: NodeRef,
) -> Result<T, Error> {
    match archive.get_class(node)? {
        Some(class) if class == NULL_CLASS => return Err(Error::NullPointer),
        Some(class) => {
            if class != T::tag() {
                log::warn!("shared handle class `{class}` does not match `{}`", T::tag());
            }
        }
        None => {
            log::warn!("shared handle has no class attribute; expected `{}`", T::tag());
        }
    }
    T::load(archive, node)
}

impl<A: Archive, T: Save<A> + Tag> Save<A> for Rc<T> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        save_shared(&**self, archive, node)
    }
}

impl<A: Archive, T: Load<A> + Tag> Load<A> for Rc<T> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        Ok(Rc::new(load_shared(archive, node)?))
    }
}

impl<A: Archive, T: Save<A> + Tag> Save<A> for Arc<T> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        save_shared(&**self, archive, node)
    }
}

impl<A: Archive, T: Load<A> + Tag> Load<A> for Arc<T> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        Ok(Arc::new(load_shared(archive, node)?))
    }
}

fn save_sequence<'a, A, T, I>(iter: I, len: usize, archive: &mut A, node: NodeRef) -> Result<(), Error>
where
    A: Archive,
    T: Save<A> + 'a,
    I: Iterator<Item = &'a T>,
{
    archive.set_size(node, len)?;
    for (index, element) in iter.enumerate() {
        let child = archive.element(node, index)?;
        element.save(archive, child)?;
    }
    Ok(())
}

impl<A: Archive, T: Save<A>> Save<A> for Vec<T> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        save_sequence(self.iter(), self.len(), archive, node)
    }
}

impl<A: Archive, T: Load<A>> Load<A> for Vec<T> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let len = archive.size(node)?;
        let mut values = Vec::with_capacity(bounded_capacity(len));
        for index in 0..len {
            let child = archive.element(node, index)?;
            values.push(T::load(archive, child)?);
        }
        Ok(values)
    }
}

impl<A: Archive, T: Save<A>> Save<A> for VecDeque<T> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        save_sequence(self.iter(), self.len(), archive, node)
    }
}

impl<A: Archive, T: Load<A>> Load<A> for VecDeque<T> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let len = archive.size(node)?;
        let mut values = VecDeque::with_capacity(bounded_capacity(len));
        for index in 0..len {
            let child = archive.element(node, index)?;
            values.push_back(T::load(archive, child)?);
        }
        Ok(values)
    }
}

// Map-like containers archive as flat alternating key/value sequences of
// length `2n`, in iteration order.

pub(crate) fn save_map_entries<'a, A, K, V, I>(
    iter: I,
    len: usize,
    archive: &mut A,
    node: NodeRef,
) -> Result<(), Error>
where
    A: Archive,
    K: Save<A> + 'a,
    V: Save<A> + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    archive.set_size(node, 2 * len)?;
    for (index, (key, value)) in iter.enumerate() {
        let child = archive.element(node, 2 * index)?;
        key.save(archive, child)?;
        let child = archive.element(node, 2 * index + 1)?;
        value.save(archive, child)?;
    }
    Ok(())
}

pub(crate) fn load_map_entries<A, K, V>(
    archive: &mut A,
    node: NodeRef,
    mut insert: impl FnMut(K, V),
) -> Result<(), Error>
where
    A: Archive,
    K: Load<A>,
    V: Load<A>,
{
    let found = archive.size(node)?;
    if found % 2 != 0 {
        return Err(Error::SizeMismatch {
            expected: found - 1,
            found,
        });
    }
    for index in 0..found / 2 {
        let child = archive.element(node, 2 * index)?;
        let key = K::load(archive, child)?;
        let child = archive.element(node, 2 * index + 1)?;
        let value = V::load(archive, child)?;
        insert(key, value);
    }
    Ok(())
}

impl<A: Archive, K: Save<A>, V: Save<A>> Save<A> for BTreeMap<K, V> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        save_map_entries(self.iter(), self.len(), archive, node)
    }
}

impl<A: Archive, K: Load<A> + Ord, V: Load<A>> Load<A> for BTreeMap<K, V> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let mut map = BTreeMap::new();
        load_map_entries(archive, node, |key, value| {
            map.insert(key, value);
        })?;
        Ok(map)
    }
}

impl<A: Archive, T: Save<A>> Save<A> for BTreeSet<T> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        save_sequence(self.iter(), self.len(), archive, node)
    }
}

impl<A: Archive, T: Load<A> + Ord> Load<A> for BTreeSet<T> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let len = archive.size(node)?;
        let mut values = BTreeSet::new();
        for index in 0..len {
            let child = archive.element(node, index)?;
            values.insert(T::load(archive, child)?);
        }
        Ok(values)
    }
}
