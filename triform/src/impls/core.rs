//! Implementations for core types: primitives, references, tuples, arrays,
//! `Option`, and `Result`.

use core::marker::PhantomData;
use core::mem::MaybeUninit;

use crate::archive::{Archive, NodeRef, INDEX_ATTR, VALUE_MEMBER};
use crate::error::Error;
use crate::traits::{Load, Save};

macro_rules! impl_primitive {
    ($($ty:ty, $put:ident, $get:ident;)*) => {
        $(
            impl<A: Archive> Save<A> for $ty {
                fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
                    archive.$put(node, *self)
                }
            }

            impl<A: Archive> Load<A> for $ty {
                fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
                    archive.$get(node)
                }
            }
        )*
    };
}

impl_primitive! {
    bool, put_bool, get_bool;
    i8, put_i8, get_i8;
    i16, put_i16, get_i16;
    i32, put_i32, get_i32;
    i64, put_i64, get_i64;
    u8, put_u8, get_u8;
    u16, put_u16, get_u16;
    u32, put_u32, get_u32;
    u64, put_u64, get_u64;
    f32, put_f32, get_f32;
    f64, put_f64, get_f64;
    char, put_char, get_char;
}

// Pointer-width integers archive as their 64-bit forms so streams stay
// portable across targets.

impl<A: Archive> Save<A> for usize {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        archive.put_u64(node, *self as u64)
    }
}

impl<A: Archive> Load<A> for usize {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let value = archive.get_u64(node)?;
        usize::try_from(value)
            .map_err(|_| Error::decode(format!("value {value} out of range for usize")))
    }
}

impl<A: Archive> Save<A> for isize {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        archive.put_i64(node, *self as i64)
    }
}

impl<A: Archive> Load<A> for isize {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let value = archive.get_i64(node)?;
        isize::try_from(value)
            .map_err(|_| Error::decode(format!("value {value} out of range for isize")))
    }
}

impl<A: Archive> Save<A> for () {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        archive.put_unit(node)
    }
}

impl<A: Archive> Load<A> for () {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        archive.get_unit(node)
    }
}

impl<A: Archive, T> Save<A> for PhantomData<T> {
    fn save(&self, _archive: &mut A, _node: NodeRef) -> Result<(), Error> {
        Ok(())
    }
}

impl<A: Archive, T> Load<A> for PhantomData<T> {
    fn load(_archive: &mut A, _node: NodeRef) -> Result<Self, Error> {
        Ok(PhantomData)
    }
}

// References save as their referents. There is deliberately no `Load`
// implementation: a loaded reference would have no owner, so loading one is
// a compile error.
impl<'a, A: Archive, T: Save<A> + ?Sized> Save<A> for &'a T {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        (**self).save(archive, node)
    }
}

macro_rules! impl_tuple {
    ($len:literal => $($idx:tt $ty:ident),+) => {
        impl<A: Archive, $($ty: Save<A>),+> Save<A> for ($($ty,)+) {
            fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
                archive.set_size(node, $len)?;
                $(
                    let child = archive.element(node, $idx)?;
                    self.$idx.save(archive, child)?;
                )+
                Ok(())
            }
        }

        impl<A: Archive, $($ty: Load<A>),+> Load<A> for ($($ty,)+) {
            fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
                let found = archive.size(node)?;
                if found != $len {
                    return Err(Error::SizeMismatch {
                        expected: $len,
                        found,
                    });
                }
                Ok(($(
                    {
                        let child = archive.element(node, $idx)?;
                        $ty::load(archive, child)?
                    },
                )+))
            }
        }
    };
}

impl_tuple!(1 => 0 T0);
impl_tuple!(2 => 0 T0, 1 T1);
impl_tuple!(3 => 0 T0, 1 T1, 2 T2);
impl_tuple!(4 => 0 T0, 1 T1, 2 T2, 3 T3);
impl_tuple!(5 => 0 T0, 1 T1, 2 T2, 3 T3, 4 T4);
impl_tuple!(6 => 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5);
impl_tuple!(7 => 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6);
impl_tuple!(8 => 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6, 7 T7);
impl_tuple!(9 => 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6, 7 T7, 8 T8);
impl_tuple!(10 => 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6, 7 T7, 8 T8, 9 T9);
impl_tuple!(11 => 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6, 7 T7, 8 T8, 9 T9, 10 T10);
impl_tuple!(12 => 0 T0, 1 T1, 2 T2, 3 T3, 4 T4, 5 T5, 6 T6, 7 T7, 8 T8, 9 T9, 10 T10, 11 T11);

impl<A: Archive, T: Save<A>, const N: usize> Save<A> for [T; N] {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        archive.set_size(node, N)?;
        for (index, element) in self.iter().enumerate() {
            let child = archive.element(node, index)?;
            element.save(archive, child)?;
        }
        Ok(())
    }
}

// Releases the initialized prefix of a partially-loaded array on every exit
// path, including element-load failures.
struct PartialArray<T, const N: usize> {
    slots: [MaybeUninit<T>; N],
    filled: usize,
}

impl<T, const N: usize> Drop for PartialArray<T, N> {
    fn drop(&mut self) {
        for slot in &mut self.slots[..self.filled] {
            // SAFETY: `filled` counts slots that were written and not yet
            // moved out.
            unsafe { slot.assume_init_drop() };
        }
    }
}

impl<A: Archive, T: Load<A>, const N: usize> Load<A> for [T; N] {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let found = archive.size(node)?;
        if found != N {
            return Err(Error::SizeMismatch {
                expected: N,
                found,
            });
        }
        let mut partial = PartialArray::<T, N> {
            // SAFETY: an array of `MaybeUninit` is always initialized.
            slots: unsafe { MaybeUninit::uninit().assume_init() },
            filled: 0,
        };
        for index in 0..N {
            let child = archive.element(node, index)?;
            partial.slots[index].write(T::load(archive, child)?);
            partial.filled = index + 1;
        }
        // SAFETY: every slot is initialized; ownership moves out and the
        // guard is forgotten so nothing double-drops.
        let value = unsafe { partial.slots.as_ptr().cast::<[T; N]>().read() };
        core::mem::forget(partial);
        Ok(value)
    }
}

impl<A: Archive, T: Save<A>> Save<A> for Option<T> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        match self {
            Some(value) => {
                archive.set_size(node, 2)?;
                let flag = archive.element(node, 0)?;
                archive.put_bool(flag, true)?;
                let child = archive.element(node, 1)?;
                value.save(archive, child)
            }
            None => {
                archive.set_size(node, 1)?;
                let flag = archive.element(node, 0)?;
                archive.put_bool(flag, false)
            }
        }
    }
}

impl<A: Archive, T: Load<A>> Load<A> for Option<T> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let found = archive.size(node)?;
        if found < 1 {
            return Err(Error::SizeMismatch { expected: 1, found });
        }
        let flag = archive.element(node, 0)?;
        if archive.get_bool(flag)? {
            if found < 2 {
                return Err(Error::SizeMismatch { expected: 2, found });
            }
            let child = archive.element(node, 1)?;
            Ok(Some(T::load(archive, child)?))
        } else {
            Ok(None)
        }
    }
}

// `Result` is an ordinary two-alternative sum: tag 0 is `Ok`, tag 1 is
// `Err`.

impl<A: Archive, T: Save<A>, E: Save<A>> Save<A> for Result<T, E> {
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error> {
        match self {
            Ok(value) => {
                archive.put_index(node, INDEX_ATTR, 0)?;
                let child = archive.member(node, VALUE_MEMBER)?;
                value.save(archive, child)
            }
            Err(error) => {
                archive.put_index(node, INDEX_ATTR, 1)?;
                let child = archive.member(node, VALUE_MEMBER)?;
                error.save(archive, child)
            }
        }
    }
}

impl<A: Archive, T: Load<A>, E: Load<A>> Load<A> for Result<T, E> {
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error> {
        let index = archive.get_index(node, INDEX_ATTR)?;
        let child = archive.member(node, VALUE_MEMBER)?;
        match index {
            0 => Ok(Ok(T::load(archive, child)?)),
            1 => Ok(Err(E::load(archive, child)?)),
            index => Err(Error::InvalidIndex {
                index: index as u32,
                arity: 2,
            }),
        }
    }
}
