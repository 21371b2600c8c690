/*
 * This file is part of slicetable.
 *
 * slicetable is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * slicetable is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with slicetable. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! An intrusive, atomically reference-counted box.
//!
//! Nodes and blocks need more than `std::sync::Arc` gives us: on every
//! descent we must ask "am I the only owner of this?" and, if so, get a
//! `&mut T` to edit in place; otherwise we copy. `Arc::get_mut` exists but
//! its `Option` dance and its insistence on owning the only reference
//! (not just observing a refcount of 1 right now, under our own
//! discipline) don't fit a hot path taken on every insert/delete. So this
//! is a small bespoke refcounted box, one heap allocation per object,
//! counter and payload together.

use std::{
    fmt,
    process,
    ptr::NonNull,
    sync::atomic::{self, AtomicUsize, Ordering},
};

struct Inner<T> {
    rc: AtomicUsize,
    data: T,
}

/// A pointer to a heap-allocated, refcounted `T`.
///
/// Cloning bumps the count with relaxed ordering: the handoff of a fresh
/// clone to wherever it ends up being read is itself the synchronization
/// point, same as `Arc`. Dropping the last reference runs an acquire fence
/// before the destructor, so every write made by a prior owner is visible.
pub(crate) struct Rc<T> {
    ptr: NonNull<Inner<T>>,
}

impl<T> Rc<T> {
    pub(crate) fn new(data: T) -> Self {
        let boxed = Box::new(Inner {
            rc: AtomicUsize::new(1),
            data,
        });
        Rc {
            ptr: NonNull::new(Box::into_raw(boxed)).expect("box can't be null"),
        }
    }

    fn inner(&self) -> &Inner<T> {
        unsafe { self.ptr.as_ref() }
    }

    /// Number of live handles to this allocation.
    pub(crate) fn strong_count(&self) -> usize {
        self.inner().rc.load(Ordering::Acquire)
    }

    /// `true` if this is the only handle, i.e. it is safe to mutate in
    /// place without disturbing another owner's view.
    pub(crate) fn is_unique(&self) -> bool {
        self.strong_count() == 1
    }

    /// Get `&mut T`, if uniquely owned.
    pub(crate) fn get_mut(&mut self) -> Option<&mut T> {
        if self.is_unique() {
            // SAFETY: refcount observed to be 1 with Acquire ordering, so
            // no other handle can be concurrently reading `data`.
            Some(unsafe { &mut (*self.ptr.as_ptr()).data })
        } else {
            None
        }
    }

    /// Get `&mut T` without checking uniqueness.
    ///
    /// # Safety
    /// The caller must have already established (e.g. via [`Self::is_unique`]
    /// or a freshly-allocated `Rc`) that no other handle observes `data`
    /// concurrently with this call.
    pub(crate) unsafe fn get_mut_unchecked(&mut self) -> &mut T {
        unsafe { &mut (*self.ptr.as_ptr()).data }
    }
}

impl<T> std::ops::Deref for Rc<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.inner().data
    }
}

impl<T> Clone for Rc<T> {
    fn clone(&self) -> Self {
        let old = self.inner().rc.fetch_add(1, Ordering::Relaxed);
        if old > (isize::MAX) as usize {
            // degenerate case that would require ~2^63 live clones; bail
            // loudly rather than silently wrap the counter
            process::abort();
        }
        Rc { ptr: self.ptr }
    }
}

impl<T> Drop for Rc<T> {
    fn drop(&mut self) {
        if self.inner().rc.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }
        atomic::fence(Ordering::Acquire);
        // SAFETY: we were the last owner, nobody else can be observing
        // `ptr` past this point.
        unsafe {
            drop(Box::from_raw(self.ptr.as_ptr()));
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Rc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rc")
            .field("strong_count", &self.strong_count())
            .field("data", &self.inner().data)
            .finish()
    }
}

unsafe impl<T: Send + Sync> Send for Rc<T> {}
unsafe impl<T: Send + Sync> Sync for Rc<T> {}

#[cfg(test)]
mod tests {
    use super::Rc;

    #[test]
    fn unique_after_new() {
        let rc = Rc::new(5);
        assert!(rc.is_unique());
    }

    #[test]
    fn clone_bumps_and_drop_releases() {
        let a = Rc::new(String::from("hi"));
        assert_eq!(a.strong_count(), 1);
        let b = a.clone();
        assert_eq!(a.strong_count(), 2);
        assert_eq!(b.strong_count(), 2);
        assert!(!a.is_unique());
        drop(b);
        assert!(a.is_unique());
    }

    #[test]
    fn get_mut_only_when_unique() {
        let mut a = Rc::new(1);
        let b = a.clone();
        assert!(a.get_mut().is_none());
        drop(b);
        *a.get_mut().unwrap() = 2;
        assert_eq!(*a, 2);
    }
}
