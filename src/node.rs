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

//! Leaf and inner nodes.
//!
//! A leaf holds up to [`crate::config::SLOTS`] slices; an inner node holds
//! up to the same number of `(subtree span, child)` pairs. Both sit behind
//! an [`Rc`] so siblings and snapshots can share a node until one of them
//! needs to write through it.

use crate::{config::SLOTS, fixed_vec::FixedVec, rc::Rc, slice::Slice};

pub(crate) enum Node {
    Leaf(FixedVec<Slice, SLOTS>),
    Inner(FixedVec<(u64, Rc<Node>), SLOTS>),
}

impl Node {
    pub(crate) fn empty_leaf() -> Node {
        Node::Leaf(FixedVec::new())
    }

    pub(crate) fn fill(&self) -> usize {
        match self {
            Node::Leaf(slots) => slots.len(),
            Node::Inner(children) => children.len(),
        }
    }

    /// Sum of this node's immediate slots' spans (leaf slice lengths, or
    /// cached child subtree sums for an inner node). Not a full recursive
    /// walk: inner spans are already kept current one level down.
    pub(crate) fn span(&self) -> u64 {
        match self {
            Node::Leaf(slots) => slots.iter().map(|s| s.len() as u64).sum(),
            Node::Inner(children) => children.iter().map(|(span, _)| *span).sum(),
        }
    }

    pub(crate) fn as_leaf(&self) -> &FixedVec<Slice, SLOTS> {
        match self {
            Node::Leaf(slots) => slots,
            Node::Inner(_) => panic!("not a leaf node"),
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> &mut FixedVec<Slice, SLOTS> {
        match self {
            Node::Leaf(slots) => slots,
            Node::Inner(_) => panic!("not a leaf node"),
        }
    }

    pub(crate) fn as_inner(&self) -> &FixedVec<(u64, Rc<Node>), SLOTS> {
        match self {
            Node::Inner(children) => children,
            Node::Leaf(_) => panic!("not an inner node"),
        }
    }

    pub(crate) fn as_inner_mut(&mut self) -> &mut FixedVec<(u64, Rc<Node>), SLOTS> {
        match self {
            Node::Inner(children) => children,
            Node::Leaf(_) => panic!("not an inner node"),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        match self {
            // Leaf clone deep-copies small buffers (each becomes a fresh,
            // exclusively-owned buffer) and bumps the refcount of any
            // block a large slice borrows.
            Node::Leaf(slots) => Node::Leaf(slots.clone()),
            // Inner clone bumps the refcount of every live child; none of
            // them are copied.
            Node::Inner(children) => Node::Inner(children.clone()),
        }
    }
}

/// If `node` is shared (refcount > 1), clone it in place so the caller can
/// write through it without disturbing any other owner; otherwise a no-op.
pub(crate) fn ensure_editable(node: &mut Rc<Node>) -> &mut Node {
    if !node.is_unique() {
        let copy = (**node).clone();
        *node = Rc::new(copy);
        log::trace!("node: copy-on-write (was shared)");
    }
    // SAFETY: the branch above guarantees uniqueness by either having
    // observed it already, or by just having allocated a fresh `Rc::new`.
    unsafe { node.get_mut_unchecked() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cow_clone_is_independent() {
        let mut a = Rc::new(Node::empty_leaf());
        let mut b = a.clone();
        assert!(!a.is_unique());
        ensure_editable(&mut a).as_leaf_mut().push(Slice::small_from(b"x"));
        assert_eq!(a.span(), 1);
        assert_eq!(b.span(), 0);
        let _ = ensure_editable(&mut b);
    }
}
