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

//! `check_invariants`: a full recursive scan, used as a test oracle. Not
//! on any hot path; production callers are free to skip it entirely.

use crate::{
    config::{HIGH_WATER, MIN_FILL, SLOTS},
    node::Node,
    rc::Rc,
};

/// Walks the whole tree, checking (spec invariant list): node fill bounds,
/// span-sum accounting against cached parent spans, no zero-span live
/// slots, small/small non-adjacency within a leaf, slice representation
/// matching its own span class, and every reachable refcount `>= 1`.
pub(crate) fn check(root: &Rc<Node>, levels: u32) -> bool {
    if levels == 0 {
        return false;
    }
    check_node(root, levels, true)
}

fn check_node(node: &Rc<Node>, remaining_levels: u32, is_root: bool) -> bool {
    if node.strong_count() < 1 {
        return false;
    }
    match &**node {
        Node::Leaf(slots) => {
            if remaining_levels != 1 {
                return false;
            }
            if !is_root && slots.len() < MIN_FILL {
                return false;
            }
            if slots.len() > SLOTS {
                return false;
            }
            for pair in slots.windows(2) {
                if pair[0].is_small() && pair[1].is_small() {
                    return false;
                }
            }
            slots.iter().all(|s| s.len() > 0 && s.is_small() == (s.len() <= HIGH_WATER))
        }
        Node::Inner(children) => {
            let fill = children.len();
            if fill > SLOTS {
                return false;
            }
            if is_root {
                if fill < 2 {
                    return false;
                }
            } else if fill < MIN_FILL {
                return false;
            }
            children.iter().all(|(span, child)| {
                *span > 0
                    && *span == child.span()
                    && check_node(child, remaining_levels - 1, false)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rope::SliceTable;

    #[test]
    fn fresh_table_holds() {
        let t = SliceTable::new();
        assert!(t.check_invariants());
    }

    #[test]
    fn holds_after_a_deep_trace() {
        let mut t = SliceTable::new();
        for i in 0..2000u32 {
            let pos = (i as u64 * 7) % (t.len() + 1);
            t.insert(pos, b"xy");
            assert!(t.check_invariants(), "violated after insert #{i}");
        }
        for i in 0..1000u32 {
            let pos = (i as u64 * 3) % (t.len().max(1));
            t.delete(pos, 5);
            assert!(t.check_invariants(), "violated after delete #{i}");
        }
    }
}
