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

//! Path-copying recursive insert/delete over the span-indexed tree.
//!
//! Every level is reached through [`crate::node::ensure_editable`], so a
//! mutation only ever allocates along the path it actually touches. A
//! base-case edit at a leaf reports whether it fit, overflowed (a sibling
//! to splice in above), or underflowed (too few slots left, to be resolved
//! by borrowing from or merging into a sibling one level up).

use crate::{
    block::Block,
    config::{MIN_FILL, SLOTS},
    fixed_vec::FixedVec,
    node::{ensure_editable, Node},
    rc::Rc,
    slice::{merge_slices, Slice},
};

/// What a base-case or recursive edit handed back to its caller.
///
/// Replaces the original's reuse of one out-parameter for both "here is a
/// new right sibling, and its size" and "here is my new, possibly too
/// small, fill" with a single tagged result.
pub(crate) enum EditOutcome {
    Fit,
    Split { node: Rc<Node>, span: u64 },
    Underflow(usize),
    Emptied,
}

fn count_newlines(data: &[u8]) -> usize {
    data.iter().filter(|&&b| b == b'\n').count()
}

/// Find the slot whose span covers `pos` within a node's slots, given
/// their spans (leaf slice lengths, or an inner node's cached subtree
/// sums). Returns `(slot index, offset within that slot)`. `pos` equal to
/// the node's total span resolves to one-past-the-last slot's end, a
/// valid append position.
pub(crate) fn locate(spans: &[u64], pos: u64) -> (usize, u64) {
    let last = spans.len() - 1;
    let mut prefix = 0u64;
    for (i, &span) in spans.iter().enumerate() {
        if i == last || pos < prefix + span {
            return (i, pos - prefix);
        }
        prefix += span;
    }
    unreachable!("spans must be non-empty")
}

// ---------------------------------------------------------------------
// Leaf base cases
// ---------------------------------------------------------------------

pub(crate) fn insert_leaf(
    leaf: &mut FixedVec<Slice, SLOTS>,
    pos: u64,
    data: &[u8],
    blocks_head: &mut Option<Rc<Block>>,
) -> EditOutcome {
    if data.is_empty() {
        return EditOutcome::Fit;
    }
    if leaf.is_empty() {
        leaf.push(Slice::new_owned(data, blocks_head));
        return EditOutcome::Fit;
    }

    let spans: Vec<u64> = leaf.iter().map(|s| s.len() as u64).collect();
    let (i, offset_u64) = locate(&spans, pos);
    let offset = offset_u64 as usize;
    let at_slot_start = offset == 0;
    let at_slot_end = offset_u64 == spans[i];

    // Fast paths: in-place edits of an existing small buffer, touching
    // neither the slot array nor the adjacency invariant.
    if at_slot_start && leaf[i].try_insert_in_place(0, data) {
        return EditOutcome::Fit;
    }
    if !at_slot_start && leaf[i].try_insert_in_place(offset, data) {
        return EditOutcome::Fit;
    }
    if at_slot_end && i + 1 < leaf.len() && leaf[i + 1].try_insert_in_place(0, data) {
        return EditOutcome::Fit;
    }

    // Slow paths: a fresh slice has to be spliced into the slot array.
    let new_slice = Slice::new_owned(data, blocks_head);

    if at_slot_start {
        splice_leaf(leaf, i, vec![new_slice], blocks_head)
    } else if at_slot_end {
        splice_leaf(leaf, i + 1, vec![new_slice], blocks_head)
    } else {
        let mut all = leaf.drain_all();
        let (head, tail) = all[i].split_at(offset);
        all.splice(i..=i, [head, new_slice, tail]);
        merge_window_and_rebuild(leaf, all, i, i + 3, blocks_head)
    }
}

fn splice_leaf(
    leaf: &mut FixedVec<Slice, SLOTS>,
    at: usize,
    new_slices: Vec<Slice>,
    blocks_head: &mut Option<Rc<Block>>,
) -> EditOutcome {
    let mut all = leaf.drain_all();
    let inserted = new_slices.len();
    all.splice(at..at, new_slices);
    merge_window_and_rebuild(leaf, all, at, at + inserted, blocks_head)
}

/// Run the five-way merge pass over a window gathered around
/// `[edit_start, edit_end)` (up to two slots of context each side), splice
/// the merged result back, and settle the leaf, splitting on overflow.
fn merge_window_and_rebuild(
    leaf: &mut FixedVec<Slice, SLOTS>,
    mut all: Vec<Slice>,
    edit_start: usize,
    edit_end: usize,
    blocks_head: &mut Option<Rc<Block>>,
) -> EditOutcome {
    let window_start = edit_start.saturating_sub(2);
    let window_end = (edit_end + 2).min(all.len());
    let window: Vec<Slice> = all.splice(window_start..window_end, std::iter::empty()).collect();
    let merged = merge_slices(window, blocks_head);
    all.splice(window_start..window_start, merged);

    if all.len() <= SLOTS {
        let fill = all.len();
        for s in all {
            leaf.push(s);
        }
        if fill < MIN_FILL {
            EditOutcome::Underflow(fill)
        } else {
            EditOutcome::Fit
        }
    } else {
        let pivot = SLOTS / 2 + 1;
        let right = all.split_off(pivot);
        for s in all {
            leaf.push(s);
        }
        let right_span: u64 = right.iter().map(|s| s.len() as u64).sum();
        let right_leaf: FixedVec<Slice, SLOTS> = right.into_iter().collect();
        log::debug!(
            "leaf split: left fill={} right fill={}",
            leaf.len(),
            right_leaf.len()
        );
        EditOutcome::Split {
            node: Rc::new(Node::Leaf(right_leaf)),
            span: right_span,
        }
    }
}

pub(crate) fn delete_leaf(
    leaf: &mut FixedVec<Slice, SLOTS>,
    pos: u64,
    len: u64,
    blocks_head: &mut Option<Rc<Block>>,
) -> (EditOutcome, u64, usize) {
    if len == 0 || leaf.is_empty() {
        return (EditOutcome::Fit, 0, 0);
    }
    let spans: Vec<u64> = leaf.iter().map(|s| s.len() as u64).collect();
    let total: u64 = spans.iter().sum();
    let pos = pos.min(total);
    let len = len.min(total - pos);
    if len == 0 {
        return (EditOutcome::Fit, 0, 0);
    }

    let (i, offset_u64) = locate(&spans, pos);
    let offset = offset_u64 as usize;
    let avail_in_slot = spans[i] - offset_u64;

    if len <= avail_in_slot {
        return delete_within_slice(leaf, i, offset, len as usize, blocks_head);
    }

    // Case B: the deletion runs past the end of slot i within this leaf.
    let mut all = leaf.drain_all();
    let mut remaining = len;
    let mut start = i;
    let mut newlines = 0usize;

    if offset > 0 {
        let bytes = all[i].as_bytes();
        newlines += count_newlines(&bytes[offset..]);
        all[i] = all[i].shrink_back(offset);
        remaining -= avail_in_slot;
        start = i + 1;
    }

    let mut end = start;
    while end < all.len() && remaining >= all[end].len() as u64 {
        newlines += count_newlines(all[end].as_bytes());
        remaining -= all[end].len() as u64;
        end += 1;
    }
    all.drain(start..end);

    if remaining > 0 && start < all.len() {
        let take = remaining.min(all[start].len() as u64) as usize;
        newlines += count_newlines(&all[start].as_bytes()[..take]);
        all[start] = all[start].shrink_front(take);
        remaining -= take as u64;
    }

    let deleted = len - remaining;
    let outcome = merge_window_and_rebuild(leaf, all, start, start, blocks_head);
    (outcome, deleted, newlines)
}

fn delete_within_slice(
    leaf: &mut FixedVec<Slice, SLOTS>,
    i: usize,
    offset: usize,
    len: usize,
    blocks_head: &mut Option<Rc<Block>>,
) -> (EditOutcome, u64, usize) {
    let newlines = count_newlines(&leaf[i].as_bytes()[offset..offset + len]);
    if leaf[i].delete_in_place(offset, len) {
        return (EditOutcome::Fit, len as u64, newlines);
    }

    let mut all = leaf.drain_all();
    let victim = all.remove(i);
    let (head, rest) = victim.split_at(offset);
    let (_, tail) = rest.split_at(len);
    let mut replacement = Vec::new();
    if head.len() > 0 {
        replacement.push(head);
    }
    if tail.len() > 0 {
        replacement.push(tail);
    }
    let edit_end = i + replacement.len();
    all.splice(i..i, replacement);
    let outcome = merge_window_and_rebuild(leaf, all, i, edit_end, blocks_head);
    (outcome, len as u64, newlines)
}

// ---------------------------------------------------------------------
// Inner-node recursion
// ---------------------------------------------------------------------

pub(crate) fn insert_rec(
    node: &mut Rc<Node>,
    pos: u64,
    data: &[u8],
    blocks_head: &mut Option<Rc<Block>>,
) -> EditOutcome {
    let is_leaf = node.is_leaf();
    let n = ensure_editable(node);
    if is_leaf {
        return insert_leaf(n.as_leaf_mut(), pos, data, blocks_head);
    }

    let inner = n.as_inner_mut();
    let spans: Vec<u64> = inner.iter().map(|(s, _)| *s).collect();
    let (i, offset) = locate(&spans, pos);

    let child_outcome = insert_rec(&mut inner[i].1, offset, data, blocks_head);
    inner[i].0 = inner[i].1.span();

    match child_outcome {
        EditOutcome::Fit => EditOutcome::Fit,
        EditOutcome::Split { node: right, span } => splice_inner(inner, i + 1, vec![(span, right)]),
        EditOutcome::Underflow(_) | EditOutcome::Emptied => rebalance_child(inner, i, blocks_head),
    }
}

pub(crate) fn delete_rec(
    node: &mut Rc<Node>,
    pos: u64,
    len: u64,
    blocks_head: &mut Option<Rc<Block>>,
) -> (EditOutcome, u64, usize) {
    let is_leaf = node.is_leaf();
    let n = ensure_editable(node);
    if is_leaf {
        return delete_leaf(n.as_leaf_mut(), pos, len, blocks_head);
    }

    let inner = n.as_inner_mut();
    if inner.is_empty() {
        return (EditOutcome::Fit, 0, 0);
    }
    let spans: Vec<u64> = inner.iter().map(|(s, _)| *s).collect();
    let (i, offset) = locate(&spans, pos);

    let (child_outcome, deleted, newlines) = delete_rec(&mut inner[i].1, offset, len, blocks_head);
    inner[i].0 = inner[i].1.span();

    let outcome = match child_outcome {
        EditOutcome::Fit => EditOutcome::Fit,
        EditOutcome::Split { .. } => unreachable!("delete never splits a child"),
        EditOutcome::Underflow(_) | EditOutcome::Emptied => rebalance_child(inner, i, blocks_head),
    };
    (outcome, deleted, newlines)
}

fn splice_inner(
    inner: &mut FixedVec<(u64, Rc<Node>), SLOTS>,
    at: usize,
    new_entries: Vec<(u64, Rc<Node>)>,
) -> EditOutcome {
    let mut all = inner.drain_all();
    all.splice(at..at, new_entries);

    if all.len() <= SLOTS {
        let fill = all.len();
        for e in all {
            inner.push(e);
        }
        if fill < MIN_FILL {
            EditOutcome::Underflow(fill)
        } else {
            EditOutcome::Fit
        }
    } else {
        let mut pivot = SLOTS / 2 + 1;
        if at > SLOTS / 2 {
            pivot += 1;
        }
        let pivot = pivot.clamp(1, all.len() - 1);
        let right = all.split_off(pivot);
        for e in all {
            inner.push(e);
        }
        let right_span: u64 = right.iter().map(|(s, _)| *s).sum();
        let right_inner: FixedVec<(u64, Rc<Node>), SLOTS> = right.into_iter().collect();
        log::debug!(
            "inner split: left fill={} right fill={}",
            inner.len(),
            right_inner.len()
        );
        EditOutcome::Split {
            node: Rc::new(Node::Inner(right_inner)),
            span: right_span,
        }
    }
}

fn remove_inner_slot(inner: &mut FixedVec<(u64, Rc<Node>), SLOTS>, i: usize) -> EditOutcome {
    let mut all = inner.drain_all();
    all.remove(i);
    let fill = all.len();
    for e in all {
        inner.push(e);
    }
    if fill == 0 {
        EditOutcome::Emptied
    } else if fill < MIN_FILL {
        EditOutcome::Underflow(fill)
    } else {
        EditOutcome::Fit
    }
}

enum Direction {
    FromLeftBackToRightFront,
    FromRightFrontToLeftBack,
}

/// Absorb `src` entirely into `dst`, in left-to-right order (`dst` must be
/// the left sibling of `src`).
fn merge_nodes(dst: &mut Rc<Node>, src: &mut Rc<Node>) {
    // SAFETY: both siblings were just `ensure_editable`'d by the caller.
    match (unsafe { dst.get_mut_unchecked() }, unsafe { src.get_mut_unchecked() }) {
        (Node::Leaf(d), Node::Leaf(s)) => {
            for slice in s.drain_all() {
                d.push(slice);
            }
        }
        (Node::Inner(d), Node::Inner(s)) => {
            for entry in s.drain_all() {
                d.push(entry);
            }
        }
        _ => unreachable!("siblings at the same level must share a node kind"),
    }
}

/// Move just enough slots from `donor` to bring `deficient` up to
/// [`MIN_FILL`], preserving left-to-right byte order.
fn move_slots(donor: &mut Rc<Node>, deficient: &mut Rc<Node>, dir: Direction) {
    match (unsafe { donor.get_mut_unchecked() }, unsafe { deficient.get_mut_unchecked() }) {
        (Node::Leaf(d), Node::Leaf(r)) => {
            let mut donor_slots = d.drain_all();
            let mut deficient_slots = r.drain_all();
            let want = MIN_FILL.saturating_sub(deficient_slots.len()).max(1).min(donor_slots.len());
            match dir {
                Direction::FromLeftBackToRightFront => {
                    let split_at = donor_slots.len() - want;
                    let mut moved = donor_slots.split_off(split_at);
                    moved.extend(deficient_slots);
                    deficient_slots = moved;
                }
                Direction::FromRightFrontToLeftBack => {
                    let moved: Vec<_> = donor_slots.drain(0..want).collect();
                    deficient_slots.extend(moved);
                }
            }
            for s in donor_slots {
                d.push(s);
            }
            for s in deficient_slots {
                r.push(s);
            }
        }
        (Node::Inner(d), Node::Inner(r)) => {
            let mut donor_slots = d.drain_all();
            let mut deficient_slots = r.drain_all();
            let want = MIN_FILL.saturating_sub(deficient_slots.len()).max(1).min(donor_slots.len());
            match dir {
                Direction::FromLeftBackToRightFront => {
                    let split_at = donor_slots.len() - want;
                    let mut moved = donor_slots.split_off(split_at);
                    moved.extend(deficient_slots);
                    deficient_slots = moved;
                }
                Direction::FromRightFrontToLeftBack => {
                    let moved: Vec<_> = donor_slots.drain(0..want).collect();
                    deficient_slots.extend(moved);
                }
            }
            for e in donor_slots {
                d.push(e);
            }
            for e in deficient_slots {
                r.push(e);
            }
        }
        _ => unreachable!("siblings at the same level must share a node kind"),
    }
}

/// Resolve an underflow (or full emptiness) at child `i` by borrowing from
/// or merging into the sibling the spec picks: `i - 1` if it exists, else
/// `i + 1`.
fn rebalance_child(
    inner: &mut FixedVec<(u64, Rc<Node>), SLOTS>,
    i: usize,
    _blocks_head: &mut Option<Rc<Block>>,
) -> EditOutcome {
    if inner[i].1.fill() == 0 {
        return remove_inner_slot(inner, i);
    }

    let j = if i > 0 { i - 1 } else { i + 1 };
    let (left_idx, right_idx) = if j < i { (j, i) } else { (i, j) };
    let deficient_on_left = i == left_idx;

    let slots: &mut [(u64, Rc<Node>)] = inner;
    let (left_part, right_part) = slots.split_at_mut(right_idx);
    let (left_span, left_child) = &mut left_part[left_idx];
    let (right_span, right_child) = &mut right_part[0];

    ensure_editable(left_child);
    ensure_editable(right_child);

    let removed_idx = if left_child.fill() + right_child.fill() <= SLOTS {
        merge_nodes(left_child, right_child);
        *left_span = left_child.span();
        *right_span = 0;
        Some(right_idx)
    } else if deficient_on_left {
        move_slots(right_child, left_child, Direction::FromRightFrontToLeftBack);
        *left_span = left_child.span();
        *right_span = right_child.span();
        None
    } else {
        move_slots(left_child, right_child, Direction::FromLeftBackToRightFront);
        *left_span = left_child.span();
        *right_span = right_child.span();
        None
    };

    match removed_idx {
        Some(idx) => remove_inner_slot(inner, idx),
        None => EditOutcome::Fit,
    }
}

// ---------------------------------------------------------------------
// Root-level driver: grows height on overflow, shrinks it on underflow.
// ---------------------------------------------------------------------

pub(crate) fn insert(
    root: &mut Rc<Node>,
    levels: &mut u32,
    pos: u64,
    data: &[u8],
    blocks_head: &mut Option<Rc<Block>>,
) -> usize {
    if data.is_empty() {
        return 0;
    }
    let newlines = count_newlines(data);
    let outcome = insert_rec(root, pos, data, blocks_head);
    apply_root_outcome(root, levels, outcome);
    newlines
}

pub(crate) fn delete(
    root: &mut Rc<Node>,
    levels: &mut u32,
    pos: u64,
    len: u64,
    blocks_head: &mut Option<Rc<Block>>,
) -> usize {
    let size = root.span();
    let pos = pos.min(size);
    let mut remaining = len.min(size - pos);
    let mut newlines = 0usize;

    while remaining > 0 {
        let (outcome, deleted, nl) = delete_rec(root, pos, remaining, blocks_head);
        newlines += nl;
        if deleted == 0 {
            break;
        }
        remaining -= deleted;
        apply_root_outcome(root, levels, outcome);
    }
    newlines
}

fn apply_root_outcome(root: &mut Rc<Node>, levels: &mut u32, outcome: EditOutcome) {
    match outcome {
        EditOutcome::Fit => {}
        EditOutcome::Split { node: right, span: right_span } => {
            let left_span = root.span();
            let mut new_root: FixedVec<(u64, Rc<Node>), SLOTS> = FixedVec::new();
            new_root.push((left_span, root.clone()));
            new_root.push((right_span, right));
            *root = Rc::new(Node::Inner(new_root));
            *levels += 1;
            log::debug!("rope: root grew to {} levels", levels);
        }
        EditOutcome::Underflow(_) | EditOutcome::Emptied => {
            while *levels > 1 {
                let should_demote = matches!(&**root, Node::Inner(children) if children.len() <= 1);
                if !should_demote {
                    break;
                }
                let new_root = match &**root {
                    Node::Inner(children) if children.is_empty() => Rc::new(Node::empty_leaf()),
                    Node::Inner(children) => children[0].1.clone(),
                    _ => unreachable!(),
                };
                *root = new_root;
                *levels -= 1;
                log::debug!("rope: root shrank to {} levels", levels);
            }
        }
    }
}
