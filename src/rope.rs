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

//! [`SliceTable`]: the rope header tying together a root node, a block
//! registry and a height counter.

use std::{io, path::Path};

use crate::{
    block::Block,
    edit,
    invariants,
    iter::SliceIter,
    node::Node,
    rc::Rc,
    FileError,
};

/// A persistent, copy-on-write byte sequence.
///
/// Cloning is O(1): it bumps the root and block-list refcounts and shares
/// every node until a mutation walks through it.
pub struct SliceTable {
    root: Rc<Node>,
    blocks: Option<Rc<Block>>,
    /// Tree height; 1 for a single leaf root, growing by one each time the
    /// root overflows and shrinking back when it is whittled to one child.
    levels: u32,
}

impl SliceTable {
    /// A single empty leaf.
    pub fn new() -> Self {
        SliceTable {
            root: Rc::new(Node::empty_leaf()),
            blocks: None,
            levels: 1,
        }
    }

    /// Load `path` as the table's initial content: `mmap`'d if larger than
    /// [`crate::HIGH_WATER`], otherwise read once into a heap block. A
    /// zero-length file yields an empty table.
    pub fn open(path: &Path) -> Result<Self, FileError> {
        match Block::from_file(path)? {
            None => Ok(Self::new()),
            Some(block) => {
                let len = block.len();
                let slice = crate::slice::Slice::Large { block: block.clone(), offset: 0, len };
                let mut leaf = crate::fixed_vec::FixedVec::new();
                leaf.push(slice);
                Ok(SliceTable {
                    root: Rc::new(Node::Leaf(leaf)),
                    blocks: Some(block),
                    levels: 1,
                })
            }
        }
    }

    /// Total live byte count (sum of root spans).
    pub fn len(&self) -> u64 {
        self.root.span()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `levels - 1`: 0 for a single leaf, growing with each root split.
    pub fn depth(&self) -> u32 {
        self.levels - 1
    }

    /// Insert `data` at `pos` (clamped to `len()` by the caller's
    /// precondition `pos <= len()`). Returns the number of `\n` bytes in
    /// `data`. A no-op for empty `data`.
    pub fn insert(&mut self, pos: u64, data: &[u8]) -> usize {
        edit::insert(&mut self.root, &mut self.levels, pos, data, &mut self.blocks)
    }

    /// Delete up to `len` bytes starting at `pos`, clamping `len` to
    /// `self.len() - pos`. Returns the number of `\n` bytes removed.
    pub fn delete(&mut self, pos: u64, len: u64) -> usize {
        edit::delete(&mut self.root, &mut self.levels, pos, len, &mut self.blocks)
    }

    /// Position an iterator at `pos` (`pos == len()` is a valid, at-end
    /// position).
    pub fn iter_at(&self, pos: u64) -> SliceIter<'_> {
        SliceIter::new(&self.root, pos)
    }

    /// Full structural scan: fill bounds, span-sum accounting, no
    /// zero-span live slots, small/small non-adjacency, ownership class
    /// matching span, and every reachable refcount `>= 1`.
    pub fn check_invariants(&self) -> bool {
        invariants::check(&self.root, self.levels)
    }

    /// Write every live byte, in order, to `writer`.
    pub fn dump<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        let mut it = self.iter_at(0);
        while let Some(chunk) = it.chunk() {
            writer.write_all(chunk)?;
            if !it.next_chunk() {
                break;
            }
        }
        Ok(())
    }
}

impl Default for SliceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SliceTable {
    /// O(1): bumps the root and block-list refcounts: no node or byte is
    /// copied. Subsequent mutation on either table copy-on-writes only the
    /// path it touches (see [`crate::node::ensure_editable`]).
    fn clone(&self) -> Self {
        log::trace!("rope: cloned (root rc was {})", self.root.strong_count());
        SliceTable {
            root: self.root.clone(),
            blocks: self.blocks.clone(),
            levels: self.levels,
        }
    }
}
