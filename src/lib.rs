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

//! A persistent, copy-on-write, piece-indexed rope.
//!
//! [`SliceTable`] holds an arbitrarily large mutable byte sequence as a
//! span-indexed B+ tree of small (owned) and large (memory-mapped or
//! heap-backed, borrowed) slices. Structural cloning is O(1) and shares
//! nodes and blocks across tables via atomic reference counts; mutation
//! copies only the path touched by an edit (see [`rc::Rc`]).
//!
//! This crate only implements the data structure itself. Driving it from
//! an editor, rendering it, classifying I/O errors beyond open/mmap/short
//! read, and any scheduling across threads are all callers' concerns.

#![deny(unused_imports)]

mod block;
mod config;
mod edit;
mod error;
mod fixed_vec;
mod invariants;
mod iter;
mod node;
mod rc;
mod rope;
mod slice;

pub use self::{error::FileError, iter::SliceIter, rope::SliceTable};

pub use self::config::{HIGH_WATER, SLOTS as FANOUT};
