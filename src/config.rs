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

//! Compile-time tunables.
//!
//! There is no runtime configuration surface at this layer (see the root
//! docs): a rope's shape is fixed the moment the crate is built, same as
//! the `#define`-driven constants it descends from.

/// Byte threshold separating a *small* slice (an owned, exclusively
/// writable buffer of exactly this many bytes) from a *large* slice (a
/// borrowed, immutable view into a [`crate::block::Block`]). Power of two,
/// tunable.
pub const HIGH_WATER: usize = 1024;

/// Fanout: number of slots per leaf or inner node. Sized to keep one node
/// close to a cache-friendly size; unlike a raw byte budget this is sized
/// directly in slots since our node layout is an explicit struct rather
/// than a packed byte blob.
pub const SLOTS: usize = 15;

/// Minimum fill for any non-root node: `ceil(SLOTS / 2)`.
pub const MIN_FILL: usize = SLOTS.div_ceil(2);

/// Depth of the iterator's fixed ancestor stack. Trees deeper than this
/// fall back to a full root-descent reseek on `next_chunk`/`prev_chunk`.
/// Retained as-is per spec: whether this is a perf concession or an
/// arbitrary cap in the original is unclear, so it stays a perf choice.
pub const STACK_SIZE: usize = 3;
