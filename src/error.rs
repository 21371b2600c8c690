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

use std::{fmt, io};

/// Failure modes for [`crate::SliceTable::open`].
///
/// This is the only fallible entry point the core exposes: once a table
/// is constructed, `insert`/`delete` are infallible given their stated
/// preconditions (see the crate root docs).
#[derive(Debug)]
pub enum FileError {
    /// `open(2)` (or the platform equivalent) failed.
    Open(io::Error),
    /// `mmap(2)` failed for a file above the small-file threshold.
    Mmap(io::Error),
    /// A `read` came back short of the file's reported length.
    ShortRead { expected: usize, got: usize },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(e) => write!(f, "failed to open file: {e}"),
            Self::Mmap(e) => write!(f, "failed to mmap file: {e}"),
            Self::ShortRead { expected, got } => {
                write!(f, "short read: expected {expected} bytes, got {got}")
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(e) | Self::Mmap(e) => Some(e),
            Self::ShortRead { .. } => None,
        }
    }
}
