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

//! Immutable, refcounted backing storage for large slices.
//!
//! A block is either a heap allocation (small files, or data promoted out
//! of a small slice buffer once it outgrows [`crate::HIGH_WATER`]) or a
//! read-only `mmap`. Blocks are never partially mutated; a "small" slice
//! is a distinct, separately-owned buffer, not a block.

use std::{
    fs::File,
    io::{self, Read, Seek},
    path::Path,
};

use memmap2::Mmap;

use crate::rc::Rc;

enum Storage {
    Heap(Box<[u8]>),
    Mmap(Mmap),
}

impl Storage {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Heap(b) => b,
            Storage::Mmap(m) => &m[..],
        }
    }
}

/// A single immutable byte range, plus a link to the block allocated
/// immediately before it. Tables keep a head pointer into this chain
/// (see [`crate::rope::SliceTable`]) purely as a registry for bulk
/// traversal; the data is kept alive for as long as any slice (or the
/// registry itself) holds a reference, via ordinary `Rc` drop glue.
pub(crate) struct Block {
    storage: Storage,
    next: Option<Rc<Block>>,
}

impl Block {
    pub(crate) fn len(&self) -> usize {
        self.storage.as_slice().len()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        self.storage.as_slice()
    }

    /// Allocate a new heap-backed block holding an exact copy of `data`,
    /// linking it in front of `head`: new allocations are always pushed at
    /// the head of the list.
    pub(crate) fn push_heap(head: &mut Option<Rc<Block>>, data: &[u8]) -> Rc<Block> {
        let block = Rc::new(Block {
            storage: Storage::Heap(data.to_vec().into_boxed_slice()),
            next: head.take(),
        });
        *head = Some(block.clone());
        log::trace!("block: registered new heap block of {} bytes", data.len());
        block
    }

    /// Read a file into a block: `mmap` above [`crate::HIGH_WATER`],
    /// otherwise a single heap read. Mirrors `st_new_from_file`.
    pub(crate) fn from_file(path: &Path) -> Result<Option<Rc<Block>>, crate::FileError> {
        use crate::FileError;

        let file = File::open(path).map_err(FileError::Open)?;
        let len = file.metadata().map_err(FileError::Open)?.len() as usize;
        if len == 0 {
            return Ok(None);
        }

        let storage = if len <= crate::HIGH_WATER {
            let mut data = vec![0u8; len];
            read_exact_from_start(&file, &mut data)?;
            Storage::Heap(data.into_boxed_slice())
        } else {
            // SAFETY: the file is opened read-only for the lifetime of the
            // mapping and is not subsequently written by this process;
            // external modification is the usual mmap caveat, which
            // callers accept by constructing a table from a path at all.
            let mmap = unsafe { Mmap::map(&file) }.map_err(FileError::Mmap)?;
            Storage::Mmap(mmap)
        };

        log::debug!("block: loaded {} from file ({} bytes)", path.display(), len);
        Ok(Some(Rc::new(Block { storage, next: None })))
    }
}

fn read_exact_from_start(file: &File, buf: &mut [u8]) -> Result<(), crate::FileError> {
    let mut file = file.try_clone().map_err(crate::FileError::Open)?;
    file.rewind().map_err(crate::FileError::Open)?;
    let expected = buf.len();
    let mut got = 0;
    while got < expected {
        match file.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(crate::FileError::Open(e)),
        }
    }
    if got != expected {
        return Err(crate::FileError::ShortRead { expected, got });
    }
    Ok(())
}
