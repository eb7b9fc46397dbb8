//! File reading.
//!
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use memmap::{Mmap, MmapOptions};

use crate::serialize::ReadBytes;

/// A positioned cursor over an immutable byte sequence.
///
/// `D` is anything that derefs to a byte slice: an `Mmap` for files,
/// a `Vec<u8>` for data that is already in memory.
pub struct ByteCursor<D> {
    data: D,
    pos:  u64,
}

/// A media file, mapped into memory.
pub type MediaFile = ByteCursor<Mmap>;

impl MediaFile {
    /// Open and map a file.
    ///
    /// The mapping lives as long as the `MediaFile`, so dropping it
    /// releases the file. An empty file is an `InvalidData` error, since
    /// it cannot be mapped and there is nothing to parse anyway.
    pub fn open(path: impl AsRef<Path>) -> io::Result<MediaFile> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        let size = file.metadata()?.len();
        if size == 0 {
            return Err(ioerr!(InvalidData, "{}: empty file", path.display()));
        }
        let map = unsafe { MmapOptions::new().map(&file)? };
        log::trace!("MediaFile::open: {} ({} bytes)", path.display(), size);
        Ok(ByteCursor::new(map))
    }
}

impl<D: AsRef<[u8]>> ByteCursor<D> {
    pub fn new(data: D) -> ByteCursor<D> {
        ByteCursor { data, pos: 0 }
    }

    /// The first `len` bytes of the data, or less if it is shorter.
    pub fn head(&self, len: usize) -> &[u8] {
        let data = self.data.as_ref();
        &data[..std::cmp::min(len, data.len())]
    }
}

impl<D: AsRef<[u8]>> fmt::Debug for ByteCursor<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ByteCursor")
            .field("pos", &self.pos)
            .field("size", &self.size())
            .finish()
    }
}

impl<D: AsRef<[u8]>> ReadBytes for ByteCursor<D> {
    #[inline]
    fn read(&mut self, amount: u64) -> io::Result<&[u8]> {
        if amount > self.left() {
            return Err(ioerr!(
                UnexpectedEof,
                "read of {} bytes at offset {} past end of data",
                amount,
                self.pos
            ));
        }
        let start = self.pos as usize;
        self.pos += amount;
        Ok(&self.data.as_ref()[start..self.pos as usize])
    }

    #[inline]
    fn skip(&mut self, amount: u64) -> io::Result<()> {
        if amount > self.left() {
            return Err(ioerr!(UnexpectedEof, "tried to skip past eof"));
        }
        self.pos += amount;
        Ok(())
    }

    #[inline]
    fn pos(&self) -> u64 {
        self.pos
    }

    #[inline]
    fn seek(&mut self, pos: u64) -> io::Result<()> {
        if pos > self.size() {
            return Err(ioerr!(UnexpectedEof, "tried to seek past eof"));
        }
        self.pos = pos;
        Ok(())
    }

    #[inline]
    fn size(&self) -> u64 {
        self.data.as_ref().len() as u64
    }
}
