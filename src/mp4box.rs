//! Finding boxes in an ISO base media / QuickTime file.
//!
//! We never parse the whole box tree. Instead we look for one box at a
//! time by name, within the bounds of the box we are in, and descend
//! into it. The [`BoxScanner`] keeps a stack of the boxes it is in, so
//! that after looking inside a child it can continue with the child's
//! next sibling.
//!
use std::io;

use crate::serialize::{FromBytes, ReadBytes};
use crate::types::FourCC;

/// Top-level box types. If the second 4 bytes of a file are one of
/// these, it is an ISO base media / QuickTime file.
pub const ROOT_ATOM_TYPES: [&[u8; 4]; 12] = [
    b"ftyp", b"moov", b"mdat", b"pdin", b"moof", b"mfra", b"stts", b"stsc", b"stsz", b"meta",
    b"free", b"skip",
];

/// Does this look like the start of an ISO base media file.
pub fn is_iso_media(head: &[u8]) -> bool {
    head.len() >= 8 && ROOT_ATOM_TYPES.iter().any(|t| &head[4..8] == &t[..])
}

/// Box header.
#[derive(Debug, Clone)]
pub struct BoxHeader {
    /// Size of the entire box, including the header.
    pub size:        u64,
    pub fourcc:      FourCC,
    /// 8, or 16 if the box has a 64-bit size.
    pub header_size: u64,
}

impl BoxHeader {
    /// Read a box header at the current position.
    ///
    /// A size of 0 means the box extends to the end of the file, a size
    /// of 1 means a 64-bit size follows the fourcc.
    pub fn read<R: ReadBytes + ?Sized>(stream: &mut R) -> io::Result<BoxHeader> {
        let start = stream.pos();
        let size1 = u32::from_bytes(stream)?;
        let fourcc = FourCC::from_bytes(stream)?;
        let (size, header_size) = match size1 {
            0 => (stream.size() - start, 8),
            1 => (u64::from_bytes(stream)?, 16),
            x => (x as u64, 8),
        };
        if size < header_size {
            return Err(ioerr!(InvalidData, "box {} at {}: invalid size {}", fourcc, start, size));
        }
        Ok(BoxHeader {
            size,
            fourcc,
            header_size,
        })
    }
}

/// Location of a box in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxRange {
    pub fourcc:        FourCC,
    /// Offset of the box header.
    pub start:         u64,
    /// Offset of the first byte after the header.
    pub content_start: u64,
    /// Offset of the first byte after the box.
    pub end:           u64,
}

impl BoxRange {
    pub fn content_len(&self) -> u64 {
        self.end - self.content_start
    }
}

/// Find the first box named `fourcc` in `[start, end)`.
///
/// On success the stream is positioned at the start of the box content.
/// A box that claims to extend past `end` is invalid data.
pub fn find_box<R: ReadBytes + ?Sized>(
    stream: &mut R,
    fourcc: &[u8; 4],
    start: u64,
    end: u64,
) -> io::Result<Option<BoxRange>> {
    let mut pos = start;
    while pos < end && end - pos >= 8 {
        stream.seek(pos)?;
        let header = BoxHeader::read(stream)?;
        let box_end = match pos.checked_add(header.size) {
            Some(box_end) if box_end <= end => box_end,
            _ => {
                return Err(ioerr!(
                    InvalidData,
                    "box {} at {} (size {}) extends past its container end {}",
                    header.fourcc,
                    pos,
                    header.size,
                    end
                ))
            },
        };
        log::trace!("find_box: {} at {}, size {}", header.fourcc, pos, header.size);
        if header.fourcc == fourcc {
            let range = BoxRange {
                fourcc:        header.fourcc,
                start:         pos,
                content_start: pos + header.header_size,
                end:           box_end,
            };
            stream.seek(range.content_start)?;
            return Ok(Some(range));
        }
        pos = box_end;
    }
    Ok(None)
}

// What we need to get back to the parent level after leaving a box.
#[derive(Debug, Clone, Copy)]
struct Frame {
    parent_end: u64,
    range:      BoxRange,
}

/// Walks a box tree, one named box at a time.
///
/// The scanner always has a current container: the box it last
/// descended into, or the whole file. [`find_box`](BoxScanner::find_box)
/// searches from the current position to the end of the current
/// container, and if it finds the box, descends into it.
///
/// Every successful `find_box` pushes a frame on the scanner's stack.
/// [`leave`](BoxScanner::leave) pops it again and positions the scanner
/// at the next sibling of the box it left. To look at the siblings of
/// a box after a (failed or successful) deeper search, take the
/// [`depth`](BoxScanner::depth) before descending and
/// [`unwind`](BoxScanner::unwind) to it afterwards.
///
/// All reads through the scanner are bounded by the current container.
pub struct BoxScanner<R> {
    stream: R,
    end:    u64,
    stack:  Vec<Frame>,
}

impl<R: ReadBytes> BoxScanner<R> {
    /// Start scanning at the beginning of the stream.
    pub fn new(mut stream: R) -> io::Result<BoxScanner<R>> {
        stream.seek(0)?;
        let end = stream.size();
        Ok(BoxScanner {
            stream,
            end,
            stack: Vec::new(),
        })
    }

    /// Find the next box named `fourcc` in the current container, and
    /// descend into it.
    ///
    /// If the box is not found, the position is left at the end of the
    /// container and the stack is unchanged.
    pub fn find_box(&mut self, fourcc: &[u8; 4]) -> io::Result<Option<BoxRange>> {
        let start = self.stream.pos();
        match find_box(&mut self.stream, fourcc, start, self.end)? {
            Some(range) => {
                self.stack.push(Frame {
                    parent_end: self.end,
                    range,
                });
                self.end = range.end;
                Ok(Some(range))
            },
            None => {
                if start < self.end {
                    self.stream.seek(self.end)?;
                }
                Ok(None)
            },
        }
    }

    /// Leave the current box. The scanner continues with the box's
    /// next sibling.
    pub fn leave(&mut self) -> io::Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| ioerr!(InvalidInput, "BoxScanner::leave: not inside a box"))?;
        self.end = frame.parent_end;
        self.stream.seek(frame.range.end)
    }

    /// Number of boxes we are in.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Leave boxes until we are `depth` levels deep.
    pub fn unwind(&mut self, depth: usize) -> io::Result<()> {
        while self.stack.len() > depth {
            self.leave()?;
        }
        Ok(())
    }

    /// Start searching the current container from its first child again.
    pub fn rewind(&mut self) -> io::Result<()> {
        let start = self.stack.last().map(|f| f.range.content_start).unwrap_or(0);
        self.stream.seek(start)
    }

    /// The box we are in, if any.
    pub fn container(&self) -> Option<BoxRange> {
        self.stack.last().map(|f| f.range)
    }

    /// End of the current container.
    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn pos(&self) -> u64 {
        self.stream.pos()
    }

    /// Bytes left in the current container.
    pub fn left(&self) -> u64 {
        self.end.saturating_sub(self.stream.pos())
    }

    /// Read a value from the current container.
    pub fn read<T: FromBytes>(&mut self) -> io::Result<T> {
        self.check_left(T::min_size() as u64)?;
        T::from_bytes(&mut self.stream)
    }

    /// Read `amount` bytes from the current container.
    pub fn read_bytes(&mut self, amount: u64) -> io::Result<&[u8]> {
        self.check_left(amount)?;
        self.stream.read(amount)
    }

    /// Skip `amount` bytes in the current container.
    pub fn skip(&mut self, amount: u64) -> io::Result<()> {
        self.check_left(amount)?;
        self.stream.skip(amount)
    }

    /// Seek within the current container.
    pub fn seek(&mut self, pos: u64) -> io::Result<()> {
        let start = self.container().map(|c| c.content_start).unwrap_or(0);
        if pos < start || pos > self.end {
            return Err(ioerr!(UnexpectedEof, "seek to {} outside of container [{}, {})", pos, start, self.end));
        }
        self.stream.seek(pos)
    }

    /// The underlying stream, for reads outside of the box tree (such
    /// as sample data referenced by a chunk offset). This moves the
    /// position without the scanner knowing, so call `rewind` or `seek`
    /// before using the scanner again.
    pub fn stream(&mut self) -> &mut R {
        &mut self.stream
    }

    fn check_left(&self, amount: u64) -> io::Result<()> {
        if amount > self.left() {
            let fourcc = self.container().map(|c| c.fourcc.to_string()).unwrap_or_default();
            return Err(ioerr!(
                UnexpectedEof,
                "read of {} bytes at {} past end of box {} ({})",
                amount,
                self.stream.pos(),
                fourcc,
                self.end
            ));
        }
        Ok(())
    }
}
