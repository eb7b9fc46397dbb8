//! EBML, the element format of Matroska.
//!
//! An element is an ID, a data size, and data. Both the ID and the size
//! are variable length integers: the number of leading zero bits in the
//! first byte tells how many more bytes follow.
//!
//! - `1xxx xxxx`: 1 byte
//! - `01xx xxxx xxxx xxxx`: 2 bytes
//! - `001x xxxx ...`: 3 bytes
//! - `0001 xxxx ...`: 4 bytes
//!
//! And so on up to 8 bytes for sizes. IDs are at most 4 bytes and keep
//! their marker bits; sizes have the marker bit masked off.
//!
use std::io;

use crate::serialize::{read_uint, FromBytes, ReadBytes};
use crate::types::ElementId;

pub const EBML_HEADER: ElementId = ElementId(0x1A45DFA3);
pub const SEGMENT: ElementId = ElementId(0x18538067);
pub const SEEK_HEAD: ElementId = ElementId(0x114D9B74);
pub const SEEK: ElementId = ElementId(0x4DBB);
pub const SEEK_ID: ElementId = ElementId(0x53AB);
pub const SEEK_POSITION: ElementId = ElementId(0x53AC);
pub const CHAPTERS: ElementId = ElementId(0x1043A770);
pub const EDITION_ENTRY: ElementId = ElementId(0x45B9);
pub const CHAPTER_ATOM: ElementId = ElementId(0xB6);
pub const CHAPTER_TIME_START: ElementId = ElementId(0x91);
pub const CHAPTER_TIME_END: ElementId = ElementId(0x92);
pub const CHAPTER_DISPLAY: ElementId = ElementId(0x80);
pub const CHAP_STRING: ElementId = ElementId(0x85);
pub const CHAP_LANGUAGE: ElementId = ElementId(0x437C);

/// Data size of an element whose size is not known (all data bits set).
pub const UNKNOWN_SIZE: u64 = u64::MAX;

/// Number of bytes of a variable length integer, from its first byte.
fn vint_width(first: u8, max: u32) -> Option<u64> {
    let width = first.leading_zeros() + 1;
    if width > max {
        return None;
    }
    Some(width as u64)
}

/// Read an element ID.
pub fn read_element_id<R: ReadBytes + ?Sized>(stream: &mut R) -> io::Result<ElementId> {
    let pos = stream.pos();
    let first = u8::from_bytes(stream)?;
    let width = vint_width(first, 4)
        .ok_or_else(|| ioerr!(InvalidData, "ebml: invalid element id 0x{:02X} at {}", first, pos))?;
    let mut id = first as u32;
    for _ in 1..width {
        id = (id << 8) | u8::from_bytes(stream)? as u32;
    }
    Ok(ElementId(id))
}

/// Read an element data size.
///
/// Returns [`UNKNOWN_SIZE`] if all data bits are set.
pub fn read_data_size<R: ReadBytes + ?Sized>(stream: &mut R) -> io::Result<u64> {
    let pos = stream.pos();
    let first = u8::from_bytes(stream)?;
    let width = vint_width(first, 8)
        .ok_or_else(|| ioerr!(InvalidData, "ebml: invalid data size 0x00 at {}", pos))?;
    let mask = (0xffu16 >> width) as u8;
    let mut size = (first & mask) as u64;
    for _ in 1..width {
        size = (size << 8) | u8::from_bytes(stream)? as u64;
    }
    if size == (1u64 << (7 * width)) - 1 {
        return Ok(UNKNOWN_SIZE);
    }
    Ok(size)
}

/// Element header.
#[derive(Debug, Clone, Copy)]
pub struct ElementHeader {
    pub id:         ElementId,
    /// Data size, or [`UNKNOWN_SIZE`].
    pub size:       u64,
    /// Offset of the element ID.
    pub start:      u64,
    /// Offset of the first data byte.
    pub data_start: u64,
}

impl ElementHeader {
    /// Read an element header at the current position.
    pub fn read<R: ReadBytes + ?Sized>(stream: &mut R) -> io::Result<ElementHeader> {
        let start = stream.pos();
        let id = read_element_id(stream)?;
        let size = read_data_size(stream)?;
        let header = ElementHeader {
            id,
            size,
            start,
            data_start: stream.pos(),
        };
        log::trace!("ebml: {:?} at {}, size {}", id, start, size);
        Ok(header)
    }

    pub fn is_unknown_size(&self) -> bool {
        self.size == UNKNOWN_SIZE
    }

    /// Offset of the first byte after the element.
    ///
    /// An element that has an unknown size, or runs past `limit`, is
    /// invalid data.
    pub fn end(&self, limit: u64) -> io::Result<u64> {
        match self.data_start.checked_add(self.size) {
            Some(end) if !self.is_unknown_size() && end <= limit => Ok(end),
            _ => Err(ioerr!(
                InvalidData,
                "ebml: element {:?} at {} (size {}) extends past {}",
                self.id,
                self.start,
                self.size,
                limit
            )),
        }
    }
}

/// Read an unsigned integer element's data. An empty element is 0.
pub fn read_unsigned<R: ReadBytes + ?Sized>(stream: &mut R, size: u64) -> io::Result<u64> {
    match size {
        0 => Ok(0),
        _ => read_uint(stream, size),
    }
}

/// Read a string element's data. Trailing NUL padding is dropped.
pub fn read_string<R: ReadBytes + ?Sized>(stream: &mut R, size: u64) -> io::Result<String> {
    let data = stream.read(size)?;
    let len = data.iter().rposition(|&b| b != 0).map(|p| p + 1).unwrap_or(0);
    std::str::from_utf8(&data[..len])
        .map(|s| s.to_string())
        .map_err(|e| ioerr!(InvalidData, "ebml: invalid utf-8 string: {}", e))
}
