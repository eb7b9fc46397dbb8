//! Tag types of the two binary container formats.
//!
use std::fmt::{self, Debug, Display};
use std::io;

use crate::serialize::{FromBytes, ReadBytes};

/// FourCC is the 4-byte name of any box. Usually this is four bytes
/// of ASCII characters, but it could be anything.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub u32);

impl FourCC {
    pub const fn new(tag: &[u8; 4]) -> FourCC {
        FourCC(u32::from_be_bytes(*tag))
    }

    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl FromBytes for FourCC {
    fn from_bytes<R: ReadBytes + ?Sized>(stream: &mut R) -> io::Result<Self> {
        Ok(FourCC(u32::from_bytes(stream)?))
    }
    fn min_size() -> usize {
        4
    }
}

impl PartialEq<&[u8; 4]> for FourCC {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        self.0 == u32::from_be_bytes(**other)
    }
}

impl Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let c = self.to_be_bytes();
        if c.iter().any(|&b| b < 32 || b > 126) {
            return write!(f, "0x{:08x}", self.0);
        }
        // all printable ascii, so this is valid utf-8.
        write!(f, "{}", String::from_utf8_lossy(&c))
    }
}

impl Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

/// An EBML element ID.
///
/// This is the raw ID, including the length-marker bits of the first
/// byte, stored big-endian in a `u32`. So the Matroska `Segment` element
/// (bytes `18 53 80 67`) is `ElementId(0x18538067)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);

impl ElementId {
    /// Number of bytes the ID takes in the stream.
    pub fn len(&self) -> usize {
        match self.0 {
            0..=0xff => 1,
            0x100..=0xffff => 2,
            0x1_0000..=0xff_ffff => 3,
            _ => 4,
        }
    }

    /// The raw ID bytes as they appear in the stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_be_bytes()[4 - self.len()..].to_vec()
    }
}

impl Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ElementId(0x{:X})", self.0)
    }
}
