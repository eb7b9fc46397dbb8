//! Positioned byte reading.
//!
//! The `ReadBytes` trait is the byte source every parser in this crate
//! reads from, and `FromBytes` decodes the big-endian primitives that
//! both the ISO box format and EBML use.
//!
use std::convert::TryInto;
use std::io;

use auto_impl::auto_impl;

/// Byte reader with absolute positioning.
///
/// Reads never go past `size()`; a short read is an `UnexpectedEof` error,
/// never a partial result.
#[auto_impl(&mut)]
pub trait ReadBytes {
    /// Read an exact number of bytes, return a reference to the buffer.
    fn read(&mut self, amount: u64) -> io::Result<&[u8]>;
    /// Skip some bytes in the input.
    fn skip(&mut self, amount: u64) -> io::Result<()>;
    /// Get current position in the stream.
    fn pos(&self) -> u64;
    /// Seek to an absolute position. Seeking to `size()` is allowed.
    fn seek(&mut self, pos: u64) -> io::Result<()>;
    /// Size of the underlying data.
    fn size(&self) -> u64;

    /// How much data is left?
    fn left(&self) -> u64 {
        self.size().saturating_sub(self.pos())
    }
}

/// Implementation of ReadBytes on a byte slice.
///
/// The slice is consumed as it is read, so positions are relative to
/// what is left of it. Seeking is only possible forward.
impl ReadBytes for &[u8] {
    fn read(&mut self, amount: u64) -> io::Result<&[u8]> {
        if amount > (*self).len() as u64 {
            return Err(ioerr!(UnexpectedEof));
        }
        let data: &[u8] = *self;
        let (res, rest) = data.split_at(amount as usize);
        *self = rest;
        Ok(res)
    }

    fn skip(&mut self, amount: u64) -> io::Result<()> {
        self.read(amount).map(|_| ())
    }

    fn pos(&self) -> u64 {
        0
    }

    fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.skip(pos)
    }

    #[inline]
    fn size(&self) -> u64 {
        (*self).len() as u64
    }
}

/// Trait to deserialize a type.
pub trait FromBytes {
    fn from_bytes<R: ReadBytes + ?Sized>(bytes: &mut R) -> io::Result<Self>
    where
        Self: Sized;
    fn min_size() -> usize;
}

// Convenience macro to implement FromBytes for u* types.
macro_rules! def_from_bytes {
    ($type:ident) => {
        impl FromBytes for $type {
            fn from_bytes<R: ReadBytes + ?Sized>(bytes: &mut R) -> io::Result<Self> {
                let sz = std::mem::size_of::<$type>();
                let data = bytes.read(sz as u64)?;
                let data = data.try_into().map_err(|_| ioerr!(UnexpectedEof))?;
                Ok($type::from_be_bytes(data))
            }
            fn min_size() -> usize {
                std::mem::size_of::<$type>()
            }
        }
    };
}

def_from_bytes!(u8);
def_from_bytes!(u16);
def_from_bytes!(u32);
def_from_bytes!(u64);

/// Read a big-endian unsigned integer of 1 to 8 bytes.
pub fn read_uint<R: ReadBytes + ?Sized>(stream: &mut R, len: u64) -> io::Result<u64> {
    if len == 0 || len > 8 {
        return Err(ioerr!(InvalidData, "cannot read a {}-byte unsigned integer", len));
    }
    let data = stream.read(len)?;
    Ok(data.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

/// Read a length-prefixed byte string as UTF-8.
pub fn read_utf8<R: ReadBytes + ?Sized>(stream: &mut R, len: u64) -> io::Result<String> {
    let data = stream.read(len)?;
    std::str::from_utf8(data)
        .map(|s| s.to_string())
        .map_err(|e| ioerr!(InvalidData, "invalid utf-8 string: {}", e))
}
