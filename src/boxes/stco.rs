use std::io;

use crate::boxes::prelude::*;

/// 8.7.5 Chunk Offset Box  (ISO/IEC 14496-12:2015(E))
///
/// Implements both "stco" and "co64".
#[derive(Clone, Debug, Default)]
pub struct ChunkOffsetBox {
    pub offsets: Vec<u64>,
}

impl ChunkOffsetBox {
    /// Read the offsets. The width of an entry depends on the fourcc
    /// of the box the scanner is in.
    pub fn read<R: ReadBytes>(scanner: &mut BoxScanner<R>) -> io::Result<ChunkOffsetBox> {
        let large = match scanner.container() {
            Some(c) if c.fourcc == b"co64" => true,
            Some(c) if c.fourcc == b"stco" => false,
            other => {
                return Err(ioerr!(InvalidInput, "ChunkOffsetBox: cannot read from {:?}", other.map(|c| c.fourcc)))
            },
        };
        // version + flags.
        scanner.skip(4)?;
        let count = scanner.read::<u32>()? as u64;
        let entry_size = if large { 8 } else { 4 };
        if count * entry_size > scanner.left() {
            return Err(ioerr!(
                InvalidData,
                "chunk offsets: {} entries do not fit in {} bytes",
                count,
                scanner.left()
            ));
        }
        let mut offsets = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let offset = if large {
                scanner.read::<u64>()?
            } else {
                scanner.read::<u32>()? as u64
            };
            offsets.push(offset);
        }
        Ok(ChunkOffsetBox { offsets })
    }
}
