use std::io;

use crate::boxes::prelude::*;
use crate::serialize::read_utf8;

/// Chapter List ("Nero" format).
#[derive(Clone, Debug, Default)]
pub struct ChapterListBox {
    pub chapters: Vec<NeroChapter>,
}

/// Chapter ("Nero" format).
///
/// `start` is in units of 100 nanoseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeroChapter {
    pub start: u64,
    pub title: String,
}

impl ChapterListBox {
    pub fn read<R: ReadBytes>(scanner: &mut BoxScanner<R>) -> io::Result<ChapterListBox> {
        // version, flags, reserved.
        scanner.skip(5)?;
        let count = scanner.read::<u32>()?;
        // every entry is at least 9 bytes.
        if count as u64 * 9 > scanner.left() {
            return Err(ioerr!(InvalidData, "chpl: {} chapters do not fit in {} bytes", count, scanner.left()));
        }
        let mut chapters = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let high = scanner.read::<u32>()? as u64;
            let low = scanner.read::<u32>()? as u64;
            let len = scanner.read::<u8>()? as u64;
            let mut data = scanner.read_bytes(len)?;
            let title = read_utf8(&mut data, len)?;
            chapters.push(NeroChapter {
                start: (high << 32) | low,
                title,
            });
        }
        Ok(ChapterListBox { chapters })
    }
}
