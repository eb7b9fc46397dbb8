use std::io;

use crate::boxes::prelude::*;

/// 8.6.1.2 Decoding Time to Sample Box (ISO/IEC 14496-12:2015(E))
#[derive(Clone, Debug, Default)]
pub struct TimeToSampleBox {
    pub entries: Vec<TimeToSampleEntry>,
}

/// Entry in TimeToSampleBox.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeToSampleEntry {
    pub count: u32,
    pub delta: u32,
}

impl TimeToSampleBox {
    pub fn read<R: ReadBytes>(scanner: &mut BoxScanner<R>) -> io::Result<TimeToSampleBox> {
        // version + flags.
        scanner.skip(4)?;
        let count = scanner.read::<u32>()? as u64;
        if count * 8 > scanner.left() {
            return Err(ioerr!(
                InvalidData,
                "stts: {} entries do not fit in {} bytes",
                count,
                scanner.left()
            ));
        }
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(TimeToSampleEntry {
                count: scanner.read::<u32>()?,
                delta: scanner.read::<u32>()?,
            });
        }
        Ok(TimeToSampleBox { entries })
    }
}
