use std::io;

use crate::boxes::prelude::*;

/// Offset of the time scale in the payload of `mdia`: the `mdhd` box
/// header (8), version and flags (4), creation and modification time (8).
pub const MDIA_TIMESCALE_OFFSET: u64 = 20;

/// Read the media time scale of a track.
///
/// This reads at a fixed offset from the start of the `mdia` payload,
/// which holds for a version 0 `mdhd` that is the first child of `mdia`.
/// A time scale of 0 is returned as 1.
///
/// Afterwards the scanner is positioned at the start of `mdia` again.
pub fn media_timescale<R: ReadBytes>(scanner: &mut BoxScanner<R>, mdia: &BoxRange) -> io::Result<u32> {
    scanner.seek(mdia.content_start + MDIA_TIMESCALE_OFFSET)?;
    let timescale = scanner.read::<u32>()?;
    scanner.rewind()?;
    Ok(if timescale == 0 { 1 } else { timescale })
}
