//! Nero chapters.
//!
//! Nero stores a flat chapter list in a `chpl` box in `moov/udta`.
//! There can be more than one `udta` box; we use the first one that
//! has a `chpl` in it.
//!
use std::time::Duration;

use crate::boxes::ChapterListBox;
use crate::chapter::{fill_end_times, MediaChapter};
use crate::error::{ChapterError, Result};
use crate::mp4box::BoxScanner;
use crate::serialize::ReadBytes;

/// Read the Nero chapters from an ISO base media file.
pub fn chapters<R: ReadBytes>(stream: R) -> Result<Vec<MediaChapter>> {
    let mut scanner = BoxScanner::new(stream)?;
    scanner
        .find_box(b"moov")?
        .ok_or(ChapterError::NotFound("no moov box"))?;
    from_moov(&mut scanner)
}

/// Read the Nero chapters. The scanner must be inside `moov`.
pub fn from_moov<R: ReadBytes>(scanner: &mut BoxScanner<R>) -> Result<Vec<MediaChapter>> {
    let moov_depth = scanner.depth();
    while scanner.find_box(b"udta")?.is_some() {
        if scanner.find_box(b"chpl")?.is_some() {
            let chpl = ChapterListBox::read(scanner)?;
            scanner.unwind(moov_depth)?;
            log::debug!("nero: chpl box with {} chapters", chpl.chapters.len());
            if chpl.chapters.is_empty() {
                return Err(ChapterError::NotFound("empty chpl box"));
            }
            let chapters = chpl
                .chapters
                .into_iter()
                .map(|c| MediaChapter::new(c.title, ticks_to_duration(c.start)))
                .collect();
            return Ok(fill_end_times(chapters));
        }
        scanner.unwind(moov_depth)?;
    }
    Err(ChapterError::NotFound("no chpl box"))
}

/// Convert 100-nanosecond ticks to a duration.
pub fn ticks_to_duration(ticks: u64) -> Duration {
    Duration::new(ticks / 10_000_000, (ticks % 10_000_000) as u32 * 100)
}
