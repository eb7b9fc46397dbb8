//! QuickTime chapters.
//!
//! A QuickTime (or iTunes style mp4) file stores chapters in a text
//! track. Another track, usually the first video or audio track, points
//! at it through a `tref/chap` box. Every sample in the text track is
//! one chapter: the sample time is the start of the chapter, and the
//! sample data is a 16-bit length followed by the title.
//!
//! ```text
//! moov
//!   trak
//!     tref
//!       chap        -> track id of the chapter track
//!   trak            (the chapter track)
//!     mdia
//!       mdhd        -> time scale
//!       minf
//!         stbl
//!           stts    -> sample times
//!           stco    -> sample offsets (or co64)
//! ```
//!
use std::io;
use std::time::Duration;

use crate::boxes::{media_timescale, ChunkOffsetBox, TimeToSampleBox, TrackReferenceTypeBox};
use crate::chapter::{fill_end_times, MediaChapter};
use crate::error::{ChapterError, Result};
use crate::mp4box::BoxScanner;
use crate::serialize::{FromBytes, ReadBytes};

/// Read the QuickTime chapters from an ISO base media file.
pub fn chapters<R: ReadBytes>(stream: R) -> Result<Vec<MediaChapter>> {
    let mut scanner = BoxScanner::new(stream)?;
    scanner
        .find_box(b"moov")?
        .ok_or(ChapterError::NotFound("no moov box"))?;
    from_moov(&mut scanner)
}

/// Read the QuickTime chapters. The scanner must be inside `moov`.
pub fn from_moov<R: ReadBytes>(scanner: &mut BoxScanner<R>) -> Result<Vec<MediaChapter>> {
    let (track_number, trak_index) =
        find_chapter_reference(scanner)?.ok_or(ChapterError::NotFound("no chapter track reference"))?;
    log::debug!(
        "quicktime: trak #{} has a chapter reference to track {}",
        trak_index,
        track_number
    );
    enter_chapter_trak(scanner, track_number, trak_index)?;

    let mdia = scanner
        .find_box(b"mdia")?
        .ok_or_else(|| ChapterError::malformed("chapter track has no mdia box"))?;
    let timescale = media_timescale(scanner, &mdia)?;
    for fourcc in &[b"minf", b"stbl"] {
        if scanner.find_box(fourcc)?.is_none() {
            return Err(ChapterError::malformed(format!("chapter track has no {} box", fourcc_str(fourcc))));
        }
    }
    let stbl_depth = scanner.depth();

    if scanner.find_box(b"stts")?.is_none() {
        return Err(ChapterError::malformed("chapter track has no stts box"));
    }
    let stts = TimeToSampleBox::read(scanner)?;
    scanner.unwind(stbl_depth)?;

    let count = chapter_count(&stts);
    if count == 0 {
        return Err(ChapterError::NotFound("chapter track has no samples"));
    }

    let stco = read_chunk_offsets(scanner)?;
    if stco.offsets.len() as u64 != count {
        return Err(ChapterError::malformed(format!(
            "chapter track has {} chunk offsets for {} chapters",
            stco.offsets.len(),
            count
        )));
    }

    let starts = chapter_starts(&stts, timescale);
    let stream = scanner.stream();
    let mut chapters = Vec::with_capacity(starts.len());
    for (start, offset) in starts.into_iter().zip(stco.offsets) {
        let title = read_text_sample(stream, offset)?;
        log::trace!("quicktime: chapter at {:?}: {:?}", start, title);
        chapters.push(MediaChapter::new(title, start));
    }
    Ok(fill_end_times(chapters))
}

// Walk the trak boxes of moov and look for tref/chap.
//
// Returns the referenced track number and the 1-based index of the
// trak that holds the reference. The scanner is left in moov, just
// after that trak.
fn find_chapter_reference<R: ReadBytes>(scanner: &mut BoxScanner<R>) -> Result<Option<(u32, u32)>> {
    let moov_depth = scanner.depth();
    let mut trak_index = 0;
    while scanner.find_box(b"trak")?.is_some() {
        trak_index += 1;
        let mut track_id = None;
        if scanner.find_box(b"tref")?.is_some() && scanner.find_box(b"chap")?.is_some() {
            let chap = TrackReferenceTypeBox::read(scanner)?;
            track_id = Some(
                chap.track_ids
                    .first()
                    .copied()
                    .ok_or_else(|| ChapterError::malformed("empty chap track reference"))?,
            );
        }
        scanner.unwind(moov_depth)?;
        if let Some(track_id) = track_id {
            return Ok(Some((track_id, trak_index)));
        }
    }
    Ok(None)
}

// Descend into the chapter track.
//
// The track number is not looked up as a track id in the `tkhd` boxes.
// Instead the difference between the track number and the index of
// the referring trak is taken as the number of trak boxes to move
// forward. If that is negative, the track number is used as a 1-based
// index from the first trak. A reference to the referring trak itself
// is rejected.
fn enter_chapter_trak<R: ReadBytes>(scanner: &mut BoxScanner<R>, track_number: u32, trak_index: u32) -> Result<()> {
    let delta = track_number as i64 - trak_index as i64;
    let steps = if delta < 0 {
        scanner.rewind()?;
        track_number as i64
    } else {
        delta
    };
    if steps == 0 {
        return Err(ChapterError::malformed(format!(
            "chapter reference to track {} in trak #{} does not select another track",
            track_number, trak_index
        )));
    }
    for step in 1..=steps {
        if scanner.find_box(b"trak")?.is_none() {
            return Err(ChapterError::malformed(format!("chapter track {} not found", track_number)));
        }
        if step < steps {
            scanner.leave()?;
        }
    }
    Ok(())
}

// Number of chapters in the time-to-sample table.
//
// The first entry stands for exactly one chapter, at time 0. Every
// other entry adds `count` chapters.
fn chapter_count(stts: &TimeToSampleBox) -> u64 {
    match stts.entries.split_first() {
        Some((_, rest)) => 1 + rest.iter().map(|e| e.count as u64).sum::<u64>(),
        None => 0,
    }
}

// Start times of the chapters.
//
// The first chapter starts at 0. The first entry of the table only
// stands for that chapter, its count and delta are not used. For every
// sample of the following entries the time moves forward by the delta
// of that entry, and a chapter starts at the new time.
fn chapter_starts(stts: &TimeToSampleBox, timescale: u32) -> Vec<Duration> {
    let mut starts = vec![Duration::from_secs(0)];
    let mut units = 0u64;
    for entry in stts.entries.iter().skip(1) {
        for _ in 0..entry.count {
            units += entry.delta as u64;
            starts.push(to_duration(units, timescale));
        }
    }
    starts
}

/// Convert media time units to a duration, truncated to nanoseconds.
pub fn to_duration(units: u64, timescale: u32) -> Duration {
    let timescale = std::cmp::max(timescale, 1) as u64;
    let secs = units / timescale;
    let nanos = (units % timescale) * 1_000_000_000 / timescale;
    Duration::new(secs, nanos as u32)
}

// stco, or if that is not there, co64. Afterwards the scanner is back
// at the stbl level.
fn read_chunk_offsets<R: ReadBytes>(scanner: &mut BoxScanner<R>) -> Result<ChunkOffsetBox> {
    let stbl_depth = scanner.depth();
    for fourcc in &[b"stco", b"co64"] {
        scanner.rewind()?;
        if scanner.find_box(fourcc)?.is_some() {
            let stco = ChunkOffsetBox::read(scanner)?;
            scanner.unwind(stbl_depth)?;
            return Ok(stco);
        }
    }
    Err(ChapterError::malformed("chapter track has no stco or co64 box"))
}

/// Read a text sample at an absolute file offset.
///
/// The sample is a 16-bit length and then the text. The text is UTF-8,
/// or UTF-16 if it starts with a byte order mark.
pub fn read_text_sample<R: ReadBytes>(stream: &mut R, offset: u64) -> io::Result<String> {
    stream.seek(offset)?;
    let len = u16::from_bytes(stream)? as u64;
    let data = stream.read(len)?;
    decode_text(data)
}

fn decode_text(data: &[u8]) -> io::Result<String> {
    let encoding = if data.starts_with(&[0xfe, 0xff]) {
        encoding_rs::UTF_16BE
    } else if data.starts_with(&[0xff, 0xfe]) {
        encoding_rs::UTF_16LE
    } else {
        return std::str::from_utf8(data)
            .map(|s| s.to_string())
            .map_err(|e| ioerr!(InvalidData, "chapter title: {}", e));
    };
    let (text, had_errors) = encoding.decode_with_bom_removal(data);
    if had_errors {
        return Err(ioerr!(InvalidData, "chapter title: invalid {}", encoding.name()));
    }
    Ok(text.into_owned())
}

fn fourcc_str(fourcc: &[u8; 4]) -> String {
    String::from_utf8_lossy(fourcc).into_owned()
}
