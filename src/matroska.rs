//! Matroska chapters.
//!
//! We do not scan the segment. The chapters are found through the
//! `SeekHead` that directly follows the `Segment` header; a file without
//! a seek entry for `Chapters` has no chapters as far as we are concerned.
//!
//! Only the first `EditionEntry` is used. Nested chapter atoms are skipped.
//!
use std::time::Duration;

use crate::chapter::{fill_end_times, MediaChapter};
use crate::ebml::*;
use crate::error::{ChapterError, Result};
use crate::serialize::ReadBytes;

/// Magic bytes at the start of every EBML file.
pub const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Does this look like the start of an EBML file.
pub fn is_ebml(head: &[u8]) -> bool {
    head.starts_with(&EBML_MAGIC)
}

/// Read the chapters from a Matroska / WebM file.
pub fn chapters<R: ReadBytes>(mut stream: R) -> Result<Vec<MediaChapter>> {
    stream.seek(0)?;
    let file_end = stream.size();

    let header = ElementHeader::read(&mut stream)?;
    if header.id != EBML_HEADER {
        return Err(ChapterError::NotFound("no EBML header"));
    }
    stream.seek(header.end(file_end)?)?;

    let segment = ElementHeader::read(&mut stream)?;
    if segment.id != SEGMENT {
        return Err(ChapterError::NotFound("no Segment element"));
    }
    // The size can be unknown (live streams), or larger than the file if
    // it was cut short. Either way, stop at the end of the file.
    let segment_start = segment.data_start;
    let segment_end = std::cmp::min(segment_start.saturating_add(segment.size), file_end);

    let position = chapters_position(&mut stream, segment_start, segment_end)?
        .ok_or(ChapterError::NotFound("no Chapters entry in SeekHead"))?;
    let offset = segment_start
        .checked_add(position)
        .filter(|&offset| offset < segment_end)
        .ok_or_else(|| ChapterError::malformed(format!("Chapters seek position {} out of range", position)))?;
    log::debug!("matroska: Chapters at {}", offset);

    stream.seek(offset)?;
    let header = ElementHeader::read(&mut stream)?;
    if header.id != CHAPTERS {
        return Err(ChapterError::malformed(format!(
            "expected Chapters at {}, found {:?}",
            offset, header.id
        )));
    }
    let chapters_end = header.end(segment_end)?;

    let mut edition = None;
    for_each_child(&mut stream, header.data_start, chapters_end, |_, child| {
        if child.id == EDITION_ENTRY {
            edition = Some(*child);
            return Ok(false);
        }
        Ok(true)
    })?;
    let edition = edition.ok_or(ChapterError::NotFound("no EditionEntry"))?;
    let edition_end = edition.end(chapters_end)?;

    let mut chapters = Vec::new();
    for_each_child(&mut stream, edition.data_start, edition_end, |stream, child| {
        if child.id == CHAPTER_ATOM {
            let end = child.end(edition_end)?;
            chapters.push(read_chapter_atom(stream, child.data_start, end)?);
        }
        Ok(true)
    })?;

    if chapters.is_empty() {
        return Err(ChapterError::NotFound("no ChapterAtom in EditionEntry"));
    }
    Ok(fill_end_times(chapters))
}

// Find the SeekHead right after the segment header, and look in it for
// the position of the Chapters element, relative to the segment start.
fn chapters_position<R: ReadBytes>(stream: &mut R, segment_start: u64, segment_end: u64) -> Result<Option<u64>> {
    stream.seek(segment_start)?;
    let header = ElementHeader::read(stream)?;
    if header.id != SEEK_HEAD {
        return Err(ChapterError::NotFound("no SeekHead after Segment header"));
    }
    let seek_head_end = header.end(segment_end)?;

    let chapters_id = CHAPTERS.to_bytes();
    let mut position = None;
    for_each_child(stream, header.data_start, seek_head_end, |stream, seek| {
        if seek.id != SEEK {
            return Ok(true);
        }
        let mut id = None;
        let mut pos = None;
        for_each_child(stream, seek.data_start, seek.end(seek_head_end)?, |stream, child| {
            if child.id == SEEK_ID {
                id = Some(stream.read(child.size)?.to_vec());
            } else if child.id == SEEK_POSITION {
                pos = Some(read_unsigned(stream, child.size)?);
            }
            Ok(true)
        })?;
        if id.as_ref() == Some(&chapters_id) {
            position = pos;
            return Ok(position.is_none());
        }
        Ok(true)
    })?;
    Ok(position)
}

fn read_chapter_atom<R: ReadBytes>(stream: &mut R, start: u64, end: u64) -> Result<MediaChapter> {
    let mut time_start = None;
    let mut time_end = None;
    let mut titles = Vec::new();
    let mut languages = Vec::new();

    for_each_child(stream, start, end, |stream, child| {
        match child.id {
            CHAPTER_TIME_START => time_start = Some(read_unsigned(stream, child.size)?),
            CHAPTER_TIME_END => time_end = Some(read_unsigned(stream, child.size)?),
            CHAPTER_DISPLAY => {
                let display_end = child.end(end)?;
                for_each_child(stream, child.data_start, display_end, |stream, child| {
                    match child.id {
                        CHAP_STRING => titles.push(read_string(stream, child.size)?),
                        CHAP_LANGUAGE => languages.push(read_string(stream, child.size)?),
                        _ => {},
                    }
                    Ok(true)
                })?;
            },
            _ => {},
        }
        Ok(true)
    })?;

    let time_start =
        time_start.ok_or_else(|| ChapterError::malformed(format!("ChapterAtom at {} has no start time", start)))?;
    let (n_titles, n_languages) = (titles.len(), languages.len());
    MediaChapter::with_languages(
        titles,
        languages,
        Duration::from_nanos(time_start),
        time_end.map(Duration::from_nanos),
    )
    .ok_or_else(|| {
        ChapterError::malformed(format!(
            "ChapterAtom at {}: {} titles, {} languages",
            start, n_titles, n_languages
        ))
    })
}

// Call `f` for every child element in `[start, end)`, with the stream
// positioned at the child's data. Stops early if `f` returns false.
fn for_each_child<R, F>(stream: &mut R, start: u64, end: u64, mut f: F) -> Result<()>
where
    R: ReadBytes,
    F: FnMut(&mut R, &ElementHeader) -> Result<bool>,
{
    let mut pos = start;
    while pos < end {
        stream.seek(pos)?;
        let child = ElementHeader::read(stream)?;
        let child_end = child.end(end)?;
        if !f(stream, &child)? {
            break;
        }
        pos = child_end;
    }
    Ok(())
}
