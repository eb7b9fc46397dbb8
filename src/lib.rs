//! Read chapter markers from media files.
//!
//! Supported are:
//!
//! - QuickTime / iTunes chapters: a text track referenced by `tref/chap`.
//! - Nero chapters: a `chpl` box in `moov/udta`.
//! - Matroska / WebM chapters, found through the `SeekHead`.
//! - `.chap` text files, see [`chapfile`].
//!
//! Nothing is decoded but the chapter metadata. A chapter list is
//! either read completely or not at all.
//!
#[macro_use]
mod ioerr;
pub mod serialize;
pub mod boxes;
pub mod chapfile;
pub mod chapter;
pub mod ebml;
pub mod error;
pub mod info;
pub mod io;
pub mod matroska;
pub mod mp4box;
pub mod nero;
pub mod quicktime;
pub mod types;

#[cfg(test)]
mod test_support;

use std::path::Path;

pub use crate::chapfile::{
    find_base_media_file, find_chapter_file, read_chapter_file, write_chapter_file, CHAPTER_FILE_EXTENSION,
    IGNORED_EXTENSIONS, MAX_CHAPTER_FILE_SIZE,
};
pub use crate::chapter::{fill_end_times, MediaChapter};
pub use crate::error::ChapterError;
pub use crate::mp4box::ROOT_ATOM_TYPES;

use crate::error::Result;
use crate::io::MediaFile;
use crate::mp4box::BoxScanner;
use crate::serialize::ReadBytes;

/// Container family of a media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// ISO base media file format: mp4, m4a, m4b, mov, 3gp.
    IsoMedia,
    /// EBML: mkv, mka, webm.
    Matroska,
}

/// Find out what kind of file this is from its first 8 bytes.
pub fn sniff(head: &[u8]) -> Option<ContainerKind> {
    if mp4box::is_iso_media(head) {
        Some(ContainerKind::IsoMedia)
    } else if matroska::is_ebml(head) {
        Some(ContainerKind::Matroska)
    } else {
        None
    }
}

/// Read the chapters of a media file.
///
/// For ISO media files QuickTime chapters are tried first, then Nero
/// chapters. The file is only open for the duration of the call.
pub fn read_chapters(path: impl AsRef<Path>) -> Result<Vec<MediaChapter>> {
    let path = path.as_ref();
    let file = MediaFile::open(path)?;
    let kind = sniff(file.head(8));
    log::debug!("read_chapters: {}: {:?}", path.display(), kind);
    match kind {
        Some(ContainerKind::IsoMedia) => iso_chapters(file),
        Some(ContainerKind::Matroska) => matroska::chapters(file),
        None => Err(ChapterError::NotFound("unknown file format")),
    }
}

/// Like [`read_chapters`], but failure is just "no chapters".
pub fn media_chapters(path: impl AsRef<Path>) -> Option<Vec<MediaChapter>> {
    let path = path.as_ref();
    match read_chapters(path) {
        Ok(chapters) => Some(chapters),
        Err(e) => {
            log::debug!("media_chapters: {}: {}", path.display(), e);
            None
        },
    }
}

/// Read QuickTime chapters, or if there are none, Nero chapters.
pub fn iso_chapters<R: ReadBytes>(stream: R) -> Result<Vec<MediaChapter>> {
    let mut scanner = BoxScanner::new(stream)?;
    scanner
        .find_box(b"moov")?
        .ok_or(ChapterError::NotFound("no moov box"))?;
    let moov_depth = scanner.depth();

    let qt_err = match quicktime::from_moov(&mut scanner) {
        Ok(chapters) => return Ok(chapters),
        Err(ChapterError::Io(e)) => return Err(ChapterError::Io(e)),
        Err(e) => e,
    };
    log::debug!("iso_chapters: no quicktime chapters ({}), trying nero", qt_err);

    scanner.unwind(moov_depth)?;
    scanner.rewind()?;
    match nero::from_moov(&mut scanner) {
        Err(e) if e.is_not_found() => Err(qt_err),
        res => res,
    }
}
