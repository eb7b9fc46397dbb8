//! Chapter text files (`.chap`).
//!
//! One chapter per line:
//!
//! ```text
//! # language: eng
//! 0:00:00 - 0:01:30 Intro
//! 0:01:30 Main
//! 1:02:03.5 Credits
//! ```
//!
//! A line is a start time, an optional end time, and the title. The end
//! time may be preceded by a `-`; the writer always puts ` - ` there.
//! Times are `H:MM:SS` or `MM:SS`, with an optional fraction of up to 9
//! digits. Blank lines and lines starting with `#` are skipped; a
//! `# language: xxx` comment sets the language of all chapters.
//!
//! A title that is a single digit means "no title", and is read as `#`.
//!
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::chapter::{fill_end_times, MediaChapter};
use crate::error::{ChapterError, Result};

/// Chapter files this size or larger are not read.
pub const MAX_CHAPTER_FILE_SIZE: u64 = 10 * 1024;

/// Extension of chapter text files.
pub const CHAPTER_FILE_EXTENSION: &str = "chap";

/// Files with these extensions are never the media file that belongs
/// to a chapter file.
pub const IGNORED_EXTENSIONS: [&str; 10] = ["chap", "srt", "m3u", "m3u8", "ppl", "txt", "inf", "cfg", "exe", "dll"];

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?x)
        (\S+)                                       # start
        (?:\s*(?:-\s*)?(\d+:[0-9:.]+)(?:\s+|$))?    # end
        (.*)                                        # title
        $"#,
    )
    .unwrap()
});

// A title the parser would take for an end time.
static END_TIME_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:-\s*)?\d+:[0-9:.]+(?:\s|$)").unwrap());

static LANGUAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)#\s*language\s*:\s*(\S*)\s*$").unwrap());

static DURATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:(\d+):)?(\d+):(\d{2})(?:\.(\d{1,9}))?$").unwrap());

/// Parse a `H:MM:SS[.fff]` or `MM:SS[.fff]` duration.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let caps = DURATION_RE.captures(text)?;
    let hours = match caps.get(1) {
        Some(h) => h.as_str().parse::<u64>().ok()?,
        None => 0,
    };
    let minutes = caps[2].parse::<u64>().ok()?;
    let seconds = caps[3].parse::<u64>().ok()?;
    if seconds >= 60 || (caps.get(1).is_some() && minutes >= 60) {
        return None;
    }
    let nanos = match caps.get(4) {
        Some(f) => {
            let digits = f.as_str();
            digits.parse::<u32>().ok()? * 10u32.pow(9 - digits.len() as u32)
        },
        None => 0,
    };
    let secs = hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)?.checked_add(seconds)?;
    Some(Duration::new(secs, nanos))
}

/// Format a duration as `H:MM:SS`, with the shortest fraction that
/// represents it exactly.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let mut s = format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60);
    if d.subsec_nanos() > 0 {
        let frac = format!("{:09}", d.subsec_nanos());
        s.push('.');
        s.push_str(frac.trim_end_matches('0'));
    }
    s
}

/// Read a chapter text file.
pub fn read_chapter_file(path: impl AsRef<Path>) -> Result<Vec<MediaChapter>> {
    let path = path.as_ref();
    let size = fs::metadata(path)?.len();
    if size >= MAX_CHAPTER_FILE_SIZE {
        return Err(ChapterError::malformed(format!(
            "{}: chapter file too large ({} bytes)",
            path.display(),
            size
        )));
    }
    let data = fs::read(path)?;
    let (text, encoding) = decode_text(&data);
    log::debug!("read_chapter_file: {}: {} bytes, {}", path.display(), size, encoding);
    parse_chapters(&text)
}

/// Parse the contents of a chapter text file.
pub fn parse_chapters(text: &str) -> Result<Vec<MediaChapter>> {
    let mut language = String::new();
    let mut entries = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            if let Some(caps) = LANGUAGE_RE.captures(line) {
                language = caps[1].to_string();
            }
            continue;
        }
        let caps = LINE_RE
            .captures(line)
            .ok_or_else(|| ChapterError::malformed(format!("line {}: cannot parse {:?}", lineno + 1, line)))?;
        let start = parse_duration(&caps[1])
            .ok_or_else(|| ChapterError::malformed(format!("line {}: invalid start time {:?}", lineno + 1, &caps[1])))?;
        let end = match caps.get(2) {
            Some(end) => Some(parse_duration(end.as_str()).ok_or_else(|| {
                ChapterError::malformed(format!("line {}: invalid end time {:?}", lineno + 1, end.as_str()))
            })?),
            None => None,
        };
        if let Some(end) = end {
            if end < start {
                return Err(ChapterError::malformed(format!(
                    "line {}: end time {} before start time {}",
                    lineno + 1,
                    format_duration(end),
                    format_duration(start)
                )));
            }
        }
        let title = caps.get(3).map(|t| t.as_str().trim()).unwrap_or("");
        let title = if title.len() == 1 && title.as_bytes()[0].is_ascii_digit() {
            "#"
        } else {
            title
        };
        entries.push((title.to_string(), start, end));
    }

    if entries.is_empty() {
        return Err(ChapterError::NotFound("no chapters in chapter file"));
    }
    let mut chapters = Vec::with_capacity(entries.len());
    for (title, start, end) in entries {
        let chapter = MediaChapter::with_languages(vec![title], vec![language.clone()], start, end)
            .ok_or_else(|| ChapterError::malformed("chapter without title"))?;
        chapters.push(chapter);
    }
    Ok(fill_end_times(chapters))
}

/// Write chapters to a text file.
///
/// The extension of `path` is replaced by `.chap`, and an existing file
/// is overwritten. `language` selects which title of each chapter is
/// written. Returns the path of the file written.
pub fn write_chapter_file(path: impl AsRef<Path>, chapters: &[MediaChapter], language: usize) -> io::Result<PathBuf> {
    let path = path.as_ref().with_extension(CHAPTER_FILE_EXTENSION);
    let text = format_chapters(chapters, language)
        .map_err(|e| ioerr!(InvalidInput, "{}: {}", path.display(), e))?;
    fs::write(&path, text)?;
    log::debug!("write_chapter_file: {}: {} chapters", path.display(), chapters.len());
    Ok(path)
}

/// Format chapters the way [`write_chapter_file`] writes them.
///
/// A title that starts like an end time (`0:01:30 ...` or `- 0:01:30 ...`)
/// needs an explicit end time in front of it. Without an end time, the
/// start of the next chapter is written instead. For the last chapter
/// that is not possible, and such a title is an error.
pub fn format_chapters(chapters: &[MediaChapter], language: usize) -> io::Result<String> {
    let first = chapters.first().ok_or_else(|| ioerr!(InvalidInput, "no chapters to write"))?;
    let mut text = String::new();
    let lang = first.language_at(language);
    if !lang.is_empty() {
        text.push_str(&format!("# language: {}\n", lang));
    }
    for (idx, chapter) in chapters.iter().enumerate() {
        let title = chapter.title_at(language).replace(|c: char| c == '\r' || c == '\n', " ");
        let mut end = chapter.end();
        if end.is_none() && END_TIME_PREFIX_RE.is_match(title.trim_start()) {
            end = chapters
                .get(idx + 1)
                .map(|next| next.start())
                .filter(|&next| next >= chapter.start());
            if end.is_none() {
                return Err(ioerr!(
                    InvalidInput,
                    "chapter {}: title {:?} would be read as an end time",
                    idx + 1,
                    title
                ));
            }
        }
        text.push_str(&format_duration(chapter.start()));
        if let Some(end) = end {
            text.push_str(" - ");
            text.push_str(&format_duration(end));
        }
        if !title.is_empty() {
            text.push(' ');
            text.push_str(&title);
        }
        text.push('\n');
    }
    Ok(text)
}

// Decode text in an unknown encoding. A BOM or valid UTF-8 wins,
// otherwise the encoding is guessed.
fn decode_text(data: &[u8]) -> (String, &'static str) {
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(data, true);
    let encoding = detector.guess(None, true);
    let (text, encoding, _) = encoding.decode(data);
    (text.into_owned(), encoding.name())
}

fn has_ignored_extension(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => IGNORED_EXTENSIONS.iter().any(|i| i.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

// The directory of `path`, then the parent of that directory.
fn search_dirs(path: &Path) -> Vec<PathBuf> {
    let dir = match path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => PathBuf::from("."),
        Some(dir) => dir.to_path_buf(),
        None => return Vec::new(),
    };
    let mut dirs = vec![dir.clone()];
    if let Ok(dir) = dir.canonicalize() {
        if let Some(parent) = dir.parent() {
            dirs.push(parent.to_path_buf());
        }
    }
    dirs
}

/// Find the media file a chapter file belongs to.
///
/// That is a file with the same stem but another extension, in the same
/// directory as the chapter file or in its parent. Subtitles, playlists
/// and other files that are never media are ignored.
pub fn find_base_media_file(chap_path: impl AsRef<Path>) -> Option<PathBuf> {
    let chap_path = chap_path.as_ref();
    let stem = chap_path.file_stem()?;
    for dir in search_dirs(chap_path) {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.file_stem() == Some(stem) && p.extension().is_some())
            .filter(|p| !has_ignored_extension(p) && p.is_file())
            .collect();
        candidates.sort();
        if let Some(found) = candidates.into_iter().next() {
            log::debug!("find_base_media_file: {} -> {}", chap_path.display(), found.display());
            return Some(found);
        }
    }
    None
}

/// Find the chapter file for a media file: `<stem>.chap` in the media
/// file's directory or its parent.
pub fn find_chapter_file(media_path: impl AsRef<Path>) -> Option<PathBuf> {
    let media_path = media_path.as_ref();
    let name = media_path.with_extension(CHAPTER_FILE_EXTENSION);
    let name = name.file_name()?;
    search_dirs(media_path)
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|p| p.is_file())
}
