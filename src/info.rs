//! Chapter summaries, for display and JSON output.
//!
use std::fmt::{self, Display};
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::chapfile::format_duration;
use crate::chapter::MediaChapter;

/// Summary of one chapter.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterInfo {
    /// 1-based.
    pub index:     usize,
    #[serde(serialize_with = "seconds")]
    pub start:     Duration,
    #[serde(serialize_with = "opt_seconds", skip_serializing_if = "Option::is_none")]
    pub end:       Option<Duration>,
    /// The selected title.
    pub title:     String,
    pub language:  String,
    pub titles:    Vec<String>,
    pub languages: Vec<String>,
}

impl Display for ChapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.index, format_duration(self.start))?;
        if let Some(end) = self.end {
            write!(f, " - {}", format_duration(end))?;
        }
        write!(f, " {}", self.title)?;
        if !self.language.is_empty() {
            write!(f, " [{}]", self.language)?;
        }
        Ok(())
    }
}

/// Summarize a chapter list. `language` selects the title and language
/// shown for each chapter (see [`MediaChapter::title_at`]).
pub fn chapter_info(chapters: &[MediaChapter], language: usize) -> Vec<ChapterInfo> {
    chapters
        .iter()
        .enumerate()
        .map(|(idx, c)| ChapterInfo {
            index:     idx + 1,
            start:     c.start(),
            end:       c.end(),
            title:     c.title_at(language).to_string(),
            language:  c.language_at(language).to_string(),
            titles:    c.titles().to_vec(),
            languages: c.languages().to_vec(),
        })
        .collect()
}

// Serialize helper.
fn seconds<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(value.as_millis() as f64 / 1000.0)
}

// Serialize helper.
fn opt_seconds<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(d) => seconds(d, serializer),
        None => serializer.serialize_none(),
    }
}
