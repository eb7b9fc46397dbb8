//! The chapter data model.
//!
use std::time::Duration;

/// One chapter marker.
///
/// Times are offsets from the start of the media. `Duration` has
/// nanosecond resolution, so the 100 ns ticks of Nero chapter lists
/// and the nanoseconds of Matroska convert without loss.
///
/// A chapter always has at least one title, and exactly as many
/// languages as titles. Title `n` is in language `n`; the language is
/// an ISO 639-2 code, or the empty string if unknown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaChapter {
    titles:    Vec<String>,
    languages: Vec<String>,
    start:     Duration,
    end:       Option<Duration>,
}

impl MediaChapter {
    /// A chapter with a single title in an unknown language.
    pub fn new(title: impl Into<String>, start: Duration) -> MediaChapter {
        MediaChapter {
            titles: vec![title.into()],
            languages: vec![String::new()],
            start,
            end: None,
        }
    }

    /// A chapter with one or more titles, each with its own language.
    ///
    /// Returns `None` if there are no titles, or if the number of titles
    /// and languages differ.
    pub fn with_languages(
        titles: Vec<String>,
        languages: Vec<String>,
        start: Duration,
        end: Option<Duration>,
    ) -> Option<MediaChapter> {
        if titles.is_empty() || titles.len() != languages.len() {
            return None;
        }
        Some(MediaChapter {
            titles,
            languages,
            start,
            end,
        })
    }

    /// Same chapter, with an explicit end time.
    pub fn with_end(mut self, end: Option<Duration>) -> MediaChapter {
        self.end = end;
        self
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// The first title.
    pub fn title(&self) -> &str {
        &self.titles[0]
    }

    /// Title number `index`, falling back to the first title.
    pub fn title_at(&self, index: usize) -> &str {
        self.titles.get(index).unwrap_or(&self.titles[0])
    }

    /// Language number `index`, falling back to the first language.
    pub fn language_at(&self, index: usize) -> &str {
        self.languages.get(index).unwrap_or(&self.languages[0])
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    /// The end time. `None` means the chapter runs until the next one
    /// starts, or until the end of the media for the last chapter.
    pub fn end(&self) -> Option<Duration> {
        self.end
    }
}

/// Derive missing end times from the start of the next chapter.
///
/// The last chapter keeps whatever it had; if that is `None` it runs
/// to the end of the media.
pub fn fill_end_times(chapters: Vec<MediaChapter>) -> Vec<MediaChapter> {
    let next_starts: Vec<Option<Duration>> = chapters
        .iter()
        .skip(1)
        .map(|c| Some(c.start))
        .chain(std::iter::once(None))
        .collect();
    chapters
        .into_iter()
        .zip(next_starts)
        .map(|(chapter, next)| match chapter.end {
            Some(_) => chapter,
            None => chapter.with_end(next),
        })
        .collect()
}
