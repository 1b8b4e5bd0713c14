//! Heuristic chapter segmentation.

use reader_types::Chapter;
use tracing::debug;

use crate::rules::{BoundaryRule, default_rules};

/// Title given to text that precedes the first heading.
pub const START_TITLE: &str = "Start";

/// Title of the single chapter produced when no heading is found.
pub const FULL_TEXT_TITLE: &str = "Full text";

/// Splits raw text into chapters at lines matching any of its rules.
#[derive(Debug, Clone)]
pub struct Segmenter {
    rules: Vec<BoundaryRule>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(default_rules().to_vec())
    }
}

impl Segmenter {
    /// Build a segmenter from rules evaluated in the given order.
    pub fn new(rules: Vec<BoundaryRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[BoundaryRule] {
        &self.rules
    }

    /// The first rule recognising `line` as a heading, if any.
    pub fn matching_rule(&self, line: &str) -> Option<&BoundaryRule> {
        self.rules.iter().find(|rule| rule.matches(line))
    }

    pub fn is_boundary(&self, line: &str) -> bool {
        self.matching_rule(line).is_some()
    }

    /// Split `raw` into chapters.
    ///
    /// Never returns an empty list: text without any heading becomes a single
    /// [`FULL_TEXT_TITLE`] chapter holding the input verbatim.
    pub fn segment(&self, raw: &str) -> Vec<Chapter> {
        let mut chapters = Vec::new();
        let mut current = ChapterBuffer::new(START_TITLE);
        let mut in_chapter = false;

        for line in split_lines(raw) {
            let line = line.trim();
            if line.is_empty() {
                current.push_blank();
                continue;
            }

            if self.is_boundary(line) {
                // Text before the first heading is kept only if there is some.
                if in_chapter || current.has_content() {
                    chapters.push(current.finish());
                }
                in_chapter = true;
                current = ChapterBuffer::new(line);
            } else {
                current.push_line(line);
            }
        }

        if in_chapter {
            chapters.push(current.finish());
        }

        if chapters.is_empty() {
            debug!("no chapter headings found, using full text");
            chapters.push(Chapter::new(FULL_TEXT_TITLE, raw));
        } else {
            debug!(chapters = chapters.len(), "segmented text");
        }

        chapters
    }
}

/// Segment `raw` with the built-in rules.
pub fn segment(raw: &str) -> Vec<Chapter> {
    Segmenter::default().segment(raw)
}

/// Lines of `raw` split on `\r\n`, `\n` or a lone `\r`.
fn split_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

/// Body lines of the chapter being built.
///
/// Blank lines are held back until another body line arrives, so only blanks
/// between body lines survive.
struct ChapterBuffer<'a> {
    title: &'a str,
    lines: Vec<&'a str>,
    pending_blanks: usize,
}

impl<'a> ChapterBuffer<'a> {
    fn new(title: &'a str) -> Self {
        Self {
            title,
            lines: Vec::new(),
            pending_blanks: 0,
        }
    }

    fn has_content(&self) -> bool {
        !self.lines.is_empty()
    }

    fn push_blank(&mut self) {
        if self.has_content() {
            self.pending_blanks += 1;
        }
    }

    fn push_line(&mut self, line: &'a str) {
        self.lines
            .extend(std::iter::repeat_n("", std::mem::take(&mut self.pending_blanks)));
        self.lines.push(line);
    }

    fn finish(self) -> Chapter {
        Chapter::new(self.title, self.lines.join("\n"))
    }
}
