//! Rendering references as citations in APA, TJS and Chicago style.
//!
//! Every style implements [`StyleGrammar`], one method per effective source
//! type. As-is records are handled here, identically for all styles.
//!
//! ```
//! use cite_master::cite::{CitationFormatter, FormatOptions, Style};
//! use cite_master::models::{ReferenceBuilder, SourceType};
//!
//! let reference = ReferenceBuilder::new(SourceType::Book)
//!     .authors(["Lee, A."])
//!     .year("2019")
//!     .title("Big Book")
//!     .publishers(["Press"])
//!     .build();
//!
//! let formatter = CitationFormatter::new(FormatOptions::new(Style::Apa));
//! assert_eq!(formatter.format(&reference).unwrap(), "Lee, A. (2019). Big Book. Press.");
//! ```

mod apa;
mod chicago;
mod fragment;
mod parts;
mod tjs;

pub use apa::Apa;
pub use chicago::Chicago;
pub use fragment::{Fragment, RenderMode, Span};
pub use tjs::Tjs;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{EffectiveType, Reference, ReferenceBatch};

/// Citation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Apa,
    Tjs,
    Chicago,
}

impl Style {
    pub const ALL: [Style; 3] = [Style::Apa, Style::Tjs, Style::Chicago];

    pub fn name(&self) -> &'static str {
        match self {
            Style::Apa => "APA",
            Style::Tjs => "TJS",
            Style::Chicago => "Chicago",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Style::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown style '{}'", s))
    }
}

/// Errors raised while rendering a single record
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    /// The record lacks a field this style and type need
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No grammar for the record's type in this style
    #[error("{style} has no format for source type '{source_type}'")]
    UnknownSourceType { style: Style, source_type: String },
}

/// One style's grammar, one method per effective source type.
pub trait StyleGrammar {
    fn journal_article(&self, r: &Reference) -> Result<Fragment, FormatError>;
    fn book(&self, r: &Reference) -> Result<Fragment, FormatError>;
    fn chapter_in_book(&self, r: &Reference) -> Result<Fragment, FormatError>;
    fn conference(&self, r: &Reference) -> Result<Fragment, FormatError>;
    fn degree(&self, r: &Reference) -> Result<Fragment, FormatError>;
    fn database(&self, r: &Reference) -> Result<Fragment, FormatError>;
    fn webpage(&self, r: &Reference) -> Result<Fragment, FormatError>;

    /// Dispatch on the effective type
    fn render(&self, r: &Reference, source_type: EffectiveType) -> Result<Fragment, FormatError> {
        match source_type {
            EffectiveType::JournalArticle => self.journal_article(r),
            EffectiveType::Book => self.book(r),
            EffectiveType::ChapterInBook => self.chapter_in_book(r),
            EffectiveType::Conference => self.conference(r),
            EffectiveType::Degree => self.degree(r),
            EffectiveType::Database => self.database(r),
            EffectiveType::Webpage => self.webpage(r),
            EffectiveType::AsIs => Ok(as_is(r)),
        }
    }
}

/// As-is parts concatenated, italic on the first and every other part,
/// followed by the URL.
pub fn as_is(r: &Reference) -> Fragment {
    r.as_is_parts
        .iter()
        .enumerate()
        .fold(Fragment::new(), |acc, (i, part)| {
            if i % 2 == 0 {
                acc.then(Fragment::italic(part.as_str()))
            } else {
                acc.then(Fragment::plain(part.as_str()))
            }
        })
        .then(parts::url_link(r))
}

/// Rendering parameters, independent of the records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatOptions {
    pub style: Style,
    pub mode: RenderMode,
    /// Append the record URL as a DOI link where the style allows one
    pub with_doi: bool,
}

impl FormatOptions {
    pub fn new(style: Style) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_doi(mut self, with_doi: bool) -> Self {
        self.with_doi = with_doi;
        self
    }
}

/// The outcome of formatting one record of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedRecord {
    pub index: usize,
    pub search_key: Option<String>,
    pub search_text: String,
    pub result: Result<String, FormatError>,
}

/// Formats references with fixed options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationFormatter {
    options: FormatOptions,
}

impl CitationFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// The rendering type of `r`, failing when it has none for this style.
    pub fn resolve_type(&self, r: &Reference) -> Result<EffectiveType, FormatError> {
        if let Some(source_type) = r.effective_type() {
            return Ok(source_type);
        }
        match &r.source_type {
            None => Err(FormatError::MissingField("sourceType")),
            Some(other) => Err(FormatError::UnknownSourceType {
                style: self.options.style,
                source_type: other.name().to_string(),
            }),
        }
    }

    /// Styled citation for one record
    pub fn fragment(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let source_type = self.resolve_type(r)?;
        let with_doi = self.options.with_doi;
        match self.options.style {
            Style::Apa => Apa { with_doi }.render(r, source_type),
            Style::Tjs => Tjs.render(r, source_type),
            Style::Chicago => Chicago { with_doi }.render(r, source_type),
        }
    }

    /// Citation text in the configured render mode
    pub fn format(&self, r: &Reference) -> Result<String, FormatError> {
        Ok(self.fragment(r)?.render(self.options.mode))
    }

    /// Format every record; a failing record is reported, never dropped.
    pub fn format_batch(&self, batch: &ReferenceBatch) -> Vec<FormattedRecord> {
        let records: Vec<FormattedRecord> = batch
            .iter()
            .enumerate()
            .map(|(index, r)| {
                let result = self.format(r);
                if let Err(e) = &result {
                    tracing::warn!(
                        "Failed to format record {} ({}): {}",
                        index,
                        r.search_key.as_deref().unwrap_or("no search key"),
                        e
                    );
                }
                FormattedRecord {
                    index,
                    search_key: r.search_key.clone(),
                    search_text: r.search_text(),
                    result,
                }
            })
            .collect();

        tracing::debug!(
            "Formatted {} of {} records as {}",
            records.iter().filter(|r| r.result.is_ok()).count(),
            records.len(),
            self.options.style
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReferenceBuilder, SourceType};
    use chrono::NaiveDate;

    fn journal() -> Reference {
        ReferenceBuilder::new(SourceType::JournalArticle)
            .authors(["Smith, J."])
            .year("2020")
            .title("A Study")
            .periodical("Journal X")
            .volume_number("5")
            .pages("10", "20")
            .build()
    }

    #[test]
    fn test_style_from_str() {
        assert_eq!("apa".parse::<Style>(), Ok(Style::Apa));
        assert_eq!("Chicago".parse::<Style>(), Ok(Style::Chicago));
        assert!("mla".parse::<Style>().is_err());
    }

    #[test]
    fn test_journal_ends_once() {
        let formatter = CitationFormatter::new(FormatOptions::new(Style::Apa));
        let text = formatter.format(&journal()).unwrap();
        assert!(text.ends_with("10–20."));
        assert!(!text.contains(".."));
    }

    #[test]
    fn test_markup_mode() {
        let formatter =
            CitationFormatter::new(FormatOptions::new(Style::Apa).with_mode(RenderMode::Markup));
        let text = formatter.format(&journal()).unwrap();
        assert!(text.contains("<i>Journal X</i>"));
    }

    #[test]
    fn test_conference_requires_date_from_in_every_supporting_style() {
        let r = ReferenceBuilder::new(SourceType::Conference)
            .authors(["Lee"])
            .year("2021")
            .title("Talk")
            .build();
        for style in [Style::Apa, Style::Tjs] {
            let formatter = CitationFormatter::new(FormatOptions::new(style));
            assert_eq!(
                formatter.format(&r),
                Err(FormatError::MissingField("dateFrom"))
            );
        }

        let formatter = CitationFormatter::new(FormatOptions::new(Style::Chicago));
        assert!(matches!(
            formatter.format(&r),
            Err(FormatError::UnknownSourceType { .. })
        ));
    }

    #[test]
    fn test_conference_in_book_renders_as_chapter() {
        let chapter = ReferenceBuilder::new(SourceType::ChapterInBook)
            .authors(["Lee"])
            .year("2019")
            .title("A Chapter")
            .source_title("Proceedings")
            .publishers(["Press"])
            .build();
        let in_book = Reference {
            source_type: Some(SourceType::ConferenceInBook),
            ..chapter.clone()
        };

        for style in Style::ALL {
            let formatter = CitationFormatter::new(FormatOptions::new(style));
            assert_eq!(formatter.format(&chapter), formatter.format(&in_book));
        }
    }

    #[test]
    fn test_as_is_overrides_type() {
        let r = ReferenceBuilder::new(SourceType::Book)
            .as_is_parts(["Title", ", a note, ", "Series"])
            .url("https://example.org")
            .build();

        for style in Style::ALL {
            let formatter = CitationFormatter::new(FormatOptions::new(style));
            assert_eq!(
                formatter.format(&r).unwrap(),
                "Title, a note, Serieshttps://example.org"
            );
        }

        let formatter =
            CitationFormatter::new(FormatOptions::new(Style::Tjs).with_mode(RenderMode::Markup));
        assert_eq!(
            formatter.format(&r).unwrap(),
            "<i>Title</i>, a note, <i>Series</i><a href=\"https://example.org\" target=\"_blank\">https://example.org</a>"
        );
    }

    #[test]
    fn test_missing_and_unknown_source_type() {
        let formatter = CitationFormatter::default();

        let r = Reference {
            year: Some("2020".into()),
            ..Reference::default()
        };
        assert_eq!(
            formatter.format(&r),
            Err(FormatError::MissingField("sourceType"))
        );

        let r = Reference {
            source_type: Some(SourceType::Other("Podcast".into())),
            ..r
        };
        assert_eq!(
            formatter.format(&r),
            Err(FormatError::UnknownSourceType {
                style: Style::Apa,
                source_type: "Podcast".into()
            })
        );
    }

    #[test]
    fn test_format_batch_reports_each_record() {
        let conference = ReferenceBuilder::new(SourceType::Conference)
            .search_key("Lee（2021）")
            .year("2021")
            .build();
        let dated = ReferenceBuilder::new(SourceType::Conference)
            .search_key("Wu（2021）")
            .authors(["Wu"])
            .title("Talk")
            .conference("Meeting")
            .dates(NaiveDate::from_ymd_opt(2021, 5, 1).unwrap(), None)
            .build();
        let batch = ReferenceBatch::new(vec![journal(), conference, dated]);

        let records = CitationFormatter::default().format_batch(&batch);
        assert_eq!(records.len(), 3);
        assert!(records[0].result.is_ok());
        assert_eq!(records[1].search_key.as_deref(), Some("Lee（2021）"));
        assert_eq!(records[1].result, Err(FormatError::MissingField("dateFrom")));
        assert_eq!(
            records[2].result.as_deref(),
            Ok("Wu. (2021, May 1). Talk. Meeting.")
        );
    }
}
