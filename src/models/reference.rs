//! Reference model representing one bibliographic entry.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Stored classification of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    JournalArticle,
    Book,
    ChapterInBook,
    ConferenceInBook,
    Conference,
    Degree,
    Database,
    Webpage,
    AsIs,
    #[serde(untagged)]
    Other(String),
}

impl SourceType {
    /// Returns the name used in the structured input
    pub fn name(&self) -> &str {
        match self {
            SourceType::JournalArticle => "JournalArticle",
            SourceType::Book => "Book",
            SourceType::ChapterInBook => "ChapterInBook",
            SourceType::ConferenceInBook => "ConferenceInBook",
            SourceType::Conference => "Conference",
            SourceType::Degree => "Degree",
            SourceType::Database => "Database",
            SourceType::Webpage => "Webpage",
            SourceType::AsIs => "AsIs",
            SourceType::Other(s) => s,
        }
    }

    /// The rendering variant for this stored type, if it has one.
    pub fn effective(&self) -> Option<EffectiveType> {
        match self {
            SourceType::JournalArticle => Some(EffectiveType::JournalArticle),
            SourceType::Book => Some(EffectiveType::Book),
            SourceType::ChapterInBook | SourceType::ConferenceInBook => {
                Some(EffectiveType::ChapterInBook)
            }
            SourceType::Conference => Some(EffectiveType::Conference),
            SourceType::Degree => Some(EffectiveType::Degree),
            SourceType::Database => Some(EffectiveType::Database),
            SourceType::Webpage => Some(EffectiveType::Webpage),
            SourceType::AsIs => Some(EffectiveType::AsIs),
            SourceType::Other(_) => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The source-type variant actually used for rendering.
///
/// `ConferenceInBook` folds into `ChapterInBook`; any record carrying as-is
/// parts renders as `AsIs` whatever its stored type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectiveType {
    JournalArticle,
    Book,
    ChapterInBook,
    Conference,
    Degree,
    Database,
    Webpage,
    AsIs,
}

impl std::fmt::Display for EffectiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EffectiveType::JournalArticle => "JournalArticle",
            EffectiveType::Book => "Book",
            EffectiveType::ChapterInBook => "ChapterInBook",
            EffectiveType::Conference => "Conference",
            EffectiveType::Degree => "Degree",
            EffectiveType::Database => "Database",
            EffectiveType::Webpage => "Webpage",
            EffectiveType::AsIs => "AsIs",
        };
        f.write_str(name)
    }
}

/// A bibliographic reference
///
/// Records are built once from a structured batch and only read afterwards.
/// Sequence fields are never absent: a missing or `null` value is the empty
/// sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Key used for ordering and display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_key: Option<String>,

    /// Whitespace-separated list of URLs describing the work
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,

    /// Authors in citation order
    #[serde(default, deserialize_with = "de::sequence", skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    /// Editors in citation order
    #[serde(default, deserialize_with = "de::sequence", skip_serializing_if = "Vec::is_empty")]
    pub editors: Vec<String>,

    #[serde(default, deserialize_with = "de::sequence", skip_serializing_if = "Vec::is_empty")]
    pub publishers: Vec<String>,

    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    /// Disambiguator appended to the year, e.g. "a"
    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub year_suffix: Option<String>,

    /// Month number, 1-12
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,

    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,

    #[serde(default, deserialize_with = "de::date", skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// Container title for chapters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodical: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference: Option<String>,

    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub volume_number: Option<String>,

    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<String>,

    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub article_number: Option<String>,

    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub page_from: Option<String>,

    #[serde(default, deserialize_with = "de::text", skip_serializing_if = "Option::is_none")]
    pub page_to: Option<String>,

    /// Literal parts rendered verbatim; non-empty means the record is as-is
    #[serde(default, deserialize_with = "de::sequence", skip_serializing_if = "Vec::is_empty")]
    pub as_is_parts: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

static SEMICOLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[;；]").unwrap());
static OUTER_PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^（(.*)）$").unwrap());
static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m),\s*(\d{4}[a-z]?)$").unwrap());

const SCHOLAR_QUERY_URL: &str = "https://scholar.google.com/scholar?q=";

impl Reference {
    /// Year with its disambiguating suffix, e.g. "2020a"
    pub fn year_with_suffix(&self) -> Option<String> {
        self.year
            .as_deref()
            .map(|y| format!("{}{}", y, self.year_suffix.as_deref().unwrap_or("")))
    }

    /// Fingerprint used for searching and matching: authors, year, title.
    pub fn search_text(&self) -> String {
        [
            self.authors.join(", "),
            self.year.clone().unwrap_or_default(),
            self.title.clone().unwrap_or_default(),
        ]
        .join(", ")
    }

    /// The type used for rendering, `None` when the stored type is missing or unknown.
    pub fn effective_type(&self) -> Option<EffectiveType> {
        if !self.as_is_parts.is_empty() {
            return Some(EffectiveType::AsIs);
        }
        self.source_type.as_ref().and_then(SourceType::effective)
    }

    /// Search key with unified semicolons, no outer full-width parentheses and
    /// a trailing `, Year` rewritten as `（Year）`.
    pub fn normalized_search_key(&self) -> Option<String> {
        self.search_key.as_deref().map(normalize_search_key)
    }

    /// `(hostname, href)` for each parsable entry of `infoUrl`
    pub fn info_links(&self) -> Vec<(String, String)> {
        self.info_url
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .filter_map(|s| url::Url::parse(s).ok())
            .filter_map(|u| {
                let host = u.host_str()?.to_string();
                Some((host, u.to_string()))
            })
            .collect()
    }

    /// Google Scholar query for this record's search text
    pub fn scholar_query_url(&self) -> String {
        format!(
            "{}{}",
            SCHOLAR_QUERY_URL,
            urlencoding::encode(&self.search_text())
        )
    }
}

/// Normalize a raw search key, see [`Reference::normalized_search_key`].
pub fn normalize_search_key(key: &str) -> String {
    let key = SEMICOLON.replace_all(key, ";");
    let key = OUTER_PARENS.replace_all(&key, "$1");
    TRAILING_YEAR.replace_all(&key, "（$1）").into_owned()
}

macro_rules! text_setters {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(mut self, value: impl Into<String>) -> Self {
                self.reference.$name = Some(value.into());
                self
            }
        )*
    };
}

macro_rules! list_setters {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name<I, S>(mut self, values: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.reference.$name = values.into_iter().map(Into::into).collect();
                self
            }
        )*
    };
}

/// Builder for constructing Reference objects
#[derive(Debug, Clone, Default)]
pub struct ReferenceBuilder {
    reference: Reference,
}

impl ReferenceBuilder {
    /// Create a new builder for the given stored type
    pub fn new(source_type: SourceType) -> Self {
        Self {
            reference: Reference {
                source_type: Some(source_type),
                ..Reference::default()
            },
        }
    }

    text_setters!(
        search_key,
        info_url,
        year,
        year_suffix,
        title,
        source_name,
        source_title,
        periodical,
        conference,
        volume_number,
        issue_number,
        edition,
        conference_type,
        city,
        state,
        country,
        degree_type,
        university,
        database,
        article_number,
        page_from,
        page_to,
        url,
    );

    list_setters!(authors, editors, publishers, as_is_parts);

    /// Set month and day of publication
    pub fn month_day(mut self, month: u32, day: Option<u32>) -> Self {
        self.reference.month = Some(month);
        self.reference.day = day;
        self
    }

    /// Set the event date range
    pub fn dates(mut self, from: NaiveDate, to: Option<NaiveDate>) -> Self {
        self.reference.date_from = Some(from);
        self.reference.date_to = to;
        self
    }

    /// Set both ends of the page range
    pub fn pages(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.page_from(from).page_to(to)
    }

    /// Build the Reference
    pub fn build(self) -> Reference {
        self.reference
    }
}

/// Lenient field decoders for hand-maintained JSON.
mod de {
    use chrono::NaiveDate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
    }

    /// A string or a number, kept as text.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Scalar>::deserialize(deserializer)?.map(|v| match v {
            Scalar::Text(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
        }))
    }

    /// A sequence of strings where `null` means empty.
    pub fn sequence<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// An ISO date, optionally followed by a time part.
    pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let day = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid date '{}': {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_builder() {
        let reference = ReferenceBuilder::new(SourceType::JournalArticle)
            .search_key("Smith, 2020")
            .authors(["Smith, J.", "Jones, K."])
            .year("2020")
            .year_suffix("a")
            .title("A Study")
            .pages("10", "20")
            .build();

        assert_eq!(reference.authors, vec!["Smith, J.", "Jones, K."]);
        assert_eq!(reference.year_with_suffix(), Some("2020a".to_string()));
        assert_eq!(reference.page_from.as_deref(), Some("10"));
        assert!(reference.editors.is_empty());
    }

    #[test]
    fn test_search_text() {
        let reference = ReferenceBuilder::new(SourceType::Book)
            .authors(["Smith, J.", "Jones, K."])
            .year("2020")
            .title("A Study")
            .build();

        assert_eq!(reference.search_text(), "Smith, J., Jones, K., 2020, A Study");
    }

    #[test]
    fn test_effective_type() {
        let chapter = ReferenceBuilder::new(SourceType::ConferenceInBook).build();
        assert_eq!(chapter.effective_type(), Some(EffectiveType::ChapterInBook));

        let as_is = ReferenceBuilder::new(SourceType::Book)
            .as_is_parts(["Smith. ", "Title"])
            .build();
        assert_eq!(as_is.effective_type(), Some(EffectiveType::AsIs));

        let other = ReferenceBuilder::new(SourceType::Other("Report".into())).build();
        assert_eq!(other.effective_type(), None);
    }

    #[test]
    fn test_deserialize_lenient_fields() {
        let json = r#"{
            "searchKey": "Smith, 2020",
            "sourceType": "JournalArticle",
            "authors": ["Smith, J."],
            "editors": null,
            "year": 2020,
            "volumeNumber": 5,
            "pageFrom": 10,
            "pageTo": "20",
            "dateFrom": "2020-03-01T00:00:00Z",
            "unknownField": true
        }"#;
        let reference: Reference = serde_json::from_str(json).unwrap();

        assert_eq!(reference.year.as_deref(), Some("2020"));
        assert_eq!(reference.volume_number.as_deref(), Some("5"));
        assert_eq!(reference.page_from.as_deref(), Some("10"));
        assert_eq!(reference.page_to.as_deref(), Some("20"));
        assert!(reference.editors.is_empty());
        assert_eq!(
            reference.date_from,
            NaiveDate::from_ymd_opt(2020, 3, 1)
        );
    }

    #[test]
    fn test_unknown_source_type_is_kept() {
        let reference: Reference =
            serde_json::from_str(r#"{"sourceType": "Report"}"#).unwrap();
        assert_eq!(reference.source_type, Some(SourceType::Other("Report".into())));
    }

    #[test]
    fn test_normalized_search_key() {
        assert_eq!(normalize_search_key("Smith, 2020"), "Smith（2020）");
        assert_eq!(normalize_search_key("（Smith, 2020a）"), "Smith（2020a）");
        assert_eq!(normalize_search_key("Lee； Chen, 2019"), "Lee; Chen（2019）");
        assert_eq!(normalize_search_key("王小明（2020）"), "王小明（2020）");
    }

    #[test]
    fn test_info_links() {
        let reference = Reference {
            info_url: Some("https://doi.org/10.1/x not-a-url http://example.com/a".into()),
            ..Reference::default()
        };
        let links = reference.info_links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0, "doi.org");
        assert_eq!(links[1].1, "http://example.com/a");
    }

    #[test]
    fn test_scholar_query_url() {
        let reference = ReferenceBuilder::new(SourceType::Book)
            .authors(["Smith"])
            .year("2020")
            .title("A B")
            .build();
        assert_eq!(
            reference.scholar_query_url(),
            "https://scholar.google.com/scholar?q=Smith%2C%202020%2C%20A%20B"
        );
    }
}
