//! Integration tests for Cite Master
//!
//! These tests drive the public API end to end: loading a batch, ordering and
//! formatting it, and reconciling the keys mined from an article.

use cite_master::cite::{CitationFormatter, FormatError, FormatOptions, RenderMode, Style};
use cite_master::keys::{KeyExtractor, KeyList, KeyMatcher};
use cite_master::models::ReferenceBatch;
use cite_master::sources::{load_batch, FileSource, LoadError, SourceError, StringSource, TextSource};
use std::io::Write;

const BATCH: &str = r#"[
    {
        "searchKey": "Smith, 2020",
        "sourceType": "JournalArticle",
        "authors": ["Smith, J."],
        "year": 2020,
        "title": "A Study",
        "periodical": "Journal X",
        "volumeNumber": 5,
        "pageFrom": 10,
        "pageTo": "20",
        "infoUrl": "https://example.org/a not-a-url"
    },
    {
        "searchKey": "Adams, 2019",
        "sourceType": "Pamphlet",
        "authors": ["Adams, B."],
        "year": "2019",
        "title": "Leaflet"
    },
    {
        "searchKey": "（Brown, 2018）",
        "asIsParts": ["Brown, 2018, ", "Collected Notes", "."],
        "authors": ["Brown"],
        "year": "2018"
    }
]"#;

#[test]
fn test_order_then_format() {
    let batch = ReferenceBatch::from_json(BATCH).unwrap();
    let ordered = batch.ordered().unwrap();

    assert_eq!(
        ordered.search_keys().unwrap(),
        vec!["Adams（2019）", "Brown（2018）", "Smith（2020）"]
    );

    let formatter = CitationFormatter::new(FormatOptions::new(Style::Apa));
    let records = formatter.format_batch(&ordered);
    assert_eq!(records.len(), 3);

    // an unknown type is reported for its record only
    assert_eq!(
        records[0].result,
        Err(FormatError::UnknownSourceType {
            style: Style::Apa,
            source_type: "Pamphlet".to_string(),
        })
    );
    assert!(records[1].result.is_ok());
    assert_eq!(
        records[2].result.as_deref(),
        Ok("Smith, J. (2020). A Study. Journal X, 5, 10–20.")
    );
}

#[test]
fn test_markup_rendering() {
    let batch = ReferenceBatch::from_json(BATCH).unwrap();
    let formatter =
        CitationFormatter::new(FormatOptions::new(Style::Apa).with_mode(RenderMode::Markup));

    let out = formatter.format(batch.get(0).unwrap()).unwrap();
    assert_eq!(
        out,
        "Smith, J. (2020). A Study. <i>Journal X</i>, <i>5</i>, 10–20."
    );
}

#[test]
fn test_every_style_reports_unknown_type() {
    let batch = ReferenceBatch::from_json(BATCH).unwrap();
    let pamphlet = batch.get(1).unwrap();

    for style in Style::ALL {
        let formatter = CitationFormatter::new(FormatOptions::new(style));
        assert!(matches!(
            formatter.format(pamphlet),
            Err(FormatError::UnknownSourceType { .. })
        ));
    }
}

#[test]
fn test_info_links() {
    let batch = ReferenceBatch::from_json(BATCH).unwrap();
    let smith = batch.get(0).unwrap();

    let links = smith.info_links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].0, "example.org");
    assert!(smith
        .scholar_query_url()
        .starts_with("https://scholar.google.com/scholar?q=Smith"));
}

#[test]
fn test_article_keys_then_diff() {
    let article = "\
As shown by Smith (2020), the effect holds (Lee, 2017; Adams, 2019).

參考文獻
Smith, J. (2020). A Study. Journal X, 5, 10–20.
";
    let extractor = KeyExtractor::new();
    let keys = extractor.extract(article);
    assert_eq!(keys, vec!["Adams（2019）", "Lee（2017）", "Smith（2020）"]);

    let batch = ReferenceBatch::from_json(BATCH).unwrap();
    let mut diff = KeyMatcher::new(&batch).diff(&KeyList::from_keys(&keys));

    let matched: Vec<bool> = diff.rows().iter().map(|r| r.is_matched()).collect();
    assert_eq!(matched, vec![true, false, true]);
    assert_eq!(diff.unmatched_references().len(), 1);

    diff.amend(1, "Brown, 2018").unwrap();
    assert_eq!(diff.to_diff_text(true), "\nLee（2017） => Brown, 2018");
}

#[test]
fn test_file_source_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(BATCH.as_bytes()).unwrap();

    let source = FileSource::new(file.path());
    let batch = tokio_test::block_on(load_batch(&source)).unwrap();
    assert_eq!(batch.len(), 3);

    let text = tokio_test::block_on(source.acquire_text()).unwrap();
    assert_eq!(text, BATCH);
}

#[test]
fn test_load_failures() {
    let missing = FileSource::new("/nonexistent/refs.json");
    let err = tokio_test::block_on(load_batch(&missing)).unwrap_err();
    assert!(matches!(err, LoadError::Source(SourceError::NotFound(_))));

    let broken = StringSource::new("refs.json", r#"[{"authors": "Smith"}]"#);
    let err = tokio_test::block_on(load_batch(&broken)).unwrap_err();
    assert!(matches!(err, LoadError::Store { .. }));
}
