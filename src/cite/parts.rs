//! Assembly primitives shared by every style.

use chrono::{Datelike, Month, NaiveDate};

use super::fragment::Fragment;
use super::FormatError;
use crate::models::Reference;

pub const EN_DASH: &str = "–";
pub const HYPHEN: &str = "-";

/// Characters that already close a sentence
const TERMINAL: &[char] = &['.', '?', '!', '\'', '’', '"', '”'];

/// Plain text of an optional field
pub fn text(value: Option<&str>) -> Fragment {
    Fragment::plain(value.unwrap_or_default())
}

/// Italic text of an optional field
pub fn italic(value: Option<&str>) -> Fragment {
    Fragment::italic(value.unwrap_or_default())
}

/// Link to the record's URL, if any
pub fn url_link(reference: &Reference) -> Fragment {
    Fragment::link(reference.url.as_deref().unwrap_or_default())
}

/// Join non-empty parts with `separator`
pub fn join_with<I>(separator: &str, parts: I) -> Fragment
where
    I: IntoIterator<Item = Fragment>,
{
    let mut out = Fragment::new();
    for part in parts.into_iter().filter(|p| !p.is_empty()) {
        if !out.is_empty() {
            out.push_str(separator);
        }
        out.append(part);
    }
    out
}

/// Join non-empty parts with a single space
pub fn join_space<I>(parts: I) -> Fragment
where
    I: IntoIterator<Item = Fragment>,
{
    join_with(" ", parts)
}

/// Append `punctuation` unless the text already ends with it, or, for a
/// period, with any terminal punctuation. An empty part stays empty.
pub fn ensure_end(part: Fragment, punctuation: &str) -> Fragment {
    if part.is_empty() {
        return part;
    }

    let text = part.text();
    if punctuation == "." && text.ends_with(TERMINAL) {
        return part;
    }
    if text.ends_with(punctuation) {
        return part;
    }
    part.then(Fragment::plain(punctuation))
}

/// Wrap in `left`/`right`, or nothing when the content is empty
pub fn wrap(left: &str, right: &str, content: Fragment) -> Fragment {
    if content.is_empty() {
        return content;
    }
    Fragment::plain(left).then(content).then(Fragment::plain(right))
}

pub fn paren(content: Fragment) -> Fragment {
    wrap("(", ")", content)
}

pub fn bracket(content: Fragment) -> Fragment {
    wrap("[", "]", content)
}

pub fn quote(content: Fragment) -> Fragment {
    wrap("“", "”", content)
}

/// English month name for 1-12
pub fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
}

fn month_day(date: NaiveDate) -> String {
    format!(
        "{} {}",
        month_name(date.month()).unwrap_or_default(),
        date.day()
    )
}

/// `March 3–5`, or `March 30–April 2` across months
pub fn date_range(from: NaiveDate, to: Option<NaiveDate>, delimiter: &str) -> String {
    let start = month_day(from);
    match to {
        Some(end) if end.month() == from.month() => format!("{}{}{}", start, delimiter, end.day()),
        Some(end) => format!("{}{}{}", start, delimiter, month_day(end)),
        None => start,
    }
}

/// City, state and country joined by commas
pub fn place(reference: &Reference) -> Fragment {
    join_with(
        ", ",
        [&reference.city, &reference.state, &reference.country]
            .into_iter()
            .map(|p| text(p.as_deref())),
    )
}

/// Year with suffix; every dated grammar needs it
pub fn year(reference: &Reference) -> Result<String, FormatError> {
    reference
        .year_with_suffix()
        .ok_or(FormatError::MissingField("year"))
}

pub fn date_from(reference: &Reference) -> Result<NaiveDate, FormatError> {
    reference
        .date_from
        .ok_or(FormatError::MissingField("dateFrom"))
}

/// `from{delimiter}to`. One end without the other is an error when `strict`,
/// otherwise no range at all.
pub fn page_range(
    reference: &Reference,
    delimiter: &str,
    strict: bool,
) -> Result<Option<String>, FormatError> {
    match (reference.page_from.as_deref(), reference.page_to.as_deref()) {
        (Some(from), Some(to)) => Ok(Some(format!("{}{}{}", from, delimiter, to))),
        (Some(_), None) if strict => Err(FormatError::MissingField("pageTo")),
        (None, Some(_)) if strict => Err(FormatError::MissingField("pageFrom")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cite::fragment::RenderMode;

    #[test]
    fn test_join_space_drops_empty_parts() {
        let joined = join_space([
            Fragment::plain("a"),
            Fragment::new(),
            Fragment::italic("b"),
            Fragment::plain(""),
        ]);
        assert_eq!(joined.text(), "a b");
        assert!(join_space([Fragment::new(), Fragment::new()]).is_empty());
    }

    #[test]
    fn test_ensure_end() {
        assert_eq!(ensure_end("A Study".into(), ".").text(), "A Study.");
        assert_eq!(ensure_end("A Study.".into(), ".").text(), "A Study.");
        assert_eq!(ensure_end("Why?".into(), ".").text(), "Why?");
        assert_eq!(ensure_end("“Quoted”".into(), ".").text(), "“Quoted”");
        assert_eq!(ensure_end("Smith".into(), ",").text(), "Smith,");
        assert_eq!(ensure_end("Smith,".into(), ",").text(), "Smith,");
        assert_eq!(ensure_end("Why?".into(), ",").text(), "Why?,");
        assert!(ensure_end(Fragment::new(), ".").is_empty());
    }

    #[test]
    fn test_ensure_end_looks_through_markup() {
        let part = ensure_end(Fragment::italic("Journal."), ".");
        assert_eq!(part.render(RenderMode::Markup), "<i>Journal.</i>");

        let part = ensure_end(Fragment::italic("Journal"), ".");
        assert_eq!(part.render(RenderMode::Markup), "<i>Journal</i>.");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(paren("2020".into()).text(), "(2020)");
        assert_eq!(bracket("Thesis".into()).text(), "[Thesis]");
        assert_eq!(quote("Title.".into()).text(), "“Title.”");
        assert!(paren(Fragment::new()).is_empty());
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn test_date_range() {
        let d = |m, day| NaiveDate::from_ymd_opt(2020, m, day).unwrap();
        assert_eq!(date_range(d(3, 3), Some(d(3, 5)), EN_DASH), "March 3–5");
        assert_eq!(date_range(d(3, 30), Some(d(4, 2)), HYPHEN), "March 30-April 2");
        assert_eq!(date_range(d(3, 3), None, EN_DASH), "March 3");
    }

    #[test]
    fn test_page_range() {
        let mut r = Reference::default();
        assert_eq!(page_range(&r, EN_DASH, true), Ok(None));

        r.page_from = Some("10".into());
        assert_eq!(
            page_range(&r, EN_DASH, true),
            Err(FormatError::MissingField("pageTo"))
        );
        assert_eq!(page_range(&r, HYPHEN, false), Ok(None));

        r.page_to = Some("20".into());
        assert_eq!(page_range(&r, EN_DASH, true), Ok(Some("10–20".into())));

        r.page_from = None;
        assert_eq!(
            page_range(&r, EN_DASH, true),
            Err(FormatError::MissingField("pageFrom"))
        );
    }

    #[test]
    fn test_place() {
        let r = Reference {
            city: Some("Taipei".into()),
            country: Some("Taiwan".into()),
            ..Reference::default()
        };
        assert_eq!(place(&r).text(), "Taipei, Taiwan");
    }
}
