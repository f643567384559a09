//! Chicago author-date style. Conferences, databases and webpages have no
//! grammar here.

use super::fragment::Fragment;
use super::parts::{self, ensure_end, italic, join_space, join_with, paren, quote, text, EN_DASH};
use super::{FormatError, Style, StyleGrammar};
use crate::models::{EffectiveType, Reference};

#[derive(Debug, Clone, Copy, Default)]
pub struct Chicago {
    pub with_doi: bool,
}

/// `Last, First` becomes `First Last`; names without a comma are unchanged.
pub fn fore_sur(name: &str) -> String {
    if !name.contains(',') {
        return name.to_string();
    }
    let mut pieces = name.split(',').map(str::trim);
    let last = pieces.next().unwrap_or_default();
    let first = pieces.next().unwrap_or_default();
    format!("{} {}", first, last).trim().to_string()
}

/// `A, B, and C`. A two-name list gets a bare space before "and" when
/// `two_without_comma`.
pub fn format_names(names: &[String], two_without_comma: bool) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] if two_without_comma => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

impl Chicago {
    fn unsupported(&self, source_type: EffectiveType) -> FormatError {
        FormatError::UnknownSourceType {
            style: Style::Chicago,
            source_type: source_type.to_string(),
        }
    }

    /// The first author stays inverted, the rest read `First Last`.
    fn authors(&self, r: &Reference) -> Fragment {
        let names: Vec<String> = r
            .authors
            .iter()
            .enumerate()
            .map(|(i, n)| if i == 0 { n.clone() } else { fore_sur(n) })
            .collect();
        ensure_end(format_names(&names, false).into(), ".")
    }

    fn year(&self, r: &Reference) -> Result<Fragment, FormatError> {
        Ok(ensure_end(parts::year(r)?.into(), "."))
    }

    fn italic_title(&self, r: &Reference) -> Fragment {
        ensure_end(italic(r.title.as_deref()), ".")
    }

    fn quoted_title(&self, r: &Reference, punctuation: &str) -> Fragment {
        quote(ensure_end(text(r.title.as_deref()), punctuation))
    }

    fn locator(&self, r: &Reference) -> Result<Fragment, FormatError> {
        if let Some(n) = r.article_number.as_deref() {
            return Ok(n.into());
        }
        Ok(parts::page_range(r, EN_DASH, true)?
            .map(Fragment::plain)
            .unwrap_or_default())
    }

    fn editors(&self, r: &Reference) -> Fragment {
        if r.editors.is_empty() {
            return Fragment::new();
        }
        let names: Vec<String> = r.editors.iter().map(|n| fore_sur(n)).collect();
        Fragment::plain(format!("edited by {}", format_names(&names, true)))
    }

    fn publisher(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let first = r
            .publishers
            .first()
            .ok_or(FormatError::MissingField("publishers"))?;
        Ok(ensure_end(first.as_str().into(), "."))
    }

    fn doi(&self, r: &Reference) -> Fragment {
        if self.with_doi {
            parts::url_link(r)
        } else {
            Fragment::new()
        }
    }
}

impl StyleGrammar for Chicago {
    fn journal_article(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let issue = paren(text(r.issue_number.as_deref()));
        let range_separator = if issue.is_empty() { ":" } else { ": " };
        let volume_issue = join_space([text(r.volume_number.as_deref()), issue]);
        let volume_range = join_with(range_separator, [volume_issue, self.locator(r)?]);
        let periodical = join_space([italic(r.periodical.as_deref()), volume_range]);

        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            self.quoted_title(r, "."),
            ensure_end(periodical, "."),
            self.doi(r),
        ]))
    }

    fn book(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let edition = r
            .edition
            .as_deref()
            .map(|e| format!("{} ed.", e))
            .unwrap_or_default();
        let volume = r
            .volume_number
            .as_deref()
            .map(|v| format!("Vol. {}.", v))
            .unwrap_or_default();

        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            self.italic_title(r),
            edition.into(),
            volume.into(),
            self.publisher(r)?,
        ]))
    }

    fn chapter_in_book(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let book = match r.source_title.as_deref() {
            Some(title) => ensure_end(Fragment::plain("In ").then(Fragment::italic(title)), ","),
            None => Fragment::new(),
        };
        let editors_range = join_with(", ", [self.editors(r), self.locator(r)?]);

        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            self.quoted_title(r, "."),
            book,
            ensure_end(editors_range, "."),
            self.publisher(r)?,
        ]))
    }

    fn conference(&self, _r: &Reference) -> Result<Fragment, FormatError> {
        Err(self.unsupported(EffectiveType::Conference))
    }

    fn degree(&self, r: &Reference) -> Result<Fragment, FormatError> {
        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            self.quoted_title(r, ","),
            ensure_end(text(r.degree_type.as_deref()), ","),
            ensure_end(text(r.university.as_deref()), "."),
            ensure_end(parts::url_link(r), "."),
        ]))
    }

    fn database(&self, _r: &Reference) -> Result<Fragment, FormatError> {
        Err(self.unsupported(EffectiveType::Database))
    }

    fn webpage(&self, _r: &Reference) -> Result<Fragment, FormatError> {
        Err(self.unsupported(EffectiveType::Webpage))
    }
}
