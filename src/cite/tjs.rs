//! TJS house style.
//!
//! Lenient about page ranges and publishers: a half-given range or a missing
//! publisher simply drops out.

use super::fragment::Fragment;
use super::parts::{self, ensure_end, italic, join_space, join_with, paren, quote, text, HYPHEN};
use super::{FormatError, StyleGrammar};
use crate::models::Reference;

#[derive(Debug, Clone, Copy, Default)]
pub struct Tjs;

/// `A`, `A and B`, `A, B and C`
pub fn format_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

impl Tjs {
    fn authors(&self, r: &Reference) -> Fragment {
        ensure_end(format_names(&r.authors).into(), ",")
    }

    fn year(&self, r: &Reference) -> Result<Fragment, FormatError> {
        Ok(ensure_end(parts::year(r)?.into(), ","))
    }

    fn italic_title(&self, r: &Reference) -> Fragment {
        ensure_end(italic(r.title.as_deref()), ".")
    }

    /// `“Title.”`, or `“Title,”` with a comma
    fn quoted_title(&self, r: &Reference, punctuation: &str) -> Fragment {
        quote(ensure_end(text(r.title.as_deref()), punctuation))
    }

    fn locator(&self, r: &Reference, page_prefix: &str) -> Fragment {
        if let Some(n) = r.article_number.as_deref() {
            return Fragment::plain(format!("Article {}", n));
        }
        match parts::page_range(r, HYPHEN, false) {
            Ok(Some(pages)) => Fragment::plain(format!("{}{}", page_prefix, pages)),
            _ => Fragment::new(),
        }
    }

    fn editors(&self, r: &Reference) -> Fragment {
        if r.editors.is_empty() {
            return Fragment::new();
        }
        ensure_end(format!("edited by {}", format_names(&r.editors)).into(), ".")
    }

    fn publisher(&self, r: &Reference) -> Fragment {
        ensure_end(text(r.publishers.first().map(String::as_str)), ".")
    }
}

impl StyleGrammar for Tjs {
    fn journal_article(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let volume_issue = text(r.volume_number.as_deref()).then(paren(text(r.issue_number.as_deref())));
        let volume_range = join_with(": ", [volume_issue, self.locator(r, "")]);
        let periodical = join_with(", ", [italic(r.periodical.as_deref()), volume_range]);

        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            self.quoted_title(r, "."),
            ensure_end(periodical, "."),
        ]))
    }

    fn book(&self, r: &Reference) -> Result<Fragment, FormatError> {
        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            self.italic_title(r),
            self.publisher(r),
        ]))
    }

    fn chapter_in_book(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let book = match r.source_title.as_deref() {
            Some(title) => ensure_end(Fragment::plain("in ").then(Fragment::italic(title)), ","),
            None => Fragment::new(),
        };

        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            self.quoted_title(r, "."),
            self.locator(r, "Pp. "),
            book,
            self.editors(r),
            self.publisher(r),
        ]))
    }

    fn conference(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let from = parts::date_from(r)?;
        let presented = match r.conference.as_deref() {
            Some(c) => Fragment::plain(format!("Paper presented at {}", c)),
            None => Fragment::new(),
        };

        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            self.quoted_title(r, ","),
            ensure_end(presented, ","),
            ensure_end(parts::place(r), ","),
            ensure_end(parts::date_range(from, r.date_to, HYPHEN).into(), "."),
        ]))
    }

    fn degree(&self, r: &Reference) -> Result<Fragment, FormatError> {
        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            ensure_end(italic(r.title.as_deref()), ","),
            ensure_end(text(r.degree_type.as_deref()), ","),
            ensure_end(text(r.university.as_deref()), "."),
        ]))
    }

    fn database(&self, r: &Reference) -> Result<Fragment, FormatError> {
        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            self.quoted_title(r, "."),
            ensure_end(text(r.database.as_deref()), "."),
            parts::url_link(r),
        ]))
    }

    fn webpage(&self, r: &Reference) -> Result<Fragment, FormatError> {
        Ok(join_space([
            self.authors(r),
            self.year(r)?,
            self.quoted_title(r, "."),
            ensure_end(text(r.source_name.as_deref()), "."),
            parts::url_link(r),
        ]))
    }
}
