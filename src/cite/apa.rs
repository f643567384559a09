//! APA style.

use chrono::Datelike;

use super::fragment::Fragment;
use super::parts::{self, ensure_end, italic, join_space, join_with, paren, text, EN_DASH};
use super::{FormatError, StyleGrammar};
use crate::models::Reference;

#[derive(Debug, Clone, Copy, Default)]
pub struct Apa {
    pub with_doi: bool,
}

/// `A`, `A, & B`, `A, B, & C`; `A & B` when `two_without_comma`.
pub fn format_names(names: &[String], two_without_comma: bool) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] if two_without_comma => format!("{} & {}", first, second),
        [init @ .., last] => format!("{}, & {}", init.join(", "), last),
    }
}

impl Apa {
    fn authors(&self, r: &Reference) -> Fragment {
        ensure_end(format_names(&r.authors, false).into(), ".")
    }

    /// `(2020, March 3).`
    fn date(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let year = parts::year(r)?;
        let (month, day) = match r.month {
            Some(m) => (parts::month_name(m).unwrap_or_default(), r.day),
            None => ("", None),
        };
        let month_day = join_space([
            Fragment::plain(month),
            Fragment::plain(day.map(|d| d.to_string()).unwrap_or_default()),
        ]);
        let ymd = join_with(", ", [Fragment::plain(year), month_day]);
        Ok(paren(ymd).then(".".into()))
    }

    /// `In A & B (Eds.),`, or a bare `In` without editors
    fn editors(&self, r: &Reference) -> Fragment {
        if r.editors.is_empty() {
            return "In".into();
        }
        let word = if r.editors.len() == 1 { "Ed." } else { "Eds." };
        Fragment::plain(format!(
            "In {} ({}),",
            format_names(&r.editors, true),
            word
        ))
    }

    fn edition_volume(&self, r: &Reference) -> Fragment {
        join_with(
            ", ",
            [
                text(r.edition.as_deref()),
                Fragment::plain(
                    r.volume_number
                        .as_deref()
                        .map(|v| format!("Vol. {}", v))
                        .unwrap_or_default(),
                ),
            ],
        )
    }

    fn article_number(&self, r: &Reference) -> Option<String> {
        r.article_number.as_deref().map(|n| format!("Article {}", n))
    }

    fn pages(&self, r: &Reference) -> Result<Option<String>, FormatError> {
        parts::page_range(r, EN_DASH, true)
    }

    /// Article number, else page range; the pages are not looked at when an
    /// article number is present.
    fn locator(&self, r: &Reference, page_prefix: &str) -> Result<Fragment, FormatError> {
        if let Some(article) = self.article_number(r) {
            return Ok(article.into());
        }
        Ok(self
            .pages(r)?
            .map(|p| Fragment::plain(format!("{}{}", page_prefix, p)))
            .unwrap_or_default())
    }

    /// `(2nd ed., Vol. 3, pp. 1–9)`
    fn edition_range(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let range = self.locator(r, "pp. ")?;
        Ok(paren(join_with(", ", [self.edition_volume(r), range])))
    }

    fn publishers(&self, r: &Reference) -> Result<Fragment, FormatError> {
        if r.publishers.is_empty() {
            return Err(FormatError::MissingField("publishers"));
        }
        Ok(ensure_end(r.publishers.join("; ").into(), "."))
    }

    fn doi(&self, r: &Reference) -> Fragment {
        if self.with_doi {
            parts::url_link(r)
        } else {
            Fragment::new()
        }
    }
}

impl StyleGrammar for Apa {
    fn journal_article(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let volume = italic(r.volume_number.as_deref());
        let issue = paren(text(r.issue_number.as_deref()));
        let range = self.locator(r, "")?;
        let periodical = join_with(
            ", ",
            [italic(r.periodical.as_deref()), volume.then(issue), range],
        );

        Ok(join_space([
            self.authors(r),
            self.date(r)?,
            ensure_end(text(r.title.as_deref()), "."),
            ensure_end(periodical, "."),
            self.doi(r),
        ]))
    }

    fn book(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let book = join_space([italic(r.title.as_deref()), paren(self.edition_volume(r))]);

        Ok(join_space([
            self.authors(r),
            self.date(r)?,
            ensure_end(book, "."),
            self.publishers(r)?,
            self.doi(r),
        ]))
    }

    fn chapter_in_book(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let book = join_space([italic(r.source_title.as_deref()), self.edition_range(r)?]);

        Ok(join_space([
            self.authors(r),
            self.date(r)?,
            ensure_end(text(r.title.as_deref()), "."),
            self.editors(r),
            ensure_end(book, "."),
            self.publishers(r)?,
            self.doi(r),
        ]))
    }

    fn conference(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let from = parts::date_from(r)?;
        let when = paren(Fragment::plain(format!(
            "{}, {}",
            from.year(),
            parts::date_range(from, r.date_to, EN_DASH)
        )));

        let title = join_space([
            italic(r.title.as_deref()),
            parts::bracket(text(r.conference_type.as_deref())),
        ]);

        Ok(join_space([
            self.authors(r),
            ensure_end(when, "."),
            ensure_end(title, "."),
            ensure_end(
                join_with(", ", [text(r.conference.as_deref()), parts::place(r)]),
                ".",
            ),
        ]))
    }

    fn degree(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let degree = parts::bracket(join_with(
            ", ",
            [text(r.degree_type.as_deref()), text(r.university.as_deref())],
        ));

        Ok(join_space([
            self.authors(r),
            self.date(r)?,
            text(r.title.as_deref()),
            ensure_end(degree, "."),
            ensure_end(text(r.database.as_deref()), "."),
            parts::url_link(r),
        ]))
    }

    fn database(&self, r: &Reference) -> Result<Fragment, FormatError> {
        let title = join_space([
            italic(r.title.as_deref()),
            paren(text(r.article_number.as_deref())),
        ]);

        Ok(join_space([
            self.authors(r),
            self.date(r)?,
            ensure_end(title, "."),
            ensure_end(text(r.database.as_deref()), "."),
            parts::url_link(r),
        ]))
    }

    fn webpage(&self, r: &Reference) -> Result<Fragment, FormatError> {
        Ok(join_space([
            self.authors(r),
            self.date(r)?,
            ensure_end(italic(r.title.as_deref()), "."),
            ensure_end(text(r.source_name.as_deref()), "."),
            parts::url_link(r),
        ]))
    }
}
