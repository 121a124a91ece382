//! Fixed-pattern roster parsing.
//!
//! The ward roster PDF renders each member as `Last, First Middle` glued to a
//! single-letter sex marker and a birth-date fragment, e.g.
//! `Panibra Merma, Edson JoaquinM14 Nov`. Some exports put the marker on its
//! own line instead:
//!
//! ```text
//! Adams, Morgan
//! M
//! 29 Jan
//! ```

use std::sync::OnceLock;

use regex::Regex;

use super::RosterCandidate;
use crate::models::Sex;

fn inline_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([^,\n]+),\s*([A-Za-z\s]+?)([MF])(\d{1,2}\s+[A-Za-z]{3})")
            .expect("inline roster pattern is valid")
    })
}

fn stacked_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"([A-ZÀ-ÿ][A-Za-zÀ-ÿ \t]*),[ \t]*([A-ZÀ-ÿ][A-Za-zÀ-ÿ \t]*?)[ \t]*\n\s*([MF])[ \t]*(?:\n|$)",
        )
        .expect("stacked roster pattern is valid")
    })
}

fn skip_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(NameGender|\*\*\*|Count:|Sunday School|Rexburg|For Church Use Only)")
            .expect("skip pattern is valid")
    })
}

struct RowCleaners {
    email: Regex,
    phone: Regex,
    date: Regex,
    non_letter: Regex,
    whitespace: Regex,
    sex_marker: Regex,
}

fn cleaners() -> &'static RowCleaners {
    static CLEANERS: OnceLock<RowCleaners> = OnceLock::new();
    CLEANERS.get_or_init(|| RowCleaners {
        email: Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"),
        phone: Regex::new(r"\+?\d[\d\s\-]{7,}\d").expect("phone pattern is valid"),
        date: Regex::new(r"\b\d{1,2}\s?[A-Za-z]{3}\b").expect("date pattern is valid"),
        non_letter: Regex::new(r"[^a-zA-ZÀ-ÿ\s,]").expect("letter pattern is valid"),
        whitespace: Regex::new(r"\s+").expect("whitespace pattern is valid"),
        sex_marker: Regex::new(r"\b[MF]\b").expect("marker pattern is valid"),
    })
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sex_from_marker(marker: &str) -> Sex {
    if marker == "F" {
        Sex::Female
    } else {
        Sex::Male
    }
}

fn candidate(last: &str, first: &str, marker: &str) -> Option<RosterCandidate> {
    let name = collapse_spaces(&format!("{} {}", first, last));
    if name.is_empty() {
        return None;
    }
    Some(RosterCandidate::new(name, sex_from_marker(marker)))
}

/// Extract members from roster text using the fixed layouts.
///
/// The inline layout is tried first; the stacked layout only when the inline
/// one finds nobody. Names come back as `First Last`, all on the regular track.
pub fn parse_roster(text: &str) -> Vec<RosterCandidate> {
    let text = text.replace('\u{a0}', " ").replace("\r\n", "\n");

    let inline: Vec<RosterCandidate> = inline_pattern()
        .captures_iter(&text)
        .filter_map(|caps| candidate(&caps[1], &caps[2], &caps[3]))
        .collect();
    if !inline.is_empty() {
        return inline;
    }

    stacked_pattern()
        .captures_iter(&text)
        .filter_map(|caps| candidate(&caps[1], &caps[2], &caps[3]))
        .collect()
}

/// Name and explicit sex marker recovered from one line, if any
pub(crate) struct CleanRow {
    pub name: String,
    pub sex: Option<Sex>,
}

pub(crate) fn clean_row(row: &str) -> Option<CleanRow> {
    if row.trim().is_empty() || skip_pattern().is_match(row) {
        return None;
    }

    let c = cleaners();
    let clean = c.email.replace_all(row, " ");
    let clean = c.phone.replace_all(&clean, " ");
    let clean = c.date.replace_all(&clean, " ");
    let clean = c.non_letter.replace_all(&clean, " ");
    let clean = c.whitespace.replace_all(&clean, " ");
    let mut clean = clean.trim().to_string();
    if clean.is_empty() {
        return None;
    }

    // only the first standalone marker decides
    let sex = c.sex_marker.find(&clean).map(|m| sex_from_marker(m.as_str()));
    if sex.is_some() {
        clean = c.sex_marker.replacen(&clean, 1, "").trim().to_string();
    }

    let name = if clean.contains(',') {
        let mut parts = clean.split(',');
        let last = parts.next().unwrap_or_default().trim();
        let first = parts.next().unwrap_or_default().trim();
        collapse_spaces(&format!("{} {}", first, last))
    } else {
        clean.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
    };

    if name.is_empty() {
        return None;
    }
    Some(CleanRow { name, sex })
}

/// Heuristically clean a single roster line into a member.
///
/// Header and footer lines are skipped. Emails, phone numbers, date fragments
/// and punctuation are stripped; the first standalone `M`/`F` sets the sex
/// (male when absent). `Last, First` is flipped; otherwise the first four
/// words are kept.
pub fn parse_member_row(row: &str) -> Option<RosterCandidate> {
    clean_row(row).map(|r| RosterCandidate::new(r.name, r.sex.unwrap_or(Sex::Male)))
}

/// Run `parse_member_row` over every line of `text`
pub fn parse_roster_lines(text: &str) -> Vec<RosterCandidate> {
    text.lines().filter_map(parse_member_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Track;

    fn names(candidates: &[RosterCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_inline_layout() {
        let text = "Sunday School Class Roster\n\
                    Panibra Merma, Edson JoaquinM14 Nov\n\
                    Smith, Mary AnnF02 Feb\n\
                    Count: 2";
        let found = parse_roster(text);
        assert_eq!(names(&found), vec!["Edson Joaquin Panibra Merma", "Mary Ann Smith"]);
        assert_eq!(found[0].sex, Sex::Male);
        assert_eq!(found[1].sex, Sex::Female);
        assert!(found.iter().all(|c| c.track == Track::Regular));
    }

    #[test]
    fn test_inline_layout_first_name_with_marker_letters() {
        let found = parse_roster("Lopez, MariaF3 Mar");
        assert_eq!(names(&found), vec!["Maria Lopez"]);
        assert_eq!(found[0].sex, Sex::Female);
    }

    #[test]
    fn test_non_breaking_spaces() {
        let found = parse_roster("Smith,\u{a0}JohnM14\u{a0}Nov");
        assert_eq!(names(&found), vec!["John Smith"]);
    }

    #[test]
    fn test_stacked_layout_fallback() {
        let text = "Adams, Morgan\nM\n29 Jan\nBaker, Sue Ellen\nF\n03 Apr\n";
        let found = parse_roster(text);
        assert_eq!(names(&found), vec!["Morgan Adams", "Sue Ellen Baker"]);
        assert_eq!(found[1].sex, Sex::Female);
    }

    #[test]
    fn test_stacked_layout_crlf_and_trailing_marker() {
        let found = parse_roster("Adams, Morgan\r\nM\r\n29 Jan\r\nÁlvarez, José\r\nM");
        assert_eq!(names(&found), vec!["Morgan Adams", "José Álvarez"]);
    }

    #[test]
    fn test_nothing_found() {
        assert!(parse_roster("Meeting notes\nNo roster here").is_empty());
        assert!(parse_roster("").is_empty());
    }

    #[test]
    fn test_member_row_flips_last_first() {
        let row = parse_member_row("Smith, John M 14 Nov john@example.com 555-123-4567").unwrap();
        assert_eq!(row.name, "John Smith");
        assert_eq!(row.sex, Sex::Male);
    }

    #[test]
    fn test_member_row_female_marker() {
        let row = parse_member_row("Doe, Jane F").unwrap();
        assert_eq!(row.name, "Jane Doe");
        assert_eq!(row.sex, Sex::Female);
    }

    #[test]
    fn test_member_row_defaults_to_male_and_keeps_four_words() {
        let row = parse_member_row("Ana Maria de la Cruz").unwrap();
        assert_eq!(row.name, "Ana Maria de la");
        assert_eq!(row.sex, Sex::Male);
    }

    #[test]
    fn test_member_row_skips_headers() {
        assert!(parse_member_row("NameGenderBirth Date").is_none());
        assert!(parse_member_row("*** Confidential ***").is_none());
        assert!(parse_member_row("count: 42").is_none());
        assert!(parse_member_row("Rexburg 12th Ward").is_none());
        assert!(parse_member_row("For Church Use Only").is_none());
        assert!(parse_member_row("   ").is_none());
        assert!(parse_member_row("555-123-4567").is_none());
    }

    #[test]
    fn test_clean_row_reports_missing_marker() {
        let row = clean_row("Grace Hopper").unwrap();
        assert_eq!(row.name, "Grace Hopper");
        assert!(row.sex.is_none());
    }

    #[test]
    fn test_roster_lines() {
        let text = "Sunday School Roster\nSmith, John M\nDoe, Jane F\n\nCount: 2\n";
        let found = parse_roster_lines(text);
        assert_eq!(names(&found), vec!["John Smith", "Jane Doe"]);
    }
}
