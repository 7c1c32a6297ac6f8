//! Listing queries: filtering and stable multi-field sorting.
//!
//! A [`Query`] is built once per listing request from raw HTTP parameters.
//! Invalid or absent `sort`/`order` values fall back to the defaults
//! instead of failing the request, so loosely-typed strings never reach
//! the sorting logic.

use std::cmp::Ordering;

use super::scanner::FileEntry;

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Filename,
    Size,
    CreationDate,
    #[default]
    ModificationDate,
}

impl SortField {
    /// Parse a raw query parameter, defaulting on anything unknown.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("filename") => SortField::Filename,
            Some(s) if s.eq_ignore_ascii_case("size") => SortField::Size,
            Some(s) if s.eq_ignore_ascii_case("creationDate") => SortField::CreationDate,
            Some(s) if s.eq_ignore_ascii_case("modificationDate") => SortField::ModificationDate,
            _ => SortField::default(),
        }
    }
}

/// Direction of a listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a raw query parameter, defaulting on anything unknown.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            Some(s) if s.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::default(),
        }
    }
}

/// One listing request: optional substring filter plus an ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Case-insensitive substring to match against file names.
    /// `None` or blank keeps every entry.
    pub search: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Query {
    /// Build a query from raw HTTP parameters.
    pub fn from_raw(q: Option<&str>, sort: Option<&str>, order: Option<&str>) -> Self {
        Self {
            search: q
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            sort: SortField::parse_or_default(sort),
            order: SortOrder::parse_or_default(order),
        }
    }
}

/// Keep the entries whose filename contains `term`, case-insensitively.
///
/// A `None` or blank term keeps everything. No wildcard or regex
/// semantics, just a locale-agnostic substring test.
pub fn filter(entries: Vec<FileEntry>, term: Option<&str>) -> Vec<FileEntry> {
    let term = match term.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_lowercase(),
        _ => return entries,
    };

    entries
        .into_iter()
        .filter(|entry| entry.filename.to_lowercase().contains(&term))
        .collect()
}

/// Sort entries by `field` in `order`, stably.
///
/// Entries that compare equal keep their scan-discovery relative order.
/// Descending order reverses the comparator, not the result, so ties
/// stay in discovery order either way.
pub fn sort(entries: &mut [FileEntry], field: SortField, order: SortOrder) {
    entries.sort_by(|a, b| {
        let cmp = match field {
            SortField::Filename => natural_cmp(&a.filename, &b.filename),
            SortField::Size => a.size.cmp(&b.size),
            SortField::CreationDate => a.created.cmp(&b.created),
            SortField::ModificationDate => a.modified.cmp(&b.modified),
        };
        match order {
            SortOrder::Asc => cmp,
            SortOrder::Desc => cmp.reverse(),
        }
    });
}

/// Numeric-aware, case-insensitive string comparison.
///
/// Runs of ASCII digits compare as numbers, so `file2` sorts before
/// `file10`. Plain byte-wise comparison would get this wrong.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ac), Some(bc)) => {
                if ac.is_ascii_digit() && bc.is_ascii_digit() {
                    let an = take_digit_run(&mut ai);
                    let bn = take_digit_run(&mut bi);
                    let cmp = cmp_digit_runs(&an, &bn);
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                } else {
                    let cmp = ac.to_lowercase().cmp(bc.to_lowercase());
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                    ai.next();
                    bi.next();
                }
            }
        }
    }
}

/// Consume a run of consecutive ASCII digits.
fn take_digit_run(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Compare two digit runs as numbers of arbitrary length.
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn entry(filename: &str, size: u64, created: u64, modified: u64) -> FileEntry {
        FileEntry {
            filename: filename.to_string(),
            path: PathBuf::from("/storage").join(filename),
            size,
            created: UNIX_EPOCH + Duration::from_secs(created),
            modified: UNIX_EPOCH + Duration::from_secs(modified),
        }
    }

    fn names(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.filename.as_str()).collect()
    }

    #[test]
    fn test_query_defaults() {
        let query = Query::default();
        assert_eq!(query.search, None);
        assert_eq!(query.sort, SortField::ModificationDate);
        assert_eq!(query.order, SortOrder::Desc);
    }

    #[test]
    fn test_query_from_raw_valid() {
        let query = Query::from_raw(Some("report"), Some("filename"), Some("asc"));
        assert_eq!(query.search.as_deref(), Some("report"));
        assert_eq!(query.sort, SortField::Filename);
        assert_eq!(query.order, SortOrder::Asc);
    }

    #[test]
    fn test_query_from_raw_invalid_falls_back_to_defaults() {
        let query = Query::from_raw(None, Some("bogus"), Some("sideways"));
        assert_eq!(query.sort, SortField::ModificationDate);
        assert_eq!(query.order, SortOrder::Desc);
    }

    #[test]
    fn test_query_blank_search_is_none() {
        let query = Query::from_raw(Some("   "), None, None);
        assert_eq!(query.search, None);
    }

    #[test]
    fn test_sort_field_parse_case_insensitive() {
        assert_eq!(
            SortField::parse_or_default(Some("CREATIONDATE")),
            SortField::CreationDate
        );
        assert_eq!(SortField::parse_or_default(Some("Size")), SortField::Size);
        assert_eq!(SortOrder::parse_or_default(Some("ASC")), SortOrder::Asc);
    }

    #[test]
    fn test_filter_is_subset() {
        let entries = vec![
            entry("report.pdf", 10, 1, 1),
            entry("notes.txt", 20, 2, 2),
            entry("Report (1).pdf", 30, 3, 3),
        ];

        let kept = filter(entries, Some("report"));
        assert_eq!(names(&kept), vec!["report.pdf", "Report (1).pdf"]);
    }

    #[test]
    fn test_filter_blank_term_keeps_everything() {
        let entries = vec![entry("a", 1, 1, 1), entry("b", 2, 2, 2)];
        assert_eq!(filter(entries.clone(), None).len(), 2);
        assert_eq!(filter(entries, Some("  ")).len(), 2);
    }

    #[test]
    fn test_filter_no_match() {
        let entries = vec![entry("a.txt", 1, 1, 1)];
        assert!(filter(entries, Some("zzz")).is_empty());
    }

    #[test]
    fn test_natural_cmp_numeric_aware() {
        assert_eq!(natural_cmp("file2", "file10"), Ordering::Less);
        assert_eq!(natural_cmp("file10", "file2"), Ordering::Greater);
        assert_eq!(natural_cmp("file2", "file2"), Ordering::Equal);
    }

    #[test]
    fn test_natural_cmp_case_insensitive() {
        assert_eq!(natural_cmp("ALPHA", "alpha"), Ordering::Equal);
        assert_eq!(natural_cmp("Beta", "alpha"), Ordering::Greater);
    }

    #[test]
    fn test_natural_cmp_leading_zeros() {
        assert_eq!(natural_cmp("file007", "file7"), Ordering::Equal);
        assert_eq!(natural_cmp("file007", "file8"), Ordering::Less);
    }

    #[test]
    fn test_sort_filename_ascending() {
        let mut entries = vec![
            entry("file10", 0, 0, 0),
            entry("file2", 0, 0, 0),
            entry("file1", 0, 0, 0),
        ];
        sort(&mut entries, SortField::Filename, SortOrder::Asc);
        assert_eq!(names(&entries), vec!["file1", "file2", "file10"]);
    }

    #[test]
    fn test_sort_desc_reverses_asc_without_ties() {
        let mut asc = vec![
            entry("c", 3, 3, 3),
            entry("a", 1, 1, 1),
            entry("b", 2, 2, 2),
        ];
        let mut desc = asc.clone();

        sort(&mut asc, SortField::Size, SortOrder::Asc);
        sort(&mut desc, SortField::Size, SortOrder::Desc);

        let mut reversed = names(&asc);
        reversed.reverse();
        assert_eq!(names(&desc), reversed);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        // Same size: discovery order must survive in both directions.
        let mut entries = vec![
            entry("first", 5, 1, 1),
            entry("second", 5, 2, 2),
            entry("third", 5, 3, 3),
        ];
        sort(&mut entries, SortField::Size, SortOrder::Asc);
        assert_eq!(names(&entries), vec!["first", "second", "third"]);

        sort(&mut entries, SortField::Size, SortOrder::Desc);
        assert_eq!(names(&entries), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_sort_by_modification_date_desc() {
        let mut entries = vec![
            entry("old", 0, 0, 100),
            entry("new", 0, 0, 300),
            entry("mid", 0, 0, 200),
        ];
        sort(&mut entries, SortField::ModificationDate, SortOrder::Desc);
        assert_eq!(names(&entries), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_sort_by_creation_date_asc() {
        let mut entries = vec![
            entry("b", 0, 200, 0),
            entry("a", 0, 100, 0),
            entry("c", 0, 300, 0),
        ];
        sort(&mut entries, SortField::CreationDate, SortOrder::Asc);
        assert_eq!(names(&entries), vec!["a", "b", "c"]);
    }
}
