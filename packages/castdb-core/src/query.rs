//! Pagination and search over row snapshots.
//!
//! Both operations read a snapshot of the rows; neither ever runs
//! under the exclusive lock.

use serde::Serialize;

use crate::error::StoreError;
use crate::record::Record;

/// Column consulted for the `first_name` search term.
const FIRST_NAME: &str = "first_name";
/// Column consulted for the `last_name` search term.
const LAST_NAME: &str = "last_name";

/// One page of results with its placement in the full listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub data: Vec<Record>,
}

/// Slices one page out of the rows.
///
/// Pages are 1-based. A page past the end of the table yields empty
/// `data`, not an error; `total_pages` is the ceiling of
/// `total / limit` and 0 for an empty table.
pub fn paginate(rows: &[Record], page: usize, limit: usize) -> Result<Page, StoreError> {
    if page == 0 {
        return Err(StoreError::InvalidPagination { param: "page" });
    }
    if limit == 0 {
        return Err(StoreError::InvalidPagination { param: "limit" });
    }

    let total_records = rows.len();
    let total_pages = total_records.div_ceil(limit);
    let offset = (page - 1).saturating_mul(limit);
    let data = rows.iter().skip(offset).take(limit).cloned().collect();

    Ok(Page {
        page,
        limit,
        total_pages,
        total_records,
        data,
    })
}

/// Search terms; each supplied term is an exact, case-insensitive
/// equality match against its name column.
#[derive(Debug, Clone, Default)]
pub struct SearchTerms {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl SearchTerms {
    /// True when neither term was supplied.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none()
    }
}

/// Rows matching any of the supplied terms (logical OR).
///
/// Zero matches is reported as `NoMatches` so callers can distinguish
/// "nothing matched" from an empty listing.
pub fn search(rows: &[Record], terms: &SearchTerms) -> Result<Vec<Record>, StoreError> {
    if terms.is_empty() {
        return Err(StoreError::MissingSearchTerm);
    }

    // One predicate per supplied term, lowercased once up front.
    let mut predicates: Vec<(&str, String)> = Vec::new();
    if let Some(first) = &terms.first_name {
        predicates.push((FIRST_NAME, first.to_lowercase()));
    }
    if let Some(last) = &terms.last_name {
        predicates.push((LAST_NAME, last.to_lowercase()));
    }

    let matches: Vec<Record> = rows
        .iter()
        .filter(|record| {
            predicates.iter().any(|(column, term)| {
                record
                    .field(column)
                    .is_some_and(|value| value.render().to_lowercase() == *term)
            })
        })
        .cloned()
        .collect();

    if matches.is_empty() {
        return Err(StoreError::NoMatches);
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;

    fn rows(n: usize) -> Vec<Record> {
        (1..=n as i64)
            .map(|id| Record {
                id,
                fields: vec![(
                    "first_name".to_string(),
                    Value::Str(format!("Character{}", id)),
                )],
            })
            .collect()
    }

    fn friends() -> Vec<Record> {
        [
            (1, "Ross", "Geller"),
            (2, "Rachel", "Green"),
            (3, "Monica", "Geller"),
            (4, "Chandler", "Bing"),
        ]
        .iter()
        .map(|(id, first, last)| Record {
            id: *id,
            fields: vec![
                ("first_name".to_string(), Value::Str(first.to_string())),
                ("last_name".to_string(), Value::Str(last.to_string())),
            ],
        })
        .collect()
    }

    #[test]
    fn test_paginate_first_page() {
        let page = paginate(&rows(25), 1, 10).unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_records, 25);
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.data[0].id, 1);
    }

    #[test]
    fn test_paginate_last_partial_page() {
        let page = paginate(&rows(25), 3, 10).unwrap();
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.data[0].id, 21);
    }

    #[test]
    fn test_paginate_past_the_end_is_empty() {
        let page = paginate(&rows(25), 4, 10).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_paginate_empty_table() {
        let page = paginate(&[], 1, 10).unwrap();
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.total_records, 0);
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_paginate_exact_multiple() {
        let page = paginate(&rows(20), 2, 10).unwrap();
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data.len(), 10);
    }

    #[test]
    fn test_paginate_rejects_zero_page() {
        assert!(matches!(
            paginate(&rows(5), 0, 10),
            Err(StoreError::InvalidPagination { param: "page" })
        ));
    }

    #[test]
    fn test_paginate_rejects_zero_limit() {
        assert!(matches!(
            paginate(&rows(5), 1, 0),
            Err(StoreError::InvalidPagination { param: "limit" })
        ));
    }

    #[test]
    fn test_search_by_first_name() {
        let terms = SearchTerms {
            first_name: Some("Ross".to_string()),
            last_name: None,
        };
        let matches = search(&friends(), &terms).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, 1);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let terms = SearchTerms {
            first_name: Some("rOSS".to_string()),
            last_name: None,
        };
        let matches = search(&friends(), &terms).unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_search_is_exact_not_substring() {
        let terms = SearchTerms {
            first_name: Some("Ros".to_string()),
            last_name: None,
        };
        assert!(matches!(
            search(&friends(), &terms),
            Err(StoreError::NoMatches)
        ));
    }

    #[test]
    fn test_search_combines_terms_with_or() {
        let terms = SearchTerms {
            first_name: Some("Rachel".to_string()),
            last_name: Some("Geller".to_string()),
        };
        let matches = search(&friends(), &terms).unwrap();
        let ids: Vec<i64> = matches.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_search_without_terms_is_an_error() {
        assert!(matches!(
            search(&friends(), &SearchTerms::default()),
            Err(StoreError::MissingSearchTerm)
        ));
    }

    #[test]
    fn test_search_missing_column_never_matches() {
        let terms = SearchTerms {
            first_name: None,
            last_name: Some("Geller".to_string()),
        };
        // Rows without a last_name column cannot match.
        assert!(matches!(
            search(&rows(3), &terms),
            Err(StoreError::NoMatches)
        ));
    }
}
