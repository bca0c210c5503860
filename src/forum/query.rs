//! Filtered, sorted, paginated views over the question store.
//!
//! Filter parameters form independent predicate groups that are ANDed
//! together; the search group is internally an OR across title, content,
//! and tags. Combining `search` with `unanswered` therefore requires both
//! to hold, instead of one silently displacing the other.
//!
//! Sorting by like count is a derived sort: the comparator projects
//! `likes.len()` per question rather than comparing the raw list.

use crate::error::{Result, VeriGeekError};
use crate::forum::question::Question;
use std::cmp::Ordering;
use std::str::FromStr;

/// Default number of questions per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Maximum questions returned in a single page.
pub const MAX_PAGE_SIZE: usize = 100;

/// Field a question list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Creation timestamp.
    CreatedAt,
    /// View counter.
    Views,
    /// Derived like count.
    Likes,
}

/// A parsed sort key: field plus direction.
///
/// The wire format follows the usual REST convention: a bare field name
/// sorts ascending, a leading `-` requests descending. Recognized fields
/// are `createdAt`, `views`, and `likes`; anything else is a validation
/// error rather than a silent pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortKey {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for SortKey {
    type Err = VeriGeekError;

    fn from_str(raw: &str) -> Result<Self> {
        let (name, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        let field = match name {
            "createdAt" => SortField::CreatedAt,
            "views" => SortField::Views,
            "likes" => SortField::Likes,
            other => {
                return Err(VeriGeekError::validation(format!(
                    "Unknown sort key: '{}'",
                    other
                )));
            }
        };

        Ok(Self { field, descending })
    }
}

impl SortKey {
    /// Compares two questions under this key.
    ///
    /// Ties are broken by question id so page boundaries stay stable
    /// regardless of store iteration order.
    pub fn compare(&self, a: &Question, b: &Question) -> Ordering {
        let ordering = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Views => a.views.cmp(&b.views),
            SortField::Likes => a.like_count().cmp(&b.like_count()),
        };

        let ordering = if self.descending {
            ordering.reverse()
        } else {
            ordering
        };

        ordering.then_with(|| a.id.cmp(&b.id))
    }
}

/// Parameters for a question list request.
#[derive(Debug, Clone)]
pub struct ListParams {
    /// 1-based page number.
    pub page: usize,
    /// Page size, capped at [`MAX_PAGE_SIZE`].
    pub limit: usize,
    /// Exact tag membership filter.
    pub tag: Option<String>,
    /// Case-insensitive substring filter across title, content, and tags.
    pub search: Option<String>,
    /// Sort key, default newest-first.
    pub sort: SortKey,
    /// Restrict to questions without comments.
    pub unanswered: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            tag: None,
            search: None,
            sort: SortKey::default(),
            unanswered: false,
        }
    }
}

impl ListParams {
    /// Returns true if `question` satisfies every active filter group.
    pub fn matches(&self, question: &Question) -> bool {
        if let Some(ref tag) = self.tag {
            if !question.has_tag(tag) {
                return false;
            }
        }

        if let Some(ref search) = self.search {
            if !question.matches_search(search) {
                return false;
            }
        }

        if self.unanswered && !question.is_unanswered() {
            return false;
        }

        true
    }
}

/// One page of a question list, with pagination metadata.
#[derive(Debug, Clone)]
pub struct QuestionPage {
    /// At most `limit` questions, in sort order.
    pub questions: Vec<Question>,
    /// `ceil(total_matching / limit)`.
    pub total_pages: usize,
    /// Echo of the requested page number.
    pub current_page: usize,
}

/// Builds one page of the filtered, sorted question list.
pub fn select_page<'a, I>(questions: I, params: &ListParams) -> QuestionPage
where
    I: IntoIterator<Item = &'a Question>,
{
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);

    let mut matching: Vec<&Question> = questions
        .into_iter()
        .filter(|q| params.matches(q))
        .collect();

    matching.sort_by(|a, b| params.sort.compare(a, b));

    let total = matching.len();
    let total_pages = total.div_ceil(limit);

    // The page number is caller-supplied and unbounded above; saturating
    // keeps an absurd value an empty page instead of an overflow.
    let questions = matching
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .cloned()
        .collect();

    QuestionPage {
        questions,
        total_pages,
        current_page: page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forum::types::UserId;

    fn question(title: &str, tags: &[&str]) -> Question {
        Question::new(
            title.to_string(),
            format!("{} body", title),
            tags.iter().map(|t| t.to_string()).collect(),
            None,
            UserId::generate(),
        )
        .unwrap()
    }

    #[test]
    fn test_sort_key_parsing() {
        let newest: SortKey = "-createdAt".parse().unwrap();
        assert_eq!(newest.field, SortField::CreatedAt);
        assert!(newest.descending);

        let views: SortKey = "views".parse().unwrap();
        assert_eq!(views.field, SortField::Views);
        assert!(!views.descending);

        let likes: SortKey = "-likes".parse().unwrap();
        assert_eq!(likes.field, SortField::Likes);
        assert!(likes.descending);

        assert!("title".parse::<SortKey>().is_err());
        assert!("".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_like_count_sort_projects_set_size() {
        let mut a = question("a", &[]);
        let mut b = question("b", &[]);

        for _ in 0..3 {
            a.toggle_like(UserId::generate());
        }
        b.toggle_like(UserId::generate());

        let key: SortKey = "-likes".parse().unwrap();
        assert_eq!(key.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_search_and_unanswered_are_independent_predicates() {
        let mut answered = question("Mux question", &["mux"]);
        answered
            .push_comment("use two 2:1 muxes".to_string(), None, UserId::generate())
            .unwrap();
        let unanswered = question("Mux puzzle", &["mux"]);
        let unrelated = question("FSM design", &["sequential"]);

        let params = ListParams {
            search: Some("mux".to_string()),
            unanswered: true,
            ..Default::default()
        };

        // Both groups must hold: only the unanswered mux question passes.
        assert!(!params.matches(&answered));
        assert!(params.matches(&unanswered));
        assert!(!params.matches(&unrelated));
    }

    #[test]
    fn test_pagination_counts() {
        let questions: Vec<Question> = (0..23).map(|i| question(&format!("q{}", i), &[])).collect();

        let params = ListParams {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        let page = select_page(questions.iter(), &params);

        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.questions.len(), 3);
    }

    #[test]
    fn test_empty_result_has_zero_pages() {
        let questions: Vec<Question> = Vec::new();
        let page = select_page(questions.iter(), &ListParams::default());
        assert_eq!(page.total_pages, 0);
        assert!(page.questions.is_empty());
    }

    #[test]
    fn test_page_beyond_end_is_empty_but_echoed() {
        let questions = vec![question("only", &[])];
        let params = ListParams {
            page: 5,
            ..Default::default()
        };
        let page = select_page(questions.iter(), &params);
        assert_eq!(page.current_page, 5);
        assert_eq!(page.total_pages, 1);
        assert!(page.questions.is_empty());
    }

    #[test]
    fn test_extreme_page_number_yields_empty_page() {
        let questions = vec![question("only", &[])];
        let params = ListParams {
            page: usize::MAX,
            limit: 10,
            ..Default::default()
        };
        let page = select_page(questions.iter(), &params);
        assert!(page.questions.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, usize::MAX);
    }

    #[test]
    fn test_views_sort_descending() {
        let mut a = question("a", &[]);
        let mut b = question("b", &[]);
        a.record_view();
        b.record_view();
        b.record_view();

        let params = ListParams {
            sort: "-views".parse().unwrap(),
            ..Default::default()
        };
        let questions = vec![a, b];
        let page = select_page(questions.iter(), &params);

        assert_eq!(page.questions[0].title, "b");
        assert_eq!(page.questions[1].title, "a");
    }
}
