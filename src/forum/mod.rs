//! Question store data model and query engine.
//!
//! The forum is a flat collection of [`Question`] documents. Comments are
//! embedded in their question (append-only, insertion order), likes are a
//! set of user references with toggle semantics, and every single-question
//! fetch bumps a monotonic view counter.
//!
//! Listing goes through [`query::select_page`], which applies independent
//! filter groups (tag membership, substring search, unanswered) ANDed
//! together, sorts by creation time, views, or derived like count, and
//! paginates with a total-page count.

pub mod query;
pub mod question;
pub mod types;

pub use query::{
    select_page, ListParams, QuestionPage, SortField, SortKey, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use question::{Comment, Question};
pub use types::{current_timestamp_millis, Difficulty, QuestionId, UserId};
