//! # VeriGeek Forum
//!
//! Discussion forum engine for the VeriGeek hardware-design learning
//! platform: a document store of questions with embedded comments, like
//! sets, difficulty tags, and view counters, plus the query layer that
//! builds filtered, sorted, paginated views over it.
//!
//! ## Layout
//!
//! - [`forum`]: the data model (questions, comments, identifiers) and the
//!   filter/sort/pagination engine
//! - [`auth`]: user accounts, Argon2id password hashing, session tokens
//! - [`storage`]: RocksDB helpers used by the server's persistence layer
//! - [`error`]: the failure taxonomy shared with the HTTP surface
//!
//! The HTTP server itself lives in the `verigeek-server` workspace member.
//!
//! ## Example
//!
//! ```rust
//! use verigeek::forum::{select_page, ListParams, Question, UserId};
//!
//! # fn main() -> verigeek::Result<()> {
//! let author = UserId::generate();
//! let question = Question::new(
//!     "Mux design help".to_string(),
//!     "How do I build a 4:1 mux from 2:1 muxes?".to_string(),
//!     vec!["combinational".to_string(), "mux".to_string()],
//!     None,
//!     author,
//! )?;
//!
//! let params = ListParams {
//!     tag: Some("mux".to_string()),
//!     ..Default::default()
//! };
//! let page = select_page([&question], &params);
//! assert_eq!(page.questions.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod forum;
pub mod storage;

pub use error::{Result, VeriGeekError};
