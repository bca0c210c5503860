//! Question and comment documents.
//!
//! A [`Question`] is the unit of storage for the forum: comments are
//! embedded in their question and live or die with it, likes are a set of
//! user references, and the view counter only ever goes up.
//!
//! All mutation goes through field-scoped methods (`push_comment`,
//! `toggle_like`, `set_difficulty`, `record_view`) so callers never
//! hand-assemble a replacement document.

use crate::error::{Result, VeriGeekError};
use crate::forum::types::{current_timestamp_millis, Difficulty, QuestionId, UserId};
use serde::{Deserialize, Serialize};

/// A reply embedded within a question's comment sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Comment body text.
    pub content: String,
    /// Optional code attached to the comment.
    pub code_snippet: Option<String>,
    /// Reference to the comment's author.
    pub author: UserId,
    /// Creation timestamp in Unix milliseconds.
    pub created_at: u64,
}

/// A forum question with embedded comments and like set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier, generated at creation, immutable.
    pub id: QuestionId,
    /// Question title (required).
    pub title: String,
    /// Question body (required).
    pub content: String,
    /// Free-text labels used for filtering. Order is irrelevant for
    /// filtering but insertion order is preserved.
    pub tags: Vec<String>,
    /// Optional code attached to the question.
    pub code_snippet: Option<String>,
    /// The author, set once at creation and never reassigned.
    pub author: UserId,
    /// Embedded comments in insertion order. Append-only.
    pub comments: Vec<Comment>,
    /// Users who currently like this question. Each user appears at most
    /// once; a repeated like call removes the earlier entry.
    pub likes: Vec<UserId>,
    /// Mutable classification, unset by default.
    pub difficulty: Option<Difficulty>,
    /// Monotonically increasing view counter.
    pub views: u64,
    /// Creation timestamp in Unix milliseconds.
    pub created_at: u64,
}

impl Question {
    /// Creates a new question authored by `author`.
    ///
    /// Title and content are required; tags and code snippet are optional.
    pub fn new(
        title: String,
        content: String,
        tags: Vec<String>,
        code_snippet: Option<String>,
        author: UserId,
    ) -> Result<Self> {
        if title.trim().is_empty() {
            return Err(VeriGeekError::validation("Question title is required"));
        }
        if content.trim().is_empty() {
            return Err(VeriGeekError::validation("Question content is required"));
        }

        Ok(Self {
            id: QuestionId::generate(),
            title,
            content,
            tags,
            code_snippet,
            author,
            comments: Vec::new(),
            likes: Vec::new(),
            difficulty: None,
            views: 0,
            created_at: current_timestamp_millis(),
        })
    }

    /// Appends a comment to the end of the comment sequence.
    pub fn push_comment(
        &mut self,
        content: String,
        code_snippet: Option<String>,
        author: UserId,
    ) -> Result<()> {
        if content.trim().is_empty() {
            return Err(VeriGeekError::validation("Comment content is required"));
        }

        self.comments.push(Comment {
            content,
            code_snippet,
            author,
            created_at: current_timestamp_millis(),
        });
        Ok(())
    }

    /// Toggles `user`'s like on this question.
    ///
    /// Returns true if the like is now present, false if it was removed.
    /// Two calls by the same user restore the original like set.
    pub fn toggle_like(&mut self, user: UserId) -> bool {
        match self.likes.iter().position(|u| *u == user) {
            Some(index) => {
                self.likes.remove(index);
                false
            }
            None => {
                self.likes.push(user);
                true
            }
        }
    }

    /// Overwrites the difficulty classification.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = Some(difficulty);
    }

    /// Records one view of this question.
    pub fn record_view(&mut self) {
        self.views += 1;
    }

    /// Returns the number of users who currently like this question.
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// Returns true if the question has no comments yet.
    pub fn is_unanswered(&self) -> bool {
        self.comments.is_empty()
    }

    /// Returns true if the question carries exactly this tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Returns true if `needle` occurs case-insensitively in the title,
    /// the content, or any tag.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}
