//! Forum data persistence using RocksDB.
//!
//! ## Storage Layout
//!
//! Column families give each document type its own keyspace:
//! - `questions`: `{question_id}` -> serialized Question (with embedded comments)
//! - `users`: `{user_id}` -> serialized User
//!
//! ## Update Discipline
//!
//! The database is the source of truth. Every mutation applies a
//! field-scoped change to a copy of the document, writes that copy to the
//! database first, and only then commits it to the in-memory cache. The
//! caller holds the state write lock for the whole sequence, so two
//! concurrent mutations of the same question (say a like toggle racing a
//! comment append) serialize instead of overwriting each other.

use crate::state::ForumState;
use std::path::Path;
use tracing::{info, warn};
use verigeek::auth::{Role, SessionToken, User};
use verigeek::error::{Result, VeriGeekError};
use verigeek::forum::{Difficulty, ListParams, Question, QuestionId, QuestionPage, UserId};
use verigeek::storage::{RocksDbConfig, RocksDbHandle};

/// Database subdirectory inside the data directory.
const DB_DIR: &str = "forum_db";

/// Column family names.
const CF_QUESTIONS: &str = "questions";
const CF_USERS: &str = "users";

/// RocksDB-backed forum persistence.
pub struct ForumPersistence {
    db: RocksDbHandle,
}

impl ForumPersistence {
    /// Opens the database under `data_dir`.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Result<Self> {
        let db_path = data_dir.as_ref().join(DB_DIR);
        let config = RocksDbConfig::for_server();
        let column_families = &[CF_QUESTIONS, CF_USERS];

        let db = RocksDbHandle::open(&db_path, &config, column_families)?;
        info!("Opened forum RocksDB at {:?}", db_path);

        Ok(Self { db })
    }

    /// Writes a question document (insert or update).
    pub fn save_question(&self, question: &Question) -> Result<()> {
        self.db
            .put(CF_QUESTIONS, question.id.as_bytes(), question)
    }

    /// Deletes a question document and its embedded comments.
    pub fn delete_question(&self, id: &QuestionId) -> Result<()> {
        self.db.delete(CF_QUESTIONS, id.as_bytes())
    }

    /// Writes a user document.
    pub fn save_user(&self, user: &User) -> Result<()> {
        self.db.put(CF_USERS, user.id.as_bytes(), user)
    }

    /// Rebuilds the in-memory state from the database.
    pub fn load_all(&self) -> Result<ForumState> {
        let mut state = ForumState::new();

        let users: Vec<User> = self.db.scan_collect(CF_USERS)?;
        for user in users {
            state.put_user(user);
        }

        let questions: Vec<Question> = self.db.scan_collect(CF_QUESTIONS)?;
        for question in questions {
            state.put_question(question);
        }

        info!(
            "Loaded {} questions and {} users from database",
            state.question_count(),
            state.user_count()
        );

        Ok(state)
    }
}

/// In-memory forum state that automatically persists changes.
pub struct PersistentForumState {
    /// The in-memory state.
    pub state: ForumState,
    /// The persistence manager.
    persistence: ForumPersistence,
}

impl PersistentForumState {
    /// Opens the database under `data_dir` and loads existing documents.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Result<Self> {
        let persistence = ForumPersistence::with_data_dir(data_dir)?;
        let state = persistence.load_all()?;

        Ok(Self { state, persistence })
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Builds one page of the filtered, sorted question list. Read-only.
    pub fn list_questions(&self, params: &ListParams) -> QuestionPage {
        self.state.list_questions(params)
    }

    /// Looks up a question without touching the view counter.
    pub fn get_question(&self, id: &QuestionId) -> Option<&Question> {
        self.state.get_question(id)
    }

    // -------------------------------------------------------------------
    // Question mutations
    // -------------------------------------------------------------------

    /// Creates a new question authored by `author` and persists it.
    pub fn create_question(
        &mut self,
        title: String,
        content: String,
        tags: Vec<String>,
        code_snippet: Option<String>,
        author: UserId,
    ) -> Result<Question> {
        let question = Question::new(title, content, tags, code_snippet, author)?;

        self.persistence.save_question(&question)?;
        self.state.put_question(question.clone());

        Ok(question)
    }

    /// Applies a field-scoped mutation to a question, persisting the
    /// updated document before committing it to the cache.
    fn mutate_question<F>(&mut self, id: &QuestionId, apply: F) -> Result<Question>
    where
        F: FnOnce(&mut Question) -> Result<()>,
    {
        let mut updated = self
            .state
            .get_question(id)
            .cloned()
            .ok_or_else(|| VeriGeekError::not_found(format!("Question {} not found", id)))?;

        apply(&mut updated)?;

        self.persistence.save_question(&updated)?;
        self.state.put_question(updated.clone());

        Ok(updated)
    }

    /// Appends a comment to a question's comment sequence.
    pub fn add_comment(
        &mut self,
        id: &QuestionId,
        content: String,
        code_snippet: Option<String>,
        author: UserId,
    ) -> Result<Question> {
        self.mutate_question(id, |q| q.push_comment(content, code_snippet, author))
    }

    /// Toggles `user`'s like on a question.
    ///
    /// Returns the updated question and whether the like is now present.
    pub fn toggle_like(&mut self, id: &QuestionId, user: UserId) -> Result<(Question, bool)> {
        let mut liked = false;
        let question = self.mutate_question(id, |q| {
            liked = q.toggle_like(user);
            Ok(())
        })?;
        Ok((question, liked))
    }

    /// Overwrites a question's difficulty classification.
    pub fn set_difficulty(&mut self, id: &QuestionId, difficulty: Difficulty) -> Result<Question> {
        self.mutate_question(id, |q| {
            q.set_difficulty(difficulty);
            Ok(())
        })
    }

    /// Records one view of a question. The increment is persisted before
    /// the updated document is returned; repeated reads by the same viewer
    /// all count.
    pub fn record_view(&mut self, id: &QuestionId) -> Result<Question> {
        self.mutate_question(id, |q| {
            q.record_view();
            Ok(())
        })
    }

    /// Deletes a question and its embedded comments.
    ///
    /// Permitted only for the original author or an admin.
    pub fn delete_question(&mut self, id: &QuestionId, caller: &User) -> Result<()> {
        let question = self
            .state
            .get_question(id)
            .ok_or_else(|| VeriGeekError::not_found(format!("Question {} not found", id)))?;

        if question.author != caller.id && !caller.is_admin() {
            return Err(VeriGeekError::forbidden(
                "Not authorized to delete this question",
            ));
        }

        self.persistence.delete_question(id)?;
        self.state.remove_question(id);

        Ok(())
    }

    // -------------------------------------------------------------------
    // Users & sessions
    // -------------------------------------------------------------------

    /// Registers a new user account and opens a session for it.
    pub fn register_user(
        &mut self,
        name: String,
        email: String,
        password: &str,
        role: Role,
    ) -> Result<(User, SessionToken)> {
        if self.state.user_by_email(&email).is_some() {
            return Err(VeriGeekError::validation(format!(
                "Email '{}' is already registered",
                email.trim().to_lowercase()
            )));
        }

        let user = User::new(name, email, password, role)?;

        self.persistence.save_user(&user)?;
        self.state.put_user(user.clone());

        let token = self.open_session(user.id);
        Ok((user, token))
    }

    /// Verifies credentials and opens a session.
    ///
    /// The error is the same whether the email is unknown or the password
    /// wrong, so login probes cannot enumerate accounts.
    pub fn login(&mut self, email: &str, password: &str) -> Result<(User, SessionToken)> {
        let user = match self.state.user_by_email(email) {
            Some(user) if user.password.verify(password) => user.clone(),
            _ => {
                warn!("Failed login attempt for '{}'", email.trim().to_lowercase());
                return Err(VeriGeekError::unauthorized("Invalid email or password"));
            }
        };

        let token = self.open_session(user.id);
        Ok((user, token))
    }

    /// Resolves a bearer token to its user.
    pub fn resolve_token(&self, token: &str) -> Option<User> {
        self.state.session_user(token).cloned()
    }

    fn open_session(&mut self, user: UserId) -> SessionToken {
        let token = SessionToken::generate();
        self.state.put_session(token.as_str().to_string(), user);
        token
    }
}
