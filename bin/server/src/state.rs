//! In-memory forum state.
//!
//! The server keeps the whole document set in memory and treats the
//! database as the durable copy. All collections are plain maps; the
//! surrounding `RwLock` (see `handlers`) serializes mutations so
//! field-scoped updates from concurrent requests cannot lose each other.

use std::collections::{HashMap, VecDeque};
use verigeek::auth::User;
use verigeek::forum::{ListParams, Question, QuestionId, QuestionPage, UserId};

/// Maximum live sessions per user. Opening another evicts the oldest, so
/// repeated logins cannot grow the session table without bound.
const MAX_SESSIONS_PER_USER: usize = 8;

/// In-memory view of the question and user collections.
#[derive(Default)]
pub struct ForumState {
    /// All questions, keyed by id.
    questions: HashMap<QuestionId, Question>,
    /// All registered users, keyed by id.
    users: HashMap<UserId, User>,
    /// Lowercased email -> user id, for login and uniqueness checks.
    users_by_email: HashMap<String, UserId>,
    /// Active session tokens -> user id. Sessions are in-memory only and
    /// expire with the process.
    sessions: HashMap<String, UserId>,
    /// Per-user session tokens, oldest first, for the session cap.
    user_sessions: HashMap<UserId, VecDeque<String>>,
}

impl ForumState {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------
    // Questions
    // -------------------------------------------------------------------

    /// Inserts or replaces a question document.
    pub fn put_question(&mut self, question: Question) {
        self.questions.insert(question.id, question);
    }

    /// Looks up a question by id.
    pub fn get_question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.get(id)
    }

    /// Removes a question, returning it if it existed. The embedded
    /// comments go with it; there is no partial state.
    pub fn remove_question(&mut self, id: &QuestionId) -> Option<Question> {
        self.questions.remove(id)
    }

    /// Returns the number of stored questions.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Returns the total number of comments across all questions.
    pub fn comment_count(&self) -> usize {
        self.questions.values().map(|q| q.comments.len()).sum()
    }

    /// Builds one page of the filtered, sorted question list.
    pub fn list_questions(&self, params: &ListParams) -> QuestionPage {
        verigeek::forum::select_page(self.questions.values(), params)
    }

    // -------------------------------------------------------------------
    // Users & sessions
    // -------------------------------------------------------------------

    /// Inserts a user and indexes their email.
    pub fn put_user(&mut self, user: User) {
        self.users_by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
    }

    /// Looks up a user by id.
    pub fn get_user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    /// Looks up a user by login email (case-insensitive).
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users_by_email
            .get(&email.trim().to_lowercase())
            .and_then(|id| self.users.get(id))
    }

    /// Returns the number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Records an active session token for a user, evicting the user's
    /// oldest session once [`MAX_SESSIONS_PER_USER`] is reached.
    pub fn put_session(&mut self, token: String, user: UserId) {
        let tokens = self.user_sessions.entry(user).or_default();
        while tokens.len() >= MAX_SESSIONS_PER_USER {
            if let Some(evicted) = tokens.pop_front() {
                self.sessions.remove(&evicted);
            }
        }
        tokens.push_back(token.clone());
        self.sessions.insert(token, user);
    }

    /// Resolves a session token to its user, if the session is active.
    pub fn session_user(&self, token: &str) -> Option<&User> {
        self.sessions
            .get(token)
            .and_then(|id| self.users.get(id))
    }
}
