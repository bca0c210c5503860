//! HTTP handlers for the question API.
//!
//! Handlers take the shared state, translate wire DTOs to and from the
//! domain types, and log through `tracing`. Author references are resolved
//! to display names in responses; only the detail endpoint exposes the
//! top-level author's email. Likes are always returned as a raw id list.
//!
//! Every failure is converted at this boundary into a JSON error body with
//! the status mapping of the error taxonomy; no request can crash the
//! process.

use crate::auth::authenticate;
use crate::persistence::PersistentForumState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{error, info, instrument};
use verigeek::error::VeriGeekError;
use verigeek::forum::{
    Difficulty, ListParams, Question, QuestionId, SortKey, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

/// Thread-safe forum state.
pub type SharedForumState = Arc<RwLock<PersistentForumState>>;

// =============================================================================
// RwLock Helpers (Handle Poisoning Gracefully)
// =============================================================================

/// Acquires a read lock on the state, recovering from poison if necessary.
pub fn acquire_read_lock(
    state: &RwLock<PersistentForumState>,
) -> RwLockReadGuard<'_, PersistentForumState> {
    state.read().unwrap_or_else(|poisoned| {
        error!("RwLock was poisoned on read, recovering");
        poisoned.into_inner()
    })
}

/// Acquires a write lock on the state, recovering from poison if necessary.
pub fn acquire_write_lock(
    state: &RwLock<PersistentForumState>,
) -> RwLockWriteGuard<'_, PersistentForumState> {
    state.write().unwrap_or_else(|poisoned| {
        error!("RwLock was poisoned on write, recovering");
        poisoned.into_inner()
    })
}

// =============================================================================
// Error Mapping
// =============================================================================

/// JSON error body returned for every failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Wrapper converting domain errors into HTTP responses.
pub struct ApiError(VeriGeekError);

impl From<VeriGeekError> for ApiError {
    fn from(err: VeriGeekError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            VeriGeekError::Validation(_) | VeriGeekError::Password(_) => StatusCode::BAD_REQUEST,
            VeriGeekError::NotFound(_) => StatusCode::NOT_FOUND,
            VeriGeekError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            VeriGeekError::Forbidden(_) => StatusCode::FORBIDDEN,
            VeriGeekError::Storage(_) | VeriGeekError::Serialization(_) | VeriGeekError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!("Request failed with server error: {}", self.0);
        }

        (
            status,
            Json(ErrorBody {
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// =============================================================================
// Response DTOs
// =============================================================================

/// Author identity resolved for a response. Email is only present for the
/// top-level author of the detail endpoint.
#[derive(Debug, Serialize)]
pub struct AuthorView {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A comment with its author resolved to a display name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    pub author: AuthorView,
    pub created_at: u64,
}

/// A question as returned on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    pub author: AuthorView,
    pub comments: Vec<CommentView>,
    /// Raw user id list, never resolved to names.
    pub likes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    pub views: u64,
    pub created_at: u64,
}

/// Response body for the list endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionListResponse {
    pub questions: Vec<QuestionView>,
    pub total_pages: usize,
    pub current_page: usize,
}

/// Resolves an author id to a display identity.
fn author_view(
    state: &PersistentForumState,
    author: verigeek::forum::UserId,
    include_email: bool,
) -> AuthorView {
    match state.state.get_user(&author) {
        Some(user) => AuthorView {
            id: user.id.to_hex(),
            name: user.name.clone(),
            email: include_email.then(|| user.email.clone()),
        },
        // Accounts are never deleted, so this only happens if the stores
        // get out of sync.
        None => AuthorView {
            id: author.to_hex(),
            name: "unknown".to_string(),
            email: None,
        },
    }
}

/// Builds the wire representation of a question.
pub fn question_view(
    state: &PersistentForumState,
    question: &Question,
    include_author_email: bool,
) -> QuestionView {
    QuestionView {
        id: question.id.to_hex(),
        title: question.title.clone(),
        content: question.content.clone(),
        tags: question.tags.clone(),
        code_snippet: question.code_snippet.clone(),
        author: author_view(state, question.author, include_author_email),
        comments: question
            .comments
            .iter()
            .map(|c| CommentView {
                content: c.content.clone(),
                code_snippet: c.code_snippet.clone(),
                author: author_view(state, c.author, false),
                created_at: c.created_at,
            })
            .collect(),
        likes: question.likes.iter().map(|u| u.to_hex()).collect(),
        difficulty: question.difficulty,
        views: question.views,
        created_at: question.created_at,
    }
}

// =============================================================================
// Request DTOs
// =============================================================================

/// Query parameters for the list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub unanswered: Option<String>,
}

impl ListQuery {
    /// Normalizes the raw query into domain list parameters.
    fn into_params(self) -> Result<ListParams, VeriGeekError> {
        let sort = match self.sort.as_deref() {
            Some(raw) => raw.parse::<SortKey>()?,
            None => SortKey::default(),
        };

        Ok(ListParams {
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            tag: self.tag.filter(|t| !t.is_empty()),
            search: self.search.filter(|s| !s.is_empty()),
            sort,
            unanswered: self.unanswered.as_deref() == Some("true"),
        })
    }
}

/// Request body for question creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub code_snippet: Option<String>,
}

/// Request body for appending a comment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub content: String,
    pub code_snippet: Option<String>,
}

/// Request body for the difficulty endpoint.
#[derive(Debug, Deserialize)]
pub struct SetDifficultyRequest {
    pub difficulty: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// List questions with filtering, sorting, and pagination.
#[instrument(skip(state))]
pub async fn list_questions(
    State(state): State<SharedForumState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<QuestionListResponse>, ApiError> {
    let params = query.into_params()?;

    let forum = acquire_read_lock(&state);
    let page = forum.list_questions(&params);

    let questions: Vec<QuestionView> = page
        .questions
        .iter()
        .map(|q| question_view(&forum, q, false))
        .collect();

    info!(
        "Listed {} questions (page {}/{})",
        questions.len(),
        page.current_page,
        page.total_pages
    );

    Ok(Json(QuestionListResponse {
        questions,
        total_pages: page.total_pages,
        current_page: page.current_page,
    }))
}

/// Get a single question, incrementing its view counter.
#[instrument(skip(state))]
pub async fn get_question(
    State(state): State<SharedForumState>,
    Path(id_hex): Path<String>,
) -> Result<Json<QuestionView>, ApiError> {
    let id = QuestionId::from_hex(&id_hex)?;

    // The view increment is persisted before the response is built, so
    // this takes the write lock even though it is a GET.
    let mut forum = acquire_write_lock(&state);
    let question = forum.record_view(&id)?;

    Ok(Json(question_view(&forum, &question, true)))
}

/// Create a new question. The authenticated caller becomes the author.
#[instrument(skip(state, headers, request))]
pub async fn create_question(
    State(state): State<SharedForumState>,
    headers: HeaderMap,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<QuestionView>), ApiError> {
    let mut forum = acquire_write_lock(&state);
    let user = authenticate(&forum, &headers)?;

    let question = forum.create_question(
        request.title,
        request.content,
        request.tags,
        request.code_snippet,
        user.id,
    )?;

    info!(
        "User {} created question {} '{}'",
        user.name,
        question.id,
        question.title
    );

    let view = question_view(&forum, &question, false);
    Ok((StatusCode::CREATED, Json(view)))
}

/// Append a comment to a question.
#[instrument(skip(state, headers, request))]
pub async fn add_comment(
    State(state): State<SharedForumState>,
    Path(id_hex): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AddCommentRequest>,
) -> Result<Json<QuestionView>, ApiError> {
    let id = QuestionId::from_hex(&id_hex)?;

    let mut forum = acquire_write_lock(&state);
    let user = authenticate(&forum, &headers)?;

    let question = forum.add_comment(&id, request.content, request.code_snippet, user.id)?;

    info!(
        "User {} commented on question {} ({} comments)",
        user.name,
        id,
        question.comments.len()
    );

    Ok(Json(question_view(&forum, &question, false)))
}

/// Toggle the caller's like on a question.
#[instrument(skip(state, headers))]
pub async fn toggle_like(
    State(state): State<SharedForumState>,
    Path(id_hex): Path<String>,
    headers: HeaderMap,
) -> Result<Json<QuestionView>, ApiError> {
    let id = QuestionId::from_hex(&id_hex)?;

    let mut forum = acquire_write_lock(&state);
    let user = authenticate(&forum, &headers)?;

    let (question, liked) = forum.toggle_like(&id, user.id)?;

    info!(
        "User {} {} question {} ({} likes)",
        user.name,
        if liked { "liked" } else { "unliked" },
        id,
        question.like_count()
    );

    Ok(Json(question_view(&forum, &question, false)))
}

/// Set a question's difficulty classification.
#[instrument(skip(state, headers, request))]
pub async fn set_difficulty(
    State(state): State<SharedForumState>,
    Path(id_hex): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SetDifficultyRequest>,
) -> Result<Json<QuestionView>, ApiError> {
    let id = QuestionId::from_hex(&id_hex)?;
    let difficulty: Difficulty = request.difficulty.parse()?;

    let mut forum = acquire_write_lock(&state);
    let user = authenticate(&forum, &headers)?;

    let question = forum.set_difficulty(&id, difficulty)?;

    info!(
        "User {} set question {} difficulty to {}",
        user.name, id, difficulty
    );

    Ok(Json(question_view(&forum, &question, false)))
}

/// Delete a question. Only the author or an admin may do this.
#[instrument(skip(state, headers))]
pub async fn delete_question(
    State(state): State<SharedForumState>,
    Path(id_hex): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = QuestionId::from_hex(&id_hex)?;

    let mut forum = acquire_write_lock(&state);
    let user = authenticate(&forum, &headers)?;

    forum.delete_question(&id, &user)?;

    info!("User {} deleted question {}", user.name, id);

    Ok(Json(serde_json::json!({ "message": "Question deleted" })))
}

/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "verigeek-forum",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Server stats endpoint.
#[instrument(skip(state))]
pub async fn stats(State(state): State<SharedForumState>) -> impl IntoResponse {
    let forum = acquire_read_lock(&state);

    Json(serde_json::json!({
        "questions": forum.state.question_count(),
        "comments": forum.state.comment_count(),
        "registered_users": forum.state.user_count()
    }))
}
