//! VeriGeek Forum Server
//!
//! REST backend for the VeriGeek discussion forum: question documents with
//! embedded comments, like toggles, difficulty tags, and view counters,
//! persisted in RocksDB and served over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings (localhost:4000, ./verigeek_data)
//! verigeek-server
//!
//! # Run on custom address
//! verigeek-server --bind 0.0.0.0:8080
//!
//! # Store data elsewhere
//! VERIGEEK_DATA_DIR=/var/lib/verigeek verigeek-server
//!
//! # Enable debug logging
//! RUST_LOG=debug verigeek-server
//! ```

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use verigeek_server::auth;
use verigeek_server::handlers::{self, SharedForumState};
use verigeek_server::persistence::PersistentForumState;
use verigeek_server::rate_limit::{ThrottleConfig, ThrottleLayer};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default data directory when `VERIGEEK_DATA_DIR` is unset.
const DEFAULT_DATA_DIR: &str = "verigeek_data";

/// Default bind address when `--bind` is not given.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4000";

const USAGE: &str = "Usage: verigeek-server [--bind <addr:port>]";

/// Resolves the bind address from the command line.
///
/// `--bind` without a value, or any unrecognized argument, is an error
/// rather than a silent fall-through to the default.
fn parse_bind_addr(mut args: impl Iterator<Item = String>) -> Result<String, String> {
    match args.next() {
        None => Ok(DEFAULT_BIND_ADDR.to_string()),
        Some(flag) if flag == "--bind" => match args.next() {
            Some(addr) => match args.next() {
                None => Ok(addr),
                Some(extra) => Err(format!("Unexpected argument: '{}'\n{}", extra, USAGE)),
            },
            None => Err(format!("--bind requires an address\n{}", USAGE)),
        },
        Some(other) => Err(format!("Unknown argument: '{}'\n{}", other, USAGE)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verigeek_server=info,verigeek=info".into()),
        )
        .init();

    let bind_addr = match parse_bind_addr(std::env::args().skip(1)) {
        Ok(addr) => addr,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    let data_dir =
        std::env::var("VERIGEEK_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());

    let forum = PersistentForumState::with_data_dir(&data_dir)?;
    info!(
        "Forum loaded: {} questions, {} users",
        forum.state.question_count(),
        forum.state.user_count()
    );
    let forum_state: SharedForumState = Arc::new(RwLock::new(forum));

    let read_throttle = ThrottleLayer::new(ThrottleConfig::for_reads());
    let write_throttle = ThrottleLayer::new(ThrottleConfig::for_writes());

    // Mutations and auth get the tighter limits.
    let write_router = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/questions", post(handlers::create_question))
        .route("/questions/:id/comments", post(handlers::add_comment))
        .route("/questions/:id/like", post(handlers::toggle_like))
        .route("/questions/:id/difficulty", patch(handlers::set_difficulty))
        .route("/questions/:id", delete(handlers::delete_question))
        .with_state(forum_state.clone())
        .layer(write_throttle);

    let read_router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::stats))
        .route("/questions", get(handlers::list_questions))
        .route("/questions/:id", get(handlers::get_question))
        .with_state(forum_state)
        .layer(read_throttle);

    let app = Router::new().merge(write_router).merge(read_router);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("VeriGeek Forum Server running on http://{}", bind_addr);
    info!("");
    info!("Endpoints:");
    info!("  POST   /auth/register             - Register a member account");
    info!("  POST   /auth/login                - Log in, returns a bearer token");
    info!("  GET    /questions                 - List questions (filter/sort/paginate)");
    info!("  POST   /questions                 - Create a question (auth)");
    info!("  GET    /questions/:id             - Get a question, counts a view");
    info!("  POST   /questions/:id/comments    - Add a comment (auth)");
    info!("  POST   /questions/:id/like        - Toggle a like (auth)");
    info!("  PATCH  /questions/:id/difficulty  - Set difficulty (auth)");
    info!("  DELETE /questions/:id             - Delete (author or admin)");
    info!("  GET    /health                    - Health check");
    info!("  GET    /stats                     - Server statistics");

    // Connect info is required so throttling can see client addresses.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
