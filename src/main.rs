//! Syncmarks server — chunked bookmark sync over HTTP.
//!
//! Configuration comes from the environment:
//! - `SYNCMARKS_AUTH_SECRET` (required): HMAC secret shared with the
//!   credential service that issues tokens.
//! - `SYNCMARKS_DATA_DIR`: directory for `syncmarks.db`; defaults to the
//!   executable's directory.
//! - `SYNCMARKS_ADDR`: bind address, default `127.0.0.1:5000`.
//!
//! `syncmarks-server issue-token <user-id> [ttl-secs]` prints a signed
//! token for local testing, then exits.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroize;

use syncmarks::api;
use syncmarks::app::App;
use syncmarks::managers::sync_coordinator::RetryPolicy;
use syncmarks::services::auth_service::{AuthService, AuthServiceTrait};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut secret = env::var("SYNCMARKS_AUTH_SECRET")
        .expect("SYNCMARKS_AUTH_SECRET must be set (shared with the credential service)");

    if let Some(command) = env::args().nth(1) {
        if command == "issue-token" {
            issue_token(&secret);
            secret.zeroize();
            return;
        }
        eprintln!("Unknown command: {}", command);
        std::process::exit(2);
    }

    let db_path = if let Ok(dir) = env::var("SYNCMARKS_DATA_DIR") {
        PathBuf::from(dir).join("syncmarks.db")
    } else if let Ok(exe) = env::current_exe() {
        exe.parent()
            .unwrap_or(std::path::Path::new("."))
            .join("syncmarks.db")
    } else {
        PathBuf::from("syncmarks.db")
    };

    let app = App::new(
        db_path.to_str().unwrap_or("syncmarks.db"),
        secret.as_bytes(),
        RetryPolicy::default(),
    )
    .expect("Failed to initialize Syncmarks");
    secret.zeroize();

    let addr = env::var("SYNCMARKS_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");
    info!(
        version = env!("CARGO_PKG_VERSION"),
        %addr,
        db = %db_path.display(),
        "syncmarks server ready"
    );

    axum::serve(listener, api::router(Arc::new(app)))
        .await
        .expect("Server error");
}

/// Prints a signed token for `issue-token <user-id> [ttl-secs]`.
fn issue_token(secret: &str) {
    let user_id: i64 = env::args()
        .nth(2)
        .and_then(|arg| arg.parse().ok())
        .expect("usage: syncmarks-server issue-token <user-id> [ttl-secs]");
    let ttl_secs: i64 = env::args()
        .nth(3)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(3600);

    let auth = AuthService::new(secret.as_bytes());
    println!("{}", auth.issue(user_id, ttl_secs));
}
