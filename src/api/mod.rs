// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! JSON API over the services in [`crate::commands`].

pub mod handlers;
pub mod router;
pub mod server;

use std::any::Any;
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::error::{Error, Result};

pub use router::create_router;
pub use server::run_server;

/// Shared handler state. The connection is only ever locked from
/// synchronous code, so the guard never lives across an `.await`.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `f` with the connection locked. A handler that panicked while
    /// holding the lock leaves it poisoned; the next caller rolls back
    /// whatever that request left open and carries on.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = match self.db.lock() {
            Ok(conn) => conn,
            Err(poisoned) => {
                let conn = poisoned.into_inner();
                self.db.clear_poison();
                tracing::warn!("recovering database connection after a panicked request");
                if !conn.is_autocommit() {
                    conn.execute_batch("ROLLBACK")?;
                }
                conn
            }
        };
        f(&conn)
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Database(_) | Error::Json(_) | Error::Corrupt(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_client_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
        } else {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Response for a handler that panicked: the same JSON error shape as any
/// other server failure.
pub(crate) fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    Error::Internal("request handler panicked".into()).into_response()
}
