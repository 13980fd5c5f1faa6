//! Application state container shared across Axum route handlers.
//!
//! Holds the database connection and the process-wide OTP store. The struct
//! is cheap to clone and is passed into handlers via Axum's `State<T>`
//! extractor.

use crate::otp::OtpStore;
use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    otp: OtpStore,
}

impl AppState {
    pub fn new(db: DatabaseConnection, otp: OtpStore) -> Self {
        Self { db, otp }
    }

    /// Shared reference to the SeaORM connection.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Cloned connection, for spawned tasks that need ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }

    pub fn otp(&self) -> &OtpStore {
        &self.otp
    }
}
