//! Database connection management using sqlx
//!
//! Connections are opened per operation (introspection, execution) and closed
//! when the operation finishes, so no connection outlives a unit of work and
//! nothing leaks across failures.

use crate::error::{AskError, Result};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::fmt;

pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Connection parameters for the target MySQL database.
///
/// Built by the caller (connection setup is outside this crate), held for the
/// duration of a session, never persisted here.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectionDescriptor {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_MYSQL_PORT,
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

// Manual Debug so the password never lands in logs.
impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Open a single connection for one unit of work.
pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<MySqlConnection> {
    descriptor
        .options()
        .connect()
        .await
        .map_err(|e| AskError::Connection {
            message: e.to_string(),
            sql: None,
        })
}

/// Verify the descriptor can reach the database ("test then hand over").
pub async fn ping(descriptor: &ConnectionDescriptor) -> Result<()> {
    let mut conn = connect(descriptor).await?;
    let checked = sqlx::query("SELECT 1").execute(&mut conn).await;
    let _ = conn.close().await;
    checked
        .map(|_| ())
        .map_err(|e| AskError::Connection {
            message: e.to_string(),
            sql: None,
        })
}
