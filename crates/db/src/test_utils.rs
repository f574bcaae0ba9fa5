//! Test utilities for database operations.
//!
//! Tests run against an in-memory SQLite database with the real
//! migrations applied, so repository and service tests are hermetic
//! and need no external services.

use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::migrations::Migrator;

/// A freshly-migrated in-memory test database.
pub struct TestDatabase {
    conn: DatabaseConnection,
}

impl TestDatabase {
    /// Create a new in-memory database and run all migrations.
    pub async fn new() -> Result<Self, DbErr> {
        let conn = Database::connect("sqlite::memory:").await?;
        Migrator::up(&conn, None).await?;
        Ok(Self { conn })
    }

    /// Borrow the connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Take ownership of the connection.
    #[must_use]
    pub fn into_connection(self) -> DatabaseConnection {
        self.conn
    }
}
