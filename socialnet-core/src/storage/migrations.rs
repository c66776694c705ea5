//! Database migrations for the social graph schema
//!
//! Provides versioned migrations for users, posts and the follow graph.
//! Each migration is applied atomically and tracked in the schema_version table.

use super::StoreError;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::model::Timestamp;

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial users, posts and follow graph schema",
        up_sql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hashed_password TEXT NOT NULL,
                salt TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                date_of_birth TEXT NOT NULL,
                email TEXT NOT NULL,
                username TEXT NOT NULL UNIQUE
            );

            -- Both sides of every follow edge. A follow writes one row into each
            -- table inside the same transaction; rowid order is insertion order.
            CREATE TABLE IF NOT EXISTS user_following (
                user_id INTEGER NOT NULL,               -- follower
                following_id INTEGER NOT NULL,          -- followee
                PRIMARY KEY (user_id, following_id),
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (following_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS user_followers (
                user_id INTEGER NOT NULL,               -- followee
                follower_id INTEGER NOT NULL,           -- follower
                PRIMARY KEY (user_id, follower_id),
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (follower_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                content_text TEXT NOT NULL,
                content_image_path TEXT,
                visible BOOLEAN NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_posts_user ON posts(user_id);

            CREATE TABLE IF NOT EXISTS post_likes (
                post_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                PRIMARY KEY (post_id, user_id),
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS post_comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                content_text TEXT NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_post_comments_post ON post_comments(post_id);
        "#,
    }]
}

/// Get current schema version from database
fn get_current_version(conn: &Connection) -> Result<i32, rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> Result<(), StoreError> {
    let conn = pool.get()?;
    let current_version = get_current_version(&conn)?;

    for migration in get_migrations().into_iter().filter(|m| m.version > current_version) {
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(migration.up_sql)?;
        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, Timestamp::now().as_millis() as i64],
        )?;

        tx.commit()?;

        info!(
            version = migration.version,
            description = migration.description,
            "Applied schema migration"
        );
    }

    Ok(())
}
