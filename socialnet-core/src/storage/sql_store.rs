//! SQL-based storage implementation for the social graph

use super::{SocialStore, StoreError, UserInsert, WriteOutcome};
use crate::model::{
    Comment, CommentId, NewComment, NewPost, NewUser, Post, PostId, Timestamp, User, UserId,
    UserSummary,
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

const USER_COLUMNS: &str =
    "id, hashed_password, salt, first_name, last_name, date_of_birth, email, username";

const POST_COLUMNS: &str = "id, user_id, content_text, content_image_path, visible, created_at";

/// SQL-based storage for users, posts and follow edges
pub struct SqlSocialStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqlSocialStore {
    /// Create a new SQL store with the given connection pool
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Result<Self, StoreError> {
        super::migrations::migrate(&pool)?;

        Ok(Self { pool })
    }

    /// Open (or create) a database file with a pool of `pool_size` connections
    pub fn open(path: impl AsRef<Path>, pool_size: u32) -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::file(path).with_init(init_connection);
        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        Self::new(pool)
    }

    /// Create a new in-memory store
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// capped at a single connection.
    pub fn memory() -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        let pool = Pool::builder().max_size(1).build(manager)?;

        Self::new(pool)
    }
}

fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        hashed_password: row.get(1)?,
        salt: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        date_of_birth: row.get(5)?,
        email: row.get(6)?,
        username: row.get(7)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        user_id: UserId(row.get(0)?),
        username: row.get(1)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: PostId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        content_text: row.get(2)?,
        content_image_path: row.get(3)?,
        visible: row.get(4)?,
        created_at: Timestamp::from_millis(row.get::<_, i64>(5)?.max(0) as u64),
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: CommentId(row.get(0)?),
        post_id: PostId(row.get(1)?),
        user_id: UserId(row.get(2)?),
        content_text: row.get(3)?,
    })
}

fn query_summaries(
    conn: &Connection,
    sql: &str,
    user_id: UserId,
) -> Result<Vec<UserSummary>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![user_id.0], summary_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

impl SocialStore for SqlSocialStore {
    // ===== Users =====

    fn insert_user(&self, user: &NewUser) -> Result<UserInsert, StoreError> {
        let conn = self.pool.get()?;

        let inserted = conn.execute(
            "INSERT INTO users (hashed_password, salt, first_name, last_name, date_of_birth, email, username)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                &user.hashed_password,
                &user.salt,
                &user.first_name,
                &user.last_name,
                user.date_of_birth,
                &user.email,
                &user.username,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(UserInsert::UsernameTaken),
            Err(e) => return Err(e.into()),
        }

        Ok(UserInsert::Created(User {
            id: UserId(conn.last_insert_rowid()),
            hashed_password: user.hashed_password.clone(),
            salt: user.salt.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            date_of_birth: user.date_of_birth,
            email: user.email.clone(),
            username: user.username.clone(),
        }))
    }

    fn get_user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        let conn = self.pool.get()?;

        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![user_id.0],
                user_from_row,
            )
            .optional()?;

        Ok(user)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.pool.get()?;

        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
                params![username],
                user_from_row,
            )
            .optional()?;

        Ok(user)
    }

    fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let conn = self.pool.get()?;

        conn.execute(
            "UPDATE users SET hashed_password = ?, salt = ?, first_name = ?, last_name = ?,
                date_of_birth = ?, email = ?
             WHERE id = ?",
            params![
                &user.hashed_password,
                &user.salt,
                &user.first_name,
                &user.last_name,
                user.date_of_birth,
                &user.email,
                user.id.0,
            ],
        )?;

        Ok(())
    }

    fn user_exists(&self, user_id: UserId) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;

        let found = conn
            .query_row("SELECT 1 FROM users WHERE id = ?", params![user_id.0], |_| Ok(()))
            .optional()?;

        Ok(found.is_some())
    }

    // ===== Follow graph =====

    fn following_ids(&self, user_id: UserId) -> Result<Vec<UserId>, StoreError> {
        let conn = self.pool.get()?;

        let mut stmt = conn
            .prepare("SELECT following_id FROM user_following WHERE user_id = ? ORDER BY rowid")?;
        let ids = stmt
            .query_map(params![user_id.0], |row| Ok(UserId(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    fn following(&self, user_id: UserId) -> Result<Vec<UserSummary>, StoreError> {
        let conn = self.pool.get()?;
        query_summaries(
            &conn,
            "SELECT u.id, u.username FROM user_following f
             JOIN users u ON u.id = f.following_id
             WHERE f.user_id = ? ORDER BY f.rowid",
            user_id,
        )
    }

    fn followers(&self, user_id: UserId) -> Result<Vec<UserSummary>, StoreError> {
        let conn = self.pool.get()?;
        query_summaries(
            &conn,
            "SELECT u.id, u.username FROM user_followers f
             JOIN users u ON u.id = f.follower_id
             WHERE f.user_id = ? ORDER BY f.rowid",
            user_id,
        )
    }

    fn insert_follow(
        &self,
        follower: UserId,
        followee: UserId,
    ) -> Result<WriteOutcome, StoreError> {
        let conn = self.pool.get()?;
        let tx = conn.unchecked_transaction()?;

        // Dropping `tx` on an early return rolls back.
        let inserted = tx.execute(
            "INSERT INTO user_following (user_id, following_id) VALUES (?, ?)",
            params![follower.0, followee.0],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(WriteOutcome::Unchanged),
            Err(e) => return Err(e.into()),
        }

        tx.execute(
            "INSERT INTO user_followers (user_id, follower_id) VALUES (?, ?)",
            params![followee.0, follower.0],
        )?;

        tx.commit()?;

        Ok(WriteOutcome::Applied)
    }

    fn delete_follow(
        &self,
        follower: UserId,
        followee: UserId,
    ) -> Result<WriteOutcome, StoreError> {
        let conn = self.pool.get()?;
        let tx = conn.unchecked_transaction()?;

        let removed = tx.execute(
            "DELETE FROM user_following WHERE user_id = ? AND following_id = ?",
            params![follower.0, followee.0],
        )?;
        let mirrored = tx.execute(
            "DELETE FROM user_followers WHERE user_id = ? AND follower_id = ?",
            params![followee.0, follower.0],
        )?;

        tx.commit()?;

        if removed != mirrored {
            warn!(
                follower = %follower,
                followee = %followee,
                removed,
                mirrored,
                "Follow edge was asymmetric before delete"
            );
        }

        if removed + mirrored > 0 {
            Ok(WriteOutcome::Applied)
        } else {
            Ok(WriteOutcome::Unchanged)
        }
    }

    // ===== Feed =====

    fn followee_post_ids(&self, user_id: UserId) -> Result<Vec<PostId>, StoreError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT p.id FROM user_following f
             JOIN posts p ON p.user_id = f.following_id
             WHERE f.user_id = ?
             ORDER BY f.rowid, p.id",
        )?;
        let ids = stmt
            .query_map(params![user_id.0], |row| Ok(PostId(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    // ===== Posts =====

    fn insert_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        let conn = self.pool.get()?;
        let created_at = Timestamp::now();

        conn.execute(
            "INSERT INTO posts (user_id, content_text, content_image_path, visible, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                post.user_id.0,
                &post.content_text,
                &post.content_image_path,
                post.visible,
                created_at.as_millis() as i64,
            ],
        )?;

        Ok(Post {
            id: PostId(conn.last_insert_rowid()),
            user_id: post.user_id,
            content_text: post.content_text.clone(),
            content_image_path: post.content_image_path.clone(),
            visible: post.visible,
            created_at,
        })
    }

    fn get_post(&self, post_id: PostId) -> Result<Option<Post>, StoreError> {
        let conn = self.pool.get()?;

        let post = conn
            .query_row(
                &format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS),
                params![post_id.0],
                post_from_row,
            )
            .optional()?;

        Ok(post)
    }

    fn update_post(&self, post: &Post) -> Result<(), StoreError> {
        let conn = self.pool.get()?;

        // created_at is immutable and deliberately absent here
        conn.execute(
            "UPDATE posts SET content_text = ?, content_image_path = ?, visible = ? WHERE id = ?",
            params![
                &post.content_text,
                &post.content_image_path,
                post.visible,
                post.id.0,
            ],
        )?;

        Ok(())
    }

    fn delete_post(&self, post_id: PostId) -> Result<WriteOutcome, StoreError> {
        let conn = self.pool.get()?;

        let removed = conn.execute("DELETE FROM posts WHERE id = ?", params![post_id.0])?;

        Ok(if removed > 0 {
            WriteOutcome::Applied
        } else {
            WriteOutcome::Unchanged
        })
    }

    fn insert_like(&self, user_id: UserId, post_id: PostId) -> Result<WriteOutcome, StoreError> {
        let conn = self.pool.get()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO post_likes (post_id, user_id) VALUES (?, ?)",
            params![post_id.0, user_id.0],
        )?;

        Ok(if inserted > 0 {
            WriteOutcome::Applied
        } else {
            WriteOutcome::Unchanged
        })
    }

    fn like_count(&self, post_id: PostId) -> Result<u64, StoreError> {
        let conn = self.pool.get()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM post_likes WHERE post_id = ?",
            params![post_id.0],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as u64)
    }

    fn insert_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO post_comments (post_id, user_id, content_text) VALUES (?, ?, ?)",
            params![comment.post_id.0, comment.user_id.0, &comment.content_text],
        )?;

        Ok(Comment {
            id: CommentId(conn.last_insert_rowid()),
            post_id: comment.post_id,
            user_id: comment.user_id,
            content_text: comment.content_text.clone(),
        })
    }

    fn comments(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, post_id, user_id, content_text FROM post_comments
             WHERE post_id = ? ORDER BY id",
        )?;
        let comments = stmt
            .query_map(params![post_id.0], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }
}
