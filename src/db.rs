use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::models::song::{Pagination, Song, SongFilter, SongRow};

#[cfg(test)]
pub mod memory;

const SONG_COLUMNS: &str = "id, group_name, text, genre, date_added, link";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("song '{0}' not found")]
    NotFound(Uuid),

    #[error("constraint violated: {0}")]
    Conflict(String),

    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

/// Data access for the `songs` table.
#[async_trait]
pub trait SongStore: Send + Sync {
    /// Inserts `song` (id included) and returns the stored id.
    async fn create(&self, song: &Song) -> Result<Uuid, DbError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Song, DbError>;

    /// Every row, in whatever order the store yields them.
    async fn get_all(&self) -> Result<Vec<Song>, DbError>;

    async fn get_filtered(
        &self,
        filter: &SongFilter,
        page: Pagination,
    ) -> Result<Vec<Song>, DbError>;

    /// Overwrites every mutable column; a missing id touches nothing.
    async fn update(&self, song: &Song) -> Result<(), DbError>;

    /// Removing a missing id is not an error.
    async fn delete(&self, id: Uuid) -> Result<(), DbError>;
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    timeout: Duration,
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self, sqlx::Error> {
        debug!("connecting to postgres, max_connections={}", config.db_max_connections);

        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self::with_pool(pool, config.db_timeout))
    }

    pub fn with_pool(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, op: &'static str, query: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(DbError::Timeout {
                op,
                after: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl SongStore for Database {
    async fn create(&self, song: &Song) -> Result<Uuid, DbError> {
        let query = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO songs (id, group_name, text, genre, date_added, link)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(song.id)
        .bind(&song.group_name)
        .bind(&song.text)
        .bind(&song.genre)
        .bind(song.date_added.naive_utc())
        .bind(&song.link)
        .fetch_one(&self.pool);

        match self.bounded("insert song", query).await {
            Ok(id) => {
                info!("created song {}", id);
                Ok(id)
            }
            Err(DbError::Sqlx(e)) => {
                let err = constraint_violation(e);
                error!("failed to save song: {}", err);
                Err(err)
            }
            Err(e) => {
                error!("failed to save song: {}", e);
                Err(e)
            }
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Song, DbError> {
        let sql = format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = $1");
        let query = sqlx::query_as::<_, SongRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool);

        match self.bounded("select song", query).await {
            Ok(Some(row)) => {
                debug!("fetched song {}", id);
                Ok(row.into())
            }
            Ok(None) => Err(DbError::NotFound(id)),
            Err(e) => {
                error!("failed to fetch song {}: {}", id, e);
                Err(e)
            }
        }
    }

    async fn get_all(&self) -> Result<Vec<Song>, DbError> {
        let sql = format!("SELECT {SONG_COLUMNS} FROM songs");
        let query = sqlx::query_as::<_, SongRow>(&sql).fetch_all(&self.pool);

        let rows = self.bounded("select songs", query).await.inspect_err(|e| {
            error!("failed to fetch songs: {}", e);
        })?;
        info!("fetched {} songs", rows.len());
        Ok(rows.into_iter().map(Song::from).collect())
    }

    async fn get_filtered(
        &self,
        filter: &SongFilter,
        page: Pagination,
    ) -> Result<Vec<Song>, DbError> {
        let active = filter.active();
        let sql = filtered_query(&active);

        let mut query = sqlx::query_as::<_, SongRow>(&sql);
        for (_, needle) in &active {
            query = query.bind(format!("%{}%", escape_like(needle)));
        }
        let query = query
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool);

        let rows = self
            .bounded("select filtered songs", query)
            .await
            .inspect_err(|e| error!("failed to fetch filtered songs: {}", e))?;
        info!(
            "fetched {} filtered songs (page={}, limit={})",
            rows.len(),
            page.page,
            page.limit
        );
        Ok(rows.into_iter().map(Song::from).collect())
    }

    async fn update(&self, song: &Song) -> Result<(), DbError> {
        let query = sqlx::query(
            "UPDATE songs SET group_name = $1, text = $2, genre = $3, date_added = $4, link = $5
             WHERE id = $6",
        )
        .bind(&song.group_name)
        .bind(&song.text)
        .bind(&song.genre)
        .bind(song.date_added.naive_utc())
        .bind(&song.link)
        .bind(song.id)
        .execute(&self.pool);

        match self.bounded("update song", query).await {
            Ok(done) => {
                info!("updated song {} ({} rows)", song.id, done.rows_affected());
                Ok(())
            }
            Err(DbError::Sqlx(e)) => {
                let err = constraint_violation(e);
                error!("failed to update song {}: {}", song.id, err);
                Err(err)
            }
            Err(e) => {
                error!("failed to update song {}: {}", song.id, e);
                Err(e)
            }
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let query = sqlx::query("DELETE FROM songs WHERE id = $1")
            .bind(id)
            .execute(&self.pool);

        let done = self
            .bounded("delete song", query)
            .await
            .inspect_err(|e| error!("failed to delete song {}: {}", id, e))?;
        info!("deleted song {} ({} rows)", id, done.rows_affected());
        Ok(())
    }
}

/// Builds the SELECT for the given active filters. Filter placeholders come
/// first, then LIMIT and OFFSET.
fn filtered_query(active: &[(&'static str, &str)]) -> String {
    let mut sql = format!("SELECT {SONG_COLUMNS} FROM songs");

    if !active.is_empty() {
        let conditions: Vec<String> = active
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} ILIKE ${}", column, i + 1))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    let n = active.len();
    sql.push_str(&format!(" LIMIT ${} OFFSET ${}", n + 1, n + 2));
    sql
}

/// Escapes LIKE wildcards so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn constraint_violation(err: sqlx::Error) -> DbError {
    if let Some(db_err) = err.as_database_error() {
        if matches!(
            db_err.kind(),
            ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
        ) {
            return DbError::Conflict(db_err.message().to_string());
        }
    }
    DbError::Sqlx(err)
}
