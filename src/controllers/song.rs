use std::sync::Arc;

use chrono::SubsecRound;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{DbError, SongStore};
use crate::models::song::{Pagination, Song, SongFilter};

/// Postgres `timestamp` keeps microseconds; anything finer is dropped up
/// front so the returned song matches what a later read yields.
const STORED_SUBSEC_DIGITS: u16 = 6;

#[derive(Debug, thiserror::Error)]
pub enum SongError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("song not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(DbError),
}

impl From<DbError> for SongError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(_) => SongError::NotFound,
            DbError::Conflict(msg) => SongError::Conflict(msg),
            other => SongError::Database(other),
        }
    }
}

/// Validation and id assignment in front of the store.
#[derive(Clone)]
pub struct SongController {
    store: Arc<dyn SongStore>,
}

impl SongController {
    pub fn new(store: Arc<dyn SongStore>) -> Self {
        SongController { store }
    }

    /// Stores `song` under a freshly generated id, whatever id it carried.
    pub async fn create_song(&self, song: Option<Song>) -> Result<Song, SongError> {
        let mut song = song.ok_or(SongError::InvalidInput("empty song"))?;
        song.id = Uuid::new_v4();
        song.date_added = song.date_added.trunc_subsecs(STORED_SUBSEC_DIGITS);
        song.id = self.store.create(&song).await?;
        Ok(song)
    }

    pub async fn get_song_by_id(&self, id: Uuid) -> Result<Song, SongError> {
        if id.is_nil() {
            return Err(SongError::InvalidInput("bad id"));
        }
        Ok(self.store.get_by_id(id).await?)
    }

    pub async fn get_all_songs(&self) -> Result<Vec<Song>, SongError> {
        Ok(self.store.get_all().await?)
    }

    pub async fn get_filtered_songs(
        &self,
        filter: &SongFilter,
        page: Pagination,
    ) -> Result<Vec<Song>, SongError> {
        debug!(?filter, page = page.page, limit = page.limit, "filtering songs");
        let songs = self.store.get_filtered(filter, page).await?;
        info!("Fetched {} songs", songs.len());
        Ok(songs)
    }

    /// Does not check that the song exists; updating a missing id is a no-op.
    pub async fn update_song(&self, song: Option<Song>) -> Result<Song, SongError> {
        let mut song = song.ok_or(SongError::InvalidInput("empty song"))?;
        song.date_added = song.date_added.trunc_subsecs(STORED_SUBSEC_DIGITS);
        self.store.update(&song).await?;
        Ok(song)
    }

    pub async fn delete_song(&self, id: Uuid) -> Result<(), SongError> {
        if id.is_nil() {
            return Err(SongError::InvalidInput("bad id"));
        }
        Ok(self.store.delete(id).await?)
    }
}
