//! In-memory `SongStore` used by the controller and router tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{DbError, SongStore};
use crate::models::song::{Pagination, Song, SongFilter};

/// Keeps songs in insertion order, mirroring ILIKE with lowercase `contains`.
#[derive(Default)]
pub struct MemoryStore {
    songs: Mutex<BTreeMap<u64, Song>>,
    next: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.songs.lock().unwrap().len()
    }
}

fn matches(song: &Song, filter: &SongFilter) -> bool {
    let contains = |haystack: &str, needle: &str| {
        needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
    };
    contains(&song.group_name, &filter.group_name)
        && contains(&song.text, &filter.text)
        && contains(&song.genre, &filter.genre)
        && contains(&song.link, &filter.link)
}

#[async_trait]
impl SongStore for MemoryStore {
    async fn create(&self, song: &Song) -> Result<Uuid, DbError> {
        let mut songs = self.songs.lock().unwrap();
        if songs.values().any(|s| s.id == song.id) {
            return Err(DbError::Conflict(format!("duplicate id {}", song.id)));
        }
        let mut next = self.next.lock().unwrap();
        *next += 1;
        songs.insert(*next, song.clone());
        Ok(song.id)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Song, DbError> {
        self.songs
            .lock()
            .unwrap()
            .values()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(DbError::NotFound(id))
    }

    async fn get_all(&self) -> Result<Vec<Song>, DbError> {
        Ok(self.songs.lock().unwrap().values().cloned().collect())
    }

    async fn get_filtered(
        &self,
        filter: &SongFilter,
        page: Pagination,
    ) -> Result<Vec<Song>, DbError> {
        Ok(self
            .songs
            .lock()
            .unwrap()
            .values()
            .filter(|s| matches(s, filter))
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, song: &Song) -> Result<(), DbError> {
        if let Some(stored) = self
            .songs
            .lock()
            .unwrap()
            .values_mut()
            .find(|s| s.id == song.id)
        {
            *stored = song.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        self.songs.lock().unwrap().retain(|_, s| s.id != id);
        Ok(())
    }
}
