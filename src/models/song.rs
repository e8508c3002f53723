use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// A row of the `songs` table as seen over the wire.
///
/// Fields absent from a request body decode to their zero values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Song {
    pub id: Uuid,
    #[serde(rename = "groupName")]
    pub group_name: String,
    pub text: String,
    pub genre: String,
    pub date_added: DateTime<Utc>,
    pub link: String,
}

/// `date_added` is a plain `timestamp` column, so rows carry a naive value
/// that is interpreted as UTC.
#[derive(Debug, FromRow)]
pub struct SongRow {
    pub id: Uuid,
    pub group_name: String,
    pub text: String,
    pub genre: String,
    pub date_added: NaiveDateTime,
    pub link: String,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        Song {
            id: row.id,
            group_name: row.group_name,
            text: row.text,
            genre: row.genre,
            date_added: row.date_added.and_utc(),
            link: row.link,
        }
    }
}

/// Case-insensitive substring filters; empty strings are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongFilter {
    pub group_name: String,
    pub text: String,
    pub genre: String,
    pub link: String,
}

impl SongFilter {
    pub fn is_empty(&self) -> bool {
        self.group_name.is_empty()
            && self.text.is_empty()
            && self.genre.is_empty()
            && self.link.is_empty()
    }

    /// Column name and needle for every active filter, in a stable order.
    pub fn active(&self) -> Vec<(&'static str, &str)> {
        [
            ("group_name", self.group_name.as_str()),
            ("text", self.text.as_str()),
            ("genre", self.genre.as_str()),
            ("link", self.link.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }
}

/// 1-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Lenient parse: anything non-numeric or below 1 falls back to the
    /// default, and `limit` is clamped to `max_limit`.
    pub fn parse(page: Option<&str>, limit: Option<&str>, max_limit: i64) -> Self {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(limit).unwrap_or(DEFAULT_LIMIT);
        Pagination {
            page,
            limit: limit.min(max_limit.max(1)),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
}

/// Raw query string of `/view_song_with_filter`.
#[derive(Debug, Default, Deserialize)]
pub struct SongQuery {
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub link: String,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl SongQuery {
    pub fn into_parts(self, max_limit: i64) -> (SongFilter, Pagination) {
        let pagination = Pagination::parse(self.page.as_deref(), self.limit.as_deref(), max_limit);
        let filter = SongFilter {
            group_name: self.group_name,
            text: self.text,
            genre: self.genre,
            link: self.link,
        };
        (filter, pagination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn song_json_uses_wire_names() {
        let song = Song {
            id: Uuid::nil(),
            group_name: "Queen".into(),
            date_added: "2024-05-01T12:00:00Z".parse().unwrap(),
            ..Default::default()
        };
        let value = serde_json::to_value(&song).unwrap();
        assert_eq!(value["groupName"], "Queen");
        assert_eq!(value["date_added"], "2024-05-01T12:00:00Z");
        assert!(value.get("group_name").is_none());
    }

    #[test]
    fn missing_fields_decode_to_zero_values() {
        let song: Song = serde_json::from_str(r#"{"groupName": "Muse"}"#).unwrap();
        assert_eq!(song.id, Uuid::nil());
        assert_eq!(song.group_name, "Muse");
        assert!(song.link.is_empty());
        assert_eq!(song.date_added, DateTime::<Utc>::default());
    }

    #[test]
    fn pagination_falls_back_to_defaults() {
        assert_eq!(Pagination::parse(None, None, 100), Pagination::default());
        assert_eq!(
            Pagination::parse(Some("abc"), Some("0"), 100),
            Pagination { page: 1, limit: 10 }
        );
        assert_eq!(
            Pagination::parse(Some("-3"), Some("25"), 100),
            Pagination { page: 1, limit: 25 }
        );
    }

    #[test]
    fn pagination_clamps_limit_and_computes_offset() {
        let p = Pagination::parse(Some("3"), Some("5000"), 100);
        assert_eq!(p.limit, 100);
        assert_eq!(p.offset(), 200);
        assert_eq!(Pagination::parse(Some("2"), Some("10"), 100).offset(), 10);
    }

    #[test]
    fn filter_reports_only_non_empty_columns() {
        let filter = SongFilter {
            group_name: "queen".into(),
            link: "youtube".into(),
            ..Default::default()
        };
        assert!(!filter.is_empty());
        assert_eq!(filter.active(), vec![("group_name", "queen"), ("link", "youtube")]);
        assert!(SongFilter::default().is_empty());
    }
}
