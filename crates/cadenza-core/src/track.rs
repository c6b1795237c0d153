use serde::{Deserialize, Serialize};

/// A single catalog track.
///
/// Identity is the `id` string; the catalog guarantees ids are unique.
/// Records are immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,

    /// Display string naming all credited artists.
    pub artists: String,

    /// Popularity score in `0..=100`.
    pub popularity: u8,

    /// Release year, when known.
    pub release_year: Option<i32>,
}

impl Track {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artists: "Unknown".to_string(),
            popularity: 0,
            release_year: None,
        }
    }

    #[must_use]
    pub fn with_artists(mut self, artists: impl Into<String>) -> Self {
        self.artists = artists.into();
        self
    }

    #[must_use]
    pub fn with_popularity(mut self, popularity: u8) -> Self {
        self.popularity = popularity;
        self
    }

    #[must_use]
    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }
}
