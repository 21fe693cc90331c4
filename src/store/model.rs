use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub genres: Genres,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub genres: Genres,
    /// Free text containing `HH:MM-HH:MM` windows, see [`super::availability`].
    pub availability: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Show {
    pub start_time: NaiveDateTime,
    pub venue_id: Id<Venue>,
    pub artist_id: Id<Artist>,
}

/// Genre tags in the order they were selected.
///
/// Only the storage layer sees the comma joined form.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Genres(pub Vec<String>);

impl Genres {
    pub const DELIMITER: char = ',';

    pub fn from_storage(raw: &str) -> Genres {
        Genres(
            raw.split(Self::DELIMITER)
                .filter(|genre| !genre.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn to_storage(&self) -> String {
        self.0.join(&Self::DELIMITER.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A distinct (city, state) pair.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Area {
    pub city: String,
    pub state: String,
}

/// What search results and area listings show of a venue or artist.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Summary<T> {
    pub id: Id<T>,
    pub name: String,
    pub num_upcoming_shows: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AreaListing {
    #[serde(flatten)]
    pub area: Area,
    pub venues: Vec<Summary<Venue>>,
}

/// A show joined with the venue and artist it links.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShowListing {
    pub venue_id: Id<Venue>,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub artist_id: Id<Artist>,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: NaiveDateTime,
}

/// Shows split around the moment the listing was built.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    pub past_shows: Vec<ShowListing>,
    pub upcoming_shows: Vec<ShowListing>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Serialize, Debug, Clone)]
pub struct VenueDetails {
    pub id: Id<Venue>,
    #[serde(flatten)]
    pub venue: Venue,
    #[serde(flatten)]
    pub timeline: Timeline,
}

#[derive(Serialize, Debug, Clone)]
pub struct ArtistDetails {
    pub id: Id<Artist>,
    #[serde(flatten)]
    pub artist: Artist,
    #[serde(flatten)]
    pub timeline: Timeline,
}

/// Every search answers with this shape, whichever branch matched.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchResults<T> {
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> SearchResults<T> {
    pub fn empty() -> Self {
        SearchResults {
            count: 0,
            data: Vec::new(),
        }
    }
}

impl<T> From<Vec<T>> for SearchResults<T> {
    fn from(data: Vec<T>) -> Self {
        SearchResults {
            count: data.len(),
            data,
        }
    }
}
