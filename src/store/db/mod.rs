mod id;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use rocket::Rocket;

#[database("sqlite_database")]
pub struct Connection(SqliteConnection);

embed_migrations!();

pub fn initialize(rocket: Rocket) -> Result<Rocket, Rocket> {
    let conn = match Connection::get_one(&rocket) {
        Some(conn) => conn,
        None => {
            log::error!("No connection to the database could be established.");
            return Err(rocket);
        }
    };

    match embedded_migrations::run(&*conn) {
        Ok(()) => Ok(rocket),
        Err(e) => {
            log::error!("Failed to run database migrations: {:?}", e);
            Err(rocket)
        }
    }
}

pub mod schema {
    table! {
        venues {
            id -> Binary,
            name -> Text,
            city -> Text,
            state -> Text,
            address -> Text,
            phone -> Nullable<Text>,
            image_link -> Nullable<Text>,
            facebook_link -> Nullable<Text>,
            website -> Nullable<Text>,
            seeking_talent -> Bool,
            seeking_description -> Nullable<Text>,
            genres -> Text,
            created_at -> Timestamp,
        }
    }
    table! {
        artists {
            id -> Binary,
            name -> Text,
            city -> Text,
            state -> Text,
            phone -> Nullable<Text>,
            image_link -> Nullable<Text>,
            facebook_link -> Nullable<Text>,
            website -> Nullable<Text>,
            seeking_venue -> Bool,
            seeking_description -> Nullable<Text>,
            genres -> Text,
            availability -> Nullable<Text>,
            created_at -> Timestamp,
        }
    }
    table! {
        shows {
            id -> Binary,
            start_time -> Timestamp,
            venue_id -> Binary,
            artist_id -> Binary,
        }
    }

    joinable!(shows -> venues (venue_id));
    joinable!(shows -> artists (artist_id));

    allow_tables_to_appear_in_same_query!(venues, artists, shows);
}

use super::{Artist, Genres, Id, Show, ShowListing, Venue};
pub use id::SqlId;
use schema::*;

#[derive(Queryable, Insertable, Debug, Clone, AsChangeset)]
#[table_name = "venues"]
#[changeset_options(treat_none_as_null = "true")]
pub struct SqlVenue {
    pub id: SqlId<Venue>,
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
    pub genres: String,
    pub created_at: NaiveDateTime,
}

impl SqlVenue {
    pub fn new(id: SqlId<Venue>, created_at: NaiveDateTime, venue: Venue) -> SqlVenue {
        SqlVenue {
            id,
            name: venue.name,
            city: venue.city,
            state: venue.state,
            address: venue.address,
            phone: venue.phone,
            image_link: venue.image_link,
            facebook_link: venue.facebook_link,
            website: venue.website,
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description,
            genres: venue.genres.to_storage(),
            created_at,
        }
    }
}

impl From<SqlVenue> for (Id<Venue>, Venue) {
    fn from(venue: SqlVenue) -> Self {
        (
            venue.id.into(),
            Venue {
                name: venue.name,
                city: venue.city,
                state: venue.state,
                address: venue.address,
                phone: venue.phone,
                image_link: venue.image_link,
                facebook_link: venue.facebook_link,
                website: venue.website,
                seeking_talent: venue.seeking_talent,
                seeking_description: venue.seeking_description,
                genres: Genres::from_storage(&venue.genres),
            },
        )
    }
}

#[derive(Queryable, Insertable, Debug, Clone, AsChangeset)]
#[table_name = "artists"]
#[changeset_options(treat_none_as_null = "true")]
pub struct SqlArtist {
    pub id: SqlId<Artist>,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub genres: String,
    pub availability: Option<String>,
    pub created_at: NaiveDateTime,
}

impl SqlArtist {
    pub fn new(id: SqlId<Artist>, created_at: NaiveDateTime, artist: Artist) -> SqlArtist {
        SqlArtist {
            id,
            name: artist.name,
            city: artist.city,
            state: artist.state,
            phone: artist.phone,
            image_link: artist.image_link,
            facebook_link: artist.facebook_link,
            website: artist.website,
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description,
            genres: artist.genres.to_storage(),
            availability: artist.availability,
            created_at,
        }
    }
}

impl From<SqlArtist> for (Id<Artist>, Artist) {
    fn from(artist: SqlArtist) -> Self {
        (
            artist.id.into(),
            Artist {
                name: artist.name,
                city: artist.city,
                state: artist.state,
                phone: artist.phone,
                image_link: artist.image_link,
                facebook_link: artist.facebook_link,
                website: artist.website,
                seeking_venue: artist.seeking_venue,
                seeking_description: artist.seeking_description,
                genres: Genres::from_storage(&artist.genres),
                availability: artist.availability,
            },
        )
    }
}

#[derive(Queryable, Insertable, Clone, Debug)]
#[table_name = "shows"]
pub struct SqlShow {
    pub id: SqlId<Show>,
    pub start_time: NaiveDateTime,
    pub venue_id: SqlId<Venue>,
    pub artist_id: SqlId<Artist>,
}

impl From<Show> for SqlShow {
    fn from(show: Show) -> SqlShow {
        SqlShow {
            id: SqlId::generate(),
            start_time: show.start_time,
            venue_id: show.venue_id.into(),
            artist_id: show.artist_id.into(),
        }
    }
}

/// Columns selected for a [`ShowListing`], in the field order of [`SqlShowListing`].
pub type ListingColumns = (
    shows::venue_id,
    venues::name,
    venues::image_link,
    shows::artist_id,
    artists::name,
    artists::image_link,
    shows::start_time,
);

pub const LISTING_COLUMNS: ListingColumns = (
    shows::venue_id,
    venues::name,
    venues::image_link,
    shows::artist_id,
    artists::name,
    artists::image_link,
    shows::start_time,
);

#[derive(Queryable, Debug)]
pub struct SqlShowListing {
    pub venue_id: SqlId<Venue>,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub artist_id: SqlId<Artist>,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: NaiveDateTime,
}

impl From<SqlShowListing> for ShowListing {
    fn from(listing: SqlShowListing) -> Self {
        ShowListing {
            venue_id: listing.venue_id.into(),
            venue_name: listing.venue_name,
            venue_image_link: listing.venue_image_link,
            artist_id: listing.artist_id.into(),
            artist_name: listing.artist_name,
            artist_image_link: listing.artist_image_link,
            start_time: listing.start_time,
        }
    }
}
