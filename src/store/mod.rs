mod db;
#[macro_use]
pub mod action;
pub mod availability;
pub mod listing;
pub mod model;
pub mod search;

use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use diesel::prelude::*;
use rocket::http::uri::{Formatter, FromUriParam, Path, UriDisplay};
use rocket::http::{RawStr, Status};
use rocket::request::{FromFormValue, FromParam, FromRequest, Outcome, Request};
use rocket::{fairing, fairing::Fairing, Rocket};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::{Error, FieldErrors, Result};

pub use action::Actions;
pub use availability::Availability;
pub use model::*;
pub use search::SearchTerm;

/// Identifies an item of type `Item`.
///
/// The type parameter keeps a venue id from being used where an artist id is expected.
pub struct Id<Item> {
    pub id: Uuid,
    phantom: PhantomData<Item>,
}

impl<Item> From<Uuid> for Id<Item> {
    fn from(id: Uuid) -> Self {
        Id {
            id,
            phantom: PhantomData,
        }
    }
}

impl<Item> std::str::FromStr for Id<Item> {
    type Err = uuid::parser::ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Id::from)
    }
}

impl<Item> Clone for Id<Item> {
    fn clone(&self) -> Self {
        self.id.into()
    }
}

impl<Item> Copy for Id<Item> {}

impl<Item> PartialEq for Id<Item> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<Item> Eq for Id<Item> {}

impl<Item> Hash for Id<Item> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<Item> Debug for Id<Item> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Id({})", self.id)
    }
}

impl<Item> Display for Id<Item> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.id.to_hyphenated(), f)
    }
}

impl<Item> Serialize for Id<Item> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}

impl<'a, Item> FromParam<'a> for Id<Item> {
    type Error = &'a RawStr;

    fn from_param(param: &'a RawStr) -> std::result::Result<Self, Self::Error> {
        param.as_str().parse().map_err(|_| param)
    }
}

impl<'v, Item> FromFormValue<'v> for Id<Item> {
    type Error = &'v RawStr;

    fn from_form_value(value: &'v RawStr) -> std::result::Result<Self, Self::Error> {
        value.as_str().parse().map_err(|_| value)
    }
}

impl<Item> UriDisplay<Path> for Id<Item> {
    fn fmt(&self, f: &mut Formatter<Path>) -> fmt::Result {
        f.write_value(&self.to_string())
    }
}

impl<Item> FromUriParam<Path, Id<Item>> for Id<Item> {
    type Target = Id<Item>;

    fn from_uri_param(id: Id<Item>) -> Id<Item> {
        id
    }
}

/// A pooled database connection, the context of every store operation.
pub struct Store(db::Connection);

impl Store {
    pub fn fairing() -> StoreFairing {
        StoreFairing
    }

    /// Takes a connection from the pool of an ignited instance, outside of any request.
    pub fn from_rocket(rocket: &Rocket) -> Option<Store> {
        db::Connection::get_one(rocket).and_then(Store::connect)
    }

    /// Wraps a pooled connection once the SQL functions the queries rely on are registered.
    fn connect(conn: db::Connection) -> Option<Store> {
        match search::fold_case::register_impl(&*conn, |text: String| text.to_lowercase()) {
            Ok(()) => Some(Store(conn)),
            Err(e) => {
                log::error!("Could not register SQL functions on the connection: {}", e);
                None
            }
        }
    }

    fn conn(&self) -> &SqliteConnection {
        &*self.0
    }

    /// Runs `action` in a transaction, rolling back when it fails.
    fn transaction<T, F>(&self, action: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.conn().transaction(action).map_err(|e| {
            match &e {
                Error::Database(cause) => log::error!("Rolled back transaction: {}", cause),
                other => log::warn!("Rolled back transaction: {}", other),
            }
            e
        })
    }

    /// Persists `show` after checking that both ends exist and the artist is available.
    pub fn schedule_show(&self, show: Show) -> Result<Id<Show>> {
        use db::schema::{artists, shows, venues};
        use db::{SqlArtist, SqlShow};

        self.transaction(|| {
            let artist: Option<SqlArtist> = artists::table
                .find(db::SqlId::from(show.artist_id))
                .first(self.conn())
                .optional()?;
            let (_, artist): (Id<Artist>, Artist) = match artist {
                Some(artist) => artist.into(),
                None => return Err(FieldErrors::single("artist_id", "No such artist.").into()),
            };

            if !Availability::of(&artist).accepts(show.start_time) {
                return Err(Error::Unavailable);
            }

            let venue_count: i64 = venues::table
                .find(db::SqlId::from(show.venue_id))
                .count()
                .get_result(self.conn())?;
            if venue_count == 0 {
                return Err(FieldErrors::single("venue_id", "No such venue.").into());
            }

            let sql_show: SqlShow = show.into();
            diesel::insert_into(shows::table)
                .values(&sql_show)
                .execute(self.conn())?;

            Ok(sql_show.id.into())
        })
    }
}

pub struct StoreFairing;

impl Fairing for StoreFairing {
    fn info(&self) -> fairing::Info {
        fairing::Info {
            name: "Listings Store Fairing",
            kind: fairing::Kind::Attach,
        }
    }

    fn on_attach(&self, rocket: Rocket) -> std::result::Result<Rocket, Rocket> {
        db::Connection::fairing()
            .on_attach(rocket)
            .and_then(db::initialize)
    }
}

impl<'a, 'r> FromRequest<'a, 'r> for Store {
    type Error = ();

    fn from_request(request: &'a Request<'r>) -> Outcome<Self, Self::Error> {
        match db::Connection::from_request(request) {
            rocket::Outcome::Success(conn) => match Store::connect(conn) {
                Some(store) => rocket::Outcome::Success(store),
                None => rocket::Outcome::Failure((Status::InternalServerError, ())),
            },
            rocket::Outcome::Failure(failure) => rocket::Outcome::Failure(failure),
            rocket::Outcome::Forward(forward) => rocket::Outcome::Forward(forward),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::test_support::{artist, env, venue};

    #[test]
    fn ids_round_trip_through_their_text_form() {
        let id: Id<Venue> = Uuid::new_v4().into();

        assert_eq!(id.to_string().parse::<Id<Venue>>().ok(), Some(id));
        assert!("not-a-uuid".parse::<Id<Venue>>().is_err());
    }

    #[test]
    fn show_outside_availability_is_not_persisted() {
        let env = env();
        let store = env.store();
        let venue_id = store.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        let mut guns = artist("Guns N Petals", "San Francisco", "CA");
        guns.availability = Some("Weekdays 09:00-17:00".into());
        let artist_id = store.create(guns).unwrap();

        let evening = NaiveDate::from_ymd(2035, 4, 1).and_hms(20, 0, 0);
        let result = store.schedule_show(Show {
            start_time: evening,
            venue_id,
            artist_id,
        });

        assert!(matches!(result, Err(Error::Unavailable)));
        assert!(store.all_shows().unwrap().is_empty());

        let morning = NaiveDate::from_ymd(2035, 4, 1).and_hms(10, 0, 0);
        store
            .schedule_show(Show {
                start_time: morning,
                venue_id,
                artist_id,
            })
            .unwrap();
        assert_eq!(store.all_shows().unwrap().len(), 1);
    }

    #[test]
    fn show_needs_existing_venue_and_artist() {
        let env = env();
        let store = env.store();
        let venue_id = store.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        let artist_id = store.create(artist("Matt Quevedo", "New York", "NY")).unwrap();
        let start_time = NaiveDate::from_ymd(2035, 4, 1).and_hms(20, 0, 0);

        let unknown_artist = store.schedule_show(Show {
            start_time,
            venue_id,
            artist_id: Uuid::new_v4().into(),
        });
        let unknown_venue = store.schedule_show(Show {
            start_time,
            venue_id: Uuid::new_v4().into(),
            artist_id,
        });

        assert!(matches!(unknown_artist, Err(Error::Invalid(_))));
        assert!(matches!(unknown_venue, Err(Error::Invalid(_))));
        assert!(store.all_shows().unwrap().is_empty());
    }
}
