use std::collections::HashMap;

use crate::error::Result;
use crate::store::Id;

/// Create, read, update and delete for one kind of listed item.
pub trait Actions<T> {
    fn all(&self) -> Result<HashMap<Id<T>, T>>;
    fn create(&self, item: T) -> Result<Id<T>>;
    fn read(&self, id: Id<T>) -> Result<T>;
    /// Replaces the item, returning what was stored before.
    fn update(&self, id: Id<T>, new_item: T) -> Result<T>;
    /// Removes the item together with every show that references it.
    fn delete(&self, id: Id<T>) -> Result<T>;
}

macro_rules! derive_actions {
    ($t: ident, $s: ident, $show_fk: path) => {
        impl Actions<$t> for Store {
            fn all(&self) -> Result<HashMap<Id<$t>, $t>> {
                Ok(schema
                    .load::<$s>(self.conn())?
                    .into_iter()
                    .map(|x| x.into())
                    .collect())
            }

            fn create(&self, item: $t) -> Result<Id<$t>> {
                let sql_item = $s::new(SqlId::generate(), Utc::now().naive_utc(), item);

                self.transaction(|| {
                    diesel::insert_into(table)
                        .values(&sql_item)
                        .execute(self.conn())?;
                    Ok(())
                })?;

                log::info!("Listed {} '{}'.", stringify!($t), sql_item.name);
                Ok(sql_item.id.into())
            }

            fn read(&self, item_id: Id<$t>) -> Result<$t> {
                let (_, item): (Id<$t>, $t) = schema
                    .find(SqlId::from(item_id))
                    .first::<$s>(self.conn())?
                    .into();

                Ok(item)
            }

            fn update(&self, item_id: Id<$t>, new_item: $t) -> Result<$t> {
                let raw_id: SqlId<$t> = item_id.into();

                self.transaction(|| {
                    let previous_row = schema.find(&raw_id).first::<$s>(self.conn())?;
                    let row = $s::new(raw_id.clone(), previous_row.created_at, new_item);

                    diesel::update(schema.find(&raw_id))
                        .set(&row)
                        .execute(self.conn())?;

                    log::info!("Edited {} '{}'.", stringify!($t), row.name);
                    let (_, previous): (Id<$t>, $t) = previous_row.into();
                    Ok(previous)
                })
            }

            fn delete(&self, item_id: Id<$t>) -> Result<$t> {
                use crate::store::db::schema::shows;

                let raw_id: SqlId<$t> = item_id.into();

                self.transaction(|| {
                    let (_, previous): (Id<$t>, $t) =
                        schema.find(&raw_id).first::<$s>(self.conn())?.into();

                    let removed_shows = diesel::delete(shows::table.filter($show_fk.eq(&raw_id)))
                        .execute(self.conn())?;
                    diesel::delete(schema.find(&raw_id)).execute(self.conn())?;

                    log::info!(
                        "Deleted {} '{}' and {} of its shows.",
                        stringify!($t),
                        previous.name,
                        removed_shows
                    );
                    Ok(previous)
                })
            }
        }
    };
}

mod venue_actions {
    use std::collections::HashMap;

    use chrono::Utc;
    use diesel::prelude::*;

    use super::Actions;
    use crate::error::Result;
    use crate::store::db::schema::venues::{dsl::venues as schema, table};
    use crate::store::db::{SqlId, SqlVenue};
    use crate::store::{Id, Store, Venue};

    derive_actions!(Venue, SqlVenue, shows::venue_id);
}

mod artist_actions {
    use std::collections::HashMap;

    use chrono::Utc;
    use diesel::prelude::*;

    use super::Actions;
    use crate::error::Result;
    use crate::store::db::schema::artists::{dsl::artists as schema, table};
    use crate::store::db::{SqlArtist, SqlId};
    use crate::store::{Artist, Id, Store};

    derive_actions!(Artist, SqlArtist, shows::artist_id);
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::error::Error;
    use crate::store::{Artist, Genres, Show, Venue};
    use crate::test_support::{artist, env, venue};

    #[test]
    fn created_venue_can_be_read_back() {
        let env = env();
        let store = env.store();
        let mut hop = venue("The Musical Hop", "San Francisco", "CA");
        hop.genres = Genres(vec!["Jazz".into(), "Reggae".into()]);
        hop.phone = Some("123-123-1234".into());

        let id = store.create(hop.clone()).unwrap();

        assert_eq!(store.read(id).unwrap(), hop);
        let all: HashMap<Id<Venue>, Venue> = store.all().unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn reading_unknown_id_is_not_found() {
        let env = env();
        let store = env.store();
        let id: Id<Artist> = uuid::Uuid::new_v4().into();

        let result: Result<Artist> = store.read(id);
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn update_keeps_id_and_clears_optional_fields() {
        let env = env();
        let store = env.store();
        let mut sax = artist("The Wild Sax Band", "San Francisco", "CA");
        sax.availability = Some("18:00-23:00".into());
        let id = store.create(sax.clone()).unwrap();

        let mut edited = sax.clone();
        edited.name = "The Wilder Sax Band".into();
        edited.availability = None;
        let previous = store.update(id, edited.clone()).unwrap();

        assert_eq!(previous, sax);
        assert_eq!(store.read(id).unwrap(), edited);
    }

    #[test]
    fn deleting_a_venue_removes_its_shows() {
        let env = env();
        let store = env.store();
        let hop = store.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        let park = store
            .create(venue("Park Square Live Music & Coffee", "San Francisco", "CA"))
            .unwrap();
        let sax = store.create(artist("The Wild Sax Band", "San Francisco", "CA")).unwrap();
        let start_time = (Utc::now() + Duration::days(30)).naive_utc();
        for venue_id in &[hop, park] {
            store
                .schedule_show(Show {
                    start_time,
                    venue_id: *venue_id,
                    artist_id: sax,
                })
                .unwrap();
        }

        let deleted: Venue = store.delete(hop).unwrap();

        assert_eq!(deleted.name, "The Musical Hop");
        let remaining = store.all_shows().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|show| show.venue_id == park));
        let read: Result<Venue> = store.read(hop);
        assert!(matches!(read, Err(Error::NotFound)));
    }

    #[test]
    fn deleting_an_artist_removes_its_shows() {
        let env = env();
        let store = env.store();
        let hop = store.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        let sax = store.create(artist("The Wild Sax Band", "San Francisco", "CA")).unwrap();
        store
            .schedule_show(Show {
                start_time: (Utc::now() - Duration::days(30)).naive_utc(),
                venue_id: hop,
                artist_id: sax,
            })
            .unwrap();

        let _: Artist = store.delete(sax).unwrap();

        assert!(store.all_shows().unwrap().is_empty());
    }

    #[test]
    fn deleting_unknown_venue_is_not_found() {
        let env = env();
        let store = env.store();

        let result: Result<Venue> = store.delete(uuid::Uuid::new_v4().into());
        assert!(matches!(result, Err(Error::NotFound)));
    }
}
