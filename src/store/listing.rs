use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use super::db::schema::{artists, shows, venues};
use super::db::{SqlId, SqlShowListing, LISTING_COLUMNS};
use super::search::tally;
use super::{
    Actions, Area, AreaListing, Artist, ArtistDetails, Id, ShowListing, Store, Summary,
    Timeline, Venue, VenueDetails,
};
use crate::error::Result;

impl Timeline {
    /// Shows before `now` are past, all others upcoming.
    pub fn split(shows: Vec<ShowListing>, now: NaiveDateTime) -> Timeline {
        let (past_shows, upcoming_shows): (Vec<_>, Vec<_>) =
            shows.into_iter().partition(|show| show.start_time < now);

        Timeline {
            past_shows_count: past_shows.len(),
            upcoming_shows_count: upcoming_shows.len(),
            past_shows,
            upcoming_shows,
        }
    }
}

/// Groups venues by area, areas and the venues within them ordered alphabetically.
pub fn group_by_area(venues: Vec<(Area, Summary<Venue>)>) -> Vec<AreaListing> {
    let mut areas: BTreeMap<Area, Vec<Summary<Venue>>> = BTreeMap::new();
    for (area, venue) in venues {
        areas.entry(area).or_insert_with(Vec::new).push(venue);
    }

    areas
        .into_iter()
        .map(|(area, mut venues)| {
            venues.sort_by(|a, b| a.name.cmp(&b.name));
            AreaListing { area, venues }
        })
        .collect()
}

fn summarize<T>(rows: Vec<(SqlId<T>, String)>, upcoming: &HashMap<Id<T>, usize>) -> Vec<Summary<T>> {
    rows.into_iter()
        .map(|(id, name)| {
            let id = Id::from(id);
            Summary {
                id,
                name,
                num_upcoming_shows: upcoming.get(&id).cloned().unwrap_or(0),
            }
        })
        .collect()
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl Store {
    pub fn venue_details(&self, id: Id<Venue>) -> Result<VenueDetails> {
        let venue = self.read(id)?;
        let shows = shows::table
            .inner_join(venues::table)
            .inner_join(artists::table)
            .filter(shows::venue_id.eq(SqlId::from(id)))
            .select(LISTING_COLUMNS)
            .order(shows::start_time.asc())
            .load::<SqlShowListing>(self.conn())?;

        Ok(VenueDetails {
            id,
            venue,
            timeline: Timeline::split(shows.into_iter().map(ShowListing::from).collect(), now()),
        })
    }

    pub fn artist_details(&self, id: Id<Artist>) -> Result<ArtistDetails> {
        let artist = self.read(id)?;
        let shows = shows::table
            .inner_join(venues::table)
            .inner_join(artists::table)
            .filter(shows::artist_id.eq(SqlId::from(id)))
            .select(LISTING_COLUMNS)
            .order(shows::start_time.asc())
            .load::<SqlShowListing>(self.conn())?;

        Ok(ArtistDetails {
            id,
            artist,
            timeline: Timeline::split(shows.into_iter().map(ShowListing::from).collect(), now()),
        })
    }

    fn upcoming_at_venues(&self) -> Result<HashMap<Id<Venue>, usize>> {
        Ok(tally(
            shows::table
                .filter(shows::start_time.gt(now()))
                .select(shows::venue_id)
                .load::<SqlId<Venue>>(self.conn())?,
        ))
    }

    fn upcoming_of_artists(&self) -> Result<HashMap<Id<Artist>, usize>> {
        Ok(tally(
            shows::table
                .filter(shows::start_time.gt(now()))
                .select(shows::artist_id)
                .load::<SqlId<Artist>>(self.conn())?,
        ))
    }

    pub fn areas(&self) -> Result<Vec<AreaListing>> {
        let upcoming = self.upcoming_at_venues()?;
        let rows = venues::table
            .select((venues::id, venues::name, venues::city, venues::state))
            .load::<(SqlId<Venue>, String, String, String)>(self.conn())?;

        Ok(group_by_area(
            rows.into_iter()
                .map(|(id, name, city, state)| {
                    let id = Id::from(id);
                    let venue = Summary {
                        id,
                        name,
                        num_upcoming_shows: upcoming.get(&id).cloned().unwrap_or(0),
                    };
                    (Area { city, state }, venue)
                })
                .collect(),
        ))
    }

    pub fn artist_index(&self) -> Result<Vec<Summary<Artist>>> {
        let upcoming = self.upcoming_of_artists()?;
        let rows = artists::table
            .select((artists::id, artists::name))
            .order(artists::name.asc())
            .load::<(SqlId<Artist>, String)>(self.conn())?;

        Ok(summarize(rows, &upcoming))
    }

    /// The `limit` most recently listed venues, newest first.
    pub fn recent_venues(&self, limit: i64) -> Result<Vec<Summary<Venue>>> {
        let upcoming = self.upcoming_at_venues()?;
        let rows = venues::table
            .select((venues::id, venues::name))
            .order(venues::created_at.desc())
            .limit(limit)
            .load::<(SqlId<Venue>, String)>(self.conn())?;

        Ok(summarize(rows, &upcoming))
    }

    /// The `limit` most recently listed artists, newest first.
    pub fn recent_artists(&self, limit: i64) -> Result<Vec<Summary<Artist>>> {
        let upcoming = self.upcoming_of_artists()?;
        let rows = artists::table
            .select((artists::id, artists::name))
            .order(artists::created_at.desc())
            .limit(limit)
            .load::<(SqlId<Artist>, String)>(self.conn())?;

        Ok(summarize(rows, &upcoming))
    }

    pub fn all_shows(&self) -> Result<Vec<ShowListing>> {
        Ok(shows::table
            .inner_join(venues::table)
            .inner_join(artists::table)
            .select(LISTING_COLUMNS)
            .order(shows::start_time.asc())
            .load::<SqlShowListing>(self.conn())?
            .into_iter()
            .map(ShowListing::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use uuid::Uuid;

    use super::*;
    use crate::error::Error;
    use crate::store::Show;
    use crate::test_support::{artist, env, venue};

    fn listing(start_time: NaiveDateTime) -> ShowListing {
        ShowListing {
            venue_id: Uuid::new_v4().into(),
            venue_name: "The Musical Hop".into(),
            venue_image_link: None,
            artist_id: Uuid::new_v4().into(),
            artist_name: "Guns N Petals".into(),
            artist_image_link: None,
            start_time,
        }
    }

    fn summary(name: &str) -> Summary<Venue> {
        Summary {
            id: Uuid::new_v4().into(),
            name: name.into(),
            num_upcoming_shows: 0,
        }
    }

    fn area(city: &str, state: &str) -> Area {
        Area {
            city: city.into(),
            state: state.into(),
        }
    }

    #[test]
    fn shows_at_now_count_as_upcoming() {
        let now = NaiveDate::from_ymd(2020, 7, 6).and_hms(20, 0, 0);
        let timeline = Timeline::split(
            vec![
                listing(now - Duration::days(1)),
                listing(now),
                listing(now + Duration::minutes(1)),
            ],
            now,
        );

        assert_eq!(timeline.past_shows_count, 1);
        assert_eq!(timeline.upcoming_shows_count, 2);
        assert_eq!(timeline.upcoming_shows[0].start_time, now);
    }

    #[test]
    fn venues_are_grouped_by_city_and_state() {
        let areas = group_by_area(vec![
            (area("San Francisco", "CA"), summary("The Musical Hop")),
            (area("New York", "NY"), summary("The Dueling Pianos Bar")),
            (area("San Francisco", "CA"), summary("Park Square Live Music & Coffee")),
        ]);

        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].area, area("New York", "NY"));
        assert_eq!(areas[1].area, area("San Francisco", "CA"));
        let names: Vec<&str> = areas[1].venues.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Park Square Live Music & Coffee", "The Musical Hop"]);
    }

    #[test]
    fn venue_details_split_shows_and_name_the_artist() {
        let env = env();
        let store = env.store();
        let hop = store.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        let mut guns = artist("Guns N Petals", "San Francisco", "CA");
        guns.image_link = Some("https://example.com/guns.jpg".into());
        let guns = store.create(guns).unwrap();
        let now = Utc::now().naive_utc();
        for start_time in &[now - Duration::days(60), now + Duration::days(60), now + Duration::days(90)] {
            store
                .schedule_show(Show {
                    start_time: *start_time,
                    venue_id: hop,
                    artist_id: guns,
                })
                .unwrap();
        }

        let details = store.venue_details(hop).unwrap();

        assert_eq!(details.venue.name, "The Musical Hop");
        assert_eq!(details.timeline.past_shows_count, 1);
        assert_eq!(details.timeline.upcoming_shows_count, 2);
        let show = &details.timeline.past_shows[0];
        assert_eq!(show.artist_id, guns);
        assert_eq!(show.artist_name, "Guns N Petals");
        assert_eq!(show.artist_image_link.as_deref(), Some("https://example.com/guns.jpg"));

        let artist_details = store.artist_details(guns).unwrap();
        assert_eq!(artist_details.timeline.upcoming_shows_count, 2);
        assert_eq!(artist_details.timeline.upcoming_shows[0].venue_name, "The Musical Hop");
    }

    #[test]
    fn details_of_unknown_venue_are_not_found() {
        let env = env();
        let store = env.store();

        assert!(matches!(
            store.venue_details(Uuid::new_v4().into()),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn areas_count_upcoming_shows_per_venue() {
        let env = env();
        let store = env.store();
        let hop = store.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        store
            .create(venue("Park Square Live Music & Coffee", "San Francisco", "CA"))
            .unwrap();
        store
            .create(venue("The Dueling Pianos Bar", "New York", "NY"))
            .unwrap();
        let sax = store.create(artist("The Wild Sax Band", "San Francisco", "CA")).unwrap();
        store
            .schedule_show(Show {
                start_time: Utc::now().naive_utc() + Duration::days(2),
                venue_id: hop,
                artist_id: sax,
            })
            .unwrap();

        let areas = store.areas().unwrap();

        assert_eq!(areas.len(), 2);
        let san_francisco = &areas[1];
        assert_eq!(san_francisco.venues.len(), 2);
        let musical_hop = san_francisco
            .venues
            .iter()
            .find(|venue| venue.id == hop)
            .unwrap();
        assert_eq!(musical_hop.num_upcoming_shows, 1);
    }

    #[test]
    fn recent_listings_are_newest_first() {
        let env = env();
        let store = env.store();
        store.create(artist("Guns N Petals", "San Francisco", "CA")).unwrap();
        store.create(artist("Matt Quevedo", "New York", "NY")).unwrap();
        store.create(artist("The Wild Sax Band", "San Francisco", "CA")).unwrap();

        let recent = store.recent_artists(2).unwrap();

        let names: Vec<&str> = recent.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["The Wild Sax Band", "Matt Quevedo"]);
        assert_eq!(store.artist_index().unwrap().len(), 3);
    }
}
