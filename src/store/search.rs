//! Search over venues, artists and shows.
//!
//! Venues and artists are matched by two independent predicates whose results are
//! united: a case-insensitive substring of the name, and, when the term reads like
//! `City, State`, an exact (case-insensitive) city and state match.
//!
//! SQLite's own `lower` only folds ASCII, so stored text goes through `fold_case`, which
//! lowercases the same way the terms are lowercased here.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::Text;

use super::db::schema::{artists, shows, venues};
use super::db::{SqlId, SqlShowListing, LISTING_COLUMNS};
use super::{Area, Artist, Id, SearchResults, ShowListing, Store, Summary, Venue};
use crate::error::Result;

sql_function! {
    /// Unicode lowercase, registered on every connection the store hands out.
    fn fold_case(x: Text) -> Text;
}

const LIKE_ESCAPE: char = '\\';

/// A raw search term and the forms it can be read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTerm<'a>(&'a str);

impl<'a> SearchTerm<'a> {
    pub fn new(raw: &'a str) -> Self {
        SearchTerm(raw)
    }

    /// LIKE pattern matching the lowercased term anywhere, wildcards in the term escaped.
    pub fn name_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.0.len() + 2);
        pattern.push('%');
        for c in self.0.to_lowercase().chars() {
            if c == '%' || c == '_' || c == LIKE_ESCAPE {
                pattern.push(LIKE_ESCAPE);
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }

    /// `City, State`: exactly two comma separated tokens, trimmed.
    pub fn area(&self) -> Option<Area> {
        let tokens: Vec<&str> = self.0.split(',').collect();
        match tokens.as_slice() {
            [city, state] => Some(Area {
                city: city.trim().to_string(),
                state: state.trim().to_string(),
            }),
            _ => None,
        }
    }

    /// An ISO `YYYY-MM-DD` date.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.0.trim(), "%Y-%m-%d").ok()
    }
}

/// The half open range `[day 00:00, next day 00:00)`.
fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let begin = day.and_hms(0, 0, 0);
    (begin, begin + Duration::days(1))
}

/// Merges `(id, name)` rows from several predicates, first occurrence wins, ordered by name.
fn unite<T>(matches: Vec<Vec<(SqlId<T>, String)>>) -> Vec<(Id<T>, String)> {
    let mut seen = HashSet::new();
    let mut united: Vec<(Id<T>, String)> = matches
        .into_iter()
        .flatten()
        .map(|(id, name)| (Id::from(id), name))
        .filter(|(id, _)| seen.insert(*id))
        .collect();
    united.sort_by(|(_, a), (_, b)| a.cmp(b));
    united
}

pub trait Search<T> {
    fn search(&self, term: SearchTerm) -> Result<SearchResults<Summary<T>>>;
}

macro_rules! derive_search {
    ($t: ident, $table: ident, $show_fk: path) => {
        impl Search<$t> for Store {
            fn search(&self, term: SearchTerm) -> Result<SearchResults<Summary<$t>>> {
                let mut matches = vec![$table::table
                    .filter(fold_case($table::name).like(term.name_pattern()).escape(LIKE_ESCAPE))
                    .select(($table::id, $table::name))
                    .load::<(SqlId<$t>, String)>(self.conn())?];

                if let Some(Area { city, state }) = term.area() {
                    matches.push(
                        $table::table
                            .filter(fold_case($table::city).eq(city.to_lowercase()))
                            .filter(fold_case($table::state).eq(state.to_lowercase()))
                            .select(($table::id, $table::name))
                            .load::<(SqlId<$t>, String)>(self.conn())?,
                    );
                }

                let found = unite(matches);
                let ids: Vec<SqlId<$t>> = found.iter().map(|(id, _)| SqlId::from(*id)).collect();
                let upcoming = tally(
                    shows::table
                        .filter($show_fk.eq_any(ids))
                        .filter(shows::start_time.gt(Utc::now().naive_utc()))
                        .select($show_fk)
                        .load::<SqlId<$t>>(self.conn())?,
                );

                Ok(found
                    .into_iter()
                    .map(|(id, name)| Summary {
                        num_upcoming_shows: upcoming.get(&id).cloned().unwrap_or(0),
                        id,
                        name,
                    })
                    .collect::<Vec<_>>()
                    .into())
            }
        }
    };
}

derive_search!(Venue, venues, shows::venue_id);
derive_search!(Artist, artists, shows::artist_id);

/// Counts how many of the given show references point at each item.
pub(super) fn tally<T>(show_refs: Vec<SqlId<T>>) -> HashMap<Id<T>, usize> {
    let mut counts = HashMap::new();
    for id in show_refs {
        *counts.entry(Id::from(id)).or_insert(0) += 1;
    }
    counts
}

impl Store {
    /// Shows on the day the term names, or else at venues in the area it names.
    pub fn search_shows(&self, term: SearchTerm) -> Result<SearchResults<ShowListing>> {
        let rows: Vec<SqlShowListing> = if let Some(day) = term.date() {
            let (begin, end) = day_bounds(day);
            shows::table
                .inner_join(venues::table)
                .inner_join(artists::table)
                .filter(shows::start_time.ge(begin))
                .filter(shows::start_time.lt(end))
                .select(LISTING_COLUMNS)
                .order(shows::start_time.asc())
                .load(self.conn())?
        } else if let Some(Area { city, state }) = term.area() {
            shows::table
                .inner_join(venues::table)
                .inner_join(artists::table)
                .filter(fold_case(venues::city).eq(city.to_lowercase()))
                .filter(fold_case(venues::state).eq(state.to_lowercase()))
                .select(LISTING_COLUMNS)
                .order(shows::start_time.asc())
                .load(self.conn())?
        } else {
            return Ok(SearchResults::empty());
        };

        Ok(rows
            .into_iter()
            .map(ShowListing::from)
            .collect::<Vec<_>>()
            .into())
    }
}
