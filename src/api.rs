use rocket::{Rocket, Route};
use rocket_contrib::json::Json;

use crate::error::Result;
use crate::store::search::Search;
use crate::store::{
    Artist, ArtistDetails, AreaListing, Id, SearchResults, SearchTerm, ShowListing, Store,
    Summary, Venue, VenueDetails,
};

pub fn mount(rocket: Rocket, prefix: &'static str) -> Rocket {
    rocket
        .mount(&format!("{}/venues", prefix), venue::routes())
        .mount(&format!("{}/artists", prefix), artist::routes())
        .mount(&format!("{}/shows", prefix), show::routes())
}

fn term(term: &Option<String>) -> SearchTerm {
    SearchTerm::new(term.as_ref().map(String::as_str).unwrap_or(""))
}

macro_rules! derive_routes {
    ($mod: ident, $type: ident, $index: ty, $list: ident, $details: ident, $details_type: ty) => {
        pub mod $mod {
            use super::*;

            #[get("/")]
            fn all(store: Store) -> Result<Json<$index>> {
                store.$list().map(Json)
            }

            #[get("/search?<term>")]
            fn search(store: Store, term: Option<String>) -> Result<Json<SearchResults<Summary<$type>>>> {
                store.search(super::term(&term)).map(Json)
            }

            #[get("/<id>")]
            fn get(store: Store, id: Id<$type>) -> Result<Json<$details_type>> {
                store.$details(id).map(Json)
            }

            pub fn routes() -> Vec<Route> {
                routes![all, search, get]
            }
        }
    };
}

derive_routes!(venue, Venue, Vec<AreaListing>, areas, venue_details, VenueDetails);
derive_routes!(artist, Artist, Vec<Summary<Artist>>, artist_index, artist_details, ArtistDetails);

pub mod show {
    use super::*;

    #[get("/")]
    fn all(store: Store) -> Result<Json<Vec<ShowListing>>> {
        store.all_shows().map(Json)
    }

    #[get("/search?<term>")]
    fn search(store: Store, term: Option<String>) -> Result<Json<SearchResults<ShowListing>>> {
        store.search_shows(super::term(&term)).map(Json)
    }

    pub fn routes() -> Vec<Route> {
        routes![all, search]
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rocket::http::Status;
    use serde_json::Value;

    use crate::store::{Actions, Show};
    use crate::test_support::{artist, env, venue};

    #[test]
    fn venue_details_are_served_as_json() {
        let env = env();
        let store = env.store();
        let hop = store.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        let guns = store.create(artist("Guns N Petals", "San Francisco", "CA")).unwrap();
        store
            .schedule_show(Show {
                start_time: Utc::now().naive_utc() + Duration::days(3),
                venue_id: hop,
                artist_id: guns,
            })
            .unwrap();
        let (client, _dir) = env.client();

        let mut response = client.get(format!("/api/venues/{}", hop)).dispatch();

        assert_eq!(response.status(), Status::Ok);
        let body: Value = serde_json::from_str(&response.body_string().unwrap()).unwrap();
        assert_eq!(body["id"], hop.to_string());
        assert_eq!(body["name"], "The Musical Hop");
        assert_eq!(body["upcoming_shows_count"], 1);
        assert_eq!(body["past_shows_count"], 0);
        assert_eq!(body["upcoming_shows"][0]["artist_name"], "Guns N Petals");
    }

    #[test]
    fn search_without_matches_is_empty() {
        let env = env();
        env.store()
            .create(artist("Guns N Petals", "San Francisco", "CA"))
            .unwrap();
        let (client, _dir) = env.client();

        let mut response = client.get("/api/artists/search?term=zzz").dispatch();

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.body_string().unwrap(),
            r#"{"count":0,"data":[]}"#
        );
    }

    #[test]
    fn venues_are_listed_by_area() {
        let env = env();
        let store = env.store();
        store.create(venue("The Musical Hop", "San Francisco", "CA")).unwrap();
        store.create(venue("The Dueling Pianos Bar", "New York", "NY")).unwrap();
        let (client, _dir) = env.client();

        let mut response = client.get("/api/venues").dispatch();

        let body: Value = serde_json::from_str(&response.body_string().unwrap()).unwrap();
        assert_eq!(body[0]["city"], "New York");
        assert_eq!(body[1]["venues"][0]["name"], "The Musical Hop");
        assert_eq!(body[1]["venues"][0]["num_upcoming_shows"], 0);
    }

    #[test]
    fn unknown_artist_is_not_found() {
        let (client, _dir) = env().client();

        let response = client
            .get(format!("/api/artists/{}", uuid::Uuid::new_v4()))
            .dispatch();

        assert_eq!(response.status(), Status::NotFound);
    }
}
