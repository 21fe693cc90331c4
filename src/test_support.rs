use std::collections::HashMap;

use rocket::config::{Config, Environment, LoggingLevel, Value};
use rocket::local::Client;
use rocket::Rocket;
use tempfile::TempDir;

use crate::store::{Artist, Genres, Store, Venue};

/// A fully mounted instance backed by its own database file.
pub struct Env {
    dir: TempDir,
    rocket: Rocket,
}

pub fn env() -> Env {
    let dir = tempfile::tempdir().expect("create temporary directory");
    let url = dir.path().join("listings.sqlite");

    let mut database = HashMap::new();
    database.insert("url", Value::from(url.to_string_lossy().into_owned()));
    database.insert("pool_size", Value::Integer(2));
    let mut databases = HashMap::new();
    databases.insert("sqlite_database", database);

    let config = Config::build(Environment::Development)
        .workers(2)
        .log_level(LoggingLevel::Off)
        .extra("databases", databases)
        .finalize()
        .expect("valid test configuration");

    Env {
        dir,
        rocket: crate::build(rocket::custom(config)),
    }
}

impl Env {
    pub fn store(&self) -> Store {
        Store::from_rocket(&self.rocket).expect("database pool is attached")
    }

    /// The directory has to outlive the client, or the database goes with it.
    pub fn client(self) -> (Client, TempDir) {
        let client = Client::new(self.rocket).expect("valid rocket instance");
        (client, self.dir)
    }
}

pub fn venue(name: &str, city: &str, state: &str) -> Venue {
    Venue {
        name: name.into(),
        city: city.into(),
        state: state.into(),
        address: "1015 Folsom Street".into(),
        phone: None,
        image_link: None,
        facebook_link: None,
        website: None,
        seeking_talent: false,
        seeking_description: None,
        genres: Genres(vec!["Jazz".into()]),
    }
}

pub fn artist(name: &str, city: &str, state: &str) -> Artist {
    Artist {
        name: name.into(),
        city: city.into(),
        state: state.into(),
        phone: None,
        image_link: None,
        facebook_link: None,
        website: None,
        seeking_venue: false,
        seeking_description: None,
        genres: Genres(vec!["Rock n Roll".into()]),
        availability: None,
    }
}
