#![feature(proc_macro_hygiene, decl_macro)]

mod api;
mod error;
mod forms;
mod store;
#[cfg(test)]
mod test_support;
mod website;

#[macro_use]
extern crate rocket;
#[macro_use]
extern crate rocket_contrib;
#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;

use std::path::PathBuf;

use rocket::fairing::AdHoc;
use rocket::response::NamedFile;
use rocket::{Rocket, State};

use store::Store;

fn main() {
    let error = build(rocket::ignite()).launch();
    log::error!("Could not launch: {}", error);
}

/// Attaches the store and assets and mounts every route.
pub fn build(rocket: Rocket) -> Rocket {
    let rocket = rocket
        .attach(Store::fairing())
        .attach(assets_fairing())
        .mount("/", routes![static_file]);
    let rocket = website::mount(rocket, "/");
    api::mount(rocket, "/api")
}

fn assets_fairing() -> AdHoc {
    AdHoc::on_attach("Assets Config", |rocket| {
        let assets_dir = PathBuf::from(rocket.config().get_str("assets_dir").unwrap_or("."));
        if assets_dir.exists() {
            Ok(rocket.manage(AssetsDir(assets_dir)))
        } else {
            log::error!(
                "The assets directory '{}' does not exist.",
                assets_dir.display()
            );

            Err(rocket)
        }
    })
}

#[derive(Debug)]
struct AssetsDir(PathBuf);

#[get("/static/<file..>")]
fn static_file(file: PathBuf, assets_dir: State<AssetsDir>) -> Option<NamedFile> {
    NamedFile::open(assets_dir.0.join(file)).ok()
}
