use chrono::NaiveDateTime;
use maud::{html, Markup, DOCTYPE};
use rocket::request::{FlashMessage, Form, LenientForm};
use rocket::response::{Flash, Redirect};
use rocket::Rocket;

use crate::error::{Error, Result};
use crate::forms::{self, Fields};
use crate::store::search::Search;
use crate::store::{
    Actions, Area, AreaListing, Artist, Genres, Id, SearchResults, SearchTerm, ShowListing, Store,
    Summary, Timeline, Venue,
};

const RECENT_LISTINGS: i64 = 10;

pub const GENRES: [&str; 19] = [
    "Alternative",
    "Blues",
    "Classical",
    "Country",
    "Electronic",
    "Folk",
    "Funk",
    "Hip-Hop",
    "Heavy Metal",
    "Instrumental",
    "Jazz",
    "Musical Theatre",
    "Pop",
    "Punk",
    "R&B",
    "Reggae",
    "Rock n Roll",
    "Soul",
    "Other",
];

pub fn mount(rocket: Rocket, prefix: &'static str) -> Rocket {
    rocket
        .mount(
            prefix,
            routes![
                index,
                venues,
                search_venues,
                venue_details,
                new_venue,
                create_venue,
                edit_venue,
                update_venue,
                delete_venue,
                artists,
                search_artists,
                artist_details,
                new_artist,
                create_artist,
                edit_artist,
                update_artist,
                delete_artist,
                shows,
                new_show,
                create_show,
                search_shows,
            ],
        )
        .register(catchers![not_found, unprocessable, internal_error])
}

#[derive(FromForm)]
struct SearchForm {
    search_term: Option<String>,
}

impl SearchForm {
    fn term(&self) -> &str {
        self.search_term.as_ref().map(String::as_str).unwrap_or("")
    }
}

// Home

#[get("/")]
fn index(store: Store, flash: Option<FlashMessage>) -> Result<Markup> {
    let venues = store.recent_venues(RECENT_LISTINGS)?;
    let artists = store.recent_artists(RECENT_LISTINGS)?;

    Ok(base_html(
        html! {
            div.recent {
                section {
                    h2 { "Recently listed venues" }
                    ( summary_list(&venues, "/venues") )
                }
                section {
                    h2 { "Recently listed artists" }
                    ( summary_list(&artists, "/artists") )
                }
            }
        },
        notice(flash),
        &Page::Home,
    ))
}

// Venues

#[get("/venues")]
fn venues(store: Store, flash: Option<FlashMessage>) -> Result<Markup> {
    let areas = store.areas()?;

    Ok(base_html(
        html! {
            ( search_box("/venues/search", "Find a venue") )
            @for area in &areas {
                ( render_area(area) )
            }
        },
        notice(flash),
        &Page::Venues,
    ))
}

#[post("/venues/search", data = "<form>")]
fn search_venues(store: Store, form: LenientForm<SearchForm>) -> Result<Markup> {
    let results: SearchResults<Summary<Venue>> = store.search(SearchTerm::new(form.term()))?;

    Ok(base_html(
        html! {
            ( search_box("/venues/search", "Find a venue") )
            ( results_heading(results.count, form.term()) )
            ( summary_list(&results.data, "/venues") )
        },
        None,
        &Page::Venues,
    ))
}

#[get("/venues/<id>")]
fn venue_details(store: Store, id: Id<Venue>, flash: Option<FlashMessage>) -> Result<Markup> {
    let details = store.venue_details(id)?;
    let venue = &details.venue;

    Ok(base_html(
        html! {
            div.venue {
                h1 { ( venue.name ) }
                ( genre_tags(&venue.genres) )
                ul.contact {
                    li { ( venue.address ) ", " ( venue.city ) ", " ( venue.state ) }
                    ( contact_items(&venue.phone, &venue.website, &venue.facebook_link) )
                }
                ( seeking(venue.seeking_talent, "talent", &venue.seeking_description) )
                ( image(&venue.image_link, &venue.name) )
                ( edit_controls(&format!("/venues/{}", id)) )
            }
            ( render_timeline(&details.timeline, Counterpart::Artist) )
        },
        notice(flash),
        &Page::Venues,
    ))
}

#[get("/venues/create")]
fn new_venue(flash: Option<FlashMessage>) -> Markup {
    base_html(
        venue_form("/venues/create", "List a new venue", None),
        notice(flash),
        &Page::NewVenue,
    )
}

#[post("/venues/create", data = "<form>")]
fn create_venue(store: Store, form: Form<Fields>) -> Flash<Redirect> {
    let venue = match forms::venue(&form) {
        Ok(venue) => venue,
        Err(errors) => return rejected(Redirect::to(uri!(new_venue)), &errors),
    };
    let name = venue.name.clone();

    match store.create(venue) {
        Ok(_) => Flash::success(
            Redirect::to(uri!(index)),
            format!("Venue {} was successfully listed!", name),
        ),
        Err(e) => failed(
            Redirect::to(uri!(index)),
            e,
            format!("An error occurred. Venue {} could not be listed.", name),
        ),
    }
}

#[get("/venues/<id>/edit")]
fn edit_venue(store: Store, id: Id<Venue>, flash: Option<FlashMessage>) -> Result<Markup> {
    let venue: Venue = store.read(id)?;

    Ok(base_html(
        venue_form(
            &format!("/venues/{}/edit", id),
            &format!("Edit {}", venue.name),
            Some(&venue),
        ),
        notice(flash),
        &Page::Venues,
    ))
}

#[post("/venues/<id>/edit", data = "<form>")]
fn update_venue(store: Store, id: Id<Venue>, form: Form<Fields>) -> Result<Flash<Redirect>> {
    let venue = match forms::venue(&form) {
        Ok(venue) => venue,
        Err(errors) => return Ok(rejected(Redirect::to(uri!(edit_venue: id)), &errors)),
    };
    let name = venue.name.clone();

    match store.update(id, venue) {
        Ok(_) => Ok(Flash::success(
            Redirect::to(uri!(venue_details: id)),
            format!("Venue {} was successfully edited!", name),
        )),
        Err(Error::NotFound) => Err(Error::NotFound),
        Err(e) => Ok(failed(
            Redirect::to(uri!(venue_details: id)),
            e,
            format!("An error occurred. Venue {} could not be edited.", name),
        )),
    }
}

#[delete("/venues/<id>")]
fn delete_venue(store: Store, id: Id<Venue>) -> Result<Flash<Redirect>> {
    match store.delete(id) {
        Ok(Venue { name, .. }) => Ok(Flash::success(
            Redirect::to(uri!(index)),
            format!("Venue {} was successfully deleted!", name),
        )),
        Err(Error::NotFound) => Err(Error::NotFound),
        Err(e) => Ok(failed(
            Redirect::to(uri!(venue_details: id)),
            e,
            "An error occurred. The venue could not be deleted.".to_string(),
        )),
    }
}

// Artists

#[get("/artists")]
fn artists(store: Store, flash: Option<FlashMessage>) -> Result<Markup> {
    let artists = store.artist_index()?;

    Ok(base_html(
        html! {
            ( search_box("/artists/search", "Find an artist") )
            ( summary_list(&artists, "/artists") )
        },
        notice(flash),
        &Page::Artists,
    ))
}

#[post("/artists/search", data = "<form>")]
fn search_artists(store: Store, form: LenientForm<SearchForm>) -> Result<Markup> {
    let results: SearchResults<Summary<Artist>> = store.search(SearchTerm::new(form.term()))?;

    Ok(base_html(
        html! {
            ( search_box("/artists/search", "Find an artist") )
            ( results_heading(results.count, form.term()) )
            ( summary_list(&results.data, "/artists") )
        },
        None,
        &Page::Artists,
    ))
}

#[get("/artists/<id>")]
fn artist_details(store: Store, id: Id<Artist>, flash: Option<FlashMessage>) -> Result<Markup> {
    let details = store.artist_details(id)?;
    let artist = &details.artist;

    Ok(base_html(
        html! {
            div.artist {
                h1 { ( artist.name ) }
                ( genre_tags(&artist.genres) )
                ul.contact {
                    li { ( artist.city ) ", " ( artist.state ) }
                    ( contact_items(&artist.phone, &artist.website, &artist.facebook_link) )
                    @if let Some(availability) = &artist.availability {
                        li.availability { "Available: " ( availability ) }
                    }
                }
                ( seeking(artist.seeking_venue, "performance venues", &artist.seeking_description) )
                ( image(&artist.image_link, &artist.name) )
                ( edit_controls(&format!("/artists/{}", id)) )
            }
            ( render_timeline(&details.timeline, Counterpart::Venue) )
        },
        notice(flash),
        &Page::Artists,
    ))
}

#[get("/artists/create")]
fn new_artist(flash: Option<FlashMessage>) -> Markup {
    base_html(
        artist_form("/artists/create", "List a new artist", None),
        notice(flash),
        &Page::NewArtist,
    )
}

#[post("/artists/create", data = "<form>")]
fn create_artist(store: Store, form: Form<Fields>) -> Flash<Redirect> {
    let artist = match forms::artist(&form) {
        Ok(artist) => artist,
        Err(errors) => return rejected(Redirect::to(uri!(new_artist)), &errors),
    };
    let name = artist.name.clone();

    match store.create(artist) {
        Ok(_) => Flash::success(
            Redirect::to(uri!(index)),
            format!("Artist {} was successfully listed!", name),
        ),
        Err(e) => failed(
            Redirect::to(uri!(index)),
            e,
            format!("An error occurred. Artist {} could not be listed.", name),
        ),
    }
}

#[get("/artists/<id>/edit")]
fn edit_artist(store: Store, id: Id<Artist>, flash: Option<FlashMessage>) -> Result<Markup> {
    let artist: Artist = store.read(id)?;

    Ok(base_html(
        artist_form(
            &format!("/artists/{}/edit", id),
            &format!("Edit {}", artist.name),
            Some(&artist),
        ),
        notice(flash),
        &Page::Artists,
    ))
}

#[post("/artists/<id>/edit", data = "<form>")]
fn update_artist(store: Store, id: Id<Artist>, form: Form<Fields>) -> Result<Flash<Redirect>> {
    let artist = match forms::artist(&form) {
        Ok(artist) => artist,
        Err(errors) => return Ok(rejected(Redirect::to(uri!(edit_artist: id)), &errors)),
    };
    let name = artist.name.clone();

    match store.update(id, artist) {
        Ok(_) => Ok(Flash::success(
            Redirect::to(uri!(artist_details: id)),
            format!("Artist {} was successfully edited!", name),
        )),
        Err(Error::NotFound) => Err(Error::NotFound),
        Err(e) => Ok(failed(
            Redirect::to(uri!(artist_details: id)),
            e,
            format!("An error occurred. Artist {} could not be edited.", name),
        )),
    }
}

#[delete("/artists/<id>")]
fn delete_artist(store: Store, id: Id<Artist>) -> Result<Flash<Redirect>> {
    match store.delete(id) {
        Ok(Artist { name, .. }) => Ok(Flash::success(
            Redirect::to(uri!(index)),
            format!("Artist {} was successfully deleted!", name),
        )),
        Err(Error::NotFound) => Err(Error::NotFound),
        Err(e) => Ok(failed(
            Redirect::to(uri!(artist_details: id)),
            e,
            "An error occurred. The artist could not be deleted.".to_string(),
        )),
    }
}

// Shows

#[get("/shows")]
fn shows(store: Store, flash: Option<FlashMessage>) -> Result<Markup> {
    let shows = store.all_shows()?;

    Ok(base_html(
        html! {
            ( search_box("/shows/search", "Find shows by date (YYYY-MM-DD) or City, State") )
            ( show_list(&shows) )
        },
        notice(flash),
        &Page::Shows,
    ))
}

#[post("/shows/search", data = "<form>")]
fn search_shows(store: Store, form: LenientForm<SearchForm>) -> Result<Markup> {
    let results = store.search_shows(SearchTerm::new(form.term()))?;

    Ok(base_html(
        html! {
            ( search_box("/shows/search", "Find shows by date (YYYY-MM-DD) or City, State") )
            ( results_heading(results.count, form.term()) )
            ( show_list(&results.data) )
        },
        None,
        &Page::Shows,
    ))
}

#[get("/shows/create")]
fn new_show(store: Store, flash: Option<FlashMessage>) -> Result<Markup> {
    let artists = store.artist_index()?;
    let venues: Vec<Summary<Venue>> = store
        .areas()?
        .into_iter()
        .flat_map(|area| area.venues)
        .collect();

    Ok(base_html(
        html! {
            form.show method="post" action="/shows/create" {
                h2 { "List a new show" }
                label {
                    "Artist"
                    select name="artist_id" {
                        @for artist in &artists {
                            option value=( artist.id ) { ( artist.name ) }
                        }
                    }
                }
                label {
                    "Venue"
                    select name="venue_id" {
                        @for venue in &venues {
                            option value=( venue.id ) { ( venue.name ) }
                        }
                    }
                }
                label {
                    "Start time"
                    input type="datetime-local" name="start_time" required?;
                }
                button type="submit" { "Create show" }
            }
        },
        notice(flash),
        &Page::NewShow,
    ))
}

#[post("/shows/create", data = "<form>")]
fn create_show(store: Store, form: Form<Fields>) -> Flash<Redirect> {
    let result = forms::show(&form)
        .map_err(Error::from)
        .and_then(|show| store.schedule_show(show));

    match result {
        Ok(_) => Flash::success(Redirect::to(uri!(index)), "Show was successfully listed!"),
        Err(Error::Invalid(errors)) => rejected(Redirect::to(uri!(new_show)), &errors),
        Err(Error::Unavailable) => {
            log::warn!("Rejected a show outside of the artist's availability.");
            Flash::error(Redirect::to(uri!(new_show)), Error::Unavailable.to_string())
        }
        Err(e) => failed(
            Redirect::to(uri!(index)),
            e,
            "An error occurred. Show could not be listed.".to_string(),
        ),
    }
}

// Errors

#[catch(404)]
fn not_found() -> Markup {
    error_page("404", "The page you were looking for does not exist.")
}

#[catch(422)]
fn unprocessable() -> Markup {
    error_page("422", "The submitted form could not be read.")
}

#[catch(500)]
fn internal_error() -> Markup {
    error_page("500", "Something went wrong on our side.")
}

fn error_page(code: &str, message: &str) -> Markup {
    base_html(
        html! {
            div.error {
                h1 { ( code ) }
                p { ( message ) }
                a href="/" { "Back to the start page" }
            }
        },
        None,
        &Page::Home,
    )
}

fn rejected(to: Redirect, errors: &crate::error::FieldErrors) -> Flash<Redirect> {
    log::warn!("Rejected form: {}", errors);
    Flash::error(to, errors.to_string())
}

fn failed(to: Redirect, error: Error, message: String) -> Flash<Redirect> {
    log::error!("{}: {}", message, error);
    Flash::error(to, message)
}

// Layout

struct Notice {
    kind: String,
    message: String,
}

fn notice(flash: Option<FlashMessage>) -> Option<Notice> {
    flash.map(|flash| Notice {
        kind: flash.name().to_string(),
        message: flash.msg().to_string(),
    })
}

#[derive(PartialEq)]
enum Page {
    Home,
    Venues,
    Artists,
    Shows,
    NewVenue,
    NewArtist,
    NewShow,
}

impl Page {
    fn url(&self) -> &'static str {
        use Page::*;

        match self {
            Home => "/",
            Venues => "/venues",
            Artists => "/artists",
            Shows => "/shows",
            NewVenue => "/venues/create",
            NewArtist => "/artists/create",
            NewShow => "/shows/create",
        }
    }

    fn title(&self) -> &'static str {
        use Page::*;

        match self {
            Home => "Fyyur",
            Venues => "Venues",
            Artists => "Artists",
            Shows => "Shows",
            NewVenue => "Post a venue",
            NewArtist => "Post an artist",
            NewShow => "Post a show",
        }
    }
}

fn base_html(main: Markup, notice: Option<Notice>, current_page: &Page) -> Markup {
    use Page::*;
    html! {
        ( DOCTYPE )
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { ( current_page.title() ) }
                link href="/static/main.css" rel="stylesheet";
            }
            body {
                header {
                    div.header {
                        a.title href="/" { h1 { "Fyyur" } }
                        nav {
                            ol {
                                @for page in vec![Venues, Artists, Shows, NewVenue, NewArtist, NewShow] {
                                    li { ( nav_entry(page, current_page) ) }
                                }
                            }
                        }
                    }
                }
                @if let Some(notice) = notice {
                    div class=( format!("flash {}", notice.kind) ) { ( notice.message ) }
                }
                main {
                    ( main )
                }
            }
        }
    }
}

fn nav_entry(page: Page, current: &Page) -> Markup {
    html! {
        a.current[current == &page] href=( page.url() ) { ( page.title() ) }
    }
}

fn search_box(action: &str, placeholder: &str) -> Markup {
    html! {
        form.search method="post" action=( action ) {
            input type="search" name="search_term" placeholder=( placeholder );
            button type="submit" { "Search" }
        }
    }
}

fn results_heading(count: usize, term: &str) -> Markup {
    html! {
        h3 { ( format!("Number of search results for \"{}\": {}", term, count) ) }
    }
}

fn summary_list<T>(items: &[Summary<T>], base: &str) -> Markup {
    html! {
        ul.items {
            @for item in items {
                li {
                    a href=( format!("{}/{}", base, item.id) ) { ( item.name ) }
                    @if item.num_upcoming_shows > 0 {
                        span.upcoming { ( format!(" ({} upcoming)", item.num_upcoming_shows) ) }
                    }
                }
            }
        }
    }
}

fn render_area(listing: &AreaListing) -> Markup {
    let AreaListing {
        area: Area { city, state },
        venues,
    } = listing;
    html! {
        div.area {
            h2 { ( city ) ", " ( state ) }
            ( summary_list(venues, "/venues") )
        }
    }
}

fn genre_tags(genres: &Genres) -> Markup {
    html! {
        ul.genres {
            @for genre in genres.iter() {
                li { ( genre ) }
            }
        }
    }
}

fn contact_items(
    phone: &Option<String>,
    website: &Option<String>,
    facebook_link: &Option<String>,
) -> Markup {
    html! {
        @if let Some(phone) = phone {
            li.phone { ( phone ) }
        }
        @if let Some(website) = website {
            li.website { a href=( website ) { ( website ) } }
        }
        @if let Some(facebook) = facebook_link {
            li.facebook { a href=( facebook ) { ( facebook ) } }
        }
    }
}

fn seeking(seeking: bool, what: &str, description: &Option<String>) -> Markup {
    html! {
        @if seeking {
            div.seeking {
                p { "Currently seeking " ( what ) }
                @if let Some(description) = description {
                    p { ( description ) }
                }
            }
        } @else {
            p.not-seeking { "Not currently seeking " ( what ) }
        }
    }
}

fn image(link: &Option<String>, alt: &str) -> Markup {
    html! {
        @if let Some(link) = link {
            img src=( link ) alt=( alt );
        }
    }
}

fn edit_controls(base: &str) -> Markup {
    html! {
        div.controls {
            a.edit href=( format!("{}/edit", base) ) { "Edit" }
            form.delete method="post" action=( base ) {
                input type="hidden" name="_method" value="DELETE";
                button type="submit" { "Delete" }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Counterpart {
    Venue,
    Artist,
}

fn render_timeline(timeline: &Timeline, counterpart: Counterpart) -> Markup {
    html! {
        section.upcoming {
            h2 { ( format!("{} Upcoming Shows", timeline.upcoming_shows_count) ) }
            ( timeline_shows(&timeline.upcoming_shows, counterpart) )
        }
        section.past {
            h2 { ( format!("{} Past Shows", timeline.past_shows_count) ) }
            ( timeline_shows(&timeline.past_shows, counterpart) )
        }
    }
}

fn timeline_shows(shows: &[ShowListing], counterpart: Counterpart) -> Markup {
    html! {
        ol.shows {
            @for show in shows {
                li.show {
                    @match counterpart {
                        Counterpart::Artist => {
                            ( image(&show.artist_image_link, &show.artist_name) )
                            a href=( format!("/artists/{}", show.artist_id) ) { ( show.artist_name ) }
                        }
                        Counterpart::Venue => {
                            ( image(&show.venue_image_link, &show.venue_name) )
                            a href=( format!("/venues/{}", show.venue_id) ) { ( show.venue_name ) }
                        }
                    }
                    span.time { ( format_datetime(&show.start_time) ) }
                }
            }
        }
    }
}

fn show_list(shows: &[ShowListing]) -> Markup {
    html! {
        ol.shows {
            @for show in shows {
                li.show {
                    ( image(&show.artist_image_link, &show.artist_name) )
                    span.time { ( format_datetime(&show.start_time) ) }
                    a href=( format!("/artists/{}", show.artist_id) ) { ( show.artist_name ) }
                    " playing at "
                    a href=( format!("/venues/{}", show.venue_id) ) { ( show.venue_name ) }
                }
            }
        }
    }
}

fn format_datetime(time: &NaiveDateTime) -> String {
    time.format("%a %b %-d, %Y %-I:%M%p").to_string()
}

// Forms

fn text_input(label: &str, name: &str, value: Option<&str>, required: bool) -> Markup {
    html! {
        label {
            ( label )
            input type="text" name=( name ) value=( value.unwrap_or("") ) required?[required];
        }
    }
}

fn genre_select(selected: Option<&Genres>) -> Markup {
    let is_selected = |genre: &str| selected.map_or(false, |genres| genres.iter().any(|g| g == genre));
    html! {
        label {
            "Genres"
            select name="genres" multiple? required? {
                @for genre in GENRES.iter() {
                    option value=( genre ) selected?[is_selected(*genre)] { ( genre ) }
                }
            }
        }
    }
}

fn venue_form(action: &str, heading: &str, venue: Option<&Venue>) -> Markup {
    let text = |value: fn(&Venue) -> Option<&str>| venue.and_then(value);
    html! {
        form.venue method="post" action=( action ) {
            h2 { ( heading ) }
            ( text_input("Name", "name", text(|v| Some(v.name.as_str())), true) )
            ( text_input("City", "city", text(|v| Some(v.city.as_str())), true) )
            ( text_input("State", "state", text(|v| Some(v.state.as_str())), true) )
            ( text_input("Address", "address", text(|v| Some(v.address.as_str())), true) )
            ( text_input("Phone", "phone", text(|v| v.phone.as_ref().map(String::as_str)), false) )
            ( text_input("Image link", "image_link", text(|v| v.image_link.as_ref().map(String::as_str)), false) )
            ( text_input("Facebook link", "facebook_link", text(|v| v.facebook_link.as_ref().map(String::as_str)), false) )
            ( text_input("Website", "website_link", text(|v| v.website.as_ref().map(String::as_str)), false) )
            ( genre_select(venue.map(|v| &v.genres)) )
            label {
                "Seeking talent"
                input type="checkbox" name="seeking_talent" value="y" checked?[venue.map_or(false, |v| v.seeking_talent)];
            }
            ( text_input("Seeking description", "seeking_description", text(|v| v.seeking_description.as_ref().map(String::as_str)), false) )
            button type="submit" { "Save venue" }
        }
    }
}

fn artist_form(action: &str, heading: &str, artist: Option<&Artist>) -> Markup {
    let text = |value: fn(&Artist) -> Option<&str>| artist.and_then(value);
    html! {
        form.artist method="post" action=( action ) {
            h2 { ( heading ) }
            ( text_input("Name", "name", text(|a| Some(a.name.as_str())), true) )
            ( text_input("City", "city", text(|a| Some(a.city.as_str())), true) )
            ( text_input("State", "state", text(|a| Some(a.state.as_str())), true) )
            ( text_input("Phone", "phone", text(|a| a.phone.as_ref().map(String::as_str)), false) )
            ( text_input("Image link", "image_link", text(|a| a.image_link.as_ref().map(String::as_str)), false) )
            ( text_input("Facebook link", "facebook_link", text(|a| a.facebook_link.as_ref().map(String::as_str)), false) )
            ( text_input("Website", "website_link", text(|a| a.website.as_ref().map(String::as_str)), false) )
            ( genre_select(artist.map(|a| &a.genres)) )
            label {
                "Seeking venue"
                input type="checkbox" name="seeking_venue" value="y" checked?[artist.map_or(false, |a| a.seeking_venue)];
            }
            ( text_input("Seeking description", "seeking_description", text(|a| a.seeking_description.as_ref().map(String::as_str)), false) )
            ( text_input("Availability (e.g. 09:00-17:00)", "availability", text(|a| a.availability.as_ref().map(String::as_str)), false) )
            button type="submit" { "Save artist" }
        }
    }
}
