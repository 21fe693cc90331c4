//! Decoding and validating submitted forms.

use std::collections::HashMap;
use std::convert::Infallible;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use rocket::request::{FormItems, FromForm};

use crate::error::FieldErrors;
use crate::store::{Artist, Genres, Id, Show, Venue};

static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].\S*$").expect("link pattern is valid"));
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9 +\-().]+$").expect("phone pattern is valid"));

const START_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Every submitted value, keyed by field name.
///
/// Keeps repeated fields such as `genres` intact, which a derived `FromForm` can't.
#[derive(Debug, Default, Clone)]
pub struct Fields(HashMap<String, Vec<String>>);

impl<'f> FromForm<'f> for Fields {
    type Error = Infallible;

    fn from_form(items: &mut FormItems<'f>, _strict: bool) -> Result<Self, Self::Error> {
        let mut fields = Fields::default();
        for item in items {
            let (key, value) = item.key_value_decoded();
            fields.insert(key, value);
        }
        Ok(fields)
    }
}

impl Fields {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_insert_with(Vec::new).push(value.into());
    }

    /// The first value of `key`, trimmed, if not blank.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(String::from)
    }

    /// Every non-blank value of `key`, in submission order.
    pub fn all(&self, key: &str) -> Vec<String> {
        self.0
            .get(key)
            .map(|values| {
                values
                    .iter()
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A checkbox: ticked when sent with anything but an explicit no.
    pub fn flag(&self, key: &str) -> bool {
        match self.text(key) {
            Some(value) => !["false", "off", "0"].contains(&value.to_lowercase().as_str()),
            None => false,
        }
    }
}

/// Collects field errors while reading values out of [`Fields`].
struct Check<'a> {
    fields: &'a Fields,
    errors: FieldErrors,
}

impl<'a> Check<'a> {
    fn new(fields: &'a Fields) -> Self {
        Check {
            fields,
            errors: FieldErrors::default(),
        }
    }

    fn required(&mut self, key: &'static str) -> String {
        match self.fields.text(key) {
            Some(value) => value,
            None => {
                self.errors.push(key, "This field is required.");
                String::new()
            }
        }
    }

    fn optional(&mut self, key: &'static str) -> Option<String> {
        self.fields.text(key)
    }

    fn link(&mut self, key: &'static str) -> Option<String> {
        let link = self.fields.text(key);
        if let Some(link) = &link {
            if !LINK.is_match(link) {
                self.errors.push(key, "Invalid URL.");
            }
        }
        link
    }

    fn phone(&mut self, key: &'static str) -> Option<String> {
        let phone = self.fields.text(key);
        if let Some(phone) = &phone {
            let digits = phone.chars().filter(char::is_ascii_digit).count();
            if !PHONE.is_match(phone) || digits < 7 || digits > 15 {
                self.errors.push(key, "Invalid phone number.");
            }
        }
        phone
    }

    fn genres(&mut self, key: &'static str) -> Genres {
        let genres = Genres(self.fields.all(key));
        if genres.is_empty() {
            self.errors.push(key, "Select at least one genre.");
        } else if genres.iter().any(|genre| genre.contains(Genres::DELIMITER)) {
            self.errors
                .push(key, format!("Genres can't contain '{}'.", Genres::DELIMITER));
        }
        genres
    }

    fn id<T>(&mut self, key: &'static str) -> Option<Id<T>> {
        let value = self.required(key);
        if value.is_empty() {
            return None;
        }
        match value.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                self.errors.push(key, "Not a valid id.");
                None
            }
        }
    }

    fn date_time(&mut self, key: &'static str) -> Option<NaiveDateTime> {
        let value = self.required(key);
        if value.is_empty() {
            return None;
        }
        let parsed = START_TIME_FORMATS
            .iter()
            .filter_map(|format| NaiveDateTime::parse_from_str(&value, format).ok())
            .next();
        if parsed.is_none() {
            self.errors.push(key, "Not a valid datetime, use YYYY-MM-DD HH:MM:SS.");
        }
        parsed
    }

    fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

pub fn venue(fields: &Fields) -> Result<Venue, FieldErrors> {
    let mut check = Check::new(fields);
    let venue = Venue {
        name: check.required("name"),
        city: check.required("city"),
        state: check.required("state"),
        address: check.required("address"),
        phone: check.phone("phone"),
        image_link: check.link("image_link"),
        facebook_link: check.link("facebook_link"),
        website: check.link("website_link"),
        seeking_talent: fields.flag("seeking_talent"),
        seeking_description: check.optional("seeking_description"),
        genres: check.genres("genres"),
    };
    check.finish(venue)
}

pub fn artist(fields: &Fields) -> Result<Artist, FieldErrors> {
    let mut check = Check::new(fields);
    let artist = Artist {
        name: check.required("name"),
        city: check.required("city"),
        state: check.required("state"),
        phone: check.phone("phone"),
        image_link: check.link("image_link"),
        facebook_link: check.link("facebook_link"),
        website: check.link("website_link"),
        seeking_venue: fields.flag("seeking_venue"),
        seeking_description: check.optional("seeking_description"),
        genres: check.genres("genres"),
        availability: check.optional("availability"),
    };
    check.finish(artist)
}

pub fn show(fields: &Fields) -> Result<Show, FieldErrors> {
    let mut check = Check::new(fields);
    let artist_id = check.id("artist_id");
    let venue_id = check.id("venue_id");
    let start_time = check.date_time("start_time");

    match (artist_id, venue_id, start_time) {
        (Some(artist_id), Some(venue_id), Some(start_time)) => check.finish(Show {
            start_time,
            venue_id,
            artist_id,
        }),
        _ => Err(check.errors),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        let mut fields = Fields::default();
        for (key, value) in pairs {
            fields.insert(*key, *value);
        }
        fields
    }

    fn musical_hop() -> Fields {
        fields(&[
            ("name", " The Musical Hop "),
            ("city", "San Francisco"),
            ("state", "CA"),
            ("address", "1015 Folsom Street"),
            ("phone", "123-123-1234"),
            ("genres", "Jazz"),
            ("genres", "Reggae"),
            ("genres", "Swing"),
            ("facebook_link", "https://www.facebook.com/TheMusicalHop"),
            ("website_link", ""),
            ("seeking_talent", "y"),
        ])
    }

    #[test]
    fn valid_venue_is_trimmed_and_keeps_every_genre() {
        let venue = venue(&musical_hop()).unwrap();

        assert_eq!(venue.name, "The Musical Hop");
        assert_eq!(venue.genres.to_storage(), "Jazz,Reggae,Swing");
        assert_eq!(venue.website, None);
        assert!(venue.seeking_talent);
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let mut submitted = musical_hop();
        submitted.0.remove("name");
        submitted.0.remove("genres");
        submitted.insert("image_link", "not a link");

        let errors = venue(&submitted).unwrap_err();

        assert!(errors.has("name"));
        assert!(errors.has("genres"));
        assert!(errors.has("image_link"));
        assert!(!errors.has("city"));
    }

    #[test]
    fn genres_with_the_storage_delimiter_are_rejected() {
        let mut submitted = musical_hop();
        submitted.insert("genres", "Jazz,Blues");

        let errors = venue(&submitted).unwrap_err();

        assert!(errors.has("genres"));
        assert_eq!(errors.to_string(), "genres - Genres can't contain ','.");
    }

    #[test]
    fn phone_numbers_need_enough_digits() {
        let mut submitted = musical_hop();
        submitted.0.insert("phone".into(), vec!["12-34".into()]);

        assert!(venue(&submitted).unwrap_err().has("phone"));
    }

    #[test]
    fn blank_availability_is_none() {
        let artist = artist(&fields(&[
            ("name", "Guns N Petals"),
            ("city", "San Francisco"),
            ("state", "CA"),
            ("genres", "Rock n Roll"),
            ("availability", "   "),
            ("seeking_venue", "false"),
        ]))
        .unwrap();

        assert_eq!(artist.availability, None);
        assert!(!artist.seeking_venue);
    }

    #[test]
    fn show_accepts_form_and_picker_datetimes() {
        let artist_id = Uuid::new_v4().to_string();
        let venue_id = Uuid::new_v4().to_string();
        let expected = NaiveDate::from_ymd(2035, 4, 1).and_hms(20, 0, 0);

        for start_time in &["2035-04-01 20:00:00", "2035-04-01T20:00", "2035-04-01 20:00"] {
            let show = show(&fields(&[
                ("artist_id", artist_id.as_str()),
                ("venue_id", venue_id.as_str()),
                ("start_time", *start_time),
            ]))
            .unwrap();
            assert_eq!(show.start_time, expected);
        }
    }

    #[test]
    fn show_with_bad_values_reports_each_field() {
        let errors = show(&fields(&[
            ("artist_id", "42"),
            ("start_time", "tomorrow"),
        ]))
        .unwrap_err();

        assert!(errors.has("artist_id"));
        assert!(errors.has("venue_id"));
        assert!(errors.has("start_time"));
    }
}
