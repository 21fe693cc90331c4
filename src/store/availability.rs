//! Checks proposed show times against an artist's availability text.
//!
//! The text is free form; only `HH:MM-HH:MM` ranges (24 hour clock, zero padded)
//! are read from it, everything around them is ignored. Each range applies to the
//! calendar day of the proposed start.

use chrono::{NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::Artist;

static WINDOW: Lazy<Regex> = Lazy::new(|| {
    let time = "(0[0-9]|1[0-9]|2[0-3]):([0-5][0-9])";
    Regex::new(&format!("{}-{}", time, time)).expect("window pattern is valid")
});

/// A daily time range parsed from `HH:MM-HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub begin: NaiveTime,
    pub end: NaiveTime,
}

impl Window {
    /// Whether `start` lies strictly between the window's bounds on the same day.
    pub fn contains(&self, start: NaiveDateTime) -> bool {
        let date = start.date();
        date.and_time(self.begin) < start && start < date.and_time(self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// No availability was given, every start time is fine.
    Unrestricted,
    Windows(Vec<Window>),
}

impl Availability {
    pub fn of(artist: &Artist) -> Availability {
        Availability::parse(artist.availability.as_ref().map(String::as_str))
    }

    pub fn parse(text: Option<&str>) -> Availability {
        match text {
            Some(text) if !text.trim().is_empty() => Availability::Windows(windows(text)),
            _ => Availability::Unrestricted,
        }
    }

    /// A start is accepted if any window contains it. Text without a
    /// single window accepts nothing.
    pub fn accepts(&self, start: NaiveDateTime) -> bool {
        match self {
            Availability::Unrestricted => true,
            Availability::Windows(windows) => windows.iter().any(|window| window.contains(start)),
        }
    }
}

pub fn windows(text: &str) -> Vec<Window> {
    WINDOW
        .captures_iter(text)
        .filter_map(|captures| {
            let number = |i: usize| captures[i].parse::<u32>().ok();
            Some(Window {
                begin: NaiveTime::from_hms_opt(number(1)?, number(2)?, 0)?,
                end: NaiveTime::from_hms_opt(number(3)?, number(4)?, 0)?,
            })
        })
        .collect()
}
