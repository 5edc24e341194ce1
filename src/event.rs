use chrono::{Local, NaiveDate, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Format of the canonical date string that ties an event to a calendar day, e.g.
/// `Mon Jan 01 2024`.
pub const CANONICAL_DATE_FORMAT: &str = "%a %b %d %Y";

/// Format of an event's time of day.
pub const TIME_FORMAT: &str = "%H:%M";

/// A calendar day.
///
/// Displays and parses as `YYYY-MM-DD`, which is what URLs and the command line use. Events refer
/// to a day by its [canonical](Day::canonical) string instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(NaiveDate);

impl Day {
    pub fn new(date: NaiveDate) -> Day {
        Day(date)
    }

    /// The current day in the local time zone.
    pub fn today() -> Day {
        Day(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The canonical date string used to match events to this day.
    pub fn canonical(&self) -> String {
        self.0.format(CANONICAL_DATE_FORMAT).to_string()
    }

    /// The following day, if representable.
    pub fn succ(&self) -> Option<Day> {
        self.0.succ_opt().map(Day)
    }

    /// The preceding day, if representable.
    pub fn pred(&self) -> Option<Day> {
        self.0.pred_opt().map(Day)
    }
}

impl From<NaiveDate> for Day {
    fn from(date: NaiveDate) -> Self {
        Day(date)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.format("%Y-%m-%d").fmt(f)
    }
}

impl FromStr for Day {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Day)
    }
}

/// Represents a single calendar event as exchanged with the backend.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Canonical date string of the day the event belongs to.
    pub date: String,
    /// The event title.
    pub title: String,
    /// Time of day as `HH:MM`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl Event {
    /// Creates an event on `day`.
    pub fn new<T, U>(day: &Day, title: T, time: U) -> Event
    where
        T: Into<String>,
        U: Into<String>,
    {
        Event {
            date: day.canonical(),
            title: title.into(),
            time: Some(time.into()),
        }
    }

    /// Returns `true` if the event belongs to `day`.
    pub fn is_on(&self, day: &Day) -> bool {
        self.date == day.canonical()
    }

    /// Returns `true` if the event occupies the same slot as `title` at `time`. Titles compare
    /// trimmed and case-insensitively.
    pub fn same_slot(&self, title: &str, time: &str) -> bool {
        self.time.as_deref() == Some(time)
            && self.title.trim().to_lowercase() == title.trim().to_lowercase()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.time {
            Some(time) => write!(f, "{} at {}", self.title, time),
            None => self.title.fmt(f),
        }
    }
}

/// Reasons for rejecting user input before anything is sent to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Event title cannot be empty!")]
    BlankTitle,
    #[error("Please select a valid time!")]
    BlankTime,
    #[error("\"{0}\" is not a valid time, expected HH:MM!")]
    InvalidTime(String),
    #[error("Event already exists for this time!")]
    Duplicate,
    #[error("Event no longer exists!")]
    UnknownEvent,
    #[error("Another event titled \"{0}\" comes first on this day, edit that one instead!")]
    AmbiguousTitle(String),
}

/// Trims a title and makes sure something is left.
pub fn validate_title(title: &str) -> Result<&str, ValidationError> {
    match title.trim() {
        "" => Err(ValidationError::BlankTitle),
        title => Ok(title),
    }
}

/// Checks that `time` is a time of day and normalizes it to `HH:MM`.
pub fn validate_time(time: &str) -> Result<String, ValidationError> {
    let time = time.trim();

    if time.is_empty() {
        return Err(ValidationError::BlankTime);
    }

    NaiveTime::parse_from_str(time, TIME_FORMAT)
        .map(|time| time.format(TIME_FORMAT).to_string())
        .map_err(|_| ValidationError::InvalidTime(time.to_owned()))
}

/// Type alias for events grouped by canonical date string.
pub type EventsByDate = IndexMap<String, Vec<Event>>;

/// Groups events by the given days. Every day gets an entry, in the order of `days`, and events
/// keep their relative order. Events on other days are dropped.
pub fn group_by_day<I>(events: I, days: &[Day]) -> EventsByDate
where
    I: IntoIterator<Item = Event>,
{
    let mut events_by_date: EventsByDate = days
        .iter()
        .map(|day| (day.canonical(), Vec::new()))
        .collect();

    for event in events {
        if let Some(events) = events_by_date.get_mut(&event.date) {
            events.push(event);
        }
    }

    events_by_date
}
