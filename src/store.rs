use crate::event::{Day, Event};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-local identifier of an event held by the [`EventStore`].
///
/// The backend only knows events by title, which need not be unique. Entry ids let the UI point at
/// exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for EntryId {
    fn from(id: u64) -> Self {
        EntryId(id)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An event held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub event: Event,
}

/// Client-side cache of the events of the selected day, in backend order.
#[derive(Debug, Default)]
pub struct EventStore {
    day: Option<Day>,
    entries: Vec<Entry>,
    next_id: u64,
}

impl EventStore {
    pub fn new() -> EventStore {
        EventStore::default()
    }

    /// The day whose events are cached, if one was selected yet.
    pub fn day(&self) -> Option<Day> {
        self.day
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter().map(|entry| &entry.event)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selects `day` and caches those of `events` that belong to it. Entries of the previously
    /// selected day are dropped.
    pub fn replace<I>(&mut self, day: Day, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        self.day = Some(day);
        self.entries.clear();

        for event in events.into_iter().filter(|event| event.is_on(&day)) {
            self.push(event);
        }
    }

    /// Selects `day` without any events.
    pub fn clear(&mut self, day: Day) {
        self.replace(day, std::iter::empty());
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Finds the first entry titled exactly `title`.
    pub fn find_by_title(&self, title: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.event.title == title)
    }

    /// Finds an entry of the selected day occupying the slot of `title` at `time`, ignoring the
    /// entry `except`.
    pub fn find_duplicate(
        &self,
        title: &str,
        time: &str,
        except: Option<EntryId>,
    ) -> Option<&Entry> {
        let day = self.day?;

        self.entries.iter().find(|entry| {
            Some(entry.id) != except && entry.event.is_on(&day) && entry.event.same_slot(title, time)
        })
    }

    /// Appends an event and returns its entry id.
    pub fn push(&mut self, event: Event) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, event });
        id
    }

    /// Replaces the event of entry `id` in place and returns the previous one.
    pub fn update(&mut self, id: EntryId, event: Event) -> Option<Event> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| std::mem::replace(&mut entry.event, event))
    }

    /// Removes all entries titled exactly `title` and returns how many there were.
    pub fn remove_by_title(&mut self, title: &str) -> usize {
        let len = self.entries.len();
        self.entries.retain(|entry| entry.event.title != title);
        len - self.entries.len()
    }
}
