use crate::backend::models::{DeleteRequest, UpdateRequest};
use crate::backend::{self, BackendError, EventBackend};
use crate::event::{validate_time, validate_title, Day, Event, ValidationError};
use crate::store::{Entry, EntryId, EventStore};
use crate::{BackendConfig, Error, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// User actions that involve the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    Add,
    Update,
    Delete,
}

impl Action {
    /// Returns the action as a &str.
    pub fn as_str(&self) -> &str {
        match self {
            Action::Load => "load",
            Action::Add => "add",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// The message shown to the user when the backend call of this action failed.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Action::Load => "Could not load events. Is the backend running?",
            Action::Add => "Failed to add event. Check the backend and network.",
            Action::Update => "Failed to update event.",
            Action::Delete => "Failed to delete event.",
        }
    }

    fn remote_error(self, source: BackendError) -> Error {
        log::error!("failed to {} events: {source}", self.as_str());
        Error::Remote {
            action: self,
            source,
        }
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A transient message for the user describing the outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success<T: Into<String>>(text: T) -> Notice {
        Notice {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error<T: Into<String>>(text: T) -> Notice {
        Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    pub fn info<T: Into<String>>(text: T) -> Notice {
        Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }
}

impl From<&Error> for Notice {
    fn from(err: &Error) -> Self {
        Notice::error(err.to_string())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.text.fmt(f)
    }
}

/// The `Planner` keeps the events of the selected day in sync with an event backend.
///
/// All actions hold the store for their whole duration, so they never interleave and at most one
/// backend request is in flight. The store is only changed after the backend accepted a change.
#[derive(Clone)]
pub struct Planner {
    backend: Arc<dyn EventBackend>,
    store: Arc<Mutex<EventStore>>,
}

impl Planner {
    /// Creates a new `Planner` on top of an event backend.
    pub fn new<T>(backend: T) -> Planner
    where
        T: EventBackend + 'static,
    {
        Planner {
            backend: Arc::new(backend),
            store: Default::default(),
        }
    }

    /// Creates a new `Planner` from configuration.
    pub fn from_config(config: &BackendConfig) -> Result<Planner> {
        Ok(Planner::new(backend::from_config(config)?))
    }

    /// The selected day, if any.
    pub async fn selected_day(&self) -> Option<Day> {
        self.store.lock().await.day()
    }

    /// The cached entries of the selected day.
    pub async fn entries(&self) -> Vec<Entry> {
        self.store.lock().await.entries().to_vec()
    }

    /// The cached events of the selected day.
    pub async fn events(&self) -> Vec<Event> {
        self.store.lock().await.events().cloned().collect()
    }

    /// Selects `day`, loading its events unless it is already selected.
    pub async fn select_date(&self, day: Day) -> Result<()> {
        let mut store = self.store.lock().await;
        self.ensure_selected(&mut store, day).await
    }

    /// Selects `day` and (re)loads its events from the backend. If that fails, `day` is selected
    /// without events.
    pub async fn load_events(&self, day: Day) -> Result<()> {
        let mut store = self.store.lock().await;
        self.load_into(&mut store, day).await
    }

    async fn load_into(&self, store: &mut EventStore, day: Day) -> Result<()> {
        log::debug!("loading events for {}", day.canonical());

        match self.backend.list_events().await {
            Ok(events) => {
                store.replace(day, events);
                Ok(())
            }
            Err(err) => {
                store.clear(day);
                Err(Action::Load.remote_error(err))
            }
        }
    }

    async fn ensure_selected(&self, store: &mut EventStore, day: Day) -> Result<()> {
        if store.day() == Some(day) {
            return Ok(());
        }

        self.load_into(store, day).await
    }

    /// Adds an event titled `title` at `time` to `day`.
    pub async fn add_event(&self, day: Day, title: &str, time: &str) -> Result<Notice> {
        let title = validate_title(title)?;
        let time = validate_time(time)?;

        let mut store = self.store.lock().await;
        self.ensure_selected(&mut store, day).await?;

        if store.find_duplicate(title, &time, None).is_some() {
            return Err(ValidationError::Duplicate.into());
        }

        let event = Event::new(&day, title, time);

        let created = self
            .backend
            .create_event(&event)
            .await
            .map_err(|err| Action::Add.remote_error(err))?;

        log::info!("added event {event} on {}", event.date);

        store.push(created.unwrap_or(event));

        Ok(Notice::success("Event added successfully!"))
    }

    /// Renames and reschedules the first event of `day` titled `old_title`.
    pub async fn update_event(
        &self,
        day: Day,
        old_title: &str,
        new_title: &str,
        new_time: &str,
    ) -> Result<Notice> {
        let new_title = validate_title(new_title)?;
        let new_time = validate_time(new_time)?;

        let mut store = self.store.lock().await;
        self.ensure_selected(&mut store, day).await?;

        let id = store
            .find_by_title(old_title)
            .map(|entry| entry.id)
            .ok_or(ValidationError::UnknownEvent)?;

        self.update_locked(&mut store, day, id, new_title, new_time).await
    }

    /// Renames and reschedules the event of entry `id` on `day`.
    ///
    /// The backend updates the first event with a given title, so only that entry can be updated
    /// while several entries of the day share its title.
    pub async fn update_entry(
        &self,
        day: Day,
        id: EntryId,
        new_title: &str,
        new_time: &str,
    ) -> Result<Notice> {
        let new_title = validate_title(new_title)?;
        let new_time = validate_time(new_time)?;

        let mut store = self.store.lock().await;
        self.ensure_selected(&mut store, day).await?;

        let title = &store
            .get(id)
            .ok_or(ValidationError::UnknownEvent)?
            .event
            .title;

        if store.find_by_title(title).map(|entry| entry.id) != Some(id) {
            return Err(ValidationError::AmbiguousTitle(title.clone()).into());
        }

        self.update_locked(&mut store, day, id, new_title, new_time).await
    }

    async fn update_locked(
        &self,
        store: &mut EventStore,
        day: Day,
        id: EntryId,
        new_title: &str,
        new_time: String,
    ) -> Result<Notice> {
        let old_title = store
            .get(id)
            .map(|entry| entry.event.title.clone())
            .ok_or(ValidationError::UnknownEvent)?;

        if store.find_duplicate(new_title, &new_time, Some(id)).is_some() {
            return Err(ValidationError::Duplicate.into());
        }

        let request = UpdateRequest {
            date: day.canonical(),
            old_title,
            new_title: new_title.to_owned(),
            new_time,
        };

        let reply = self
            .backend
            .update_event(&request)
            .await
            .map_err(|err| Action::Update.remote_error(err))?;

        let event = reply.event.unwrap_or_else(|| request.updated_event());

        log::info!(
            "updated event {:?} to {event} on {}",
            request.old_title,
            request.date
        );

        store.update(id, event);

        let text = reply
            .message
            .unwrap_or_else(|| "Event updated successfully!".into());

        Ok(Notice::success(text))
    }

    /// Deletes the events of `day` titled `title`.
    pub async fn delete_event(&self, day: Day, title: &str) -> Result<Notice> {
        let mut store = self.store.lock().await;
        self.ensure_selected(&mut store, day).await?;

        self.delete_locked(&mut store, day, title).await
    }

    /// Deletes the event of entry `id` on `day`, along with every other event sharing its title.
    pub async fn delete_entry(&self, day: Day, id: EntryId) -> Result<Notice> {
        let mut store = self.store.lock().await;
        self.ensure_selected(&mut store, day).await?;

        let title = store
            .get(id)
            .map(|entry| entry.event.title.clone())
            .ok_or(ValidationError::UnknownEvent)?;

        self.delete_locked(&mut store, day, &title).await
    }

    async fn delete_locked(
        &self,
        store: &mut EventStore,
        day: Day,
        title: &str,
    ) -> Result<Notice> {
        let request = DeleteRequest {
            date: day.canonical(),
            title: title.to_owned(),
        };

        let reply = self
            .backend
            .delete_event(&request)
            .await
            .map_err(|err| Action::Delete.remote_error(err))?;

        // The backend deletes by title, so every entry sharing it is gone.
        let removed = store.remove_by_title(title);

        log::info!("deleted {removed} event(s) {title:?} on {}", request.date);

        Ok(Notice::success(
            reply.message.unwrap_or_else(|| "Event deleted!".into()),
        ))
    }
}
