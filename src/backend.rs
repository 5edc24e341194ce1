pub mod models;
pub mod rest;

use crate::event::Event;
use crate::BackendConfig;
use async_trait::async_trait;
use models::{DeleteReply, DeleteRequest, UpdateReply, UpdateRequest};
use rest::RestBackend;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Error while making a http request, including non-success status codes.
    #[error("failure requesting remote resource: {0}")]
    Request(#[from] reqwest::Error),

    /// Error while executing some middleware code.
    #[error("request middleware failed with: {0}")]
    RequestMiddleware(#[from] reqwest_middleware::Error),

    /// Error while building http headers.
    #[error("encountered invalid HTTP header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    /// Error while parsing a JSON response.
    #[error("failed to parse response as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The event addressed by an update or delete does not exist.
    #[error("no event titled {title:?} on {date}")]
    NotFound { date: String, title: String },
}

/// Represents the kinds of event backends.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// The REST service at `base_url`.
    Rest,
    /// Events kept in memory, starting from the configured ones.
    Memory,
}

/// Trait that needs to be implemented by a store of calendar events.
#[async_trait]
pub trait EventBackend: Send + Sync {
    /// Fetches all events of all days.
    async fn list_events(&self) -> Result<Vec<Event>, BackendError>;

    /// Creates an event. Returns the event as stored by the backend, if it told.
    async fn create_event(&self, event: &Event) -> Result<Option<Event>, BackendError>;

    /// Renames and reschedules the event titled `old_title` on `date`.
    async fn update_event(&self, request: &UpdateRequest) -> Result<UpdateReply, BackendError>;

    /// Deletes the event titled `title` on `date`.
    async fn delete_event(&self, request: &DeleteRequest) -> Result<DeleteReply, BackendError>;
}

/// Creates the backend selected in the configuration.
pub fn from_config(config: &BackendConfig) -> Result<Box<dyn EventBackend>, BackendError> {
    let backend: Box<dyn EventBackend> = match config.kind {
        BackendKind::Rest => Box::new(RestBackend::new(&config.base_url, config.timeout())?),
        BackendKind::Memory => Box::new(MemoryBackend::new(config.events.clone())),
    };

    Ok(backend)
}

/// An `EventBackend` that keeps events in memory. Changes are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    events: Mutex<Vec<Event>>,
}

impl MemoryBackend {
    /// Creates a new `MemoryBackend` from an iterator.
    pub fn new<I>(iter: I) -> MemoryBackend
    where
        I: IntoIterator,
        I::Item: Into<Event>,
    {
        MemoryBackend {
            events: Mutex::new(iter.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl EventBackend for MemoryBackend {
    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        Ok(self.events.lock().await.clone())
    }

    async fn create_event(&self, event: &Event) -> Result<Option<Event>, BackendError> {
        self.events.lock().await.push(event.clone());
        Ok(Some(event.clone()))
    }

    async fn update_event(&self, request: &UpdateRequest) -> Result<UpdateReply, BackendError> {
        let mut events = self.events.lock().await;

        let event = events
            .iter_mut()
            .find(|event| event.date == request.date && event.title == request.old_title)
            .ok_or_else(|| BackendError::NotFound {
                date: request.date.clone(),
                title: request.old_title.clone(),
            })?;

        *event = request.updated_event();

        Ok(UpdateReply {
            message: Some("Event updated successfully!".into()),
            event: Some(event.clone()),
        })
    }

    async fn delete_event(&self, request: &DeleteRequest) -> Result<DeleteReply, BackendError> {
        let mut events = self.events.lock().await;
        let len = events.len();

        events.retain(|event| !(event.date == request.date && event.title == request.title));

        if events.len() == len {
            return Err(BackendError::NotFound {
                date: request.date.clone(),
                title: request.title.clone(),
            });
        }

        Ok(DeleteReply {
            message: Some("Event deleted!".into()),
        })
    }
}

#[async_trait]
impl<T> EventBackend for Box<T>
where
    T: EventBackend + ?Sized,
{
    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        (**self).list_events().await
    }

    async fn create_event(&self, event: &Event) -> Result<Option<Event>, BackendError> {
        (**self).create_event(event).await
    }

    async fn update_event(&self, request: &UpdateRequest) -> Result<UpdateReply, BackendError> {
        (**self).update_event(request).await
    }

    async fn delete_event(&self, request: &DeleteRequest) -> Result<DeleteReply, BackendError> {
        (**self).delete_event(request).await
    }
}

#[async_trait]
impl<T> EventBackend for Arc<T>
where
    T: EventBackend + ?Sized,
{
    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        (**self).list_events().await
    }

    async fn create_event(&self, event: &Event) -> Result<Option<Event>, BackendError> {
        (**self).create_event(event).await
    }

    async fn update_event(&self, request: &UpdateRequest) -> Result<UpdateReply, BackendError> {
        (**self).update_event(request).await
    }

    async fn delete_event(&self, request: &DeleteRequest) -> Result<DeleteReply, BackendError> {
        (**self).delete_event(request).await
    }
}
