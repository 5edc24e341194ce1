use crate::event::Event;
use serde::{Deserialize, Serialize};

/// Body of `PUT /events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub date: String,
    pub old_title: String,
    pub new_title: String,
    pub new_time: String,
}

impl UpdateRequest {
    /// The event the backend is expected to hold after the update.
    pub fn updated_event(&self) -> Event {
        Event {
            date: self.date.clone(),
            title: self.new_title.clone(),
            time: Some(self.new_time.clone()),
        }
    }
}

/// Body of `DELETE /events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub date: String,
    pub title: String,
}

/// Response of `POST /events`. Backends either wrap the created event or echo it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CreateReply {
    Wrapped { event: Event },
    Bare(Event),
}

impl CreateReply {
    pub fn into_event(self) -> Event {
        match self {
            CreateReply::Wrapped { event } | CreateReply::Bare(event) => event,
        }
    }
}

/// Response of `PUT /events`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub event: Option<Event>,
}

/// Response of `DELETE /events`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReply {
    #[serde(default)]
    pub message: Option<String>,
}
