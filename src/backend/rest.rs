use super::models::{CreateReply, DeleteReply, DeleteRequest, UpdateReply, UpdateRequest};
use super::{BackendError, EventBackend};
use crate::event::Event;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use task_local_extensions::Extensions;

/// Logs every request made to the backend together with its outcome.
struct RequestLogger;

#[async_trait]
impl Middleware for RequestLogger {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        let started = Instant::now();

        let result = next.run(req, extensions).await;

        match &result {
            Ok(res) => log::debug!(
                "{method} {url} -> {} in {:?}",
                res.status(),
                started.elapsed()
            ),
            Err(err) => log::debug!("{method} {url} failed: {err}"),
        }

        result
    }
}

/// Client for the events REST service.
pub struct RestBackend {
    client: ClientWithMiddleware,
    events_url: String,
}

impl RestBackend {
    /// Creates a client for the service at `base_url`, e.g. `http://localhost:4000`. Every request
    /// fails after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<RestBackend, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("termine/{}", env!("CARGO_PKG_VERSION")))?,
        );

        let client = ClientBuilder::new(
            reqwest::Client::builder()
                .default_headers(headers)
                .timeout(timeout)
                .build()?,
        )
        .with(RequestLogger)
        .build();

        Ok(RestBackend {
            client,
            events_url: format!("{}/events", base_url.trim_end_matches('/')),
        })
    }

    /// The URL of the events resource.
    pub fn events_url(&self) -> &str {
        &self.events_url
    }
}

/// Parses a response body, falling back to the default when the backend sent something else.
/// Backends are not consistent about what they answer to mutations.
fn parse_or_default<T>(body: &str) -> T
where
    T: DeserializeOwned + Default,
{
    serde_json::from_str(body).unwrap_or_else(|err| {
        log::debug!("ignoring unexpected response body {body:?}: {err}");
        T::default()
    })
}

#[async_trait]
impl EventBackend for RestBackend {
    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        let body = self
            .client
            .get(&self.events_url)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        if !body.is_array() {
            log::warn!("expected a list of events, got {body}");
            return Ok(Vec::new());
        }

        let events: Vec<Event> = serde_json::from_value(body)?;

        log::debug!("fetched {} events from the backend", events.len());

        Ok(events)
    }

    async fn create_event(&self, event: &Event) -> Result<Option<Event>, BackendError> {
        let body = self
            .client
            .post(&self.events_url)
            .json(event)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let created = serde_json::from_str::<CreateReply>(&body)
            .map(CreateReply::into_event)
            .map_err(|err| log::debug!("create response carries no event: {err}"))
            .ok();

        Ok(created)
    }

    async fn update_event(&self, request: &UpdateRequest) -> Result<UpdateReply, BackendError> {
        let body = self
            .client
            .put(&self.events_url)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parse_or_default(&body))
    }

    async fn delete_event(&self, request: &DeleteRequest) -> Result<DeleteReply, BackendError> {
        let body = self
            .client
            .delete(&self.events_url)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parse_or_default(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_url_without_double_slash() {
        let timeout = Duration::from_secs(1);

        let backend = RestBackend::new("http://localhost:4000", timeout).unwrap();
        assert_eq!(backend.events_url(), "http://localhost:4000/events");

        let backend = RestBackend::new("http://localhost:4000/api/", timeout).unwrap();
        assert_eq!(backend.events_url(), "http://localhost:4000/api/events");
    }

    #[test]
    fn lenient_reply_parsing() {
        let reply: UpdateReply = parse_or_default("");
        assert_eq!(reply, UpdateReply::default());

        let reply: DeleteReply = parse_or_default("OK");
        assert_eq!(reply, DeleteReply::default());

        let reply: DeleteReply = parse_or_default(r#"{"message": "Event deleted"}"#);
        assert_eq!(reply.message.as_deref(), Some("Event deleted"));
    }
}
