//! A fake events backend served by actix-web on an ephemeral port.

#![allow(dead_code)]

use actix_web::{web, App, HttpResponse, HttpServer};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use termine::event::Event;

/// How the fake backend answers `POST /events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStyle {
    /// `{"message": ..., "event": {...}}`
    Wrapped,
    /// The event itself.
    Echo,
    /// An empty body.
    Empty,
}

/// How the fake backend answers `GET /events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    /// The stored events.
    Events,
    /// An object instead of a list.
    Object,
    /// A list holding an element that is no event.
    Malformed,
}

pub struct BackendState {
    pub events: Mutex<Vec<Event>>,
    pub requests: Mutex<Vec<(String, Value)>>,
    pub create_style: Mutex<CreateStyle>,
    pub list_style: Mutex<ListStyle>,
    pub failing: AtomicBool,
}

impl BackendState {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Method and JSON body of every request received so far.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn set_create_style(&self, style: CreateStyle) {
        *self.create_style.lock().unwrap() = style;
    }

    pub fn set_list_style(&self, style: ListStyle) {
        *self.list_style.lock().unwrap() = style;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, method: &str, body: Value) -> Option<HttpResponse> {
        self.requests.lock().unwrap().push((method.to_owned(), body));

        if self.failing.load(Ordering::SeqCst) {
            return Some(HttpResponse::InternalServerError().json(json!({"error": "boom"})));
        }

        None
    }
}

async fn list(state: web::Data<BackendState>) -> HttpResponse {
    if let Some(res) = state.record("GET", Value::Null) {
        return res;
    }

    let style = *state.list_style.lock().unwrap();
    match style {
        ListStyle::Events => HttpResponse::Ok().json(state.events()),
        ListStyle::Object => HttpResponse::Ok().json(json!({})),
        ListStyle::Malformed => HttpResponse::Ok().json(json!([{"title": 1}])),
    }
}

async fn create(state: web::Data<BackendState>, body: web::Json<Value>) -> HttpResponse {
    if let Some(res) = state.record("POST", body.0.clone()) {
        return res;
    }

    let event: Event = match serde_json::from_value(body.into_inner()) {
        Ok(event) => event,
        Err(_) => return HttpResponse::BadRequest().finish(),
    };

    state.events.lock().unwrap().push(event.clone());

    let style = *state.create_style.lock().unwrap();
    match style {
        CreateStyle::Wrapped => HttpResponse::Created().json(json!({
            "message": "Event created",
            "event": event,
        })),
        CreateStyle::Echo => HttpResponse::Created().json(event),
        CreateStyle::Empty => HttpResponse::Created().finish(),
    }
}

async fn update(state: web::Data<BackendState>, body: web::Json<Value>) -> HttpResponse {
    if let Some(res) = state.record("PUT", body.0.clone()) {
        return res;
    }

    let field = |name: &str| body[name].as_str().unwrap_or_default().to_owned();
    let (date, old_title) = (field("date"), field("oldTitle"));

    let mut events = state.events.lock().unwrap();
    match events
        .iter_mut()
        .find(|event| event.date == date && event.title == old_title)
    {
        Some(event) => {
            event.title = field("newTitle");
            event.time = Some(field("newTime"));
            HttpResponse::Ok().json(json!({
                "message": "Event updated",
                "event": event,
            }))
        }
        None => HttpResponse::NotFound().json(json!({"message": "Event not found"})),
    }
}

async fn delete(state: web::Data<BackendState>, body: web::Json<Value>) -> HttpResponse {
    if let Some(res) = state.record("DELETE", body.0.clone()) {
        return res;
    }

    let date = body["date"].as_str().unwrap_or_default();
    let title = body["title"].as_str().unwrap_or_default();

    state
        .events
        .lock()
        .unwrap()
        .retain(|event| !(event.date == date && event.title == title));

    HttpResponse::Ok().json(json!({"message": "Event deleted"}))
}

/// Starts a fake backend holding `events` and returns its base URL.
pub fn spawn_backend(events: Vec<Event>) -> (String, web::Data<BackendState>) {
    let state = web::Data::new(BackendState {
        events: Mutex::new(events),
        requests: Mutex::default(),
        create_style: Mutex::new(CreateStyle::Wrapped),
        list_style: Mutex::new(ListStyle::Events),
        failing: AtomicBool::new(false),
    });

    let app_state = state.clone();
    let server = HttpServer::new(move || {
        App::new().app_data(app_state.clone()).service(
            web::resource("/events")
                .route(web::get().to(list))
                .route(web::post().to(create))
                .route(web::put().to(update))
                .route(web::delete().to(delete)),
        )
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .expect("failed to bind fake backend");

    let addr = server.addrs()[0];
    actix_rt::spawn(server.run());

    (format!("http://{addr}"), state)
}
