//! The browser UI: a day page listing the events of the selected day with forms to add, edit and
//! delete them.

pub mod templating;

use crate::event::Day;
use crate::planner::{Notice, Planner};
use crate::store::EntryId;
use actix_utils::future::{ready, Ready};
use actix_web::{
    dev::{self, ServiceResponse},
    error, get,
    http::header::{self, ContentType},
    http::StatusCode,
    middleware::{ErrorHandlerResponse, ErrorHandlers},
    post, route,
    web::{Data, Form, Path, Query, ServiceConfig},
    FromRequest, HttpRequest, HttpResponse, Responder, Result,
};
use actix_web_lab::respond::Html;
use minijinja::value::Value;
use minijinja_autoreload::AutoReloader;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Holds the notice to show on the next rendered page. Taking it clears it, so every notice is
/// shown once.
#[derive(Debug, Default)]
pub struct Flash(Mutex<Option<Notice>>);

impl Flash {
    pub fn set(&self, notice: Notice) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(notice);
    }

    pub fn take(&self) -> Option<Notice> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Creates the template environment for templates in `template_dir`.
pub fn template_reloader(template_dir: PathBuf, autoreload: bool) -> AutoReloader {
    // The closure is invoked every time the environment is outdated to recreate it.
    AutoReloader::new(move |notifier| {
        let mut env: minijinja::Environment<'static> = minijinja::Environment::new();

        // if watch_path is never called, no fs watcher is created
        if autoreload {
            notifier.watch_path(&template_dir, true);
        }

        env.set_source(minijinja::Source::from_path(&template_dir));

        Ok(env)
    })
}

/// Registers all UI routes. Expects `Data<Planner>`, `Data<Flash>` and `Data<AutoReloader>` in
/// the app data.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(index)
        .service(jump)
        .service(day_page)
        .service(add_event)
        .service(update_event)
        .service(delete_event);
}

/// Error handlers rendering the 404 and 500 pages.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::NOT_FOUND, not_found)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, internal_server_error)
}

struct MiniJinjaRenderer {
    tmpl_env: Data<AutoReloader>,
}

impl MiniJinjaRenderer {
    fn render(&self, tmpl: &str, ctx: impl Into<minijinja::value::Value>) -> Result<Html> {
        self.tmpl_env
            .acquire_env()
            .map_err(|_| error::ErrorInternalServerError("could not acquire template env"))?
            .get_template(tmpl)
            .map_err(|_| error::ErrorInternalServerError("could not find template"))?
            .render(ctx.into())
            .map(Html)
            .map_err(|err| {
                log::error!("{err}");
                error::ErrorInternalServerError("template error")
            })
    }
}

impl FromRequest for MiniJinjaRenderer {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _pl: &mut dev::Payload) -> Self::Future {
        let tmpl_env = <Data<AutoReloader>>::extract(req).into_inner();

        ready(tmpl_env.map(|tmpl_env| Self { tmpl_env }))
    }
}

fn parse_day(date: &str) -> Result<Day> {
    date.parse()
        .map_err(|_| error::ErrorNotFound(format!("no such day: {date}")))
}

fn day_location(day: Day, edit: Option<EntryId>) -> String {
    match edit {
        Some(id) => format!("/day/{day}?edit={id}"),
        None => format!("/day/{day}"),
    }
}

fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[route("/", method = "GET", method = "HEAD")]
async fn index() -> HttpResponse {
    see_other(day_location(Day::today(), None))
}

#[derive(Deserialize)]
struct JumpQuery {
    date: String,
}

/// Target of the date picker form.
#[get("/jump")]
async fn jump(query: Query<JumpQuery>, flash: Data<Flash>) -> HttpResponse {
    match query.date.parse::<Day>() {
        Ok(day) => see_other(day_location(day, None)),
        Err(_) => {
            flash.set(Notice::error("Please select a valid date!"));
            see_other(day_location(Day::today(), None))
        }
    }
}

#[derive(Deserialize)]
struct DayQuery {
    /// Entry to show the edit form for.
    edit: Option<u64>,
    /// Reload the events from the backend even if the day is already selected.
    #[serde(default)]
    refresh: bool,
}

#[route("/day/{date}", method = "GET", method = "HEAD")]
async fn day_page(
    tmpl_env: MiniJinjaRenderer,
    planner: Data<Planner>,
    flash: Data<Flash>,
    date: Path<String>,
    query: Query<DayQuery>,
) -> Result<impl Responder> {
    let day = parse_day(&date)?;

    let loaded = if query.refresh {
        planner.load_events(day).await
    } else {
        planner.select_date(day).await
    };

    // The outcome of the previous action comes first, a failed load is shown below it.
    let mut notices: Vec<Notice> = flash.take().into_iter().collect();
    if let Err(err) = loaded {
        notices.push(Notice::from(&err));
    }

    let entries: Vec<Value> = planner
        .entries()
        .await
        .into_iter()
        .map(Value::from_struct_object)
        .collect();

    let ctx = minijinja::context! {
        day => day.to_string(),
        canonical => day.canonical(),
        prev => day.pred().map(|day| day.to_string()),
        next => day.succ().map(|day| day.to_string()),
        today => Day::today().to_string(),
        editing => query.edit,
        entries,
        notices,
    };

    tmpl_env.render("day.html", ctx)
}

#[derive(Deserialize)]
struct EventForm {
    title: String,
    time: String,
}

#[post("/day/{date}/events")]
async fn add_event(
    planner: Data<Planner>,
    flash: Data<Flash>,
    date: Path<String>,
    form: Form<EventForm>,
) -> Result<HttpResponse> {
    let day = parse_day(&date)?;

    let notice = planner
        .add_event(day, &form.title, &form.time)
        .await
        .unwrap_or_else(|err| Notice::from(&err));

    flash.set(notice);

    Ok(see_other(day_location(day, None)))
}

#[post("/day/{date}/events/{entry}/update")]
async fn update_event(
    planner: Data<Planner>,
    flash: Data<Flash>,
    path: Path<(String, u64)>,
    form: Form<EventForm>,
) -> Result<HttpResponse> {
    let (date, entry) = path.into_inner();
    let day = parse_day(&date)?;
    let id = EntryId::from(entry);

    // Stay in edit mode if the update failed so the input can be fixed.
    let (notice, edit) = match planner.update_entry(day, id, &form.title, &form.time).await {
        Ok(notice) => (notice, None),
        Err(err) => (Notice::from(&err), Some(id)),
    };

    flash.set(notice);

    Ok(see_other(day_location(day, edit)))
}

#[post("/day/{date}/events/{entry}/delete")]
async fn delete_event(
    planner: Data<Planner>,
    flash: Data<Flash>,
    path: Path<(String, u64)>,
) -> Result<HttpResponse> {
    let (date, entry) = path.into_inner();
    let day = parse_day(&date)?;

    let notice = planner
        .delete_entry(day, EntryId::from(entry))
        .await
        .unwrap_or_else(|err| Notice::from(&err));

    flash.set(notice);

    Ok(see_other(day_location(day, None)))
}

/// Error handler for a 404 Page not found error.
fn not_found<B>(svc_res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    error_handler(svc_res, "not_found.html")
}

/// Error handler for a 500 Internal server error.
fn internal_server_error<B>(svc_res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    error_handler(svc_res, "error.html")
}

/// Generic error handler.
fn error_handler<B>(svc_res: ServiceResponse<B>, tmpl: &str) -> Result<ErrorHandlerResponse<B>> {
    let req = svc_res.request();

    let reason = svc_res
        .status()
        .canonical_reason()
        .unwrap_or("Unknown error");

    // Provide a fallback to a simple plain text response in case an error occurs during the
    // rendering of the error page.
    let fallback = |err: &str| {
        HttpResponse::build(svc_res.status())
            .content_type(ContentType::plaintext())
            .body(err.to_string())
    };

    let ctx = minijinja::context! {
        status_code => svc_res.status().as_str(),
        reason => reason,
    };

    let rendered = MiniJinjaRenderer::extract(req)
        .into_inner()
        .and_then(|tmpl_env| tmpl_env.render(tmpl, ctx));

    let res = match rendered {
        Ok(body) => body
            .customize()
            .with_status(svc_res.status())
            .respond_to(req)
            .map_into_boxed_body(),
        Err(_) => fallback(reason),
    };

    Ok(ErrorHandlerResponse::Response(ServiceResponse::new(
        svc_res.into_parts().0,
        res.map_into_right_body(),
    )))
}
