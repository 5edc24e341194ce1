use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::PathBuf;
use termine::planner::Planner;
use termine::web::{self, Flash};
use termine::AppConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address on which the web server will listen
    #[arg(long, value_name = "HOST:PORT", env = "LISTEN_ADDR")]
    listen_addr: Option<SocketAddr>,

    /// Automatically reload templates when they are modified
    #[arg(long, env = "TEMPLATE_AUTORELOAD")]
    template_autoreload: bool,

    /// Path to the template directory
    #[arg(long, value_name = "DIR")]
    template_dir: Option<PathBuf>,

    /// Base URL of the events backend, e.g. http://localhost:4000
    #[arg(long, value_name = "URL", env = "BACKEND_URL")]
    backend_url: Option<String>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::load().context("failed to load configuration")?;

    if let Some(listen_addr) = cli.listen_addr {
        config.server.listen_addr = listen_addr;
    }
    if let Some(template_dir) = cli.template_dir {
        config.server.template_dir = template_dir;
    }
    if let Some(backend_url) = cli.backend_url {
        config.backend.base_url = backend_url;
    }
    config.server.template_autoreload |= cli.template_autoreload;

    if config.server.template_autoreload {
        log::info!("template auto-reloading is enabled");
    } else {
        log::info!(
            "template auto-reloading is disabled; run with TEMPLATE_AUTORELOAD=true to enable"
        );
    }

    log::info!(
        "using {:?} event backend at {}",
        config.backend.kind,
        config.backend.base_url
    );

    let planner = Data::new(Planner::from_config(&config.backend)?);
    let flash = Data::new(Flash::default());
    let tmpl_reloader = Data::new(web::template_reloader(
        config.server.template_dir.clone(),
        config.server.template_autoreload,
    ));

    log::info!("starting HTTP server at {}", config.server.listen_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(planner.clone())
            .app_data(flash.clone())
            .app_data(tmpl_reloader.clone())
            .configure(web::configure)
            .wrap(web::error_handlers())
            // Don't log things that could identify the user, e.g. omit client IP, referrer and
            // user agent.
            .wrap(Logger::new(r#""%r" %s %b %T"#))
    })
    .workers(2)
    .bind(config.server.listen_addr)?
    .run()
    .await?;

    Ok(())
}
