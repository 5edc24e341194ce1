extern crate dotenv;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use std::iter;

use termine::backend;
use termine::event::{group_by_day, Day};
use termine::planner::Action;
use termine::AppConfig;

/// Prints the events of consecutive days.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// First day to print, defaults to today
    #[arg(long, value_name = "YYYY-MM-DD")]
    date: Option<Day>,

    /// Number of days to print
    #[arg(long, default_value_t = 7)]
    days: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));
    dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    let backend = backend::from_config(&config.backend)?;

    let first = cli.date.unwrap_or_else(Day::today);
    let days: Vec<Day> = iter::successors(Some(first), Day::succ)
        .take(cli.days)
        .collect();

    let events = backend
        .list_events()
        .await
        .context(Action::Load.failure_message())?;

    for (date, events) in group_by_day(events, &days) {
        println!("{date}");

        if events.is_empty() {
            println!("  no events");
        }

        for event in events {
            println!(
                "  {:>5}  {}",
                event.time.as_deref().unwrap_or("--:--"),
                event.title
            );
        }
    }

    Ok(())
}
