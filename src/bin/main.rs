mod app_state;
mod command;
mod config;

use crate::command::Command;
use crate::config::CONFIG;
use crossbeam_channel::{unbounded, RecvTimeoutError};
use std::io::BufRead;
use std::time::Duration;

fn main() {
    let filters = std::env::var("RUST_LOG").ok();
    log_builder(CONFIG.general.log_level.to_level_filter(), filters.as_deref()).init();

    let mut app_state = match app_state::AppState::new() {
        Ok(app_state) => app_state,
        Err(e) => {
            log::error!("Unable to set up from the configuration. Reason:\r\n{}", e);
            std::process::exit(1);
        }
    };

    let (tx, rx) = unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Could not read from stdin. Reason:\r\n{}", e);
                    break;
                }
            }
        }
    });

    println!("{}", command::HELP);
    let tick = Duration::from_millis(CONFIG.general.tick);
    loop {
        match rx.recv_timeout(tick) {
            Ok(line) => match Command::parse(&line) {
                Ok(command) => {
                    if !app_state.handle(command) {
                        break;
                    }
                }
                Err(message) => println!("{}", message),
            },
            Err(RecvTimeoutError::Timeout) => {}
            // Stdin was closed.
            Err(RecvTimeoutError::Disconnected) => break,
        }
        app_state.update();
    }
}

/// A logger at `level`, unless `filters` in `RUST_LOG` syntax say otherwise.
fn log_builder(level: log::LevelFilter, filters: Option<&str>) -> env_logger::Builder {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);
    if let Some(filters) = filters {
        builder.parse_filters(filters);
    }
    builder
}

#[test]
fn configured_log_level_is_used() {
    let logger = log_builder(log::LevelFilter::Info, None).build();
    assert_eq!(logger.filter(), log::LevelFilter::Info);
}

#[test]
fn rust_log_overrides_the_configured_level() {
    let logger = log_builder(log::LevelFilter::Info, Some("debug")).build();
    assert_eq!(logger.filter(), log::LevelFilter::Debug);

    let logger = log_builder(log::LevelFilter::Info, Some("wayfinder=trace")).build();
    assert_eq!(logger.filter(), log::LevelFilter::Trace);
}
