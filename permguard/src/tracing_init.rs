use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;

/// Log path: PERMGUARD_LOG env var > ~/.claude/permguard.log > ./permguard.log.
pub fn log_path() -> PathBuf {
    std::env::var_os("PERMGUARD_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(".claude").join("permguard.log"))
                .unwrap_or_else(|| PathBuf::from("permguard.log"))
        })
}

pub fn init_tracing() {
    let log_path = log_path();

    let parent_ready = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent).ok(),
        _ => Some(()),
    };
    let log_file = parent_ready.and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .ok()
    });

    let layer: Box<dyn Layer<_> + Send + Sync> = match log_file {
        Some(file) => tracing_subscriber::fmt::layer()
            .with_writer(file)
            .pretty()
            .with_ansi(false)
            .with_filter(LevelFilter::from_level(Level::DEBUG))
            .boxed(),
        None => {
            // Stdout carries hook JSON, so the fallback must be stderr.
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .pretty()
                .with_ansi(false)
                .with_filter(LevelFilter::from_level(Level::INFO))
                .boxed()
        }
    };

    tracing_subscriber::registry().with(layer).init()
}
