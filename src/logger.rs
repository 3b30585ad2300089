use std::time::Instant;

use crate::routines::settings::Settings;
use eyre::{eyre, Result, WrapErr};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Setup logging for the library
///
/// This function sets up logging for the library. It uses the `tracing` crate, and the `tracing-subscriber` crate for formatting.
///
/// The log level is taken from `settings.log.level` and accepts any [EnvFilter] directive, e.g. `info` or `gmreduce=debug`.
///
/// Log messages are always written to stdout. If `settings.log.file` is set, they are also written to that file, with wall-clock timestamps.
///
/// Returns an error if a global subscriber has already been installed.
pub fn setup_log(settings: &Settings) -> Result<()> {
    let env_filter = EnvFilter::try_new(&settings.log.level)
        .wrap_err_with(|| format!("Invalid log level '{}'", settings.log.level))?;

    let timestamper = CompactTimestamp {
        start: Instant::now(),
    };

    // Define a registry with that level as an environment filter
    let subscriber = Registry::default().with(env_filter);

    // Define layer for file
    let file_layer = match &settings.log.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .wrap_err_with(|| format!("Failed to open log file {}", path))?;
            Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .with_timer(WallClock),
            )
        }
        None => None,
    };

    // Define layer for stdout
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false)
        .with_timer(timestamper);

    // Combine layers with subscriber
    subscriber
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| eyre!("Failed to install the log subscriber: {}", e))?;

    tracing::debug!("Logging is configured with level: {}", settings.log.level);
    Ok(())
}

/// Time elapsed since logging was set up
#[derive(Clone)]
struct CompactTimestamp {
    start: Instant,
}

impl FormatTime for CompactTimestamp {
    fn format_time(
        &self,
        w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> Result<(), std::fmt::Error> {
        let elapsed = self.start.elapsed();
        let hours = elapsed.as_secs() / 3600;
        let minutes = (elapsed.as_secs() % 3600) / 60;
        let seconds = elapsed.as_secs() % 60;

        write!(w, "{:02}h {:02}m {:02}s", hours, minutes, seconds)
    }
}

#[derive(Clone)]
struct WallClock;

impl FormatTime for WallClock {
    fn format_time(
        &self,
        w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> Result<(), std::fmt::Error> {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}
