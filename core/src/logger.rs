//----------------------------------------------------------------------------------------- std lib
use std::io::Write;
use std::time::Instant;
//--------------------------------------------------------------------------------- other libraries
use env_logger::fmt::style::{AnsiColor, Color, Style};
use log::info;
use once_cell::sync::Lazy;

// This will get initialized below.
/// Returns the init [`Instant`]
pub static INIT_INSTANT: Lazy<Instant> = Lazy::new(Instant::now);

/// Returns the seconds since [`INIT_INSTANT`].
#[cfg(not(tarpaulin_include))]
pub fn uptime() -> u64 {
    INIT_INSTANT.elapsed().as_secs()
}

/// The filter used when `RUST_LOG` is not set: everything off except encore.
#[must_use]
pub fn default_filter(filter: log::LevelFilter) -> String {
    format!("off,encore={filter}")
}

const fn level_style(level: log::Level) -> (Style, &'static str) {
    let (color, letter) = match level {
        log::Level::Debug => (AnsiColor::Blue, "D"),
        log::Level::Trace => (AnsiColor::Magenta, "T"),
        log::Level::Info => (AnsiColor::White, "I"),
        log::Level::Warn => (AnsiColor::Yellow, "W"),
        log::Level::Error => (AnsiColor::Red, "E"),
    };
    (Style::new().fg_color(Some(Color::Ansi(color))).bold(), letter)
}

//---------------------------------------------------------------------------------------------------- Logger init function
#[allow(clippy::module_name_repetitions)]
/// Initializes the logger.
///
/// This enables console logging on all the internals of `Encore`.
///
/// Functionality is provided by [`log`].
///
/// The levels are:
/// - ERROR
/// - WARN
/// - INFO
/// - DEBUG
/// - TRACE
///
/// # Panics
/// This must only be called _once_.
#[cfg(not(tarpaulin_include))]
pub fn init_logger(filter: log::LevelFilter) {
    // Initialize timer.

    use crate::format_duration;
    let now = Lazy::force(&INIT_INSTANT);

    // If `RUST_LOG` isn't set, disable all library crate logs except for encore.
    let env = std::env::var("RUST_LOG").ok().filter(|e| !e.is_empty());
    let filters = env.clone().unwrap_or_else(|| default_filter(filter));

    let dimmed = Style::new().dimmed();

    env_logger::Builder::new()
        .format(move |buf, record| {
            let (style, level) = level_style(record.level());
            writeln!(
                buf,
                // Longest PATH in the repo: `core/src/audio/backend/mock.rs` - `30` characters
                // Longest file in the repo: `core/src/audio/mod.rs`          - `4` digits
                //
                //      Longest PATH ---|        |--- Longest file
                //                      |        |
                //                      v        v
                "| {style}{level}{style:#} | {dimmed}{}{dimmed:#} | {dimmed}{: >30} @ {: <4}{dimmed:#} | {}",
                format_duration(&now.elapsed()),
                record.file_static().unwrap_or("???"),
                record.line().unwrap_or(0),
                record.args(),
            )
        })
        .write_style(env_logger::WriteStyle::Always)
        .parse_filters(&filters)
        .init();

    match env {
        Some(env) => info!("Log Level (RUST_LOG) ... {env}"),
        None => info!("Log Level (Flag) ... {filter}"),
    }
}

/// Initializes the tracing layer.
#[must_use]
pub fn init_tracing() -> impl tracing::Subscriber {
    use tracing_subscriber::layer::SubscriberExt as _;

    let filter = tracing_subscriber::EnvFilter::new("off,encore=trace");

    tracing_subscriber::registry().with(filter)
}
