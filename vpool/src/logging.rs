// Logging for vpool
//
// Worker pools log through the `tracing` ecosystem. This module installs a
// global subscriber and provides the domain macros used by workers, the
// scaler and the lifecycle monitor.
//
// # Usage Examples
//
// ```rust
// use vpool::logging;
//
// // INFO level, console output
// logging::init_default();
//
// // Or with custom settings
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: false,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// Worker threads inherit the dispatcher that was current on the thread that
// spawned them, so a subscriber set with `tracing::subscriber::set_default`
// in a test also sees worker output.

use std::sync::Once;
use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for the vpool logging system
///
/// # Examples
///
/// ```rust
/// use vpool::logging::LogConfig;
/// use tracing::Level;
///
/// let custom_config = LogConfig {
///     level: Level::DEBUG,
///     json_format: true,
///     show_file_line: false,
///     show_thread_info: true,
///     show_time: true,
///     target_filters: Some("vpool=debug,vpool::monitor=trace".to_string()),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

static INIT: Once = Once::new();

/// Initialize the logging system with the given configuration
///
/// Sets up the global tracing subscriber. Safe to call multiple times; only
/// the first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

        if let Some(filters) = &config.target_filters {
            for filter in filters.split(',') {
                if let Ok(directive) = filter.trim().parse() {
                    env_filter = env_filter.add_directive(directive);
                }
            }
        }

        let registry = tracing_subscriber::registry().with(env_filter);

        let subscriber: Box<dyn Subscriber + Send + Sync> = match (config.json_format, config.show_time) {
            (true, _) => Box::new(registry.with(fmt::layer().json().flatten_event(true))),
            (false, true) => Box::new(registry.with(
                fmt::layer()
                    .with_ansi(atty::is(atty::Stream::Stdout))
                    .with_file(config.show_file_line)
                    .with_line_number(config.show_file_line)
                    .with_thread_names(config.show_thread_info)
                    .with_thread_ids(config.show_thread_info),
            )),
            (false, false) => Box::new(registry.with(
                fmt::layer()
                    .without_time()
                    .with_ansi(atty::is(atty::Stream::Stdout))
                    .with_file(config.show_file_line)
                    .with_line_number(config.show_file_line)
                    .with_thread_names(config.show_thread_info)
                    .with_thread_ids(config.show_thread_info),
            )),
        };

        set_global_subscriber(subscriber);
    });
}

fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Initialize logging with INFO level and human-readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

/// Initialize logging for development: DEBUG level, worker lifecycle at TRACE.
pub fn init_development() {
    init(LogConfig {
        level: Level::DEBUG,
        json_format: false,
        show_file_line: true,
        show_thread_info: true,
        show_time: true,
        target_filters: Some("vpool=debug,vpool::worker=trace".to_string()),
    });
}

/// Initialize logging for production: JSON lines, no file/line information.
pub fn init_production() {
    init(LogConfig {
        level: Level::INFO,
        json_format: true,
        show_file_line: false,
        show_thread_info: true,
        show_time: true,
        target_filters: None,
    });
}

/// Initialize logging for tests
///
/// Only warnings and errors, no timestamps, no thread information.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        target_filters: None,
    });
}

/// Get the current tracing dispatcher
///
/// Captured by the pool before it spawns a worker or monitor thread, and
/// installed as that thread's default.
#[inline]
pub fn current_subscriber() -> tracing::Dispatch {
    tracing::dispatcher::get_default(|d| d.clone())
}

/// Log group-level events (construction, resizing, closing)
///
/// # Examples
///
/// ```rust
/// use vpool::log_group;
///
/// log_group!("g1", "resized");
/// log_group!("g1", "resized", from = 4, to = 2);
/// ```
#[macro_export]
macro_rules! log_group {
    ($group:expr, $event:expr) => {
        $crate::logging::info!(group = %$group, event = $event);
    };
    ($group:expr, $event:expr, $($fields:tt)*) => {
        $crate::logging::info!(group = %$group, event = $event, $($fields)*);
    };
}

/// Log worker lifecycle events - chatty, so emitted at DEBUG
#[macro_export]
macro_rules! log_worker {
    ($group:expr, $worker:expr, $event:expr) => {
        $crate::logging::debug!(group = %$group, worker = $worker, event = $event);
    };
    ($group:expr, $worker:expr, $event:expr, $($fields:tt)*) => {
        $crate::logging::debug!(group = %$group, worker = $worker, event = $event, $($fields)*);
    };
}

/// Log a failed task
///
/// # Examples
///
/// ```rust
/// use vpool::log_task_failure;
///
/// log_task_failure!("g1", "my_crate::crawl", "connection refused");
/// ```
#[macro_export]
macro_rules! log_task_failure {
    ($group:expr, $task:expr, $error:expr) => {
        $crate::logging::error!(group = %$group, task = $task, error = %$error, "task failed");
    };
    ($group:expr, $task:expr, $error:expr, $($fields:tt)*) => {
        $crate::logging::error!(group = %$group, task = $task, error = %$error, $($fields)*, "task failed");
    };
}

pub use tracing::{debug, error, info, trace, warn};
