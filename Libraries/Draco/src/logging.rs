//! Log forwarding for hosts that load the library through the C boundary.
//!
//! A host can register a callback that receives every event as text, and can
//! install a process-wide subscriber that also prints to stderr.

use std::ffi::{c_char, CString};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Receives a NUL-terminated message and level name. Both pointers are only valid during the call.
pub type LogCallback = extern "C" fn(message: *const c_char, log_level: *const c_char);

static LOG_CALLBACK: Lazy<Mutex<Option<LogCallback>>> = Lazy::new(|| Mutex::new(None));

pub fn set_log_callback(callback: Option<LogCallback>) {
    let mut guard = LOG_CALLBACK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = callback;
}

fn registered_callback() -> Option<LogCallback> {
    *LOG_CALLBACK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn log_to_application(message: &str, log_level: &str, location: &str) {
    // The lock is released before calling out, so a callback may (un)register.
    let Some(callback) = registered_callback() else {
        return;
    };
    if message.is_empty() {
        return;
    }
    let (Ok(c_message), Ok(c_level)) = (
        CString::new(format!("{}\n{}", message, location)),
        CString::new(log_level),
    ) else {
        return;
    };
    callback(c_message.as_ptr(), c_level.as_ptr());
}

struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}

/// Forwards events at or above `log_level` to the registered callback.
pub struct ApplicationLoggingLayer {
    pub log_level: Level,
}

impl<S> Layer<S> for ApplicationLoggingLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event, _ctx: Context<S>) {
        let level = *event.metadata().level();
        if level > self.log_level {
            return;
        }
        let mut visitor = MessageVisitor { message: None };
        event.record(&mut visitor);
        let Some(message) = visitor.message else {
            return;
        };
        log_to_application(&message, level.as_str(), event.metadata().name());
    }
}

/// Maps the boundary's numeric level (0 trace .. 4 error) to a filter.
pub fn level_filter(log_level: u32) -> LevelFilter {
    match log_level {
        0 => LevelFilter::TRACE,
        1 => LevelFilter::DEBUG,
        2 => LevelFilter::INFO,
        3 => LevelFilter::WARN,
        4 => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

/// Installs the process-wide subscriber. Returns false if one is already installed.
pub fn init_logging(log_level: LevelFilter) -> bool {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .with_filter(log_level);
    let app_layer = ApplicationLoggingLayer {
        log_level: log_level.into_level().unwrap_or(Level::INFO),
    }
    .with_filter(log_level);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(app_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use tracing::{debug, info, warn};

    static RECEIVED: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());

    extern "C" fn record(message: *const c_char, log_level: *const c_char) {
        let (message, log_level) = unsafe {
            (
                CStr::from_ptr(message).to_string_lossy().into_owned(),
                CStr::from_ptr(log_level).to_string_lossy().into_owned(),
            )
        };
        RECEIVED.lock().unwrap().push((message, log_level));
    }

    extern "C" fn record_once(message: *const c_char, log_level: *const c_char) {
        record(message, log_level);
        set_log_callback(None);
    }

    fn received() -> Vec<(String, String)> {
        std::mem::take(&mut *RECEIVED.lock().unwrap())
    }

    #[test]
    fn callback_receives_events_at_or_above_level() {
        let subscriber = tracing_subscriber::registry().with(ApplicationLoggingLayer {
            log_level: Level::INFO,
        });
        tracing::subscriber::with_default(subscriber, || {
            crate::ffi::draco_register_log_callback(Some(record));
            debug!("too verbose");
            info!("decoded {} points", 3);
            warn!("short source");

            let events = received();
            assert_eq!(events.len(), 2);
            assert!(events[0].0.starts_with("decoded 3 points\n"));
            assert_eq!(events[0].1, "INFO");
            assert!(events[1].0.starts_with("short source\n"));
            assert_eq!(events[1].1, "WARN");

            crate::ffi::draco_unregister_log_callback();
            warn!("nobody listens");
            assert!(received().is_empty());

            // A callback may unregister itself without deadlocking.
            set_log_callback(Some(record_once));
            warn!("first");
            warn!("second");
            let events = received();
            assert_eq!(events.len(), 1);
            assert!(events[0].0.starts_with("first\n"));
            assert!(registered_callback().is_none());
        });
    }

    #[test]
    fn numeric_levels() {
        assert_eq!(level_filter(0), LevelFilter::TRACE);
        assert_eq!(level_filter(4), LevelFilter::ERROR);
        assert_eq!(level_filter(42), LevelFilter::INFO);
    }
}
