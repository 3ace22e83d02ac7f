//! Serialized line output for task bodies.
//!
//! A `Console` is handed to task code explicitly instead of patching any
//! global print function. Every line is written while holding the context's
//! critical section, so lines from different workers never interleave and a
//! task that already holds the section can still print.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::warn;

use crate::critical::CriticalSection;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

#[derive(Clone)]
pub struct Console {
    section: Arc<CriticalSection>,
    writer: SharedWriter,
    thread_names: bool,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("thread_names", &self.thread_names)
            .finish()
    }
}

impl Console {
    /// Console writing to standard output.
    pub fn stdout(section: Arc<CriticalSection>) -> Self {
        Self::with_writer(section, io::stdout())
    }

    /// Console writing to any sink, e.g. a file or an in-memory buffer.
    pub fn with_writer<W>(section: Arc<CriticalSection>, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            section,
            writer: Arc::new(Mutex::new(Box::new(writer))),
            thread_names: true,
        }
    }

    /// Whether lines get the `[ thread-name ]` prefix.
    pub fn thread_names(mut self, enabled: bool) -> Self {
        self.thread_names = enabled;
        self
    }

    /// Writes one line.
    pub fn line(&self, message: impl fmt::Display) {
        let _section = self.section.enter();
        let line = if self.thread_names {
            format!("{} {}", thread_label(), message)
        } else {
            message.to_string()
        };

        let mut writer = self.writer.lock();
        if let Err(err) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(error = %err, "console write failed");
        }
    }

    /// The section this console serializes on.
    pub fn section(&self) -> &Arc<CriticalSection> {
        &self.section
    }
}

/// `[  name  ]` with the thread name centred in twelve columns.
fn thread_label() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => format!("[{:^12}]", name),
        None => format!("[{:^12}]", format!("{:?}", current.id())),
    }
}
