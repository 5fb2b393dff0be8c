use std::backtrace::Backtrace;
use std::sync::Arc;

use super::Facet;

/// The thread and call stack a `record` call was made from.
///
/// Captured on the recording thread, so relays running elsewhere still see
/// where the event originated.
#[derive(Debug, Clone)]
pub struct ThreadData {
    thread_name: String,
    backtrace: Arc<Backtrace>,
}

impl ThreadData {
    pub fn capture() -> Self {
        let current = std::thread::current();
        Self {
            thread_name: current.name().unwrap_or("unnamed").to_string(),
            backtrace: Arc::new(Backtrace::force_capture()),
        }
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn stack_trace_to_string(&self) -> String {
        self.backtrace.to_string()
    }
}

impl Facet for ThreadData {}
