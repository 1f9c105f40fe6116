use std::sync::Arc;
use parking_lot::Mutex;

// Logger is the narrow logging capability handed to the catalog store and the
// search worker.
pub trait Logger: Sync + Send {
    fn log(&self, message: &str);
}

#[derive(Debug, Default, Clone)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(component = self.component, "{}", message);
    }
}

// MemoryLogger keeps every line so tests can assert on what was logged.
#[derive(Debug, Default, Clone)]
pub struct MemoryLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }
}

impl Logger for MemoryLogger {
    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use crate::core::logger::{Logger, MemoryLogger, TracingLogger};

    #[tokio::test]
    async fn test_should_capture_lines() {
        let logger = MemoryLogger::new();
        let shared: Arc<dyn Logger> = Arc::new(logger.clone());
        shared.log("first");
        shared.log("second");
        assert_eq!(vec!["first".to_string(), "second".to_string()], logger.lines());
        assert!(logger.contains("sec"));
        assert!(!logger.contains("third"));
    }

    #[tokio::test]
    async fn test_should_log_through_tracing() {
        TracingLogger::new("test").log("no subscriber installed");
    }
}
