//! Component-scoped loggers
//!
//! Every message carries `component` and, once known, `device` as tracing
//! fields, so JSON output can be filtered per device without parsing text.

use tracing::Level;

/// Fields attached to every message of a logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    /// Component name (e.g., "coordinator", "modbus", "web")
    pub component: String,
    /// Device identifier (`host:port:unit`)
    pub device: Option<String>,
}

impl LogContext {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            device: None,
        }
    }

    pub fn with_device(mut self, device: String) -> Self {
        self.device = Some(device);
        self
    }
}

macro_rules! emit {
    ($level:expr, $ctx:expr, $msg:expr) => {
        match &$ctx.device {
            Some(device) => tracing::event!(
                $level,
                component = %$ctx.component,
                device = %device,
                "{}",
                $msg
            ),
            None => tracing::event!($level, component = %$ctx.component, "{}", $msg),
        }
    };
}

#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context: LogContext,
}

impl StructuredLogger {
    pub fn new(context: LogContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &LogContext {
        &self.context
    }

    pub fn info(&self, message: &str) {
        emit!(Level::INFO, self.context, message);
    }

    pub fn warn(&self, message: &str) {
        emit!(Level::WARN, self.context, message);
    }

    pub fn error(&self, message: &str) {
        emit!(Level::ERROR, self.context, message);
    }

    pub fn debug(&self, message: &str) {
        emit!(Level::DEBUG, self.context, message);
    }

    pub fn trace(&self, message: &str) {
        emit!(Level::TRACE, self.context, message);
    }
}

/// Logger for a component that is not tied to one device
pub fn get_logger(component: &str) -> StructuredLogger {
    StructuredLogger::new(LogContext::new(component))
}

pub fn get_logger_with_context(context: LogContext) -> StructuredLogger {
    StructuredLogger::new(context)
}
