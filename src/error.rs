//! # Preview Pipeline Error Handling
//!
//! Structured error types for the preview pipeline, with error context,
//! severity, and a mapping onto the pipeline's outcome taxonomy.
//!
//! ## Architecture
//!
//! - **Error Types**: one enum, one variant per failing concern, each with rich context
//! - **Error Context**: timestamp, operation, free-form context and metadata
//! - **Error Classes**: which pipeline outcome an error (or drop) corresponds to
//!
//! ## Error Classes
//!
//! The pipeline never propagates per-frame failures to the frame source.
//! Every outcome belongs to exactly one class:
//!
//! - `NoData`: no frame was pending, silently ignored
//! - `PolicyDrop`: a frame existed but the mode/busy policy discarded it
//! - `ProcessingFailure`: decode or crop/rescale faulted; recovered locally
//! - `SinkUnavailable`: the display target was missing at delivery time
//!
//! No class is retried and none is fatal to subsequent frames.
//!
//! ## Usage
//!
//! ```rust
//! use photobooth_preview::error::{ErrorClass, PreviewError};
//!
//! let error = PreviewError::decode("plane 'u' is shorter than its strides require")
//!     .with_operation("decode")
//!     .with_metadata("width", "640");
//!
//! assert_eq!(error.category(), "decode");
//! assert_eq!(error.class(), ErrorClass::ProcessingFailure);
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Debug-level errors that don't affect operation
    Debug,
    /// Informational errors
    Info,
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that affect operation but can be recovered from
    Error,
    /// Fatal errors that cannot be recovered from
    Fatal,
}

/// Pipeline outcome class an error or drop belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    NoData,
    PolicyDrop,
    ProcessingFailure,
    SinkUnavailable,
}

/// Core error context containing metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Additional metadata as key-value pairs
    pub metadata: std::collections::HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            severity: ErrorSeverity::Error,
            metadata: std::collections::HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operation that was being performed
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Add additional context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set severity level
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Base error type for the preview pipeline
#[derive(Debug)]
pub enum PreviewError {
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// Raw frame could not be converted into the flat pixel buffer
    Decode {
        reason: String,
        context: ErrorContext,
    },
    /// Crop, rescale or rotation failed
    Rescale {
        reason: String,
        context: ErrorContext,
    },
    /// Buffer or frame resource problems
    Resource {
        resource: String,
        reason: String,
        context: ErrorContext,
    },
    /// The display sink could not take an image
    SinkUnavailable {
        reason: String,
        context: ErrorContext,
    },
    /// State errors (invalid state transitions, missing runtime)
    State {
        current_state: String,
        attempted_operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// External library errors
    External {
        library: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl PreviewError {
    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create a decode error
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create a crop/rescale error
    pub fn rescale(reason: impl Into<String>) -> Self {
        Self::Rescale {
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create a resource error
    pub fn resource(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resource {
            resource: resource.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a sink-unavailable error
    pub fn sink_unavailable(reason: impl Into<String>) -> Self {
        Self::SinkUnavailable {
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Info),
        }
    }

    /// Create a state error
    pub fn state(
        current_state: impl Into<String>,
        attempted_operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::State {
            current_state: current_state.into(),
            attempted_operation: attempted_operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an external library error
    pub fn external(
        library: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            library: library.into(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Attach the path an I/O error refers to
    pub fn with_path(mut self, p: impl Into<String>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(p.into());
        }
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::Rescale { context, .. } => context,
            Self::Resource { context, .. } => context,
            Self::SinkUnavailable { context, .. } => context,
            Self::State { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    /// Get mutable reference to error context
    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::Rescale { context, .. } => context,
            Self::Resource { context, .. } => context,
            Self::SinkUnavailable { context, .. } => context,
            Self::State { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Decode { .. } => "decode",
            Self::Rescale { .. } => "rescale",
            Self::Resource { .. } => "resource",
            Self::SinkUnavailable { .. } => "sink_unavailable",
            Self::State { .. } => "state",
            Self::Io { .. } => "io",
            Self::External { .. } => "external",
        }
    }

    /// Pipeline outcome class for errors raised while handling a frame.
    ///
    /// Everything that is not a missing sink counts as a processing failure:
    /// the frame is abandoned and the next delivery is an independent attempt.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::SinkUnavailable { .. } => ErrorClass::SinkUnavailable,
            _ => ErrorClass::ProcessingFailure,
        }
    }
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            PreviewError::Decode { reason, .. } => write!(f, "Frame decode failed: {}", reason),
            PreviewError::Rescale { reason, .. } => {
                write!(f, "Crop/rescale failed: {}", reason)
            }
            PreviewError::Resource {
                resource, reason, ..
            } => write!(f, "Resource error for '{}': {}", resource, reason),
            PreviewError::SinkUnavailable { reason, .. } => {
                write!(f, "Display sink unavailable: {}", reason)
            }
            PreviewError::State {
                current_state,
                attempted_operation,
                reason,
                ..
            } => write!(
                f,
                "Cannot {} while {}: {}",
                attempted_operation, current_state, reason
            ),
            PreviewError::Io {
                operation,
                path,
                source,
                ..
            } => match path {
                Some(path) => write!(f, "I/O error during {} on '{}': {}", operation, path, source),
                None => write!(f, "I/O error during {}: {}", operation, source),
            },
            PreviewError::External {
                library, source, ..
            } => write!(f, "{} error: {}", library, source),
        }
    }
}

impl StdError for PreviewError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type PreviewResult<T> = Result<T, PreviewError>;

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for PreviewError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Error conversion implementations
impl From<std::io::Error> for PreviewError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for PreviewError {
    fn from(error: serde_json::Error) -> Self {
        Self::external("serde_json", error)
    }
}

impl From<image::ImageError> for PreviewError {
    fn from(error: image::ImageError) -> Self {
        Self::external("image", error)
    }
}

impl From<preview_scale::ScaleError> for PreviewError {
    fn from(error: preview_scale::ScaleError) -> Self {
        use preview_scale::ScaleError;
        match error {
            ScaleError::PlaneTooSmall { .. } => Self::decode(error.to_string()),
            ScaleError::EmptyInput => Self::decode(error.to_string()),
            other => Self::rescale(other.to_string()),
        }
    }
}
