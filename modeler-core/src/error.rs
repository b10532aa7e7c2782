//! # Error handling for Modeler Core
//!
//! A single error type covers tabs, dialogs, menus, export and configuration.
//! Editor failures are carried unchanged in [`Error::Editor`] so callers can
//! still tell a failed save from a missing dialog option.

use modeler_editor_api::EditorError;
use thiserror::Error;

/// Result type used throughout Modeler Core.
///
/// # Example
///
/// ```rust
/// use modeler_core::{Error, Result};
///
/// fn file_name(path: &str) -> Result<&str> {
///     path.rsplit('/').next().ok_or_else(|| Error::not_found(path))
/// }
///
/// assert_eq!(file_name("/tmp/diagram.bpmn").unwrap(), "diagram.bpmn");
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Modeler Core.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Tab management errors
    #[error("Tab error: {message}")]
    Tab { message: String },

    /// Dialog requests that cannot be served
    #[error("Dialog error: {message}")]
    Dialog { message: String },

    /// Menu installation errors
    #[error("Menu error: {message}")]
    Menu { message: String },

    /// Export errors
    #[error("Export error: {message}")]
    Export { message: String },

    /// Errors reported by an editor
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    /// File I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// ZIP archive errors
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Generic error with custom message
    #[error("Error: {message}")]
    Generic { message: String },

    /// Validation errors
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    /// Not found errors
    #[error("Not found: {resource}")]
    NotFound { resource: String },
}

impl Error {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new tab error.
    pub fn tab<S: Into<String>>(message: S) -> Self {
        Self::Tab {
            message: message.into(),
        }
    }

    /// Create a new dialog error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::Error;
    ///
    /// let error = Error::dialog("no native dialog backend");
    /// assert!(error.is_dialog());
    /// ```
    pub fn dialog<S: Into<String>>(message: S) -> Self {
        Self::Dialog {
            message: message.into(),
        }
    }

    pub fn menu<S: Into<String>>(message: S) -> Self {
        Self::Menu {
            message: message.into(),
        }
    }

    /// Create a new export error.
    pub fn export<S: Into<String>>(message: S) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    /// Create a new generic error.
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Create a new validation error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::Error;
    ///
    /// let error = Error::validation("editor.properties_panel_width", "must not be zero");
    /// assert!(error.is_validation());
    /// ```
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    pub fn is_dialog(&self) -> bool {
        matches!(self, Self::Dialog { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Check if this error is a missing option on a dialog or action request.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::Error;
    /// use modeler_editor_api::EditorError;
    ///
    /// let error = Error::from(EditorError::missing_option("name", "save dialog"));
    /// assert!(error.is_missing_option());
    /// ```
    pub fn is_missing_option(&self) -> bool {
        matches!(self, Self::Editor(e) if e.is_missing_option())
    }

    /// The wrapped editor error, if any.
    pub fn as_editor_error(&self) -> Option<&EditorError> {
        match self {
            Self::Editor(e) => Some(e),
            _ => None,
        }
    }

    /// Get the error category as a string.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::Error;
    ///
    /// let error = Error::tab("no active tab");
    /// assert_eq!(error.category(), "Tab");
    /// ```
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "Config",
            Self::Tab { .. } => "Tab",
            Self::Dialog { .. } => "Dialog",
            Self::Menu { .. } => "Menu",
            Self::Export { .. } => "Export",
            Self::Editor(_) => "Editor",
            Self::Io(_) => "IO",
            Self::Json(_) => "JSON",
            Self::Toml(_) => "TOML",
            Self::Zip(_) => "ZIP",
            Self::Generic { .. } => "Generic",
            Self::Validation { .. } => "Validation",
            Self::NotFound { .. } => "NotFound",
        }
    }
}

/// Convenience macro for creating errors with context.
///
/// # Example
///
/// ```rust
/// use modeler_core::{error, Error};
///
/// let err = error!("Failed to open {}: {}", "diagram.bpmn", "permission denied");
/// assert_eq!(err.category(), "Generic");
/// ```
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::Error::generic(format!($($arg)*))
    };
}

/// Convenience macro for creating dialog errors.
///
/// # Example
///
/// ```rust
/// use modeler_core::{dialog_error, Error};
///
/// let err = dialog_error!("unknown dialog type <{}>", "print");
/// assert!(err.is_dialog());
/// ```
#[macro_export]
macro_rules! dialog_error {
    ($($arg:tt)*) => {
        $crate::Error::dialog(format!($($arg)*))
    };
}

/// Convert from `anyhow::Error` to our custom error type.
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::generic(err.to_string())
    }
}
