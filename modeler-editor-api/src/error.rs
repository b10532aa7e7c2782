//! Errors raised by editors and the engines they wrap.

use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = std::result::Result<T, EditorError>;

/// Error reported by a diagram engine.
///
/// Engines only ever report a human readable reason; the editor decides
/// whether it is attached to an event, propagated, or swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    /// Reason reported by the engine
    pub message: String,
}

impl EngineError {
    /// Create a new engine error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_editor_api::EngineError;
    ///
    /// let error = EngineError::new("unparsable content");
    /// assert_eq!(error.to_string(), "unparsable content");
    /// ```
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors produced by [`Editor`](crate::Editor) implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// An editor variant did not provide an operation it is required to implement
    #[error("{editor} must override <{operation}>")]
    NeedsOverride { operation: String, editor: String },

    /// A required option was not supplied
    #[error("missing option <{option}> for {context}")]
    MissingOption { option: String, context: String },

    /// The wrapped engine failed
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The operation requires a mounted editor
    #[error("editor is not mounted")]
    NotMounted,

    /// The editor was destroyed and its engine released
    #[error("editor has been destroyed")]
    Destroyed,

    /// The action identifier is not known
    #[error("unknown action <{0}>")]
    UnknownAction(String),

    /// Serializing the diagram failed
    #[error("save failed: {message}")]
    Save { message: String },

    /// Exporting the diagram failed
    #[error("export failed: {message}")]
    Export { message: String },
}

impl EditorError {
    /// Create a "must override" error for an abstract operation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_editor_api::EditorError;
    ///
    /// let error = EditorError::needs_override("resize", "cmmn");
    /// assert!(error.is_needs_override());
    /// ```
    pub fn needs_override<O: Into<String>, E: Into<String>>(operation: O, editor: E) -> Self {
        Self::NeedsOverride {
            operation: operation.into(),
            editor: editor.into(),
        }
    }

    /// Create a missing option error.
    pub fn missing_option<O: Into<String>, C: Into<String>>(option: O, context: C) -> Self {
        Self::MissingOption {
            option: option.into(),
            context: context.into(),
        }
    }

    /// Create a save error.
    pub fn save<S: Into<String>>(message: S) -> Self {
        Self::Save {
            message: message.into(),
        }
    }

    /// Create an export error.
    pub fn export<S: Into<String>>(message: S) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    /// Check if this is a "must override" error.
    pub fn is_needs_override(&self) -> bool {
        matches!(self, Self::NeedsOverride { .. })
    }

    /// Check if this is a missing option error.
    pub fn is_missing_option(&self) -> bool {
        matches!(self, Self::MissingOption { .. })
    }
}
