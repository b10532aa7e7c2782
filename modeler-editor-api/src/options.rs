//! Construction options shared by editors.

use crate::event::EditorLayout;
use crate::i18n::Locale;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name and version of the application writing diagrams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub name: String,
    pub version: String,
}

impl AppMetadata {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, version: V) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self::new("Modeler", env!("CARGO_PKG_VERSION"))
    }
}

/// Options every editor is created with.
#[derive(Debug, Clone, Default)]
pub struct EditorOptions {
    /// Display strings
    pub locale: Arc<Locale>,
    /// Written into saved diagrams
    pub metadata: AppMetadata,
    /// Layout at creation time
    pub layout: EditorLayout,
}

impl EditorOptions {
    pub fn with_locale(mut self, locale: Arc<Locale>) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_metadata(mut self, metadata: AppMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_layout(mut self, layout: EditorLayout) -> Self {
        self.layout = layout;
        self
    }
}
