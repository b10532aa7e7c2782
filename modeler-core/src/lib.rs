//! # Modeler Core
//!
//! Tabs, menus, dialogs and the application shell of the diagram modeler.
//! Editors come from `modeler-editors`; this crate arranges them into tabs,
//! turns their state into menus and talks to the user through dialogs.
//!
//! ## Architecture
//!
//! - [`MultiEditorTab`] shows one file through several editors, with
//!   fallback editors for content the diagram editor cannot show
//! - [`MenuBuilder`] derives the complete menu from one [`StateContext`]
//!   snapshot
//! - [`Dialog`] builds dialog descriptors and hands them to a native host
//! - [`Application`] receives [`AppCommand`]s and ties everything together
//!
//! ## Example
//!
//! ```rust
//! use modeler_core::{DiagramFile, MultiEditorTab};
//! use modeler_editor_api::{DiagramType, EditorOptions};
//! use modeler_editors::MemoryEngine;
//!
//! # tokio_test::block_on(async {
//! let file = DiagramFile::create(DiagramType::Bpmn, 1);
//! let options = EditorOptions::default();
//! let mut tab = MultiEditorTab::for_file(file, &options, MemoryEngine::factory())?;
//! tab.open().await?;
//!
//! assert_eq!(tab.active_definition().id, "diagram");
//! assert!(tab.state().bpmn);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! [`StateContext`]: modeler_editor_api::StateContext

pub mod application;
pub mod command;
pub mod config;
pub mod dialog;
pub mod error;
pub mod export;
pub mod menu;
pub mod render;
pub mod tab;

pub use application::{command_channel, Application};
pub use command::{AppCommand, TabDirection};
pub use config::Config;
pub use dialog::{Dialog, DialogAnswer, DialogDescriptor, DialogKind, DialogOptions, NativeDialogs};
pub use error::{Error, Result};
pub use export::{ExportedFile, Exporter, ImageRenderer};
pub use menu::{MenuBuilder, MenuCapabilities, MenuItem, MenuTree, NativeMenu};
pub use render::SvgRenderer;
pub use tab::{DiagramFile, EditorDefinition, MultiEditorTab, NewDiagram};

/// Initialize tracing for the application.
///
/// Installing a subscriber twice is harmless; the second call does nothing.
///
/// # Example
///
/// ```rust
/// modeler_core::init_tracing();
/// tracing::info!("Modeler started");
/// ```
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// Initialize tracing with a maximum level, e.g. from `advanced.log_level`.
pub fn init_tracing_with_level(level: tracing::Level) {
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing() {
        init_tracing();
        init_tracing_with_level(tracing::Level::DEBUG);
    }

    #[test]
    fn test_configured_level_parses() {
        let config = Config::default();
        let level: tracing::Level = config.advanced.log_level.parse().unwrap();
        assert_eq!(level, tracing::Level::INFO);
    }
}
