//! # Modeler Editors
//!
//! The editors hosted by modeler tabs.
//!
//! ## Editors
//!
//! - [`BpmnEditor`], [`DmnEditor`] and [`CmmnEditor`]: diagram editors sharing
//!   one [`DiagramEditor`] base, differing only in their [`DiagramVariant`]
//! - [`XmlEditor`]: plain text view of any content, used as fallback
//! - [`FormEditor`]: form builder placeholder
//!
//! [`MemoryEngine`] is a headless [`DiagramEngine`](modeler_editor_api::DiagramEngine)
//! that drives the diagram editors without a renderer.
//!
//! ## Example
//!
//! ```rust
//! use modeler_editor_api::{Editor, EditorOptions, EventSink, InitialState};
//! use modeler_editors::{BpmnEditor, MemoryEngine};
//!
//! # tokio_test::block_on(async {
//! let xml = r#"<definitions id="Definitions_1"><process id="Process_1"/></definitions>"#;
//! let mut editor = BpmnEditor::bpmn(
//!     EventSink::detached("diagram"),
//!     EditorOptions::default(),
//!     MemoryEngine::factory(),
//! );
//!
//! editor.set_xml(xml.to_string(), Some(InitialState::new(xml, false)));
//! editor.mount();
//!
//! if let Some(pending) = editor.update().unwrap() {
//!     editor.finish_import(pending.resolve().await);
//! }
//!
//! assert!(editor.current_state().editable);
//! assert!(!editor.current_state().dirty);
//! # });
//! ```

pub mod bpmn;
pub mod cmmn;
pub mod content;
pub mod diagram;
pub mod dmn;
pub mod form;
pub mod memory;
pub mod xml;

pub use bpmn::{Bpmn, BpmnEditor};
pub use cmmn::{Cmmn, CmmnEditor};
pub use diagram::{DiagramEditor, DiagramVariant, EngineSnapshot, VariantContext};
pub use dmn::{Dmn, DmnEditor};
pub use form::FormEditor;
pub use memory::{MemoryEngine, MemoryEngineHandle};
pub use xml::{TextBuffer, XmlEditor};
