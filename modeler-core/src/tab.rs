//! Tabs hosting several editors for one diagram file.
//!
//! A [`MultiEditorTab`] owns one editor per [`EditorDefinition`], all sharing
//! one event channel. Exactly one editor is active. Content the primary
//! editor cannot represent, either because it rejects it up front or because
//! its import fails, is handed verbatim to the first fallback editor in
//! declaration order. The tab keeps the active editor's latest
//! [`StateContext`] as is; it never merges the states of sibling editors.

use crate::{Error, Result};
use modeler_editor_api::{
    DiagramType, Editor, EditorAction, EditorEvent, EditorFactory, EditorLayout, EditorMessage,
    EditorOptions, EngineFactory, EventSink, InitialState, StateContext,
};
use modeler_editors::{BpmnEditor, CmmnEditor, DmnEditor, FormEditor, XmlEditor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use uuid::Uuid;

const BPMN_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" xmlns:bpmndi="http://www.omg.org/spec/BPMN/20100524/DI" xmlns:dc="http://www.omg.org/spec/DD/20100524/DC" id="Definitions_1" targetNamespace="http://bpmn.io/schema/bpmn">
  <bpmn:process id="Process_1" isExecutable="false">
    <bpmn:startEvent id="StartEvent_1"/>
  </bpmn:process>
  <bpmndi:BPMNDiagram id="BPMNDiagram_1">
    <bpmndi:BPMNPlane id="BPMNPlane_1" bpmnElement="Process_1">
      <bpmndi:BPMNShape id="_BPMNShape_StartEvent_2" bpmnElement="StartEvent_1">
        <dc:Bounds x="173" y="102" width="36" height="36"/>
      </bpmndi:BPMNShape>
    </bpmndi:BPMNPlane>
  </bpmndi:BPMNDiagram>
</bpmn:definitions>
"#;

const DMN_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://www.omg.org/spec/DMN/20151101/dmn.xsd" id="definitions" name="definitions" namespace="http://camunda.org/schema/1.0/dmn">
  <decision id="decision" name="Decision">
    <decisionTable id="decisionTable">
      <input id="input1" label="Input">
        <inputExpression id="inputExpression1" typeRef="string"/>
      </input>
      <output id="output1" label="Output" name="output" typeRef="string"/>
    </decisionTable>
  </decision>
</definitions>
"#;

const CMMN_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cmmn:definitions xmlns:cmmn="http://www.omg.org/spec/CMMN/20151109/MODEL" id="Definitions_1" targetNamespace="http://bpmn.io/schema/cmmn">
  <cmmn:case id="Case_1">
    <cmmn:casePlanModel id="CasePlanModel_1" name="A CasePlanModel"/>
  </cmmn:case>
</cmmn:definitions>
"#;

const DMN_DIAGRAM_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://www.omg.org/spec/DMN/20151101/dmn.xsd" xmlns:biodi="http://bpmn.io/schema/dmn/biodi/1.0" id="definitions" name="definitions" namespace="http://camunda.org/schema/1.0/dmn">
  <decision id="decision" name="Decision">
    <extensionElements>
      <biodi:bounds x="200" y="200" width="180" height="80"/>
    </extensionElements>
    <decisionTable id="decisionTable">
      <input id="input1" label="Input">
        <inputExpression id="inputExpression1" typeRef="string"/>
      </input>
      <output id="output1" label="Output" name="output" typeRef="string"/>
    </decisionTable>
  </decision>
</definitions>
"#;

/// Templates offered by the "New File" menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NewDiagram {
    Bpmn,
    /// DMN decision table
    DmnTable,
    /// DMN decision requirements diagram
    DmnDiagram,
    Cmmn,
}

impl NewDiagram {
    pub fn diagram_type(&self) -> DiagramType {
        match self {
            NewDiagram::Bpmn => DiagramType::Bpmn,
            NewDiagram::DmnTable | NewDiagram::DmnDiagram => DiagramType::Dmn,
            NewDiagram::Cmmn => DiagramType::Cmmn,
        }
    }

    /// Identifier of the menu command creating this template.
    pub fn command_id(&self) -> &'static str {
        match self {
            NewDiagram::Bpmn => "create-bpmn-diagram",
            NewDiagram::DmnTable => "create-dmn-table",
            NewDiagram::DmnDiagram => "create-dmn-diagram",
            NewDiagram::Cmmn => "create-cmmn-diagram",
        }
    }

    pub fn from_command_id(id: &str) -> Option<Self> {
        [
            NewDiagram::Bpmn,
            NewDiagram::DmnTable,
            NewDiagram::DmnDiagram,
            NewDiagram::Cmmn,
        ]
        .into_iter()
        .find(|kind| kind.command_id() == id)
    }

    fn template(&self) -> &'static str {
        match self {
            NewDiagram::Bpmn => BPMN_TEMPLATE,
            NewDiagram::DmnTable => DMN_TEMPLATE,
            NewDiagram::DmnDiagram => DMN_DIAGRAM_TEMPLATE,
            NewDiagram::Cmmn => CMMN_TEMPLATE,
        }
    }
}

/// A diagram file shown in a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramFile {
    /// Display name, e.g. `diagram_1.bpmn`
    pub name: String,
    /// Location on disk, `None` until first saved
    pub path: Option<PathBuf>,
    /// Last loaded or saved content
    pub contents: String,
    pub diagram_type: DiagramType,
    /// Never written to disk
    pub is_unsaved: bool,
}

impl DiagramFile {
    /// A new, unsaved diagram of the given type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::DiagramFile;
    /// use modeler_editor_api::DiagramType;
    ///
    /// let file = DiagramFile::create(DiagramType::Dmn, 2);
    /// assert_eq!(file.name, "diagram_2.dmn");
    /// assert!(file.is_unsaved);
    /// assert_eq!(DiagramType::sniff(&file.contents), Some(DiagramType::Dmn));
    /// ```
    pub fn create(diagram_type: DiagramType, counter: usize) -> Self {
        let template = match diagram_type {
            DiagramType::Bpmn => NewDiagram::Bpmn,
            DiagramType::Dmn => NewDiagram::DmnTable,
            DiagramType::Cmmn => NewDiagram::Cmmn,
        };

        Self::from_template(template, counter)
    }

    /// A new, unsaved diagram from one of the "New File" templates.
    pub fn from_template(template: NewDiagram, counter: usize) -> Self {
        let diagram_type = template.diagram_type();

        Self {
            name: format!("diagram_{}.{}", counter, diagram_type.extension()),
            path: None,
            contents: template.template().to_string(),
            diagram_type,
            is_unsaved: true,
        }
    }

    /// A file with known content.
    pub fn new<N: Into<String>, C: Into<String>>(
        name: N,
        contents: C,
        diagram_type: DiagramType,
    ) -> Self {
        Self {
            name: name.into(),
            path: None,
            contents: contents.into(),
            diagram_type,
            is_unsaved: false,
        }
    }

    /// Read a diagram from disk.
    ///
    /// The type comes from the file extension, or from the content's
    /// namespace when the extension is not recognised.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its type is unknown.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;

        let extension = path.extension().and_then(|e| e.to_str());
        let diagram_type = DiagramType::from_extension(extension)
            .or_else(|| DiagramType::sniff(&contents))
            .ok_or_else(|| Error::tab(format!("unrecognized file <{}>", path.display())))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            contents,
            diagram_type,
            is_unsaved: false,
        })
    }

    /// Point the file at a new location after "save as".
    pub fn relocate(&mut self, path: PathBuf) {
        if let Some(name) = path.file_name() {
            self.name = name.to_string_lossy().to_string();
        }
        self.path = Some(path);
    }
}

/// One editor a tab can show.
#[derive(Clone)]
pub struct EditorDefinition {
    /// Stable id, e.g. `diagram` or `xml`
    pub id: String,
    /// Display label
    pub label: String,
    /// Candidate for content the primary editor cannot represent
    pub is_fallback: bool,
    pub factory: EditorFactory,
}

impl EditorDefinition {
    pub fn new<I: Into<String>, L: Into<String>>(id: I, label: L, factory: EditorFactory) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            is_fallback: false,
            factory,
        }
    }

    /// Mark the definition as a fallback.
    pub fn fallback(mut self) -> Self {
        self.is_fallback = true;
        self
    }
}

impl std::fmt::Debug for EditorDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorDefinition")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("is_fallback", &self.is_fallback)
            .finish()
    }
}

/// Editor definitions for a tab showing the given diagram type.
///
/// BPMN tabs offer the diagram, the XML view and the form editor; DMN and
/// CMMN tabs offer the diagram and the XML view. Every non-diagram editor is
/// a fallback.
///
/// # Example
///
/// ```rust
/// use modeler_core::tab::definitions_for;
/// use modeler_editor_api::{DiagramType, EditorOptions};
/// use modeler_editors::MemoryEngine;
///
/// let options = EditorOptions::default();
/// let definitions = definitions_for(DiagramType::Bpmn, &options, MemoryEngine::factory());
/// let ids: Vec<&str> = definitions.iter().map(|d| d.id.as_str()).collect();
/// assert_eq!(ids, vec!["diagram", "xml", "form-editor"]);
/// assert!(!definitions[0].is_fallback);
/// ```
pub fn definitions_for(
    diagram_type: DiagramType,
    options: &EditorOptions,
    engines: EngineFactory,
) -> Vec<EditorDefinition> {
    let locale = options.locale.clone();

    let diagram: EditorFactory = {
        let options = options.clone();
        match diagram_type {
            DiagramType::Bpmn => Arc::new(move |events: EventSink| {
                Box::new(BpmnEditor::bpmn(events, options.clone(), engines.clone()))
                    as Box<dyn Editor>
            }),
            DiagramType::Dmn => Arc::new(move |events: EventSink| {
                Box::new(DmnEditor::dmn(events, options.clone(), engines.clone()))
                    as Box<dyn Editor>
            }),
            DiagramType::Cmmn => Arc::new(move |events: EventSink| {
                Box::new(CmmnEditor::cmmn(events, options.clone(), engines.clone()))
                    as Box<dyn Editor>
            }),
        }
    };

    let mut definitions = vec![
        EditorDefinition::new("diagram", locale.t("tabs.diagram"), diagram),
        EditorDefinition::new(
            "xml",
            locale.t("tabs.xml"),
            Arc::new(|events: EventSink| Box::new(XmlEditor::new(events)) as Box<dyn Editor>),
        )
        .fallback(),
    ];

    if diagram_type == DiagramType::Bpmn {
        definitions.push(
            EditorDefinition::new(
                "form-editor",
                locale.t("tabs.form"),
                Arc::new(|events: EventSink| Box::new(FormEditor::new(events)) as Box<dyn Editor>),
            )
            .fallback(),
        );
    }

    definitions
}

/// A tab showing one file through one of several editors.
pub struct MultiEditorTab {
    id: String,
    file: DiagramFile,
    definitions: Vec<EditorDefinition>,
    editors: Vec<Box<dyn Editor>>,
    active: usize,
    receiver: UnboundedReceiver<EditorMessage>,
    state: StateContext,
    outbox: Vec<EditorMessage>,
}

impl MultiEditorTab {
    /// Create a tab. Editors are instantiated now; their engines on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if `definitions` is empty or has no fallback.
    pub fn new(file: DiagramFile, definitions: Vec<EditorDefinition>) -> Result<Self> {
        if definitions.is_empty() {
            return Err(Error::tab("a tab needs at least one editor"));
        }

        if !definitions.iter().any(|d| d.is_fallback) {
            return Err(Error::tab("a tab needs a fallback editor"));
        }

        let id = Uuid::new_v4().to_string();
        let (events, receiver) = EventSink::channel(id.clone());
        let editors = definitions
            .iter()
            .map(|definition| (definition.factory)(events.scoped(definition.id.clone())))
            .collect();

        Ok(Self {
            id,
            file,
            definitions,
            editors,
            active: 0,
            receiver,
            state: StateContext::default(),
            outbox: Vec::new(),
        })
    }

    /// Create a tab with the preset editors for the file's diagram type.
    pub fn for_file(
        file: DiagramFile,
        options: &EditorOptions,
        engines: EngineFactory,
    ) -> Result<Self> {
        let definitions = definitions_for(file.diagram_type, options, engines);
        Self::new(file, definitions)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file(&self) -> &DiagramFile {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut DiagramFile {
        &mut self.file
    }

    pub fn definitions(&self) -> &[EditorDefinition] {
        &self.definitions
    }

    /// Definition of the active editor.
    pub fn active_definition(&self) -> &EditorDefinition {
        &self.definitions[self.active]
    }

    pub fn active_editor(&self) -> &dyn Editor {
        self.editors[self.active].as_ref()
    }

    /// Latest state reported by the active editor.
    pub fn state(&self) -> &StateContext {
        &self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty
    }

    /// Show the file in the primary editor, falling back when needed.
    ///
    /// # Errors
    ///
    /// Returns an error if no editor can take the content.
    pub async fn open(&mut self) -> Result<()> {
        info!("Opening {} in tab {}", self.file.name, self.id);

        let xml = self.file.contents.clone();
        let primary = if self.editors[0].accepts(&xml) {
            0
        } else {
            debug!("Primary editor rejects {}", self.file.name);
            self.fallback_index(&xml)?
        };

        self.activate(primary, xml, self.file.is_unsaved).await
    }

    /// Switch to the editor with the given definition id.
    ///
    /// The active editor's content is serialized first and handed to the
    /// next editor. A failed serialization aborts the switch.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown ids, failed saves and failed imports
    /// with no fallback left.
    pub async fn show_editor(&mut self, id: &str) -> Result<()> {
        let index = self
            .definitions
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| Error::not_found(format!("editor <{}>", id)))?;

        if index == self.active {
            return Ok(());
        }

        let dirty = self.state.dirty;
        let saved = self.editors[self.active].save_xml().await;
        self.pump();
        let xml = saved?;

        debug!(
            "Switching {} from {} to {}",
            self.file.name, self.definitions[self.active].id, id
        );
        self.activate(index, xml, dirty).await
    }

    /// Serialize the active editor's content and record it as saved.
    ///
    /// # Errors
    ///
    /// Returns the editor's save error.
    pub async fn save(&mut self) -> Result<String> {
        let saved = self.editors[self.active].save_xml().await;
        self.pump();

        let xml = saved?;
        self.file.contents = xml.clone();
        self.file.is_unsaved = false;

        info!("Saved {}", self.file.name);
        Ok(xml)
    }

    /// Serialize the active editor's content without recording it as saved.
    ///
    /// A tab with unsaved changes stays dirty.
    ///
    /// # Errors
    ///
    /// Returns the editor's save error.
    pub async fn serialize(&mut self) -> Result<String> {
        let serialized = self.editors[self.active].serialize_xml().await;
        self.pump();
        Ok(serialized?)
    }

    /// Render the active editor's content as SVG.
    pub async fn export_svg(&mut self) -> Result<String> {
        let svg = self.editors[self.active].save_svg().await;
        self.pump();
        Ok(svg?)
    }

    /// Forward an action to the active editor.
    pub fn trigger_action(&mut self, action: &EditorAction) -> Result<()> {
        let result = self.editors[self.active].trigger_action(action);
        self.pump();
        Ok(result?)
    }

    pub fn set_input_active(&mut self, active: bool) {
        self.editors[self.active].set_input_active(active);
        self.pump();
    }

    /// Apply a layout change to every editor.
    pub fn set_layout(&mut self, layout: EditorLayout) {
        for editor in &mut self.editors {
            editor.set_layout(layout);
        }
        self.pump();
    }

    pub fn open_log(&mut self) {
        self.editors[self.active].open_log();
        self.pump();
    }

    /// Collect pending engine and editor events.
    ///
    /// State updates from the active editor become the tab's state; events
    /// from inactive editors are dropped.
    pub fn pump(&mut self) {
        self.editors[self.active].pump_engine_events();

        let active_id = self.definitions[self.active].id.clone();
        while let Ok(message) = self.receiver.try_recv() {
            if message.source() != active_id {
                debug!("Dropping {:?} from inactive editor {}", message.event(), message.source());
                continue;
            }

            if let EditorEvent::StateUpdated(state) = message.event() {
                self.state = state.clone();
            }

            self.outbox.push(message);
        }
    }

    /// Take the active editor's events collected so far.
    pub fn take_messages(&mut self) -> Vec<EditorMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Release all editors and their engines.
    pub fn destroy(&mut self) {
        info!("Closing tab {}", self.file.name);
        for editor in &mut self.editors {
            editor.destroy();
        }
    }

    fn fallback_index(&self, xml: &str) -> Result<usize> {
        self.definitions
            .iter()
            .zip(&self.editors)
            .position(|(definition, editor)| definition.is_fallback && editor.accepts(xml))
            .ok_or_else(|| Error::tab(format!("no editor can show {}", self.file.name)))
    }

    async fn activate(&mut self, mut index: usize, xml: String, dirty: bool) -> Result<()> {
        loop {
            self.load_into(index, &xml, dirty);

            match self.run_update().await? {
                Some(error) if !self.definitions[index].is_fallback => {
                    warn!(
                        "{} editor could not import {}: {}",
                        self.definitions[index].id, self.file.name, error
                    );
                    index = self.fallback_index(&xml)?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn load_into(&mut self, index: usize, xml: &str, dirty: bool) {
        if index != self.active {
            self.editors[self.active].unmount();
            self.active = index;
            self.state = StateContext::default();
        }

        let editor = &mut self.editors[index];
        let initial = (dirty || editor.is_history_lost(xml)).then(|| InitialState::new(xml, dirty));

        editor.set_xml(xml.to_string(), initial);
        editor.mount();
    }

    /// Run the active editor's update, returning the import error if any.
    async fn run_update(&mut self) -> Result<Option<String>> {
        let pending = self.editors[self.active].update()?;

        let failure = match pending {
            Some(pending) => {
                let outcome = pending.resolve().await;
                let failure = outcome.result.as_ref().err().map(|e| e.message.clone());
                self.editors[self.active].finish_import(outcome);
                failure
            }
            None => None,
        };

        self.pump();
        Ok(failure)
    }
}

impl std::fmt::Debug for MultiEditorTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiEditorTab")
            .field("id", &self.id)
            .field("file", &self.file.name)
            .field("active", &self.definitions[self.active].id)
            .finish()
    }
}
