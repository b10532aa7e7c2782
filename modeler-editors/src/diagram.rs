//! Shared behaviour of engine backed diagram editors.
//!
//! [`DiagramEditor`] owns one lazily created [`DiagramEngine`] and implements
//! the import/save round-trip, dirty tracking against the engine's command
//! stack, engine event handling and the warnings overlay. Everything that
//! differs between notations is delegated to a [`DiagramVariant`]: how state
//! is derived, how editor actions map onto the engine and how the canvas is
//! resized. Variants that do not provide action dispatch or resizing fail
//! with [`EditorError::NeedsOverride`].

use async_trait::async_trait;
use modeler_editor_api::{
    ActiveView, AppMetadata, DiagramEngine, DiagramType, Editor, EditorAction, EditorError,
    EditorEvent, EditorLayout, EditorOptions, EditorResult, EngineEvent, EngineFactory,
    EventSink, ImportOutcome, ImportReport, InitialState, LogEntry, PendingImport, SaveOptions,
    SaveReport, StateContext, TableSelection,
};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, warn};

use crate::content;

/// Engine level actions that still run while a text input owns the keyboard.
const INPUT_PASS_THROUGH: [&str; 4] = ["removeSelection", "stepZoom", "zoom", "find"];

/// Scroll speed used for `moveCanvas`.
const MOVE_CANVAS_SPEED: u32 = 20;

/// Engine state captured for one state derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSnapshot {
    /// A diagram is loaded
    pub imported: bool,
    pub undo: bool,
    pub redo: bool,
    /// Result of the dirty check
    pub dirty: bool,
    /// At least one element is selected
    pub elements_selected: bool,
    /// A text input owns the keyboard
    pub input_active: bool,
    pub clipboard_empty: bool,
    pub view: Option<ActiveView>,
    pub table: TableSelection,
}

impl EngineSnapshot {
    fn capture(engine: &dyn DiagramEngine, initial: &InitialState, input_active: bool) -> Self {
        if !engine.is_imported() {
            return Self::unloaded(initial, input_active);
        }

        Self {
            imported: true,
            undo: engine.can_undo(),
            redo: engine.can_redo(),
            dirty: initial.is_dirty(engine.stack_index()),
            elements_selected: !engine.selection().is_empty(),
            input_active,
            clipboard_empty: engine.clipboard_is_empty(),
            view: Some(engine.active_view()),
            table: engine.table_selection(),
        }
    }

    fn unloaded(initial: &InitialState, input_active: bool) -> Self {
        Self {
            dirty: initial.dirty,
            input_active,
            clipboard_empty: true,
            ..Self::default()
        }
    }
}

/// What a variant may touch while handling a call.
pub struct VariantContext<'a> {
    pub engine: &'a mut dyn DiagramEngine,
    pub events: &'a EventSink,
    pub layout: &'a mut EditorLayout,
    pub metadata: &'a AppMetadata,
    pub input_active: bool,
}

impl VariantContext<'_> {
    /// Fire an engine event, ignoring engines that cannot take it.
    pub fn notify_engine(&mut self, event: &str) {
        if let Err(e) = self.engine.fire(event) {
            debug!("Ignoring failed engine notification {}: {}", event, e);
        }
    }
}

/// Notation specific parts of a diagram editor.
pub trait DiagramVariant: Send + 'static {
    /// Notation edited by this variant.
    fn diagram_type(&self) -> DiagramType;

    /// Derive the state snapshot for the current engine state.
    fn build_state(&self, snapshot: &EngineSnapshot) -> StateContext;

    /// Dispatch an action that is not handled by the command stack.
    fn trigger_editor_action(
        &mut self,
        _ctx: &mut VariantContext<'_>,
        _action: &EditorAction,
    ) -> EditorResult<()> {
        Err(EditorError::needs_override(
            "triggerEditorActions",
            self.diagram_type().extension(),
        ))
    }

    /// Adapt the canvas to a new container size.
    fn resize(&mut self, _ctx: &mut VariantContext<'_>) -> EditorResult<()> {
        Err(EditorError::needs_override("resize", self.diagram_type().extension()))
    }

    /// Called after the `save` event, before serialization.
    fn on_save(&mut self, _ctx: &mut VariantContext<'_>) {}

    /// Whether content looks like something the engine can import.
    fn accepts(&self, content: &str) -> bool {
        content::inspect(content)
            .map(|summary| summary.root == "definitions")
            .unwrap_or(false)
    }
}

/// Translate an editor action into the engine's action name and options.
///
/// Zoom actions become `stepZoom`/`zoom`, distribution actions become
/// `distributeElements` and `moveCanvas` gets a fixed scroll speed.
///
/// # Example
///
/// ```rust
/// use modeler_editor_api::EditorAction;
/// use modeler_editors::diagram::engine_call;
/// use serde_json::json;
///
/// let (name, options) = engine_call(&EditorAction::ZoomFit);
/// assert_eq!(name, "zoom");
/// assert_eq!(options, json!({ "value": "fit-viewport" }));
/// ```
pub fn engine_call(action: &EditorAction) -> (&'static str, Value) {
    match action {
        EditorAction::ZoomIn => ("stepZoom", json!({ "value": 1 })),
        EditorAction::ZoomOut => ("stepZoom", json!({ "value": -1 })),
        EditorAction::Zoom => ("zoom", json!({ "value": 1 })),
        EditorAction::ZoomFit => ("zoom", json!({ "value": "fit-viewport" })),
        EditorAction::DistributeHorizontally => {
            ("distributeElements", json!({ "type": "horizontal" }))
        }
        EditorAction::DistributeVertically => ("distributeElements", json!({ "type": "vertical" })),
        EditorAction::MoveCanvas(direction) => (
            "moveCanvas",
            json!({ "direction": direction.as_str(), "speed": MOVE_CANVAS_SPEED }),
        ),
        other => (other.name(), other.options()),
    }
}

/// Forward an action to the engine's editor actions module.
///
/// A missing module makes this a no-op. While a text input is active only
/// selection removal, zooming and find reach the engine.
pub fn dispatch_editor_action(
    ctx: &mut VariantContext<'_>,
    action: &EditorAction,
) -> EditorResult<()> {
    if !ctx.engine.has_editor_actions() {
        debug!("Ignoring {}: no editor actions", action);
        return Ok(());
    }

    let (name, options) = engine_call(action);

    if ctx.input_active && !INPUT_PASS_THROUGH.contains(&name) {
        debug!("Ignoring {} while input is active", name);
        return Ok(());
    }

    debug!("editor-actions {} {}", name, options);
    ctx.engine.trigger_editor_action(name, &options)?;
    Ok(())
}

/// An editor backed by a diagram engine.
pub struct DiagramEditor<V: DiagramVariant> {
    variant: V,
    events: EventSink,
    options: EditorOptions,
    factory: EngineFactory,
    engine: Option<Box<dyn DiagramEngine>>,
    engine_events: Option<UnboundedReceiver<EngineEvent>>,
    mounted: bool,
    destroyed: bool,
    last_xml: Option<String>,
    /// Content the engine held before the import in flight
    replaced_xml: Option<String>,
    new_xml: Option<String>,
    initial: InitialState,
    generation: u64,
    last_import: Option<ImportReport>,
    input_active: bool,
    layout: EditorLayout,
}

impl<V: DiagramVariant> DiagramEditor<V> {
    /// Create an editor. The engine is created on first use.
    pub fn new(
        variant: V,
        events: EventSink,
        options: EditorOptions,
        factory: EngineFactory,
    ) -> Self {
        let layout = options.layout;

        Self {
            variant,
            events,
            options,
            factory,
            engine: None,
            engine_events: None,
            mounted: false,
            destroyed: false,
            last_xml: None,
            replaced_xml: None,
            new_xml: None,
            initial: InitialState::default(),
            generation: 0,
            last_import: None,
            input_active: false,
            layout,
        }
    }

    pub fn variant(&self) -> &V {
        &self.variant
    }

    /// Current dirty bookkeeping.
    pub fn initial_state(&self) -> &InitialState {
        &self.initial
    }

    /// Generation of the most recently started import.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The last import, while its warnings are still shown.
    pub fn last_import(&self) -> Option<&ImportReport> {
        self.last_import.as_ref()
    }

    pub fn layout(&self) -> &EditorLayout {
        &self.layout
    }

    /// Serialize the diagram, returning it with the stack position it was
    /// taken at. The dirty bookkeeping is left to the caller.
    async fn serialize(&mut self) -> EditorResult<(String, i64)> {
        self.ensure_engine()?;

        debug!("[#saveXML] save");
        self.events.emit(EditorEvent::Save);
        self.with_variant(|variant, ctx| {
            variant.on_save(ctx);
            Ok(())
        })?;

        let (stack_index, serializing) = {
            let engine = self.engine.as_deref().ok_or(EditorError::Destroyed)?;
            let stack_index = engine.stack_index();

            if self.initial.stack_index == Some(stack_index) {
                (stack_index, None)
            } else {
                (stack_index, Some(engine.save_xml(SaveOptions::default())))
            }
        };

        let result = match serializing {
            Some(future) => future.await,
            None => Ok(self.last_xml.clone().unwrap_or_default()),
        };

        match result {
            Ok(xml) => {
                debug!("[#saveXML] saved");
                self.events.emit(EditorEvent::Saved(SaveReport::success(xml.clone())));
                Ok((xml, stack_index))
            }
            Err(e) => {
                error!("Failed to save {} diagram: {}", self.name(), e);
                self.events.emit(EditorEvent::Saved(SaveReport::failure(e.message.clone())));
                Err(EditorError::save(e.message))
            }
        }
    }

    fn ensure_engine(&mut self) -> EditorResult<()> {
        if self.destroyed {
            return Err(EditorError::Destroyed);
        }

        if self.engine.is_none() {
            debug!("Creating {} engine", self.name());
            let mut engine = (self.factory)();
            self.engine_events = Some(engine.subscribe());
            self.engine = Some(engine);
        }

        Ok(())
    }

    fn with_variant<T>(
        &mut self,
        f: impl FnOnce(&mut V, &mut VariantContext<'_>) -> EditorResult<T>,
    ) -> EditorResult<T> {
        self.ensure_engine()?;

        let engine = self.engine.as_deref_mut().ok_or(EditorError::Destroyed)?;
        let mut ctx = VariantContext {
            engine,
            events: &self.events,
            layout: &mut self.layout,
            metadata: &self.options.metadata,
            input_active: self.input_active,
        };

        f(&mut self.variant, &mut ctx)
    }

    fn on_updated(&mut self, report: Option<ImportReport>) {
        self.events.emit(EditorEvent::Updated(report));

        if let Some(engine) = self.engine.as_deref() {
            if engine.is_imported() && self.initial.stack_index.is_none() {
                self.initial = self.initial.with_stack_index_if_unset(engine.stack_index());
            }
        }

        self.update_state();
        self.events.emit(EditorEvent::Shown);
    }

    fn show_warnings(&self) {
        let Some(report) = self.last_import.as_ref().filter(|r| r.has_warnings()) else {
            return;
        };

        let locale = &self.options.locale;
        let count = report.warnings.len();
        let noun = if count == 1 {
            locale.t("editor.warning_one")
        } else {
            locale.t("editor.warning_many")
        };

        let mut entries = vec![LogEntry::warning(locale.t_with(
            "editor.import_warnings",
            &[
                ("type", self.variant.diagram_type().tag()),
                ("count", &count.to_string()),
                ("warnings", &noun),
            ],
        ))];
        entries.extend(
            report
                .warnings
                .iter()
                .map(|w| LogEntry::warning(format!("> {}", w.message))),
        );
        entries.push(LogEntry::warning(""));

        self.events.emit(EditorEvent::Log(entries));
    }

    fn handle_engine_error(&mut self, message: String) {
        error!("{} engine error: {}", self.name(), message);
        self.events.emit(EditorEvent::Log(vec![LogEntry::error(message)]));
        self.events.emit(EditorEvent::LogToggle { open: true });
    }
}

#[async_trait]
impl<V: DiagramVariant> Editor for DiagramEditor<V> {
    fn name(&self) -> &str {
        self.variant.diagram_type().extension()
    }

    fn id(&self) -> &str {
        self.events.source()
    }

    fn mount(&mut self) {
        debug!("Mounting {} editor", self.name());
        self.mounted = true;
    }

    fn unmount(&mut self) {
        debug!("Unmounting {} editor", self.name());
        self.mounted = false;
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn set_xml(&mut self, xml: String, initial_state: Option<InitialState>) {
        self.new_xml = Some(xml);

        if let Some(initial) = initial_state {
            self.initial = initial;
        }
    }

    fn last_xml(&self) -> Option<&str> {
        self.last_xml.as_deref()
    }

    fn accepts(&self, content: &str) -> bool {
        self.variant.accepts(content)
    }

    fn update(&mut self) -> EditorResult<Option<PendingImport>> {
        if !self.mounted {
            debug!("[#update] skipping (not mounted)");
            return Ok(None);
        }

        let new_xml = match self.new_xml.clone() {
            Some(xml) if self.last_xml.as_ref() != Some(&xml) => xml,
            _ => {
                debug!("[#update] skipping (no change)");
                self.on_updated(self.last_import.clone());
                return Ok(None);
            }
        };

        debug!("[#update] import");

        self.ensure_engine()?;
        let engine = self.engine.as_deref_mut().ok_or(EditorError::Destroyed)?;
        let future = engine.import_xml(&new_xml);

        self.events.emit(EditorEvent::Import {
            xml: new_xml.clone(),
        });
        self.replaced_xml = self.last_xml.replace(new_xml.clone());
        self.generation += 1;
        self.initial = self.initial.with_importing(true);

        Ok(Some(PendingImport::new(self.generation, new_xml, future)))
    }

    fn finish_import(&mut self, outcome: ImportOutcome) -> bool {
        if self.destroyed || outcome.generation != self.generation {
            debug!(
                "[#update] discarding stale import (generation {}, current {})",
                outcome.generation, self.generation
            );
            return false;
        }

        self.pump_engine_events();

        let report = match outcome.result {
            Ok(warnings) => {
                self.initial = self.initial.after_import(&outcome.xml);
                ImportReport {
                    xml: outcome.xml,
                    error: None,
                    warnings,
                }
            }
            Err(e) => {
                warn!("Failed to import {} diagram: {}", self.name(), e);
                // the engine still holds the previous content
                self.last_xml = self.replaced_xml.take();
                self.initial = self.initial.with_importing(false);
                ImportReport {
                    xml: outcome.xml,
                    error: Some(e.message),
                    warnings: Vec::new(),
                }
            }
        };

        debug!("[#update] imported");

        self.last_import = Some(report.clone());
        self.events.emit(EditorEvent::Imported(report.clone()));
        self.show_warnings();
        self.on_updated(Some(report));

        true
    }

    async fn save_xml(&mut self) -> EditorResult<String> {
        let (xml, stack_index) = self.serialize().await?;

        self.last_xml = Some(xml.clone());
        self.new_xml = Some(xml.clone());
        self.initial = self.initial.after_save(xml.clone(), stack_index);
        self.update_state();
        Ok(xml)
    }

    async fn serialize_xml(&mut self) -> EditorResult<String> {
        let (xml, _) = self.serialize().await?;
        Ok(xml)
    }

    fn trigger_action(&mut self, action: &EditorAction) -> EditorResult<()> {
        self.ensure_engine()?;

        match action {
            EditorAction::Undo | EditorAction::Redo => {
                let engine = self.engine.as_deref_mut().ok_or(EditorError::Destroyed)?;
                if *action == EditorAction::Undo {
                    engine.undo();
                } else {
                    engine.redo();
                }
                Ok(())
            }
            other => self.with_variant(|variant, ctx| variant.trigger_editor_action(ctx, other)),
        }
    }

    fn update_state(&mut self) {
        if self.initial.importing {
            debug!("[#updateState] skipping (importing)");
            return;
        }

        let state = self.current_state();
        self.events.emit(EditorEvent::StateUpdated(state));
    }

    fn current_state(&self) -> StateContext {
        let snapshot = match self.engine.as_deref() {
            Some(engine) => EngineSnapshot::capture(engine, &self.initial, self.input_active),
            None => EngineSnapshot::unloaded(&self.initial, self.input_active),
        };

        self.variant.build_state(&snapshot)
    }

    fn set_input_active(&mut self, active: bool) {
        if self.input_active != active {
            self.input_active = active;
            self.update_state();
        }
    }

    fn set_layout(&mut self, layout: EditorLayout) {
        if layout.log.cleared {
            self.hide_warnings();
        }

        self.layout = layout;

        if self.engine.is_some() {
            if let Err(e) = self.resize() {
                warn!("Failed to resize {} editor: {}", self.name(), e);
            }
        }
    }

    fn hide_warnings(&mut self) {
        self.last_import = None;
        self.events.emit(EditorEvent::Changed);
    }

    fn open_log(&mut self) {
        self.events.emit(EditorEvent::LogToggle { open: true });
        self.hide_warnings();
    }

    fn pump_engine_events(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(receiver) = self.engine_events.as_mut() {
            while let Ok(event) = receiver.try_recv() {
                pending.push(event);
            }
        }

        let handled = pending.len();
        let mut state_changed = false;

        for event in pending {
            match event {
                EngineEvent::CommandStackChanged
                | EngineEvent::SelectionChanged
                | EngineEvent::ElementsCopied => state_changed = true,
                EngineEvent::ImportParseStart => {
                    self.initial = self.initial.with_importing(true);
                }
                EngineEvent::ImportDone => {
                    self.initial = self.initial.with_importing(false);
                }
                EngineEvent::Error(message) => self.handle_engine_error(message),
            }
        }

        if state_changed {
            self.update_state();
        }

        handled
    }

    fn resize(&mut self) -> EditorResult<()> {
        self.with_variant(|variant, ctx| variant.resize(ctx))
    }

    fn destroy(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            debug!("Destroying {} engine", self.name());
            engine.destroy();
        }

        self.engine_events = None;
        self.destroyed = true;
        self.mounted = false;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngineHandle;
    use modeler_editor_api::EditorMessage;
    use tokio::sync::mpsc::UnboundedReceiver;

    /// A variant that only provides state, relying on the defaults for the rest.
    struct Bare;

    impl DiagramVariant for Bare {
        fn diagram_type(&self) -> DiagramType {
            DiagramType::Bpmn
        }

        fn build_state(&self, snapshot: &EngineSnapshot) -> StateContext {
            StateContext {
                undo: snapshot.undo,
                redo: snapshot.redo,
                dirty: snapshot.dirty,
                ..StateContext::default()
            }
        }
    }

    const XML: &str = r#"<definitions id="d"><process id="p"><task id="t"/></process></definitions>"#;

    fn editor() -> (DiagramEditor<Bare>, MemoryEngineHandle, UnboundedReceiver<EditorMessage>) {
        let handle = MemoryEngineHandle::new();
        let (events, receiver) = EventSink::channel("diagram");
        let editor = DiagramEditor::new(Bare, events, EditorOptions::default(), handle.factory());
        (editor, handle, receiver)
    }

    fn drain(receiver: &mut UnboundedReceiver<EditorMessage>) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        while let Ok(message) = receiver.try_recv() {
            events.push(message.into_event());
        }
        events
    }

    async fn open(editor: &mut DiagramEditor<Bare>, xml: &str) {
        editor.set_xml(xml.to_string(), Some(InitialState::new(xml, false)));
        editor.mount();
        let pending = editor.update().unwrap().expect("import should start");
        assert!(editor.finish_import(pending.resolve().await));
    }

    #[test]
    fn test_update_is_noop_when_unmounted() {
        let (mut editor, handle, mut receiver) = editor();
        editor.set_xml(XML.to_string(), None);

        assert!(editor.update().unwrap().is_none());
        assert_eq!(handle.import_count(), 0);
        assert!(drain(&mut receiver).is_empty());
    }

    #[tokio::test]
    async fn test_import_event_sequence() {
        let (mut editor, _handle, mut receiver) = editor();
        open(&mut editor, XML).await;

        let events = drain(&mut receiver);
        assert!(matches!(events[0], EditorEvent::Import { .. }));
        assert!(matches!(events[1], EditorEvent::Imported(ref r) if r.error.is_none()));
        assert!(matches!(events[2], EditorEvent::Updated(Some(_))));
        assert!(matches!(events[3], EditorEvent::StateUpdated(_)));
        assert!(matches!(events[4], EditorEvent::Shown));
    }

    #[tokio::test]
    async fn test_unchanged_content_is_not_reimported() {
        let (mut editor, handle, mut receiver) = editor();
        open(&mut editor, XML).await;
        drain(&mut receiver);

        assert!(editor.update().unwrap().is_none());
        assert_eq!(handle.import_count(), 1);

        let events = drain(&mut receiver);
        assert!(events.iter().any(|e| matches!(e, EditorEvent::Updated(_))));
        assert!(!events.iter().any(|e| matches!(e, EditorEvent::Import { .. })));
    }

    #[tokio::test]
    async fn test_dirty_follows_stack_index() {
        let (mut editor, handle, _receiver) = editor();
        open(&mut editor, XML).await;
        assert!(!editor.current_state().dirty);

        handle.touch("shape.move").unwrap();
        let state = editor.current_state();
        assert!(state.dirty && state.undo && !state.redo);

        editor.trigger_action(&EditorAction::Undo).unwrap();
        assert!(!editor.current_state().dirty);
        assert!(editor.current_state().redo);
    }

    #[tokio::test]
    async fn test_explicit_dirty_flag() {
        let (mut editor, _handle, _receiver) = editor();
        editor.set_xml(XML.to_string(), Some(InitialState::new(XML, true)));
        editor.mount();
        let pending = editor.update().unwrap().unwrap();
        editor.finish_import(pending.resolve().await);

        assert!(editor.current_state().dirty);
    }

    #[tokio::test]
    async fn test_reimport_marks_dirty() {
        let (mut editor, _handle, _receiver) = editor();
        open(&mut editor, XML).await;

        let changed = XML.replace("task", "userTask");
        editor.set_xml(changed, None);
        let pending = editor.update().unwrap().unwrap();
        editor.finish_import(pending.resolve().await);

        assert!(editor.initial_state().reimported);
        assert!(editor.current_state().dirty);
    }

    #[tokio::test]
    async fn test_save_is_idempotent_without_changes() {
        let (mut editor, handle, mut receiver) = editor();
        open(&mut editor, XML).await;

        let saved = editor.save_xml().await.unwrap();
        assert_eq!(saved, XML);
        assert_eq!(handle.save_count(), 0);

        handle.touch("shape.move").unwrap();
        editor.save_xml().await.unwrap();
        assert_eq!(handle.save_count(), 1);
        assert!(!editor.current_state().dirty);

        editor.save_xml().await.unwrap();
        assert_eq!(handle.save_count(), 1);

        let events = drain(&mut receiver);
        assert_eq!(
            events.iter().filter(|e| matches!(e, EditorEvent::Save)).count(),
            3
        );
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let (mut editor, handle, mut receiver) = editor();
        open(&mut editor, XML).await;
        handle.touch("shape.move").unwrap();
        handle.fail_next_save("serializer crashed");
        drain(&mut receiver);

        let error = editor.save_xml().await.unwrap_err();
        assert_eq!(error, EditorError::save("serializer crashed"));
        assert!(editor.current_state().dirty);

        let events = drain(&mut receiver);
        assert!(events.contains(&EditorEvent::Saved(SaveReport::failure("serializer crashed"))));
    }

    #[tokio::test]
    async fn test_bare_variant_must_override_dispatch() {
        let (mut editor, _handle, _receiver) = editor();
        open(&mut editor, XML).await;

        let error = editor.trigger_action(&EditorAction::ZoomIn).unwrap_err();
        assert!(error.is_needs_override());
        assert!(editor.resize().unwrap_err().is_needs_override());
        assert!(editor.trigger_action(&EditorAction::Redo).is_ok());
    }

    #[tokio::test]
    async fn test_stale_import_is_discarded() {
        let (mut editor, _handle, _receiver) = editor();
        editor.mount();

        editor.set_xml(XML.to_string(), Some(InitialState::new(XML, false)));
        let first = editor.update().unwrap().unwrap();

        let second_xml = r#"<definitions id="second"/>"#;
        editor.set_xml(second_xml.to_string(), None);
        let second = editor.update().unwrap().unwrap();

        let second_outcome = second.resolve().await;
        let first_outcome = first.resolve().await;

        assert!(!editor.finish_import(first_outcome));
        assert!(editor.finish_import(second_outcome));
        assert_eq!(editor.last_import().map(|r| r.xml.as_str()), Some(second_xml));
        assert_eq!(editor.last_xml(), Some(second_xml));
    }

    #[tokio::test]
    async fn test_import_after_destroy_is_discarded() {
        let (mut editor, handle, _receiver) = editor();
        editor.mount();
        editor.set_xml(XML.to_string(), None);
        let pending = editor.update().unwrap().unwrap();

        editor.destroy();
        assert!(handle.is_destroyed());
        assert!(!editor.finish_import(pending.resolve().await));
        assert!(editor.update().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_import_keeps_bookkeeping() {
        let (mut editor, _handle, mut receiver) = editor();
        open(&mut editor, XML).await;
        let before = editor.initial_state().stack_index;
        drain(&mut receiver);

        editor.set_xml("<definitions>".to_string(), None);
        let pending = editor.update().unwrap().unwrap();
        editor.finish_import(pending.resolve().await);

        assert_eq!(editor.initial_state().stack_index, before);
        assert!(!editor.initial_state().importing);
        assert_eq!(editor.last_xml(), Some(XML));

        // the rejected content is tried again on the next update
        editor.set_xml("<definitions>".to_string(), None);
        assert!(editor.update().unwrap().is_some());

        let events = drain(&mut receiver);
        assert!(events
            .iter()
            .any(|e| matches!(e, EditorEvent::Imported(r) if r.is_failure())));
    }

    #[tokio::test]
    async fn test_warnings_are_logged_and_hidden() {
        let (mut editor, _handle, mut receiver) = editor();
        let xml = r#"<definitions><sequenceFlow id="f" sourceRef="a"/></definitions>"#;
        open(&mut editor, xml).await;

        let events = drain(&mut receiver);
        let log = events
            .iter()
            .find_map(|e| match e {
                EditorEvent::Log(entries) => Some(entries.clone()),
                _ => None,
            })
            .expect("warnings should be logged");

        assert_eq!(log[0].message, "Imported BPMN diagram with 1 warning");
        assert_eq!(log[1].message, "> unresolved reference <a> in sourceRef");
        assert_eq!(log[2].message, "");
        assert!(editor.last_import().is_some());

        editor.open_log();
        assert!(editor.last_import().is_none());
        let events = drain(&mut receiver);
        assert_eq!(events[0], EditorEvent::LogToggle { open: true });
        assert_eq!(events[1], EditorEvent::Changed);
    }

    #[tokio::test]
    async fn test_cleared_log_hides_warnings() {
        let (mut editor, _handle, _receiver) = editor();
        open(&mut editor, r#"<definitions><x id="x" targetRef="y"/></definitions>"#).await;
        assert!(editor.last_import().is_some());

        let mut layout = EditorLayout::default();
        layout.log.cleared = true;
        editor.set_layout(layout);
        assert!(editor.last_import().is_none());
    }

    #[tokio::test]
    async fn test_engine_events_drive_state() {
        let (mut editor, handle, mut receiver) = editor();
        open(&mut editor, XML).await;
        drain(&mut receiver);

        handle.select(&["t"]);
        handle.emit_error("renderer failed");
        assert_eq!(editor.pump_engine_events(), 2);

        let events = drain(&mut receiver);
        assert!(events.contains(&EditorEvent::Log(vec![LogEntry::error("renderer failed")])));
        assert!(events.contains(&EditorEvent::LogToggle { open: true }));
        assert!(events.iter().any(|e| matches!(e, EditorEvent::StateUpdated(_))));
    }

    #[tokio::test]
    async fn test_state_updates_ignored_while_importing() {
        let (mut editor, _handle, mut receiver) = editor();
        editor.mount();
        editor.set_xml(XML.to_string(), None);
        let _pending = editor.update().unwrap().unwrap();
        drain(&mut receiver);

        editor.update_state();
        assert!(drain(&mut receiver).is_empty());
    }

    #[test]
    fn test_engine_call_mapping() {
        use modeler_editor_api::Direction;

        assert_eq!(engine_call(&EditorAction::ZoomIn), ("stepZoom", json!({ "value": 1 })));
        assert_eq!(engine_call(&EditorAction::ZoomOut), ("stepZoom", json!({ "value": -1 })));
        assert_eq!(engine_call(&EditorAction::Zoom), ("zoom", json!({ "value": 1 })));
        assert_eq!(
            engine_call(&EditorAction::DistributeVertically),
            ("distributeElements", json!({ "type": "vertical" }))
        );
        assert_eq!(
            engine_call(&EditorAction::MoveCanvas(Direction::Left)),
            ("moveCanvas", json!({ "direction": "left", "speed": 20 }))
        );
        assert_eq!(engine_call(&EditorAction::Find), ("find", json!({})));
    }
}
