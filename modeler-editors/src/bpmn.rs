//! BPMN diagram editor.
//!
//! Besides the shared diagram behaviour the BPMN editor owns the properties
//! panel layout and stamps the application name and version into every saved
//! diagram.

use modeler_editor_api::{
    DiagramType, EditorAction, EditorEvent, EditorOptions, EditorResult, EngineFactory,
    EventSink, ExportFormat, PanelLayout, StateContext,
};
use tracing::debug;

use crate::diagram::{
    dispatch_editor_action, DiagramEditor, DiagramVariant, EngineSnapshot, VariantContext,
};

/// Panels narrower than this count as closed.
const MIN_PANEL_WIDTH: u32 = 25;

/// Width used when a collapsed panel is reopened.
const DEFAULT_PANEL_WIDTH: u32 = 250;

/// A BPMN diagram editor.
pub type BpmnEditor = DiagramEditor<Bpmn>;

/// BPMN specific editor behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bpmn;

impl BpmnEditor {
    /// Create a BPMN editor.
    pub fn bpmn(events: EventSink, options: EditorOptions, factory: EngineFactory) -> Self {
        DiagramEditor::new(Bpmn, events, options, factory)
    }
}

/// Properties panel layout after toggling it.
///
/// A panel that is reopened keeps its width unless it was dragged below the
/// minimum, in which case it comes back at the default width.
///
/// # Example
///
/// ```rust
/// use modeler_editor_api::PanelLayout;
/// use modeler_editors::bpmn::toggled_panel;
///
/// let closed = PanelLayout { open: false, width: 10 };
/// assert_eq!(toggled_panel(closed), PanelLayout { open: true, width: 250 });
/// ```
pub fn toggled_panel(panel: PanelLayout) -> PanelLayout {
    let open = !panel.open;
    let width = if open && panel.width <= MIN_PANEL_WIDTH {
        DEFAULT_PANEL_WIDTH
    } else {
        panel.width
    };

    PanelLayout { open, width }
}

/// Properties panel layout after dragging its edge by `delta` pixels.
///
/// Dragging to the right shrinks the panel. A closed panel starts from zero
/// width; the result is open only when wider than the minimum.
pub fn resized_panel(panel: PanelLayout, delta: i32) -> PanelLayout {
    let old_width = if panel.open { i64::from(panel.width) } else { 0 };
    let new_width = (old_width - i64::from(delta)).clamp(0, i64::from(u32::MAX)) as u32;

    PanelLayout {
        open: new_width > MIN_PANEL_WIDTH,
        width: new_width,
    }
}

impl Bpmn {
    fn change_panel(&self, ctx: &mut VariantContext<'_>, panel: PanelLayout) {
        ctx.layout.properties_panel = panel;
        ctx.events.emit(EditorEvent::LayoutChanged(*ctx.layout));
        ctx.notify_engine("propertiesPanel.resized");
    }
}

impl DiagramVariant for Bpmn {
    fn diagram_type(&self) -> DiagramType {
        DiagramType::Bpmn
    }

    fn build_state(&self, snapshot: &EngineSnapshot) -> StateContext {
        let state = StateContext {
            bpmn: true,
            dirty: snapshot.dirty,
            export_as: Some(ExportFormat::all().to_vec()),
            ..StateContext::default()
        };

        if !snapshot.imported {
            return state;
        }

        StateContext {
            undo: snapshot.undo,
            redo: snapshot.redo,
            elements_selected: snapshot.elements_selected && !snapshot.input_active,
            zoom: true,
            editable: true,
            copy: true,
            inactive_input: !snapshot.input_active,
            paste: !snapshot.clipboard_empty,
            ..state
        }
    }

    fn trigger_editor_action(
        &mut self,
        ctx: &mut VariantContext<'_>,
        action: &EditorAction,
    ) -> EditorResult<()> {
        match action {
            EditorAction::ToggleProperties => {
                let panel = toggled_panel(ctx.layout.properties_panel);
                self.change_panel(ctx, panel);
                Ok(())
            }
            EditorAction::ResizeProperties { delta } => {
                let panel = resized_panel(ctx.layout.properties_panel, *delta);
                self.change_panel(ctx, panel);
                Ok(())
            }
            other => dispatch_editor_action(ctx, other),
        }
    }

    fn resize(&mut self, ctx: &mut VariantContext<'_>) -> EditorResult<()> {
        ctx.engine.resize()?;
        Ok(())
    }

    fn on_save(&mut self, ctx: &mut VariantContext<'_>) {
        debug!(
            "Stamping exporter {} {}",
            ctx.metadata.name, ctx.metadata.version
        );
        ctx.engine
            .set_exporter(&ctx.metadata.name, &ctx.metadata.version);
    }
}
