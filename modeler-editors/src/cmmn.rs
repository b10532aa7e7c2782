//! CMMN case diagram editor.

use modeler_editor_api::{
    DiagramType, EditorAction, EditorOptions, EditorResult, EngineFactory, EventSink,
    ExportFormat, StateContext,
};

use crate::diagram::{
    dispatch_editor_action, DiagramEditor, DiagramVariant, EngineSnapshot, VariantContext,
};

pub type CmmnEditor = DiagramEditor<Cmmn>;

#[derive(Debug, Clone, Copy, Default)]
pub struct Cmmn;

impl CmmnEditor {
    /// Create a CMMN editor.
    pub fn cmmn(events: EventSink, options: EditorOptions, factory: EngineFactory) -> Self {
        DiagramEditor::new(Cmmn, events, options, factory)
    }
}

impl DiagramVariant for Cmmn {
    fn diagram_type(&self) -> DiagramType {
        DiagramType::Cmmn
    }

    fn build_state(&self, snapshot: &EngineSnapshot) -> StateContext {
        let state = StateContext {
            cmmn: true,
            dirty: snapshot.dirty,
            export_as: Some(ExportFormat::images()),
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
            inactive_input: !snapshot.input_active,
            ..state
        }
    }

    fn trigger_editor_action(
        &mut self,
        ctx: &mut VariantContext<'_>,
        action: &EditorAction,
    ) -> EditorResult<()> {
        dispatch_editor_action(ctx, action)
    }

    fn resize(&mut self, ctx: &mut VariantContext<'_>) -> EditorResult<()> {
        ctx.engine.resize()?;
        Ok(())
    }
}
