//! DMN editor covering both the decision requirements diagram and the
//! decision table view.
//!
//! The engine decides which view is active. Zooming and image export only
//! make sense on the diagram; rule and clause editing only on the table.

use modeler_editor_api::{
    ActiveView, DiagramType, EditorAction, EditorOptions, EditorResult, EngineFactory, EventSink,
    ExportFormat, StateContext,
};

use crate::diagram::{
    dispatch_editor_action, DiagramEditor, DiagramVariant, EngineSnapshot, VariantContext,
};

/// A DMN editor.
pub type DmnEditor = DiagramEditor<Dmn>;

/// DMN specific editor behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dmn;

impl DmnEditor {
    /// Create a DMN editor.
    pub fn dmn(events: EventSink, options: EditorOptions, factory: EngineFactory) -> Self {
        DiagramEditor::new(Dmn, events, options, factory)
    }
}

impl DiagramVariant for Dmn {
    fn diagram_type(&self) -> DiagramType {
        DiagramType::Dmn
    }

    fn build_state(&self, snapshot: &EngineSnapshot) -> StateContext {
        let view = snapshot.view.unwrap_or(ActiveView::Diagram);
        let on_diagram = view == ActiveView::Diagram;

        let state = StateContext {
            dmn: true,
            dirty: snapshot.dirty,
            active_editor: Some(view),
            export_as: on_diagram.then(ExportFormat::images),
            ..StateContext::default()
        };

        if !snapshot.imported {
            return state;
        }

        StateContext {
            undo: snapshot.undo,
            redo: snapshot.redo,
            editable: true,
            zoom: on_diagram,
            elements_selected: on_diagram && snapshot.elements_selected && !snapshot.input_active,
            inactive_input: !snapshot.input_active,
            dmn_rule_editing: !on_diagram && snapshot.table.rule,
            dmn_clause_editing: !on_diagram && snapshot.table.clause,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngineHandle;
    use modeler_editor_api::{Editor, InitialState, TableSelection};

    const XML: &str = r#"<definitions xmlns="http://www.omg.org/spec/DMN/20151101/dmn.xsd" id="dish"><decision id="decision_1"><decisionTable id="table_1"/></decision></definitions>"#;

    async fn opened() -> (DmnEditor, MemoryEngineHandle) {
        let handle = MemoryEngineHandle::new();
        let mut editor = DmnEditor::dmn(
            EventSink::detached("diagram"),
            EditorOptions::default(),
            handle.factory(),
        );

        editor.set_xml(XML.to_string(), Some(InitialState::new(XML, false)));
        editor.mount();
        let pending = editor.update().unwrap().unwrap();
        editor.finish_import(pending.resolve().await);

        (editor, handle)
    }

    #[tokio::test]
    async fn test_diagram_view_state() {
        let (editor, _handle) = opened().await;

        let state = editor.current_state();
        assert!(state.dmn && !state.bpmn);
        assert_eq!(state.active_editor, Some(ActiveView::Diagram));
        assert!(state.zoom);
        assert_eq!(state.export_as, Some(ExportFormat::images()));
        assert!(!state.dmn_rule_editing);
    }

    #[tokio::test]
    async fn test_table_view_state() {
        let (editor, handle) = opened().await;
        handle.set_active_view(ActiveView::Table);
        handle.set_table_selection(TableSelection {
            rule: true,
            clause: false,
        });

        let state = editor.current_state();
        assert_eq!(state.active_editor, Some(ActiveView::Table));
        assert!(!state.zoom);
        assert!(state.export_as.is_none());
        assert!(state.dmn_rule_editing && !state.dmn_clause_editing);
    }

    #[tokio::test]
    async fn test_table_actions_reach_engine() {
        let (mut editor, handle) = opened().await;
        handle.set_active_view(ActiveView::Table);

        editor.trigger_action(&EditorAction::RuleAdd).unwrap();
        editor.trigger_action(&EditorAction::ToggleEditingMode).unwrap();

        let names: Vec<String> = handle.triggered().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["ruleAdd", "toggleEditingMode"]);
    }

    #[test]
    fn test_accepts_only_definitions() {
        let editor = DmnEditor::dmn(
            EventSink::detached("diagram"),
            EditorOptions::default(),
            MemoryEngineHandle::new().factory(),
        );

        assert!(editor.accepts(XML));
        assert!(!editor.accepts("<html/>"));
        assert!(!editor.accepts("<definitions>"));
    }
}
