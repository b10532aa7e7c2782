//! Form editor placeholder.
//!
//! The form builder runs in its own view and does not read the diagram.
//! The editor only takes part in the tab lifecycle: it accepts any content,
//! reports itself editable and searchable, and saves an empty document.

use async_trait::async_trait;
use modeler_editor_api::{
    Editor, EditorAction, EditorEvent, EditorResult, EventSink, ImportReport, InitialState,
    PendingImport, SaveReport, StateContext,
};
use tracing::debug;

pub struct FormEditor {
    events: EventSink,
    mounted: bool,
    last_xml: Option<String>,
    new_xml: Option<String>,
    initial: InitialState,
}

impl FormEditor {
    pub fn new(events: EventSink) -> Self {
        Self {
            events,
            mounted: false,
            last_xml: None,
            new_xml: None,
            initial: InitialState::default(),
        }
    }
}

#[async_trait]
impl Editor for FormEditor {
    fn name(&self) -> &str {
        "form"
    }

    fn id(&self) -> &str {
        self.events.source()
    }

    fn mount(&mut self) {
        self.mounted = true;
    }

    fn unmount(&mut self) {
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

    fn update(&mut self) -> EditorResult<Option<PendingImport>> {
        if !self.mounted {
            debug!("[#update] skipping (not mounted)");
            return Ok(None);
        }

        let xml = self.new_xml.clone().unwrap_or_default();
        let report = ImportReport {
            xml: xml.clone(),
            error: None,
            warnings: Vec::new(),
        };

        self.events.emit(EditorEvent::Imported(report.clone()));
        self.last_xml = Some(xml);
        self.events.emit(EditorEvent::Updated(Some(report)));
        self.update_state();
        self.events.emit(EditorEvent::Shown);

        Ok(None)
    }

    async fn save_xml(&mut self) -> EditorResult<String> {
        debug!("[#saveXML] save");
        self.events.emit(EditorEvent::Save);

        self.last_xml = Some(String::new());
        self.new_xml = Some(String::new());

        self.events.emit(EditorEvent::Saved(SaveReport::success("")));
        Ok(String::new())
    }

    fn trigger_action(&mut self, action: &EditorAction) -> EditorResult<()> {
        debug!("Form editor ignores {}", action);
        Ok(())
    }

    fn update_state(&mut self) {
        let state = self.current_state();
        self.events.emit(EditorEvent::StateUpdated(state));
    }

    fn current_state(&self) -> StateContext {
        StateContext {
            dirty: self.initial.dirty,
            editable: true,
            searchable: true,
            ..StateContext::default()
        }
    }

    fn destroy(&mut self) {
        self.mounted = false;
    }
}
