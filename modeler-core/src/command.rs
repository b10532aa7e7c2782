//! Typed commands flowing from menus and the CLI into the application.
//!
//! Every menu item that does something carries an [`AppCommand`]. The
//! application receives them over a tokio channel, so producers never call
//! into tabs or editors directly.

use crate::tab::NewDiagram;
use crate::{Error, Result};
use modeler_editor_api::{EditorAction, ExportFormat};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;

/// Direction for cycling through open tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabDirection {
    Next,
    Previous,
}

impl TabDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabDirection::Next => "next",
            TabDirection::Previous => "previous",
        }
    }
}

/// A command for the application shell.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Open a new tab with a template diagram
    CreateDiagram(NewDiagram),
    /// Ask for files to open
    OpenDiagram,
    /// Open the given files without asking
    OpenFiles(Vec<PathBuf>),
    /// Ask for a war archive to open
    OpenWar,
    ReopenLastTab,
    SelectTab(TabDirection),
    /// Switch the active tab to another of its editors
    ShowEditor(String),
    Save,
    SaveAs,
    SaveAll,
    ExportTab(ExportFormat),
    CloseActiveTab,
    /// Close the tab with the given id, the active one when `None`
    CloseTab(Option<String>),
    CloseAllTabs,
    /// Close every tab except the given one, the active one when `None`
    CloseOtherTabs(Option<String>),
    /// Forward an action to the active editor
    Editor(EditorAction),
    /// A text input gained or lost the keyboard
    InputActive(bool),
    /// Show the context menu of the given kind, for a tab when one is named
    OpenContextMenu {
        kind: String,
        tab_id: Option<String>,
    },
    /// Compare open files with their copies on disk
    CheckFileChanges,
    ShowShortcuts,
    OpenDocumentation,
    Reload,
    ToggleDevTools,
    ToggleFullscreen,
    Quit,
}

impl AppCommand {
    /// Identifier of the command as used in menu definitions.
    ///
    /// Editor actions use the action's own identifier.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::AppCommand;
    /// use modeler_editor_api::{EditorAction, ExportFormat};
    ///
    /// assert_eq!(AppCommand::ExportTab(ExportFormat::Png).id(), "export-tab");
    /// assert_eq!(AppCommand::Editor(EditorAction::ZoomFit).id(), "zoomFit");
    /// ```
    pub fn id(&self) -> &'static str {
        match self {
            AppCommand::CreateDiagram(kind) => kind.command_id(),
            AppCommand::OpenDiagram => "open-diagram",
            AppCommand::OpenFiles(_) => "open-files",
            AppCommand::OpenWar => "open-war",
            AppCommand::ReopenLastTab => "reopen-last-tab",
            AppCommand::SelectTab(_) => "select-tab",
            AppCommand::ShowEditor(_) => "show-editor",
            AppCommand::Save => "save",
            AppCommand::SaveAs => "save-as",
            AppCommand::SaveAll => "save-all",
            AppCommand::ExportTab(_) => "export-tab",
            AppCommand::CloseActiveTab => "close-active-tab",
            AppCommand::CloseTab(_) => "close-tab",
            AppCommand::CloseAllTabs => "close-all-tabs",
            AppCommand::CloseOtherTabs(_) => "close-other-tabs",
            AppCommand::Editor(action) => action.name(),
            AppCommand::InputActive(_) => "input-active",
            AppCommand::OpenContextMenu { .. } => "context-menu",
            AppCommand::CheckFileChanges => "check-file-changes",
            AppCommand::ShowShortcuts => "show-shortcuts",
            AppCommand::OpenDocumentation => "open-documentation",
            AppCommand::Reload => "reload",
            AppCommand::ToggleDevTools => "toggle-devtools",
            AppCommand::ToggleFullscreen => "toggle-fullscreen",
            AppCommand::Quit => "quit",
        }
    }

    /// Options carried alongside the identifier, an empty object if none.
    pub fn options(&self) -> Value {
        match self {
            AppCommand::OpenFiles(paths) => json!({ "paths": paths }),
            AppCommand::SelectTab(direction) => json!({ "direction": direction.as_str() }),
            AppCommand::ShowEditor(id) => json!({ "editor": id }),
            AppCommand::ExportTab(format) => json!({ "type": format.extension() }),
            AppCommand::CloseTab(Some(id)) | AppCommand::CloseOtherTabs(Some(id)) => {
                json!({ "tabId": id })
            }
            AppCommand::Editor(action) => action.options(),
            AppCommand::InputActive(active) => json!({ "active": active }),
            AppCommand::OpenContextMenu { kind, tab_id: Some(id) } => {
                json!({ "type": kind, "tabId": id })
            }
            AppCommand::OpenContextMenu { kind, tab_id: None } => json!({ "type": kind }),
            _ => json!({}),
        }
    }

    /// Parse a command identifier and its options.
    ///
    /// Identifiers that are not application commands are tried as editor
    /// actions.
    ///
    /// # Errors
    ///
    /// Returns an editor error for unknown identifiers or missing options.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::AppCommand;
    /// use modeler_core::tab::NewDiagram;
    /// use serde_json::json;
    ///
    /// let command = AppCommand::parse("create-dmn-table", &json!({})).unwrap();
    /// assert_eq!(command, AppCommand::CreateDiagram(NewDiagram::DmnTable));
    ///
    /// let error = AppCommand::parse("export-tab", &json!({})).unwrap_err();
    /// assert!(error.is_missing_option());
    /// ```
    pub fn parse(id: &str, options: &Value) -> Result<Self> {
        if let Some(kind) = NewDiagram::from_command_id(id) {
            return Ok(AppCommand::CreateDiagram(kind));
        }

        let command = match id {
            "open-diagram" => AppCommand::OpenDiagram,
            "open-files" => AppCommand::OpenFiles(
                options
                    .get("paths")
                    .and_then(|paths| serde_json::from_value(paths.clone()).ok())
                    .ok_or_else(|| missing("paths", id))?,
            ),
            "open-war" => AppCommand::OpenWar,
            "reopen-last-tab" => AppCommand::ReopenLastTab,
            "select-tab" => AppCommand::SelectTab(match str_option(options, "direction") {
                Some("next") => TabDirection::Next,
                Some("previous") => TabDirection::Previous,
                _ => return Err(missing("direction", id)),
            }),
            "show-editor" => AppCommand::ShowEditor(
                str_option(options, "editor")
                    .ok_or_else(|| missing("editor", id))?
                    .to_string(),
            ),
            "save" => AppCommand::Save,
            "save-as" => AppCommand::SaveAs,
            "save-all" => AppCommand::SaveAll,
            "export-tab" => AppCommand::ExportTab(
                str_option(options, "type")
                    .and_then(|format| format.parse().ok())
                    .ok_or_else(|| missing("type", id))?,
            ),
            "close-active-tab" => AppCommand::CloseActiveTab,
            "close-tab" => AppCommand::CloseTab(str_option(options, "tabId").map(str::to_string)),
            "close-all-tabs" => AppCommand::CloseAllTabs,
            "close-other-tabs" => {
                AppCommand::CloseOtherTabs(str_option(options, "tabId").map(str::to_string))
            }
            "input-active" => AppCommand::InputActive(
                options
                    .get("active")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| missing("active", id))?,
            ),
            "context-menu" => AppCommand::OpenContextMenu {
                kind: str_option(options, "type")
                    .ok_or_else(|| missing("type", id))?
                    .to_string(),
                tab_id: str_option(options, "tabId").map(str::to_string),
            },
            "check-file-changes" => AppCommand::CheckFileChanges,
            "show-shortcuts" => AppCommand::ShowShortcuts,
            "open-documentation" => AppCommand::OpenDocumentation,
            "reload" => AppCommand::Reload,
            "toggle-devtools" => AppCommand::ToggleDevTools,
            "toggle-fullscreen" => AppCommand::ToggleFullscreen,
            "quit" => AppCommand::Quit,
            other => AppCommand::Editor(EditorAction::parse(other, options)?),
        };

        Ok(command)
    }
}

impl fmt::Display for AppCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for AppCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let options = self.options();
        let has_options = options.as_object().map_or(false, |o| !o.is_empty());

        let mut map = serializer.serialize_map(Some(if has_options { 2 } else { 1 }))?;
        map.serialize_entry("id", self.id())?;
        if has_options {
            map.serialize_entry("options", &options)?;
        }
        map.end()
    }
}

fn str_option<'a>(options: &'a Value, key: &str) -> Option<&'a str> {
    options.get(key).and_then(Value::as_str)
}

fn missing(option: &str, command: &str) -> Error {
    modeler_editor_api::EditorError::missing_option(option, command).into()
}
