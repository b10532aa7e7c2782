//! # Application and context menus
//!
//! [`MenuBuilder`] turns a [`StateContext`] snapshot plus static
//! [`MenuCapabilities`] into a declarative [`MenuTree`]. Building is pure:
//! the same inputs always give the same tree, item order is fixed by the
//! builder, and only the `enabled` flags and the presence of whole action
//! groups depend on the state. Groups that do not apply to the focused
//! editor are left out, never shown disabled.
//!
//! Trees are installed through a [`NativeMenu`], which always replaces the
//! previously installed tree as a whole.

use crate::command::{AppCommand, TabDirection};
use crate::tab::NewDiagram;
use crate::{Config, Result};
use modeler_editor_api::{
    ActiveView, Alignment, ClauseKind, Direction, EditorAction, ExportFormat, Locale, StateContext,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Where the Help menu's documentation entry points.
pub const DOCUMENTATION_URL: &str =
    "https://docs.camunda.org/manual/latest/modeler/camunda-modeler";

/// Platform role for clipboard items while a text input has the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Cut,
    Copy,
    Paste,
}

/// A clickable menu entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuAction {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accelerator: Option<&'static str>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Command sent when clicked; `None` for informational and role-only items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<AppCommand>,
}

/// A labelled group of menu entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submenu {
    pub label: String,
    pub enabled: bool,
    pub items: Vec<MenuItem>,
}

/// One node of a menu tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MenuItem {
    Action(MenuAction),
    Submenu(Submenu),
    Separator,
}

impl MenuItem {
    pub fn label(&self) -> Option<&str> {
        match self {
            MenuItem::Action(action) => Some(&action.label),
            MenuItem::Submenu(submenu) => Some(&submenu.label),
            MenuItem::Separator => None,
        }
    }
}

/// An ordered menu tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MenuTree {
    pub items: Vec<MenuItem>,
}

impl MenuTree {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Top-level submenu with the given label.
    pub fn submenu(&self, label: &str) -> Option<&Submenu> {
        self.items.iter().find_map(|item| match item {
            MenuItem::Submenu(submenu) if submenu.label == label => Some(submenu),
            _ => None,
        })
    }

    /// Follow a path of labels through nested submenus.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::menu::{MenuBuilder, MenuCapabilities};
    /// use modeler_editor_api::{Locale, StateContext};
    ///
    /// let locale = Locale::default();
    /// let capabilities = MenuCapabilities::default();
    /// let state = StateContext::default();
    /// let menu = MenuBuilder::new(&capabilities, &state, &locale).build();
    ///
    /// let item = menu.find(&["File", "New File", "BPMN Diagram"]).unwrap();
    /// assert_eq!(item.label(), Some("BPMN Diagram"));
    /// ```
    pub fn find(&self, path: &[&str]) -> Option<&MenuItem> {
        let (last, parents) = path.split_last()?;
        let mut items = &self.items;

        for label in parents {
            items = items.iter().find_map(|item| match item {
                MenuItem::Submenu(submenu) if submenu.label == *label => Some(&submenu.items),
                _ => None,
            })?;
        }

        items.iter().find(|item| item.label() == Some(*last))
    }

    /// Every action in the tree, depth first.
    pub fn actions(&self) -> Vec<&MenuAction> {
        fn collect<'a>(items: &'a [MenuItem], out: &mut Vec<&'a MenuAction>) {
            for item in items {
                match item {
                    MenuItem::Action(action) => out.push(action),
                    MenuItem::Submenu(submenu) => collect(&submenu.items, out),
                    MenuItem::Separator => {}
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.items, &mut out);
        out
    }

    /// First action sending the given command.
    pub fn find_command(&self, command: &AppCommand) -> Option<&MenuAction> {
        self.actions()
            .into_iter()
            .find(|action| action.command.as_ref() == Some(command))
    }
}

/// Static flags that do not come from the focused editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCapabilities {
    /// Development mode shows the Reload item
    pub development: bool,
    /// Developer tools are open, also shows Reload
    pub devtools: bool,
    /// A main window exists to host the Window menu
    pub has_window: bool,
    /// Version shown in the Help menu
    pub version: String,
}

impl Default for MenuCapabilities {
    fn default() -> Self {
        Self {
            development: false,
            devtools: false,
            has_window: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl MenuCapabilities {
    pub fn from_config(config: &Config) -> Self {
        Self {
            development: config.app.development,
            version: config.app.version.clone(),
            ..Self::default()
        }
    }
}

/// Builds menu trees from a state snapshot.
///
/// # Example
///
/// ```rust
/// use modeler_core::menu::{MenuBuilder, MenuCapabilities};
/// use modeler_editor_api::{Locale, StateContext};
///
/// let locale = Locale::default();
/// let capabilities = MenuCapabilities::default();
/// let state = StateContext { bpmn: true, editable: true, undo: true, ..StateContext::default() };
///
/// let menu = MenuBuilder::new(&capabilities, &state, &locale).build();
/// let labels: Vec<&str> = menu.items.iter().filter_map(|item| item.label()).collect();
/// assert_eq!(labels, vec!["File", "Edit", "Window", "Help"]);
/// ```
pub struct MenuBuilder<'a> {
    capabilities: &'a MenuCapabilities,
    state: &'a StateContext,
    locale: &'a Locale,
    items: Vec<MenuItem>,
}

impl<'a> MenuBuilder<'a> {
    pub fn new(
        capabilities: &'a MenuCapabilities,
        state: &'a StateContext,
        locale: &'a Locale,
    ) -> Self {
        Self {
            capabilities,
            state,
            locale,
            items: Vec::new(),
        }
    }

    /// The application menu: File, Edit, Window and Help.
    pub fn build(mut self) -> MenuTree {
        let mut file = self.child();
        file.append_new_file()
            .append_open()
            .append_separator()
            .append_switch_tab()
            .append_save_file()
            .append_save_as_file()
            .append_save_all_files()
            .append_separator()
            .append_export_as()
            .append_close_tab()
            .append_separator()
            .append_quit();
        self.push_submenu("file", true, file.items);

        self.append_edit_menu().append_window_menu().append_help_menu();

        debug!("Built menu with {} top-level entries", self.items.len());
        MenuTree { items: self.items }
    }

    /// A context menu by kind, `None` for unknown kinds.
    ///
    /// `bpmn` offers the clipboard items; `tab` offers new files, closing
    /// tabs relative to `tab_id` and reopening the last closed tab.
    pub fn build_context_menu(mut self, kind: &str, tab_id: Option<&str>) -> Option<MenuTree> {
        match kind {
            "bpmn" => {
                self.append_copy_paste();
            }
            "tab" => {
                self.append_new_file()
                    .append_separator()
                    .append_context_close_tab(tab_id)
                    .append_separator()
                    .append_reopen_last_tab();
            }
            _ => return None,
        }

        Some(MenuTree { items: self.items })
    }

    fn child(&self) -> Self {
        Self::new(self.capabilities, self.state, self.locale)
    }

    fn t(&self, key: &str) -> String {
        self.locale.t(&format!("menu.{}", key))
    }

    fn typed(&self, key: &str, tag: &str) -> String {
        self.locale.t_with(&format!("menu.{}", key), &[("type", tag)])
    }

    fn push(
        &mut self,
        key: &str,
        accelerator: Option<&'static str>,
        enabled: bool,
        command: AppCommand,
    ) -> &mut Self {
        let label = self.t(key);
        self.push_label(label, accelerator, enabled, command)
    }

    fn push_label(
        &mut self,
        label: String,
        accelerator: Option<&'static str>,
        enabled: bool,
        command: AppCommand,
    ) -> &mut Self {
        self.items.push(MenuItem::Action(MenuAction {
            label,
            accelerator,
            enabled,
            role: None,
            command: Some(command),
        }));
        self
    }

    fn push_editor(
        &mut self,
        key: &str,
        accelerator: Option<&'static str>,
        enabled: bool,
        action: EditorAction,
    ) -> &mut Self {
        self.push(key, accelerator, enabled, AppCommand::Editor(action))
    }

    fn push_submenu(&mut self, key: &str, enabled: bool, items: Vec<MenuItem>) -> &mut Self {
        let label = self.t(key);
        self.items.push(MenuItem::Submenu(Submenu { label, enabled, items }));
        self
    }

    fn append_separator(&mut self) -> &mut Self {
        self.items.push(MenuItem::Separator);
        self
    }

    fn append_new_file(&mut self) -> &mut Self {
        let templates = [
            ("typed_diagram", "BPMN", Some("CommandOrControl+T"), NewDiagram::Bpmn),
            ("typed_table", "DMN", None, NewDiagram::DmnTable),
            ("typed_diagram", "DMN", None, NewDiagram::DmnDiagram),
            ("typed_diagram", "CMMN", None, NewDiagram::Cmmn),
        ];

        let mut submenu = self.child();
        for (key, tag, accelerator, template) in templates {
            let label = self.typed(key, tag);
            submenu.push_label(label, accelerator, true, AppCommand::CreateDiagram(template));
        }

        self.push_submenu("new_file", true, submenu.items)
    }

    fn append_open(&mut self) -> &mut Self {
        self.push("open_file", Some("CommandOrControl+O"), true, AppCommand::OpenDiagram)
            .push("open_war_file", Some("CommandOrControl+Shift+O"), true, AppCommand::OpenWar)
    }

    fn append_reopen_last_tab(&mut self) -> &mut Self {
        self.push(
            "reopen_last_file",
            Some("CommandOrControl+Shift+T"),
            true,
            AppCommand::ReopenLastTab,
        )
    }

    fn append_save_file(&mut self) -> &mut Self {
        self.push("save_file", Some("CommandOrControl+S"), self.state.save, AppCommand::Save)
    }

    fn append_save_as_file(&mut self) -> &mut Self {
        let save = self.state.save;
        self.push("save_file_as", Some("CommandOrControl+Shift+S"), save, AppCommand::SaveAs)
    }

    fn append_save_all_files(&mut self) -> &mut Self {
        let save = self.state.save;
        self.push("save_all_files", Some("CommandOrControl+Alt+S"), save, AppCommand::SaveAll)
    }

    fn append_export_as(&mut self) -> &mut Self {
        let mut submenu = self.child();
        for format in ExportFormat::all() {
            let label = match format {
                ExportFormat::War => self.t("war"),
                image => self.typed("typed_image", &image.extension().to_ascii_uppercase()),
            };
            let enabled = self.state.can_export(format);
            submenu.push_label(label, None, enabled, AppCommand::ExportTab(format));
        }

        self.push_submenu("export_as", true, submenu.items)
            .append_separator()
    }

    fn append_close_tab(&mut self) -> &mut Self {
        let closable = self.state.closable;
        self.push("close_tab", Some("CommandOrControl+W"), closable, AppCommand::CloseActiveTab)
            .push("close_all_tabs", None, closable, AppCommand::CloseAllTabs)
            .push("close_other_tabs", None, closable, AppCommand::CloseOtherTabs(None))
    }

    fn append_context_close_tab(&mut self, tab_id: Option<&str>) -> &mut Self {
        let closable = self.state.closable;
        let tab_id = tab_id.map(str::to_string);
        let close = AppCommand::CloseTab(tab_id.clone());
        self.push("close_tab", Some("CommandOrControl+W"), closable, close)
            .push("close_all_tabs", None, closable, AppCommand::CloseAllTabs)
            .push("close_other_tabs", None, closable, AppCommand::CloseOtherTabs(tab_id))
    }

    fn append_switch_tab(&mut self) -> &mut Self {
        let closable = self.state.closable;
        let mut submenu = self.child();
        submenu
            .push(
                "select_next_tab",
                Some("Control+Tab"),
                closable,
                AppCommand::SelectTab(TabDirection::Next),
            )
            .push(
                "select_previous_tab",
                Some("Control+Shift+Tab"),
                closable,
                AppCommand::SelectTab(TabDirection::Previous),
            );

        self.push_submenu("switch_tab", true, submenu.items)
            .append_separator()
    }

    fn append_quit(&mut self) -> &mut Self {
        self.push("quit", Some("CommandOrControl+Q"), true, AppCommand::Quit)
    }

    fn append_undo_redo(&mut self) -> &mut Self {
        let (undo, redo) = (self.state.undo, self.state.redo);
        self.push_editor("undo", Some("CommandOrControl+Z"), undo, EditorAction::Undo)
            .push_editor("redo", Some("CommandOrControl+Y"), redo, EditorAction::Redo)
    }

    /// Clipboard items. While a text input has the keyboard they become
    /// platform roles and Cut is added.
    fn append_copy_paste(&mut self) -> &mut Self {
        let state = self.state;
        let input_active = !state.inactive_input;
        let role = |role: Role| input_active.then_some(role);

        let (cut, copy, paste) = (self.t("cut"), self.t("copy"), self.t("paste"));

        if input_active {
            self.items.push(MenuItem::Action(MenuAction {
                label: cut,
                accelerator: Some("CommandOrControl+X"),
                enabled: true,
                role: Some(Role::Cut),
                command: None,
            }));
        }

        self.items.push(MenuItem::Action(MenuAction {
            label: copy,
            accelerator: Some("CommandOrControl+C"),
            enabled: input_active || (state.elements_selected && state.copy),
            role: role(Role::Copy),
            command: Some(AppCommand::Editor(EditorAction::Copy)),
        }));

        self.items.push(MenuItem::Action(MenuAction {
            label: paste,
            accelerator: Some("CommandOrControl+V"),
            enabled: input_active || state.paste,
            role: role(Role::Paste),
            command: Some(AppCommand::Editor(EditorAction::Paste)),
        }));

        self
    }

    fn append_base_edit_actions(&mut self) -> &mut Self {
        self.append_undo_redo().append_separator().append_copy_paste()
    }

    fn append_modeling_tools(&mut self) -> &mut Self {
        let inactive = self.state.inactive_input;
        self.push_editor("hand_tool", Some("H"), inactive, EditorAction::HandTool)
            .push_editor("lasso_tool", Some("L"), inactive, EditorAction::LassoTool)
            .push_editor("space_tool", Some("S"), inactive, EditorAction::SpaceTool)
            .push_editor(
                "global_connect_tool",
                Some("C"),
                inactive,
                EditorAction::GlobalConnectTool,
            )
            .append_edit_label()
    }

    fn append_edit_label(&mut self) -> &mut Self {
        let selected = self.state.elements_selected;
        self.push_editor("edit_label", Some("E"), selected, EditorAction::DirectEditing)
    }

    fn append_find(&mut self) -> &mut Self {
        self.push_editor("find", Some("CommandOrControl+F"), true, EditorAction::Find)
    }

    fn append_move_canvas(&mut self) -> &mut Self {
        let mut submenu = self.child();
        for direction in Direction::all() {
            let (key, accelerator) = match direction {
                Direction::Up => ("move_up", "Up"),
                Direction::Left => ("move_left", "Left"),
                Direction::Down => ("move_down", "Down"),
                Direction::Right => ("move_right", "Right"),
            };
            submenu.push_editor(key, Some(accelerator), true, EditorAction::MoveCanvas(direction));
        }

        self.push_submenu("move_canvas", true, submenu.items)
    }

    fn append_select_all(&mut self) -> &mut Self {
        self.push_editor(
            "select_all",
            Some("CommandOrControl+A"),
            true,
            EditorAction::SelectElements,
        )
    }

    fn append_remove_selection(&mut self) -> &mut Self {
        let selected = self.state.elements_selected;
        self.push_editor("remove_selected", Some("Delete"), selected, EditorAction::RemoveSelection)
    }

    fn append_bpmn_actions(&mut self) -> &mut Self {
        let selected = self.state.elements_selected;

        let mut align = self.child();
        for alignment in Alignment::all() {
            let key = format!("align_{}", alignment.as_str());
            align.push_editor(&key, None, true, EditorAction::AlignElements(alignment));
        }

        let mut distribute = self.child();
        distribute
            .push_editor(
                "distribute_horizontally",
                None,
                selected,
                EditorAction::DistributeHorizontally,
            )
            .push_editor(
                "distribute_vertically",
                None,
                selected,
                EditorAction::DistributeVertically,
            );

        self.append_modeling_tools()
            .append_separator()
            .push_submenu("align_elements", selected, align.items)
            .push_submenu("distribute_elements", selected, distribute.items)
            .append_separator()
            .append_find()
            .append_separator()
            .push_editor(
                "move_to_origin",
                Some("CommandOrControl+Shift+0"),
                true,
                EditorAction::MoveToOrigin,
            )
            .append_move_canvas()
            .append_select_all()
            .append_remove_selection()
    }

    fn append_cmmn_actions(&mut self) -> &mut Self {
        self.append_modeling_tools()
            .append_separator()
            .append_find()
            .append_separator()
            .append_move_canvas()
            .append_select_all()
            .append_remove_selection()
    }

    fn append_dmn_actions(&mut self) -> &mut Self {
        match self.state.active_editor {
            Some(ActiveView::Diagram) => self.append_dmn_diagram_actions(),
            Some(ActiveView::Table) => self.append_dmn_table_actions(),
            None => self,
        }
    }

    fn append_dmn_diagram_actions(&mut self) -> &mut Self {
        let inactive = self.state.inactive_input;
        self.append_separator()
            .push_editor("lasso_tool", Some("L"), inactive, EditorAction::LassoTool)
            .append_edit_label()
            .append_separator()
            .append_select_all()
            .append_remove_selection()
    }

    fn append_dmn_table_actions(&mut self) -> &mut Self {
        let rule = self.state.dmn_rule_editing;
        let clause = self.state.dmn_clause_editing;

        let mut add_rule = self.child();
        add_rule
            .push_editor("at_end", Some("CommandOrControl+D"), true, EditorAction::RuleAdd)
            .push_editor("above_selected", None, rule, EditorAction::RuleAddAbove)
            .push_editor("below_selected", None, rule, EditorAction::RuleAddBelow);

        let mut add_clause = self.child();
        add_clause
            .push_editor("input", None, true, EditorAction::ClauseAdd(ClauseKind::Input))
            .push_editor("output", None, true, EditorAction::ClauseAdd(ClauseKind::Output))
            .append_separator()
            .push_editor("left_of_selected", None, clause, EditorAction::ClauseAddLeft)
            .push_editor("right_of_selected", None, clause, EditorAction::ClauseAddRight);

        self.append_separator()
            .push_submenu("add_rule", true, add_rule.items)
            .push_editor("clear_rule", None, rule, EditorAction::RuleClear)
            .push_editor("remove_rule", None, rule, EditorAction::RuleRemove)
            .append_separator()
            .push_submenu("add_clause", true, add_clause.items)
            .push_editor("remove_clause", None, clause, EditorAction::ClauseRemove)
            .append_separator()
            .push_editor(
                "insert_new_line",
                Some("CommandOrControl+Enter"),
                rule,
                EditorAction::InsertNewLine,
            )
            .push_editor("select_next_row", Some("Enter"), rule, EditorAction::SelectNextRow)
            .push_editor(
                "select_previous_row",
                Some("Shift+Enter"),
                rule,
                EditorAction::SelectPreviousRow,
            )
            .append_separator()
            .push_editor(
                "toggle_editing_mode",
                Some("CommandOrControl+M"),
                true,
                EditorAction::ToggleEditingMode,
            )
    }

    fn append_search_actions(&mut self) -> &mut Self {
        self.append_find()
            .push_editor(
                "find_next",
                Some("Shift+CommandOrControl+N"),
                true,
                EditorAction::FindNext,
            )
            .push_editor(
                "find_previous",
                Some("Shift+CommandOrControl+P"),
                true,
                EditorAction::FindPrev,
            )
            .push_editor("replace", Some("Shift+CommandOrControl+F"), true, EditorAction::Replace)
    }

    fn append_edit_menu(&mut self) -> &mut Self {
        let state = self.state;
        if !state.editable {
            return self;
        }

        let mut edit = self.child();
        edit.append_base_edit_actions();

        if state.bpmn {
            edit.append_separator().append_bpmn_actions();
        }

        if state.dmn {
            edit.append_dmn_actions();
        }

        if state.cmmn {
            edit.append_separator().append_cmmn_actions();
        }

        if state.searchable {
            edit.append_separator().append_search_actions();
        }

        self.push_submenu("edit", true, edit.items)
    }

    fn append_window_menu(&mut self) -> &mut Self {
        if !self.capabilities.has_window {
            return self;
        }

        let mut window = self.child();

        if self.state.zoom {
            window
                .push_editor("zoom_in", Some("CommandOrControl+="), true, EditorAction::ZoomIn)
                .push_editor("zoom_out", Some("CommandOrControl+-"), true, EditorAction::ZoomOut)
                .push_editor(
                    "zoom_actual_size",
                    Some("CommandOrControl+0"),
                    true,
                    EditorAction::Zoom,
                )
                .push_editor("zoom_fit", Some("CommandOrControl+1"), true, EditorAction::ZoomFit)
                .append_separator();
        }

        if self.capabilities.development || self.capabilities.devtools {
            window.push("reload", Some("CommandOrControl+R"), true, AppCommand::Reload);
        }

        window
            .push("toggle_devtools", Some("F12"), true, AppCommand::ToggleDevTools)
            .push("fullscreen", Some("F11"), true, AppCommand::ToggleFullscreen);

        self.push_submenu("window", true, window.items)
    }

    fn append_help_menu(&mut self) -> &mut Self {
        let mut help = self.child();
        help.push("documentation", None, true, AppCommand::OpenDocumentation)
            .push("keyboard_shortcuts", None, true, AppCommand::ShowShortcuts)
            .append_separator();

        help.items.push(MenuItem::Action(MenuAction {
            label: self
                .locale
                .t_with("menu.version", &[("version", self.capabilities.version.as_str())]),
            accelerator: None,
            enabled: false,
            role: None,
            command: None,
        }));

        self.push_submenu("help", true, help.items)
    }
}

/// Host that displays menu trees.
///
/// Installing a tree replaces whatever was installed before.
pub trait NativeMenu: Send {
    /// Install the application menu.
    fn install(&mut self, menu: &MenuTree) -> Result<()>;

    /// Show a context menu at the pointer.
    fn popup(&mut self, menu: &MenuTree) -> Result<()>;
}

#[derive(Debug, Default)]
struct HeadlessMenuState {
    installed: Option<MenuTree>,
    installs: usize,
    popups: Vec<MenuTree>,
}

/// [`NativeMenu`] that only remembers what it was given.
///
/// Clones share the same record, so a test can keep one clone while the
/// application owns another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessMenu {
    state: Arc<Mutex<HeadlessMenuState>>,
}

impl HeadlessMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently installed application menu.
    pub fn installed(&self) -> Option<MenuTree> {
        self.lock().installed.clone()
    }

    /// How many times a menu was installed.
    pub fn install_count(&self) -> usize {
        self.lock().installs
    }

    /// Context menus shown so far.
    pub fn popups(&self) -> Vec<MenuTree> {
        self.lock().popups.clone()
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessMenuState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NativeMenu for HeadlessMenu {
    fn install(&mut self, menu: &MenuTree) -> Result<()> {
        let mut state = self.lock();
        state.installed = Some(menu.clone());
        state.installs += 1;
        Ok(())
    }

    fn popup(&mut self, menu: &MenuTree) -> Result<()> {
        self.lock().popups.push(menu.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeler_editor_api::Language;
    use std::collections::HashSet;

    fn build(state: &StateContext) -> MenuTree {
        let locale = Locale::default();
        let capabilities = MenuCapabilities::default();
        MenuBuilder::new(&capabilities, state, &locale).build()
    }

    fn commands(menu: &MenuTree, top: &str) -> HashSet<String> {
        let submenu = menu.submenu(top).map(|s| s.items.clone()).unwrap_or_default();
        MenuTree { items: submenu }
            .actions()
            .into_iter()
            .filter_map(|action| action.command.as_ref())
            .map(|command| serde_json::to_string(command).unwrap())
            .collect()
    }

    fn enabled(menu: &MenuTree, path: &[&str]) -> bool {
        match menu.find(path) {
            Some(MenuItem::Action(action)) => action.enabled,
            Some(MenuItem::Submenu(submenu)) => submenu.enabled,
            _ => panic!("no menu item at {:?}", path),
        }
    }

    fn bpmn_state() -> StateContext {
        StateContext {
            bpmn: true,
            editable: true,
            undo: true,
            zoom: true,
            inactive_input: true,
            export_as: Some(ExportFormat::all().to_vec()),
            ..StateContext::default()
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let state = bpmn_state();
        let first = build(&state);
        let second = build(&state);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_file_menu_follows_state() {
        let mut state = bpmn_state();
        let menu = build(&state);
        assert!(!enabled(&menu, &["File", "Save File"]));
        assert!(!enabled(&menu, &["File", "Close Tab"]));
        assert!(enabled(&menu, &["File", "Export As", "War"]));

        state.save = true;
        state.closable = true;
        state.export_as = Some(ExportFormat::images());
        let menu = build(&state);
        assert!(enabled(&menu, &["File", "Save All Files"]));
        assert!(enabled(&menu, &["File", "Switch Tab...", "Select Next Tab"]));
        assert!(enabled(&menu, &["File", "Export As", "PNG Image"]));
        assert!(!enabled(&menu, &["File", "Export As", "War"]));
    }

    #[test]
    fn test_edit_menu_requires_editable() {
        let state = StateContext {
            bpmn: true,
            ..StateContext::default()
        };
        let menu = build(&state);

        assert!(menu.submenu("Edit").is_none());
        assert!(menu.submenu("File").is_some());
    }

    #[test]
    fn test_bpmn_state_omits_other_groups() {
        let menu = build(&bpmn_state());
        let edit = commands(&menu, "Edit");

        let rule_add = serde_json::to_string(&AppCommand::Editor(EditorAction::RuleAdd)).unwrap();
        let find_next = serde_json::to_string(&AppCommand::Editor(EditorAction::FindNext)).unwrap();
        let hand_tool = serde_json::to_string(&AppCommand::Editor(EditorAction::HandTool)).unwrap();
        let origin =
            serde_json::to_string(&AppCommand::Editor(EditorAction::MoveToOrigin)).unwrap();

        assert!(edit.contains(&hand_tool));
        assert!(edit.contains(&origin));
        assert!(!edit.contains(&rule_add));
        assert!(!edit.contains(&find_next));
        assert!(menu.find(&["Edit", "Add Rule..."]).is_none());
        assert!(menu.find(&["Edit", "Insert New Line"]).is_none());
    }

    #[test]
    fn test_dmn_views_have_disjoint_actions() {
        let base = StateContext {
            editable: true,
            inactive_input: true,
            ..StateContext::default()
        };
        let base_commands = commands(&build(&base), "Edit");

        let view_commands = |view| {
            let state = StateContext {
                dmn: true,
                active_editor: Some(view),
                ..base.clone()
            };
            &commands(&build(&state), "Edit") - &base_commands
        };

        let diagram = view_commands(ActiveView::Diagram);
        let table = view_commands(ActiveView::Table);

        assert!(!diagram.is_empty());
        assert!(!table.is_empty());
        assert!(diagram.is_disjoint(&table));
    }

    #[test]
    fn test_dmn_table_flags() {
        let state = StateContext {
            dmn: true,
            editable: true,
            active_editor: Some(ActiveView::Table),
            dmn_rule_editing: true,
            ..StateContext::default()
        };
        let menu = build(&state);

        assert!(enabled(&menu, &["Edit", "Add Rule...", "Above Selected"]));
        assert!(enabled(&menu, &["Edit", "Clear Rule"]));
        assert!(!enabled(&menu, &["Edit", "Remove Clause"]));
        assert!(!enabled(&menu, &["Edit", "Add Clause...", "Left of selected"]));
        assert!(enabled(&menu, &["Edit", "Add Clause...", "Input"]));
        assert!(menu.find(&["Edit", "Lasso Tool"]).is_none());
    }

    #[test]
    fn test_copy_paste_roles() {
        let mut state = bpmn_state();
        let menu = build(&state);
        assert!(menu.find(&["Edit", "Cut"]).is_none());
        assert!(!enabled(&menu, &["Edit", "Copy"]));
        assert!(!enabled(&menu, &["Edit", "Paste"]));

        state.elements_selected = true;
        state.copy = true;
        state.paste = true;
        let menu = build(&state);
        assert!(enabled(&menu, &["Edit", "Copy"]));
        assert!(enabled(&menu, &["Edit", "Paste"]));

        state.inactive_input = false;
        let menu = build(&state);
        match menu.find(&["Edit", "Cut"]) {
            Some(MenuItem::Action(cut)) => {
                assert_eq!(cut.role, Some(Role::Cut));
                assert!(cut.command.is_none());
            }
            other => panic!("expected cut action, got {:?}", other),
        }
        match menu.find(&["Edit", "Copy"]) {
            Some(MenuItem::Action(copy)) => assert_eq!(copy.role, Some(Role::Copy)),
            other => panic!("expected copy action, got {:?}", other),
        }
        assert!(!enabled(&menu, &["Edit", "Hand Tool"]));
    }

    #[test]
    fn test_search_group() {
        let state = StateContext {
            editable: true,
            searchable: true,
            ..StateContext::default()
        };
        let menu = build(&state);
        assert!(menu.find(&["Edit", "Find Next"]).is_some());
        assert!(menu.find(&["Edit", "Replace"]).is_some());
        assert!(menu.find(&["Edit", "Hand Tool"]).is_none());
    }

    #[test]
    fn test_window_menu() {
        let locale = Locale::default();
        let state = StateContext::default();
        let mut capabilities = MenuCapabilities::default();

        let menu = MenuBuilder::new(&capabilities, &state, &locale).build();
        assert!(menu.find(&["Window", "Zoom In"]).is_none());
        assert!(menu.find(&["Window", "Reload"]).is_none());
        assert!(menu.find(&["Window", "Fullscreen"]).is_some());

        capabilities.development = true;
        let zoomable = StateContext {
            zoom: true,
            ..StateContext::default()
        };
        let menu = MenuBuilder::new(&capabilities, &zoomable, &locale).build();
        assert!(menu.find(&["Window", "Zoom to Fit Diagram"]).is_some());
        assert!(menu.find(&["Window", "Reload"]).is_some());

        capabilities.has_window = false;
        let menu = MenuBuilder::new(&capabilities, &state, &locale).build();
        assert!(menu.submenu("Window").is_none());
    }

    #[test]
    fn test_help_menu_shows_version() {
        let locale = Locale::default();
        let state = StateContext::default();
        let capabilities = MenuCapabilities {
            version: "3.1.0".to_string(),
            ..MenuCapabilities::default()
        };

        let menu = MenuBuilder::new(&capabilities, &state, &locale).build();
        assert!(!enabled(&menu, &["Help", "Version 3.1.0"]));
        assert!(menu.find_command(&AppCommand::OpenDocumentation).is_some());
    }

    #[test]
    fn test_context_menus() {
        let locale = Locale::default();
        let capabilities = MenuCapabilities::default();
        let state = StateContext {
            closable: true,
            inactive_input: true,
            ..StateContext::default()
        };

        let bpmn = MenuBuilder::new(&capabilities, &state, &locale)
            .build_context_menu("bpmn", None)
            .unwrap();
        let labels: Vec<&str> = bpmn.items.iter().filter_map(|item| item.label()).collect();
        assert_eq!(labels, vec!["Copy", "Paste"]);

        let tab = MenuBuilder::new(&capabilities, &state, &locale)
            .build_context_menu("tab", Some("tab-7"))
            .unwrap();
        let close = tab
            .find_command(&AppCommand::CloseTab(Some("tab-7".to_string())))
            .unwrap();
        assert!(close.enabled);
        assert!(tab.find_command(&AppCommand::ReopenLastTab).is_some());
        assert!(tab.find(&["New File", "DMN Table"]).is_some());

        assert!(MenuBuilder::new(&capabilities, &state, &locale)
            .build_context_menu("dmn", None)
            .is_none());
    }

    #[test]
    fn test_labels_are_localized() {
        let locale = Locale::new(Language::Ru);
        let capabilities = MenuCapabilities::default();
        let state = bpmn_state();
        let menu = MenuBuilder::new(&capabilities, &state, &locale).build();

        assert_ne!(menu.items[0].label(), Some("File"));
        assert_eq!(menu.items[0].label().map(str::to_string), Some(locale.t("menu.file")));
    }

    #[test]
    fn test_headless_menu_replaces_tree() {
        let menu = HeadlessMenu::new();
        let mut host: Box<dyn NativeMenu> = Box::new(menu.clone());

        host.install(&build(&StateContext::default())).unwrap();
        host.install(&build(&bpmn_state())).unwrap();

        assert_eq!(menu.install_count(), 2);
        assert!(menu.installed().unwrap().submenu("Edit").is_some());
    }
}
