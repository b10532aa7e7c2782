//! # Modeler Core Application Module
//!
//! The [`Application`] owns the open tabs and everything around them: the
//! menu host, the dialog helper and the exporter. It is driven by
//! [`AppCommand`]s arriving over a tokio channel and rebuilds the whole
//! application menu after every command, so the menu always reflects the
//! focused editor's latest [`StateContext`].

use crate::command::{AppCommand, TabDirection};
use crate::config::Config;
use crate::dialog::{Dialog, DialogAnswer, DialogKind, DialogOptions, NativeDialogs};
use crate::export::{read_war, Exporter, ImageRenderer};
use crate::menu::{MenuBuilder, MenuCapabilities, MenuTree, NativeMenu, DOCUMENTATION_URL};
use crate::tab::{DiagramFile, MultiEditorTab};
use crate::{Error, Result};
use modeler_editor_api::{
    DiagramType, EditorEvent, EditorLayout, EditorMessage, EditorOptions, EngineFactory,
    ExportFormat, Locale, LogEntry, LogLevel, StateContext,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Capacity of the command channel returned by [`command_channel`].
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

const ACTIVITI_NAMESPACE: &str = "http://activiti.org/bpmn";
const CAMUNDA_NAMESPACE: &str = "http://camunda.org/schema/1.0/bpmn";
const DMN11_NAMESPACE: &str = "http://www.omg.org/spec/DMN/20151101/dmn11.xsd";
const DMN_NAMESPACE: &str = "http://www.omg.org/spec/DMN/20151101/dmn.xsd";

/// Rename a namespace prefix on element names, attribute names and its
/// `xmlns` declaration. Text and attribute values are left alone.
fn rename_prefix(xml: &str, from: &str, to: &str) -> Result<String> {
    let from = regex::escape(from);
    let rules = [
        (format!(r"(</?){}:", from), format!("${{1}}{}:", to)),
        (
            format!(r#"(\s){}:([\w.-]+\s*=\s*["'])"#, from),
            format!("${{1}}{}:${{2}}", to),
        ),
        (format!(r"(\s)xmlns:{}(\s*=)", from), format!("${{1}}xmlns:{}${{2}}", to)),
    ];

    let mut renamed = xml.to_string();
    for (pattern, replacement) in &rules {
        let regex = Regex::new(pattern).map_err(|e| Error::generic(e.to_string()))?;
        renamed = regex.replace_all(&renamed, replacement.as_str()).into_owned();
    }

    Ok(renamed)
}

/// Create the channel commands reach the application through.
pub fn command_channel() -> (mpsc::Sender<AppCommand>, mpsc::Receiver<AppCommand>) {
    mpsc::channel(COMMAND_CHANNEL_CAPACITY)
}

/// Application shell hosting diagram tabs.
///
/// # Example
///
/// ```rust
/// use modeler_core::dialog::HeadlessDialogs;
/// use modeler_core::menu::HeadlessMenu;
/// use modeler_core::tab::NewDiagram;
/// use modeler_core::{AppCommand, Application, Config};
/// use modeler_editors::MemoryEngine;
///
/// # tokio_test::block_on(async {
/// let menu = HeadlessMenu::new();
/// let mut app = Application::new(
///     Config::default(),
///     MemoryEngine::factory(),
///     Box::new(HeadlessDialogs::new()),
///     Box::new(menu.clone()),
/// )?;
/// app.initialize()?;
///
/// app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await;
/// assert_eq!(app.tabs().len(), 1);
/// assert!(menu.installed().unwrap().find(&["Edit", "Undo"]).is_some());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # });
/// ```
pub struct Application {
    config: Config,
    locale: Arc<Locale>,
    editor_options: EditorOptions,
    engines: EngineFactory,
    capabilities: MenuCapabilities,
    dialog: Dialog,
    menu: Box<dyn NativeMenu>,
    exporter: Exporter,
    tabs: Vec<MultiEditorTab>,
    active: Option<usize>,
    /// Files of closed tabs, most recent last
    closed: Vec<PathBuf>,
    /// Numbering of new diagrams
    counter: usize,
    layout: EditorLayout,
    log: Vec<LogEntry>,
    fullscreen: bool,
    running: bool,
    initialized: bool,
}

impl Application {
    /// Create the application. No menu is installed until
    /// [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid configuration.
    pub fn new(
        config: Config,
        engines: EngineFactory,
        dialogs: Box<dyn NativeDialogs>,
        menu: Box<dyn NativeMenu>,
    ) -> Result<Self> {
        config.validate()?;
        info!("Creating new modeler application instance");

        let locale = config.locale();
        let editor_options = config.editor_options();
        let dialog = Dialog::new(locale.clone(), config.dialogs.default_path.clone(), dialogs);
        let exporter = Exporter::new(locale.clone(), config.export.war_process_name.clone());

        Ok(Self {
            capabilities: MenuCapabilities::from_config(&config),
            layout: editor_options.layout,
            locale,
            editor_options,
            engines,
            dialog,
            menu,
            exporter,
            tabs: Vec::new(),
            active: None,
            closed: Vec::new(),
            counter: 0,
            log: Vec::new(),
            fullscreen: false,
            running: true,
            initialized: false,
            config,
        })
    }

    /// Use `renderer` for PNG and JPEG exports.
    pub fn with_renderer(mut self, renderer: Arc<dyn ImageRenderer>) -> Self {
        self.exporter = self.exporter.with_renderer(renderer);
        self
    }

    /// Install the initial menu.
    ///
    /// # Errors
    ///
    /// Returns the menu host's error.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            warn!("Application is already initialized");
            return Ok(());
        }

        info!("Initializing modeler application");
        self.refresh_menu()?;
        self.initialized = true;
        info!("Application initialization completed successfully");
        Ok(())
    }

    /// Destroy every tab without asking.
    pub fn shutdown(&mut self) {
        info!("Shutting down modeler application");

        for tab in &mut self.tabs {
            tab.destroy();
        }
        self.tabs.clear();
        self.active = None;
        self.running = false;
    }

    /// Process commands until [`AppCommand::Quit`] succeeds or every sender is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial menu cannot be installed.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<AppCommand>) -> Result<()> {
        self.initialize()?;

        while let Some(command) = commands.recv().await {
            if !self.dispatch(command).await {
                break;
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Handle one command and refresh the menu.
    ///
    /// Failures are logged and reported through the general error dialog.
    /// Returns whether the application keeps running.
    pub async fn dispatch(&mut self, command: AppCommand) -> bool {
        debug!("Handling command {}", command);

        if let Err(e) = self.handle(command.clone()).await {
            error!("Command {} failed: {}", command, e);
            self.dialog.show_general_error();
        }

        self.drain_tabs();

        if let Err(e) = self.refresh_menu() {
            error!("Failed to install menu: {}", e);
        }

        self.running
    }

    /// Handle one command.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the tab, dialog, export or file
    /// operation behind the command.
    pub async fn handle(&mut self, command: AppCommand) -> Result<()> {
        match command {
            AppCommand::CreateDiagram(template) => {
                self.counter += 1;
                self.open_file(DiagramFile::from_template(template, self.counter)).await
            }
            AppCommand::OpenDiagram | AppCommand::OpenWar => {
                let answer = self.dialog.show(DialogKind::Open, &DialogOptions::new()).await?;
                if let DialogAnswer::Files(paths) = answer {
                    self.open_paths(paths).await?;
                }
                Ok(())
            }
            AppCommand::OpenFiles(paths) => self.open_paths(paths).await,
            AppCommand::ReopenLastTab => match self.closed.pop() {
                Some(path) => self.open_paths(vec![path]).await,
                None => {
                    debug!("No closed tab to reopen");
                    Ok(())
                }
            },
            AppCommand::SelectTab(direction) => {
                self.select_tab(direction);
                Ok(())
            }
            AppCommand::ShowEditor(id) => self.active_tab_mut()?.show_editor(&id).await,
            AppCommand::Save => {
                let index = self.tab_index(None)?;
                self.save_tab(index, false).await.map(|_| ())
            }
            AppCommand::SaveAs => {
                let index = self.tab_index(None)?;
                self.save_tab(index, true).await.map(|_| ())
            }
            AppCommand::SaveAll => self.save_all().await,
            AppCommand::ExportTab(format) => self.export_tab(format).await,
            AppCommand::CloseActiveTab => self.close_tab_by_id(None).await,
            AppCommand::CloseTab(id) => self.close_tab_by_id(id.as_deref()).await,
            AppCommand::CloseAllTabs => self.close_all_tabs().await.map(|_| ()),
            AppCommand::CloseOtherTabs(id) => self.close_other_tabs(id.as_deref()).await,
            AppCommand::Editor(action) => self.active_tab_mut()?.trigger_action(&action),
            AppCommand::InputActive(active) => {
                if let Ok(tab) = self.active_tab_mut() {
                    tab.set_input_active(active);
                }
                Ok(())
            }
            AppCommand::OpenContextMenu { kind, tab_id } => {
                self.open_context_menu(&kind, tab_id.as_deref())
            }
            AppCommand::CheckFileChanges => self.check_file_changes().await,
            AppCommand::ShowShortcuts => {
                info!("Keyboard shortcuts: {}/modeler/shortcuts", DOCUMENTATION_URL);
                Ok(())
            }
            AppCommand::OpenDocumentation => {
                info!("Documentation: {}", DOCUMENTATION_URL);
                Ok(())
            }
            AppCommand::Reload => {
                info!("Reload requested");
                Ok(())
            }
            AppCommand::ToggleDevTools => {
                self.capabilities.devtools = !self.capabilities.devtools;
                debug!("Developer tools open: {}", self.capabilities.devtools);
                Ok(())
            }
            AppCommand::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                Ok(())
            }
            AppCommand::Quit => {
                if self.close_all_tabs().await? {
                    info!("Quitting");
                    self.running = false;
                } else {
                    info!("Quit cancelled");
                }
                Ok(())
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tabs(&self) -> &[MultiEditorTab] {
        &self.tabs
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_tab(&self) -> Option<&MultiEditorTab> {
        self.active.and_then(|index| self.tabs.get(index))
    }

    pub fn capabilities(&self) -> &MenuCapabilities {
        &self.capabilities
    }

    pub fn layout(&self) -> EditorLayout {
        self.layout
    }

    /// Log panel lines collected from editors.
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Paths that [`AppCommand::ReopenLastTab`] would reopen, most recent last.
    pub fn closed_files(&self) -> &[PathBuf] {
        &self.closed
    }

    /// State the menus are built from: the focused editor's snapshot plus
    /// the shell's own flags.
    pub fn menu_state(&self) -> StateContext {
        match self.active_tab() {
            Some(tab) => tab.state().with_shell_flags(true, true),
            None => StateContext::default(),
        }
    }

    /// The application menu for the current state.
    pub fn build_menu(&self) -> MenuTree {
        let state = self.menu_state();
        MenuBuilder::new(&self.capabilities, &state, &self.locale).build()
    }

    /// Empty the log panel and let editors drop their import warnings.
    pub fn clear_log(&mut self) {
        self.log.clear();

        let mut cleared = self.layout;
        cleared.log.cleared = true;
        self.apply_layout(cleared);
        self.layout.log.cleared = false;
    }

    fn refresh_menu(&mut self) -> Result<()> {
        let menu = self.build_menu();
        self.menu.install(&menu)
    }

    fn open_context_menu(&mut self, kind: &str, tab_id: Option<&str>) -> Result<()> {
        let state = self.menu_state();
        let menu = MenuBuilder::new(&self.capabilities, &state, &self.locale)
            .build_context_menu(kind, tab_id)
            .ok_or_else(|| Error::menu(format!("unknown context menu <{}>", kind)))?;
        self.menu.popup(&menu)
    }

    fn active_tab_mut(&mut self) -> Result<&mut MultiEditorTab> {
        let index = self.tab_index(None)?;
        Ok(&mut self.tabs[index])
    }

    fn tab_index(&self, id: Option<&str>) -> Result<usize> {
        match id {
            None => self.active.ok_or_else(|| Error::tab("no open tab")),
            Some(id) => self
                .tabs
                .iter()
                .position(|tab| tab.id() == id)
                .ok_or_else(|| Error::not_found(format!("tab <{}>", id))),
        }
    }

    fn select_tab(&mut self, direction: TabDirection) {
        let count = self.tabs.len();
        let Some(current) = self.active else {
            return;
        };

        let next = match direction {
            TabDirection::Next => (current + 1) % count,
            TabDirection::Previous => (current + count - 1) % count,
        };
        self.active = Some(next);
    }

    async fn open_paths(&mut self, paths: Vec<PathBuf>) -> Result<()> {
        for path in paths {
            if let Some(index) = self
                .tabs
                .iter()
                .position(|tab| tab.file().path.as_deref() == Some(path.as_path()))
            {
                debug!("{} is already open", path.display());
                self.active = Some(index);
                continue;
            }

            if path.extension().map_or(false, |e| e.eq_ignore_ascii_case("war")) {
                let bytes = tokio::fs::read(&path).await?;
                for file in read_war(&bytes)? {
                    self.open_file(file).await?;
                }
                continue;
            }

            match DiagramFile::load(&path).await {
                Ok(file) => self.open_file(file).await?,
                Err(Error::Tab { message }) => {
                    warn!("{}", message);
                    let options = DialogOptions::new().name(display_name(&path));
                    self.dialog.show(DialogKind::UnrecognizedFile, &options).await?;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    async fn open_file(&mut self, mut file: DiagramFile) -> Result<()> {
        if !self.convert_legacy_namespace(&mut file).await? {
            info!("Opening {} cancelled", file.name);
            return Ok(());
        }

        let mut tab = MultiEditorTab::for_file(file, &self.editor_options, self.engines.clone())?;
        tab.set_layout(self.layout);
        tab.open().await?;

        let messages = tab.take_messages();
        let import_error = messages.iter().find_map(|message| match message.event() {
            EditorEvent::Imported(report) => report.error.clone(),
            _ => None,
        });
        let name = tab.file().name.clone();

        self.tabs.push(tab);
        self.active = Some(self.tabs.len() - 1);
        self.handle_messages(messages);

        if let Some(details) = import_error {
            let options = DialogOptions::new().name(name).error_details(details);
            if self.dialog.show(DialogKind::ImportError, &options).await?.is_button("ask-forum") {
                info!("Forum: {}", DOCUMENTATION_URL);
            }
        }

        Ok(())
    }

    /// Offer to move diagrams off namespaces the editors no longer support.
    /// Returns `false` when the user cancels opening the file.
    async fn convert_legacy_namespace(&mut self, file: &mut DiagramFile) -> Result<bool> {
        let (old, new) = match file.diagram_type {
            DiagramType::Bpmn if file.contents.contains(ACTIVITI_NAMESPACE) => {
                (ACTIVITI_NAMESPACE, CAMUNDA_NAMESPACE)
            }
            DiagramType::Dmn if file.contents.contains(DMN11_NAMESPACE) => {
                (DMN11_NAMESPACE, DMN_NAMESPACE)
            }
            _ => return Ok(true),
        };

        let options = DialogOptions::new().diagram_type(file.diagram_type.extension());
        match self.dialog.show(DialogKind::Namespace, &options).await? {
            DialogAnswer::Button("yes") => {
                info!("Converting {} to {}", file.name, new);
                let mut contents = file.contents.replace(old, new);
                if old == ACTIVITI_NAMESPACE {
                    contents = rename_prefix(&contents, "activiti", "camunda")?;
                }
                file.contents = contents;
                Ok(true)
            }
            DialogAnswer::Button("no") => Ok(true),
            _ => Ok(false),
        }
    }

    /// Save a tab, asking for a location when needed. Returns `false` when
    /// the user cancelled.
    async fn save_tab(&mut self, index: usize, mut save_as: bool) -> Result<bool> {
        loop {
            let current = self.tabs[index].file().path.clone();
            let target = match (current, save_as) {
                (Some(path), false) => path,
                _ => match self.ask_save_path(index).await? {
                    Some(path) => path,
                    None => return Ok(false),
                },
            };

            let xml = self.tabs[index].serialize().await?;
            match tokio::fs::write(&target, &xml).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                    warn!("Saving {} denied: {}", target.display(), e);
                    let answer = self
                        .dialog
                        .show(DialogKind::SavingDenied, &DialogOptions::new())
                        .await?;
                    if answer.is_button("save-as") {
                        save_as = true;
                        continue;
                    }
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }

            let tab = &mut self.tabs[index];
            tab.save().await?;
            tab.file_mut().relocate(target);
            return Ok(true);
        }
    }

    async fn ask_save_path(&mut self, index: usize) -> Result<Option<PathBuf>> {
        let file = self.tabs[index].file();
        let current = file.path.clone();
        let mut options = DialogOptions::new()
            .name(file.name.clone())
            .file_type(file.diagram_type.extension());
        if let Some(path) = &current {
            options = options.file_path(path.clone());
        }

        loop {
            let answer = self.dialog.show(DialogKind::Save, &options).await?;
            let Some(path) = answer.file().map(Path::to_path_buf) else {
                return Ok(None);
            };

            let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
            if current.as_ref() == Some(&path) || !exists {
                return Ok(Some(path));
            }

            let existing = DialogOptions::new().name(display_name(&path));
            match self.dialog.show(DialogKind::ExistingFile, &existing).await? {
                DialogAnswer::Button("overwrite") => return Ok(Some(path)),
                DialogAnswer::Button("no-overwrite") => continue,
                _ => return Ok(None),
            }
        }
    }

    async fn save_all(&mut self) -> Result<()> {
        for index in 0..self.tabs.len() {
            let tab = &self.tabs[index];
            if !tab.is_dirty() && !tab.file().is_unsaved {
                continue;
            }

            if !self.save_tab(index, false).await? {
                info!("Save all cancelled");
                break;
            }
        }

        Ok(())
    }

    async fn export_tab(&mut self, format: ExportFormat) -> Result<()> {
        let index = self.tab_index(None)?;
        let exported = self.exporter.export(&mut self.tabs[index], format).await?;

        let mut options = DialogOptions::new()
            .name(exported.name.clone())
            .file_type(format.extension());
        if let Some(path) = &self.tabs[index].file().path {
            options = options.file_path(path.clone());
        }

        match self.dialog.show(DialogKind::Save, &options).await?.file() {
            Some(path) => {
                tokio::fs::write(path, &exported.contents).await?;
                info!("Wrote {} to {}", exported.name, path.display());
            }
            None => debug!("Export of {} cancelled", exported.name),
        }

        Ok(())
    }

    async fn close_tab_by_id(&mut self, id: Option<&str>) -> Result<()> {
        let index = self.tab_index(id)?;
        self.close_tab(index).await.map(|_| ())
    }

    /// Close a tab, asking what to do with unsaved changes. Returns `false`
    /// when the tab stays open.
    async fn close_tab(&mut self, index: usize) -> Result<bool> {
        if self.tabs[index].is_dirty() {
            let options = DialogOptions::new().name(self.tabs[index].file().name.clone());
            match self.dialog.show(DialogKind::Close, &options).await? {
                DialogAnswer::Button("save") => {
                    if !self.save_tab(index, false).await? {
                        return Ok(false);
                    }
                }
                DialogAnswer::Button("discard") => {}
                _ => return Ok(false),
            }
        }

        let mut tab = self.tabs.remove(index);
        tab.destroy();
        if let Some(path) = &tab.file().path {
            self.closed.push(path.clone());
        }

        self.active = match self.active {
            _ if self.tabs.is_empty() => None,
            Some(active) if active > index => Some(active - 1),
            Some(active) if active == index => Some(index.min(self.tabs.len() - 1)),
            other => other,
        };

        Ok(true)
    }

    async fn close_all_tabs(&mut self) -> Result<bool> {
        while let Some(last) = self.tabs.len().checked_sub(1) {
            if !self.close_tab(last).await? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    async fn close_other_tabs(&mut self, id: Option<&str>) -> Result<()> {
        let keep = self.tabs[self.tab_index(id)?].id().to_string();

        let mut index = 0;
        while index < self.tabs.len() {
            if self.tabs[index].id() == keep {
                index += 1;
                continue;
            }

            if !self.close_tab(index).await? {
                index += 1;
            }
        }

        self.active = self.tabs.iter().position(|tab| tab.id() == keep);
        Ok(())
    }

    /// Ask to reload tabs whose files changed on disk.
    async fn check_file_changes(&mut self) -> Result<()> {
        for index in 0..self.tabs.len() {
            let Some(path) = self.tabs[index].file().path.clone() else {
                continue;
            };

            let on_disk = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) => {
                    warn!("Cannot check {}: {}", path.display(), e);
                    continue;
                }
            };

            if on_disk == self.tabs[index].file().contents {
                continue;
            }

            let options = DialogOptions::new().name(self.tabs[index].file().name.clone());
            if self.dialog.show(DialogKind::ContentChanged, &options).await?.is_button("ok") {
                info!("Reloading {}", path.display());
                let mut tab = MultiEditorTab::for_file(
                    DiagramFile::load(&path).await?,
                    &self.editor_options,
                    self.engines.clone(),
                )?;
                tab.set_layout(self.layout);
                tab.open().await?;

                let mut previous = std::mem::replace(&mut self.tabs[index], tab);
                previous.destroy();
            } else {
                self.tabs[index].file_mut().contents = on_disk;
            }
        }

        Ok(())
    }

    fn drain_tabs(&mut self) {
        let messages: Vec<EditorMessage> = self
            .tabs
            .iter_mut()
            .flat_map(|tab| {
                tab.pump();
                tab.take_messages()
            })
            .collect();

        self.handle_messages(messages);
    }

    fn handle_messages(&mut self, messages: Vec<EditorMessage>) {
        let mut layout = None;

        for message in messages {
            match message.into_event() {
                EditorEvent::Log(entries) => {
                    for entry in &entries {
                        match entry.level {
                            LogLevel::Info => info!("{}", entry.message),
                            LogLevel::Warning => warn!("{}", entry.message),
                            LogLevel::Error => error!("{}", entry.message),
                        }
                    }
                    self.log.extend(entries);
                }
                EditorEvent::LogToggle { open } => {
                    let mut toggled = layout.unwrap_or(self.layout);
                    toggled.log.open = open;
                    layout = Some(toggled);
                }
                EditorEvent::LayoutChanged(changed) => layout = Some(changed),
                EditorEvent::ContextMenuOpen(kind) => {
                    if let Err(e) = self.open_context_menu(&kind, None) {
                        warn!("Cannot open context menu: {}", e);
                    }
                }
                _ => {}
            }
        }

        if let Some(layout) = layout {
            self.apply_layout(layout);
        }
    }

    fn apply_layout(&mut self, layout: EditorLayout) {
        debug!("Applying layout {:?}", layout);
        self.layout = layout;
        for tab in &mut self.tabs {
            tab.set_layout(layout);
        }
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("tabs", &self.tabs.len())
            .field("active", &self.active)
            .field("running", &self.running)
            .finish()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::HeadlessDialogs;
    use crate::export::generate_war;
    use crate::menu::HeadlessMenu;
    use crate::tab::NewDiagram;
    use modeler_editor_api::EditorAction;
    use modeler_editors::MemoryEngineHandle;
    use tempfile::tempdir;

    const XML: &str = r#"<definitions id="Definitions_1"><process id="Process_1"/></definitions>"#;

    struct Harness {
        app: Application,
        dialogs: HeadlessDialogs,
        menu: HeadlessMenu,
        engine: MemoryEngineHandle,
    }

    fn harness() -> Harness {
        let dialogs = HeadlessDialogs::new();
        let menu = HeadlessMenu::new();
        let engine = MemoryEngineHandle::new();
        let mut app = Application::new(
            Config::default(),
            engine.factory(),
            Box::new(dialogs.clone()),
            Box::new(menu.clone()),
        )
        .unwrap();
        app.initialize().unwrap();

        Harness {
            app,
            dialogs,
            menu,
            engine,
        }
    }

    fn shown_kinds(dialogs: &HeadlessDialogs) -> Vec<DialogKind> {
        dialogs.shown().iter().map(|descriptor| descriptor.kind).collect()
    }

    #[tokio::test]
    async fn test_initialize_installs_menu() {
        let h = harness();
        assert_eq!(h.menu.install_count(), 1);

        let menu = h.menu.installed().unwrap();
        assert!(menu.find(&["Edit", "Undo"]).is_none());
        assert!(menu.submenu("File").is_some());
    }

    #[tokio::test]
    async fn test_menu_follows_active_editor() {
        let mut h = harness();
        h.app.handle(AppCommand::OpenFiles(Vec::new())).await.unwrap();
        assert!(h.app.active_tab().is_none());

        assert!(h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await);
        let state = h.app.menu_state();
        assert!(state.bpmn && state.save && state.closable);
        assert!(h.menu.installed().unwrap().find(&["Edit", "Undo"]).is_some());

        h.app.dispatch(AppCommand::ShowEditor("xml".to_string())).await;
        assert!(!h.app.menu_state().bpmn);
        assert!(h.menu.install_count() >= 3);
    }

    #[tokio::test]
    async fn test_new_diagrams_are_numbered() {
        let mut h = harness();
        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await;
        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::DmnTable)).await;

        let names: Vec<&str> = h.app.tabs().iter().map(|tab| tab.file().name.as_str()).collect();
        assert_eq!(names, vec!["diagram_1.bpmn", "diagram_2.dmn"]);
        assert_eq!(h.app.active_index(), Some(1));

        h.app.dispatch(AppCommand::SelectTab(TabDirection::Next)).await;
        assert_eq!(h.app.active_index(), Some(0));
        h.app.dispatch(AppCommand::SelectTab(TabDirection::Previous)).await;
        assert_eq!(h.app.active_index(), Some(1));
    }

    #[tokio::test]
    async fn test_save_as_writes_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("order.bpmn");
        let mut h = harness();

        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await;
        assert!(h.app.active_tab().unwrap().is_dirty());

        h.dialogs.answer_save(Some(target.clone()));
        h.app.dispatch(AppCommand::Save).await;

        let tab = h.app.active_tab().unwrap();
        assert!(!tab.is_dirty());
        assert_eq!(tab.file().name, "order.bpmn");
        assert_eq!(tab.file().path.as_deref(), Some(target.as_path()));
        assert!(!tab.file().is_unsaved);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), tab.file().contents);
        assert!(h.dialogs.errors().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_save_keeps_tab_dirty() {
        let mut h = harness();
        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Cmmn)).await;
        h.app.dispatch(AppCommand::Save).await;

        let tab = h.app.active_tab().unwrap();
        assert!(tab.is_dirty());
        assert!(tab.file().path.is_none());
        assert_eq!(shown_kinds(&h.dialogs), vec![DialogKind::Save]);
    }

    #[tokio::test]
    async fn test_existing_file_asks_before_overwrite() {
        let dir = tempdir().unwrap();
        let taken = dir.path().join("taken.bpmn");
        let free = dir.path().join("free.bpmn");
        std::fs::write(&taken, "keep me").unwrap();

        let mut h = harness();
        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await;

        h.dialogs.answer_save(Some(taken.clone()));
        h.dialogs.answer_button("no-overwrite");
        h.dialogs.answer_save(Some(free.clone()));
        h.app.dispatch(AppCommand::SaveAs).await;

        assert_eq!(std::fs::read_to_string(&taken).unwrap(), "keep me");
        assert!(free.exists());
        assert_eq!(
            shown_kinds(&h.dialogs),
            vec![DialogKind::Save, DialogKind::ExistingFile, DialogKind::Save]
        );
    }

    #[tokio::test]
    async fn test_open_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("order.bpmn");
        std::fs::write(&path, XML).unwrap();

        let mut h = harness();
        h.dialogs.answer_open(vec![path.clone()]);
        h.app.dispatch(AppCommand::OpenDiagram).await;
        h.app.dispatch(AppCommand::OpenFiles(vec![path.clone()])).await;
        assert_eq!(h.app.tabs().len(), 1);
        assert!(!h.app.active_tab().unwrap().is_dirty());

        h.app.dispatch(AppCommand::CloseActiveTab).await;
        assert!(h.app.tabs().is_empty());
        assert_eq!(h.app.closed_files(), &[path.clone()]);

        h.app.dispatch(AppCommand::ReopenLastTab).await;
        assert_eq!(h.app.active_tab().unwrap().file().path.as_deref(), Some(path.as_path()));
        assert!(h.app.closed_files().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let mut h = harness();
        h.app.dispatch(AppCommand::OpenFiles(vec![path])).await;

        assert!(h.app.tabs().is_empty());
        assert_eq!(shown_kinds(&h.dialogs), vec![DialogKind::UnrecognizedFile]);
        assert!(h.dialogs.errors().is_empty());
    }

    #[tokio::test]
    async fn test_import_error_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("order.bpmn");
        std::fs::write(&path, XML).unwrap();

        let mut h = harness();
        h.engine.fail_next_import("unknown element <foo>");
        h.app.dispatch(AppCommand::OpenFiles(vec![path])).await;

        assert_eq!(h.app.active_tab().unwrap().active_definition().id, "xml");
        let shown = h.dialogs.shown();
        assert_eq!(shown[0].kind, DialogKind::ImportError);
        let detail = shown[0].detail.as_deref().unwrap_or_default();
        assert!(detail.starts_with("unknown element <foo>"));
    }

    #[tokio::test]
    async fn test_legacy_namespace_conversion() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.bpmn");
        let legacy = format!(
            r#"<definitions xmlns:activiti="{}" id="Definitions_1"><process id="Process_1" activiti:async="true"/></definitions>"#,
            ACTIVITI_NAMESPACE
        );
        std::fs::write(&path, &legacy).unwrap();

        let mut h = harness();
        h.dialogs.answer_button("cancel");
        h.app.dispatch(AppCommand::OpenFiles(vec![path.clone()])).await;
        assert!(h.app.tabs().is_empty());

        h.dialogs.answer_button("yes");
        h.app.dispatch(AppCommand::OpenFiles(vec![path])).await;
        let xml = h.engine.xml().unwrap();
        assert!(xml.contains(CAMUNDA_NAMESPACE));
        assert!(xml.contains("camunda:async"));
        assert!(!xml.contains("activiti"));
    }

    #[test]
    fn test_prefix_rename_spares_text_and_values() {
        let legacy = r#"<definitions xmlns:activiti="x"><process activiti:async="true" name="activiti: legacy"><activiti:field/><documentation>see org.activiti:engine or activiti:docs</documentation></process></definitions>"#;

        let renamed = rename_prefix(legacy, "activiti", "camunda").unwrap();
        assert_eq!(
            renamed,
            r#"<definitions xmlns:camunda="x"><process camunda:async="true" name="activiti: legacy"><camunda:field/><documentation>see org.activiti:engine or activiti:docs</documentation></process></definitions>"#
        );
    }

    #[tokio::test]
    async fn test_open_war_opens_bundled_diagrams() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.war");
        std::fs::write(&path, generate_war(XML, "order.bpmn", "orders").unwrap()).unwrap();

        let mut h = harness();
        h.dialogs.answer_open(vec![path]);
        h.app.dispatch(AppCommand::OpenWar).await;

        let tab = h.app.active_tab().unwrap();
        assert_eq!(tab.file().name, "order.bpmn");
        assert!(tab.file().is_unsaved);
        assert_eq!(h.dialogs.shown()[0].kind, DialogKind::Open);
    }

    #[tokio::test]
    async fn test_close_dirty_tab_asks() {
        let mut h = harness();
        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await;

        h.app.dispatch(AppCommand::CloseActiveTab).await;
        assert_eq!(h.app.tabs().len(), 1);

        h.dialogs.answer_button("discard");
        h.app.dispatch(AppCommand::CloseActiveTab).await;
        assert!(h.app.tabs().is_empty());
        assert!(h.app.active_index().is_none());
        assert!(h.engine.is_destroyed());
        assert!(h.app.closed_files().is_empty());
    }

    #[tokio::test]
    async fn test_close_other_tabs() {
        let mut h = harness();
        for _ in 0..3 {
            h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Cmmn)).await;
        }
        let keep = h.app.tabs()[1].id().to_string();

        h.dialogs.answer_button("discard");
        h.dialogs.answer_button("discard");
        h.app.dispatch(AppCommand::CloseOtherTabs(Some(keep.clone()))).await;

        assert_eq!(h.app.tabs().len(), 1);
        assert_eq!(h.app.active_tab().unwrap().id(), keep);
    }

    #[tokio::test]
    async fn test_quit_cancelled_by_dirty_tab() {
        let mut h = harness();
        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await;

        assert!(h.app.dispatch(AppCommand::Quit).await);
        assert!(h.app.is_running());

        h.dialogs.answer_button("discard");
        assert!(!h.app.dispatch(AppCommand::Quit).await);
    }

    #[tokio::test]
    async fn test_editor_actions_reach_active_tab() {
        let mut h = harness();
        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await;
        h.app.dispatch(AppCommand::Editor(EditorAction::ZoomFit)).await;

        let triggered = h.engine.triggered();
        assert_eq!(triggered.last().unwrap().0, "zoom");

        h.app.dispatch(AppCommand::Editor(EditorAction::ToggleProperties)).await;
        assert!(h.app.layout().properties_panel.open);
    }

    #[tokio::test]
    async fn test_failures_show_general_error() {
        let mut h = harness();
        h.app.dispatch(AppCommand::Editor(EditorAction::Undo)).await;
        h.app.dispatch(AppCommand::ExportTab(ExportFormat::Png)).await;

        assert_eq!(h.dialogs.errors().len(), 2);
        assert!(h.app.is_running());
    }

    #[tokio::test]
    async fn test_export_writes_chosen_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("diagram_1.svg");

        let mut h = harness();
        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await;
        h.dialogs.answer_save(Some(target.clone()));
        h.app.dispatch(AppCommand::ExportTab(ExportFormat::Svg)).await;

        assert!(std::fs::read_to_string(&target).unwrap().starts_with("<svg"));
        assert_eq!(h.dialogs.shown()[0].filters[0].extensions, vec!["svg"]);
        assert!(h.app.active_tab().unwrap().is_dirty());
    }

    #[tokio::test]
    async fn test_context_menus() {
        let mut h = harness();
        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await;
        let tab_id = h.app.tabs()[0].id().to_string();

        h.app
            .dispatch(AppCommand::OpenContextMenu {
                kind: "tab".to_string(),
                tab_id: Some(tab_id),
            })
            .await;
        h.app
            .dispatch(AppCommand::OpenContextMenu {
                kind: "canvas".to_string(),
                tab_id: None,
            })
            .await;

        assert_eq!(h.menu.popups().len(), 1);
        assert_eq!(h.dialogs.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_changed_file_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("order.bpmn");
        std::fs::write(&path, XML).unwrap();

        let mut h = harness();
        h.app.dispatch(AppCommand::OpenFiles(vec![path.clone()])).await;
        h.app.dispatch(AppCommand::CheckFileChanges).await;
        assert!(h.dialogs.shown().is_empty());

        let changed = XML.replace("Process_1", "Process_2");
        std::fs::write(&path, &changed).unwrap();
        h.dialogs.answer_button("ok");
        h.app.dispatch(AppCommand::CheckFileChanges).await;

        assert_eq!(shown_kinds(&h.dialogs), vec![DialogKind::ContentChanged]);
        assert_eq!(h.app.active_tab().unwrap().file().contents, changed);
        assert_eq!(h.engine.xml().unwrap(), changed);
    }

    #[tokio::test]
    async fn test_engine_errors_reach_log() {
        let mut h = harness();
        h.app.dispatch(AppCommand::CreateDiagram(NewDiagram::Bpmn)).await;

        h.engine.emit_error("renderer failed");
        h.app.dispatch(AppCommand::InputActive(false)).await;

        assert!(h.app.log().contains(&LogEntry::error("renderer failed")));
        assert!(h.app.layout().log.open);

        h.app.clear_log();
        assert!(h.app.log().is_empty());
        assert!(!h.app.layout().log.cleared);
    }

    #[tokio::test]
    async fn test_run_stops_on_quit() {
        let mut h = harness();
        let (sender, receiver) = command_channel();

        sender.send(AppCommand::ToggleFullscreen).await.unwrap();
        sender.send(AppCommand::ToggleDevTools).await.unwrap();
        sender.send(AppCommand::Quit).await.unwrap();
        sender.send(AppCommand::ToggleFullscreen).await.unwrap();

        h.app.run(receiver).await.unwrap();
        assert!(h.app.is_fullscreen());
        assert!(h.app.capabilities().devtools);
        assert!(!h.app.is_running());
    }
}
