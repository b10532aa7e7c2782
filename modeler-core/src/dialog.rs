//! # Dialogs
//!
//! [`Dialog`] turns a symbolic request ([`DialogKind`] plus
//! [`DialogOptions`]) into a [`DialogDescriptor`] for the native dialog
//! backend, and turns the backend's positional answer back into a stable
//! button id. Required options are checked before anything is shown.
//!
//! The directory chosen in an open or save dialog becomes the default path
//! of later dialogs for the rest of the process.

use crate::{dialog_error, Error, Result};
use async_trait::async_trait;
use modeler_editor_api::{EditorError, Locale};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error};

/// Dialog requests the application can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogKind {
    Open,
    Save,
    Close,
    ContentChanged,
    ImportError,
    UnrecognizedFile,
    ExistingFile,
    Namespace,
    SavingDenied,
}

impl DialogKind {
    pub fn all() -> [DialogKind; 9] {
        [
            DialogKind::Open,
            DialogKind::Save,
            DialogKind::Close,
            DialogKind::ContentChanged,
            DialogKind::ImportError,
            DialogKind::UnrecognizedFile,
            DialogKind::ExistingFile,
            DialogKind::Namespace,
            DialogKind::SavingDenied,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DialogKind::Open => "open",
            DialogKind::Save => "save",
            DialogKind::Close => "close",
            DialogKind::ContentChanged => "contentChanged",
            DialogKind::ImportError => "importError",
            DialogKind::UnrecognizedFile => "unrecognizedFile",
            DialogKind::ExistingFile => "existingFile",
            DialogKind::Namespace => "namespace",
            DialogKind::SavingDenied => "savingDenied",
        }
    }

    /// Whether the dialog picks files rather than asking a question.
    pub fn is_file_dialog(&self) -> bool {
        matches!(self, DialogKind::Open | DialogKind::Save)
    }
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialogKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DialogKind::all()
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| dialog_error!("unknown dialog type <{}>", s))
    }
}

/// Parameters of a dialog request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogOptions {
    /// File name shown in the dialog
    pub name: Option<String>,
    /// Filter id for save dialogs, e.g. `bpmn`
    pub file_type: Option<String>,
    /// Parser output shown by import error dialogs
    pub error_details: Option<String>,
    /// Diagram type for namespace dialogs
    pub diagram_type: Option<String>,
    /// Path of the focused file; its directory becomes the default path
    pub file_path: Option<PathBuf>,
}

impl DialogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn file_type<S: Into<String>>(mut self, file_type: S) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn error_details<S: Into<String>>(mut self, details: S) -> Self {
        self.error_details = Some(details.into());
        self
    }

    pub fn diagram_type<S: Into<String>>(mut self, diagram_type: S) -> Self {
        self.diagram_type = Some(diagram_type.into());
        self
    }

    pub fn file_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Read options from a JSON object using the keys `name`, `fileType`,
    /// `errorDetails`, `type` and `filePath`.
    pub fn from_json(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            name: text("name"),
            file_type: text("fileType"),
            error_details: text("errorDetails"),
            diagram_type: text("type"),
            file_path: text("filePath").map(PathBuf::from),
        }
    }
}

/// Icon shown by message boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Question,
    Warning,
    Error,
}

/// A message box button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogButton {
    /// Stable id returned to callers
    pub id: &'static str,
    pub label: String,
}

/// A file type filter for open and save dialogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<&'static str>,
}

/// Everything a native backend needs to show a dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogDescriptor {
    pub kind: DialogKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<DialogButton>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FileFilter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<&'static str>,
    /// Show buttons as buttons, not command links
    pub no_link: bool,
}

impl DialogDescriptor {
    fn message_box(kind: DialogKind, message_type: MessageType, title: String) -> Self {
        Self {
            kind,
            title,
            message: None,
            detail: None,
            message_type: Some(message_type),
            buttons: Vec::new(),
            default_path: None,
            filters: Vec::new(),
            properties: Vec::new(),
            no_link: true,
        }
    }

    fn file_picker(
        kind: DialogKind,
        title: String,
        default_path: PathBuf,
        filters: Vec<FileFilter>,
    ) -> Self {
        Self {
            kind,
            title,
            message: None,
            detail: None,
            message_type: None,
            buttons: Vec::new(),
            default_path: Some(default_path),
            filters,
            properties: Vec::new(),
            no_link: true,
        }
    }

    fn button(mut self, id: &'static str, label: String) -> Self {
        self.buttons.push(DialogButton { id, label });
        self
    }

    /// Button labels in display order.
    pub fn button_labels(&self) -> Vec<&str> {
        self.buttons.iter().map(|b| b.label.as_str()).collect()
    }

    /// Translate the index of a clicked button into its id.
    ///
    /// # Errors
    ///
    /// Returns a dialog error if the index does not name a button.
    pub fn button_id(&self, index: usize) -> Result<&'static str> {
        self.buttons
            .get(index)
            .map(|button| button.id)
            .ok_or_else(|| dialog_error!("{} dialog has no button #{}", self.kind, index))
    }
}

/// What the user chose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogAnswer {
    /// Id of the clicked message box button
    Button(&'static str),
    /// Files picked in an open or save dialog
    Files(Vec<PathBuf>),
    /// File dialog closed without a choice
    Cancelled,
}

impl DialogAnswer {
    pub fn is_button(&self, id: &str) -> bool {
        matches!(self, DialogAnswer::Button(button) if *button == id)
    }

    /// First picked file, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            DialogAnswer::Files(files) => files.first().map(PathBuf::as_path),
            _ => None,
        }
    }
}

/// The host's dialog implementation.
#[async_trait]
pub trait NativeDialogs: Send {
    /// Show an open dialog; an empty result means cancelled.
    async fn show_open(&mut self, descriptor: &DialogDescriptor) -> Result<Vec<PathBuf>>;

    /// Show a save dialog.
    async fn show_save(&mut self, descriptor: &DialogDescriptor) -> Result<Option<PathBuf>>;

    /// Show a message box and return the index of the clicked button.
    async fn show_message(&mut self, descriptor: &DialogDescriptor) -> Result<usize>;

    /// Show a blocking error box.
    fn show_error_box(&mut self, title: &str, message: &str);
}

/// Builds dialog descriptors and runs them through a [`NativeDialogs`] backend.
pub struct Dialog {
    locale: Arc<Locale>,
    native: Box<dyn NativeDialogs>,
    default_path: PathBuf,
    last_choice: Option<PathBuf>,
}

impl Dialog {
    /// Create the helper.
    ///
    /// Dialogs start in `default_path`, or in the user's desktop when none
    /// is configured.
    pub fn new(
        locale: Arc<Locale>,
        default_path: Option<PathBuf>,
        native: Box<dyn NativeDialogs>,
    ) -> Self {
        let default_path = default_path.unwrap_or_else(user_desktop_path);

        Self {
            locale,
            native,
            default_path,
            last_choice: None,
        }
    }

    /// Directory later dialogs start in.
    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// Build the descriptor for a request.
    ///
    /// # Errors
    ///
    /// Returns a missing option error when a required option is absent,
    /// and a dialog error for an unknown save file type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::dialog::{Dialog, DialogKind, DialogOptions, HeadlessDialogs};
    /// use modeler_editor_api::Locale;
    /// use std::sync::Arc;
    ///
    /// let native = Box::new(HeadlessDialogs::new());
    /// let dialog = Dialog::new(Arc::new(Locale::default()), None, native);
    ///
    /// let close = dialog
    ///     .descriptor(DialogKind::Close, &DialogOptions::new().name("diagram_1.bpmn"))
    ///     .unwrap();
    /// assert_eq!(close.button_id(2).unwrap(), "discard");
    ///
    /// let error = dialog.descriptor(DialogKind::Save, &DialogOptions::new()).unwrap_err();
    /// assert!(error.is_missing_option());
    /// ```
    pub fn descriptor(
        &self,
        kind: DialogKind,
        options: &DialogOptions,
    ) -> Result<DialogDescriptor> {
        let t = |key: &str| self.locale.t(&format!("dialog.{}", key));
        let t_name = |key: &str, name: &str| {
            self.locale.t_with(&format!("dialog.{}", key), &[("name", name)])
        };
        let question = |title: &str| {
            DialogDescriptor::message_box(kind, MessageType::Question, t(title))
        };
        let warning = |title: &str| {
            DialogDescriptor::message_box(kind, MessageType::Warning, t(title))
        };

        let default_path = options
            .file_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_path.clone());

        let descriptor = match kind {
            DialogKind::ContentChanged => {
                let mut d = question("file_changed_title")
                    .button("ok", t("reload"))
                    .button("cancel", t("cancel"));
                d.message = Some(t("file_changed_message"));
                d
            }
            DialogKind::Open => {
                let filters = ["supported", "bpmn", "dmn", "cmmn", "all", "war"]
                    .into_iter()
                    .map(|id| self.filter(id))
                    .collect::<Result<Vec<_>>>()?;
                let mut d =
                    DialogDescriptor::file_picker(kind, t("open_title"), default_path, filters);
                d.properties = vec!["openFile", "multiSelections"];
                d
            }
            DialogKind::Save => {
                let name = require(&options.name, "name", kind)?;
                let file_type = require(&options.file_type, "fileType", kind)?;
                let filters = vec![self.filter(file_type)?, self.filter("all")?];
                DialogDescriptor::file_picker(
                    kind,
                    t_name("save_title", name),
                    default_path.join(name),
                    filters,
                )
            }
            DialogKind::Close => {
                let name = require(&options.name, "name", kind)?;
                let mut d = question("close_title")
                    .button("cancel", t("cancel"))
                    .button("save", t("save"))
                    .button("discard", t("dont_save"));
                d.message = Some(t_name("close_message", name));
                d
            }
            DialogKind::ImportError => {
                let name = require(&options.name, "name", kind)?;
                let details = require(&options.error_details, "errorDetails", kind)?;
                let title = t("import_error_title");
                let mut d = DialogDescriptor::message_box(kind, MessageType::Error, title)
                    .button("cancel", t("close"))
                    .button("ask-forum", t("ask_forum"));
                d.message = Some(t("import_error_message"));
                let question = t_name("import_error_question", name);
                d.detail = Some([details, "", question.as_str(), "", ""].join("\n"));
                d
            }
            DialogKind::UnrecognizedFile => {
                let name = require(&options.name, "name", kind)?;
                let mut d = warning("unrecognized_title")
                    .button("cancel", t("close"));
                d.message = Some(t_name("unrecognized_message", name));
                d
            }
            DialogKind::ExistingFile => {
                let name = require(&options.name, "name", kind)?;
                let mut d = warning("existing_title")
                    .button("cancel", t("cancel"))
                    .button("no-overwrite", t("no"))
                    .button("overwrite", t("overwrite"));
                d.message = Some(t_name("existing_message", name));
                d
            }
            DialogKind::Namespace => {
                let diagram_type = require(&options.diagram_type, "type", kind)?;
                let (old_ns, new_ns, detail) = match diagram_type {
                    "bpmn" => (
                        "<activiti>",
                        "<camunda>",
                        [
                            t("namespace_bpmn_detail"),
                            String::new(),
                            t("namespace_bpmn_versions"),
                        ]
                        .join("\n"),
                    ),
                    "dmn" => ("DMN", "new DMN", String::new()),
                    _ => ("", "", String::new()),
                };

                let mut d = DialogDescriptor::message_box(
                    kind,
                    MessageType::Warning,
                    self.locale.t_with("dialog.namespace_title", &[("old", old_ns)]),
                )
                .button("cancel", t("cancel"))
                .button("no", t("no"))
                .button("yes", t("yes"));
                d.message = Some(
                    self.locale.t_with("dialog.namespace_message", &[("new", new_ns)]),
                );
                d.detail = Some(detail);
                d
            }
            DialogKind::SavingDenied => {
                let mut d = warning("saving_denied_title")
                    .button("cancel", t("cancel"))
                    .button("save-as", t("save_as"));
                d.message = Some(
                    [t("saving_denied_message"), t("saving_denied_confirm")].join("\n"),
                );
                d
            }
        };

        Ok(descriptor)
    }

    /// Show a dialog and wait for the answer.
    ///
    /// Files picked in open and save dialogs update the default path.
    ///
    /// # Errors
    ///
    /// Returns option errors before anything is shown, and backend errors.
    pub async fn show(
        &mut self,
        kind: DialogKind,
        options: &DialogOptions,
    ) -> Result<DialogAnswer> {
        let descriptor = self.descriptor(kind, options)?;
        debug!("Showing {} dialog: {}", kind, descriptor.title);

        let answer = match kind {
            DialogKind::Open => {
                let files = self.native.show_open(&descriptor).await?;
                if files.is_empty() {
                    DialogAnswer::Cancelled
                } else {
                    DialogAnswer::Files(files)
                }
            }
            DialogKind::Save => match self.native.show_save(&descriptor).await? {
                Some(file) => DialogAnswer::Files(vec![file]),
                None => DialogAnswer::Cancelled,
            },
            _ => {
                let index = self.native.show_message(&descriptor).await?;
                DialogAnswer::Button(descriptor.button_id(index)?)
            }
        };

        if let DialogAnswer::Files(files) = &answer {
            if let Some(first) = files.first() {
                self.set_default_path(first);
            }
        }

        Ok(answer)
    }

    /// Remember the directory of a chosen file for later dialogs.
    pub fn set_default_path(&mut self, chosen: &Path) {
        if self.last_choice.as_deref() == Some(chosen) {
            return;
        }

        if let Some(parent) = chosen.parent() {
            debug!("Default dialog path is now {}", parent.display());
            self.default_path = parent.to_path_buf();
        }
        self.last_choice = Some(chosen.to_path_buf());
    }

    /// Title and message of the general error dialog.
    pub fn general_error(&self) -> (String, String) {
        (
            self.locale.t("dialog.general_error_title"),
            self.locale.t("dialog.general_error_message"),
        )
    }

    /// Tell the user something went wrong internally.
    pub fn show_general_error(&mut self) {
        let (title, message) = self.general_error();
        error!("Showing general error dialog");
        self.native.show_error_box(&title, &message);
    }

    fn filter(&self, id: &str) -> Result<FileFilter> {
        let extensions = match id {
            "supported" => vec!["bpmn", "dmn", "cmmn", "xml"],
            "bpmn" => vec!["bpmn", "xml"],
            "dmn" => vec!["dmn", "xml"],
            "cmmn" => vec!["cmmn", "xml"],
            "all" => vec!["*"],
            "war" => vec!["war"],
            "png" => vec!["png"],
            "jpeg" => vec!["jpeg", "jpg"],
            "svg" => vec!["svg"],
            other => return Err(dialog_error!("unknown file type <{}>", other)),
        };

        Ok(FileFilter {
            name: self.locale.t(&format!("filter.{}", id)),
            extensions,
        })
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("default_path", &self.default_path)
            .finish()
    }
}

fn require<'a>(value: &'a Option<String>, option: &str, kind: DialogKind) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| EditorError::missing_option(option, format!("{} dialog", kind)).into())
}

fn user_desktop_path() -> PathBuf {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, Default)]
struct HeadlessState {
    open: VecDeque<Vec<PathBuf>>,
    save: VecDeque<Option<PathBuf>>,
    buttons: VecDeque<&'static str>,
    shown: Vec<DialogDescriptor>,
    errors: Vec<(String, String)>,
}

/// [`NativeDialogs`] answering from a script.
///
/// Unscripted open and save dialogs are cancelled, unscripted message boxes
/// answer `cancel` (or their first button). Clones share the same script.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDialogs {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next open dialog with these files.
    pub fn answer_open(&self, files: Vec<PathBuf>) {
        self.lock().open.push_back(files);
    }

    /// Answer the next save dialog with this file.
    pub fn answer_save(&self, file: Option<PathBuf>) {
        self.lock().save.push_back(file);
    }

    /// Click the button with this id in the next message box.
    pub fn answer_button(&self, id: &'static str) {
        self.lock().buttons.push_back(id);
    }

    /// Every descriptor shown so far.
    pub fn shown(&self) -> Vec<DialogDescriptor> {
        self.lock().shown.clone()
    }

    /// Error boxes shown so far as `(title, message)`.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.lock().errors.clone()
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl NativeDialogs for HeadlessDialogs {
    async fn show_open(&mut self, descriptor: &DialogDescriptor) -> Result<Vec<PathBuf>> {
        let mut state = self.lock();
        state.shown.push(descriptor.clone());
        Ok(state.open.pop_front().unwrap_or_default())
    }

    async fn show_save(&mut self, descriptor: &DialogDescriptor) -> Result<Option<PathBuf>> {
        let mut state = self.lock();
        state.shown.push(descriptor.clone());
        Ok(state.save.pop_front().flatten())
    }

    async fn show_message(&mut self, descriptor: &DialogDescriptor) -> Result<usize> {
        let mut state = self.lock();
        state.shown.push(descriptor.clone());

        let wanted = state.buttons.pop_front().unwrap_or("cancel");
        Ok(descriptor
            .buttons
            .iter()
            .position(|button| button.id == wanted)
            .unwrap_or(0))
    }

    fn show_error_box(&mut self, title: &str, message: &str) {
        self.lock().errors.push((title.to_string(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dialog(default_path: Option<PathBuf>) -> (Dialog, HeadlessDialogs) {
        let native = HeadlessDialogs::new();
        let dialog = Dialog::new(
            Arc::new(Locale::default()),
            default_path,
            Box::new(native.clone()),
        );
        (dialog, native)
    }

    #[test]
    fn test_kind_names() {
        for kind in DialogKind::all() {
            assert_eq!(kind.as_str().parse::<DialogKind>().unwrap(), kind);
        }
        assert!("print".parse::<DialogKind>().unwrap_err().is_dialog());
    }

    #[test]
    fn test_required_options() {
        let (dialog, _) = dialog(None);
        let required: [(DialogKind, &str); 6] = [
            (DialogKind::Save, "name"),
            (DialogKind::Close, "name"),
            (DialogKind::ImportError, "name"),
            (DialogKind::UnrecognizedFile, "name"),
            (DialogKind::ExistingFile, "name"),
            (DialogKind::Namespace, "type"),
        ];

        for (kind, option) in required {
            let error = dialog.descriptor(kind, &DialogOptions::new()).unwrap_err();
            assert!(error.is_missing_option(), "{} should require options", kind);
            assert!(error.to_string().contains(option));
        }

        let no_type = dialog
            .descriptor(DialogKind::Save, &DialogOptions::new().name("a.bpmn"))
            .unwrap_err();
        assert!(no_type.to_string().contains("fileType"));

        let no_details = dialog
            .descriptor(DialogKind::ImportError, &DialogOptions::new().name("a.bpmn"))
            .unwrap_err();
        assert!(no_details.is_missing_option());

        for kind in [DialogKind::Open, DialogKind::ContentChanged, DialogKind::SavingDenied] {
            assert!(dialog.descriptor(kind, &DialogOptions::new()).is_ok());
        }
    }

    #[tokio::test]
    async fn test_missing_option_fails_before_showing() {
        let (mut dialog, native) = dialog(None);

        let error = dialog
            .show(DialogKind::Save, &DialogOptions::new().file_type("bpmn"))
            .await
            .unwrap_err();

        assert!(error.is_missing_option());
        assert!(native.shown().is_empty());
    }

    #[test]
    fn test_save_descriptor() {
        let (dialog, _) = dialog(Some(PathBuf::from("/work")));
        let save = dialog
            .descriptor(DialogKind::Save, &DialogOptions::new().name("order.dmn").file_type("dmn"))
            .unwrap();

        assert_eq!(save.title, "Save order.dmn as...");
        assert_eq!(save.default_path, Some(PathBuf::from("/work/order.dmn")));
        assert_eq!(save.filters.len(), 2);
        assert_eq!(save.filters[0].extensions, vec!["dmn", "xml"]);
        assert_eq!(save.filters[1].extensions, vec!["*"]);

        let unknown = dialog
            .descriptor(DialogKind::Save, &DialogOptions::new().name("a").file_type("pdf"))
            .unwrap_err();
        assert!(unknown.is_dialog());
    }

    #[test]
    fn test_file_path_overrides_default() {
        let (dialog, _) = dialog(Some(PathBuf::from("/work")));
        let open = dialog
            .descriptor(DialogKind::Open, &DialogOptions::new().file_path("/projects/a/b.bpmn"))
            .unwrap();

        assert_eq!(open.default_path, Some(PathBuf::from("/projects/a")));
        assert_eq!(open.properties, vec!["openFile", "multiSelections"]);
        assert_eq!(open.filters.len(), 6);
        assert_eq!(open.filters[5].name, "War archive");
    }

    #[test]
    fn test_message_texts() {
        let (dialog, _) = dialog(None);

        let import = dialog
            .descriptor(
                DialogKind::ImportError,
                &DialogOptions::new().name("broken.bpmn").error_details("unparsable content"),
            )
            .unwrap();
        assert_eq!(import.message_type, Some(MessageType::Error));
        assert_eq!(
            import.detail.as_deref(),
            Some(concat!(
                "unparsable content\n\n",
                "Do you believe \"broken.bpmn\" is valid BPMN or DMN diagram?\n\n",
            ))
        );

        let bpmn = dialog
            .descriptor(DialogKind::Namespace, &DialogOptions::new().diagram_type("bpmn"))
            .unwrap();
        assert_eq!(bpmn.title, "Deprecated <activiti> namespace detected");
        assert!(bpmn.message.as_ref().unwrap().contains("<camunda>"));
        assert_eq!(bpmn.button_labels(), vec!["Cancel", "No", "Yes"]);

        let dmn = dialog
            .descriptor(DialogKind::Namespace, &DialogOptions::new().diagram_type("dmn"))
            .unwrap();
        assert_eq!(dmn.title, "Deprecated DMN namespace detected");
        assert_eq!(dmn.detail.as_deref(), Some(""));

        let denied = dialog.descriptor(DialogKind::SavingDenied, &DialogOptions::new()).unwrap();
        assert_eq!(denied.button_id(1).unwrap(), "save-as");
        assert!(denied.button_id(2).is_err());
    }

    #[tokio::test]
    async fn test_button_ids_not_positions() {
        let (mut dialog, native) = dialog(None);
        let options = DialogOptions::new().name("diagram.bpmn");

        native.answer_button("discard");
        let answer = dialog.show(DialogKind::Close, &options).await.unwrap();
        assert!(answer.is_button("discard"));

        let answer = dialog.show(DialogKind::ExistingFile, &options).await.unwrap();
        assert_eq!(answer, DialogAnswer::Button("cancel"));

        native.answer_button("overwrite");
        let answer = dialog.show(DialogKind::ExistingFile, &options).await.unwrap();
        assert!(answer.is_button("overwrite"));
        assert_eq!(native.shown().len(), 3);
    }

    #[tokio::test]
    async fn test_chosen_directory_becomes_default() {
        let dir = tempdir().unwrap();
        let (mut dialog, native) = dialog(Some(PathBuf::from("/initial")));

        let answer = dialog.show(DialogKind::Open, &DialogOptions::new()).await.unwrap();
        assert_eq!(answer, DialogAnswer::Cancelled);
        assert_eq!(dialog.default_path(), Path::new("/initial"));

        let chosen = dir.path().join("nested").join("order.bpmn");
        native.answer_save(Some(chosen.clone()));
        let answer = dialog
            .show(DialogKind::Save, &DialogOptions::new().name("order.bpmn").file_type("bpmn"))
            .await
            .unwrap();
        assert_eq!(answer.file(), Some(chosen.as_path()));
        assert_eq!(dialog.default_path(), dir.path().join("nested"));

        let next = dialog.descriptor(DialogKind::Open, &DialogOptions::new()).unwrap();
        assert_eq!(next.default_path, Some(dir.path().join("nested")));
    }

    #[test]
    fn test_general_error() {
        let (mut dialog, native) = dialog(None);
        dialog.show_general_error();

        let errors = native.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "Error");
        assert_eq!(errors[0].1, "There was an internal error.\nPlease try again.");
    }

    #[test]
    fn test_options_from_json() {
        let options = DialogOptions::from_json(&serde_json::json!({
            "name": "a.bpmn",
            "fileType": "bpmn",
            "filePath": "/tmp/a.bpmn"
        }));

        assert_eq!(options.name.as_deref(), Some("a.bpmn"));
        assert_eq!(options.file_type.as_deref(), Some("bpmn"));
        assert_eq!(options.file_path, Some(PathBuf::from("/tmp/a.bpmn")));
        assert!(options.diagram_type.is_none());
    }
}
