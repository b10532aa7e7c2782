//! State snapshots describing which actions the focused editor supports.
//!
//! A [`StateContext`] is rebuilt from engine introspection on every relevant
//! change and handed, unchanged, through the tab to the menu builder. It is
//! never patched field by field: producers construct a fresh value each time.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Snapshot of the actions that are currently valid for the focused editor.
///
/// # Example
///
/// ```rust
/// use modeler_editor_api::{ExportFormat, StateContext};
///
/// let state = StateContext {
///     bpmn: true,
///     undo: true,
///     export_as: Some(vec![ExportFormat::Svg]),
///     ..StateContext::default()
/// };
///
/// assert!(state.can_export(ExportFormat::Svg));
/// assert!(!state.can_export(ExportFormat::Png));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateContext {
    /// Focused editor shows a BPMN diagram
    pub bpmn: bool,
    /// Focused editor shows a DMN diagram or table
    pub dmn: bool,
    /// Focused editor shows a CMMN diagram
    pub cmmn: bool,
    /// Undo is available
    pub undo: bool,
    /// Redo is available
    pub redo: bool,
    /// Content differs from the last saved or imported state
    pub dirty: bool,
    /// Copying elements is supported
    pub copy: bool,
    /// Clipboard holds something to paste
    pub paste: bool,
    /// At least one element is selected
    pub elements_selected: bool,
    /// Editor accepts edit actions
    pub editable: bool,
    /// Editor supports find/replace
    pub searchable: bool,
    /// Editor supports zooming
    pub zoom: bool,
    /// Saving is possible
    pub save: bool,
    /// The focused tab can be closed
    pub closable: bool,
    /// Supported export formats, `None` when exporting is unavailable
    #[serde(deserialize_with = "deserialize_export_as")]
    pub export_as: Option<Vec<ExportFormat>>,
    /// No text input currently owns the keyboard
    pub inactive_input: bool,
    /// A DMN rule is being edited
    pub dmn_rule_editing: bool,
    /// A DMN clause is being edited
    pub dmn_clause_editing: bool,
    /// Active sub-view of a DMN editor
    pub active_editor: Option<ActiveView>,
}

impl StateContext {
    /// Check whether the given export format is currently supported.
    pub fn can_export(&self, format: ExportFormat) -> bool {
        self.export_as
            .as_ref()
            .map_or(false, |formats| formats.contains(&format))
    }

    /// The diagram type flagged in this snapshot, if any.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_editor_api::{DiagramType, StateContext};
    ///
    /// let state = StateContext { dmn: true, ..StateContext::default() };
    /// assert_eq!(state.diagram_type(), Some(DiagramType::Dmn));
    /// ```
    pub fn diagram_type(&self) -> Option<DiagramType> {
        if self.bpmn {
            Some(DiagramType::Bpmn)
        } else if self.dmn {
            Some(DiagramType::Dmn)
        } else if self.cmmn {
            Some(DiagramType::Cmmn)
        } else {
            None
        }
    }

    /// Return a new snapshot carrying the shell-level `save` and `closable` flags.
    ///
    /// The receiver is left untouched; the result is a complete new value.
    pub fn with_shell_flags(&self, save: bool, closable: bool) -> Self {
        Self {
            save,
            closable,
            ..self.clone()
        }
    }
}

/// Accepts either `false` or a list of formats, the two shapes menu state
/// files use for `exportAs`.
fn deserialize_export_as<'de, D>(deserializer: D) -> Result<Option<Vec<ExportFormat>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Flag(bool),
        Formats(Vec<ExportFormat>),
        Missing(()),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Formats(formats) => Ok(Some(formats)),
        Repr::Flag(_) | Repr::Missing(()) => Ok(None),
    }
}

/// Sub-view of a DMN editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    /// Decision requirements diagram
    Diagram,
    /// Decision table
    Table,
}

/// Export formats a diagram can be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG raster image
    Png,
    /// JPEG raster image
    Jpeg,
    /// SVG vector image
    Svg,
    /// Web archive bundling the diagram for deployment
    War,
}

impl ExportFormat {
    /// All formats in menu order.
    pub fn all() -> [ExportFormat; 4] {
        [
            ExportFormat::Png,
            ExportFormat::Jpeg,
            ExportFormat::Svg,
            ExportFormat::War,
        ]
    }

    /// Image formats a diagram editor can render.
    pub fn images() -> Vec<ExportFormat> {
        vec![ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::Svg]
    }

    /// File extension, also used as the format identifier.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Svg => "svg",
            ExportFormat::War => "war",
        }
    }

    /// Whether the format is produced by rasterizing SVG.
    pub fn is_raster(&self) -> bool {
        matches!(self, ExportFormat::Png | ExportFormat::Jpeg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "svg" => Ok(ExportFormat::Svg),
            "war" => Ok(ExportFormat::War),
            other => Err(format!("unknown export format <{}>", other)),
        }
    }
}

/// Diagram notations supported by the modeler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    /// Business Process Model and Notation
    Bpmn,
    /// Decision Model and Notation
    Dmn,
    /// Case Management Model and Notation
    Cmmn,
}

impl DiagramType {
    /// File extension for this notation.
    pub fn extension(&self) -> &'static str {
        match self {
            DiagramType::Bpmn => "bpmn",
            DiagramType::Dmn => "dmn",
            DiagramType::Cmmn => "cmmn",
        }
    }

    /// Upper-case display tag, e.g. `BPMN`.
    pub fn tag(&self) -> &'static str {
        match self {
            DiagramType::Bpmn => "BPMN",
            DiagramType::Dmn => "DMN",
            DiagramType::Cmmn => "CMMN",
        }
    }

    /// Determine the notation from a file extension.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_editor_api::DiagramType;
    ///
    /// assert_eq!(DiagramType::from_extension(Some("dmn")), Some(DiagramType::Dmn));
    /// assert_eq!(DiagramType::from_extension(Some("txt")), None);
    /// ```
    pub fn from_extension(extension: Option<&str>) -> Option<Self> {
        match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("bpmn") | Some("bpmn2") => Some(DiagramType::Bpmn),
            Some("dmn") => Some(DiagramType::Dmn),
            Some("cmmn") => Some(DiagramType::Cmmn),
            _ => None,
        }
    }

    /// Guess the notation from the namespaces declared in diagram content.
    pub fn sniff(content: &str) -> Option<Self> {
        if content.contains("http://www.omg.org/spec/BPMN/") {
            Some(DiagramType::Bpmn)
        } else if content.contains("http://www.omg.org/spec/DMN/") {
            Some(DiagramType::Dmn)
        } else if content.contains("http://www.omg.org/spec/CMMN/") {
            Some(DiagramType::Cmmn)
        } else {
            None
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DiagramType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiagramType::from_extension(Some(s)).ok_or_else(|| format!("unknown diagram type <{}>", s))
    }
}
