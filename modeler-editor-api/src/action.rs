//! Typed editor actions.
//!
//! Menu items and keyboard bindings name editor actions by a camelCase
//! identifier plus an optional options object. [`EditorAction::parse`] turns
//! that pair into a typed value, failing fast when a required option is
//! missing, and [`EditorAction::name`]/[`EditorAction::options`] go the
//! other way when an action has to be forwarded to an engine.

use crate::error::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Alignment targets for `alignElements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
    Center,
    Top,
    Bottom,
    Middle,
}

impl Alignment {
    /// All alignments in menu order.
    pub fn all() -> [Alignment; 6] {
        [
            Alignment::Left,
            Alignment::Right,
            Alignment::Center,
            Alignment::Top,
            Alignment::Bottom,
            Alignment::Middle,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Right => "right",
            Alignment::Center => "center",
            Alignment::Top => "top",
            Alignment::Bottom => "bottom",
            Alignment::Middle => "middle",
        }
    }
}

/// Directions for `moveCanvas`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// All directions in menu order.
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Left, Direction::Down, Direction::Right]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Left => "left",
            Direction::Down => "down",
            Direction::Right => "right",
        }
    }
}

/// Kind of clause added to a decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClauseKind {
    Input,
    Output,
}

impl ClauseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseKind::Input => "input",
            ClauseKind::Output => "output",
        }
    }
}

/// An action dispatched to the active editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    Undo,
    Redo,
    Copy,
    Paste,
    HandTool,
    LassoTool,
    SpaceTool,
    GlobalConnectTool,
    DirectEditing,
    AlignElements(Alignment),
    DistributeHorizontally,
    DistributeVertically,
    Find,
    FindNext,
    FindPrev,
    Replace,
    MoveToOrigin,
    MoveCanvas(Direction),
    SelectElements,
    RemoveSelection,
    RuleAdd,
    RuleAddAbove,
    RuleAddBelow,
    RuleClear,
    RuleRemove,
    ClauseAdd(ClauseKind),
    ClauseAddLeft,
    ClauseAddRight,
    ClauseRemove,
    InsertNewLine,
    SelectNextRow,
    SelectPreviousRow,
    ToggleEditingMode,
    ZoomIn,
    ZoomOut,
    Zoom,
    ZoomFit,
    /// Open or close the properties panel
    ToggleProperties,
    /// Drag the properties panel edge by `delta` pixels (positive shrinks)
    ResizeProperties { delta: i32 },
}

impl EditorAction {
    /// Identifier used by menus and engines.
    pub fn name(&self) -> &'static str {
        match self {
            EditorAction::Undo => "undo",
            EditorAction::Redo => "redo",
            EditorAction::Copy => "copy",
            EditorAction::Paste => "paste",
            EditorAction::HandTool => "handTool",
            EditorAction::LassoTool => "lassoTool",
            EditorAction::SpaceTool => "spaceTool",
            EditorAction::GlobalConnectTool => "globalConnectTool",
            EditorAction::DirectEditing => "directEditing",
            EditorAction::AlignElements(_) => "alignElements",
            EditorAction::DistributeHorizontally => "distributeHorizontally",
            EditorAction::DistributeVertically => "distributeVertically",
            EditorAction::Find => "find",
            EditorAction::FindNext => "findNext",
            EditorAction::FindPrev => "findPrev",
            EditorAction::Replace => "replace",
            EditorAction::MoveToOrigin => "moveToOrigin",
            EditorAction::MoveCanvas(_) => "moveCanvas",
            EditorAction::SelectElements => "selectElements",
            EditorAction::RemoveSelection => "removeSelection",
            EditorAction::RuleAdd => "ruleAdd",
            EditorAction::RuleAddAbove => "ruleAddAbove",
            EditorAction::RuleAddBelow => "ruleAddBelow",
            EditorAction::RuleClear => "ruleClear",
            EditorAction::RuleRemove => "ruleRemove",
            EditorAction::ClauseAdd(_) => "clauseAdd",
            EditorAction::ClauseAddLeft => "clauseAddLeft",
            EditorAction::ClauseAddRight => "clauseAddRight",
            EditorAction::ClauseRemove => "clauseRemove",
            EditorAction::InsertNewLine => "insertNewLine",
            EditorAction::SelectNextRow => "selectNextRow",
            EditorAction::SelectPreviousRow => "selectPreviousRow",
            EditorAction::ToggleEditingMode => "toggleEditingMode",
            EditorAction::ZoomIn => "zoomIn",
            EditorAction::ZoomOut => "zoomOut",
            EditorAction::Zoom => "zoom",
            EditorAction::ZoomFit => "zoomFit",
            EditorAction::ToggleProperties => "toggleProperties",
            EditorAction::ResizeProperties { .. } => "resizeProperties",
        }
    }

    /// Options object carried alongside the identifier.
    ///
    /// Actions without options yield an empty object.
    pub fn options(&self) -> Value {
        match self {
            EditorAction::AlignElements(alignment) => json!({ "type": alignment.as_str() }),
            EditorAction::MoveCanvas(direction) => json!({ "direction": direction.as_str() }),
            EditorAction::ClauseAdd(kind) => json!({ "type": kind.as_str() }),
            EditorAction::ResizeProperties { delta } => json!({ "delta": delta }),
            _ => json!({}),
        }
    }

    /// Parse an action identifier and its options.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownAction`] for unknown identifiers and
    /// [`EditorError::MissingOption`] when a required option is absent or
    /// not one of the accepted values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_editor_api::{Alignment, EditorAction};
    /// use serde_json::json;
    ///
    /// let action = EditorAction::parse("alignElements", &json!({ "type": "left" })).unwrap();
    /// assert_eq!(action, EditorAction::AlignElements(Alignment::Left));
    ///
    /// assert!(EditorAction::parse("alignElements", &json!({})).is_err());
    /// ```
    pub fn parse(name: &str, options: &Value) -> EditorResult<Self> {
        let action = match name {
            "undo" => EditorAction::Undo,
            "redo" => EditorAction::Redo,
            "copy" => EditorAction::Copy,
            "paste" => EditorAction::Paste,
            "handTool" => EditorAction::HandTool,
            "lassoTool" => EditorAction::LassoTool,
            "spaceTool" => EditorAction::SpaceTool,
            "globalConnectTool" => EditorAction::GlobalConnectTool,
            "directEditing" => EditorAction::DirectEditing,
            "alignElements" => EditorAction::AlignElements(required(name, options, "type")?),
            "distributeHorizontally" => EditorAction::DistributeHorizontally,
            "distributeVertically" => EditorAction::DistributeVertically,
            "find" => EditorAction::Find,
            "findNext" => EditorAction::FindNext,
            "findPrev" => EditorAction::FindPrev,
            "replace" => EditorAction::Replace,
            "moveToOrigin" => EditorAction::MoveToOrigin,
            "moveCanvas" => EditorAction::MoveCanvas(required(name, options, "direction")?),
            "selectElements" => EditorAction::SelectElements,
            "removeSelection" => EditorAction::RemoveSelection,
            "ruleAdd" => EditorAction::RuleAdd,
            "ruleAddAbove" => EditorAction::RuleAddAbove,
            "ruleAddBelow" => EditorAction::RuleAddBelow,
            "ruleClear" => EditorAction::RuleClear,
            "ruleRemove" => EditorAction::RuleRemove,
            "clauseAdd" => EditorAction::ClauseAdd(required(name, options, "type")?),
            "clauseAddLeft" => EditorAction::ClauseAddLeft,
            "clauseAddRight" => EditorAction::ClauseAddRight,
            "clauseRemove" => EditorAction::ClauseRemove,
            "insertNewLine" => EditorAction::InsertNewLine,
            "selectNextRow" => EditorAction::SelectNextRow,
            "selectPreviousRow" => EditorAction::SelectPreviousRow,
            "toggleEditingMode" => EditorAction::ToggleEditingMode,
            "zoomIn" => EditorAction::ZoomIn,
            "zoomOut" => EditorAction::ZoomOut,
            "zoom" => EditorAction::Zoom,
            "zoomFit" => EditorAction::ZoomFit,
            "toggleProperties" => EditorAction::ToggleProperties,
            "resizeProperties" => EditorAction::ResizeProperties {
                delta: required(name, options, "delta")?,
            },
            other => return Err(EditorError::UnknownAction(other.to_string())),
        };

        Ok(action)
    }

    /// Whether the action is handled by the command stack directly.
    pub fn is_history(&self) -> bool {
        matches!(self, EditorAction::Undo | EditorAction::Redo)
    }
}

impl fmt::Display for EditorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn required<T: serde::de::DeserializeOwned>(
    action: &str,
    options: &Value,
    key: &str,
) -> EditorResult<T> {
    options
        .get(key)
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .ok_or_else(|| EditorError::missing_option(key, action))
}
