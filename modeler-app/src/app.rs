//! Subcommand implementations.
//!
//! Each subcommand returns the text to print; `main` owns the output.

use crate::AppArgs;
use anyhow::{anyhow, Context};
use modeler_core::dialog::HeadlessDialogs;
use modeler_core::menu::HeadlessMenu;
use modeler_core::{
    command_channel, AppCommand, Application, Config, DiagramFile, Dialog, DialogKind,
    DialogOptions, Exporter, MenuBuilder, MenuCapabilities, MultiEditorTab, SvgRenderer,
};
use modeler_editor_api::{EditorEvent, ExportFormat, LogEntry, StateContext};
use modeler_editors::MemoryEngine;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Button ids a command script may click.
const BUTTON_IDS: [&str; 10] = [
    "ok",
    "cancel",
    "save",
    "discard",
    "ask-forum",
    "overwrite",
    "no-overwrite",
    "yes",
    "no",
    "save-as",
];

pub fn load_config(args: &AppArgs) -> anyhow::Result<Config> {
    match &args.config_path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(Config::load_or_default()?),
    }
}

/// Menu tree as JSON, for the application menu or a context menu.
pub fn menu(
    config: &Config,
    state_path: Option<&Path>,
    context: Option<&str>,
    tab_id: Option<&str>,
) -> anyhow::Result<String> {
    let text = match state_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state from {}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin())?,
    };

    let state = parse_state(&text)?;
    let capabilities = MenuCapabilities::from_config(config);
    let locale = config.locale();
    let builder = MenuBuilder::new(&capabilities, &state, &locale);

    let tree = match context {
        Some(kind) => builder
            .build_context_menu(kind, tab_id)
            .ok_or_else(|| anyhow!("unknown context menu <{}>", kind))?,
        None => builder.build(),
    };

    Ok(serde_json::to_string_pretty(&tree)?)
}

fn parse_state(text: &str) -> anyhow::Result<StateContext> {
    if text.trim().is_empty() {
        return Ok(StateContext::default());
    }

    serde_json::from_str(text).context("Invalid state JSON")
}

/// Dialog descriptor as JSON.
pub fn dialog(config: &Config, kind: &str, options: Option<&str>) -> anyhow::Result<String> {
    let kind: DialogKind = kind.parse()?;
    let options = match options {
        Some(text) => {
            let value: Value = serde_json::from_str(text).context("Invalid options JSON")?;
            DialogOptions::from_json(&value)
        }
        None => DialogOptions::new(),
    };

    let dialog = Dialog::new(
        config.locale(),
        config.dialogs.default_path.clone(),
        Box::new(HeadlessDialogs::new()),
    );
    let descriptor = dialog.descriptor(kind, &options)?;

    Ok(serde_json::to_string_pretty(&descriptor)?)
}

async fn open_tab(config: &Config, file: &Path) -> anyhow::Result<MultiEditorTab> {
    let file = DiagramFile::load(file).await?;
    let mut tab =
        MultiEditorTab::for_file(file, &config.editor_options(), MemoryEngine::factory())?;
    tab.open().await?;
    Ok(tab)
}

/// Editor state after opening a diagram, as JSON.
pub async fn inspect(config: &Config, file: &Path) -> anyhow::Result<String> {
    let mut tab = open_tab(config, file).await?;

    let log: Vec<LogEntry> = tab
        .take_messages()
        .into_iter()
        .filter_map(|message| match message.into_event() {
            EditorEvent::Log(entries) => Some(entries),
            _ => None,
        })
        .flatten()
        .collect();

    let report = json!({
        "name": tab.file().name,
        "type": tab.file().diagram_type.extension(),
        "editor": tab.active_definition().id,
        "editors": tab.definitions().iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
        "state": tab.state(),
        "log": log,
    });
    tab.destroy();

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Export a diagram and write the result.
pub async fn export(
    config: &Config,
    file: &Path,
    format: &str,
    out: Option<PathBuf>,
) -> anyhow::Result<String> {
    let format: ExportFormat = format.parse().map_err(|e: String| anyhow!(e))?;
    let mut tab = open_tab(config, file).await?;

    let exporter = Exporter::new(config.locale(), config.export.war_process_name.clone())
        .with_renderer(Arc::new(SvgRenderer::new()));
    let exported = exporter.export(&mut tab, format).await;
    tab.destroy();
    let exported = exported?;

    let target = out.unwrap_or_else(|| file.with_file_name(&exported.name));
    tokio::fs::write(&target, &exported.contents)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;

    info!("Exported {} as {}", file.display(), format);
    Ok(format!("Wrote {} ({} bytes)", target.display(), exported.contents.len()))
}

/// Feed commands read from standard input to a headless application.
///
/// Every line is a JSON object: either a command `{"id": ..., "options": ...}`
/// or a scripted dialog answer `{"answerButton": "discard"}`,
/// `{"answerSave": "/path"}`, `{"answerOpen": ["/path"]}`.
pub async fn run(config: Config) -> anyhow::Result<String> {
    let dialogs = HeadlessDialogs::new();
    let menu_host = HeadlessMenu::new();
    let mut application = Application::new(
        config,
        MemoryEngine::factory(),
        Box::new(dialogs.clone()),
        Box::new(menu_host.clone()),
    )?
    .with_renderer(Arc::new(SvgRenderer::new()));

    let (sender, receiver) = command_channel();
    let script = dialogs.clone();
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let request: Value = serde_json::from_str(line)
                .with_context(|| format!("Invalid command <{}>", line))?;
            if let Some(command) = script_line(&script, &request)? {
                debug!("Queueing {}", command);
                if sender.send(command).await.is_err() {
                    break;
                }
            }
        }

        Ok::<(), anyhow::Error>(())
    });

    application.run(receiver).await?;

    if reader.is_finished() {
        reader.await??;
    } else {
        reader.abort();
    }

    let summary = json!({
        "menu": menu_host.installed(),
        "dialogs": dialogs.shown(),
        "errors": dialogs
            .errors()
            .into_iter()
            .map(|(title, message)| json!({ "title": title, "message": message }))
            .collect::<Vec<_>>(),
    });

    Ok(serde_json::to_string_pretty(&summary)?)
}

/// Apply a script line. Returns the command it carries, if any.
fn script_line(dialogs: &HeadlessDialogs, request: &Value) -> anyhow::Result<Option<AppCommand>> {
    if let Some(button) = request.get("answerButton").and_then(Value::as_str) {
        let id = BUTTON_IDS
            .into_iter()
            .find(|id| *id == button)
            .ok_or_else(|| anyhow!("unknown button <{}>", button))?;
        dialogs.answer_button(id);
        return Ok(None);
    }

    if let Some(save) = request.get("answerSave") {
        dialogs.answer_save(save.as_str().map(PathBuf::from));
        return Ok(None);
    }

    if let Some(open) = request.get("answerOpen") {
        let paths =
            serde_json::from_value(open.clone()).context("answerOpen takes a list of paths")?;
        dialogs.answer_open(paths);
        return Ok(None);
    }

    let id = request
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("command without id"))?;
    let options = request.get("options").cloned().unwrap_or_else(|| json!({}));

    Ok(Some(AppCommand::parse(id, &options)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeler_core::tab::NewDiagram;
    use tempfile::tempdir;

    const XML: &str = r#"<definitions id="Definitions_1"><process id="Process_1"/></definitions>"#;

    #[test]
    fn test_menu_from_state_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"cmmn": true, "editable": true, "exportAs": false}"#).unwrap();

        let output = menu(&Config::default(), Some(&path), None, None).unwrap();
        let tree: Value = serde_json::from_str(&output).unwrap();
        let labels: Vec<&str> = tree
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|item| item.get("label").and_then(Value::as_str))
            .collect();
        assert_eq!(labels, vec!["File", "Edit", "Window", "Help"]);

        assert!(menu(&Config::default(), Some(&path), Some("canvas"), None).is_err());
    }

    #[test]
    fn test_dialog_descriptor() {
        let output =
            dialog(&Config::default(), "close", Some(r#"{"name": "order.bpmn"}"#)).unwrap();
        let descriptor: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(descriptor["kind"], "close");
        assert_eq!(descriptor["buttons"][2]["id"], "discard");

        assert!(dialog(&Config::default(), "close", None).is_err());
        assert!(dialog(&Config::default(), "print", None).is_err());
    }

    #[tokio::test]
    async fn test_inspect_and_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("order.bpmn");
        std::fs::write(&path, XML).unwrap();

        let report = inspect(&Config::default(), &path).await.unwrap();
        let report: Value = serde_json::from_str(&report).unwrap();
        assert_eq!(report["editor"], "diagram");
        assert_eq!(report["state"]["bpmn"], true);
        assert_eq!(report["editors"], json!(["diagram", "xml", "form-editor"]));

        export(&Config::default(), &path, "war", None).await.unwrap();
        assert!(dir.path().join("order.war").exists());

        let image = dir.path().join("diagram.png");
        export(&Config::default(), &path, "png", Some(image.clone())).await.unwrap();
        assert_eq!(&std::fs::read(&image).unwrap()[1..4], b"PNG");
    }

    #[test]
    fn test_script_lines() {
        let dialogs = HeadlessDialogs::new();

        assert!(script_line(&dialogs, &json!({ "answerButton": "discard" })).unwrap().is_none());
        assert!(script_line(&dialogs, &json!({ "answerButton": "maybe" })).is_err());
        assert_eq!(
            script_line(&dialogs, &json!({ "id": "create-bpmn-diagram" })).unwrap(),
            Some(AppCommand::CreateDiagram(NewDiagram::Bpmn))
        );
        assert!(script_line(&dialogs, &json!({ "options": {} })).is_err());
    }
}
