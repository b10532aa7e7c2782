//! Export codecs turning a tab's content into image files and web archives.
//!
//! SVG comes straight from the diagram engine. PNG and JPEG rasterize that
//! SVG through an [`ImageRenderer`]. A war archive bundles the serialized
//! diagram with the descriptors a process engine needs to deploy it.

use crate::tab::{DiagramFile, MultiEditorTab};
use crate::{Error, Result};
use modeler_editor_api::{DiagramType, ExportFormat, Locale};
use std::io::{Cursor, Read, Write};
use std::sync::Arc;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const CLASSES_DIR: &str = "WEB-INF/classes/";

const PROCESSES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<process-application xmlns="http://www.camunda.org/schema/1.0/ProcessApplication">
  <process-archive>
    <properties>
      <property name="isDeleteUponUndeploy">false</property>
      <property name="isScanForProcessDefinitions">true</property>
    </properties>
  </process-archive>
</process-application>
"#;

const WEB_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<web-app xmlns="http://java.sun.com/xml/ns/javaee" version="3.0">
  <display-name>Process Application</display-name>
</web-app>
"#;

/// Converts SVG markup into raster image bytes.
pub trait ImageRenderer: Send + Sync {
    /// Render `svg` on a white background in the given raster format.
    fn render(&self, svg: &str, format: ExportFormat) -> Result<Vec<u8>>;
}

/// Rasterize `svg` into `format`.
///
/// # Errors
///
/// Returns an export error for formats that are not raster images, or when
/// no renderer is available.
pub fn generate_image(
    renderer: Option<&dyn ImageRenderer>,
    locale: &Locale,
    format: ExportFormat,
    svg: &str,
) -> Result<Vec<u8>> {
    if !format.is_raster() {
        return Err(Error::export(locale.t_with(
            "editor.unknown_image_type",
            &[("type", format.extension())],
        )));
    }

    let renderer =
        renderer.ok_or_else(|| Error::export(format!("no renderer available for {}", format)))?;
    renderer.render(svg, format)
}

/// Bundle a diagram into a deployable web archive.
///
/// # Example
///
/// ```rust
/// use modeler_core::export::{generate_war, read_war};
///
/// let xml = r#"<definitions id="Definitions_1"/>"#;
/// let archive = generate_war(xml, "order.bpmn", "orders").unwrap();
///
/// let files = read_war(&archive).unwrap();
/// assert_eq!(files[0].name, "order.bpmn");
/// assert_eq!(files[0].contents, xml);
/// ```
///
/// # Errors
///
/// Returns an error if the archive cannot be written.
pub fn generate_war(xml: &str, file_name: &str, process_name: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let entries = [
        ("META-INF/processes.xml".to_string(), PROCESSES_XML.to_string()),
        ("WEB-INF/web.xml".to_string(), WEB_XML.to_string()),
        (
            format!("{}process.properties", CLASSES_DIR),
            format!("process.name={}", process_name),
        ),
        (format!("{}{}", CLASSES_DIR, file_name), xml.to_string()),
    ];

    for (name, contents) in &entries {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(contents.as_bytes())?;
    }

    let archive = zip.finish()?.into_inner();
    debug!("Packed {} into a {} byte archive", file_name, archive.len());
    Ok(archive)
}

/// Diagrams bundled in a web archive, in archive order.
///
/// The returned files have no location on disk yet.
///
/// # Errors
///
/// Returns an error if the archive is unreadable or holds no diagram.
pub fn read_war(bytes: &[u8]) -> Result<Vec<DiagramFile>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut files = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(name) = entry.name().strip_prefix(CLASSES_DIR).map(str::to_string) else {
            continue;
        };

        if name.contains('/') {
            continue;
        }

        let extension = name.rsplit_once('.').map(|(_, extension)| extension);
        let Some(diagram_type) = DiagramType::from_extension(extension) else {
            continue;
        };

        let mut contents = String::new();
        entry.read_to_string(&mut contents)?;

        let mut file = DiagramFile::new(name, contents, diagram_type);
        file.is_unsaved = true;
        files.push(file);
    }

    if files.is_empty() {
        return Err(Error::not_found("diagram in war archive"));
    }

    Ok(files)
}

/// Name of an exported file: the diagram's name with the format's extension.
///
/// ```rust
/// use modeler_core::export::export_file_name;
/// use modeler_editor_api::ExportFormat;
///
/// assert_eq!(export_file_name("diagram_1.bpmn", ExportFormat::Png), "diagram_1.png");
/// assert_eq!(export_file_name("README", ExportFormat::Svg), "README.svg");
/// ```
pub fn export_file_name(file_name: &str, format: ExportFormat) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem);
    format!("{}.{}", stem, format.extension())
}

/// Result of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// Suggested file name
    pub name: String,
    pub format: ExportFormat,
    pub contents: Vec<u8>,
}

/// Exports tabs in any format their active editor supports.
#[derive(Clone)]
pub struct Exporter {
    locale: Arc<Locale>,
    renderer: Option<Arc<dyn ImageRenderer>>,
    war_process_name: String,
}

impl Exporter {
    pub fn new<S: Into<String>>(locale: Arc<Locale>, war_process_name: S) -> Self {
        Self {
            locale,
            renderer: None,
            war_process_name: war_process_name.into(),
        }
    }

    /// Use `renderer` for PNG and JPEG exports.
    pub fn with_renderer(mut self, renderer: Arc<dyn ImageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Export the active editor's content of `tab`.
    ///
    /// Exporting never marks the tab as saved.
    ///
    /// # Errors
    ///
    /// Returns an export error if the active editor does not offer `format`,
    /// and the editor's error if rendering or serializing fails.
    pub async fn export(
        &self,
        tab: &mut MultiEditorTab,
        format: ExportFormat,
    ) -> Result<ExportedFile> {
        if !tab.state().can_export(format) {
            return Err(Error::export(format!(
                "{} cannot be exported as {}",
                tab.file().name,
                format
            )));
        }

        let contents = match format {
            ExportFormat::Svg => tab.export_svg().await?.into_bytes(),
            ExportFormat::Png | ExportFormat::Jpeg => {
                let svg = tab.export_svg().await?;
                generate_image(self.renderer.as_deref(), &self.locale, format, &svg)?
            }
            ExportFormat::War => {
                let xml = tab.serialize().await?;
                generate_war(&xml, &tab.file().name, &self.war_process_name)?
            }
        };

        let name = export_file_name(&tab.file().name, format);
        info!("Exported {} ({} bytes)", name, contents.len());

        Ok(ExportedFile {
            name,
            format,
            contents,
        })
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("language", &self.locale.language())
            .field("has_renderer", &self.has_renderer())
            .field("war_process_name", &self.war_process_name)
            .finish()
    }
}
