//! Lightweight inspection and rewriting of diagram XML.
//!
//! This is not schema validation. It only answers the questions editors need
//! answered before handing content to an engine: is the document well formed,
//! what is its root element, which element ids does it declare and which ids
//! does it reference.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::Writer;
use std::collections::HashSet;

/// Attributes that hold references to other elements.
const REFERENCE_ATTRIBUTES: [&str; 4] = ["sourceRef", "targetRef", "bpmnElement", "dmnElementRef"];

/// Structural summary of a diagram document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Local name of the root element
    pub root: String,
    /// Declared element ids, in document order
    pub ids: Vec<String>,
    /// `(attribute, id)` pairs for every reference found
    pub references: Vec<(String, String)>,
}

impl DocumentSummary {
    /// References whose target id is not declared in the document.
    pub fn unresolved_references(&self) -> Vec<(String, String)> {
        let ids: HashSet<&str> = self.ids.iter().map(String::as_str).collect();

        self.references
            .iter()
            .filter(|(_, target)| !ids.contains(target.as_str()))
            .cloned()
            .collect()
    }
}

/// Parse `xml` and summarise it.
///
/// # Errors
///
/// Returns a description of the first well-formedness problem: a parser
/// error, content outside the root element, a second root element, unclosed
/// elements, or no root element at all.
///
/// # Example
///
/// ```rust
/// use modeler_editors::content::inspect;
///
/// let summary = inspect(r#"<definitions id="d"><process id="p"/></definitions>"#).unwrap();
/// assert_eq!(summary.root, "definitions");
/// assert_eq!(summary.ids, vec!["d", "p"]);
///
/// assert!(inspect("<definitions>").is_err());
/// ```
pub fn inspect(xml: &str) -> Result<DocumentSummary, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut summary = DocumentSummary::default();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                open_element(&e, depth, &mut seen_root, &mut summary)?;
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                open_element(&e, depth, &mut seen_root, &mut summary)?;
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(_)) | Ok(Event::CData(_)) if depth == 0 => {
                return Err(format!(
                    "content outside of the root element at position {}",
                    reader.buffer_position()
                ));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                ));
            }
            _ => (),
        }
    }

    if !seen_root {
        return Err("no root element found".to_string());
    }

    if depth > 0 {
        return Err(format!("unexpected end of input, {} unclosed element(s)", depth));
    }

    Ok(summary)
}

/// Whether `xml` is well formed.
pub fn is_well_formed(xml: &str) -> bool {
    inspect(xml).is_ok()
}

fn open_element(
    element: &BytesStart<'_>,
    depth: usize,
    seen_root: &mut bool,
    summary: &mut DocumentSummary,
) -> Result<(), String> {
    if depth == 0 {
        if *seen_root {
            return Err("more than one root element".to_string());
        }

        *seen_root = true;
        summary.root = String::from_utf8_lossy(element.local_name().as_ref()).to_string();
    }

    for attribute in element.attributes().flatten() {
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).to_string();
        let value = String::from_utf8_lossy(&attribute.value).to_string();

        if key == "id" {
            summary.ids.push(value);
        } else if REFERENCE_ATTRIBUTES.contains(&key.as_str()) {
            summary.references.push((key, value));
        }
    }

    Ok(())
}

/// Set `exporter` and `exporterVersion` on the root element.
///
/// Everything else in the document is written back untouched.
///
/// # Example
///
/// ```rust
/// use modeler_editors::content::stamp_exporter;
///
/// let xml = stamp_exporter(r#"<definitions exporter="old"/>"#, "Modeler", "1.2.0").unwrap();
/// assert_eq!(xml, r#"<definitions exporter="Modeler" exporterVersion="1.2.0"/>"#);
/// ```
pub fn stamp_exporter(xml: &str, name: &str, version: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut stamped = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("XML error at position {}: {}", reader.buffer_position(), e))?;

        let event = match event {
            Event::Eof => break,
            Event::Start(e) if !stamped => {
                stamped = true;
                Event::Start(with_exporter(&e, name, version))
            }
            Event::Empty(e) if !stamped => {
                stamped = true;
                Event::Empty(with_exporter(&e, name, version))
            }
            other => other,
        };

        writer.write_event(event).map_err(|e| e.to_string())?;
    }

    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

fn with_exporter(element: &BytesStart<'_>, name: &str, version: &str) -> BytesStart<'static> {
    let kept: Vec<(Vec<u8>, Vec<u8>)> = element
        .attributes()
        .flatten()
        .filter(|a| !matches!(a.key.as_ref(), b"exporter" | b"exporterVersion"))
        .map(|a| (a.key.as_ref().to_vec(), a.value.to_vec()))
        .collect();

    let mut stamped = element.to_owned().into_owned();
    stamped.clear_attributes();

    for (key, value) in &kept {
        stamped.push_attribute((key.as_slice(), value.as_slice()));
    }
    stamped.push_attribute(("exporter", name));
    stamped.push_attribute(("exporterVersion", version));

    stamped
}

/// Remove the elements with the given ids, including their children.
pub fn remove_elements(xml: &str, ids: &[String]) -> Result<String, String> {
    let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut skip_depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("XML error at position {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Eof => break,
            Event::Start(e) => {
                if skip_depth > 0 || has_id_in(&e, &doomed) {
                    skip_depth += 1;
                    continue;
                }
                writer.write_event(Event::Start(e)).map_err(|e| e.to_string())?;
            }
            Event::Empty(e) => {
                if skip_depth > 0 || has_id_in(&e, &doomed) {
                    continue;
                }
                writer.write_event(Event::Empty(e)).map_err(|e| e.to_string())?;
            }
            Event::End(e) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    continue;
                }
                writer.write_event(Event::End(e)).map_err(|e| e.to_string())?;
            }
            other => {
                if skip_depth == 0 {
                    writer.write_event(other).map_err(|e| e.to_string())?;
                }
            }
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

fn has_id_in(element: &BytesStart<'_>, ids: &HashSet<&str>) -> bool {
    element.attributes().flatten().any(|a| {
        a.key.as_ref() == b"id" && ids.contains(String::from_utf8_lossy(&a.value).as_ref())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROCESS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="Definitions_1">
  <bpmn:process id="Process_1">
    <bpmn:startEvent id="Start_1"/>
    <bpmn:sequenceFlow id="Flow_1" sourceRef="Start_1" targetRef="End_1"/>
    <bpmn:endEvent id="End_1"/>
  </bpmn:process>
</bpmn:definitions>"#;

    #[test]
    fn test_inspect_prefixed_document() {
        let summary = inspect(PROCESS).unwrap();
        assert_eq!(summary.root, "definitions");
        assert_eq!(summary.ids.len(), 5);
        assert_eq!(summary.references.len(), 2);
        assert!(summary.unresolved_references().is_empty());
    }

    #[test]
    fn test_unresolved_references() {
        let xml = r#"<definitions><process id="p"><sequenceFlow id="f" sourceRef="p" targetRef="ghost"/></process></definitions>"#;
        let unresolved = inspect(xml).unwrap().unresolved_references();
        assert_eq!(unresolved, vec![("targetRef".to_string(), "ghost".to_string())]);
    }

    #[test]
    fn test_malformed_documents() {
        assert!(inspect("").is_err());
        assert!(inspect("just text").is_err());
        assert!(inspect("<a></b>").is_err());
        assert!(inspect("<a/><b/>").is_err());
        assert!(inspect("<a><b></b>").is_err());
        assert!(is_well_formed("<a><b/></a>"));
    }

    #[test]
    fn test_stamp_exporter_keeps_other_attributes() {
        let stamped = stamp_exporter(PROCESS, "Modeler", "2.0.0").unwrap();
        assert!(stamped.contains(r#"id="Definitions_1" exporter="Modeler" exporterVersion="2.0.0""#));
        assert!(stamped.contains(r#"<bpmn:startEvent id="Start_1"/>"#));
        assert!(stamped.starts_with("<?xml"));

        let twice = stamp_exporter(&stamped, "Modeler", "2.0.1").unwrap();
        assert_eq!(twice.matches("exporterVersion").count(), 1);
    }

    #[test]
    fn test_remove_elements_drops_subtrees() {
        let removed = remove_elements(PROCESS, &["Process_1".to_string()]).unwrap();
        assert!(!removed.contains("startEvent"));
        assert!(removed.contains("bpmn:definitions"));
        assert!(inspect(&removed).is_ok());

        let removed = remove_elements(PROCESS, &["Start_1".to_string()]).unwrap();
        assert!(!removed.contains("Start_1\"/>"));
        assert!(removed.contains("End_1"));
    }
}
