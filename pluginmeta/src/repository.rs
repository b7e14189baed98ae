//! Plugin repository XML (`plugins.xml`).
//!
//! A repository document has one `<plugins>` root with one
//! `<pyqgis_plugin>` element per release:
//!
//! ```text
//! <plugins>
//!     <pyqgis_plugin name="Quick Map" version="1.4" plugin_id="17">
//!         <version>1.4</version>
//!         <file_name>quick_map.1.4.zip</file_name>
//!         <author_name>Jane Doe</author_name>
//!         ...
//!     </pyqgis_plugin>
//! </plugins>
//! ```
//!
//! [`split_document`] flattens every release into an [`XmlFields`] mapping
//! (attributes as `@`-prefixed keys, child elements by tag),
//! [`import_document`] turns those into records and [`export_document`]
//! writes records back out.

use std::fmt;

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{DocumentError, MetadataResult};
use crate::metadata::PluginMetadata;

/// Root element of a repository document.
pub const XML_ROOT: &str = "plugins";

/// Element holding one plugin release.
pub const XML_RELEASE: &str = "pyqgis_plugin";

/// Prefix of attribute keys in [`XmlFields`].
pub const ATTRIBUTE_PREFIX: char = '@';

/// Bare ampersand followed by a space, as found in some published documents.
const BARE_AMPERSAND: &str = "& ";
const ESCAPED_AMPERSAND: &str = "&amp; ";

/// One release element as key to optional text; empty elements are `None`.
pub type XmlFields = IndexMap<String, Option<String>>;

// Nesting levels while reading.
const ROOT_DEPTH: usize = 1;
const RELEASE_DEPTH: usize = 2;
const FIELD_DEPTH: usize = 3;

fn invalid_xml(err: impl fmt::Display) -> DocumentError {
    DocumentError::InvalidXml(err.to_string())
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

fn check_root(name: &str) -> Result<(), DocumentError> {
    if name == XML_ROOT {
        Ok(())
    } else {
        Err(invalid_xml(format_args!(
            "root element is '{}', expected '{}'",
            name, XML_ROOT
        )))
    }
}

fn nested_element(name: &str) -> DocumentError {
    invalid_xml(format_args!("unexpected nested element '{}' in field", name))
}

/// Attributes of a release element as `@`-prefixed keys.
fn release_attributes(element: &BytesStart<'_>) -> Result<XmlFields, DocumentError> {
    let mut fields = XmlFields::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(invalid_xml)?;
        let key = format!(
            "{}{}",
            ATTRIBUTE_PREFIX,
            String::from_utf8_lossy(attribute.key.as_ref())
        );
        let value = attribute.unescape_value().map_err(invalid_xml)?;
        fields.insert(key, Some(value.into_owned()));
    }
    Ok(fields)
}

fn append_text(field: &mut Option<(String, Option<String>)>, text: &str) {
    if let Some((_, value)) = field {
        value.get_or_insert_with(String::new).push_str(text);
    }
}

/// Trim the joined text of a field once; blank text is an absent value.
fn field_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Whether `name` can be written as an XML element or attribute name.
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == ':');
    valid_start && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

fn check_xml_name(name: &str) -> Result<(), DocumentError> {
    if is_xml_name(name) {
        Ok(())
    } else {
        Err(invalid_xml(format_args!(
            "field '{}' can not be written as an XML name",
            name
        )))
    }
}

/// Split a repository document into one mapping per release.
///
/// Bare `& ` sequences are escaped before parsing. Elements other than
/// releases below the root are skipped.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidXml`] for malformed XML, a root other
/// than `<plugins>`, or elements nested inside a field.
///
/// Field text is joined across text and CDATA pieces and trimmed once;
/// blank fields are absent.
pub fn split_document(xml: &str) -> MetadataResult<Vec<XmlFields>> {
    let bare = xml.matches(BARE_AMPERSAND).count();
    let xml = if bare > 0 {
        tracing::debug!(count = bare, "escaping bare ampersands in repository XML");
        xml.replace(BARE_AMPERSAND, ESCAPED_AMPERSAND)
    } else {
        xml.to_string()
    };

    // no per-event trimming: text and CDATA pieces of a field are joined first
    let mut reader = Reader::from_str(&xml);

    let mut releases = Vec::new();
    let mut release: Option<XmlFields> = None;
    let mut field: Option<(String, Option<String>)> = None;
    let mut depth = 0usize;
    let mut root_seen = false;

    loop {
        match reader.read_event().map_err(invalid_xml)? {
            Event::Start(element) => {
                let name = element_name(&element);
                match depth {
                    0 => {
                        check_root(&name)?;
                        root_seen = true;
                    }
                    ROOT_DEPTH if name == XML_RELEASE => {
                        release = Some(release_attributes(&element)?);
                    }
                    ROOT_DEPTH => {
                        reader.read_to_end(element.name()).map_err(invalid_xml)?;
                        continue;
                    }
                    RELEASE_DEPTH => field = Some((name, None)),
                    _ => return Err(nested_element(&name).into()),
                }
                depth += 1;
            }
            Event::Empty(element) => {
                let name = element_name(&element);
                match depth {
                    0 => {
                        check_root(&name)?;
                        root_seen = true;
                    }
                    ROOT_DEPTH if name == XML_RELEASE => {
                        releases.push(release_attributes(&element)?);
                    }
                    ROOT_DEPTH => {}
                    RELEASE_DEPTH => {
                        if let Some(release) = release.as_mut() {
                            release.insert(name, None);
                        }
                    }
                    _ => return Err(nested_element(&name).into()),
                }
            }
            Event::Text(text) if depth == FIELD_DEPTH => {
                let text = text.unescape().map_err(invalid_xml)?;
                append_text(&mut field, &text);
            }
            Event::CData(data) if depth == FIELD_DEPTH => {
                append_text(&mut field, &String::from_utf8_lossy(&data));
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid_xml("unexpected closing tag"))?;
                match depth {
                    RELEASE_DEPTH => {
                        if let (Some(release), Some((name, value))) =
                            (release.as_mut(), field.take())
                        {
                            release.insert(name, field_text(value));
                        }
                    }
                    ROOT_DEPTH => releases.extend(release.take()),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(invalid_xml("unexpected end of document").into());
    }
    if !root_seen {
        return Err(invalid_xml(format_args!("missing root element '{}'", XML_ROOT)).into());
    }

    tracing::debug!(releases = releases.len(), "split repository XML");
    Ok(releases)
}

/// Parse a repository document into one record per release.
///
/// ```
/// let xml = r#"<plugins>
///     <pyqgis_plugin name="Quick Map" version="1.4">
///         <version>1.4</version>
///         <file_name>quick_map.1.4.zip</file_name>
///     </pyqgis_plugin>
/// </plugins>"#;
///
/// let releases = pluginmeta::import_document(xml).unwrap();
/// assert_eq!(releases.len(), 1);
/// assert_eq!(releases[0].id(), "quick_map");
/// ```
pub fn import_document(xml: &str) -> MetadataResult<Vec<PluginMetadata>> {
    split_document(xml)?
        .into_iter()
        .map(PluginMetadata::from_xml_fields)
        .collect()
}

/// Write records as a repository document.
///
/// Emits an XML declaration followed by the tab-indented `<plugins>` root.
/// `@`-prefixed keys become attributes of the release element, all other
/// keys child elements.
///
/// # Errors
///
/// Fails if a record has no version (see [`PluginMetadata::to_xml_fields`])
/// and with [`DocumentError::InvalidXml`] if a field name is not a valid
/// XML name, such as an unknown `metadata.txt` key containing a space.
pub fn export_document(records: &[PluginMetadata]) -> MetadataResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(invalid_xml)?;

    if records.is_empty() {
        writer
            .write_event(Event::Empty(BytesStart::new(XML_ROOT)))
            .map_err(invalid_xml)?;
    } else {
        writer
            .write_event(Event::Start(BytesStart::new(XML_ROOT)))
            .map_err(invalid_xml)?;
        for record in records {
            write_release(&mut writer, record)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(XML_ROOT)))
            .map_err(invalid_xml)?;
    }

    tracing::debug!(releases = records.len(), "exported repository XML");
    String::from_utf8(writer.into_inner()).map_err(|e| invalid_xml(e).into())
}

fn write_release(writer: &mut Writer<Vec<u8>>, record: &PluginMetadata) -> MetadataResult<()> {
    let fields = record.to_xml_fields()?;
    for key in fields.keys() {
        check_xml_name(key.strip_prefix(ATTRIBUTE_PREFIX).unwrap_or(key.as_str()))?;
    }

    let mut release = BytesStart::new(XML_RELEASE);
    for (key, value) in &fields {
        if let Some(attribute) = key.strip_prefix(ATTRIBUTE_PREFIX) {
            release.push_attribute((attribute, value.as_str()));
        }
    }
    writer
        .write_event(Event::Start(release))
        .map_err(invalid_xml)?;

    for (key, value) in fields
        .iter()
        .filter(|(key, _)| !key.starts_with(ATTRIBUTE_PREFIX))
    {
        writer
            .write_event(Event::Start(BytesStart::new(key.as_str())))
            .map_err(invalid_xml)?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(invalid_xml)?;
        writer
            .write_event(Event::End(BytesEnd::new(key.as_str())))
            .map_err(invalid_xml)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(XML_RELEASE)))
        .map_err(invalid_xml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::schema::FieldValue;

    const TWO_RELEASES: &str = r#"<?xml version = '1.0' encoding = 'UTF-8'?>
<plugins>
<pyqgis_plugin name="Geo Tools" version="0.3.1" plugin_id="1234">
  <description><![CDATA[Handy geometry helpers]]></description>
  <about>Adds a toolbar & more.</about>
  <version>0.3.1</version>
  <trusted>True</trusted>
  <qgis_minimum_version>3.10</qgis_minimum_version>
  <qgis_maximum_version>3.99</qgis_maximum_version>
  <homepage><![CDATA[https://example.com/geo_tools]]></homepage>
  <file_name>geo_tools.0.3.1.zip</file_name>
  <icon></icon>
  <author_name><![CDATA[Jane Doe]]></author_name>
  <download_url>https://example.com/geo_tools.0.3.1.zip</download_url>
  <experimental>False</experimental>
  <deprecated>False</deprecated>
  <tags><![CDATA[geometry,toolbar]]></tags>
  <repository><![CDATA[https://example.com/geo_tools.git]]></repository>
  <server/>
</pyqgis_plugin>
<pyqgis_plugin name="Quick Map" version="1.4" plugin_id="17">
  <description>Maps, quickly</description>
  <about>Opens a base map.</about>
  <version>1.4</version>
  <qgis_minimum_version>3.0</qgis_minimum_version>
  <file_name>quick_map.1.4.zip</file_name>
  <author_name>Max Mustermann</author_name>
  <repository>https://example.com/quick_map</repository>
  <experimental>True</experimental>
</pyqgis_plugin>
</plugins>
"#;

    #[test]
    fn test_split_document() {
        let releases = split_document(TWO_RELEASES).unwrap();
        assert_eq!(releases.len(), 2);

        let first = &releases[0];
        assert_eq!(first["@name"].as_deref(), Some("Geo Tools"));
        assert_eq!(first["@plugin_id"].as_deref(), Some("1234"));
        assert_eq!(first["description"].as_deref(), Some("Handy geometry helpers"));
        assert_eq!(first["about"].as_deref(), Some("Adds a toolbar & more."));
        assert_eq!(first["icon"], None);
        assert_eq!(first["server"], None);
        assert_eq!(first["trusted"].as_deref(), Some("True"));

        assert_eq!(releases[1]["@name"].as_deref(), Some("Quick Map"));
    }

    #[test]
    fn test_split_single_release() {
        let xml = r#"<plugins><pyqgis_plugin name="Solo" version="1.0"><version>1.0</version></pyqgis_plugin></plugins>"#;
        let releases = split_document(xml).unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0]["@name"].as_deref(), Some("Solo"));
        assert_eq!(releases[0]["version"].as_deref(), Some("1.0"));
    }

    #[test]
    fn test_split_joins_text_and_cdata() {
        let xml = r#"<plugins><pyqgis_plugin name="Mixed" version="1.0">
            <about>Hello <![CDATA[world]]></about>
            <changelog>
                1.0 <![CDATA[first <release>]]> done
            </changelog>
            <tracker>   </tracker>
        </pyqgis_plugin></plugins>"#;

        let releases = split_document(xml).unwrap();
        let release = &releases[0];
        assert_eq!(release["about"].as_deref(), Some("Hello world"));
        assert_eq!(
            release["changelog"].as_deref(),
            Some("1.0 first <release> done")
        );
        assert_eq!(release["tracker"], None);
    }

    #[test]
    fn test_split_empty_root() {
        assert!(split_document("<plugins/>").unwrap().is_empty());
        assert!(split_document("<plugins>\n</plugins>").unwrap().is_empty());
    }

    #[test]
    fn test_split_skips_foreign_elements() {
        let xml = r#"<plugins>
            <note><text>ignored</text></note>
            <pyqgis_plugin name="Kept" version="2.0"/>
        </plugins>"#;
        let releases = split_document(xml).unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0]["@version"].as_deref(), Some("2.0"));
    }

    #[test]
    fn test_split_errors() {
        for xml in [
            "<catalog><pyqgis_plugin/></catalog>",
            "<plugins><pyqgis_plugin></plugins>",
            "<plugins><pyqgis_plugin><about><b>bold</b></about></pyqgis_plugin></plugins>",
            "",
        ] {
            assert!(
                matches!(
                    split_document(xml),
                    Err(MetadataError::Document(DocumentError::InvalidXml(_)))
                ),
                "{xml}"
            );
        }
    }

    #[test]
    fn test_import_document() {
        let releases = import_document(TWO_RELEASES).unwrap();
        let ids: Vec<&str> = releases.iter().map(PluginMetadata::id).collect();
        assert_eq!(ids, vec!["geo_tools", "quick_map"]);

        let geo_tools = &releases[0];
        assert_eq!(geo_tools.value("plugin_id"), Some(&FieldValue::Integer(1234)));
        assert!(geo_tools.required_fields_present(&["email"]));
        assert!(!geo_tools.field("server").unwrap().value_set());
        assert!(!geo_tools.field("trusted").unwrap().is_known());
        assert_eq!(releases[1].value("experimental"), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn test_import_reports_release_errors() {
        let xml = r#"<plugins><pyqgis_plugin name="Odd" version="1.0"><version>1.1</version></pyqgis_plugin></plugins>"#;
        assert!(matches!(
            import_document(xml),
            Err(MetadataError::Document(DocumentError::VersionConflict { .. }))
        ));
    }

    #[test]
    fn test_export_document() {
        let releases = import_document(TWO_RELEASES).unwrap();
        let xml = export_document(&releases).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("\n<plugins>"));
        assert!(xml.contains("\n\t<pyqgis_plugin "));
        assert!(xml.contains("\n\t\t<author_name>Jane Doe</author_name>"));
        assert!(xml.contains("<about>Adds a toolbar &amp; more.</about>"));
        assert!(xml.contains("name=\"Geo Tools\""));
        assert!(xml.contains("plugin_id=\"1234\""));
        assert!(!xml.contains("<id>"));
    }

    #[test]
    fn test_export_rejects_unwritable_field_names() {
        let meta = PluginMetadata::from_fields([
            ("id", Some("spaced")),
            ("version", Some("1.0")),
            ("my key", Some("1")),
        ])
        .unwrap();

        assert_eq!(
            export_document(&[meta]),
            Err(MetadataError::Document(DocumentError::InvalidXml(
                "field 'my key' can not be written as an XML name".to_string()
            )))
        );
    }

    #[test]
    fn test_xml_names() {
        for name in ["about", "author_name", "qgis-min", "ns:tag", "_x", "x.1"] {
            assert!(is_xml_name(name), "{name}");
        }
        for name in ["", "my key", "1st", "-x", "a<b", "a&b"] {
            assert!(!is_xml_name(name), "{name}");
        }
    }

    #[test]
    fn test_export_empty() {
        let xml = export_document(&[]).unwrap();
        assert!(xml.ends_with("<plugins/>"));
        assert!(split_document(&xml).unwrap().is_empty());
    }

    #[test]
    fn test_document_round_trip() {
        let releases = import_document(TWO_RELEASES).unwrap();
        let again = import_document(&export_document(&releases).unwrap()).unwrap();
        assert_eq!(again, releases);
    }
}
