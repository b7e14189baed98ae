//! The metadata field schema.
//!
//! QGIS plugins describe themselves with a fixed vocabulary of fields
//! (`name`, `version`, `qgisMinimumVersion`, ...). This module defines that
//! vocabulary once: each [`FieldSpec`] names a field, its [`DataType`],
//! whether it is required, its default, and how it converts from and to
//! strings.
//!
//! # Registry
//!
//! [`registry`] returns the schema as an immutable table. It is built on
//! first access and shared by every record for the rest of the process.
//!
//! ```
//! use pluginmeta::schema::{field_spec, DataType};
//!
//! let spec = field_spec("qgisMinimumVersion").unwrap();
//! assert_eq!(spec.data_type, DataType::Version);
//! assert!(spec.required);
//! assert_eq!(spec.xml_name, Some("qgis_minimum_version"));
//! ```

mod coerce;

use std::fmt;
use std::sync::OnceLock;

pub use coerce::{parse_bool, BoolStyle, Exporter, Importer};

use crate::error::{MetadataResult, SchemaError};
use crate::version::Version;

/// Style used for every boolean field in the registry.
pub const BOOL_STYLE: BoolStyle = BoolStyle::LowerTrueFalse;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Free text.
    Text,
    /// `true` / `false`.
    Boolean,
    /// Signed integer.
    Integer,
    /// Ordered list of text items.
    Tags,
    /// Plugin or QGIS version.
    Version,
}

impl DataType {
    /// Lowercase type name.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Tags => "tags",
            DataType::Version => "version",
        }
    }

    /// Build a value of this type from a string without a custom importer.
    ///
    /// Integers are parsed after trimming; booleans, tags and versions use
    /// the same conversion as their registry importers.
    pub fn construct(&self, field: &str, raw: &str) -> MetadataResult<FieldValue> {
        let value = match self {
            DataType::Text => FieldValue::Text(raw.to_string()),
            DataType::Integer => {
                let n = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| SchemaError::InvalidValue {
                        field: field.to_string(),
                        value: raw.to_string(),
                        reason: e.to_string(),
                    })?;
                FieldValue::Integer(n)
            }
            DataType::Boolean => FieldValue::Boolean(parse_bool(raw)?),
            DataType::Tags => FieldValue::Tags(coerce::split_tags(raw)),
            DataType::Version => FieldValue::Version(Version::from_plugin_version(raw)?),
        };
        Ok(value)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Boolean(bool),
    Integer(i64),
    Tags(Vec<String>),
    Version(Version),
}

impl FieldValue {
    /// Type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            FieldValue::Text(_) => DataType::Text,
            FieldValue::Boolean(_) => DataType::Boolean,
            FieldValue::Integer(_) => DataType::Integer,
            FieldValue::Tags(_) => DataType::Tags,
            FieldValue::Version(_) => DataType::Version,
        }
    }

    /// The text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The tags, if this is a tag list.
    pub fn as_tags(&self) -> Option<&[String]> {
        match self {
            FieldValue::Tags(tags) => Some(tags),
            _ => None,
        }
    }

    /// The version, if this is a version value.
    pub fn as_version(&self) -> Option<&Version> {
        match self {
            FieldValue::Version(v) => Some(v),
            _ => None,
        }
    }
}

/// Default rendering, used when a field has no exporter.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Boolean(b) => f.write_str(BoolStyle::TitleTrueFalse.format(*b)),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Tags(tags) => f.write_str(&coerce::join_tags(tags)),
            FieldValue::Version(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<Version> for FieldValue {
    fn from(v: Version) -> Self {
        FieldValue::Version(v)
    }
}

/// Static description of one known metadata field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name in `metadata.txt` and flat mappings.
    pub name: &'static str,

    /// Declared value type.
    pub data_type: DataType,

    /// Custom string-to-value conversion.
    pub importer: Option<Importer>,

    /// Custom value-to-string conversion.
    pub exporter: Option<Exporter>,

    /// Whether a complete release must set this field.
    pub required: bool,

    /// Value assumed when the field is not set.
    pub default_value: Option<FieldValue>,

    /// Name used in repository XML, `@`-prefixed for attributes.
    pub xml_name: Option<&'static str>,

    /// Whether the field is translatable. Informational only.
    pub i18n: bool,

    /// Documentation.
    pub comment: &'static str,
}

impl FieldSpec {
    fn new(name: &'static str, data_type: DataType) -> Self {
        Self {
            name,
            data_type,
            importer: None,
            exporter: None,
            required: false,
            default_value: None,
            xml_name: None,
            i18n: false,
            comment: "",
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn i18n(mut self) -> Self {
        self.i18n = true;
        self
    }

    fn xml_name(mut self, xml_name: &'static str) -> Self {
        self.xml_name = Some(xml_name);
        self
    }

    fn comment(mut self, comment: &'static str) -> Self {
        self.comment = comment;
        self
    }

    fn coerce(mut self, importer: Importer, exporter: Exporter) -> Self {
        self.importer = Some(importer);
        self.exporter = Some(exporter);
        self
    }

    fn default_value(mut self, value: FieldValue) -> Self {
        self.default_value = Some(value);
        self
    }

    fn boolean(name: &'static str) -> Self {
        Self::new(name, DataType::Boolean).coerce(Importer::Bool, Exporter::Bool(BOOL_STYLE))
    }

    fn host_version(name: &'static str) -> Self {
        Self::new(name, DataType::Version).coerce(
            Importer::QgisVersion {
                fix_compatibility: true,
            },
            Exporter::VersionOriginal,
        )
    }
}

fn build_registry() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("id", DataType::Text)
            .required()
            .comment("module name"),
        FieldSpec::new("plugin_id", DataType::Integer)
            .xml_name("@plugin_id")
            .comment("repository plugin id"),
        FieldSpec::new("name", DataType::Text)
            .required()
            .i18n()
            .xml_name("@name")
            .comment("human readable plugin name"),
        FieldSpec::new("description", DataType::Text)
            .required()
            .i18n()
            .comment("short description of the plugin purpose only"),
        FieldSpec::new("about", DataType::Text)
            .required()
            .i18n()
            .comment("longer description: how does it work, where does it install, how to run it?"),
        FieldSpec::new("tags", DataType::Tags)
            .coerce(Importer::Tags, Exporter::Tags)
            .i18n()
            .comment("comma separated, spaces allowed"),
        FieldSpec::new("changelog", DataType::Text).comment("may be multiline"),
        FieldSpec::new("author", DataType::Text)
            .required()
            .xml_name("author_name"),
        // not exposed by the plugins.xml of plugins.qgis.org
        FieldSpec::new("email", DataType::Text).required(),
        FieldSpec::new("homepage", DataType::Text).comment("url to the plugin homepage"),
        FieldSpec::new("tracker", DataType::Text).comment("url to a tracker site"),
        FieldSpec::new("repository", DataType::Text)
            .required()
            .comment("url to the source code repository"),
        FieldSpec::new("icon", DataType::Text).comment("path to the icon"),
        FieldSpec::boolean("experimental")
            .default_value(FieldValue::Boolean(false))
            .comment("true if experimental, false if stable"),
        FieldSpec::boolean("deprecated")
            .default_value(FieldValue::Boolean(false))
            .comment("true if deprecated, false if actual"),
        FieldSpec::new("download_url", DataType::Text).comment("url for downloading the plugin"),
        FieldSpec::new("file_name", DataType::Text)
            .comment("the zip file name to be unzipped after downloaded"),
        FieldSpec::host_version("qgisMinimumVersion")
            .required()
            .xml_name("qgis_minimum_version")
            .comment("dotted notation of minimum QGIS version"),
        FieldSpec::host_version("qgisMaximumVersion")
            .xml_name("qgis_maximum_version")
            .comment("dotted notation of maximum QGIS version"),
        FieldSpec::new("version", DataType::Version)
            .coerce(Importer::PluginVersion, Exporter::VersionOriginal)
            .required(),
        FieldSpec::boolean("hasProcessingProvider")
            .default_value(FieldValue::Boolean(false))
            .comment("determines if the plugin provides processing algorithms"),
        FieldSpec::boolean("server")
            .comment("determines if the plugin provides functionality for server"),
    ]
}

/// The schema of all known fields, in canonical order.
pub fn registry() -> &'static [FieldSpec] {
    static REGISTRY: OnceLock<Vec<FieldSpec>> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

/// Look up a known field by its exact name.
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    registry().iter().find(|spec| spec.name == name)
}

/// Look up a known field ignoring ASCII case.
pub fn field_spec_ignore_case(name: &str) -> Option<&'static FieldSpec> {
    registry()
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
}

/// `(name, xml_name)` for every field with an alternate XML name.
pub fn xml_names() -> impl Iterator<Item = (&'static str, &'static str)> {
    registry()
        .iter()
        .filter_map(|spec| spec.xml_name.map(|xml_name| (spec.name, xml_name)))
}
