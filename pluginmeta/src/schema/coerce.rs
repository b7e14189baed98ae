//! String coercion for field values.
//!
//! Importers turn metadata strings into typed values, exporters turn them
//! back. Fields bind them by variant instead of storing closures, so the
//! registry stays plain data.

use std::fmt;
use std::str::FromStr;

use super::{DataType, FieldValue};
use crate::error::{BoolValueError, MetadataResult, SchemaError};
use crate::version::Version;

const TRUTHY: &[&str] = &["yes", "true", "1"];
const FALSY: &[&str] = &["no", "false", "0"];
const TRUTHY_PREFIXES: &[&str] = &["yes", "true"];
const FALSY_PREFIXES: &[&str] = &["no", "false"];

/// Tag list separator.
const TAG_SEPARATOR: &str = ",";

/// Interpret a metadata string as a boolean.
///
/// Accepts `yes`/`true`/`1` and `no`/`false`/`0` in any case, then falls
/// back to prefixes, so `"True # with comment"` is still `true`.
///
/// ```
/// use pluginmeta::schema::parse_bool;
///
/// assert_eq!(parse_bool("Yes"), Ok(true));
/// assert_eq!(parse_bool("false "), Ok(false));
/// assert!(parse_bool("maybe").is_err());
/// ```
pub fn parse_bool(value: &str) -> Result<bool, BoolValueError> {
    let lower = value.to_lowercase();

    if TRUTHY.contains(&lower.as_str()) {
        return Ok(true);
    }
    if FALSY.contains(&lower.as_str()) {
        return Ok(false);
    }
    if TRUTHY_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return Ok(true);
    }
    if FALSY_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return Ok(false);
    }

    Err(BoolValueError {
        value: value.to_string(),
    })
}

/// How booleans are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolStyle {
    /// `True` / `False`
    TitleTrueFalse,
    /// `true` / `false`
    LowerTrueFalse,
    /// `Yes` / `No`
    TitleYesNo,
    /// `yes` / `no`
    LowerYesNo,
    /// `1` / `0`
    OneZero,
}

impl BoolStyle {
    /// All styles.
    pub const ALL: [BoolStyle; 5] = [
        BoolStyle::TitleTrueFalse,
        BoolStyle::LowerTrueFalse,
        BoolStyle::TitleYesNo,
        BoolStyle::LowerYesNo,
        BoolStyle::OneZero,
    ];

    /// Name of the style as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            BoolStyle::TitleTrueFalse => "TrueFalse",
            BoolStyle::LowerTrueFalse => "truefalse",
            BoolStyle::TitleYesNo => "YesNo",
            BoolStyle::LowerYesNo => "yesno",
            BoolStyle::OneZero => "10",
        }
    }

    /// Render a boolean in this style.
    pub fn format(&self, value: bool) -> &'static str {
        match (self, value) {
            (BoolStyle::TitleTrueFalse, true) => "True",
            (BoolStyle::TitleTrueFalse, false) => "False",
            (BoolStyle::LowerTrueFalse, true) => "true",
            (BoolStyle::LowerTrueFalse, false) => "false",
            (BoolStyle::TitleYesNo, true) => "Yes",
            (BoolStyle::TitleYesNo, false) => "No",
            (BoolStyle::LowerYesNo, true) => "yes",
            (BoolStyle::LowerYesNo, false) => "no",
            (BoolStyle::OneZero, true) => "1",
            (BoolStyle::OneZero, false) => "0",
        }
    }
}

impl FromStr for BoolStyle {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoolStyle::ALL
            .into_iter()
            .find(|style| style.name() == s)
            .ok_or_else(|| SchemaError::UnknownBoolStyle(s.to_string()))
    }
}

impl fmt::Display for BoolStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Custom string-to-value conversion bound to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importer {
    /// [`parse_bool`].
    Bool,
    /// Comma separated list, items kept verbatim.
    Tags,
    /// [`Version::from_qgis_version`].
    QgisVersion { fix_compatibility: bool },
    /// [`Version::from_plugin_version`].
    PluginVersion,
}

impl Importer {
    /// Convert `raw` into a typed value.
    pub fn import(&self, raw: &str) -> MetadataResult<FieldValue> {
        let value = match self {
            Importer::Bool => FieldValue::Boolean(parse_bool(raw)?),
            Importer::Tags => FieldValue::Tags(split_tags(raw)),
            Importer::QgisVersion { fix_compatibility } => {
                FieldValue::Version(Version::from_qgis_version(raw, *fix_compatibility)?)
            }
            Importer::PluginVersion => FieldValue::Version(Version::from_plugin_version(raw)?),
        };
        Ok(value)
    }

    /// Data type this importer produces.
    pub fn data_type(&self) -> DataType {
        match self {
            Importer::Bool => DataType::Boolean,
            Importer::Tags => DataType::Tags,
            Importer::QgisVersion { .. } | Importer::PluginVersion => DataType::Version,
        }
    }
}

/// Custom value-to-string conversion bound to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exporter {
    /// Boolean in the given style.
    Bool(BoolStyle),
    /// Tags joined with `,`.
    Tags,
    /// The version string exactly as it was read.
    VersionOriginal,
}

impl Exporter {
    /// Render `value`; values the exporter does not handle use their default
    /// rendering.
    pub fn export(&self, value: &FieldValue) -> String {
        match (self, value) {
            (Exporter::Bool(style), FieldValue::Boolean(b)) => style.format(*b).to_string(),
            (Exporter::Tags, FieldValue::Tags(tags)) => join_tags(tags),
            (Exporter::VersionOriginal, FieldValue::Version(v)) => v.original().to_string(),
            (_, other) => other.to_string(),
        }
    }
}

pub(crate) fn split_tags(raw: &str) -> Vec<String> {
    raw.split(TAG_SEPARATOR).map(str::to_string).collect()
}

pub(crate) fn join_tags(tags: &[String]) -> String {
    tags.join(TAG_SEPARATOR)
}
