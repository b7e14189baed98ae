//! Error types for metadata parsing, validation and conversion.
//!
//! Each failure domain has its own error type so callers can react at the
//! right granularity (for example, flag one malformed release and continue
//! with the rest of a repository document). [`MetadataError`] wraps all of
//! them for the operations that can fail in more than one way.

use thiserror::Error;

use crate::schema::DataType;

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// A version string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionValueError {
    /// The version string is empty.
    #[error("version must not be empty")]
    Empty,

    /// Nothing is left once the version prefix and delimiters are removed.
    #[error("version '{0}' has no elements")]
    NoElements(String),

    /// A host version has more than three dot-separated fragments.
    #[error("no valid QGIS version because of too many fragments: '{0}'")]
    TooManyFragments(String),

    /// A host version contains an empty or non-numeric fragment.
    #[error("no valid QGIS version because of non-numeric fragments: '{0}'")]
    NonNumericFragment(String),
}

/// A string could not be interpreted as a boolean.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("value '{value}' can not be converted to bool")]
pub struct BoolValueError {
    /// The rejected input.
    pub value: String,
}

/// A value does not fit the field schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Field names must not be empty.
    #[error("field name must not be empty")]
    EmptyName,

    /// A value or default value has the wrong type for its field.
    #[error("{slot} of field '{field}' must be {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        slot: &'static str,
        expected: DataType,
        actual: DataType,
    },

    /// Two fields with different names were merged.
    #[error("name mismatch: '{expected}' vs '{actual}'")]
    NameMismatch { expected: String, actual: String },

    /// Two fields with different data types were merged.
    #[error("data type mismatch for field '{field}': {expected} vs {actual}")]
    DataTypeMismatch {
        field: String,
        expected: DataType,
        actual: DataType,
    },

    /// A string rendering was requested for a field without a value.
    #[error("nothing to export to string, {slot} of field '{field}' is not set")]
    ValueNotSet { field: String, slot: &'static str },

    /// A string could not be converted to the field's declared type.
    #[error("invalid value '{value}' for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Unknown boolean rendering style.
    #[error("bool style '{0}' is unknown")]
    UnknownBoolStyle(String),

    /// The record has no field with this name.
    #[error("'{0}' is not a valid metadata field")]
    UnknownField(String),
}

/// A metadata document (INI text, XML, or mapping) is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The INI text could not be parsed.
    #[error("failed to parse metadata.txt: {0}")]
    InvalidIni(String),

    /// The INI text has no section with the expected name.
    #[error("failed to fetch section '{0}' from metadata.txt")]
    MissingSection(String),

    /// The INI section can not be turned into a field mapping.
    #[error("failed to convert section '{section}' from metadata.txt to fields: {reason}")]
    InvalidSection { section: String, reason: String },

    /// The XML document could not be parsed.
    #[error("failed to parse plugin repository XML: {0}")]
    InvalidXml(String),

    /// One release carries two different versions.
    #[error("one single plugin release has two versions: '{version}' and '{attribute}'")]
    VersionConflict { version: String, attribute: String },

    /// Neither `id` nor `file_name` is available.
    #[error("neither 'id' nor 'file_name' in XML metadata, no way to determine plugin id")]
    MissingPluginId,

    /// `file_name` does not name a zip archive.
    #[error("unusual value for 'file_name', does not end on '.zip': '{0}'")]
    UnusualFileName(String),

    /// `file_name` does not contain the release version.
    #[error("version '{version}' is not part of file_name '{file_name}'")]
    VersionNotInFileName { file_name: String, version: String },

    /// A field required by an export format is not set.
    #[error("field '{0}' is required for this format but not set")]
    MissingField(String),
}

/// Any error produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// Invalid version string.
    #[error(transparent)]
    Version(#[from] VersionValueError),

    /// Invalid boolean string.
    #[error(transparent)]
    Bool(#[from] BoolValueError),

    /// Schema or type violation.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Malformed document.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Two records with different identities were merged.
    #[error("id mismatch: '{expected}' vs '{actual}'")]
    IdMismatch { expected: String, actual: String },

    /// A record was built without a plugin identifier.
    #[error("metadata has no 'id'")]
    MissingId,
}
