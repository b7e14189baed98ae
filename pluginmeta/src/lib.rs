//! Plugin Meta - QGIS plugin release metadata
//!
//! This library validates, compares and converts the metadata of QGIS plugin
//! releases. Metadata comes as a `metadata.txt` INI file inside a plugin, as
//! a release element of a repository `plugins.xml`, or as a plain mapping of
//! field names to strings; all three convert into a type-checked
//! [`PluginMetadata`] record and back.
//!
//! # Modules
//!
//! - [`version`] - version tokens ordered like the QGIS plugin manager
//! - [`schema`] - the fixed field vocabulary and string coercion
//! - [`field`] - a single typed field of a record
//! - [`metadata`] - records and their `metadata.txt` / XML mappings
//! - [`repository`] - whole repository documents
//!
//! # Example
//!
//! ```
//! use pluginmeta::{PluginMetadata, Version};
//!
//! let text = "[general]\nname=Quick Map\nversion=1.4.0\nqgisMinimumVersion=3.0\n";
//! let meta = PluginMetadata::from_metadata_txt("quick_map", text).unwrap();
//!
//! let installed = Version::from_plugin_version("1.3.9").unwrap();
//! let offered = meta.value("version").and_then(|v| v.as_version()).unwrap();
//! assert!(offered > &installed);
//! ```

pub mod error;
pub mod field;
pub mod metadata;
pub mod repository;
pub mod schema;
pub mod version;

pub use error::{
    BoolValueError, DocumentError, MetadataError, MetadataResult, SchemaError, VersionValueError,
};
pub use field::MetadataField;
pub use metadata::{FlatFields, PluginMetadata};
pub use repository::{export_document, import_document, split_document, XmlFields};
pub use version::Version;
