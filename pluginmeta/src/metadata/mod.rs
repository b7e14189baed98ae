//! Metadata of one plugin release.
//!
//! A [`PluginMetadata`] holds one [`MetadataField`] for every field in the
//! schema, set or not, plus any unknown fields found while importing. Its
//! identity is the plugin `id`, fixed at construction.
//!
//! # Formats
//!
//! Records convert between three interchangeable representations:
//!
//! - **Flat mapping** - field name to string ([`PluginMetadata::from_fields`],
//!   [`PluginMetadata::to_fields`])
//! - **`metadata.txt`** - INI text with a single `[general]` section
//!   ([`PluginMetadata::from_metadata_txt`], [`PluginMetadata::to_metadata_txt`])
//! - **Repository XML mapping** - one release element of `plugins.xml`
//!   ([`PluginMetadata::from_xml_fields`], [`PluginMetadata::to_xml_fields`])
//!
//! ```
//! use pluginmeta::PluginMetadata;
//!
//! let meta = PluginMetadata::from_fields([
//!     ("id", Some("quick_map")),
//!     ("version", Some("1.4.0")),
//!     ("experimental", Some("False")),
//!     ("category", Some("Web")),
//! ])
//! .unwrap();
//!
//! assert_eq!(meta.id(), "quick_map");
//! let fields = meta.to_fields();
//! assert_eq!(fields["experimental"], "false");
//! assert_eq!(fields["category"], "Web");
//! ```

mod text;
mod xml;

use std::fmt;

use indexmap::IndexMap;

pub use text::METADATA_SECTION;
pub use xml::{XML_VERSION_ATTRIBUTE, ZIP_EXTENSION};

use crate::error::{MetadataError, MetadataResult, SchemaError};
use crate::field::MetadataField;
use crate::schema::{registry, FieldValue};

/// Name of the identity field.
pub const ID_FIELD: &str = "id";

/// Field name to metadata string, in field order.
pub type FlatFields = IndexMap<String, String>;

/// Metadata of one plugin release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMetadata {
    id: String,
    fields: IndexMap<String, MetadataField>,
}

impl PluginMetadata {
    /// Build a record from field names and optional strings.
    ///
    /// Absent values are skipped. Known fields are converted to their
    /// declared type; unknown keys are kept verbatim as text fields.
    ///
    /// # Errors
    ///
    /// Any conversion error of a known field, or
    /// [`MetadataError::MissingId`] if no `id` is given.
    pub fn from_fields<I, K, V>(import_fields: I) -> MetadataResult<Self>
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut fields: IndexMap<String, MetadataField> = registry()
            .iter()
            .map(|spec| (spec.name.to_string(), MetadataField::new(spec)))
            .collect();

        for (key, value) in import_fields {
            let Some(value) = value else {
                continue;
            };
            let (key, value) = (key.as_ref(), value.as_ref());

            if let Some(field) = fields.get_mut(key).filter(|field| field.is_known()) {
                field.set_value_string(value)?;
                continue;
            }

            tracing::debug!(field = key, "preserving unknown metadata field");
            let field = MetadataField::from_unknown(key, FieldValue::from(value))?;
            fields.insert(key.to_string(), field);
        }

        let id = fields
            .get(ID_FIELD)
            .and_then(MetadataField::value)
            .and_then(FieldValue::as_text)
            .ok_or(MetadataError::MissingId)?
            .to_string();

        Ok(Self { id, fields })
    }

    /// Plugin identifier (module name).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Field by name, if present.
    pub fn get(&self, name: &str) -> Option<&MetadataField> {
        self.fields.get(name)
    }

    /// Field by name.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownField`] for names that are neither in
    /// the schema nor among this record's unknown fields.
    pub fn field(&self, name: &str) -> MetadataResult<&MetadataField> {
        self.fields
            .get(name)
            .ok_or_else(|| SchemaError::UnknownField(name.to_string()).into())
    }

    /// Mutable field by name. The `id` field can not be borrowed mutably
    /// because it defines the record's identity.
    pub fn field_mut(&mut self, name: &str) -> MetadataResult<&mut MetadataField> {
        if name == ID_FIELD {
            return Err(SchemaError::UnknownField(name.to_string()).into());
        }
        self.fields
            .get_mut(name)
            .ok_or_else(|| SchemaError::UnknownField(name.to_string()).into())
    }

    /// Typed value of a field, if set.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(MetadataField::value)
    }

    /// Field names: schema order first, then unknown fields as discovered.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// All fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = &MetadataField> {
        self.fields.values()
    }

    /// Whether every required field has a value, except `ignored_fields`.
    ///
    /// `email` is required but not exposed by the repository XML of
    /// plugins.qgis.org, so callers checking XML releases ignore it.
    pub fn required_fields_present(&self, ignored_fields: &[&str]) -> bool {
        self.fields.values().all(|field| {
            field.value_set() || !field.is_required() || ignored_fields.contains(&field.name())
        })
    }

    /// Names of required fields without a value, except `ignored_fields`.
    pub fn missing_required_fields(&self, ignored_fields: &[&str]) -> Vec<&str> {
        self.fields
            .values()
            .filter(|field| field.is_required() && !field.value_set())
            .map(MetadataField::name)
            .filter(|name| !ignored_fields.contains(name))
            .collect()
    }

    /// Merge `other` into this record, like a map update.
    ///
    /// Unknown fields are adopted as they are; known fields take `other`'s
    /// value only where `other` has one set.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::IdMismatch`] for records of different
    /// plugins. On error this record is unchanged.
    pub fn update(&mut self, other: &PluginMetadata) -> MetadataResult<()> {
        if self.id != other.id {
            return Err(MetadataError::IdMismatch {
                expected: self.id.clone(),
                actual: other.id.clone(),
            });
        }

        let mut merged = self.fields.clone();
        for (key, field) in &other.fields {
            if key == ID_FIELD {
                continue;
            }
            match merged.get_mut(key) {
                Some(existing) => existing.update(field)?,
                None => {
                    merged.insert(key.clone(), field.clone());
                }
            }
        }
        self.fields = merged;

        Ok(())
    }

    /// Export every set field as `name -> string`.
    pub fn to_fields(&self) -> FlatFields {
        self.fields
            .iter()
            .filter_map(|(key, field)| {
                field
                    .value()
                    .map(|value| (key.clone(), field.render(value)))
            })
            .collect()
    }
}

impl fmt::Display for PluginMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PluginMetadata({})", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoolValueError, VersionValueError};

    fn complete() -> Vec<(&'static str, Option<&'static str>)> {
        vec![
            ("id", Some("geo_tools")),
            ("name", Some("Geo Tools")),
            ("description", Some("Handy geometry helpers")),
            ("about", Some("Adds a toolbar with geometry helpers.")),
            ("author", Some("Jane Doe")),
            ("email", Some("jane@example.com")),
            ("repository", Some("https://example.com/geo_tools.git")),
            ("qgisMinimumVersion", Some("3.10")),
            ("version", Some("0.3.1")),
        ]
    }

    #[test]
    fn test_from_fields_exposes_whole_schema() {
        let meta = PluginMetadata::from_fields(complete()).unwrap();
        assert_eq!(meta.id(), "geo_tools");
        assert_eq!(meta.keys().count(), registry().len());
        assert!(!meta.field("homepage").unwrap().value_set());
    }

    #[test]
    fn test_from_fields_skips_absent_values() {
        let mut input = complete();
        input.push(("homepage", None));
        input.push(("category", None));

        let meta = PluginMetadata::from_fields(input).unwrap();
        assert!(!meta.field("homepage").unwrap().value_set());
        assert!(meta.get("category").is_none());
    }

    #[test]
    fn test_from_fields_keeps_unknown_fields_verbatim() {
        let mut input = complete();
        input.push(("category", Some(" Raster ")));

        let meta = PluginMetadata::from_fields(input).unwrap();
        let field = meta.field("category").unwrap();
        assert!(!field.is_known());
        assert_eq!(field.value_string().unwrap(), " Raster ");
        assert_eq!(meta.keys().last(), Some("category"));
    }

    #[test]
    fn test_from_fields_coerces_types() {
        let mut input = complete();
        input.push(("plugin_id", Some("871")));
        input.push(("tags", Some("vector,geometry")));
        input.push(("deprecated", Some("True")));

        let meta = PluginMetadata::from_fields(input).unwrap();
        assert_eq!(meta.value("plugin_id"), Some(&FieldValue::Integer(871)));
        assert_eq!(
            meta.value("tags").and_then(FieldValue::as_tags),
            Some(&["vector".to_string(), "geometry".to_string()][..])
        );
        assert_eq!(meta.value("deprecated"), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn test_from_fields_errors() {
        let mut input = complete();
        input.push(("hasProcessingProvider", Some("processing")));
        assert_eq!(
            PluginMetadata::from_fields(input),
            Err(MetadataError::Bool(BoolValueError {
                value: "processing".to_string()
            }))
        );

        let mut input = complete();
        input.push(("version", Some("")));
        assert_eq!(
            PluginMetadata::from_fields(input),
            Err(MetadataError::Version(VersionValueError::Empty))
        );
    }

    #[test]
    fn test_from_fields_requires_id() {
        let input = vec![("name", Some("Nameless"))];
        assert_eq!(
            PluginMetadata::from_fields(input),
            Err(MetadataError::MissingId)
        );
    }

    #[test]
    fn test_required_fields_present() {
        let meta = PluginMetadata::from_fields(complete()).unwrap();
        assert!(meta.required_fields_present(&[]));

        let input: Vec<_> = complete()
            .into_iter()
            .filter(|(key, _)| *key != "email")
            .collect();
        let meta = PluginMetadata::from_fields(input).unwrap();
        assert!(!meta.required_fields_present(&[]));
        assert!(meta.required_fields_present(&["email"]));
        assert_eq!(meta.missing_required_fields(&[]), vec!["email"]);
    }

    #[test]
    fn test_update_merges_set_fields() {
        let mut base = PluginMetadata::from_fields(complete()).unwrap();
        let other = PluginMetadata::from_fields([
            ("id", Some("geo_tools")),
            ("version", Some("0.4.0")),
            ("homepage", Some("https://example.com")),
            ("category", Some("Vector")),
        ])
        .unwrap();

        base.update(&other).unwrap();

        let fields = base.to_fields();
        assert_eq!(fields["version"], "0.4.0");
        assert_eq!(fields["homepage"], "https://example.com");
        assert_eq!(fields["category"], "Vector");
        assert_eq!(fields["name"], "Geo Tools");
    }

    #[test]
    fn test_update_rejects_other_plugin() {
        let mut base = PluginMetadata::from_fields(complete()).unwrap();
        let before = base.clone();
        let other = PluginMetadata::from_fields([("id", Some("other_plugin"))]).unwrap();

        assert!(matches!(
            base.update(&other),
            Err(MetadataError::IdMismatch { .. })
        ));
        assert_eq!(base, before);
    }

    #[test]
    fn test_to_fields_omits_unset_fields() {
        let meta = PluginMetadata::from_fields(complete()).unwrap();
        let fields = meta.to_fields();
        assert_eq!(fields.len(), complete().len());
        assert!(!fields.contains_key("experimental"));
        assert_eq!(fields["qgisMinimumVersion"], "3.10");
    }

    #[test]
    fn test_field_mut_protects_identity() {
        let mut meta = PluginMetadata::from_fields(complete()).unwrap();
        assert!(meta.field_mut(ID_FIELD).is_err());

        meta.field_mut("icon").unwrap().set_value_string("icon.png").unwrap();
        assert_eq!(meta.to_fields()["icon"], "icon.png");
    }

    #[test]
    fn test_display() {
        let meta = PluginMetadata::from_fields(complete()).unwrap();
        assert_eq!(meta.to_string(), "PluginMetadata(geo_tools)");
    }
}
