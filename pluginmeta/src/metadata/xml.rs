//! Mapping between records and release elements of a repository XML.
//!
//! A release element of `plugins.xml` differs from the flat field mapping:
//! the plugin `id` is not stored but implied by `file_name`
//! (`{id}.{version}.zip`), the version appears twice (as attribute and
//! child element) and a few fields use other names.

use indexmap::IndexMap;

use super::{FlatFields, PluginMetadata, ID_FIELD};
use crate::error::{DocumentError, MetadataResult};
use crate::schema::xml_names;

/// Key of the version attribute of a release element.
pub const XML_VERSION_ATTRIBUTE: &str = "@version";

/// Extension of release archives.
pub const ZIP_EXTENSION: &str = ".zip";

const VERSION_FIELD: &str = "version";
const FILE_NAME_FIELD: &str = "file_name";

/// Recover the plugin id from `{id}.{version}.zip`.
fn id_from_file_name(file_name: &str, version: &str) -> MetadataResult<String> {
    if !file_name.to_lowercase().ends_with(ZIP_EXTENSION) {
        return Err(DocumentError::UnusualFileName(file_name.to_string()).into());
    }
    if !file_name.contains(version) {
        return Err(DocumentError::VersionNotInFileName {
            file_name: file_name.to_string(),
            version: version.to_string(),
        }
        .into());
    }

    // strip ".{version}.zip" by length, the version itself is not re-checked
    let suffix_len = 1 + version.len() + ZIP_EXTENSION.len();
    file_name
        .len()
        .checked_sub(suffix_len)
        .and_then(|end| file_name.get(..end))
        .map(str::to_string)
        .ok_or_else(|| DocumentError::UnusualFileName(file_name.to_string()).into())
}

impl PluginMetadata {
    /// Build a record from one release element of a repository XML.
    ///
    /// Keys are XML names (`@name`, `author_name`, ...). The plugin id is
    /// taken from `id` if present, otherwise derived from `file_name`.
    ///
    /// ```
    /// use pluginmeta::PluginMetadata;
    ///
    /// let meta = PluginMetadata::from_xml_fields([
    ///     ("@name", Some("Quick Map")),
    ///     ("@version", Some("1.4")),
    ///     ("version", Some("1.4")),
    ///     ("file_name", Some("quick_map.1.4.zip")),
    ///     ("author_name", Some("Jane Doe")),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(meta.id(), "quick_map");
    /// assert_eq!(meta.to_fields()["author"], "Jane Doe");
    /// ```
    ///
    /// # Errors
    ///
    /// [`DocumentError::VersionConflict`] if `version` and `@version`
    /// disagree, the `file_name` errors of [`DocumentError`] if the id can
    /// not be derived, and any field conversion error.
    pub fn from_xml_fields<I, K, V>(xml_fields: I) -> MetadataResult<Self>
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut fields: IndexMap<String, Option<String>> = xml_fields
            .into_iter()
            .map(|(key, value)| {
                (
                    key.as_ref().to_string(),
                    value.map(|value| value.as_ref().to_string()),
                )
            })
            .collect();

        let attribute = fields.shift_remove(XML_VERSION_ATTRIBUTE).flatten();
        match (fields.get(VERSION_FIELD).cloned().flatten(), attribute) {
            (Some(version), Some(attribute)) if version != attribute => {
                return Err(DocumentError::VersionConflict { version, attribute }.into());
            }
            (None, Some(attribute)) => {
                fields.insert(VERSION_FIELD.to_string(), Some(attribute));
            }
            _ => {}
        }

        for (name, xml_name) in xml_names() {
            if let Some(value) = fields.shift_remove(xml_name) {
                fields.insert(name.to_string(), value);
            }
        }

        if fields.get(ID_FIELD).map_or(true, Option::is_none) {
            let file_name = fields
                .get(FILE_NAME_FIELD)
                .cloned()
                .flatten()
                .ok_or(DocumentError::MissingPluginId)?;
            let version = fields
                .get(VERSION_FIELD)
                .cloned()
                .flatten()
                .ok_or_else(|| DocumentError::MissingField(VERSION_FIELD.to_string()))?;

            let id = id_from_file_name(&file_name, &version)?;
            fields.insert(ID_FIELD.to_string(), Some(id));
        }

        Self::from_fields(fields)
    }

    /// Export as the key/value mapping of one repository release element.
    ///
    /// `file_name` is synthesized from id and version, `id` is dropped and
    /// the version is duplicated under [`XML_VERSION_ATTRIBUTE`].
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::MissingField`] if no version is set.
    pub fn to_xml_fields(&self) -> MetadataResult<FlatFields> {
        let mut fields = self.to_fields();

        let version = fields
            .get(VERSION_FIELD)
            .cloned()
            .ok_or_else(|| DocumentError::MissingField(VERSION_FIELD.to_string()))?;

        fields.insert(
            FILE_NAME_FIELD.to_string(),
            format!("{}.{}{}", self.id(), version, ZIP_EXTENSION),
        );
        fields.shift_remove(ID_FIELD);
        fields.insert(XML_VERSION_ATTRIBUTE.to_string(), version);

        for (name, xml_name) in xml_names() {
            if let Some(value) = fields.shift_remove(name) {
                fields.insert(xml_name.to_string(), value);
            }
        }

        Ok(fields)
    }
}
