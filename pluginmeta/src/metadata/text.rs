//! `metadata.txt` import and export.
//!
//! Every QGIS plugin ships a `metadata.txt` INI file with one `[general]`
//! section. Real-world files are often sloppy, so parsing is relaxed:
//! duplicate keys keep the last value, repeated sections are merged, no
//! interpolation happens (changelogs contain literal `%`), and keys match
//! schema fields regardless of case.
//!
//! The plugin `id` is the name of the plugin's directory and never appears
//! in the file, so callers pass it in separately.

use ini::{Ini, ParseOption};
use indexmap::IndexMap;

use super::{PluginMetadata, ID_FIELD};
use crate::error::{DocumentError, MetadataResult};
use crate::schema::field_spec_ignore_case;

/// The only section of `metadata.txt`.
pub const METADATA_SECTION: &str = "general";

/// Prefix of continuation lines in multi-line values.
const CONTINUATION_INDENT: &str = "\t";

fn parse_option() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        enabled_indented_mutiline_value: true,
        ..ParseOption::default()
    }
}

/// Map a `metadata.txt` key to its schema name, or keep it as is.
fn canonical_key(key: &str) -> String {
    match field_spec_ignore_case(key) {
        Some(spec) => spec.name.to_string(),
        None => key.to_string(),
    }
}

/// Flatten all `[general]` sections into `key -> value`, last key wins.
fn general_fields(ini: &Ini) -> MetadataResult<IndexMap<String, String>> {
    let mut fields = IndexMap::new();
    let mut found = false;

    for (section, properties) in ini.iter() {
        // keys above the first section header have nowhere to go
        if section.is_none() {
            if let Some((key, _)) = properties.iter().next() {
                return Err(DocumentError::InvalidIni(format!(
                    "key '{}' appears before any section header",
                    key
                ))
                .into());
            }
            continue;
        }
        if section != Some(METADATA_SECTION) {
            continue;
        }
        found = true;

        for (key, value) in properties.iter() {
            if key.is_empty() {
                return Err(DocumentError::InvalidSection {
                    section: METADATA_SECTION.to_string(),
                    reason: format!("value '{}' has no key", value),
                }
                .into());
            }
            fields.insert(canonical_key(key), value.to_string());
        }
    }

    if !found {
        return Err(DocumentError::MissingSection(METADATA_SECTION.to_string()).into());
    }
    Ok(fields)
}

impl PluginMetadata {
    /// Parse the contents of a `metadata.txt` file.
    ///
    /// ```
    /// use pluginmeta::PluginMetadata;
    ///
    /// let text = "[general]\nname=Quick Map\nversion=1.4\nqgisMinimumVersion=3.0\n";
    /// let meta = PluginMetadata::from_metadata_txt("quick_map", text).unwrap();
    ///
    /// assert_eq!(meta.id(), "quick_map");
    /// assert_eq!(meta.to_fields()["qgisMinimumVersion"], "3.0");
    /// ```
    ///
    /// # Errors
    ///
    /// [`DocumentError::InvalidIni`] if the text is not INI or has keys
    /// before the first section header,
    /// [`DocumentError::MissingSection`] without a `[general]` section, and
    /// any field conversion error.
    pub fn from_metadata_txt(plugin_id: &str, text: &str) -> MetadataResult<Self> {
        let ini = Ini::load_from_str_opt(text, parse_option())
            .map_err(|e| DocumentError::InvalidIni(e.to_string()))?;

        let mut fields = general_fields(&ini)?;
        // `id` never comes from the file itself
        fields.shift_remove(ID_FIELD);

        let import = std::iter::once((ID_FIELD.to_string(), Some(plugin_id.to_string())))
            .chain(fields.into_iter().map(|(key, value)| (key, Some(value))));
        Self::from_fields(import)
    }

    /// Render as `metadata.txt` contents.
    ///
    /// Writes one `key = value` line per set field except `id`. Multi-line
    /// values continue on tab-indented lines.
    pub fn to_metadata_txt(&self) -> String {
        let mut output = String::new();

        output.push('[');
        output.push_str(METADATA_SECTION);
        output.push_str("]\n");

        for (key, value) in self.to_fields() {
            if key == ID_FIELD {
                continue;
            }
            output.push_str(&key);
            output.push_str(" = ");
            output.push_str(&value.replace('\n', &format!("\n{}", CONTINUATION_INDENT)));
            output.push('\n');
        }

        output.push('\n');
        output
    }
}
