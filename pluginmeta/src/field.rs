//! A single metadata field inside a record.
//!
//! A [`MetadataField`] binds a value to either a registry [`FieldSpec`] or,
//! for keys outside the schema, to a synthesized text descriptor. Values are
//! type-checked against the declared [`DataType`] whenever they are set.

use std::fmt;

use crate::error::{MetadataResult, SchemaError};
use crate::schema::{DataType, Exporter, FieldSpec, FieldValue, Importer};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    Known(&'static FieldSpec),
    Unknown { name: String, data_type: DataType },
}

/// One field of plugin metadata.
///
/// Cloning produces an independent field with the same binding and values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataField {
    binding: Binding,
    value: Option<FieldValue>,
    default_value: Option<FieldValue>,
}

impl MetadataField {
    /// Create an unset field for a registry entry, carrying its default.
    pub fn new(spec: &'static FieldSpec) -> Self {
        Self {
            binding: Binding::Known(spec),
            value: None,
            default_value: spec.default_value.clone(),
        }
    }

    /// Create a field for a registry entry with explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::TypeMismatch`] if `value` or `default_value`
    /// does not match the declared type.
    pub fn with_values(
        spec: &'static FieldSpec,
        value: Option<FieldValue>,
        default_value: Option<FieldValue>,
    ) -> MetadataResult<Self> {
        let field = Self {
            binding: Binding::Known(spec),
            value: None,
            default_value: None,
        };
        field.check_type(value.as_ref(), "value")?;
        field.check_type(default_value.as_ref(), "default_value")?;

        Ok(Self {
            value,
            default_value,
            ..field
        })
    }

    /// Create a field for a key outside the schema.
    ///
    /// The field takes the type of `value`, is never required, and renders
    /// with the default string conversion.
    pub fn from_unknown(name: impl Into<String>, value: FieldValue) -> MetadataResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::EmptyName.into());
        }

        Ok(Self {
            binding: Binding::Unknown {
                name,
                data_type: value.data_type(),
            },
            value: Some(value),
            default_value: None,
        })
    }

    /// Field name.
    pub fn name(&self) -> &str {
        match &self.binding {
            Binding::Known(spec) => spec.name,
            Binding::Unknown { name, .. } => name,
        }
    }

    /// Declared type.
    pub fn data_type(&self) -> DataType {
        match &self.binding {
            Binding::Known(spec) => spec.data_type,
            Binding::Unknown { data_type, .. } => *data_type,
        }
    }

    /// Registry entry, unless this is an unknown field.
    pub fn spec(&self) -> Option<&'static FieldSpec> {
        match self.binding {
            Binding::Known(spec) => Some(spec),
            Binding::Unknown { .. } => None,
        }
    }

    /// Whether this field is part of the schema.
    pub fn is_known(&self) -> bool {
        self.spec().is_some()
    }

    pub fn is_required(&self) -> bool {
        self.spec().is_some_and(|spec| spec.required)
    }

    pub fn is_i18n(&self) -> bool {
        self.spec().is_some_and(|spec| spec.i18n)
    }

    pub fn comment(&self) -> &str {
        self.spec().map_or("", |spec| spec.comment)
    }

    fn importer(&self) -> Option<Importer> {
        self.spec().and_then(|spec| spec.importer)
    }

    fn exporter(&self) -> Option<Exporter> {
        self.spec().and_then(|spec| spec.exporter)
    }

    /// Current value, if set.
    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    pub fn value_set(&self) -> bool {
        self.value.is_some()
    }

    /// Default value, if any.
    pub fn default_value(&self) -> Option<&FieldValue> {
        self.default_value.as_ref()
    }

    pub fn default_value_set(&self) -> bool {
        self.default_value.is_some()
    }

    /// Replace the value.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::TypeMismatch`] if `value` has the wrong type;
    /// the field keeps its previous value.
    pub fn set_value(&mut self, value: FieldValue) -> MetadataResult<()> {
        self.check_type(Some(&value), "value")?;
        self.value = Some(value);
        Ok(())
    }

    /// Remove the value.
    pub fn clear_value(&mut self) {
        self.value = None;
    }

    /// The value rendered as a metadata string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ValueNotSet`] if no value is set.
    pub fn value_string(&self) -> MetadataResult<String> {
        self.value
            .as_ref()
            .map(|value| self.render(value))
            .ok_or_else(|| self.not_set("value"))
    }

    /// The default value rendered as a metadata string.
    pub fn default_value_string(&self) -> MetadataResult<String> {
        self.default_value
            .as_ref()
            .map(|value| self.render(value))
            .ok_or_else(|| self.not_set("default_value"))
    }

    /// Set the value from a metadata string.
    ///
    /// Uses the field's importer if it has one, otherwise builds the declared
    /// type directly from the string.
    ///
    /// # Errors
    ///
    /// Propagates conversion errors ([`crate::BoolValueError`],
    /// [`crate::VersionValueError`], [`SchemaError::InvalidValue`]); the
    /// field keeps its previous value.
    pub fn set_value_string(&mut self, raw: &str) -> MetadataResult<()> {
        let value = match self.importer() {
            Some(importer) => importer.import(raw)?,
            None => self.data_type().construct(self.name(), raw)?,
        };
        tracing::trace!(field = self.name(), raw, "coerced metadata value");
        self.set_value(value)
    }

    /// Take over `other`'s value if it has one.
    ///
    /// # Errors
    ///
    /// Fails if `other` has a different name or data type.
    pub fn update(&mut self, other: &MetadataField) -> MetadataResult<()> {
        if self.name() != other.name() {
            return Err(SchemaError::NameMismatch {
                expected: self.name().to_string(),
                actual: other.name().to_string(),
            }
            .into());
        }
        if self.data_type() != other.data_type() {
            return Err(SchemaError::DataTypeMismatch {
                field: self.name().to_string(),
                expected: self.data_type(),
                actual: other.data_type(),
            }
            .into());
        }

        if let Some(value) = &other.value {
            self.set_value(value.clone())?;
        }
        Ok(())
    }

    pub(crate) fn render(&self, value: &FieldValue) -> String {
        match self.exporter() {
            Some(exporter) => exporter.export(value),
            None => value.to_string(),
        }
    }

    fn check_type(&self, value: Option<&FieldValue>, slot: &'static str) -> MetadataResult<()> {
        match value {
            Some(value) if value.data_type() != self.data_type() => {
                Err(SchemaError::TypeMismatch {
                    field: self.name().to_string(),
                    slot,
                    expected: self.data_type(),
                    actual: value.data_type(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn not_set(&self, slot: &'static str) -> crate::MetadataError {
        SchemaError::ValueNotSet {
            field: self.name().to_string(),
            slot,
        }
        .into()
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |b: bool| if b { "yes" } else { "no" };
        write!(
            f,
            "{} ({}, set={}, known={}, i18n={}, required={})",
            self.name(),
            self.data_type(),
            flag(self.value_set()),
            flag(self.is_known()),
            flag(self.is_i18n()),
            flag(self.is_required())
        )
    }
}
