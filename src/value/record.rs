//! Records: named fields carrying resolved metadata.
//!
//! A [`Record`] holds its per-field metadata table inline: every [`Field`]
//! pairs a value with the [`FieldMeta`] facts the engines consume (external
//! name, identifier/immutable markers, patch options). Metadata is usually
//! produced from the compact tag syntax by [`FieldMeta::parse`].

use super::Value;

/// Resolved metadata for one record field.
///
/// `create` and `omit_unequal` are patch-time options carried onto the
/// cursor while resolving a change path; `identifier` marks the
/// reconciliation key of elements in unordered collections; `immutable`
/// and `skip` exclude the field from diffing and patching.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldMeta {
    /// External field name, used as the path segment.
    pub name: String,
    /// The field is the reconciliation key of its enclosing collection.
    pub identifier: bool,
    /// The field is never diffed or patched.
    pub immutable: bool,
    /// Patch may allocate or append when the target is missing or nil.
    pub create: bool,
    /// Patch skips the change when the current value differs from `from`.
    pub omit_unequal: bool,
    /// The field is excluded entirely (tag name `-`).
    pub skip: bool,
    /// The field is an anonymous/embedded composite; with the
    /// `flatten_embedded` option its fields diff under the parent's path.
    pub embedded: bool,
}

impl FieldMeta {
    /// Metadata with the given external name and no options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a comma-separated metadata tag.
    ///
    /// The first token is the external name, or `-` to exclude the field.
    /// Remaining tokens: `identifier`, `immutable`, `create`, `nocreate`,
    /// `omitunequal`. Unknown tokens are ignored.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        let mut parts = tag.split(',');
        let name = parts.next().unwrap_or_default().trim();
        let mut meta = Self::new(name);
        if name == "-" {
            meta.skip = true;
        }
        for opt in parts {
            match opt.trim() {
                "identifier" => meta.identifier = true,
                "immutable" => meta.immutable = true,
                "create" => meta.create = true,
                "nocreate" => meta.create = false,
                "omitunequal" => meta.omit_unequal = true,
                _ => {}
            }
        }
        meta
    }

    /// Mark the field as embedded.
    #[must_use]
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }
}

/// One named member of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub meta: FieldMeta,
    pub value: Value,
}

/// A composite value with named fields and inline metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: Vec<Field>,
}

impl Record {
    /// An empty record of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, parsing `tag` with [`FieldMeta::parse`].
    #[must_use]
    pub fn with_field(self, tag: &str, value: Value) -> Self {
        self.with_field_meta(FieldMeta::parse(tag), value)
    }

    /// Append a field with explicit metadata.
    #[must_use]
    pub fn with_field_meta(mut self, meta: FieldMeta, value: Value) -> Self {
        self.fields.push(Field { meta, value });
        self
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by its external name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.meta.name == name)
    }

    #[must_use]
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.meta.name == name)
    }

    /// Read a field's value by its external name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).map(|f| &f.value)
    }

    /// The value of the declared identifier field, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<&Value> {
        self.fields.iter().find(|f| f.meta.identifier).map(|f| &f.value)
    }

    /// Same schema, every field zeroed.
    pub(crate) fn zero_like(&self) -> Record {
        Record {
            type_name: self.type_name.clone(),
            fields: self
                .fields
                .iter()
                .map(|f| Field {
                    meta: f.meta.clone(),
                    value: f.value.zero_like(),
                })
                .collect(),
        }
    }
}
