//! Field declarations for a record type.
//!
//! A [`FieldMap`] lists, for one record type, every bound field with its header aliases, its
//! [`FieldType`] and a setter that writes a coerced [`Value`] into the record. Maps are built
//! once per type and reused for every sheet; the column layout is resolved per sheet by
//! [`super::header::resolve_header`].

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{BindError, BindResult};
use crate::types::{DataType, FieldType, Value};

/// Separator between aliases in a field's alias tag.
pub const ALIAS_DELIMITER: char = ',';

type Setter<T> = Box<dyn Fn(&mut T, Value) + Send + Sync>;

/// A Rust type that a cell can be bound to.
///
/// Implemented for `String`, `i64`, `f64`, `bool`, [`NaiveDateTime`] and `Option` of each.
pub trait CellValue: Sized {
    /// Semantic type used to coerce cells for this Rust type.
    const FIELD_TYPE: FieldType;

    /// Extract from a coerced value. Returns `None` if the value has another type.
    fn from_value(value: Value) -> Option<Self>;
}

impl CellValue for String {
    const FIELD_TYPE: FieldType = FieldType::required(DataType::Utf8);

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }
}

impl CellValue for i64 {
    const FIELD_TYPE: FieldType = FieldType::required(DataType::Int64);

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }
}

impl CellValue for f64 {
    const FIELD_TYPE: FieldType = FieldType::required(DataType::Float64);

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float64(v) => Some(v),
            _ => None,
        }
    }
}

impl CellValue for bool {
    const FIELD_TYPE: FieldType = FieldType::required(DataType::Bool);

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl CellValue for NaiveDateTime {
    const FIELD_TYPE: FieldType = FieldType::required(DataType::Timestamp);

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Timestamp(v) => Some(v),
            _ => None,
        }
    }
}

impl<V: CellValue> CellValue for Option<V> {
    const FIELD_TYPE: FieldType = FieldType::optional(V::FIELD_TYPE.data_type);

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => V::from_value(other).map(Some),
        }
    }
}

/// A record type that can be read from a sheet.
///
/// ```
/// use sheet_binder::binding::{FieldMap, SheetRecord};
/// use sheet_binder::BindResult;
///
/// #[derive(Debug, Default)]
/// struct City {
///     id: i64,
///     name: String,
///     postcode: Option<i64>,
/// }
///
/// impl SheetRecord for City {
///     fn field_map() -> BindResult<FieldMap<Self>> {
///         FieldMap::builder()
///             .field("id", "id,No.", |c: &mut City, v| c.id = v)
///             .field("name", "name,city", |c: &mut City, v| c.name = v)
///             .field("postcode", "postcode", |c: &mut City, v| c.postcode = v)
///             .build()
///     }
/// }
///
/// let map = City::field_map().unwrap();
/// assert_eq!(map.len(), 3);
/// ```
pub trait SheetRecord: Default + Sized {
    /// Build the field map for this type.
    fn field_map() -> BindResult<FieldMap<Self>>;
}

/// One bound field of a record type.
pub struct FieldBinding<T> {
    name: String,
    aliases: Vec<String>,
    field_type: FieldType,
    setter: Setter<T>,
}

impl<T> FieldBinding<T> {
    /// Field identifier, used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acceptable header texts, in match-priority order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Declared semantic type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Write `value` into `record`.
    pub fn set(&self, record: &mut T, value: Value) {
        (self.setter)(record, value)
    }
}

impl<T> fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("field_type", &self.field_type)
            .finish()
    }
}

/// Ordered list of [`FieldBinding`]s for a record type.
pub struct FieldMap<T> {
    fields: Vec<FieldBinding<T>>,
}

impl<T> FieldMap<T> {
    /// Start declaring fields.
    pub fn builder() -> FieldMapBuilder<T> {
        FieldMapBuilder { fields: Vec::new() }
    }

    /// Number of bound fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if no field is bound.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldBinding<T>> {
        self.fields.iter()
    }

    /// Field at `idx` in declaration order.
    pub fn get(&self, idx: usize) -> Option<&FieldBinding<T>> {
        self.fields.get(idx)
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldBinding<T>> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl<T> fmt::Debug for FieldMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}

struct PendingField<T> {
    name: String,
    tag: String,
    field_type: FieldType,
    setter: Setter<T>,
}

/// Builder returned by [`FieldMap::builder`].
///
/// Declarations are validated in [`FieldMapBuilder::build`]: every field needs at least one
/// non-empty alias, and field names must be unique.
pub struct FieldMapBuilder<T> {
    fields: Vec<PendingField<T>>,
}

impl<T> FieldMapBuilder<T> {
    /// Declare a field whose type is taken from the setter's value type.
    pub fn field<V, F>(self, name: impl Into<String>, alias_tag: impl Into<String>, setter: F) -> Self
    where
        V: CellValue + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.field_with_type(name, alias_tag, V::FIELD_TYPE, move |record: &mut T, value| {
            if let Some(v) = V::from_value(value) {
                setter(record, v);
            }
        })
    }

    /// Declare a field with an explicit [`FieldType`] and a setter over raw [`Value`]s.
    ///
    /// The setter receives [`Value::Null`] only when `field_type.optional` is set.
    pub fn field_with_type<F>(
        mut self,
        name: impl Into<String>,
        alias_tag: impl Into<String>,
        field_type: FieldType,
        setter: F,
    ) -> Self
    where
        F: Fn(&mut T, Value) + Send + Sync + 'static,
    {
        self.fields.push(PendingField {
            name: name.into(),
            tag: alias_tag.into(),
            field_type,
            setter: Box::new(setter),
        });
        self
    }

    /// Validate declarations and produce the map.
    pub fn build(self) -> BindResult<FieldMap<T>> {
        let mut names = HashSet::with_capacity(self.fields.len());
        let mut fields = Vec::with_capacity(self.fields.len());

        for pending in self.fields {
            if !names.insert(pending.name.clone()) {
                return Err(BindError::InvalidFieldDeclaration {
                    field: pending.name,
                    message: "field declared more than once".to_string(),
                });
            }

            let aliases = parse_alias_tag(&pending.tag);
            if aliases.is_empty() {
                return Err(BindError::InvalidFieldDeclaration {
                    field: pending.name,
                    message: format!("alias tag '{}' names no header", pending.tag),
                });
            }

            fields.push(FieldBinding {
                name: pending.name,
                aliases,
                field_type: pending.field_type,
                setter: pending.setter,
            });
        }

        Ok(FieldMap { fields })
    }
}

/// Split an alias tag into trimmed, non-empty aliases, keeping their order.
pub fn parse_alias_tag(tag: &str) -> Vec<String> {
    tag.split(ALIAS_DELIMITER)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
