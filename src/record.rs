//! Record access for compiled predicates.
//!
//! A predicate reads fields by their canonical name. Statically shaped records
//! implement [`RecordType`] (usually through [`impl_record!`](crate::impl_record))
//! so the compiler can resolve property names up front; dynamically shaped
//! records only implement [`Record`] and are compiled against an explicit
//! [`Schema`].

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;

/// Field access by canonical name. `None` stands for a null field.
pub trait Record {
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// A record type whose field names are known at compile time
pub trait RecordType: Record {
    fn field_names() -> &'static [&'static str];
}

impl<T: Record + ?Sized> Record for &T {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).field(name)
    }
}

impl<T: RecordType + ?Sized> RecordType for &T {
    fn field_names() -> &'static [&'static str] {
        T::field_names()
    }
}

/// Keys are matched exactly first, then ignoring case, so records spelling a
/// key differently from the schema still resolve
impl Record for Map<String, Value> {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = self.get(name).or_else(|| {
            self.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })?;
        match value {
            Value::Null => None,
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl Record for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

/// Conversion of a struct field into the string view predicates compare
pub trait FieldValue {
    fn as_field(&self) -> Option<Cow<'_, str>>;
}

impl FieldValue for String {
    fn as_field(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}

impl FieldValue for &str {
    fn as_field(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(*self))
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn as_field(&self) -> Option<Cow<'_, str>> {
        self.as_ref().and_then(FieldValue::as_field)
    }
}

macro_rules! display_field_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn as_field(&self) -> Option<Cow<'_, str>> {
                    Some(Cow::Owned(self.to_string()))
                }
            }
        )*
    };
}

display_field_value!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// Implement [`Record`] and [`RecordType`] for a plain struct.
///
/// ```
/// use ldap_predicate::impl_record;
///
/// struct Person {
///     surname: Option<String>,
///     version: u32,
/// }
///
/// impl_record!(Person {
///     "Sn" => surname,
///     "Version" => version,
/// });
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($name:literal => $field:ident),+ $(,)? }) => {
        impl $crate::record::Record for $ty {
            fn field(&self, name: &str) -> ::std::option::Option<::std::borrow::Cow<'_, str>> {
                match name {
                    $($name => $crate::record::FieldValue::as_field(&self.$field),)+
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl $crate::record::RecordType for $ty {
            fn field_names() -> &'static [&'static str] {
                &[$($name),+]
            }
        }
    };
}

/// Case-insensitive map from property name to the canonical field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: HashMap<String, String>,
}

impl Schema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = names
            .into_iter()
            .map(Into::into)
            .map(|name| (name.to_lowercase(), name))
            .collect();
        Self { fields }
    }

    pub fn of<R: RecordType + ?Sized>() -> Self {
        Self::new(R::field_names().iter().copied())
    }

    /// Canonical name for a property, matched ignoring case
    pub fn resolve(&self, property: &str) -> Option<&str> {
        self.fields
            .get(&property.to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Canonical names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.values().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
