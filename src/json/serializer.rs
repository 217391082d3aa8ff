use serde::ser::{self, Error as _};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::cell::Cell;
use thiserror::Error;

use super::naming::{NamingPolicy, SnakeCase};

/// Deepest level a value may sit at; the top-level value is level 0 and
/// every element, field, map value, `Some` or newtype wrapper is one level
/// below its parent. Matches serde_json's own recursion limit for parsing.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Error)]
pub enum SerializationError {
    /// The value could not be turned into JSON
    #[error("value is not representable as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Nesting went past [`MAX_DEPTH`], which is how a self-referencing
    /// structure surfaces
    #[error("value nests deeper than {limit} levels (cyclic reference?)")]
    DepthLimitExceeded { limit: usize },
}

/// Serialize `value` to JSON text with every object key renamed by `policy`.
///
/// Renaming applies recursively through nested objects and arrays; values
/// are left untouched and key order is preserved.
pub fn to_json_string_with<T, P>(value: &T, policy: &P) -> Result<String, SerializationError>
where
    T: Serialize + ?Sized,
    P: NamingPolicy + ?Sized,
{
    let renamed = to_value_with(value, policy)?;
    Ok(serde_json::to_string(&renamed)?)
}

/// Same as [`to_json_string_with`] but returns the renamed tree.
///
/// Depth is checked while the value is being serialized, so a structure
/// that refers back to itself fails instead of recursing without end.
pub fn to_value_with<T, P>(value: &T, policy: &P) -> Result<Value, SerializationError>
where
    T: Serialize + ?Sized,
    P: NamingPolicy + ?Sized,
{
    let tripped = Cell::new(false);
    let value = serde_json::to_value(guard(value, 0, &tripped)).map_err(|e| {
        if tripped.get() {
            SerializationError::DepthLimitExceeded { limit: MAX_DEPTH }
        } else {
            SerializationError::Json(e)
        }
    })?;
    Ok(rename_keys(value, policy))
}

/// Serialize `value` with snake_case keys.
pub fn to_snake_case_json<T>(value: &T) -> Result<String, SerializationError>
where
    T: Serialize + ?Sized,
{
    to_json_string_with(value, &SnakeCase)
}

// The tree is already depth-checked by the time it gets here.
fn rename_keys<P>(value: Value, policy: &P) -> Value
where
    P: NamingPolicy + ?Sized,
{
    match value {
        Value::Object(map) => {
            let mut renamed = Map::with_capacity(map.len());
            for (key, inner) in map {
                renamed.insert(policy.convert_name(&key), rename_keys(inner, policy));
            }
            Value::Object(renamed)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rename_keys(item, policy))
                .collect(),
        ),
        scalar => scalar,
    }
}

fn guard<'a, T: ?Sized>(value: &'a T, depth: usize, tripped: &'a Cell<bool>) -> Guarded<'a, T> {
    Guarded {
        value,
        depth,
        tripped,
    }
}

/// A value at a known nesting level
struct Guarded<'a, T: ?Sized> {
    value: &'a T,
    depth: usize,
    tripped: &'a Cell<bool>,
}

impl<T> Serialize for Guarded<'_, T>
where
    T: Serialize + ?Sized,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.depth > MAX_DEPTH {
            self.tripped.set(true);
            return Err(S::Error::custom(format!(
                "value nests deeper than {} levels",
                MAX_DEPTH
            )));
        }
        self.value.serialize(DepthSerializer {
            inner: serializer,
            depth: self.depth,
            tripped: self.tripped,
        })
    }
}

/// Forwards to `inner`, wrapping every nested value one level deeper
struct DepthSerializer<'a, S> {
    inner: S,
    depth: usize,
    tripped: &'a Cell<bool>,
}

/// Compound state of a [`DepthSerializer`]
struct Nested<'a, C> {
    inner: C,
    depth: usize,
    tripped: &'a Cell<bool>,
}

impl<'a, S> Serializer for DepthSerializer<'a, S>
where
    S: Serializer,
{
    type Ok = S::Ok;
    type Error = S::Error;
    type SerializeSeq = Nested<'a, S::SerializeSeq>;
    type SerializeTuple = Nested<'a, S::SerializeTuple>;
    type SerializeTupleStruct = Nested<'a, S::SerializeTupleStruct>;
    type SerializeTupleVariant = Nested<'a, S::SerializeTupleVariant>;
    type SerializeMap = Nested<'a, S::SerializeMap>;
    type SerializeStruct = Nested<'a, S::SerializeStruct>;
    type SerializeStructVariant = Nested<'a, S::SerializeStructVariant>;

    fn serialize_bool(self, v: bool) -> Result<S::Ok, S::Error> {
        self.inner.serialize_bool(v)
    }

    fn serialize_i8(self, v: i8) -> Result<S::Ok, S::Error> {
        self.inner.serialize_i8(v)
    }

    fn serialize_i16(self, v: i16) -> Result<S::Ok, S::Error> {
        self.inner.serialize_i16(v)
    }

    fn serialize_i32(self, v: i32) -> Result<S::Ok, S::Error> {
        self.inner.serialize_i32(v)
    }

    fn serialize_i64(self, v: i64) -> Result<S::Ok, S::Error> {
        self.inner.serialize_i64(v)
    }

    fn serialize_i128(self, v: i128) -> Result<S::Ok, S::Error> {
        self.inner.serialize_i128(v)
    }

    fn serialize_u8(self, v: u8) -> Result<S::Ok, S::Error> {
        self.inner.serialize_u8(v)
    }

    fn serialize_u16(self, v: u16) -> Result<S::Ok, S::Error> {
        self.inner.serialize_u16(v)
    }

    fn serialize_u32(self, v: u32) -> Result<S::Ok, S::Error> {
        self.inner.serialize_u32(v)
    }

    fn serialize_u64(self, v: u64) -> Result<S::Ok, S::Error> {
        self.inner.serialize_u64(v)
    }

    fn serialize_u128(self, v: u128) -> Result<S::Ok, S::Error> {
        self.inner.serialize_u128(v)
    }

    fn serialize_f32(self, v: f32) -> Result<S::Ok, S::Error> {
        self.inner.serialize_f32(v)
    }

    fn serialize_f64(self, v: f64) -> Result<S::Ok, S::Error> {
        self.inner.serialize_f64(v)
    }

    fn serialize_char(self, v: char) -> Result<S::Ok, S::Error> {
        self.inner.serialize_char(v)
    }

    fn serialize_str(self, v: &str) -> Result<S::Ok, S::Error> {
        self.inner.serialize_str(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<S::Ok, S::Error> {
        self.inner.serialize_bytes(v)
    }

    fn serialize_none(self) -> Result<S::Ok, S::Error> {
        self.inner.serialize_none()
    }

    fn serialize_some<T>(self, value: &T) -> Result<S::Ok, S::Error>
    where
        T: Serialize + ?Sized,
    {
        self.inner
            .serialize_some(&guard(value, self.depth + 1, self.tripped))
    }

    fn serialize_unit(self) -> Result<S::Ok, S::Error> {
        self.inner.serialize_unit()
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<S::Ok, S::Error> {
        self.inner.serialize_unit_struct(name)
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> Result<S::Ok, S::Error> {
        self.inner
            .serialize_unit_variant(name, variant_index, variant)
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<S::Ok, S::Error>
    where
        T: Serialize + ?Sized,
    {
        self.inner
            .serialize_newtype_struct(name, &guard(value, self.depth + 1, self.tripped))
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<S::Ok, S::Error>
    where
        T: Serialize + ?Sized,
    {
        self.inner.serialize_newtype_variant(
            name,
            variant_index,
            variant,
            &guard(value, self.depth + 1, self.tripped),
        )
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, S::Error> {
        let (depth, tripped) = (self.depth, self.tripped);
        let inner = self.inner.serialize_seq(len)?;
        Ok(Nested {
            inner,
            depth,
            tripped,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, S::Error> {
        let (depth, tripped) = (self.depth, self.tripped);
        let inner = self.inner.serialize_tuple(len)?;
        Ok(Nested {
            inner,
            depth,
            tripped,
        })
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, S::Error> {
        let (depth, tripped) = (self.depth, self.tripped);
        let inner = self.inner.serialize_tuple_struct(name, len)?;
        Ok(Nested {
            inner,
            depth,
            tripped,
        })
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, S::Error> {
        let (depth, tripped) = (self.depth, self.tripped);
        let inner = self
            .inner
            .serialize_tuple_variant(name, variant_index, variant, len)?;
        Ok(Nested {
            inner,
            depth,
            tripped,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, S::Error> {
        let (depth, tripped) = (self.depth, self.tripped);
        let inner = self.inner.serialize_map(len)?;
        Ok(Nested {
            inner,
            depth,
            tripped,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, S::Error> {
        let (depth, tripped) = (self.depth, self.tripped);
        let inner = self.inner.serialize_struct(name, len)?;
        Ok(Nested {
            inner,
            depth,
            tripped,
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, S::Error> {
        let (depth, tripped) = (self.depth, self.tripped);
        let inner = self
            .inner
            .serialize_struct_variant(name, variant_index, variant, len)?;
        Ok(Nested {
            inner,
            depth,
            tripped,
        })
    }

    fn is_human_readable(&self) -> bool {
        self.inner.is_human_readable()
    }
}

impl<C> ser::SerializeSeq for Nested<'_, C>
where
    C: ser::SerializeSeq,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        let child = guard(value, self.depth + 1, self.tripped);
        self.inner.serialize_element(&child)
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C> ser::SerializeTuple for Nested<'_, C>
where
    C: ser::SerializeTuple,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        let child = guard(value, self.depth + 1, self.tripped);
        self.inner.serialize_element(&child)
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C> ser::SerializeTupleStruct for Nested<'_, C>
where
    C: ser::SerializeTupleStruct,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        let child = guard(value, self.depth + 1, self.tripped);
        self.inner.serialize_field(&child)
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C> ser::SerializeTupleVariant for Nested<'_, C>
where
    C: ser::SerializeTupleVariant,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        let child = guard(value, self.depth + 1, self.tripped);
        self.inner.serialize_field(&child)
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C> ser::SerializeMap for Nested<'_, C>
where
    C: ser::SerializeMap,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        self.inner.serialize_key(key)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        let child = guard(value, self.depth + 1, self.tripped);
        self.inner.serialize_value(&child)
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C> ser::SerializeStruct for Nested<'_, C>
where
    C: ser::SerializeStruct,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        let child = guard(value, self.depth + 1, self.tripped);
        self.inner.serialize_field(key, &child)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<(), C::Error> {
        self.inner.skip_field(key)
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C> ser::SerializeStructVariant for Nested<'_, C>
where
    C: ser::SerializeStructVariant,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        let child = guard(value, self.depth + 1, self.tripped);
        self.inner.serialize_field(key, &child)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<(), C::Error> {
        self.inner.skip_field(key)
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.inner.end()
    }
}
