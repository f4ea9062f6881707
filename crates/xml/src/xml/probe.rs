//! Non-writing serializers that inspect a value before it is encoded.
//!
//! A start tag has to carry every namespace declaration and attribute before
//! the first child can be written, and a schema-order violation has to be
//! reported before any text is emitted. Both need the full field list of a
//! struct up front, which serde only reveals while the struct is being
//! serialized. [`shape_of`] runs the value's `Serialize` impl against a probe
//! that records the struct name, the field keys and the type name behind each
//! field value. Field values are inspected one level deep and never recursed
//! into further.
//!
//! [`scalar_text`] renders a primitive value to its canonical text form.

use serde::ser::{self, Impossible, Serialize};

use crate::error::{Result, XmlError};
use crate::xml::utils;

/// Type name and serialized field keys of one struct, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape {
    pub type_name: &'static str,
    pub keys: Vec<&'static str>,
    /// Struct type written for each key, or for the first item of a sequence.
    pub field_types: Vec<Option<&'static str>>,
}

/// Shape of `value` if it is a struct, looking through `Some` and newtypes.
pub fn shape_of<T>(value: &T) -> Result<Option<Shape>>
where
    T: ?Sized + Serialize,
{
    value.serialize(ShapeProbe {
        items: false,
        field_types: true,
    })
}

/// Canonical text of a primitive value; `None` for `None`.
pub fn scalar_text<T>(value: &T) -> Result<Option<String>>
where
    T: ?Sized + Serialize,
{
    value.serialize(ScalarText)
}

#[derive(Clone, Copy)]
struct ShapeProbe {
    /// Report the shape of a sequence's first item.
    items: bool,
    field_types: bool,
}

impl ser::Serializer for ShapeProbe {
    type Ok = Option<Shape>;
    type Error = XmlError;
    type SerializeSeq = SeqShape;
    type SerializeTuple = NoShape;
    type SerializeTupleStruct = NoShape;
    type SerializeTupleVariant = NoShape;
    type SerializeMap = NoShape;
    type SerializeStruct = StructShape;
    type SerializeStructVariant = NoShape;

    fn serialize_bool(self, _v: bool) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_i8(self, _v: i8) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_i16(self, _v: i16) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_i32(self, _v: i32) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_i64(self, _v: i64) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_u8(self, _v: u8) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_u16(self, _v: u16) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_u32(self, _v: u32) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_u64(self, _v: u64) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_f32(self, _v: f32) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_f64(self, _v: f64) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_char(self, _v: char) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_str(self, _v: &str) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_bytes(self, _v: &[u8]) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_none(self) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Self::Ok> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SeqShape {
            probe: self.items.then_some(self),
            first: None,
        })
    }
    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(NoShape)
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(NoShape)
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(NoShape)
    }
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(NoShape)
    }
    fn serialize_struct(self, name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        Ok(StructShape {
            shape: Shape {
                type_name: name,
                keys: Vec::with_capacity(len),
                field_types: Vec::new(),
            },
            field_types: self.field_types,
        })
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(NoShape)
    }
}

/// Records field keys and, when asked, the type name behind each value.
struct StructShape {
    shape: Shape,
    field_types: bool,
}

impl ser::SerializeStruct for StructShape {
    type Ok = Option<Shape>;
    type Error = XmlError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.shape.keys.push(key);
        if self.field_types {
            let item = value.serialize(ShapeProbe {
                items: true,
                field_types: false,
            })?;
            self.shape.field_types.push(item.map(|shape| shape.type_name));
        }
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Some(self.shape))
    }
}

/// A sequence takes the shape of its first struct item, if asked for one.
struct SeqShape {
    probe: Option<ShapeProbe>,
    first: Option<Shape>,
}

impl ser::SerializeSeq for SeqShape {
    type Ok = Option<Shape>;
    type Error = XmlError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        if let Some(probe) = self.probe.filter(|_| self.first.is_none()) {
            self.first = value.serialize(probe)?;
        }
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(self.first)
    }
}

/// Compound values that are not structs have no shape.
struct NoShape;

impl ser::SerializeTuple for NoShape {
    type Ok = Option<Shape>;
    type Error = XmlError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(None)
    }
}

impl ser::SerializeTupleStruct for NoShape {
    type Ok = Option<Shape>;
    type Error = XmlError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(None)
    }
}

impl ser::SerializeTupleVariant for NoShape {
    type Ok = Option<Shape>;
    type Error = XmlError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(None)
    }
}

impl ser::SerializeMap for NoShape {
    type Ok = Option<Shape>;
    type Error = XmlError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, _key: &T) -> Result<()> {
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(None)
    }
}

impl ser::SerializeStructVariant for NoShape {
    type Ok = Option<Shape>;
    type Error = XmlError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> Result<()> {
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(None)
    }
}

/// Helper serializer to render primitive values as strings.
struct ScalarText;

fn not_scalar(what: &str) -> XmlError {
    XmlError::Unsupported(format!("{} where a text value is required", what))
}

impl ser::Serializer for ScalarText {
    type Ok = Option<String>;
    type Error = XmlError;
    type SerializeSeq = Impossible<Option<String>, XmlError>;
    type SerializeTuple = Impossible<Option<String>, XmlError>;
    type SerializeTupleStruct = Impossible<Option<String>, XmlError>;
    type SerializeTupleVariant = Impossible<Option<String>, XmlError>;
    type SerializeMap = Impossible<Option<String>, XmlError>;
    type SerializeStruct = Impossible<Option<String>, XmlError>;
    type SerializeStructVariant = Impossible<Option<String>, XmlError>;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok> {
        Ok(Some(utils::bool_to_string(v).to_string()))
    }
    fn serialize_i8(self, v: i8) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_i16(self, v: i16) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_i32(self, v: i32) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_i64(self, v: i64) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_u8(self, v: u8) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_u16(self, v: u16) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_u32(self, v: u32) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_u64(self, v: u64) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_f32(self, v: f32) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_f64(self, v: f64) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_char(self, v: char) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_str(self, v: &str) -> Result<Self::Ok> {
        Ok(Some(v.to_string()))
    }
    fn serialize_bytes(self, _v: &[u8]) -> Result<Self::Ok> {
        Err(not_scalar("bytes"))
    }
    fn serialize_none(self) -> Result<Self::Ok> {
        Ok(None)
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Self::Ok> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Self::Ok> {
        Ok(Some(String::new()))
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        Ok(Some(String::new()))
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok> {
        Ok(Some(variant.to_string()))
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok> {
        Err(not_scalar(&format!("enum variant {}::{}", name, variant)))
    }
    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(not_scalar("a sequence"))
    }
    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(not_scalar("a tuple"))
    }
    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(not_scalar(&format!("tuple struct {}", name)))
    }
    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(not_scalar(&format!("enum variant {}::{}", name, variant)))
    }
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(not_scalar("a map"))
    }
    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(not_scalar(&format!("struct {}", name)))
    }
    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(not_scalar(&format!("enum variant {}::{}", name, variant)))
    }
}
