//! Custom serde Serializer that lowers any `Serialize` value into a [`Shape`]
//! tree: the read-only view of a configuration tree used for rendering.
//!
//! References are transparent (`Some(x)`, `Box<x>` and `&x` all lower to the
//! shape of `x`), `None` lowers to [`Shape::Nil`], and fields marked
//! `#[serde(skip)]` never reach the serializer, which makes them invisible to
//! every renderer. Unit enum variants lower to their name; variants carrying
//! data become a one-field record keyed by the variant name.

use serde::ser::{self, Serialize};

/// The structural kind of one node in a configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// An absent value (`None`).
    Nil,
    /// A value with a single-line text form.
    Scalar(String),
    /// An ordered list of values.
    Sequence(Vec<Shape>),
    /// Key-value pairs, keys already rendered as text, in serialization order.
    Mapping(Vec<(String, Shape)>),
    /// Named fields in declaration order.
    Record(Vec<(&'static str, Shape)>),
}

impl Shape {
    /// Records, sequences and mappings render over multiple lines.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Shape::Record(_) | Shape::Sequence(_) | Shape::Mapping(_)
        )
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Shape::Record(_))
    }

    /// Single-line text form: scalars as-is, `nil` for absent values,
    /// `[a, b]` for sequences and `{k: v}` for mappings and records.
    pub fn inline_text(&self) -> String {
        match self {
            Shape::Nil => "nil".to_string(),
            Shape::Scalar(text) => text.clone(),
            Shape::Sequence(items) => {
                let parts: Vec<String> = items.iter().map(Shape::inline_text).collect();
                format!("[{}]", parts.join(", "))
            }
            Shape::Mapping(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{key}: {}", value.inline_text()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Shape::Record(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("{name}: {}", value.inline_text()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }
}

/// Lower a `Serialize` value into its [`Shape`].
pub fn shape_of<T: Serialize + ?Sized>(value: &T) -> Result<Shape, ShapeError> {
    value.serialize(ShapeSerializer)
}

#[derive(Debug)]
pub struct ShapeError(String);

impl std::fmt::Display for ShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shape error: {}", self.0)
    }
}

impl std::error::Error for ShapeError {}

impl ser::Error for ShapeError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        ShapeError(msg.to_string())
    }
}

struct ShapeSerializer;

fn scalar(text: impl ToString) -> Result<Shape, ShapeError> {
    Ok(Shape::Scalar(text.to_string()))
}

impl ser::Serializer for ShapeSerializer {
    type Ok = Shape;
    type Error = ShapeError;
    type SerializeSeq = SeqShape;
    type SerializeTuple = SeqShape;
    type SerializeTupleStruct = SeqShape;
    type SerializeTupleVariant = SeqShape;
    type SerializeMap = MapShape;
    type SerializeStruct = RecordShape;
    type SerializeStructVariant = RecordShape;

    fn serialize_bool(self, v: bool) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_i8(self, v: i8) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_i16(self, v: i16) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_i32(self, v: i32) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_i64(self, v: i64) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_i128(self, v: i128) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_u16(self, v: u16) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_u32(self, v: u32) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_f64(self, v: f64) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_char(self, v: char) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_str(self, v: &str) -> Result<Shape, Self::Error> {
        scalar(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Shape, Self::Error> {
        Ok(Shape::Sequence(
            v.iter().map(|b| Shape::Scalar(b.to_string())).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Shape, Self::Error> {
        Ok(Shape::Nil)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Shape, Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Shape, Self::Error> {
        scalar("()")
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Shape, Self::Error> {
        scalar(name)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Shape, Self::Error> {
        scalar(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Shape, Self::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Shape, Self::Error> {
        Ok(tagged(Some(variant), value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Ok(SeqShape {
            items: Vec::with_capacity(len.unwrap_or(0)),
            variant: None,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Ok(SeqShape {
            items: Vec::with_capacity(len),
            variant: Some(variant),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(MapShape {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            current_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(RecordShape {
            fields: Vec::with_capacity(len),
            variant: None,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Ok(RecordShape {
            fields: Vec::with_capacity(len),
            variant: Some(variant),
        })
    }
}

/// Data-carrying enum variants render under their variant name, so the dump
/// shows which one is active.
fn tagged(variant: Option<&'static str>, shape: Shape) -> Shape {
    match variant {
        Some(name) => Shape::Record(vec![(name, shape)]),
        None => shape,
    }
}

// --- SerializeStruct ---

struct RecordShape {
    fields: Vec<(&'static str, Shape)>,
    variant: Option<&'static str>,
}

impl ser::SerializeStruct for RecordShape {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.fields.push((key, value.serialize(ShapeSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Shape, Self::Error> {
        Ok(tagged(self.variant, Shape::Record(self.fields)))
    }
}

impl ser::SerializeStructVariant for RecordShape {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Shape, Self::Error> {
        ser::SerializeStruct::end(self)
    }
}

// --- SerializeMap ---

struct MapShape {
    entries: Vec<(String, Shape)>,
    current_key: Option<String>,
}

impl ser::SerializeMap for MapShape {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Self::Error> {
        // Any key renders through its inline text, so non-string keys work too.
        self.current_key = Some(key.serialize(ShapeSerializer)?.inline_text());
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| ShapeError("serialize_value called without serialize_key".into()))?;
        self.entries.push((key, value.serialize(ShapeSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Shape, Self::Error> {
        Ok(Shape::Mapping(self.entries))
    }
}

// --- SerializeSeq (for Vec/array/tuple fields) ---

struct SeqShape {
    items: Vec<Shape>,
    variant: Option<&'static str>,
}

impl ser::SerializeSeq for SeqShape {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.items.push(value.serialize(ShapeSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Shape, Self::Error> {
        Ok(tagged(self.variant, Shape::Sequence(self.items)))
    }
}

impl ser::SerializeTuple for SeqShape {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Shape, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqShape {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Shape, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SeqShape {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Shape, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}
