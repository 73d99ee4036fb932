//! Serde 反序列化模块
//!
//! 实现 Serde Deserializer trait,把解码得到的 [`BsonValue`] 映射到
//! 任意实现 `Deserialize` 的 Rust 数据结构。这是不想手写记录形状
//! 接口的调用方的便捷路径。
//!
//! 类型映射:
//! - 基本类型: Null, Boolean, Int32/64, Float64, String/Symbol, Binary
//! - 复合类型: Array -> 序列, Document -> 映射/结构体, 单键文档 -> 枚举
//! - BSON 专有标量: ObjectId 按十六进制串、DateTime 按 RFC 3339 串、
//!   Timestamp 按 i64 进入 `deserialize_any`

use compact_str::CompactString;
use serde::de::{self, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;

use crate::value::BsonValue;
use crate::BsonError;

pub struct Deserializer<'de> {
    input: &'de BsonValue,
}

impl<'de> Deserializer<'de> {
    pub fn from_bson(input: &'de BsonValue) -> Self {
        Deserializer { input }
    }
}

/// 把 BsonValue 反序列化为任意目标类型
pub fn from_bson<'a, T: Deserialize<'a>>(value: &'a BsonValue) -> Result<T, BsonError> {
    let deserializer = Deserializer::from_bson(value);
    T::deserialize(deserializer)
}

impl de::Error for BsonError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        BsonError::Deserialization(msg.to_string())
    }
}

fn unexpected(expected: &str, got: &BsonValue) -> BsonError {
    BsonError::Deserialization(format!("Expected {}, got {}", expected, got.type_name()))
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = BsonError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Null => visitor.visit_unit(),
            BsonValue::Boolean(b) => visitor.visit_bool(*b),
            BsonValue::Int32(n) => visitor.visit_i32(*n),
            BsonValue::Int64(n) => visitor.visit_i64(*n),
            BsonValue::Float64(n) => visitor.visit_f64(*n),
            BsonValue::String(s) | BsonValue::Symbol(s) => visitor.visit_str(s.as_str()),
            BsonValue::Binary(b) => visitor.visit_bytes(&b.data),
            BsonValue::ObjectId(id) => visitor.visit_string(id.to_hex()),
            BsonValue::DateTime(dt) => visitor.visit_string(dt.to_rfc3339()),
            BsonValue::Timestamp(ts) => visitor.visit_i64(*ts),
            BsonValue::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr.iter())),
            BsonValue::Document(doc) => visitor.visit_map(MapDeserializer::new(doc.iter())),
            _ => Err(BsonError::Deserialization(format!(
                "Cannot deserialize {} as any",
                self.input.type_name()
            ))),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Boolean(b) => visitor.visit_bool(*b),
            _ => Err(unexpected("boolean", self.input)),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i32(visitor)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i32(visitor)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Int32(n) => visitor.visit_i32(*n),
            BsonValue::Int64(n) => visitor.visit_i64(*n),
            _ => Err(unexpected("integer", self.input)),
        }
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Int32(n) => visitor.visit_i64(*n as i64),
            BsonValue::Int64(n) | BsonValue::Timestamp(n) => visitor.visit_i64(*n),
            _ => Err(unexpected("integer", self.input)),
        }
    }

    fn deserialize_i128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Int32(n) => visitor.visit_i128(*n as i128),
            BsonValue::Int64(n) => visitor.visit_i128(*n as i128),
            _ => Err(unexpected("integer", self.input)),
        }
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_u32(visitor)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_u32(visitor)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Int32(n) if *n >= 0 => visitor.visit_u32(*n as u32),
            BsonValue::Int64(n) if *n >= 0 && *n <= u32::MAX as i64 => {
                visitor.visit_u32(*n as u32)
            }
            _ => Err(unexpected("unsigned integer", self.input)),
        }
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Int32(n) if *n >= 0 => visitor.visit_u64(*n as u64),
            BsonValue::Int64(n) if *n >= 0 => visitor.visit_u64(*n as u64),
            _ => Err(unexpected("unsigned integer", self.input)),
        }
    }

    fn deserialize_u128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Int32(n) if *n >= 0 => visitor.visit_u128(*n as u128),
            BsonValue::Int64(n) if *n >= 0 => visitor.visit_u128(*n as u128),
            _ => Err(unexpected("unsigned integer", self.input)),
        }
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Float64(n) => visitor.visit_f64(*n),
            BsonValue::Int32(n) => visitor.visit_f64(*n as f64),
            BsonValue::Int64(n) => visitor.visit_f64(*n as f64),
            _ => Err(unexpected("float", self.input)),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::String(s) if s.chars().count() == 1 => {
                visitor.visit_char(s.chars().next().unwrap())
            }
            _ => Err(unexpected("char", self.input)),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::String(s) | BsonValue::Symbol(s) => visitor.visit_str(s.as_str()),
            BsonValue::ObjectId(id) => visitor.visit_string(id.to_hex()),
            _ => Err(unexpected("string", self.input)),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Binary(b) => visitor.visit_bytes(&b.data),
            _ => Err(unexpected("binary", self.input)),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Null | BsonValue::Undefined => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Null => visitor.visit_unit(),
            _ => Err(unexpected("null", self.input)),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr.iter())),
            _ => Err(unexpected("array", self.input)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::Document(doc) => visitor.visit_map(MapDeserializer::new(doc.iter())),
            _ => Err(unexpected("document", self.input)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.input {
            BsonValue::String(s) | BsonValue::Symbol(s) => {
                visitor.visit_enum(s.as_str().into_deserializer())
            }
            BsonValue::Document(doc) if doc.len() == 1 => {
                let (key, value) = doc.iter().next().unwrap();
                visitor.visit_enum(EnumDeserializer {
                    variant: key.as_str(),
                    value,
                })
            }
            _ => Err(unexpected("string or single-key document", self.input)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}

struct SeqDeserializer<'de, I> {
    iter: I,
    _marker: std::marker::PhantomData<&'de ()>,
}

impl<'de, I: Iterator<Item = &'de BsonValue>> SeqDeserializer<'de, I> {
    fn new(iter: I) -> Self {
        Self {
            iter,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<'de, I: Iterator<Item = &'de BsonValue>> SeqAccess<'de> for SeqDeserializer<'de, I> {
    type Error = BsonError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        match self.iter.next() {
            Some(value) => seed.deserialize(Deserializer::from_bson(value)).map(Some),
            None => Ok(None),
        }
    }
}

struct MapDeserializer<'de, I> {
    iter: I,
    value: Option<&'de BsonValue>,
    _marker: std::marker::PhantomData<&'de ()>,
}

impl<'de, I: Iterator<Item = (&'de CompactString, &'de BsonValue)>> MapDeserializer<'de, I> {
    fn new(iter: I) -> Self {
        Self {
            iter,
            value: None,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<'de, I: Iterator<Item = (&'de CompactString, &'de BsonValue)>> MapAccess<'de>
    for MapDeserializer<'de, I>
{
    type Error = BsonError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(key.as_str().into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, Self::Error> {
        let value = self
            .value
            .take()
            .ok_or_else(|| BsonError::Deserialization("No value".to_string()))?;
        seed.deserialize(Deserializer::from_bson(value))
    }
}

struct EnumDeserializer<'de> {
    variant: &'de str,
    value: &'de BsonValue,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer<'de> {
    type Error = BsonError;
    type Variant = VariantDeserializer<'de>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), Self::Error> {
        use serde::de::value::StrDeserializer;
        let deserializer: StrDeserializer<'de, BsonError> = self.variant.into_deserializer();
        let variant: V::Value = seed.deserialize(deserializer)?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer<'de> {
    value: &'de BsonValue,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer<'de> {
    type Error = BsonError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, Self::Error> {
        seed.deserialize(Deserializer::from_bson(self.value))
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        de::Deserializer::deserialize_seq(Deserializer::from_bson(self.value), visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        de::Deserializer::deserialize_map(Deserializer::from_bson(self.value), visitor)
    }
}
