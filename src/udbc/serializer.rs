use crate::error::DbError;
use crate::udbc::value::{Value, is_typed_token, restore_typed};
use serde::Serialize;
use serde::ser::{
    Error as _, Impossible, SerializeSeq, SerializeTuple, SerializeTupleStruct, Serializer,
};

fn unsupported(kind: &str) -> DbError {
    DbError::custom(format!("{} cannot be used as a positional parameter", kind))
}

/// 单个参数值的序列化器
pub struct ScalarSerializer;

impl Serializer for ScalarSerializer {
    type Ok = Value;
    type Error = DbError;
    type SerializeSeq = Impossible<Value, DbError>;
    type SerializeTuple = Impossible<Value, DbError>;
    type SerializeTupleStruct = Impossible<Value, DbError>;
    type SerializeTupleVariant = Impossible<Value, DbError>;
    type SerializeMap = Impossible<Value, DbError>;
    type SerializeStruct = Impossible<Value, DbError>;
    type SerializeStructVariant = Impossible<Value, DbError>;

    fn serialize_bool(self, v: bool) -> Result<Value, DbError> {
        Ok(Value::Bool(v))
    }
    fn serialize_i8(self, v: i8) -> Result<Value, DbError> {
        Ok(Value::I16(v as i16))
    }
    fn serialize_i16(self, v: i16) -> Result<Value, DbError> {
        Ok(Value::I16(v))
    }
    fn serialize_i32(self, v: i32) -> Result<Value, DbError> {
        Ok(Value::I32(v))
    }
    fn serialize_i64(self, v: i64) -> Result<Value, DbError> {
        Ok(Value::I64(v))
    }
    fn serialize_u8(self, v: u8) -> Result<Value, DbError> {
        Ok(Value::U8(v))
    }
    fn serialize_u16(self, v: u16) -> Result<Value, DbError> {
        Ok(Value::I32(v as i32))
    }
    fn serialize_u32(self, v: u32) -> Result<Value, DbError> {
        Ok(Value::I64(v as i64))
    }
    fn serialize_u64(self, v: u64) -> Result<Value, DbError> {
        Ok(Value::U64(v))
    }
    fn serialize_f32(self, v: f32) -> Result<Value, DbError> {
        Ok(Value::F64(v as f64))
    }
    fn serialize_f64(self, v: f64) -> Result<Value, DbError> {
        Ok(Value::F64(v))
    }
    fn serialize_char(self, v: char) -> Result<Value, DbError> {
        Ok(Value::Str(v.to_string()))
    }
    fn serialize_str(self, v: &str) -> Result<Value, DbError> {
        Ok(Value::Str(v.to_string()))
    }
    fn serialize_bytes(self, v: &[u8]) -> Result<Value, DbError> {
        Ok(Value::Bytes(v.to_vec()))
    }
    fn serialize_none(self) -> Result<Value, DbError> {
        Ok(Value::Null)
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value, DbError> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Value, DbError> {
        Ok(Value::Null)
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<Value, DbError> {
        Ok(Value::Null)
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
    ) -> Result<Value, DbError> {
        Ok(Value::Str(variant.to_string()))
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value, DbError> {
        let inner = value.serialize(self)?;
        if !is_typed_token(name) {
            return Ok(inner);
        }
        match inner {
            Value::Str(text) => restore_typed(name, &text),
            other => Err(DbError::Value(format!(
                "{} expects a text payload, got {:?}",
                name, other
            ))),
        }
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<Value, DbError> {
        value.serialize(self)
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, DbError> {
        Err(unsupported("a nested sequence"))
    }
    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, DbError> {
        Err(unsupported("a nested tuple"))
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, DbError> {
        Err(unsupported("a nested tuple struct"))
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, DbError> {
        Err(unsupported("a tuple variant"))
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, DbError> {
        Err(unsupported("a map"))
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self::SerializeStruct, DbError> {
        Err(unsupported("a struct"))
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, DbError> {
        Err(unsupported("a struct variant"))
    }
}

/// 参数列表序列化器：序列/元组展开为位置参数，单个标量视为一个参数
pub struct ParamsSerializer;

pub struct ParamList {
    values: Vec<Value>,
}

macro_rules! forward_scalar {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<Vec<Value>, DbError> {
                ScalarSerializer.$method(v).map(|v| vec![v])
            }
        )*
    };
}

impl Serializer for ParamsSerializer {
    type Ok = Vec<Value>;
    type Error = DbError;
    type SerializeSeq = ParamList;
    type SerializeTuple = ParamList;
    type SerializeTupleStruct = ParamList;
    type SerializeTupleVariant = Impossible<Vec<Value>, DbError>;
    type SerializeMap = Impossible<Vec<Value>, DbError>;
    type SerializeStruct = Impossible<Vec<Value>, DbError>;
    type SerializeStructVariant = Impossible<Vec<Value>, DbError>;

    forward_scalar! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    }

    // 参数缺省（None / ()）等价于空参数列表
    fn serialize_none(self) -> Result<Vec<Value>, DbError> {
        Ok(Vec::new())
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Vec<Value>, DbError> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Vec<Value>, DbError> {
        Ok(Vec::new())
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<Vec<Value>, DbError> {
        Ok(Vec::new())
    }
    fn serialize_unit_variant(
        self,
        name: &'static str,
        index: u32,
        variant: &'static str,
    ) -> Result<Vec<Value>, DbError> {
        ScalarSerializer
            .serialize_unit_variant(name, index, variant)
            .map(|v| vec![v])
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Vec<Value>, DbError> {
        if is_typed_token(name) {
            return ScalarSerializer
                .serialize_newtype_struct(name, value)
                .map(|v| vec![v]);
        }
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<Vec<Value>, DbError> {
        value.serialize(ScalarSerializer).map(|v| vec![v])
    }
    fn serialize_seq(self, len: Option<usize>) -> Result<ParamList, DbError> {
        Ok(ParamList {
            values: Vec::with_capacity(len.unwrap_or(0)),
        })
    }
    fn serialize_tuple(self, len: usize) -> Result<ParamList, DbError> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_struct(self, _: &'static str, len: usize) -> Result<ParamList, DbError> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, DbError> {
        Err(unsupported("a tuple variant"))
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, DbError> {
        Err(unsupported("a map"))
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self::SerializeStruct, DbError> {
        Err(unsupported("a struct"))
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, DbError> {
        Err(unsupported("a struct variant"))
    }
}

macro_rules! impl_param_list {
    ($trait:ident, $method:ident) => {
        impl $trait for ParamList {
            type Ok = Vec<Value>;
            type Error = DbError;

            fn $method<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), DbError> {
                self.values.push(value.serialize(ScalarSerializer)?);
                Ok(())
            }

            fn end(self) -> Result<Vec<Value>, DbError> {
                Ok(self.values)
            }
        }
    };
}

impl_param_list!(SerializeSeq, serialize_element);
impl_param_list!(SerializeTuple, serialize_element);
impl_param_list!(SerializeTupleStruct, serialize_field);
