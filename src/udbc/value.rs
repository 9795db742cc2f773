use crate::error::DbError;
use crate::udbc::serializer::ParamsSerializer;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U64(u64),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeUtc(DateTime<Utc>),
    Decimal(Decimal),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I16(v) => Some(*v as i64),
            Value::I32(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            Value::U8(v) => Some(*v as i64),
            Value::U64(v) => i64::try_from(*v).ok(),
            Value::Str(s) => s.parse().ok(),
            Value::Bytes(b) => std::str::from_utf8(b).ok()?.parse().ok(),
            _ => None,
        }
    }

    /// 文本列在 MySQL 文本协议中以字节返回，这里统一转为字符串
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}

// 带类型的值以 newtype struct 传递文本形式，参数序列化器按名称还原原始类型；
// 其他序列化器看到的只是字符串
const DATE_TOKEN: &str = "$asyncsql::Date";
const TIME_TOKEN: &str = "$asyncsql::Time";
const DATETIME_TOKEN: &str = "$asyncsql::DateTime";
const DATETIME_UTC_TOKEN: &str = "$asyncsql::DateTimeUtc";
const DECIMAL_TOKEN: &str = "$asyncsql::Decimal";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub(crate) fn is_typed_token(name: &str) -> bool {
    matches!(
        name,
        DATE_TOKEN | TIME_TOKEN | DATETIME_TOKEN | DATETIME_UTC_TOKEN | DECIMAL_TOKEN
    )
}

fn typed_error(name: &str, text: &str, e: impl std::fmt::Display) -> DbError {
    DbError::Value(format!("{}: cannot parse {:?} ({})", name, text, e))
}

/// Rebuilds the typed value carried under `name` from its text form.
pub(crate) fn restore_typed(name: &str, text: &str) -> Result<Value, DbError> {
    match name {
        DATE_TOKEN => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|e| typed_error(name, text, e)),
        TIME_TOKEN => NaiveTime::parse_from_str(text, TIME_FORMAT)
            .map(Value::Time)
            .map_err(|e| typed_error(name, text, e)),
        DATETIME_TOKEN => NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
            .map(Value::DateTime)
            .map_err(|e| typed_error(name, text, e)),
        DATETIME_UTC_TOKEN => DateTime::parse_from_rfc3339(text)
            .map(|v| Value::DateTimeUtc(v.with_timezone(&Utc)))
            .map_err(|e| typed_error(name, text, e)),
        DECIMAL_TOKEN => text
            .parse::<Decimal>()
            .map(Value::Decimal)
            .map_err(|e| typed_error(name, text, e)),
        _ => Ok(Value::Str(text.to_string())),
    }
}

/// A `Value` inside a parameter list converts back to itself, including the
/// date and decimal variants.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => s.serialize_none(),
            Value::Bool(v) => s.serialize_bool(*v),
            Value::I16(v) => s.serialize_i16(*v),
            Value::I32(v) => s.serialize_i32(*v),
            Value::I64(v) => s.serialize_i64(*v),
            Value::U8(v) => s.serialize_u8(*v),
            Value::U64(v) => s.serialize_u64(*v),
            Value::F64(v) => s.serialize_f64(*v),
            Value::Str(v) => s.serialize_str(v),
            Value::Bytes(v) => s.serialize_bytes(v),
            Value::Date(v) => {
                s.serialize_newtype_struct(DATE_TOKEN, &v.format(DATE_FORMAT).to_string())
            }
            Value::Time(v) => {
                s.serialize_newtype_struct(TIME_TOKEN, &v.format(TIME_FORMAT).to_string())
            }
            Value::DateTime(v) => s.serialize_newtype_struct(
                DATETIME_TOKEN,
                &v.format(DATETIME_FORMAT).to_string(),
            ),
            Value::DateTimeUtc(v) => s.serialize_newtype_struct(DATETIME_UTC_TOKEN, &v.to_rfc3339()),
            Value::Decimal(v) => s.serialize_newtype_struct(DECIMAL_TOKEN, &v.to_string()),
        }
    }
}

/// 将 T: Serialize 转为位置参数列表
///
/// `()`, `None` and empty sequences produce no parameters, which means the
/// statement is sent as literal SQL. Maps and structs are rejected because
/// their field order does not define a position.
pub fn to_params<T: Serialize + ?Sized>(t: &T) -> Result<Vec<Value>, DbError> {
    t.serialize(ParamsSerializer)
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}
impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}
impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}
impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}
impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}
impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
