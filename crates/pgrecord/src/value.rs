//! Dynamic column values.
//!
//! Attributes, bindings and rows all carry [`Value`], a closed set of scalar
//! types plus JSON. `Value` converts to and from PostgreSQL wire values so a
//! model can round-trip rows without compile-time knowledge of its columns.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

use crate::error::{OrmError, OrmResult};

/// A row returned by the database: column name to value.
pub type Record = BTreeMap<String, Value>;

type BoxError = Box<dyn Error + Sync + Send>;

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact `NUMERIC` value.
    Decimal(Decimal),
    Text(String),
    Json(serde_json::Value),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Decimal(d) => f64::try_from(*d).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert into a plain JSON value (timestamps as RFC 3339 strings).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Decimal(d) => serde_json::Value::String(d.to_string()),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Json(v) => v.clone(),
            Value::Timestamp(t) => serde_json::Value::String(t.to_rfc3339()),
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s) => f.write_str(s),
            Value::Json(v) => write!(f, "{v}"),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Uuid(u) => write!(f, "{u}"),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v.and_utc())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// JSON scalars map onto the matching variant; arrays and objects stay JSON.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }
}

fn is_text_type(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || matches!(ty.kind(), Kind::Enum(_))
        || ty.name() == "citext"
}

fn int_to_sql(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(i)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(i)?.to_sql(ty, out),
        Type::OID => u32::try_from(i)?.to_sql(ty, out),
        Type::FLOAT4 => (i as f32).to_sql(ty, out),
        Type::FLOAT8 => (i as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(i).to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::Value::from(i).to_sql(ty, out),
        _ if is_text_type(ty) => i.to_string().as_str().to_sql(ty, out),
        _ => i.to_sql(ty, out),
    }
}

fn float_to_sql(f: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (f as f32).to_sql(ty, out),
        Type::NUMERIC => Decimal::try_from(f)?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::Value::from(f).to_sql(ty, out),
        _ if is_text_type(ty) => f.to_string().as_str().to_sql(ty, out),
        _ => f.to_sql(ty, out),
    }
}

/// RFC 3339, or `YYYY-MM-DD HH:MM:SS[.fff]` read as UTC.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, BoxError> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))?;
    Ok(naive.and_utc())
}

fn decimal_to_sql(d: Decimal, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
            if !d.fract().is_zero() {
                return Err(format!("{d} has a fractional part").into());
            }
            int_to_sql(i64::try_from(d)?, ty, out)
        }
        Type::FLOAT4 | Type::FLOAT8 => float_to_sql(f64::try_from(d)?, ty, out),
        Type::JSON | Type::JSONB => serde_json::Value::String(d.to_string()).to_sql(ty, out),
        _ if is_text_type(ty) => d.to_string().as_str().to_sql(ty, out),
        _ => d.to_sql(ty, out),
    }
}

fn text_to_sql(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => int_to_sql(s.trim().parse()?, ty, out),
        Type::FLOAT4 | Type::FLOAT8 => float_to_sql(s.trim().parse()?, ty, out),
        Type::NUMERIC => s.trim().parse::<Decimal>()?.to_sql(ty, out),
        Type::BOOL => s.trim().parse::<bool>()?.to_sql(ty, out),
        Type::DATE => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?.to_sql(ty, out),
        Type::TIMESTAMP => parse_timestamp(s)?.naive_utc().to_sql(ty, out),
        Type::TIMESTAMPTZ => parse_timestamp(s)?.to_sql(ty, out),
        Type::UUID => Uuid::parse_str(s.trim())?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::Value::String(s.to_string()).to_sql(ty, out),
        _ => s.to_sql(ty, out),
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => match *ty {
                _ if is_text_type(ty) => b.to_string().as_str().to_sql(ty, out),
                Type::JSON | Type::JSONB => serde_json::Value::Bool(*b).to_sql(ty, out),
                _ => b.to_sql(ty, out),
            },
            Value::Int(i) => int_to_sql(*i, ty, out),
            Value::Float(f) => float_to_sql(*f, ty, out),
            Value::Decimal(d) => decimal_to_sql(*d, ty, out),
            Value::Text(s) => text_to_sql(s, ty, out),
            Value::Json(v) => match *ty {
                _ if is_text_type(ty) => v.to_string().as_str().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Timestamp(t) => match *ty {
                Type::TIMESTAMP => t.naive_utc().to_sql(ty, out),
                Type::DATE => t.date_naive().to_sql(ty, out),
                _ if is_text_type(ty) => t.to_rfc3339().as_str().to_sql(ty, out),
                _ => t.to_sql(ty, out),
            },
            Value::Uuid(u) => match *ty {
                _ if is_text_type(ty) => u.to_string().as_str().to_sql(ty, out),
                _ => u.to_sql(ty, out),
            },
        }
    }

    // Conversion is decided per value in `to_sql`; mismatches surface as errors there.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::Int(i64::from(i16::from_sql(ty, raw)?)),
            Type::INT4 => Value::Int(i64::from(i32::from_sql(ty, raw)?)),
            Type::INT8 => Value::Int(i64::from_sql(ty, raw)?),
            Type::OID => Value::Int(i64::from(u32::from_sql(ty, raw)?)),
            Type::FLOAT4 => Value::Float(f64::from(f32::from_sql(ty, raw)?)),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::Decimal(Decimal::from_sql(ty, raw)?),
            Type::JSON | Type::JSONB => Value::Json(serde_json::Value::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::Timestamp(DateTime::<Utc>::from_sql(ty, raw)?),
            Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?.and_utc()),
            Type::DATE => Value::Text(NaiveDate::from_sql(ty, raw)?.format("%Y-%m-%d").to_string()),
            Type::UUID => Value::Uuid(Uuid::from_sql(ty, raw)?),
            _ if is_text_type(ty) => {
                Value::Text(<&str as FromSql>::from_sql(ty, raw)?.to_string())
            }
            _ => {
                return Err(format!(
                    "unsupported column type `{}`; cast it to text or a numeric type in the select list",
                    ty.name()
                )
                .into());
            }
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Decode a driver row into a [`Record`].
pub fn record_from_row(row: &tokio_postgres::Row) -> OrmResult<Record> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value: Value = row
            .try_get(idx)
            .map_err(|e| OrmError::decode(column.name(), e.to_string()))?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

/// Build a [`Record`] from `key => value` pairs.
///
/// ```ignore
/// let attrs = record! { "name" => "Alice", "age" => 30 };
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(
            record.insert(::std::string::ToString::to_string(&$key), $crate::Value::from($value));
        )+
        record
    }};
}
