//! The tagged value union crossing the database capability boundary.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

/// The only representation that crosses the capability boundary for
/// SQL parameters and result columns.
///
/// `Text` and `Blob` borrow caller-owned memory that is only valid
/// for the duration of the call; binding copies the bytes into the
/// statement, so the caller's buffer does not need to outlive it.
/// The enum is exhaustive; there is no unrecognized tag to bind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// SQL NULL.
    Nil,
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 text, borrowed from the caller or the current row.
    Text(&'a str),
    /// Raw bytes, borrowed from the caller or the current row.
    Blob(&'a [u8]),
    /// Boolean, stored as integer 0/1.
    Bool(bool),
}

impl Value<'_> {
    /// Short tag name for log lines.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Bool(_) => "bool",
        }
    }
}

impl ToSql for Value<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match *self {
            Self::Nil => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Self::Int(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i)),
            Self::Double(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(f)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Self::Bool(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(b))),
        })
    }
}

impl<'a> TryFrom<ValueRef<'a>> for Value<'a> {
    type Error = std::str::Utf8Error;

    fn try_from(value: ValueRef<'a>) -> Result<Self, Self::Error> {
        Ok(match value {
            ValueRef::Null => Self::Nil,
            ValueRef::Integer(i) => Self::Int(i),
            ValueRef::Real(f) => Self::Double(f),
            ValueRef::Text(t) => Self::Text(std::str::from_utf8(t)?),
            ValueRef::Blob(b) => Self::Blob(b),
        })
    }
}
