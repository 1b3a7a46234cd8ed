//! Value conversion between sea-query and may_postgres.
//!
//! Outbound, [`with_converted_params`] turns the `Values` produced by
//! `PostgresQueryBuilder` into `ToSql` parameters. Inbound, [`row_to_record`]
//! decodes a result row into a [`Record`] keyed by column name.

use crate::executor::LifeError;
use crate::model::Record;
use crate::value::is_null;
use bytes::BytesMut;
use may_postgres::types::{FromSql, IsNull, ToSql, Type};
use may_postgres::Row;
use postgres_types::to_sql_checked;
use sea_query::{Value, Values};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::error::Error;

/// A NULL parameter that is accepted for any column type.
///
/// Typed nulls would make `"col" IN ($1)` fail the driver's type check when
/// the null's Rust type does not match the column.
#[derive(Debug)]
struct UntypedNull;

impl ToSql for UntypedNull {
    fn to_sql(&self, _ty: &Type, _out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn to_sql_param(value: &Value) -> Result<Box<dyn ToSql>, LifeError> {
    if is_null(value) {
        return Ok(Box::new(UntypedNull));
    }
    // `borrow()` reads the payload whether sea-query stores it inline or boxed
    let param: Box<dyn ToSql> = match value {
        Value::Bool(Some(b)) => Box::new(*b),
        Value::TinyInt(Some(i)) => Box::new(i16::from(*i)),
        Value::SmallInt(Some(i)) => Box::new(*i),
        Value::Int(Some(i)) => Box::new(*i),
        Value::BigInt(Some(i)) => Box::new(*i),
        Value::TinyUnsigned(Some(u)) => Box::new(i16::from(*u)),
        Value::SmallUnsigned(Some(u)) => Box::new(i32::from(*u)),
        Value::Unsigned(Some(u)) => Box::new(i64::from(*u)),
        Value::BigUnsigned(Some(u)) => Box::new(i64::try_from(*u).map_err(|_| {
            LifeError::Other(format!(
                "BigUnsigned value {u} exceeds i64::MAX ({}), cannot be safely cast to i64",
                i64::MAX
            ))
        })?),
        Value::Float(Some(f)) => Box::new(*f),
        Value::Double(Some(d)) => Box::new(*d),
        Value::String(Some(s)) => Box::new(s.to_string()),
        Value::Char(Some(c)) => Box::new(c.to_string()),
        Value::Bytes(Some(b)) => Box::new(b.to_vec()),
        Value::Json(Some(j)) => Box::new(
            serde_json::to_value(j)
                .map_err(|e| LifeError::Other(format!("Failed to serialize JSON: {e}")))?,
        ),
        Value::Uuid(Some(u)) => {
            let u: &uuid::Uuid = u.borrow();
            Box::new(*u)
        }
        Value::Decimal(Some(d)) => {
            let d: &rust_decimal::Decimal = d.borrow();
            Box::new(*d)
        }
        Value::ChronoDate(Some(d)) => {
            let d: &chrono::NaiveDate = d.borrow();
            Box::new(*d)
        }
        Value::ChronoTime(Some(t)) => {
            let t: &chrono::NaiveTime = t.borrow();
            Box::new(*t)
        }
        Value::ChronoDateTime(Some(dt)) => {
            let dt: &chrono::NaiveDateTime = dt.borrow();
            Box::new(*dt)
        }
        Value::ChronoDateTimeUtc(Some(dt)) => {
            let dt: &chrono::DateTime<chrono::Utc> = dt.borrow();
            Box::new(*dt)
        }
        Value::ChronoDateTimeWithTimeZone(Some(dt)) => {
            let dt: &chrono::DateTime<chrono::FixedOffset> = dt.borrow();
            Box::new(*dt)
        }
        other => {
            return Err(LifeError::Other(format!(
                "Unsupported value type in query: {other:?}"
            )))
        }
    };
    Ok(param)
}

/// Convert SeaQuery values to may_postgres `ToSql` parameters and run `f` with them.
///
/// # Errors
///
/// Returns `LifeError::Other` if an unsupported value type is encountered,
/// otherwise whatever `f` returns.
pub fn with_converted_params<F, R>(values: &Values, f: F) -> Result<R, LifeError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, LifeError>,
{
    let owned = values
        .iter()
        .map(to_sql_param)
        .collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|param| param.as_ref()).collect();
    f(&params)
}

fn column<'a, T>(row: &'a Row, idx: usize) -> Result<Option<T>, LifeError>
where
    T: FromSql<'a>,
{
    row.try_get::<usize, Option<T>>(idx)
        .map_err(|e| LifeError::ParseError(format!("Failed to read column {idx}: {e}")))
}

fn decode_column(row: &Row, idx: usize, ty: &Type) -> Result<Value, LifeError> {
    let value = match *ty {
        Type::BOOL => Value::from(column::<bool>(row, idx)?),
        Type::INT2 => Value::from(column::<i16>(row, idx)?),
        Type::INT4 => Value::from(column::<i32>(row, idx)?),
        Type::INT8 => Value::from(column::<i64>(row, idx)?),
        Type::FLOAT4 => Value::from(column::<f32>(row, idx)?),
        Type::FLOAT8 => Value::from(column::<f64>(row, idx)?),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            Value::from(column::<String>(row, idx)?)
        }
        Type::BYTEA => Value::from(column::<Vec<u8>>(row, idx)?),
        Type::UUID => Value::from(column::<uuid::Uuid>(row, idx)?),
        Type::JSON | Type::JSONB => Value::from(column::<serde_json::Value>(row, idx)?),
        Type::NUMERIC => Value::from(column::<rust_decimal::Decimal>(row, idx)?),
        Type::DATE => Value::from(column::<chrono::NaiveDate>(row, idx)?),
        Type::TIME => Value::from(column::<chrono::NaiveTime>(row, idx)?),
        Type::TIMESTAMP => Value::from(column::<chrono::NaiveDateTime>(row, idx)?),
        Type::TIMESTAMPTZ => Value::from(column::<chrono::DateTime<chrono::Utc>>(row, idx)?),
        _ => {
            return Err(LifeError::ParseError(format!(
                "Unsupported column type {ty} at index {idx}"
            )))
        }
    };
    Ok(value)
}

/// Decode a result row into a [`Record`] keyed by column name
///
/// # Errors
///
/// Returns `LifeError::ParseError` for unsupported column types or values the
/// driver cannot decode.
pub fn row_to_record(row: &Row) -> Result<Record, LifeError> {
    let mut attributes = BTreeMap::new();
    for (idx, col) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, col.type_())?;
        attributes.insert(col.name().to_string(), value);
    }
    Ok(Record::from_attributes(attributes))
}
