// In: src/writer/route.rs

//! Routing of `Value`s onto column accumulators.
//!
//! Three walks over the same (schema node, value) pairs:
//!
//! 1. `validate` checks shape and range and builds the error path. It never
//!    mutates, which is what lets a failed `write` leave the writer untouched.
//! 2. `append` pushes an already-validated value into the accumulators,
//!    recursing through structs, lists and maps.
//! 3. `estimate` sizes a value for the stripe byte threshold.
//!
//! Structural nulls are recorded on the structural column only; its children
//! see no entry for that row.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};

use crate::column::ColumnAccumulator;
use crate::error::OrcError;
use crate::schema::{PrimitiveType, SchemaKind, SchemaNode};
use crate::types::Value;

//==================================================================================
// 1. Scalar Coercion
//==================================================================================

/// A primitive value in the form its accumulator stores.
enum Scalar<'a> {
    Boolean(bool),
    Integer(i64),
    Float(f32),
    Double(f64),
    Bytes(Cow<'a, [u8]>),
    Timestamp(&'a DateTime<Utc>),
    Decimal(i128),
}

fn epoch_days(date: &NaiveDate) -> i64 {
    date.signed_duration_since(NaiveDate::default()).num_days()
}

fn char_value(s: &str, length: u32, pad: bool) -> Cow<'_, [u8]> {
    let length = length as usize;
    let char_count = s.chars().count();
    if char_count == length || (!pad && char_count < length) {
        return Cow::Borrowed(s.as_bytes());
    }
    let mut out: String = s.chars().take(length).collect();
    if pad {
        out.extend(std::iter::repeat(' ').take(length.saturating_sub(char_count)));
    }
    Cow::Owned(out.into_bytes())
}

fn coerce<'a>(
    primitive: &PrimitiveType,
    value: &'a Value,
    path: &str,
) -> Result<Scalar<'a>, OrcError> {
    let mismatch = || OrcError::mismatch(path, primitive, value.kind_name());
    match (primitive, value) {
        (PrimitiveType::Boolean, Value::Boolean(b)) => Ok(Scalar::Boolean(*b)),
        (
            PrimitiveType::TinyInt
            | PrimitiveType::SmallInt
            | PrimitiveType::Int
            | PrimitiveType::BigInt,
            Value::Int(v),
        ) => {
            let (min, max) = primitive.integer_range().ok_or_else(mismatch)?;
            if *v < min || *v > max {
                return Err(OrcError::mismatch(
                    path,
                    format!("{primitive} in [{min}, {max}]"),
                    v,
                ));
            }
            Ok(Scalar::Integer(*v))
        }
        (PrimitiveType::Date, Value::Date(d)) => Ok(Scalar::Integer(epoch_days(d))),
        (PrimitiveType::Float, Value::Float(v)) => Ok(Scalar::Float(*v)),
        (PrimitiveType::Float, Value::Double(v)) => {
            if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                return Err(OrcError::mismatch(path, "float in f32 range", v));
            }
            Ok(Scalar::Float(*v as f32))
        }
        (PrimitiveType::Double, Value::Double(v)) => Ok(Scalar::Double(*v)),
        (PrimitiveType::Double, Value::Float(v)) => Ok(Scalar::Double(f64::from(*v))),
        (PrimitiveType::String, Value::String(s)) => Ok(Scalar::Bytes(Cow::Borrowed(s.as_bytes()))),
        (PrimitiveType::Char(n), Value::String(s)) => Ok(Scalar::Bytes(char_value(s, *n, true))),
        (PrimitiveType::Varchar(n), Value::String(s)) => {
            Ok(Scalar::Bytes(char_value(s, *n, false)))
        }
        (PrimitiveType::Binary, Value::Binary(b)) => Ok(Scalar::Bytes(Cow::Borrowed(b.as_slice()))),
        (PrimitiveType::Binary, Value::String(s)) => {
            Ok(Scalar::Bytes(Cow::Borrowed(s.as_bytes())))
        }
        (PrimitiveType::Timestamp, Value::Timestamp(ts)) => Ok(Scalar::Timestamp(ts)),
        (PrimitiveType::Decimal { precision, scale }, Value::Decimal(d)) => {
            let rescaled = d.rescale(*scale).filter(|r| r.digits() <= *precision);
            rescaled
                .map(|r| Scalar::Decimal(r.unscaled))
                .ok_or_else(|| OrcError::mismatch(path, primitive, format!("decimal {d}")))
        }
        (PrimitiveType::Decimal { precision, scale }, Value::Int(v)) => {
            let rescaled = crate::types::Decimal::new(i128::from(*v), 0)
                .rescale(*scale)
                .filter(|r| r.digits() <= *precision);
            rescaled
                .map(|r| Scalar::Decimal(r.unscaled))
                .ok_or_else(|| OrcError::mismatch(path, primitive, format!("integer {v}")))
        }
        _ => Err(mismatch()),
    }
}

fn push_scalar(acc: &mut ColumnAccumulator, scalar: Scalar<'_>) -> Result<(), OrcError> {
    match scalar {
        Scalar::Boolean(b) => acc.push_bool(b),
        Scalar::Integer(v) => acc.push_int(v),
        Scalar::Float(v) => acc.push_float(v),
        Scalar::Double(v) => acc.push_double(v),
        Scalar::Bytes(b) => acc.push_bytes(&b),
        Scalar::Timestamp(ts) => acc.push_timestamp(ts),
        Scalar::Decimal(v) => acc.push_decimal(v),
    }
}

//==================================================================================
// 2. Validation
//==================================================================================

fn child_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

/// Checks `value` against `node` without touching any accumulator.
pub fn validate(node: &SchemaNode, value: &Value, path: &str) -> Result<(), OrcError> {
    if value.is_null() {
        return Ok(());
    }
    match (node.kind(), value) {
        (SchemaKind::Struct(fields), Value::Struct(values)) => {
            if values.len() > fields.len() {
                return Err(OrcError::mismatch(
                    path,
                    format!("struct with {} fields", fields.len()),
                    format!("struct with {} values", values.len()),
                ));
            }
            for (field, v) in fields.iter().zip(values) {
                validate(field, v, &child_path(path, field.field_name().unwrap_or_default()))?;
            }
            Ok(())
        }
        (SchemaKind::List(element), Value::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                validate(element, item, &format!("{path}[{i}]"))?;
            }
            Ok(())
        }
        (SchemaKind::Map(key, val), Value::Map(entries)) => {
            for (i, (k, v)) in entries.iter().enumerate() {
                validate(key, k, &format!("{path}[{i}].key"))?;
                validate(val, v, &format!("{path}[{i}].value"))?;
            }
            Ok(())
        }
        (SchemaKind::Primitive(p), _) => coerce(p, value, path).map(|_| ()),
        _ => Err(OrcError::mismatch(path, node.type_kind(), value.kind_name())),
    }
}

/// Validates one row against the root struct's fields.
pub fn validate_row(root: &SchemaNode, values: &[Value]) -> Result<(), OrcError> {
    let fields = root.fields();
    if values.len() != fields.len() {
        return Err(OrcError::Arity {
            what: "values",
            expected: fields.len(),
            found: values.len(),
        });
    }
    for (field, value) in fields.iter().zip(values) {
        validate(field, value, field.field_name().unwrap_or_default())?;
    }
    Ok(())
}

//==================================================================================
// 3. Appending
//==================================================================================

/// Appends a validated `value` for `node` and its descendants.
pub fn append(
    node: &SchemaNode,
    value: &Value,
    accumulators: &mut [ColumnAccumulator],
) -> Result<(), OrcError> {
    let id = node.id();
    let acc = accumulators
        .get_mut(id)
        .ok_or_else(|| OrcError::InternalError(format!("no accumulator for column {id}")))?;
    if value.is_null() {
        acc.push_null();
        return Ok(());
    }
    match (node.kind(), value) {
        (SchemaKind::Struct(fields), Value::Struct(values)) => {
            acc.push_struct()?;
            for (i, field) in fields.iter().enumerate() {
                // Missing trailing fields are implicit nulls.
                append(field, values.get(i).unwrap_or(&Value::Null), accumulators)?;
            }
            Ok(())
        }
        (SchemaKind::List(element), Value::List(items)) => {
            acc.push_length(items.len() as u64)?;
            for item in items {
                append(element, item, accumulators)?;
            }
            Ok(())
        }
        (SchemaKind::Map(key, val), Value::Map(entries)) => {
            acc.push_length(entries.len() as u64)?;
            for (k, v) in entries {
                append(key, k, accumulators)?;
                append(val, v, accumulators)?;
            }
            Ok(())
        }
        (SchemaKind::Primitive(p), _) => {
            let scalar = coerce(p, value, "")?;
            push_scalar(acc, scalar)
        }
        _ => Err(OrcError::InternalError(format!(
            "unvalidated {} value reached column {id}",
            value.kind_name()
        ))),
    }
}

/// Appends one validated row, including the root struct's own presence.
pub fn append_row<'v, I>(
    root: &SchemaNode,
    values: I,
    accumulators: &mut [ColumnAccumulator],
) -> Result<(), OrcError>
where
    I: IntoIterator<Item = &'v Value>,
{
    let root_acc = accumulators
        .get_mut(root.id())
        .ok_or_else(|| OrcError::InternalError("no accumulator for the root".to_string()))?;
    root_acc.push_struct()?;
    for (field, value) in root.fields().iter().zip(values) {
        append(field, value, accumulators)?;
    }
    Ok(())
}

//==================================================================================
// 4. Size Estimation
//==================================================================================

/// Uncompressed size estimate of `value` stored under `node`.
pub fn estimate(node: &SchemaNode, value: &Value) -> u64 {
    if value.is_null() {
        return 1;
    }
    match (node.kind(), value) {
        (SchemaKind::Struct(fields), Value::Struct(values)) => {
            1 + fields
                .iter()
                .enumerate()
                .map(|(i, f)| values.get(i).map_or(1, |v| estimate(f, v)))
                .sum::<u64>()
        }
        (SchemaKind::List(element), Value::List(items)) => {
            4 + items.iter().map(|v| estimate(element, v)).sum::<u64>()
        }
        (SchemaKind::Map(key, val), Value::Map(entries)) => {
            4 + entries
                .iter()
                .map(|(k, v)| estimate(key, k) + estimate(val, v))
                .sum::<u64>()
        }
        (SchemaKind::Primitive(p), v) => match p {
            PrimitiveType::Boolean | PrimitiveType::TinyInt => 1,
            PrimitiveType::SmallInt => 2,
            PrimitiveType::Int | PrimitiveType::Date | PrimitiveType::Float => 4,
            PrimitiveType::BigInt | PrimitiveType::Double => 8,
            PrimitiveType::Timestamp => 12,
            PrimitiveType::Decimal { .. } => 16,
            PrimitiveType::String
            | PrimitiveType::Binary
            | PrimitiveType::Char(_)
            | PrimitiveType::Varchar(_) => {
                let len = match v {
                    Value::String(s) => s.len(),
                    Value::Binary(b) => b.len(),
                    _ => 0,
                };
                len as u64 + 4
            }
        },
        _ => 1,
    }
}

/// Estimate for a whole row, counting the root struct's presence byte.
pub fn estimate_row<'v, I>(root: &SchemaNode, values: I) -> u64
where
    I: IntoIterator<Item = &'v Value>,
{
    1 + root
        .fields()
        .iter()
        .zip(values)
        .map(|(f, v)| estimate(f, v))
        .sum::<u64>()
}

//==================================================================================
// 5. Unit Tests
//==================================================================================
