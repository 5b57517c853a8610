//! Handle the translation of literal values.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};

use query_engine_metadata::metadata::ScalarType;
use query_engine_sql::sql;
use query_engine_sql::sql::string::{Param, Value};

use crate::translation::error::Error;
use crate::translation::request::Literal;

/// Convert a literal into a bound parameter, or `NULL`.
/// `sql_type` is the explicit SQL type of the column the literal is compared with or stored in.
pub fn translate_literal(
    literal: &Literal,
    sql_type: Option<String>,
) -> Result<sql::ast::Expression, Error> {
    let (value, r#type) = match literal {
        Literal::Null => return Ok(sql::ast::Expression::Null),
        Literal::Boolean(value) => (Value::Bool(*value), ScalarType::Boolean),
        Literal::Int(value) => {
            let r#type = if i32::try_from(*value).is_ok() {
                ScalarType::Int32
            } else {
                ScalarType::Int64
            };
            (Value::Int(*value), r#type)
        }
        Literal::Double(value) => (Value::Float(*value), ScalarType::Double),
        Literal::Decimal(value) => (Value::Decimal(value.clone()), ScalarType::Decimal),
        Literal::String(value) => (Value::String(value.clone()), ScalarType::String),
        Literal::DateTime(value) => (
            Value::DateTime(parse_date_time(value)?),
            ScalarType::DateTime,
        ),
        Literal::DateTimeOffset(value) => (
            Value::DateTime(parse_date_time(value)?),
            ScalarType::DateTimeOffset,
        ),
        Literal::Time(value) => (Value::Time(parse_time(value)?), ScalarType::Time),
        Literal::Guid(value) => (Value::Guid(value.clone()), ScalarType::Guid),
    };
    Ok(sql::ast::Expression::Param(Param {
        value,
        r#type,
        sql_type,
    }))
}

/// A string literal as a `LIKE` pattern parameter.
pub fn like_pattern(pattern: String, sql_type: Option<String>) -> sql::ast::Expression {
    sql::ast::Expression::Param(Param {
        value: Value::String(pattern),
        r#type: ScalarType::String,
        sql_type,
    })
}

/// Parse a date/time literal and normalize it to UTC at second precision.
/// A literal without an offset is read as UTC.
pub fn parse_date_time(literal: &str) -> Result<DateTime<Utc>, Error> {
    let parsed = match DateTime::parse_from_rfc3339(literal) {
        Ok(with_offset) => with_offset.with_timezone(&Utc),
        Err(_) => ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(literal, format).ok())
            .map(|naive| naive.and_utc())
            .ok_or_else(|| Error::InvalidDateTimeLiteral(literal.to_string()))?,
    };
    parsed
        .with_nanosecond(0)
        .ok_or_else(|| Error::InvalidDateTimeLiteral(literal.to_string()))
}

/// Parse a time-of-day literal, truncated to seconds.
pub fn parse_time(literal: &str) -> Result<NaiveTime, Error> {
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(literal, format).ok())
        .and_then(|time| time.with_nanosecond(0))
        .ok_or_else(|| Error::InvalidDateTimeLiteral(literal.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(literal: &str) -> String {
        parse_date_time(literal).unwrap().to_rfc3339()
    }

    #[test]
    fn date_times_are_normalized_to_utc_seconds() {
        assert_eq!(rendered("2023-03-01T10:15:30+02:00"), "2023-03-01T08:15:30+00:00");
        assert_eq!(rendered("2023-03-01T10:15:30.987Z"), "2023-03-01T10:15:30+00:00");
        assert_eq!(rendered("2023-03-01T10:15:30.5"), "2023-03-01T10:15:30+00:00");
        assert_eq!(rendered("2023-03-01T10:15"), "2023-03-01T10:15:00+00:00");
    }

    #[test]
    fn malformed_date_times_are_rejected() {
        assert_eq!(
            parse_date_time("yesterday"),
            Err(Error::InvalidDateTimeLiteral("yesterday".to_string()))
        );
        assert!(parse_time("25:00:00").is_err());
        assert_eq!(
            parse_time("13:20:05.250").unwrap(),
            NaiveTime::from_hms_opt(13, 20, 5).unwrap()
        );
    }

    #[test]
    fn literals_carry_their_logical_type() {
        let sql::ast::Expression::Param(small) = translate_literal(&Literal::Int(10), None).unwrap()
        else {
            panic!("expected a parameter")
        };
        assert_eq!(small.r#type, ScalarType::Int32);

        let sql::ast::Expression::Param(large) =
            translate_literal(&Literal::Int(i64::from(i32::MAX) + 1), None).unwrap()
        else {
            panic!("expected a parameter")
        };
        assert_eq!(large.r#type, ScalarType::Int64);

        assert_eq!(
            translate_literal(&Literal::Null, Some("VARCHAR".to_string())).unwrap(),
            sql::ast::Expression::Null
        );
    }
}
