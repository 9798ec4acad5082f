//! Coercing raw field input into stored values

use crate::form::{FieldRegistration, RegisterOptions};
use crate::logic::InputKind;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

/// Apply a field's `value_as_number`, `value_as_date` or `set_value_as`
/// coercion to `value`. Absence stays absent.
///
/// Numbers that fail to parse (including `""`) become `null`. Dates become
/// RFC 3339 strings in UTC with millisecond precision; unparseable dates
/// become `null`.
pub fn get_field_value_as(value: Option<Value>, options: &RegisterOptions) -> Option<Value> {
    let value = value?;
    if options.value_as_number {
        return Some(as_number(value));
    }
    if options.value_as_date {
        if let Value::String(text) = &value {
            return Some(as_date(text));
        }
    }
    match &options.set_value_as {
        Some(set_value_as) => Some(set_value_as(value)),
        None => Some(value),
    }
}

/// Read the current raw value of a registered field from its host
/// reference. Disabled or detached references yield nothing.
pub fn get_field_value(registration: &FieldRegistration) -> Option<Value> {
    let field_ref = registration.field_ref.as_ref()?;
    if field_ref.is_disabled() {
        return None;
    }
    match field_ref.kind() {
        InputKind::Text => get_field_value_as(field_ref.value(), &registration.options),
        InputKind::Checkbox | InputKind::Radio | InputKind::File | InputKind::SelectMultiple => {
            field_ref.value()
        }
    }
}

fn as_number(value: Value) -> Value {
    match value {
        Value::String(text) if text.is_empty() => Value::Null,
        Value::String(text) => parse_number(text.trim()),
        Value::Bool(true) => Value::from(1),
        value @ (Value::Bool(false) | Value::Number(_) | Value::Null) => value,
        Value::Array(_) | Value::Object(_) => Value::Null,
    }
}

fn parse_number(text: &str) -> Value {
    if text.is_empty() {
        return Value::from(0);
    }
    if let Ok(int) = text.parse::<i64>() {
        return Value::from(int);
    }
    text.parse::<f64>()
        .ok()
        .filter(|float| float.is_finite())
        .and_then(Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

fn as_date(text: &str) -> Value {
    parse_date(text).map_or(Value::Null, |date| {
        Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
    })
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|date| date.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::MockFieldRef;
    use serde_json::json;
    use std::sync::Arc;

    fn numeric() -> RegisterOptions {
        RegisterOptions {
            value_as_number: true,
            ..Default::default()
        }
    }

    mod value_as_tests {
        use super::*;

        #[test]
        fn test_absent_value_stays_absent() {
            assert_eq!(get_field_value_as(None, &numeric()), None);
        }

        #[test]
        fn test_empty_string_as_number_is_null() {
            assert_eq!(get_field_value_as(Some(json!("")), &numeric()), Some(Value::Null));
        }

        #[test]
        fn test_numeric_string_as_number() {
            assert_eq!(get_field_value_as(Some(json!("123")), &numeric()), Some(json!(123)));
            assert_eq!(get_field_value_as(Some(json!("12.5")), &numeric()), Some(json!(12.5)));
            assert_eq!(get_field_value_as(Some(json!("abc")), &numeric()), Some(Value::Null));
        }

        #[test]
        fn test_falsy_number_passes_through() {
            assert_eq!(get_field_value_as(Some(json!(0)), &numeric()), Some(json!(0)));
            assert_eq!(get_field_value_as(Some(json!(false)), &numeric()), Some(json!(false)));
        }

        #[test]
        fn test_date_string_as_date() {
            let options = RegisterOptions {
                value_as_date: true,
                ..Default::default()
            };
            assert_eq!(
                get_field_value_as(Some(json!("2023-01-01")), &options),
                Some(json!("2023-01-01T00:00:00.000Z"))
            );
            assert_eq!(
                get_field_value_as(Some(json!("2023-01-01T10:30:00+02:00")), &options),
                Some(json!("2023-01-01T08:30:00.000Z"))
            );
            assert_eq!(get_field_value_as(Some(json!("not a date")), &options), Some(Value::Null));
        }

        #[test]
        fn test_set_value_as_applies() {
            let options = RegisterOptions {
                set_value_as: Some(Arc::new(|value: Value| {
                    json!(format!("transformed_{}", value.as_str().unwrap_or_default()))
                })),
                ..Default::default()
            };
            assert_eq!(
                get_field_value_as(Some(json!("test")), &options),
                Some(json!("transformed_test"))
            );
        }
    }

    mod field_value_tests {
        use super::*;

        fn registration(field_ref: MockFieldRef) -> FieldRegistration {
            let mut registration = FieldRegistration::new("test");
            registration.field_ref = Some(Arc::new(field_ref));
            registration
        }

        #[test]
        fn test_detached_field_has_no_value() {
            assert_eq!(get_field_value(&FieldRegistration::new("test")), None);
        }

        #[test]
        fn test_disabled_ref_has_no_value() {
            let mut field_ref = MockFieldRef::new();
            field_ref.expect_is_disabled().return_const(true);
            assert_eq!(get_field_value(&registration(field_ref)), None);
        }

        #[test]
        fn test_multiple_select_returns_raw_selection() {
            let mut field_ref = MockFieldRef::new();
            field_ref.expect_is_disabled().return_const(false);
            field_ref.expect_kind().return_const(InputKind::SelectMultiple);
            field_ref.expect_value().returning(|| Some(json!(["2"])));
            assert_eq!(get_field_value(&registration(field_ref)), Some(json!(["2"])));
        }

        #[test]
        fn test_text_value_is_coerced() {
            let mut field_ref = MockFieldRef::new();
            field_ref.expect_is_disabled().return_const(false);
            field_ref.expect_kind().return_const(InputKind::Text);
            field_ref.expect_value().returning(|| Some(json!("42")));
            let mut registration = registration(field_ref);
            registration.options.value_as_number = true;
            assert_eq!(get_field_value(&registration), Some(json!(42)));
        }
    }
}
