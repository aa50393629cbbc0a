//! Lenient conversion of hand-edited config values.

use toml::Value;

pub(super) fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Integer(0) => Some(false),
        Value::Integer(1) => Some(true),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Integer(i) => *i as f64,
        Value::Float(f) => *f,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Whole number, clamped to at least 1. Fractions are truncated.
pub(super) fn to_count(value: &Value) -> Option<usize> {
    let n = match value {
        Value::Integer(i) => *i,
        other => to_f64(other)?.trunc() as i64,
    };
    Some(n.max(1) as usize)
}

/// Seconds, clamped to at least 0.
pub(super) fn to_seconds(value: &Value) -> Option<f64> {
    to_f64(value).map(|s| s.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bools_from_strings_and_ints() {
        assert_eq!(to_bool(&Value::String("Yes".into())), Some(true));
        assert_eq!(to_bool(&Value::String("off".into())), Some(false));
        assert_eq!(to_bool(&Value::Integer(1)), Some(true));
        assert_eq!(to_bool(&Value::Integer(7)), None);
        assert_eq!(to_bool(&Value::String("maybe".into())), None);
    }

    #[test]
    fn counts_clamp_and_truncate() {
        assert_eq!(to_count(&Value::Integer(4)), Some(4));
        assert_eq!(to_count(&Value::Integer(-3)), Some(1));
        assert_eq!(to_count(&Value::Float(2.9)), Some(2));
        assert_eq!(to_count(&Value::String(" 6 ".into())), Some(6));
        assert_eq!(to_count(&Value::String("six".into())), None);
        assert_eq!(to_count(&Value::Boolean(true)), None);
    }

    #[test]
    fn seconds_reject_nan_and_clamp_negative() {
        assert_eq!(to_seconds(&Value::Float(0.25)), Some(0.25));
        assert_eq!(to_seconds(&Value::Integer(-2)), Some(0.0));
        assert_eq!(to_seconds(&Value::String("nan".into())), None);
        assert_eq!(to_seconds(&Value::Float(f64::INFINITY)), None);
    }
}
