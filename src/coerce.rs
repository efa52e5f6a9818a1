//! Loose numeric coercion for client-supplied parameters.
//!
//! Browser clients send tuning fields like `maxTokens` or `speakingRate` as
//! JSON numbers or as strings, depending on how the form was wired up. A value
//! that fails to parse falls back to the handler's default rather than failing
//! the request.
use serde_json::Value;

/// Fractional values truncate toward zero; negative, non-finite, or
/// out-of-range values fall back to the default.
pub fn coerce_u32(value: Option<&Value>, default: u32) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed.map(f64::trunc) {
        Some(f) if f.is_finite() && (0.0..=u32::MAX as f64).contains(&f) => f as u32,
        _ => default,
    }
}

pub fn coerce_f64(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Some(json!(250)), 250)]
    #[case(Some(json!("250")), 250)]
    #[case(Some(json!(" 250 ")), 250)]
    #[case(Some(json!(403.7)), 403)]
    #[case(Some(json!("403.7")), 403)]
    #[case(Some(json!("abc")), 400)]
    #[case(Some(json!(-3)), 400)]
    #[case(Some(json!(-0.7)), 0)]
    #[case(Some(json!(null)), 400)]
    #[case(None, 400)]
    fn test_coerce_u32(#[case] value: Option<Value>, #[case] expected: u32) {
        assert_eq!(coerce_u32(value.as_ref(), 400), expected);
    }

    #[rstest]
    #[case(Some(json!(0.5)), 0.5)]
    #[case(Some(json!("0.5")), 0.5)]
    #[case(Some(json!(2)), 2.0)]
    #[case(Some(json!("fast")), 0.85)]
    #[case(Some(json!({})), 0.85)]
    #[case(None, 0.85)]
    fn test_coerce_f64(#[case] value: Option<Value>, #[case] expected: f64) {
        assert_eq!(coerce_f64(value.as_ref(), 0.85), expected);
    }
}
