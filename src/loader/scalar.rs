//! Scalar resolution: YAML core schema plus configurable numeric patterns

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use tracing::warn;

static NULL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:~|null|Null|NULL|)$").unwrap());
static BOOL_TRUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:true|True|TRUE)$").unwrap());
static BOOL_FALSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:false|False|FALSE)$").unwrap());
static INT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-+]?[0-9][0-9_]*|0o[0-7_]+|0x[0-9a-fA-F_]+)$").unwrap()
});
static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)(?:[eE][-+]?[0-9]+)?|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
    )
    .unwrap()
});

/// Numeric forms recognized on top of the core schema: exponents without a
/// decimal point, decimals without a leading digit, underscores as digit
/// separators and sexagesimal values with a fractional part.
pub const DEFAULT_NUMERIC_PATTERN: &str = r"(?x)^(?:
     [-+]?(?:[0-9][0-9_]*)\.[0-9_]*(?:[eE][-+]?[0-9]+)?
    |[-+]?(?:[0-9][0-9_]*)(?:[eE][-+]?[0-9]+)
    |\.[0-9_]+(?:[eE][-+][0-9]+)?
    |[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*
    |[-+]?\.(?:inf|Inf|INF)
    |\.(?:nan|NaN|NAN))$";

const TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Resolve an untagged plain scalar
pub fn resolve_plain(text: &str, extra_numeric: &[Regex]) -> Value {
    if NULL.is_match(text) {
        return Value::Null;
    }
    if BOOL_TRUE.is_match(text) {
        return Value::Bool(true);
    }
    if BOOL_FALSE.is_match(text) {
        return Value::Bool(false);
    }
    if INT.is_match(text)
        && let Some(value) = parse_int(text)
    {
        return value;
    }
    if (FLOAT.is_match(text) || extra_numeric.iter().any(|re| re.is_match(text)))
        && let Some(f) = parse_float(text)
    {
        return number_value(f);
    }
    Value::String(text.to_string())
}

/// Resolve a scalar carrying an explicit tag
///
/// Standard `!!` tags are enforced; any other tag is ignored and the scalar
/// resolves as if it were untagged.
pub fn resolve_tagged(
    tag: &str,
    text: &str,
    plain: bool,
    extra_numeric: &[Regex],
) -> Result<Value, String> {
    let Some(kind) = tag.strip_prefix(TAG_PREFIX) else {
        if tag == "!" {
            return Ok(Value::String(text.to_string()));
        }
        return Ok(resolve_untagged(text, plain, extra_numeric));
    };

    match kind {
        "str" => Ok(Value::String(text.to_string())),
        "null" => {
            if NULL.is_match(text) {
                Ok(Value::Null)
            } else {
                Err(format!("'{text}' is not a valid !!null"))
            }
        }
        "bool" => {
            if BOOL_TRUE.is_match(text) {
                Ok(Value::Bool(true))
            } else if BOOL_FALSE.is_match(text) {
                Ok(Value::Bool(false))
            } else {
                Err(format!("'{text}' is not a valid !!bool"))
            }
        }
        "int" => parse_int(text).ok_or_else(|| format!("'{text}' is not a valid !!int")),
        "float" => parse_float(text)
            .map(number_value)
            .ok_or_else(|| format!("'{text}' is not a valid !!float")),
        _ => Ok(resolve_untagged(text, plain, extra_numeric)),
    }
}

fn resolve_untagged(text: &str, plain: bool, extra_numeric: &[Regex]) -> Value {
    if plain {
        resolve_plain(text, extra_numeric)
    } else {
        Value::String(text.to_string())
    }
}

fn parse_int(text: &str) -> Option<Value> {
    let cleaned = text.replace('_', "");
    if let Some(oct) = cleaned.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok().map(Value::from);
    }
    if let Some(hex) = cleaned.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(Value::from);
    }
    if let Ok(i) = cleaned.parse::<i64>() {
        return Some(Value::from(i));
    }
    if let Ok(u) = cleaned.parse::<u64>() {
        return Some(Value::from(u));
    }
    cleaned.parse::<f64>().ok().map(number_value)
}

/// Parse any numeric spelling accepted by the resolver into an `f64`
pub fn parse_float(text: &str) -> Option<f64> {
    let cleaned = text.replace('_', "");
    let (sign, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    match body {
        ".inf" | ".Inf" | ".INF" => return Some(sign * f64::INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }

    if body.contains(':') {
        let mut total = 0.0;
        for part in body.split(':') {
            total = total * 60.0 + part.parse::<f64>().ok()?;
        }
        return Some(sign * total);
    }

    if body.is_empty() || body == "." {
        return None;
    }
    body.parse::<f64>().ok().map(|f| sign * f)
}

/// Convert a float into a JSON number
///
/// JSON cannot carry non-finite numbers: infinities saturate to the largest
/// finite `f64` of the same sign and NaN becomes `null`.
pub fn number_value(f: f64) -> Value {
    if let Some(n) = Number::from_f64(f) {
        return Value::Number(n);
    }
    if f.is_nan() {
        warn!("NaN is not representable in a document tree, storing null");
        return Value::Null;
    }
    let saturated = if f.is_sign_negative() { f64::MIN } else { f64::MAX };
    warn!("Infinite value saturated to {saturated:e}");
    Number::from_f64(saturated)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extra() -> Vec<Regex> {
        vec![Regex::new(DEFAULT_NUMERIC_PATTERN).unwrap()]
    }

    #[test]
    fn test_scientific_notation_is_numeric() {
        let extra = extra();
        assert_eq!(resolve_plain("1e-3", &extra), json!(0.001));
        assert_eq!(resolve_plain("1e-5", &extra), json!(1e-5));
        assert_eq!(resolve_plain("+.5E10", &extra), json!(5e9));
        assert_eq!(resolve_plain("2E+3", &extra), json!(2000.0));
    }

    #[test]
    fn test_decimal_forms() {
        let extra = extra();
        assert_eq!(resolve_plain(".5", &extra), json!(0.5));
        assert_eq!(resolve_plain("3.", &extra), json!(3.0));
        assert_eq!(resolve_plain("1_000.5", &extra), json!(1000.5));
        assert_eq!(resolve_plain("-2.25", &extra), json!(-2.25));
    }

    #[test]
    fn test_sexagesimal_with_fraction() {
        let extra = extra();
        assert_eq!(resolve_plain("1:30.5", &extra), json!(90.5));
        assert_eq!(resolve_plain("-1:00:00.0", &extra), json!(-3600.0));
        // Without the extra pattern it is just text
        assert_eq!(resolve_plain("1:30.5", &[]), json!("1:30.5"));
    }

    #[test]
    fn test_special_floats() {
        let extra = extra();
        assert_eq!(resolve_plain(".inf", &extra), json!(f64::MAX));
        assert_eq!(resolve_plain("-.Inf", &extra), json!(f64::MIN));
        assert_eq!(resolve_plain(".nan", &extra), Value::Null);
    }

    #[test]
    fn test_core_schema() {
        let extra = extra();
        assert_eq!(resolve_plain("", &extra), Value::Null);
        assert_eq!(resolve_plain("~", &extra), Value::Null);
        assert_eq!(resolve_plain("True", &extra), json!(true));
        assert_eq!(resolve_plain("42", &extra), json!(42));
        assert_eq!(resolve_plain("0x1F", &extra), json!(31));
        assert_eq!(resolve_plain("0o17", &extra), json!(15));
        assert_eq!(resolve_plain("1_000", &extra), json!(1000));
        assert_eq!(resolve_plain("-2_500_000", &extra), json!(-2500000));
        assert_eq!(resolve_plain("1_000.5", &extra), json!(1000.5));
        assert_eq!(resolve_plain("yes", &extra), json!("yes"));
        assert_eq!(resolve_plain("no", &extra), json!("no"));
        assert_eq!(resolve_plain("Off", &extra), json!("Off"));
        assert_eq!(resolve_plain("1.2.3", &extra), json!("1.2.3"));
        assert_eq!(resolve_plain("e5", &extra), json!("e5"));
    }

    #[test]
    fn test_explicit_tags() {
        let extra = extra();
        assert_eq!(
            resolve_tagged("tag:yaml.org,2002:str", "1e-3", true, &extra),
            Ok(json!("1e-3"))
        );
        assert_eq!(
            resolve_tagged("tag:yaml.org,2002:float", "3", true, &extra),
            Ok(json!(3.0))
        );
        assert!(resolve_tagged("tag:yaml.org,2002:int", "abc", true, &extra).is_err());
        assert_eq!(
            resolve_tagged("!custom", "7", true, &extra),
            Ok(json!(7))
        );
        assert_eq!(resolve_tagged("!custom", "7", false, &extra), Ok(json!("7")));
    }
}
