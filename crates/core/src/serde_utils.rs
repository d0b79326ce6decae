//! Lenient decoders for upstream pair payloads.
//!
//! The upstream store mixes absent fields, `null`, numeric strings and
//! comma-joined lists. Everything here maps "can't tell" to `None` instead of
//! failing the whole record, so a single odd column never drops a pair.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};
use serde_json::Value;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse an RFC 3339 or `YYYY-MM-DD HH:MM:SS` timestamp (naive values are UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

/// Required timestamp field: RFC 3339 string, naive string, or unix seconds.
pub mod timestamp {
    use super::*;

    pub fn serialize<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(d)?;
        timestamp_from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {value}")))
    }
}

/// Optional timestamp; unparseable values decode as unknown.
pub fn opt_timestamp<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(timestamp_from_value))
}

/// Number or numeric string, a trailing `%` is tolerated. `NaN` and
/// infinities are unknown.
pub fn opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|f| f.is_finite()))
}

pub fn opt_u64<'de, D>(d: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// `true`/`false`, `0`/`1` (sqlite booleans) or their string forms.
pub fn opt_bool<'de, D>(d: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_i64().map(|i| i != 0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Big integers arrive either quoted or as plain JSON numbers.
pub fn opt_string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// JSON array or comma-separated string; blanks are skipped.
pub fn string_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    let items: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-03-01T12:30:00Z").unwrap();
        let naive = parse_timestamp("2024-03-01 12:30:00").unwrap();
        assert_eq!(rfc, naive);
        assert_eq!(naive.hour(), 12);

        let offset = parse_timestamp("2024-03-01T14:30:00+02:00").unwrap();
        assert_eq!(offset, rfc);

        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_unix_seconds_timestamp() {
        let dt = timestamp_from_value(&serde_json::json!(1_700_000_000)).unwrap();
        assert_eq!(dt.year(), 2023);
    }

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "opt_f64")]
        tax: Option<f64>,
        #[serde(default, deserialize_with = "opt_u64")]
        holders: Option<u64>,
        #[serde(default, deserialize_with = "opt_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "string_list")]
        risks: Vec<String>,
    }

    #[test]
    fn test_absent_and_null_are_unknown() {
        let p: Sample = serde_json::from_str(r#"{"tax": null}"#).unwrap();
        assert!(p.tax.is_none());
        assert!(p.holders.is_none());
        assert!(p.flag.is_none());
        assert!(p.risks.is_empty());
    }

    #[test]
    fn test_zero_is_known() {
        let p: Sample = serde_json::from_str(r#"{"tax": 0, "holders": 0, "flag": false}"#).unwrap();
        assert_eq!(p.tax, Some(0.0));
        assert_eq!(p.holders, Some(0));
        assert_eq!(p.flag, Some(false));
    }

    #[test]
    fn test_lenient_scalars() {
        let p: Sample =
            serde_json::from_str(r#"{"tax": "12.5%", "holders": "42", "flag": 1}"#).unwrap();
        assert_eq!(p.tax, Some(12.5));
        assert_eq!(p.holders, Some(42));
        assert_eq!(p.flag, Some(true));
    }

    #[test]
    fn test_non_finite_tax_is_unknown() {
        for raw in ["NaN", "inf", "-infinity", "Infinity%"] {
            let p: Sample = serde_json::from_str(&format!(r#"{{"tax": "{raw}"}}"#)).unwrap();
            assert!(p.tax.is_none(), "{raw}");
        }
    }

    #[test]
    fn test_comma_separated_list() {
        let p: Sample = serde_json::from_str(r#"{"risks": "mint enabled, , blacklist"}"#).unwrap();
        assert_eq!(p.risks, vec!["mint enabled", "blacklist"]);

        let p: Sample = serde_json::from_str(r#"{"risks": ["a", " b "]}"#).unwrap();
        assert_eq!(p.risks, vec!["a", "b"]);
    }
}
