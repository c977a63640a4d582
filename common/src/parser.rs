//! 入力レコードパーサー
//!
//! CSV/JSONLの1行分の値から GeoRecord を組み立てる。
//! 不正な行はエラーにせず読み飛ばす（件数のみ数える）。

use crate::types::{GeoRecord, ParsedRecords};
use serde_json::{Map, Value};

const NUMERIC_PREFIX_CHARS: &str = "+-0123456789.eE";

/// 文字列を座標値としてパース
///
/// 先頭の空白を無視し、数値として解釈できる最長の先頭部分を読む
/// （`"12.5abc"` → 12.5）。NaN・無限大・数値なしは `None`。
///
/// # Examples
/// ```
/// use geo_eval_common::parse_coordinate_str;
///
/// assert_eq!(parse_coordinate_str(" 35.68"), Some(35.68));
/// assert_eq!(parse_coordinate_str("12.5abc"), Some(12.5));
/// assert_eq!(parse_coordinate_str("NaN"), None);
/// ```
pub fn parse_coordinate_str(raw: &str) -> Option<f64> {
    let text = raw.trim_start();

    if let Ok(v) = text.trim_end().parse::<f64>() {
        return Some(v).filter(|v| v.is_finite());
    }

    let prefix_len = text
        .find(|c: char| !NUMERIC_PREFIX_CHARS.contains(c))
        .unwrap_or(text.len());

    (1..=prefix_len)
        .rev()
        .find_map(|end| text[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// JSON値を座標値としてパース
///
/// 数値はそのまま、文字列は [`parse_coordinate_str`] と同じ規則で読む
pub fn parse_coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_coordinate_str(s),
        _ => None,
    }
}

/// 各フィールドから GeoRecord を作成
///
/// IDが空、または座標が有限値でない場合は `None`
pub fn record_from_fields(
    id: &str,
    latitude: f64,
    longitude: f64,
    label: &str,
    notes: Option<&str>,
) -> Option<GeoRecord> {
    let id = id.trim();
    if id.is_empty() || !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }

    let notes = notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Some(GeoRecord {
        id: id.to_string(),
        latitude,
        longitude,
        label: label.trim().to_string(),
        notes,
    })
}

/// JSONL 1行をパース
///
/// 必須キー: `id`（文字列または数値）, `lat`, `lon`
/// 任意キー: `city`, `country`, `notes`
pub fn parse_jsonl_line(line: &str) -> Option<GeoRecord> {
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    let obj = value.as_object()?;

    let id = id_value(obj.get("id")?)?;
    let latitude = parse_coordinate(obj.get("lat")?)?;
    let longitude = parse_coordinate(obj.get("lon")?)?;

    let label = [text_field(obj, "city"), text_field(obj, "country")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

    record_from_fields(&id, latitude, longitude, &label, text_field(obj, "notes"))
}

/// JSONLテキスト全体をパース
///
/// 空行は無視し、パースできない行は `skipped` に数える
pub fn parse_jsonl(text: &str) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match parse_jsonl_line(line) {
            Some(record) => parsed.records.push(record),
            None => parsed.skipped += 1,
        }
    }

    parsed
}

fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =============================================
    // parse_coordinate テスト
    // =============================================

    #[test]
    fn test_parse_coordinate_str_plain() {
        assert_eq!(parse_coordinate_str("35.6812"), Some(35.6812));
        assert_eq!(parse_coordinate_str("-122.4194"), Some(-122.4194));
        assert_eq!(parse_coordinate_str("  10  "), Some(10.0));
        assert_eq!(parse_coordinate_str("1e2"), Some(100.0));
    }

    #[test]
    fn test_parse_coordinate_str_numeric_prefix() {
        assert_eq!(parse_coordinate_str("12.5abc"), Some(12.5));
        assert_eq!(parse_coordinate_str("40.7° N"), Some(40.7));
        assert_eq!(parse_coordinate_str("1e"), Some(1.0));
    }

    #[test]
    fn test_parse_coordinate_str_invalid() {
        assert_eq!(parse_coordinate_str(""), None);
        assert_eq!(parse_coordinate_str("   "), None);
        assert_eq!(parse_coordinate_str("NaN"), None);
        assert_eq!(parse_coordinate_str("Infinity"), None);
        assert_eq!(parse_coordinate_str("unknown"), None);
        assert_eq!(parse_coordinate_str("-"), None);
        assert_eq!(parse_coordinate_str("1e999"), None);
    }

    #[test]
    fn test_parse_coordinate_json() {
        assert_eq!(parse_coordinate(&json!(10)), Some(10.0));
        assert_eq!(parse_coordinate(&json!(-3.5)), Some(-3.5));
        assert_eq!(parse_coordinate(&json!("20.25")), Some(20.25));
        assert_eq!(parse_coordinate(&json!("NaN")), None);
        assert_eq!(parse_coordinate(&json!(null)), None);
        assert_eq!(parse_coordinate(&json!(true)), None);
    }

    // =============================================
    // record_from_fields テスト
    // =============================================

    #[test]
    fn test_record_from_fields() {
        let record = record_from_fields(" 7 ", 1.0, 2.0, " Paris, France ", Some("  ")).unwrap();
        assert_eq!(record.id, "7");
        assert_eq!(record.label, "Paris, France");
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_record_from_fields_rejects_missing_id() {
        assert!(record_from_fields("", 1.0, 2.0, "", None).is_none());
        assert!(record_from_fields("   ", 1.0, 2.0, "", None).is_none());
    }

    #[test]
    fn test_record_from_fields_rejects_non_finite() {
        assert!(record_from_fields("1", f64::NAN, 2.0, "", None).is_none());
        assert!(record_from_fields("1", 1.0, f64::NEG_INFINITY, "", None).is_none());
    }

    // =============================================
    // JSONL テスト
    // =============================================

    #[test]
    fn test_parse_jsonl_line_full() {
        let line = r#"{"id": "12", "lat": 48.8566, "lon": 2.3522, "city": "Paris", "country": "France", "notes": "Eiffel tower visible"}"#;
        let record = parse_jsonl_line(line).unwrap();

        assert_eq!(record.id, "12");
        assert_eq!(record.latitude, 48.8566);
        assert_eq!(record.longitude, 2.3522);
        assert_eq!(record.label, "Paris, France");
        assert_eq!(record.notes.as_deref(), Some("Eiffel tower visible"));
    }

    #[test]
    fn test_parse_jsonl_line_numeric_id_and_string_coordinates() {
        let line = r#"{"id": 3, "lat": "10.5", "lon": "-20", "city": "", "country": "Chile"}"#;
        let record = parse_jsonl_line(line).unwrap();

        assert_eq!(record.id, "3");
        assert_eq!(record.latitude, 10.5);
        assert_eq!(record.longitude, -20.0);
        assert_eq!(record.label, "Chile");
    }

    #[test]
    fn test_parse_jsonl_line_nan_is_dropped() {
        let line = r#"{"id": "3", "lat": "NaN", "lon": 5}"#;
        assert!(parse_jsonl_line(line).is_none());
    }

    #[test]
    fn test_parse_jsonl_line_missing_keys() {
        assert!(parse_jsonl_line(r#"{"lat": 1, "lon": 2}"#).is_none());
        assert!(parse_jsonl_line(r#"{"id": "1", "lon": 2}"#).is_none());
        assert!(parse_jsonl_line(r#"{"id": null, "lat": 1, "lon": 2}"#).is_none());
        assert!(parse_jsonl_line("[1, 2]").is_none());
        assert!(parse_jsonl_line("not json").is_none());
    }

    #[test]
    fn test_parse_jsonl_counts_skipped() {
        let text = r#"{"id": "1", "lat": 10, "lon": 20, "city": "A", "country": "B"}

{"id": "2", "lat": "oops", "lon": 20}
{broken
{"id": "3", "lat": 0, "lon": 0}
"#;
        let parsed = parse_jsonl(text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.records[0].id, "1");
        assert_eq!(parsed.records[1].id, "3");
    }
}
