//! CSV読み込み
//!
//! ヘッダ行から列位置を決め、1行ずつ GeoRecord に変換する。
//! 住所列をIDとラベルの両方に使う。

use crate::config::CsvColumns;
use crate::error::{GeoEvalError, Result};
use geo_eval_common::{parse_coordinate_str, record_from_fields, ParsedRecords};

pub fn parse_csv(text: &str, columns: &CsvColumns) -> Result<ParsedRecords> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let id_idx = column_index(&headers, &columns.id)?;
    let lat_idx = column_index(&headers, &columns.latitude)?;
    let lon_idx = column_index(&headers, &columns.longitude)?;

    let mut parsed = ParsedRecords::default();

    for row in reader.records() {
        let row = match row {
            Ok(r) => r,
            Err(_) => {
                parsed.skipped += 1;
                continue;
            }
        };

        // 区切り文字だけの行は空行扱い
        if row.iter().all(|field| field.is_empty()) {
            continue;
        }

        let id = row.get(id_idx).unwrap_or_default();
        let latitude = row.get(lat_idx).and_then(parse_coordinate_str);
        let longitude = row.get(lon_idx).and_then(parse_coordinate_str);

        let record = match (latitude, longitude) {
            (Some(lat), Some(lon)) => record_from_fields(id, lat, lon, id, None),
            _ => None,
        };

        match record {
            Some(r) => parsed.records.push(r),
            None => parsed.skipped += 1,
        }
    }

    Ok(parsed)
}

/// 列名から列位置を探す（完全一致 → 大文字小文字無視）
fn column_index(headers: &::csv::StringRecord, name: &str) -> Result<usize> {
    let normalized: Vec<&str> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect();

    normalized
        .iter()
        .position(|h| *h == name)
        .or_else(|| normalized.iter().position(|h| h.eq_ignore_ascii_case(name)))
        .ok_or_else(|| GeoEvalError::MissingColumn(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_basic() {
        let text = "Address,Latitude,Longitude\n\
                    \"1600 Pennsylvania Ave NW, Washington, DC\",38.8977,-77.0365\n\
                    10 Downing St,51.5034,-0.1276\n";
        let parsed = parse_csv(text, &CsvColumns::default()).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.records[0].id, "1600 Pennsylvania Ave NW, Washington, DC");
        assert_eq!(parsed.records[0].label, parsed.records[0].id);
        assert_eq!(parsed.records[1].longitude, -0.1276);
    }

    #[test]
    fn test_parse_csv_skips_bad_rows() {
        let text = "Address,Latitude,Longitude,Extra\n\
                    A,1.0,2.0,x\n\
                    B,not a number,2.0,x\n\
                    ,3.0,4.0,x\n\
                    ,,,\n\
                    C,5.0,6.0\n";
        let parsed = parse_csv(text, &CsvColumns::default()).unwrap();

        let ids: Vec<&str> = parsed.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(parsed.skipped, 2);
    }

    #[test]
    fn test_parse_csv_column_order_and_case() {
        let text = "\u{feff}longitude, LATITUDE ,address\n139.7671,35.6812,Tokyo Station\n";
        let parsed = parse_csv(text, &CsvColumns::default()).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.records[0].latitude, 35.6812);
        assert_eq!(parsed.records[0].longitude, 139.7671);
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let text = "Address,Lat,Lon\nA,1,2\n";
        let err = parse_csv(text, &CsvColumns::default()).unwrap_err();
        assert!(matches!(err, GeoEvalError::MissingColumn(ref c) if c == "Latitude"));
    }

    #[test]
    fn test_parse_csv_custom_columns() {
        let columns = CsvColumns {
            id: "name".into(),
            latitude: "y".into(),
            longitude: "x".into(),
        };
        let parsed = parse_csv("name,x,y\nP,2,1\n", &columns).unwrap();
        assert_eq!(parsed.records[0].latitude, 1.0);
        assert_eq!(parsed.records[0].longitude, 2.0);
    }
}
