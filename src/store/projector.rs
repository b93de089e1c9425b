//! Store → structured projection for the `/data` endpoint.
//!
//! Parsing is tolerant: the first line is always skipped as the header,
//! each remaining line is split on at most six commas (the last field
//! keeps the rest of the line), and a short or malformed line yields a
//! partially populated record instead of an error.  Output is produced by
//! `serde_json`, so string fields are always correctly escaped.
//!
//! Pure function of its input: projecting the same content twice gives
//! identical output.

use serde::Serialize;

use super::FIELD_COUNT;

/// One data line in structured form.  Fields that were absent or did
/// not parse are `None` and omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_f: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_detected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_point: Option<u64>,
    /// Number of comma-separated fields found on the line (1..=7).
    #[serde(skip)]
    pub fields_present: usize,
}

impl ProjectedRecord {
    pub fn is_complete(&self) -> bool {
        self.fields_present == FIELD_COUNT
    }
}

#[derive(Serialize)]
struct DataEnvelope<'a> {
    data: &'a [ProjectedRecord],
}

/// Project every data line of `raw` (header skipped, blank lines ignored).
pub fn project_all(raw: &str) -> Vec<ProjectedRecord> {
    raw.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(project_line)
        .collect()
}

/// Project a single data line.
pub fn project_line(line: &str) -> ProjectedRecord {
    let mut rec = ProjectedRecord::default();
    for (idx, field) in line.splitn(FIELD_COUNT, ',').enumerate() {
        rec.fields_present = idx + 1;
        let value = field.trim();
        match idx {
            0 => rec.timestamp = value.parse().ok(),
            1 => rec.datetime = Some(field.to_owned()),
            2 => rec.temperature_c = parse_number(value),
            3 => rec.temperature_f = parse_number(value),
            4 => rec.humidity = parse_number(value),
            5 => rec.motion_detected = parse_bool(value),
            _ => rec.data_point = value.parse().ok(),
        }
    }
    rec
}

/// `{"data":[...]}` for the whole store content.
pub fn to_json(raw: &str) -> Result<String, serde_json::Error> {
    let records = project_all(raw);
    serde_json::to_string(&DataEnvelope { data: &records })
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HEADER;

    fn store_text(lines: &[&str]) -> String {
        let mut s = format!("{HEADER}\n");
        for l in lines {
            s.push_str(l);
            s.push('\n');
        }
        s
    }

    #[test]
    fn header_only_projects_to_empty() {
        assert!(project_all(&store_text(&[])).is_empty());
        assert_eq!(to_json(&store_text(&[])).unwrap(), r#"{"data":[]}"#);
    }

    #[test]
    fn full_line_is_typed() {
        let raw = store_text(&["1754913600,2025-08-11 12:00:00,23.50,74.30,41.20,false,42"]);
        let recs = project_all(&raw);
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert!(r.is_complete());
        assert_eq!(r.timestamp, Some(1_754_913_600));
        assert_eq!(r.datetime.as_deref(), Some("2025-08-11 12:00:00"));
        assert_eq!(r.temperature_c, Some(23.5));
        assert_eq!(r.temperature_f, Some(74.3));
        assert_eq!(r.humidity, Some(41.2));
        assert_eq!(r.motion_detected, Some(false));
        assert_eq!(r.data_point, Some(42));
    }

    #[test]
    fn json_shape_matches_endpoint_contract() {
        let raw = store_text(&["1754913600,2025-08-11 12:00:00,23.50,74.30,41.20,true,1"]);
        assert_eq!(
            to_json(&raw).unwrap(),
            r#"{"data":[{"timestamp":1754913600,"datetime":"2025-08-11 12:00:00","temperature_c":23.5,"temperature_f":74.3,"humidity":41.2,"motion_detected":true,"data_point":1}]}"#
        );
    }

    #[test]
    fn first_line_is_skipped_even_if_not_the_header() {
        let raw = "1,a,1,1,1,true,1\n2,b,2,2,2,false,2\n";
        let recs = project_all(raw);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].data_point, Some(2));
    }

    #[test]
    fn short_line_is_partial_not_an_error() {
        let recs = project_all(&store_text(&["1754913600,2025-08-11 12:00:00,23.50"]));
        let r = &recs[0];
        assert_eq!(r.fields_present, 3);
        assert!(!r.is_complete());
        assert_eq!(r.temperature_c, Some(23.5));
        assert_eq!(r.humidity, None);
        assert_eq!(
            to_json(&store_text(&["1754913600,2025-08-11 12:00:00,23.50"])).unwrap(),
            r#"{"data":[{"timestamp":1754913600,"datetime":"2025-08-11 12:00:00","temperature_c":23.5}]}"#
        );
    }

    #[test]
    fn trailing_field_takes_rest_of_line() {
        let recs = project_all(&store_text(&["1,d,1,1,1,true,7,extra,stuff"]));
        assert_eq!(recs[0].fields_present, 7);
        assert_eq!(recs[0].data_point, None, "'7,extra,stuff' is not an integer");
    }

    #[test]
    fn quotes_in_fields_are_escaped() {
        let raw = store_text(&[r#"1,say "hi"\now,1,1,1,false,1"#]);
        let json = to_json(&raw).unwrap();
        assert!(json.contains(r#""datetime":"say \"hi\"\\now""#));
        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["data"][0]["datetime"], r#"say "hi"\now"#);
    }

    #[test]
    fn non_numeric_values_are_dropped() {
        let r = project_line("abc,d,NaN,inf,x,maybe,-3");
        assert_eq!(r.timestamp, None);
        assert_eq!(r.temperature_c, None);
        assert_eq!(r.temperature_f, None);
        assert_eq!(r.humidity, None);
        assert_eq!(r.motion_detected, None);
        assert_eq!(r.data_point, None);
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let raw = format!("{HEADER}\r\n1,d,1.00,33.80,1.00,false,1\r\n\r\n");
        let recs = project_all(&raw);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].data_point, Some(1));
    }

    #[test]
    fn projection_is_idempotent() {
        let raw = store_text(&[
            "1,2025-01-01 00:00:00,1.00,33.80,10.00,false,1",
            "2,2025-01-01 00:00:10,2.00,35.60,20.00,true,2",
        ]);
        assert_eq!(project_all(&raw), project_all(&raw));
        assert_eq!(to_json(&raw).unwrap(), to_json(&raw).unwrap());
    }
}
