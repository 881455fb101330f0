//! Test data fixtures shaped like `/api/machine-data` responses.
//!
//! The backend returns rows newest first.

/// Three G19 readings in January 2024 plus one older row outside most ranges
pub fn g19_january_json() -> &'static str {
    r#"[
  {"id": 4, "Timestamp": "2024-01-15T12:00:00", "G19": 30.0, "G26": 3.0},
  {"id": 3, "Timestamp": "2024-01-15T11:00:00", "G19": 20.0, "G26": null},
  {"id": 2, "Timestamp": "2024-01-15T10:00:00", "G19": "10", "G26": 1.0},
  {"id": 1, "Timestamp": "2023-06-01T10:00:00", "G19": 999.0}
]"#
}

/// Same readings with the HTTP dates Flask's `jsonify` writes
pub fn g19_january_http_dates_json() -> &'static str {
    r#"[
  {"id": 4, "Timestamp": "Mon, 15 Jan 2024 12:00:00 GMT", "G19": 30.0},
  {"id": 3, "Timestamp": "Mon, 15 Jan 2024 11:00:00 GMT", "G19": 20.0},
  {"id": 2, "Timestamp": "Mon, 15 Jan 2024 10:00:00 GMT", "G19": 10.0}
]"#
}

/// Rows with broken timestamps and non-numeric readings
pub fn messy_rows_json() -> &'static str {
    r#"[
  {"id": 1, "Timestamp": "2024-01-15 10:00:00", "G19": 1.5, "status": "ok"},
  {"id": 2, "Timestamp": "yesterday", "G19": 2.0},
  {"id": 3, "G19": 3.0},
  {"id": 4, "Timestamp": "2024-01-15T12:00:00Z", "G19": "n/a", "G26": true}
]"#
}

/// Mondays of three consecutive ISO weeks, two readings in the first
pub fn mondays_jsonl() -> &'static str {
    r#"{"id": 1, "Timestamp": "2024-01-01T08:00:00", "G19": 1.0}
{"id": 2, "Timestamp": "2024-01-01T18:00:00", "G19": 2.0}
{"id": 3, "Timestamp": "2024-01-08T09:00:00", "G19": 3.0}

{"id": 4, "Timestamp": "2024-01-15T09:00:00", "G19": 4.0}
{"id": 5, "Timestamp": "2024-01-16T09:00:00", "G19": 99.0}"#
}

/// `/api/historical-anomalies` response for G19
pub fn historical_anomalies_json() -> &'static str {
    r#"{
  "summary": {"anomalies_found": true, "machines_count": 7, "machines_processed": 7, "timestamp": "2024-01-20T12:00:00"},
  "G19": {
    "anomalies": [
      {"Timestamp": "Sun, 14 Jan 2024 08:00:00 GMT", "score": -1.8, "G19": 412.5},
      {"Timestamp": "2024-01-15T09:00:00", "score": -1.2, "G19": 380.0},
      {"Timestamp": "2024-01-15T10:00:00", "score": -0.8, "G19": 15.0}
    ],
    "anomalies_count": 3,
    "mean_score": -1.27,
    "status": "success",
    "total_points": 240
  },
  "G26": {"anomalies": [], "anomalies_count": 0, "mean_score": 0.0, "status": "success", "total_points": 240}
}"#
}
