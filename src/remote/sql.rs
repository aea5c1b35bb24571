//! rqlite execute payloads and response validation.

use crate::core::hourly::HourlyRow;
use crate::remote::RemoteError;
use chrono::SecondsFormat;
use serde::Deserialize;

/// Escape a value for embedding in a double-quoted SQL string.
pub fn escape_sql_string(s: &str) -> String {
    s.replace('"', "\"\"")
}

/// The single statement that upserts one hourly row.
pub fn upsert_statement(row: &HourlyRow) -> String {
    let hour = escape_sql_string(&row.hour_label());
    let status = escape_sql_string(row.status.as_str());
    let created = escape_sql_string(&row.created_at.to_rfc3339_opts(SecondsFormat::Secs, true));

    format!(
        "INSERT OR REPLACE INTO activity_hourly(hour_start, activity_pct, idle_seconds, samples, status, created_at) \
         VALUES (\"{hour}\", {:.4}, {:.0}, {}, \"{status}\", \"{created}\");",
        row.activity_pct, row.idle_seconds, row.samples
    )
}

/// Body of an rqlite `/db/execute` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub results: Vec<StatementResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Outcome of one statement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatementResult {
    #[serde(default)]
    pub last_insert_id: Option<i64>,
    #[serde(default)]
    pub rows_affected: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Decide whether an execute call succeeded from its status and raw body.
pub fn check_execute_response(status: u16, body: &str) -> Result<ExecuteResponse, RemoteError> {
    if !(200..300).contains(&status) {
        return Err(RemoteError::Server {
            status,
            message: body.to_string(),
        });
    }

    let parsed: ExecuteResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::Serialization(format!("{e}; body={body}")))?;

    if let Some(error) = parsed.error.as_deref().filter(|e| !e.is_empty()) {
        return Err(RemoteError::Rejected(error.to_string()));
    }

    for (index, result) in parsed.results.iter().enumerate() {
        if let Some(message) = result.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(RemoteError::Statement {
                index,
                message: message.to_string(),
            });
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hourly::HourlyStatus;
    use chrono::{TimeZone, Utc};

    fn row() -> HourlyRow {
        HourlyRow {
            hour_start: Utc.with_ymd_and_hms(2026, 2, 7, 8, 0, 0).unwrap(),
            activity_pct: 44.444_444,
            idle_seconds: 2000.0,
            samples: 3600,
            status: HourlyStatus::Low,
            created_at: Utc.with_ymd_and_hms(2026, 2, 7, 9, 0, 1).unwrap(),
        }
    }

    #[test]
    fn test_escape_doubles_quotes() {
        assert_eq!(escape_sql_string(r#"a"b"#), r#"a""b"#);
        assert_eq!(escape_sql_string("plain"), "plain");
    }

    #[test]
    fn test_upsert_statement_shape() {
        let stmt = upsert_statement(&row());
        assert_eq!(
            stmt,
            "INSERT OR REPLACE INTO activity_hourly(hour_start, activity_pct, idle_seconds, samples, status, created_at) \
             VALUES (\"2026-02-07T08:00:00Z\", 44.4444, 2000, 3600, \"LOW\", \"2026-02-07T09:00:01Z\");"
        );
    }

    #[test]
    fn test_success_response() {
        let body = r#"{"results":[{"last_insert_id":1,"rows_affected":1}],"time":0.001}"#;
        let parsed = check_execute_response(200, body).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].rows_affected, Some(1));
    }

    #[test]
    fn test_non_2xx_fails() {
        let err = check_execute_response(503, "leader not found").unwrap_err();
        assert!(matches!(err, RemoteError::Server { status: 503, .. }));
    }

    #[test]
    fn test_top_level_error_fails() {
        let err = check_execute_response(200, r#"{"error":"database locked"}"#).unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(ref m) if m == "database locked"));
    }

    #[test]
    fn test_statement_error_fails() {
        let body = r#"{"results":[{"error":"no such table: activity_hourly"}]}"#;
        let err = check_execute_response(200, body).unwrap_err();
        assert!(matches!(err, RemoteError::Statement { index: 0, .. }));
    }

    #[test]
    fn test_malformed_body_fails() {
        let err = check_execute_response(200, "<html>proxy error</html>").unwrap_err();
        assert!(matches!(err, RemoteError::Serialization(_)));
    }

    #[test]
    fn test_empty_error_fields_are_ignored() {
        let body = r#"{"results":[{"rows_affected":1,"error":""}],"error":""}"#;
        assert!(check_execute_response(200, body).is_ok());
    }
}
