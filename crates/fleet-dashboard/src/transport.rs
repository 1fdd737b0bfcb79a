use crate::config::{DashboardConfig, TransportKind};
use anyhow::{anyhow, Context, Result};
use fleet_core::{GridTransport, RawGrid, TransportError};
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::time::Duration;

const CSV_EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const USER_AGENT: &str = "fleet-dashboard";

pub fn transport_for(config: &DashboardConfig) -> Result<Box<dyn GridTransport>> {
    match config.transport {
        TransportKind::Csv => Ok(Box::new(CsvExportTransport::new(http_client(
            config.request_timeout,
        )?))),
        TransportKind::Api => {
            let token = config
                .sheets_token
                .clone()
                .ok_or_else(|| anyhow!("--transport api needs FLEET_SHEETS_TOKEN"))?;
            Ok(Box::new(SheetsApiTransport::new(
                http_client(config.request_timeout)?,
                token,
                config.sheets_range.clone(),
            )))
        }
        TransportKind::File => Ok(Box::new(FileTransport)),
    }
}

fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("building http client")
}

fn status_error(status: StatusCode, body: &str) -> TransportError {
    let body_line = body.lines().next().unwrap_or_default().trim();
    let message = if body_line.is_empty() {
        format!("sheet request failed with status {}", status.as_u16())
    } else {
        format!("sheet request failed with status {}: {body_line}", status.as_u16())
    };
    match status.as_u16() {
        401 | 403 => TransportError::Auth(message),
        _ => TransportError::Transport(message),
    }
}

fn read_success_body(response: reqwest::Result<Response>) -> Result<String, TransportError> {
    let response = response
        .map_err(|err| TransportError::Transport(format!("failed to reach sheet backend: {err}")))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|err| TransportError::Transport(format!("failed to read sheet response: {err}")))?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    Ok(body)
}

/// Anonymous CSV export of a publicly shared sheet.
pub struct CsvExportTransport {
    client: Client,
    base_url: String,
}

impl CsvExportTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: CSV_EXPORT_BASE.to_string(),
        }
    }

    fn export_url(&self, source_id: &str) -> String {
        format!(
            "{}/{}/gviz/tq?tqx=out:csv",
            self.base_url.trim_end_matches('/'),
            source_id
        )
    }
}

impl GridTransport for CsvExportTransport {
    fn fetch_grid(&self, source_id: &str) -> Result<RawGrid, TransportError> {
        let body = read_success_body(self.client.get(self.export_url(source_id)).send())?;
        RawGrid::from_csv(&body).map_err(|err| TransportError::Transport(err.to_string()))
    }
}

/// Values endpoint of the spreadsheet API. The bearer token is obtained by
/// the caller; this type never refreshes it.
pub struct SheetsApiTransport {
    client: Client,
    token: String,
    range: String,
    base_url: String,
}

impl SheetsApiTransport {
    pub fn new(client: Client, token: String, range: String) -> Self {
        Self {
            client,
            token,
            range,
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    fn values_url(&self, source_id: &str) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| TransportError::Transport(format!("invalid api base url: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::Transport("api base url cannot take a path".to_string()))?
            .pop_if_empty()
            .push(source_id)
            .push("values")
            .push(&self.range);
        Ok(url)
    }
}

impl GridTransport for SheetsApiTransport {
    fn fetch_grid(&self, source_id: &str) -> Result<RawGrid, TransportError> {
        let url = self.values_url(source_id)?;
        let body = read_success_body(
            self.client
                .get(url)
                .bearer_auth(&self.token)
                .header(ACCEPT, "application/json")
                .send(),
        )?;
        decode_value_range(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// The API drops trailing empty cells and rows, so the result is ragged.
fn decode_value_range(body: &str) -> Result<RawGrid, TransportError> {
    let range: ValueRange = serde_json::from_str(body)
        .map_err(|err| TransportError::Transport(format!("failed to decode values payload: {err}")))?;
    let rows = range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect();
    Ok(RawGrid::new(rows))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Reads a CSV file from disk; the source id is the path.
pub struct FileTransport;

impl GridTransport for FileTransport {
    fn fetch_grid(&self, source_id: &str) -> Result<RawGrid, TransportError> {
        let contents = fs::read_to_string(source_id)
            .map_err(|err| TransportError::Transport(format!("failed to read {source_id}: {err}")))?;
        RawGrid::from_csv(&contents).map_err(|err| TransportError::Transport(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_auth_errors() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            TransportError::Auth("sheet request failed with status 401".to_string())
        );
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "denied\nmore"),
            TransportError::Auth(message) if message.ends_with(": denied")
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, ""),
            TransportError::Transport(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "<html>"),
            TransportError::Transport(_)
        ));
    }

    #[test]
    fn values_payload_decodes_into_ragged_grid() {
        let body = r#"{
            "range": "Sheet1!A1:F12",
            "majorDimension": "ROWS",
            "values": [["Fleet"], ["09:00", "gemini-2", "Active", "fb"], [], ["", 3, true, null]]
        }"#;
        let grid = decode_value_range(body).expect("decode");
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.cell(1, 2), "Active");
        assert_eq!(grid.row(2).map(<[String]>::len), Some(0));
        assert_eq!(grid.cell(3, 1), "3");
        assert_eq!(grid.cell(3, 2), "true");
        assert_eq!(grid.cell(3, 3), "");
    }

    #[test]
    fn empty_range_has_no_values_key() {
        let grid = decode_value_range(r#"{"range": "Sheet1!A1:F1"}"#).expect("decode");
        assert!(grid.is_empty());
    }

    #[test]
    fn malformed_payload_is_a_transport_error() {
        assert!(matches!(
            decode_value_range("<html>quota</html>"),
            Err(TransportError::Transport(_))
        ));
    }

    #[test]
    fn urls_are_built_from_the_source_id() {
        let client = Client::new();
        let csv = CsvExportTransport::new(client.clone());
        assert_eq!(
            csv.export_url("abc123"),
            "https://docs.google.com/spreadsheets/d/abc123/gviz/tq?tqx=out:csv"
        );

        let api = SheetsApiTransport::new(client, "t".to_string(), "Fleet Sheet!A1:F60".to_string());
        let url = api.values_url("abc123").expect("values url");
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Fleet%20Sheet!A1:F60"
        );
    }

    #[test]
    fn file_transport_reads_csv_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fleet.csv");
        fs::write(&path, "a,b\nc\n").expect("write csv");
        let grid = FileTransport
            .fetch_grid(path.to_str().expect("utf8 path"))
            .expect("read grid");
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell(0, 1), "b");

        let missing = FileTransport.fetch_grid("/definitely/not/here.csv");
        assert!(matches!(missing, Err(TransportError::Transport(_))));
    }
}
