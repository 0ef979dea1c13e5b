//! Google Sheets v4 client — value reads and row highlighting.

use anyhow::{anyhow, Context, Result};
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use crate::constants::{HIGHLIGHT_COLOR, SHEETS_BASE_URL};
use crate::scanner::Highlight;

/// Thin wrapper around the Sheets API for one spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    http: HttpClient,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(http: HttpClient, spreadsheet_id: &str) -> Self {
        SheetsClient {
            http,
            spreadsheet_id: spreadsheet_id.to_string(),
        }
    }

    /// Read the cells in `range` as rows of strings. Absent trailing cells
    /// are simply missing from the row, exactly as the API returns them.
    pub async fn values_get(&self, access_token: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = format!("{SHEETS_BASE_URL}/{}/values/{range}", self.spreadsheet_id);
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .context("read sheet values")?;

        let status = response.status();
        let text = response.text().await.context("read values response")?;
        if !status.is_success() {
            return Err(anyhow!("Sheets error {status}: {text}"));
        }

        let body: Value = serde_json::from_str(&text).context("parse values response")?;
        Ok(rows_from_response(&body))
    }

    /// Apply the highlight fill to every matched row in one batchUpdate.
    pub async fn highlight_rows(
        &self,
        access_token: &str,
        sheet_id: i64,
        highlights: &[Highlight],
    ) -> Result<()> {
        let requests: Vec<Value> = highlights
            .iter()
            .map(|highlight| repeat_cell(sheet_id, highlight))
            .collect();

        let url = format!("{SHEETS_BASE_URL}/{}:batchUpdate", self.spreadsheet_id);
        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .context("send batchUpdate")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.context("read batchUpdate response")?;
            return Err(anyhow!("Sheets error {status}: {text}"));
        }
        Ok(())
    }
}

fn rows_from_response(body: &Value) -> Vec<Vec<String>> {
    let Some(values) = body.get("values").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    values
        .iter()
        .map(|row| {
            row.as_array()
                .map(|cells| cells.iter().map(cell_to_string).collect())
                .unwrap_or_default()
        })
        .collect()
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// One repeatCell request painting the highlight fill over a row range.
pub fn repeat_cell(sheet_id: i64, highlight: &Highlight) -> Value {
    let (red, green, blue) = HIGHLIGHT_COLOR;
    json!({
        "repeatCell": {
            "range": {
                "sheetId": sheet_id,
                "startRowIndex": highlight.start_row,
                "endRowIndex": highlight.end_row,
            },
            "cell": {
                "userEnteredFormat": {
                    "backgroundColor": {
                        "red": red,
                        "green": green,
                        "blue": blue,
                    },
                },
            },
            "fields": "userEnteredFormat.backgroundColor",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cell_paints_the_row_range() {
        let request = repeat_cell(
            0,
            &Highlight {
                start_row: 3,
                end_row: 4,
            },
        );
        assert_eq!(
            request,
            json!({
                "repeatCell": {
                    "range": {
                        "sheetId": 0,
                        "startRowIndex": 3,
                        "endRowIndex": 4,
                    },
                    "cell": {
                        "userEnteredFormat": {
                            "backgroundColor": {
                                "red": 1.0,
                                "green": 1.0,
                                "blue": 0.6,
                            },
                        },
                    },
                    "fields": "userEnteredFormat.backgroundColor",
                },
            })
        );
    }

    #[test]
    fn absent_values_read_as_no_rows() {
        assert!(rows_from_response(&json!({"range": "Sheet1!A2:L"})).is_empty());
    }

    #[test]
    fn ragged_rows_are_preserved() {
        let body = json!({
            "values": [
                ["Alice", "Acme"],
                ["Bob"],
            ],
        });
        let rows = rows_from_response(&body);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Alice".to_string(), "Acme".to_string()]);
        assert_eq!(rows[1], vec!["Bob".to_string()]);
    }

    #[test]
    fn non_string_cells_render_as_text() {
        let body = json!({ "values": [[42, null, true]] });
        let rows = rows_from_response(&body);
        assert_eq!(
            rows[0],
            vec!["42".to_string(), String::new(), "true".to_string()]
        );
    }
}
