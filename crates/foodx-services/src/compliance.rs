// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record export for compliance reporting.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use foodx_core::{FoodxError, Logger};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

pub struct ComplianceService {
    logger: Logger,
}

impl ComplianceService {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub async fn initialize(&self) -> Result<(), FoodxError> {
        self.logger.info("Compliance service initialized", None);
        Ok(())
    }

    pub fn available_formats(&self) -> Vec<ExportFormat> {
        ExportFormat::iter().collect()
    }

    /// Render `records` in `format`.
    ///
    /// JSON output is a pretty-printed array. CSV output has one column per
    /// distinct top-level field, in first-seen order across all records;
    /// every record must be an object. Strings are written as-is, `null` and
    /// missing fields as empty cells, anything else as compact JSON.
    pub fn export(&self, records: &[Value], format: ExportFormat) -> Result<String, FoodxError> {
        self.logger.debug(
            &format!("Exporting {} records as {format}", records.len()),
            None,
        );
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(records)?),
            ExportFormat::Csv => to_csv(records),
        }
    }
}

fn to_csv(records: &[Value]) -> Result<String, FoodxError> {
    let mut rows = Vec::with_capacity(records.len());
    let mut headers: Vec<&str> = Vec::new();
    for (n, record) in records.iter().enumerate() {
        let Value::Object(fields) = record else {
            return Err(FoodxError::InvalidInput(format!(
                "record {n} is not an object and cannot be exported as CSV"
            )));
        };
        for key in fields.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
        rows.push(fields);
    }
    if headers.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&headers).map_err(csv_err)?;
    for fields in rows {
        let cells = headers.iter().map(|h| match fields.get(*h) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        writer.write_record(cells).map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FoodxError::Internal(format!("csv flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| FoodxError::Internal(e.to_string()))
}

fn csv_err(e: csv::Error) -> FoodxError {
    FoodxError::Internal(format!("csv write failed: {e}"))
}
