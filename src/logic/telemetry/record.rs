//! Telemetry Record & Table
//!
//! One row per vessel per snapshot. Rows only live for one cycle.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logic::error::FetchError;
use crate::logic::features::layout::{COL_COURSE, COL_LAT, COL_LON, COL_SPEED};

/// Identity columns, in order of preference
const ID_COLUMNS: &[&str] = &["MMSI", "SHIP_ID", "ID"];

/// One vessel position report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub vessel_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<f64>,
    pub course: Option<f64>,
    /// Provider fields not used for scoring
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

impl TelemetryRecord {
    pub fn new(
        vessel_id: impl Into<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        speed: Option<f64>,
        course: Option<f64>,
    ) -> Self {
        Self {
            vessel_id: vessel_id.into(),
            latitude,
            longitude,
            speed,
            course,
            extra: BTreeMap::new(),
        }
    }

    /// Numeric value of a feature column, `None` when missing
    pub fn feature(&self, column: &str) -> Option<f64> {
        match column {
            COL_LAT => self.latitude,
            COL_LON => self.longitude,
            COL_SPEED => self.speed,
            COL_COURSE => self.course,
            _ => None,
        }
    }

    /// Position as `(lat, lon)` when both coordinates are present
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Snapshot of the fleet: rows plus the column schema the provider sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryTable {
    columns: BTreeSet<String>,
    records: Vec<TelemetryRecord>,
}

impl TelemetryTable {
    pub fn new<I, S>(columns: I, records: Vec<TelemetryRecord>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            records,
        }
    }

    /// Table with the standard identity and feature columns
    pub fn with_standard_columns(records: Vec<TelemetryRecord>) -> Self {
        Self::new(["MMSI", COL_LAT, COL_LON, COL_SPEED, COL_COURSE], records)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parse a provider payload: a JSON array of flat objects.
    ///
    /// Keys are upper-cased. Null, blank or non-numeric feature values become
    /// missing values. Anything other than an array of objects is an error.
    pub fn from_json(payload: Value) -> Result<Self, FetchError> {
        let rows = match payload {
            Value::Array(rows) => rows,
            Value::Object(map) => {
                return Err(match map.get("errors") {
                    Some(errors) => FetchError::Provider(provider_error_detail(errors)),
                    None => FetchError::Parse("expected an array of vessel rows".to_string()),
                });
            }
            other => {
                return Err(FetchError::Parse(format!(
                    "expected an array of vessel rows, got {}",
                    json_kind(&other)
                )));
            }
        };

        let mut columns = BTreeSet::new();
        let mut records = Vec::with_capacity(rows.len());

        for (index, row) in rows.into_iter().enumerate() {
            let Value::Object(map) = row else {
                return Err(FetchError::Parse(format!("row {} is not an object", index)));
            };

            let mut fields: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k.to_uppercase(), v))
                .collect();
            columns.extend(fields.keys().cloned());

            let vessel_id = ID_COLUMNS
                .iter()
                .find_map(|col| fields.get(*col).and_then(value_as_id))
                .unwrap_or_else(|| format!("row-{}", index));

            let latitude = take_number(&mut fields, COL_LAT);
            let longitude = take_number(&mut fields, COL_LON);
            let speed = take_number(&mut fields, COL_SPEED);
            let course = take_number(&mut fields, COL_COURSE);

            records.push(TelemetryRecord {
                vessel_id,
                latitude,
                longitude,
                speed,
                course,
                extra: fields,
            });
        }

        Ok(Self { columns, records })
    }
}

fn take_number(fields: &mut BTreeMap<String, Value>, column: &str) -> Option<f64> {
    fields.remove(column).as_ref().and_then(value_as_f64)
}

fn value_as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn provider_error_detail(errors: &Value) -> String {
    errors
        .as_array()
        .and_then(|list| list.first())
        .and_then(|first| first.get("detail").or_else(|| first.get("DETAIL")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| errors.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
