//! `data_analysis` (MODERATE), grounded on
//! `examples/original_source/backend/airbeeps/agents/tools/data_analysis.py`'s
//! pandas-free summary branch. The original loads a `Document` row via
//! SQLAlchemy and operates on it with pandas; that DB/pandas layer is out of
//! scope (spec §1) — this tool instead takes an in-memory CSV or JSON-records
//! blob directly as tool input and computes aggregate stats per column.

use agentflow_core::SecurityLevel;
use async_trait::async_trait;
use serde::Deserialize;

use crate::contract::AgentTool;
use crate::error::ToolError;

pub struct DataAnalysisTool;

#[derive(Deserialize)]
struct Input {
    /// Either `"csv"` or `"json"` (a JSON array of flat objects).
    format: DataFormat,
    data: String,
    /// Restrict aggregation to these columns; defaults to every numeric column.
    #[serde(default)]
    columns: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum DataFormat {
    Csv,
    Json,
}

#[derive(Debug, Default, serde::Serialize)]
struct ColumnStats {
    count: usize,
    mean: Option<f64>,
    median: Option<f64>,
    stddev: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

fn parse_rows(input: &Input) -> Result<Vec<std::collections::BTreeMap<String, String>>, ToolError> {
    match input.format {
        DataFormat::Csv => parse_csv(&input.data),
        DataFormat::Json => parse_json_records(&input.data),
    }
}

fn parse_csv(data: &str) -> Result<Vec<std::collections::BTreeMap<String, String>>, ToolError> {
    let mut lines = data.lines();
    let header = lines.next().ok_or_else(|| ToolError::InvalidInput("empty CSV".to_string()))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        let mut row = std::collections::BTreeMap::new();
        for (col, val) in columns.iter().zip(values.iter()) {
            row.insert(col.to_string(), val.to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}

fn parse_json_records(data: &str) -> Result<Vec<std::collections::BTreeMap<String, String>>, ToolError> {
    let value: serde_json::Value = serde_json::from_str(data).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
    let records = value.as_array().ok_or_else(|| ToolError::InvalidInput("expected a JSON array of records".to_string()))?;

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let obj = record.as_object().ok_or_else(|| ToolError::InvalidInput("each record must be a JSON object".to_string()))?;
        let mut row = std::collections::BTreeMap::new();
        for (key, val) in obj {
            let as_text = match val {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            row.insert(key.clone(), as_text);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn numeric_column(rows: &[std::collections::BTreeMap<String, String>], column: &str) -> Vec<f64> {
    rows.iter().filter_map(|row| row.get(column)).filter_map(|v| v.parse::<f64>().ok()).collect()
}

fn stats_for(values: &[f64]) -> ColumnStats {
    if values.is_empty() {
        return ColumnStats::default();
    }
    let count = values.len();
    let sum: f64 = values.iter().sum();
    let mean = sum / count as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    let stddev = variance.sqrt();

    ColumnStats {
        count,
        mean: Some(mean),
        median: Some(median),
        stddev: Some(stddev),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
    }
}

fn all_columns(rows: &[std::collections::BTreeMap<String, String>]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    for row in rows {
        for key in row.keys() {
            seen.insert(key.clone());
        }
    }
    seen.into_iter().collect()
}

#[async_trait]
impl AgentTool for DataAnalysisTool {
    fn name(&self) -> &str {
        "data_analysis"
    }

    fn description(&self) -> &str {
        "Compute aggregate statistics (count, mean, median, stddev, min, max) over the numeric \
         columns of a CSV or JSON-records blob passed directly as input."
    }

    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Moderate
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "format": {"type": "string", "enum": ["csv", "json"], "description": "Shape of `data`"},
                "data": {"type": "string", "description": "CSV text, or a JSON array of flat objects"},
                "columns": {"type": "array", "items": {"type": "string"}, "description": "Columns to summarize (default: all numeric columns)"},
            },
            "required": ["format", "data"],
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let input: Input = serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let rows = parse_rows(&input)?;
        let columns = input.columns.clone().unwrap_or_else(|| all_columns(&rows));

        let mut summary = serde_json::Map::new();
        for column in &columns {
            let values = numeric_column(&rows, column);
            if values.is_empty() {
                continue;
            }
            summary.insert(column.clone(), serde_json::to_value(stats_for(&values)).unwrap());
        }

        Ok(serde_json::json!({"row_count": rows.len(), "columns": summary}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn computes_stats_over_csv_column() {
        let tool = DataAnalysisTool;
        let out = tool
            .execute(serde_json::json!({"format": "csv", "data": "name,score\na,10\nb,20\nc,30"}))
            .await
            .unwrap();
        assert_eq!(out["row_count"], 3);
        assert_eq!(out["columns"]["score"]["mean"], 20.0);
        assert_eq!(out["columns"]["score"]["count"], 3);
    }

    #[tokio::test]
    async fn computes_stats_over_json_records() {
        let tool = DataAnalysisTool;
        let data = serde_json::json!([{"x": 1}, {"x": 2}, {"x": 3}, {"x": 4}]).to_string();
        let out = tool.execute(serde_json::json!({"format": "json", "data": data})).await.unwrap();
        assert_eq!(out["columns"]["x"]["median"], 2.5);
    }

    #[tokio::test]
    async fn rejects_empty_csv() {
        let tool = DataAnalysisTool;
        let err = tool.execute(serde_json::json!({"format": "csv", "data": ""})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
