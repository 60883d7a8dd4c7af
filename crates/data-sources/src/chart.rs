//! Chart series built from two dataset columns

use serde::{Deserialize, Serialize};
use shared_types::{ChartKind, ChartSeries, ChartSpec, Dataset};
use tracing::{debug, warn};

use crate::error::DataSourceError;

/// Which columns to plot and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub kind: ChartKind,
    /// Category column
    pub x: String,
    /// Value column
    pub y: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// One category per row of `x`, one value per row of `y`. Rows whose `y`
/// cell is not numeric are left out entirely.
pub fn build_chart(
    dataset: &Dataset,
    request: &ChartRequest,
) -> Result<ChartSpec, DataSourceError> {
    let x = dataset
        .column_index(&request.x)
        .ok_or_else(|| DataSourceError::UnknownColumn(request.x.clone()))?;
    let y = dataset
        .column_index(&request.y)
        .ok_or_else(|| DataSourceError::UnknownColumn(request.y.clone()))?;

    let mut categories = Vec::with_capacity(dataset.row_count());
    let mut values = Vec::with_capacity(dataset.row_count());
    for row in &dataset.rows {
        match row[y].as_f64().filter(|v| v.is_finite()) {
            Some(value) => {
                categories.push(row[x].to_string());
                values.push(value);
            }
            None => continue,
        }
    }

    let skipped = dataset.row_count() - values.len();
    if skipped > 0 {
        warn!(column = %request.y, skipped, "non-numeric values left out of chart");
    }
    if values.is_empty() {
        return Err(DataSourceError::NoNumericValues(request.y.clone()));
    }
    debug!(dataset = %dataset.label, kind = ?request.kind, points = values.len(), "chart built");

    Ok(ChartSpec {
        kind: request.kind,
        title: Some(
            request
                .title
                .clone()
                .unwrap_or_else(|| format!("{} by {}", request.y, request.x)),
        ),
        categories,
        series: vec![ChartSeries {
            name: request.y.clone(),
            values,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::Cell;

    fn scores() -> Dataset {
        let mut ds = Dataset::new(
            "File: scores.csv",
            vec!["area".to_string(), "score".to_string()],
        );
        ds.push_row(vec![Cell::Text("Sales".to_string()), Cell::Number(82.0)]);
        ds.push_row(vec![Cell::Text("Legal".to_string()), Cell::Text("n/a".to_string())]);
        ds.push_row(vec![Cell::Text("HR".to_string()), Cell::Text(" 91 ".to_string())]);
        ds.push_row(vec![Cell::Text("IT".to_string()), Cell::Null]);
        ds
    }

    fn request(x: &str, y: &str) -> ChartRequest {
        ChartRequest {
            kind: ChartKind::Bar,
            x: x.to_string(),
            y: y.to_string(),
            title: None,
        }
    }

    #[test]
    fn test_skips_non_numeric_rows() {
        let spec = build_chart(&scores(), &request("area", "score")).unwrap();
        assert_eq!(spec.categories, vec!["Sales", "HR"]);
        assert_eq!(spec.series[0].values, vec![82.0, 91.0]);
        assert_eq!(spec.title.as_deref(), Some("score by area"));
    }

    #[test]
    fn test_unknown_column() {
        assert!(matches!(
            build_chart(&scores(), &request("area", "budget")),
            Err(DataSourceError::UnknownColumn(c)) if c == "budget"
        ));
        assert!(matches!(
            build_chart(&scores(), &request("region", "score")),
            Err(DataSourceError::UnknownColumn(c)) if c == "region"
        ));
    }

    #[test]
    fn test_text_column_has_no_values() {
        assert!(matches!(
            build_chart(&scores(), &request("score", "area")),
            Err(DataSourceError::NoNumericValues(_))
        ));
    }

    #[test]
    fn test_request_from_json() {
        let json = r#"{"kind":"pie","x":"area","y":"score","title":"Scores"}"#;
        let req: ChartRequest = serde_json::from_str(json).unwrap();
        let spec = build_chart(&scores(), &req).unwrap();
        assert_eq!(spec.kind, ChartKind::Pie);
        assert_eq!(spec.title.as_deref(), Some("Scores"));
    }
}
