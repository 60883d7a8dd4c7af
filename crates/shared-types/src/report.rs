//! Report documents: an ordered list of titled sections

use serde::{Deserialize, Serialize};

use crate::types::KpiStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    /// Reporting period shown in the info table
    #[serde(default)]
    pub period: Option<String>,
    /// Responsible party shown in the info table
    #[serde(default)]
    pub responsible: Option<String>,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub content: SectionContent,
}

impl ReportSection {
    pub fn text(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: SectionContent::Text(body.into()),
        }
    }

    pub fn metrics(title: impl Into<String>, rows: Vec<MetricRow>) -> Self {
        Self {
            title: title.into(),
            content: SectionContent::Metrics(rows),
        }
    }

    pub fn chart(title: impl Into<String>, chart: ChartContent) -> Self {
        Self {
            title: title.into(),
            content: SectionContent::Chart(chart),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SectionContent {
    Text(String),
    Metrics(Vec<MetricRow>),
    Chart(ChartContent),
}

/// One row of a metrics table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub status: Option<KpiStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ChartContent {
    /// Drawn as vector graphics from the series data
    Plot(ChartSpec),
    /// A pre-rendered PNG, embedded as-is
    Image { png_base64: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Area,
    Pie,
}

/// Chart data: one label per category, one value per category per series
///
/// Pie charts use the first series only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    #[serde(default)]
    pub title: Option<String>,
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}
