use serde::{Deserialize, Serialize};

/// How a KPI value is measured and displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Percentage,
    Currency,
    Days,
    Hours,
    Minutes,
    Count,
    Score,
}

impl ValueKind {
    /// Percentages and scores improve upwards; durations and counts of
    /// findings improve downwards.
    pub fn higher_is_better(self) -> bool {
        matches!(self, ValueKind::Percentage | ValueKind::Score)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Percentage => write!(f, "percentage"),
            ValueKind::Currency => write!(f, "currency"),
            ValueKind::Days => write!(f, "days"),
            ValueKind::Hours => write!(f, "hours"),
            ValueKind::Minutes => write!(f, "minutes"),
            ValueKind::Count => write!(f, "count"),
            ValueKind::Score => write!(f, "score"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDefinition {
    pub name: String,
    pub kind: ValueKind,
    pub target: f64,
}

/// A compliance category grouping a fixed set of KPIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pillar {
    /// 1-based position in the catalog
    pub number: u32,
    pub name: String,
    pub icon: String,
    pub kpis: Vec<KpiDefinition>,
}

impl Pillar {
    /// Catalog label, e.g. "4. Internal Controls"
    pub fn label(&self) -> String {
        format!("{}. {}", self.number, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiStatus {
    OnTarget,
    AtRisk,
    OffTarget,
}

impl KpiStatus {
    /// Short marker printed in report tables
    pub fn marker(self) -> &'static str {
        match self {
            KpiStatus::OnTarget => "OK",
            KpiStatus::AtRisk => "WARN",
            KpiStatus::OffTarget => "FAIL",
        }
    }
}

/// A KPI with a sampled value, ready for display on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiCard {
    pub name: String,
    pub kind: ValueKind,
    pub value: f64,
    pub display: String,
    pub target: f64,
    pub status: KpiStatus,
}
