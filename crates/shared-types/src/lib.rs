//! Types shared by the compliance analytics crates
//!
//! Everything here is plain data: the KPI catalog vocabulary, tabular
//! datasets, report documents and dashboard layouts. Behaviour lives in the
//! crates that consume these types.

pub mod dashboard;
pub mod dataset;
pub mod report;
pub mod types;

pub use dashboard::{
    DashboardLayout, DashboardTemplate, TableData, Widget, WidgetKind, WidgetPayload,
    WidgetPlacement,
};
pub use dataset::{Cell, Dataset, DatasetSummary};
pub use report::{
    ChartContent, ChartKind, ChartSeries, ChartSpec, MetricRow, ReportDocument, ReportSection,
    SectionContent,
};
pub use types::{KpiCard, KpiDefinition, KpiStatus, Pillar, ValueKind};
