//! Request and response bodies

use data_sources::{ChartRequest, ConnectionParams};
use serde::{Deserialize, Serialize};
use shared_types::{
    ChartSpec, DashboardLayout, DashboardTemplate, Dataset, DatasetSummary, KpiCard, Pillar, Widget,
};

use crate::state::{ReportInfo, SavedLayout};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct PillarsResponse {
    pub success: bool,
    pub pillars: &'static [Pillar],
    pub count: usize,
}

#[derive(Serialize)]
pub struct CardsResponse {
    pub success: bool,
    pub pillar: String,
    pub cards: Vec<KpiCard>,
}

#[derive(Serialize)]
pub struct TemplatesResponse {
    pub success: bool,
    pub templates: Vec<DashboardTemplate>,
}

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub template: Option<String>,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    /// `None` for the default grid
    pub template: Option<String>,
    pub widgets: Vec<Widget>,
}

/// Save either a copy of a named template or an explicit layout
#[derive(Deserialize)]
pub struct SaveLayoutRequest {
    pub template: Option<String>,
    pub layout: Option<DashboardLayout>,
}

#[derive(Serialize)]
pub struct LayoutResponse {
    pub success: bool,
    pub layout: SavedLayout,
}

#[derive(Serialize)]
pub struct LayoutsResponse {
    pub success: bool,
    pub layouts: Vec<SavedLayout>,
}

#[derive(Serialize)]
pub struct ConnectionTestResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct TablesResponse {
    pub success: bool,
    pub tables: Vec<String>,
}

#[derive(Deserialize)]
pub struct LoadTablesRequest {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub tables: Vec<String>,
}

/// One uploaded file, base64 encoded
#[derive(Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub content_base64: String,
}

#[derive(Deserialize)]
pub struct UploadRequest {
    pub files: Vec<UploadedFile>,
}

#[derive(Serialize)]
pub struct DatasetsResponse {
    pub success: bool,
    pub datasets: Vec<DatasetSummary>,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub row_count: usize,
    pub preview: Dataset,
}

#[derive(Deserialize)]
pub struct VisualizationRequest {
    /// Dataset label
    pub dataset: String,
    #[serde(flatten)]
    pub chart: ChartRequest,
}

#[derive(Serialize)]
pub struct VisualizationResponse {
    pub success: bool,
    pub chart: ChartSpec,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub report: ReportInfo,
    /// The stored PDF, base64 encoded
    pub pdf_base64: String,
}

#[derive(Serialize)]
pub struct ReportsResponse {
    pub success: bool,
    pub reports: Vec<ReportInfo>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
}
