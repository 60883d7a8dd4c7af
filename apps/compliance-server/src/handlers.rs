//! HTTP handlers for the compliance server

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Local;
use compliance_engine::{
    compose_management_report, dashboard_templates, default_dashboard, find_template, pillar,
    pillar_cards, pillars, render_template, ManagementReportRequest,
};
use data_sources::{
    build_chart, list_tables, load_file, load_table, test_connection, ConnectionParams,
};
use report_pdf::ReportAssembler;
use shared_types::ReportDocument;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::models::*;
use crate::state::{AppState, ReportKind};

/// Rows returned by the dataset preview
pub const PREVIEW_ROWS: usize = 5;

pub type SharedState = Arc<AppState>;

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "compliance-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: GET /api/pillars
pub async fn list_pillars() -> Json<PillarsResponse> {
    let pillars = pillars();
    Json(PillarsResponse {
        success: true,
        pillars,
        count: pillars.len(),
    })
}

/// Handler: GET /api/pillars/:number/cards
pub async fn pillar_kpi_cards(Path(number): Path<u32>) -> Result<Json<CardsResponse>, ServerError> {
    let pillar = pillar(number)?;
    let cards = pillar_cards(pillar, &mut rand::thread_rng());
    Ok(Json(CardsResponse {
        success: true,
        pillar: pillar.label(),
        cards,
    }))
}

/// Handler: GET /api/dashboard/templates
pub async fn list_templates() -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        success: true,
        templates: dashboard_templates(),
    })
}

/// Handler: GET /api/dashboard
pub async fn dashboard(
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, ServerError> {
    let mut rng = rand::thread_rng();
    let (template, widgets) = match query.template {
        Some(name) => {
            let template = find_template(&name)?;
            let widgets = render_template(&template, &mut rng);
            (Some(template.name), widgets)
        }
        None => (None, default_dashboard(&mut rng)),
    };
    Ok(Json(DashboardResponse {
        success: true,
        template,
        widgets,
    }))
}

/// Handler: GET /api/dashboard/layouts
pub async fn list_layouts(State(state): State<SharedState>) -> Json<LayoutsResponse> {
    let session = state.session.read().await;
    Json(LayoutsResponse {
        success: true,
        layouts: session.layouts.values().cloned().collect(),
    })
}

/// Handler: POST /api/dashboard/layouts
pub async fn save_layout(
    State(state): State<SharedState>,
    Json(req): Json<SaveLayoutRequest>,
) -> Result<Json<LayoutResponse>, ServerError> {
    let layout = match (req.layout, req.template) {
        (Some(layout), _) => layout,
        (None, Some(name)) => find_template(&name)?.layout,
        (None, None) => {
            return Err(ServerError::InvalidRequest(
                "either a layout or a template name is required".to_string(),
            ))
        }
    };

    if let Some(widget) = layout.overflowing().first() {
        return Err(ServerError::InvalidRequest(format!(
            "widget '{}' does not fit in a {}x{} grid",
            widget.title, layout.rows, layout.cols
        )));
    }

    let saved = state.session.write().await.save_layout(layout, Local::now());
    info!(key = %saved.key, "layout saved");
    Ok(Json(LayoutResponse {
        success: true,
        layout: saved,
    }))
}

/// Handler: POST /api/connections/test
pub async fn connection_test(
    Json(params): Json<ConnectionParams>,
) -> Result<Json<ConnectionTestResponse>, ServerError> {
    test_connection(&params).await?;
    Ok(Json(ConnectionTestResponse {
        success: true,
        message: format!("Connected to {} database '{}'", params.engine, params.database),
    }))
}

/// Handler: POST /api/connections/tables
pub async fn connection_tables(
    Json(params): Json<ConnectionParams>,
) -> Result<Json<TablesResponse>, ServerError> {
    let tables = list_tables(&params).await?;
    Ok(Json(TablesResponse {
        success: true,
        tables,
    }))
}

/// Handler: POST /api/connections/load
///
/// Loads every requested table before touching the session, so a failure
/// leaves it unchanged.
pub async fn connection_load(
    State(state): State<SharedState>,
    Json(req): Json<LoadTablesRequest>,
) -> Result<Json<DatasetsResponse>, ServerError> {
    if req.tables.is_empty() {
        return Err(ServerError::InvalidRequest("no tables selected".to_string()));
    }

    let mut loaded = Vec::with_capacity(req.tables.len());
    for table in &req.tables {
        loaded.push(load_table(&req.connection, table).await?);
    }

    let mut session = state.session.write().await;
    let datasets = loaded
        .into_iter()
        .map(|dataset| {
            let summary = dataset.summary();
            session.insert_dataset(dataset);
            summary
        })
        .collect();
    Ok(Json(DatasetsResponse {
        success: true,
        datasets,
    }))
}

/// Handler: POST /api/datasets/upload
///
/// All files must parse; the session only changes when every one does.
pub async fn upload_datasets(
    State(state): State<SharedState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<DatasetsResponse>, ServerError> {
    if req.files.is_empty() {
        return Err(ServerError::InvalidRequest("no files uploaded".to_string()));
    }

    let mut loaded = Vec::with_capacity(req.files.len());
    for file in &req.files {
        let bytes = BASE64.decode(&file.content_base64).map_err(|e| {
            ServerError::InvalidRequest(format!("Invalid base64 in {}: {}", file.name, e))
        })?;
        debug!(file = %file.name, size = bytes.len(), "upload received");
        loaded.push(load_file(&file.name, &bytes)?);
    }

    let mut session = state.session.write().await;
    let datasets = loaded
        .into_iter()
        .map(|dataset| {
            let summary = dataset.summary();
            session.insert_dataset(dataset);
            summary
        })
        .collect();
    Ok(Json(DatasetsResponse {
        success: true,
        datasets,
    }))
}

/// Handler: GET /api/datasets
pub async fn list_datasets(State(state): State<SharedState>) -> Json<DatasetsResponse> {
    let session = state.session.read().await;
    Json(DatasetsResponse {
        success: true,
        datasets: session.datasets.values().map(|d| d.summary()).collect(),
    })
}

/// Handler: GET /api/datasets/:label/preview
pub async fn preview_dataset(
    State(state): State<SharedState>,
    Path(label): Path<String>,
) -> Result<Json<PreviewResponse>, ServerError> {
    let session = state.session.read().await;
    let dataset = session
        .datasets
        .get(&label)
        .ok_or(ServerError::DatasetNotFound(label))?;
    Ok(Json(PreviewResponse {
        success: true,
        row_count: dataset.row_count(),
        preview: dataset.head(PREVIEW_ROWS),
    }))
}

/// Handler: POST /api/visualizations
pub async fn visualize(
    State(state): State<SharedState>,
    Json(req): Json<VisualizationRequest>,
) -> Result<Json<VisualizationResponse>, ServerError> {
    let session = state.session.read().await;
    let dataset = session
        .datasets
        .get(&req.dataset)
        .ok_or_else(|| ServerError::DatasetNotFound(req.dataset.clone()))?;
    let chart = build_chart(dataset, &req.chart)?;
    Ok(Json(VisualizationResponse {
        success: true,
        chart,
    }))
}

/// Assemble off the async runtime, then keep the bytes in the session
async fn assemble_and_save(
    state: &AppState,
    document: ReportDocument,
    kind: ReportKind,
) -> Result<Json<ReportResponse>, ServerError> {
    let title = document.title.clone();
    let pdf = tokio::task::spawn_blocking(move || ReportAssembler::new().render(&document))
        .await
        .map_err(|e| ServerError::Internal(format!("report task failed: {}", e)))??;

    let pdf_base64 = BASE64.encode(&pdf);
    let report = state
        .session
        .write()
        .await
        .save_report(title, kind, pdf, Local::now());
    info!(id = %report.id, size = report.size, "report generated");

    Ok(Json(ReportResponse {
        success: true,
        report,
        pdf_base64,
    }))
}

/// Handler: POST /api/reports
pub async fn generate_report(
    State(state): State<SharedState>,
    Json(document): Json<ReportDocument>,
) -> Result<Json<ReportResponse>, ServerError> {
    debug!(title = %document.title, sections = document.sections.len(), "custom report requested");
    assemble_and_save(&state, document, ReportKind::Custom).await
}

/// Handler: POST /api/reports/management
pub async fn generate_management_report(
    State(state): State<SharedState>,
    Json(req): Json<ManagementReportRequest>,
) -> Result<Json<ReportResponse>, ServerError> {
    let document = compose_management_report(&req, &mut rand::thread_rng())?;
    assemble_and_save(&state, document, ReportKind::Management).await
}

/// Handler: GET /api/reports
pub async fn list_reports(State(state): State<SharedState>) -> Json<ReportsResponse> {
    let session = state.session.read().await;
    Json(ReportsResponse {
        success: true,
        reports: session.reports.values().map(|r| r.info.clone()).collect(),
    })
}

/// Handler: GET /api/reports/:id/pdf
pub async fn download_report(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, [(header::HeaderName, String); 2], Vec<u8>), ServerError> {
    let session = state.session.read().await;
    let report = session
        .reports
        .get(&id)
        .ok_or_else(|| ServerError::ReportNotFound(id.clone()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.pdf\"", report.info.id),
            ),
        ],
        report.pdf.clone(),
    ))
}

/// Handler: DELETE /api/reports/:id
pub async fn delete_report(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ServerError> {
    state
        .session
        .write()
        .await
        .reports
        .remove(&id)
        .ok_or_else(|| ServerError::ReportNotFound(id.clone()))?;
    info!(%id, "report deleted");
    Ok(Json(DeleteResponse { success: true, id }))
}
