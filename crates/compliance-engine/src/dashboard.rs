//! Dashboard templates and placeholder widget payloads
//!
//! Widgets carry demonstration values only; nothing here is bound to a
//! loaded dataset.

use rand::Rng;
use shared_types::{
    ChartKind, ChartSeries, ChartSpec, DashboardLayout, DashboardTemplate, KpiDefinition,
    MetricRow, TableData, ValueKind, Widget, WidgetKind, WidgetPayload, WidgetPlacement,
};

use crate::catalog;
use crate::error::CatalogError;
use crate::kpi::{self, format_value};

/// Columns of the default drag-and-drop grid
pub const DEFAULT_GRID_COLUMNS: u32 = 12;
/// Pixel height of one default grid row
pub const DEFAULT_ROW_HEIGHT: u32 = 60;

pub const COMPLIANCE_EVOLUTION: &str = "Compliance Evolution";
pub const RISKS_BY_CATEGORY: &str = "Risks by Category";
pub const PENDING_ACTIONS: &str = "Pending Actions";
pub const TOP_RISKS: &str = "Top 10 Risks";

const MONTHS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];
const EVOLUTION_SCORES: [f64; 6] = [82.0, 85.0, 87.0, 89.0, 91.0, 93.0];
const DEFAULT_KPI_TARGET: f64 = 95.0;

fn place(
    kind: WidgetKind,
    title: &str,
    row: u32,
    col: u32,
    width: u32,
    height: u32,
) -> WidgetPlacement {
    WidgetPlacement {
        kind,
        title: title.to_string(),
        row,
        col,
        width,
        height,
    }
}

/// The predefined layouts, in display order
pub fn dashboard_templates() -> Vec<DashboardTemplate> {
    use WidgetKind::*;

    vec![
        DashboardTemplate {
            name: "Executive".to_string(),
            description: "Executive view with the main KPIs".to_string(),
            layout: DashboardLayout {
                rows: 3,
                cols: 4,
                widgets: vec![
                    place(Kpi, "Compliance Score", 0, 0, 1, 1),
                    place(Kpi, "Critical Risks", 0, 1, 1, 1),
                    place(Kpi, "Trainings", 0, 2, 1, 1),
                    place(Kpi, "Incidents", 0, 3, 1, 1),
                    place(Chart, COMPLIANCE_EVOLUTION, 1, 0, 2, 2),
                    place(Chart, "Risks by Area", 1, 2, 2, 2),
                ],
            },
        },
        DashboardTemplate {
            name: "Operational".to_string(),
            description: "Operational detail by pillar".to_string(),
            layout: DashboardLayout {
                rows: 4,
                cols: 3,
                widgets: vec![
                    place(Table, PENDING_ACTIONS, 0, 0, 3, 1),
                    place(Chart, "Performance by Pillar", 1, 0, 3, 2),
                    place(Metrics, "Detailed Metrics", 3, 0, 3, 1),
                ],
            },
        },
        DashboardTemplate {
            name: "Risk".to_string(),
            description: "Focus on risk management".to_string(),
            layout: DashboardLayout {
                rows: 3,
                cols: 3,
                widgets: vec![
                    place(Heatmap, "Risk Matrix", 0, 0, 3, 2),
                    place(Table, TOP_RISKS, 2, 0, 2, 1),
                    place(Kpi, "Risk Score", 2, 2, 1, 1),
                ],
            },
        },
    ]
}

/// Case-insensitive template lookup
pub fn find_template(name: &str) -> Result<DashboardTemplate, CatalogError> {
    dashboard_templates()
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| CatalogError::UnknownTemplate(name.to_string()))
}

/// The default overview grid: four KPI cards, two charts and the pending
/// actions table on a 12-column grid
pub fn default_dashboard<R: Rng + ?Sized>(rng: &mut R) -> Vec<Widget> {
    let mut widgets = Vec::with_capacity(7);

    for i in 0..4u32 {
        let title = format!("KPI {}", i + 1);
        widgets.push(Widget {
            key: format!("kpi{}", i + 1),
            placement: place(WidgetKind::Kpi, &title, 0, i * 3, 3, 2),
            payload: percentage_card(rng),
        });
    }

    widgets.push(Widget {
        key: "chart1".to_string(),
        placement: place(WidgetKind::Chart, COMPLIANCE_EVOLUTION, 2, 0, 6, 4),
        payload: WidgetPayload::Chart(compliance_evolution()),
    });
    widgets.push(Widget {
        key: "chart2".to_string(),
        placement: place(WidgetKind::Chart, RISKS_BY_CATEGORY, 2, 6, 6, 4),
        payload: WidgetPayload::Chart(risks_by_category()),
    });
    widgets.push(Widget {
        key: "table1".to_string(),
        placement: place(WidgetKind::Table, PENDING_ACTIONS, 6, 0, DEFAULT_GRID_COLUMNS, 3),
        payload: WidgetPayload::Table(pending_actions()),
    });

    widgets
}

/// Fill every placement of a template with a placeholder payload
pub fn render_template<R: Rng + ?Sized>(template: &DashboardTemplate, rng: &mut R) -> Vec<Widget> {
    template
        .layout
        .widgets
        .iter()
        .enumerate()
        .map(|(i, placement)| Widget {
            key: format!("{}{}", kind_key(placement.kind), i + 1),
            placement: placement.clone(),
            payload: placeholder_payload(placement, rng),
        })
        .collect()
}

fn kind_key(kind: WidgetKind) -> &'static str {
    match kind {
        WidgetKind::Kpi => "kpi",
        WidgetKind::Chart => "chart",
        WidgetKind::Table => "table",
        WidgetKind::Metrics => "metrics",
        WidgetKind::Heatmap => "heatmap",
    }
}

fn placeholder_payload<R: Rng + ?Sized>(placement: &WidgetPlacement, rng: &mut R) -> WidgetPayload {
    match placement.kind {
        WidgetKind::Kpi => percentage_card(rng),
        WidgetKind::Chart if placement.title == COMPLIANCE_EVOLUTION => {
            WidgetPayload::Chart(compliance_evolution())
        }
        WidgetKind::Chart => WidgetPayload::Chart(pillar_scores(&placement.title, rng)),
        WidgetKind::Table if placement.title == TOP_RISKS => WidgetPayload::Table(top_risks(rng)),
        WidgetKind::Table => WidgetPayload::Table(pending_actions()),
        WidgetKind::Metrics => WidgetPayload::Metrics {
            rows: pillar_metrics(rng),
        },
        WidgetKind::Heatmap => risk_matrix(rng),
    }
}

fn percentage_card<R: Rng + ?Sized>(rng: &mut R) -> WidgetPayload {
    let target = KpiDefinition {
        name: String::new(),
        kind: ValueKind::Percentage,
        target: DEFAULT_KPI_TARGET,
    };
    let value = kpi::sample_value(ValueKind::Percentage, rng);
    WidgetPayload::Kpi {
        value: format_value(ValueKind::Percentage, value),
        target: format_value(ValueKind::Percentage, DEFAULT_KPI_TARGET),
        status: kpi::evaluate(&target, value),
    }
}

/// Monthly compliance score trend
pub fn compliance_evolution() -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Line,
        title: Some(COMPLIANCE_EVOLUTION.to_string()),
        categories: MONTHS.iter().map(|m| m.to_string()).collect(),
        series: vec![ChartSeries {
            name: "Compliance Score".to_string(),
            values: EVOLUTION_SCORES.to_vec(),
        }],
    }
}

fn risks_by_category() -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Pie,
        title: Some(RISKS_BY_CATEGORY.to_string()),
        categories: vec!["High".to_string(), "Medium".to_string(), "Low".to_string()],
        series: vec![ChartSeries {
            name: "Risks".to_string(),
            values: vec![15.0, 35.0, 50.0],
        }],
    }
}

fn pillar_scores<R: Rng + ?Sized>(title: &str, rng: &mut R) -> ChartSpec {
    let pillars = catalog::pillars();
    ChartSpec {
        kind: ChartKind::Bar,
        title: Some(title.to_string()),
        categories: pillars.iter().map(|p| format!("P{}", p.number)).collect(),
        series: vec![ChartSeries {
            name: "Score".to_string(),
            values: pillars
                .iter()
                .map(|_| kpi::sample_value(ValueKind::Percentage, rng))
                .collect(),
        }],
    }
}

fn pending_actions() -> TableData {
    TableData {
        headers: ["ID", "Description", "Priority", "Due"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows: (0..5)
            .map(|i| {
                vec![
                    format!("A{:03}", i + 1),
                    format!("Compliance action {}", i + 1),
                    if i < 2 { "High" } else { "Medium" }.to_string(),
                    format!("{} days", i + 5),
                ]
            })
            .collect(),
    }
}

fn top_risks<R: Rng + ?Sized>(rng: &mut R) -> TableData {
    let pillars = catalog::pillars();
    TableData {
        headers: ["ID", "Pillar", "Score"].iter().map(|h| h.to_string()).collect(),
        rows: (0..10)
            .map(|i| {
                vec![
                    format!("R{:03}", i + 1),
                    pillars[i % pillars.len()].name.clone(),
                    format_value(ValueKind::Score, kpi::sample_value(ValueKind::Score, rng)),
                ]
            })
            .collect(),
    }
}

fn pillar_metrics<R: Rng + ?Sized>(rng: &mut R) -> Vec<MetricRow> {
    catalog::pillars()
        .iter()
        .map(|p| {
            let value = kpi::sample_value(ValueKind::Percentage, rng);
            MetricRow {
                name: p.name.clone(),
                value: format_value(ValueKind::Percentage, value),
                status: Some(kpi::report_status(value)),
            }
        })
        .collect()
}

/// Likelihood x impact matrix with a placeholder risk count per cell
fn risk_matrix<R: Rng + ?Sized>(rng: &mut R) -> WidgetPayload {
    let levels: Vec<String> = ["Very Low", "Low", "Medium", "High", "Very High"]
        .iter()
        .map(|l| l.to_string())
        .collect();
    let values = (0..levels.len())
        .map(|_| (0..levels.len()).map(|_| rng.gen_range(0..10) as f64).collect())
        .collect();
    WidgetPayload::Heatmap {
        x_labels: levels.clone(),
        y_labels: levels,
        values,
    }
}
