//! Compliance KPI catalog, dashboard templates and report composition

pub mod catalog;
pub mod dashboard;
pub mod error;
pub mod kpi;
pub mod reports;

pub use catalog::{pillar, pillars};
pub use dashboard::{default_dashboard, dashboard_templates, find_template, render_template};
pub use error::CatalogError;
pub use kpi::{evaluate, format_value, pillar_cards, report_status, sample_value};
pub use reports::{compose_management_report, ManagementReportRequest};
