//! Management report composition
//!
//! Builds the section list for the management report from the request
//! options. Rendering to PDF happens in `report-pdf`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use shared_types::{ChartContent, MetricRow, ReportDocument, ReportSection, ValueKind};

use crate::catalog;
use crate::dashboard::compliance_evolution;
use crate::error::CatalogError;
use crate::kpi::{format_value, report_status, sample_value};

pub const EXECUTIVE_SUMMARY: &str = "Executive Summary";
pub const CHART_ANALYSIS: &str = "Chart Analysis";
pub const RECOMMENDATIONS: &str = "Recommendations";

const RECOMMENDATION_ITEMS: &str = "1. Intensify training in departments with lower adherence\n\
2. Review policies that are close to expiring\n\
3. Automate the manual controls identified\n\
4. Increase the frequency of compliance communications";

/// Options of the management report form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagementReportRequest {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_responsible")]
    pub responsible: String,
    /// Pillar numbers, in the order their sections appear
    #[serde(default = "default_pillars")]
    pub pillars: Vec<u32>,
    #[serde(default = "enabled")]
    pub include_metrics: bool,
    #[serde(default = "enabled")]
    pub include_charts: bool,
    #[serde(default = "enabled")]
    pub include_recommendations: bool,
}

fn default_title() -> String {
    "Compliance Management Report".to_string()
}

fn default_period() -> String {
    "Last month".to_string()
}

fn default_responsible() -> String {
    "Compliance Department".to_string()
}

fn default_pillars() -> Vec<u32> {
    (1..=5).collect()
}

fn enabled() -> bool {
    true
}

impl Default for ManagementReportRequest {
    fn default() -> Self {
        Self {
            title: default_title(),
            period: default_period(),
            responsible: default_responsible(),
            pillars: default_pillars(),
            include_metrics: true,
            include_charts: true,
            include_recommendations: true,
        }
    }
}

/// Compose the management report document
///
/// Fails on the first unknown pillar number.
pub fn compose_management_report<R: Rng + ?Sized>(
    request: &ManagementReportRequest,
    rng: &mut R,
) -> Result<ReportDocument, CatalogError> {
    let mut sections = vec![ReportSection::text(
        EXECUTIVE_SUMMARY,
        format!(
            "This report presents the current state of the compliance program, \
             covering the period of {}. The overall compliance score is 87.5%, \
             an increase of 2.3% over the previous period.",
            request.period
        ),
    )];

    if request.include_metrics {
        for &number in &request.pillars {
            let pillar = catalog::pillar(number)?;
            let rows = pillar
                .kpis
                .iter()
                .map(|kpi| {
                    let value = sample_value(ValueKind::Percentage, rng);
                    MetricRow {
                        name: kpi.name.clone(),
                        value: format_value(ValueKind::Percentage, value),
                        status: Some(report_status(value)),
                    }
                })
                .collect();
            sections.push(ReportSection::metrics(pillar.label(), rows));
        }
    }

    if request.include_charts {
        sections.push(ReportSection::chart(
            CHART_ANALYSIS,
            ChartContent::Plot(compliance_evolution()),
        ));
    }

    if request.include_recommendations {
        sections.push(ReportSection::text(RECOMMENDATIONS, RECOMMENDATION_ITEMS));
    }

    Ok(ReportDocument {
        title: request.title.clone(),
        period: Some(request.period.clone()),
        responsible: Some(request.responsible.clone()),
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared_types::SectionContent;

    fn titles(doc: &ReportDocument) -> Vec<&str> {
        doc.sections.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_default_request_sections() {
        let doc = compose_management_report(
            &ManagementReportRequest::default(),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert_eq!(
            titles(&doc),
            vec![
                "Executive Summary",
                "1. Senior Management Support",
                "2. Risk Assessment",
                "3. Code of Conduct",
                "4. Internal Controls",
                "5. Training and Communication",
                "Chart Analysis",
                "Recommendations",
            ]
        );
    }

    #[test]
    fn test_summary_mentions_period() {
        let request = ManagementReportRequest {
            period: "Last quarter".to_string(),
            ..Default::default()
        };
        let doc = compose_management_report(&request, &mut StdRng::seed_from_u64(1)).unwrap();
        match &doc.sections[0].content {
            SectionContent::Text(body) => {
                assert!(body.contains("covering the period of Last quarter."))
            }
            other => panic!("expected text, got {:?}", other),
        }
        assert_eq!(doc.period.as_deref(), Some("Last quarter"));
    }

    #[test]
    fn test_flags_drop_sections() {
        let request = ManagementReportRequest {
            include_metrics: false,
            include_charts: false,
            include_recommendations: false,
            ..Default::default()
        };
        let doc = compose_management_report(&request, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(titles(&doc), vec!["Executive Summary"]);
    }

    #[test]
    fn test_metrics_rows_have_status() {
        let request = ManagementReportRequest {
            pillars: vec![11],
            include_charts: false,
            include_recommendations: false,
            ..Default::default()
        };
        let doc = compose_management_report(&request, &mut StdRng::seed_from_u64(9)).unwrap();
        match &doc.sections[1].content {
            SectionContent::Metrics(rows) => {
                assert_eq!(rows.len(), 5);
                assert_eq!(rows[0].name, "Consents");
                assert!(rows.iter().all(|r| r.status.is_some() && r.value.ends_with('%')));
            }
            other => panic!("expected metrics, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_pillar_is_rejected() {
        let request = ManagementReportRequest {
            pillars: vec![1, 42],
            ..Default::default()
        };
        let err = compose_management_report(&request, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert_eq!(err, CatalogError::UnknownPillar(42));
    }

    #[test]
    fn test_request_defaults_from_empty_json() {
        let request: ManagementReportRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, ManagementReportRequest::default());
    }
}
