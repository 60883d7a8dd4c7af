//! The static KPI catalog: eleven compliance pillars, five KPIs each

use lazy_static::lazy_static;
use shared_types::{KpiDefinition, Pillar, ValueKind};

use crate::error::CatalogError;

use ValueKind::{Count, Currency, Days, Hours, Minutes, Percentage, Score};

/// (name, icon, [(kpi name, kind, target); 5])
type PillarSource = (
    &'static str,
    &'static str,
    [(&'static str, ValueKind, f64); 5],
);

const PILLAR_SOURCES: &[PillarSource] = &[
    (
        "Senior Management Support",
        "👥",
        [
            ("Meeting Attendance", Percentage, 95.0),
            ("Approved Budget", Currency, 2_500_000.0),
            ("Response Time", Days, 5.0),
            ("Official Communications", Count, 12.0),
            ("Leadership Training", Count, 4.0),
        ],
    ),
    (
        "Risk Assessment",
        "⚠️",
        [
            ("Identified Risks", Count, 100.0),
            ("Critical Risks", Count, 10.0),
            ("Mitigation Time", Days, 30.0),
            ("Assessment Coverage", Percentage, 100.0),
            ("Risk Score", Score, 80.0),
        ],
    ),
    (
        "Code of Conduct",
        "📜",
        [
            ("Acceptance Rate", Percentage, 100.0),
            ("Reviews Performed", Count, 1.0),
            ("Reported Violations", Count, 0.0),
            ("Update Interval", Days, 365.0),
            ("Comprehension Index", Score, 90.0),
        ],
    ),
    (
        "Internal Controls",
        "🔒",
        [
            ("Implemented Controls", Percentage, 95.0),
            ("Effectiveness Rate", Percentage, 90.0),
            ("Identified Deficiencies", Count, 5.0),
            ("Remediation Time", Days, 15.0),
            ("Automation", Percentage, 70.0),
        ],
    ),
    (
        "Training and Communication",
        "🎓",
        [
            ("Hours per Capita", Hours, 8.0),
            ("Participation Rate", Percentage, 98.0),
            ("Assessment Score", Score, 85.0),
            ("Communications Sent", Count, 24.0),
            ("Engagement", Percentage, 80.0),
        ],
    ),
    (
        "Monitoring and Auditing",
        "🔍",
        [
            ("Audit Coverage", Percentage, 100.0),
            ("Findings per Audit", Count, 10.0),
            ("Resolution Time", Days, 30.0),
            ("Recurrences", Count, 0.0),
            ("Maturity Score", Score, 85.0),
        ],
    ),
    (
        "Violation Response",
        "⚡",
        [
            ("Response Time", Hours, 24.0),
            ("Resolution Rate", Percentage, 95.0),
            ("Average Severity", Score, 30.0),
            ("Disciplinary Actions", Count, 5.0),
            ("Lessons Learned", Count, 12.0),
        ],
    ),
    (
        "Continuous Improvement",
        "📈",
        [
            ("Improvements Implemented", Count, 20.0),
            ("Compliance ROI", Percentage, 150.0),
            ("Benchmarking Score", Score, 90.0),
            ("Innovations Adopted", Count, 5.0),
            ("Feedback Score", Score, 85.0),
        ],
    ),
    (
        "Documentation and Evidence",
        "📄",
        [
            ("Updated Documents", Percentage, 95.0),
            ("Evidence Completeness", Percentage, 98.0),
            ("Retrieval Time", Minutes, 30.0),
            ("Auditability", Percentage, 100.0),
            ("Digitization", Percentage, 90.0),
        ],
    ),
    (
        "Third-Party Assessment",
        "🤝",
        [
            ("Due Diligence", Percentage, 100.0),
            ("Risk Score", Score, 70.0),
            ("Compliant Contracts", Percentage, 95.0),
            ("Monitoring", Percentage, 90.0),
            ("Incidents", Count, 0.0),
        ],
    ),
    (
        "LGPD and Privacy",
        "🛡️",
        [
            ("Consents", Percentage, 100.0),
            ("Requests Fulfilled", Percentage, 95.0),
            ("Response Time", Days, 15.0),
            ("Incidents", Count, 0.0),
            ("Data Mapping", Percentage, 100.0),
        ],
    ),
];

lazy_static! {
    static ref PILLARS: Vec<Pillar> = PILLAR_SOURCES
        .iter()
        .enumerate()
        .map(|(i, (name, icon, kpis))| Pillar {
            number: i as u32 + 1,
            name: name.to_string(),
            icon: icon.to_string(),
            kpis: kpis
                .iter()
                .map(|(kpi, kind, target)| KpiDefinition {
                    name: kpi.to_string(),
                    kind: *kind,
                    target: *target,
                })
                .collect(),
        })
        .collect();
}

/// All pillars in catalog order
pub fn pillars() -> &'static [Pillar] {
    &PILLARS
}

/// Look up a pillar by its 1-based number
pub fn pillar(number: u32) -> Result<&'static Pillar, CatalogError> {
    PILLARS
        .iter()
        .find(|p| p.number == number)
        .ok_or(CatalogError::UnknownPillar(number))
}
