//! Dashboard layouts and the widget payloads placed on them

use serde::{Deserialize, Serialize};

use crate::report::{ChartSpec, MetricRow};
use crate::types::KpiStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Kpi,
    Chart,
    Table,
    Metrics,
    Heatmap,
}

/// Where a widget sits on the grid, in grid cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetPlacement {
    pub kind: WidgetKind,
    pub title: String,
    pub row: u32,
    pub col: u32,
    pub width: u32,
    pub height: u32,
}

impl WidgetPlacement {
    /// True when the placement lies entirely inside a `rows` x `cols` grid
    pub fn fits(&self, rows: u32, cols: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.row + self.height <= rows
            && self.col + self.width <= cols
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardLayout {
    pub rows: u32,
    pub cols: u32,
    pub widgets: Vec<WidgetPlacement>,
}

impl DashboardLayout {
    /// Placements that fall outside the grid
    pub fn overflowing(&self) -> Vec<&WidgetPlacement> {
        self.widgets
            .iter()
            .filter(|w| !w.fits(self.rows, self.cols))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardTemplate {
    pub name: String,
    pub description: String,
    pub layout: DashboardLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetPayload {
    Kpi {
        value: String,
        target: String,
        status: KpiStatus,
    },
    Chart(ChartSpec),
    Table(TableData),
    Metrics { rows: Vec<MetricRow> },
    Heatmap {
        x_labels: Vec<String>,
        y_labels: Vec<String>,
        /// Row-major, `y_labels.len()` rows of `x_labels.len()` values
        values: Vec<Vec<f64>>,
    },
}

/// A placed widget with its data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub key: String,
    pub placement: WidgetPlacement,
    pub payload: WidgetPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(row: u32, col: u32, width: u32, height: u32) -> WidgetPlacement {
        WidgetPlacement {
            kind: WidgetKind::Kpi,
            title: "Score".to_string(),
            row,
            col,
            width,
            height,
        }
    }

    #[test]
    fn test_placement_fits_grid() {
        assert!(placement(0, 0, 1, 1).fits(3, 4));
        assert!(placement(1, 2, 2, 2).fits(3, 4));
        assert!(!placement(2, 0, 1, 2).fits(3, 4));
        assert!(!placement(0, 3, 2, 1).fits(3, 4));
        assert!(!placement(0, 0, 0, 1).fits(3, 4));
    }

    #[test]
    fn test_layout_reports_overflow() {
        let layout = DashboardLayout {
            rows: 2,
            cols: 2,
            widgets: vec![placement(0, 0, 2, 1), placement(1, 1, 2, 1)],
        };
        assert_eq!(layout.overflowing().len(), 1);
    }
}
