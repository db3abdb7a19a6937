//! 印刷用レポートの組み立て
//!
//! 表部分は `grid_rows` をそのまま使うので、画面のグリッドと
//! 印刷されたレポートは同じスナップショットに対して必ず一致する。

use crate::shaper::{format_number, grid_rows, GridRow};
use crate::types::{EquipmentRow, StatsSummary, DISPLAY_FIELDS};
use chrono::NaiveDateTime;

pub const REPORT_TITLE: &str = "Chemical Equipment Report";

/// 出力ファイル名（固定）
pub const REPORT_FILE_NAME: &str = "equipment_report.pdf";

/// レポート1件分の内容
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSpec {
    pub title: String,
    pub generated_at: String,
    /// 集計値3行（集計値が無い場合は空）
    pub summary: Vec<String>,
    pub columns: [&'static str; 5],
    pub rows: Vec<GridRow>,
}

impl ReportSpec {
    pub fn generated_line(&self) -> String {
        format!("Generated on: {}", self.generated_at)
    }
}

pub fn summary_lines(stats: &StatsSummary) -> Vec<String> {
    vec![
        format!("Total Count: {}", stats.total_count),
        format!("Avg Pressure: {} psi", format_number(stats.avg_pressure)),
        format!("Avg Temperature: {} C", format_number(stats.avg_temp)),
    ]
}

pub fn build_report(
    stats: Option<&StatsSummary>,
    rows: &[EquipmentRow],
    generated_at: NaiveDateTime,
) -> ReportSpec {
    ReportSpec {
        title: REPORT_TITLE.to_string(),
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        summary: stats.map(summary_lines).unwrap_or_default(),
        columns: DISPLAY_FIELDS.map(|f| f.header()),
        rows: grid_rows(rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 18)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_report_matches_grid() {
        let rows = vec![
            EquipmentRow::new()
                .with("Equipment Name", "Pump-1")
                .with("Type", "Pump")
                .with("Pressure", 120)
                .with("Temperature", 80)
                .with("Status", "OK"),
            EquipmentRow::new().with("name", "Valve-7").with("temp", 40),
        ];
        let stats = StatsSummary {
            total_count: 2,
            avg_pressure: 120.0,
            avg_temp: 60.0,
            ..Default::default()
        };

        let report = build_report(Some(&stats), &rows, fixed_time());
        let grid = grid_rows(&rows);

        assert_eq!(report.rows.len(), rows.len());
        assert_eq!(report.rows, grid);
        assert_eq!(report.rows[1].cells(), ["Valve-7", "-", "-", "40", "-"]);
    }

    #[test]
    fn test_report_header_and_summary() {
        let stats = StatsSummary {
            total_count: 1,
            avg_pressure: 120.0,
            avg_temp: 80.5,
            ..Default::default()
        };
        let report = build_report(Some(&stats), &[], fixed_time());

        assert_eq!(report.title, "Chemical Equipment Report");
        assert_eq!(report.generated_line(), "Generated on: 2026-01-18 09:30:00");
        assert_eq!(
            report.summary,
            vec![
                "Total Count: 1".to_string(),
                "Avg Pressure: 120 psi".to_string(),
                "Avg Temperature: 80.5 C".to_string(),
            ]
        );
        assert_eq!(report.columns, ["Name", "Type", "Pressure", "Temp", "Status"]);
    }

    #[test]
    fn test_report_without_stats() {
        let report = build_report(None, &[], fixed_time());
        assert!(report.summary.is_empty());
        assert!(report.rows.is_empty());
    }
}
