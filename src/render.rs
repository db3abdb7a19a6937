//! 端末向けテキスト描画
//!
//! すべて純粋関数。状態（`AppState`）を受け取って文字列を返すだけで、
//! 出力先には触れない。

use chemvis_common::shaper::{format_number, kpis, StatusBadge};
use chemvis_common::types::MISSING_TEXT;
use chemvis_common::{
    build_bar_series, build_pie_series, grid_rows, AppState, AuthMode, BarSeries, GridRow,
    HistoryEntry, PieSeries, StatsSummary, ViewState, DISPLAY_FIELDS,
};
use std::fmt::Write;

pub const APP_TITLE: &str = "ChemVis";
pub const EMPTY_PLACEHOLDER: &str = "Upload a CSV file to view analytics.";
const BAR_WIDTH: usize = 30;
const LABEL_WIDTH: usize = 16;

pub fn render_intro() -> String {
    format!(
        "{}\nChemical equipment analytics dashboard.\nUpload equipment CSV files and review pressure, temperature and type distribution.\n",
        APP_TITLE
    )
}

pub fn render_auth_form(mode: AuthMode, error: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", mode.title());
    if let Some(error) = error {
        let _ = writeln!(out, "✖ {}", error);
    }
    out
}

pub fn render_header(username: &str) -> String {
    format!("{} | Welcome, {}", APP_TITLE, username)
}

pub fn render_kpis(stats: &StatsSummary) -> String {
    kpis(stats)
        .iter()
        .map(|kpi| match kpi.unit {
            Some(unit) => format!("[{}: {} {}]", kpi.title, kpi.value, unit),
            None => format!("[{}: {}]", kpi.title, kpi.value),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn bar(value: Option<f64>, max: f64) -> String {
    match value {
        None => MISSING_TEXT.to_string(),
        Some(v) => {
            let len = if max > 0.0 {
                ((v.max(0.0) / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            format!("{} {}", "█".repeat(len.min(BAR_WIDTH)), format_number(v))
        }
    }
}

fn pad(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count >= width {
        text.chars().take(width).collect()
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

/// 圧力・温度の横棒グラフ（欠損は "-"）
pub fn render_bar_chart(series: &BarSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Pressure / Temperature");
    let max = series.max_value().unwrap_or(0.0);
    for (i, label) in series.labels.iter().enumerate() {
        let _ = writeln!(
            out,
            "{} P {}",
            pad(label, LABEL_WIDTH),
            bar(series.pressure.get(i).copied().flatten(), max)
        );
        let _ = writeln!(
            out,
            "{} T {}",
            " ".repeat(LABEL_WIDTH),
            bar(series.temperature.get(i).copied().flatten(), max)
        );
    }
    out
}

pub fn render_pie(series: &PieSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Type Distribution");
    for (i, label) in series.labels.iter().enumerate() {
        let _ = writeln!(
            out,
            "■ {} {} {} ({:.1}%)",
            series.color_for(i),
            pad(label, LABEL_WIDTH),
            series.values.get(i).copied().unwrap_or(0),
            series.share(i)
        );
    }
    out
}

pub fn render_grid(rows: &[GridRow]) -> String {
    let widths = [20usize, 16, 10, 10, 12];
    let mut out = String::new();

    let header: Vec<String> = DISPLAY_FIELDS
        .iter()
        .zip(widths)
        .map(|(field, w)| pad(field.header(), w))
        .collect();
    let _ = writeln!(out, "{}", header.join(" ").trim_end());
    let _ = writeln!(out, "{}", "-".repeat(widths.iter().sum::<usize>() + widths.len() - 1));

    for row in rows {
        let cells = row.cells();
        let mut line: Vec<String> = cells[..4]
            .iter()
            .zip(widths)
            .map(|(cell, w)| pad(cell, w))
            .collect();
        let status = if row.status == MISSING_TEXT {
            row.status.clone()
        } else {
            format!("{} {}", StatusBadge::from_status(&row.status).marker(), row.status)
        };
        line.push(status);
        let _ = writeln!(out, "{}", line.join(" "));
    }
    out
}

pub fn render_history(history: &[HistoryEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Recent Uploads");
    if history.is_empty() {
        let _ = writeln!(out, "  (none)");
        return out;
    }
    for (i, entry) in history.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}  {}", i + 1, entry.file_name, entry.uploaded_date());
    }
    out
}

/// ダッシュボード画面全体
pub fn render_dashboard(state: &AppState) -> String {
    let dashboard = state.dashboard();
    let mut sections = Vec::new();

    let username = state.session().map(|s| s.username.as_str()).unwrap_or("");
    sections.push(render_header(username));

    if let Some(error) = &dashboard.error {
        sections.push(format!("✖ {}", error));
    }
    if let Some(path) = &dashboard.selected_file {
        let suffix = if dashboard.uploading { " (uploading...)" } else { "" };
        sections.push(format!("Selected: {}{}", path.display(), suffix));
    }

    if let Some(stats) = &dashboard.stats {
        sections.push(render_kpis(stats));
    }

    if dashboard.rows.is_empty() {
        sections.push(EMPTY_PLACEHOLDER.to_string());
    } else {
        sections.push(render_bar_chart(&build_bar_series(&dashboard.rows)));
        if let Some(stats) = &dashboard.stats {
            sections.push(render_pie(&build_pie_series(stats)));
        }
        sections.push(render_grid(&grid_rows(&dashboard.rows)));
    }

    sections.push(render_history(&dashboard.history));
    sections
        .iter()
        .map(|s| s.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 現在の画面
pub fn render(state: &AppState) -> String {
    match state.view() {
        ViewState::Intro => render_intro(),
        ViewState::AuthForm(mode) => render_auth_form(mode, state.auth_error()),
        ViewState::Dashboard => render_dashboard(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemvis_common::{EquipmentRow, Session, TypeDistribution, UploadResponse};

    fn pump_stats() -> StatsSummary {
        StatsSummary {
            total_count: 1,
            avg_pressure: 120.0,
            avg_temp: 80.0,
            type_distribution: TypeDistribution::from_pairs([("Pump", 1)]),
        }
    }

    #[test]
    fn test_kpis_line() {
        let text = render_kpis(&pump_stats());
        assert_eq!(
            text,
            "[Total Equipment: 1]  [Avg Pressure: 120 psi]  [Avg Temp: 80 °C]"
        );
    }

    #[test]
    fn test_bar_chart_gap() {
        let rows = vec![
            EquipmentRow::new()
                .with("Equipment Name", "Pump-1")
                .with("Pressure", 120)
                .with("Temperature", 80),
            EquipmentRow::new().with("Equipment Name", "Valve-2"),
        ];
        let text = render_bar_chart(&build_bar_series(&rows));
        assert!(text.contains("Pump-1"));
        assert!(text.contains("120"));
        let valve_line = text.lines().find(|l| l.starts_with("Valve-2")).unwrap();
        assert!(valve_line.ends_with(" P -"));
    }

    #[test]
    fn test_pie_share_and_color() {
        let text = render_pie(&build_pie_series(&pump_stats()));
        assert!(text.contains("#FF6384"));
        assert!(text.contains("(100.0%)"));
    }

    #[test]
    fn test_grid_missing_status() {
        let rows = vec![EquipmentRow::new().with("Equipment Name", "Tank-3")];
        let text = render_grid(&grid_rows(&rows));
        let line = text.lines().nth(2).unwrap();
        assert!(line.starts_with("Tank-3"));
        assert!(line.ends_with('-'));
    }

    #[test]
    fn test_history_list() {
        let history = vec![HistoryEntry {
            id: Some(3),
            file_name: "plant.csv".into(),
            uploaded_at: "2026-01-18T09:30:00Z".into(),
            total_records: Some(4),
        }];
        let text = render_history(&history);
        assert!(text.contains("1. plant.csv  2026-01-18"));
    }

    #[test]
    fn test_intro_screen() {
        let state = AppState::startup(None);
        assert!(render(&state).starts_with(APP_TITLE));
    }

    /// ヘッダ行だけのCSV: 行は空でも集計値があればKPIは出す
    #[test]
    fn test_kpis_shown_without_rows() {
        let state = AppState::startup(Some(Session::new("tok123", "alice")))
            .proceed()
            .select_file("empty.csv");
        let (state, ticket) = state.begin_upload();
        let empty_stats = StatsSummary {
            total_count: 0,
            ..StatsSummary::default()
        };
        let (state, _) = state.upload_succeeded(
            ticket.unwrap(),
            UploadResponse {
                data: vec![],
                stats: Some(empty_stats),
                history: vec![],
            },
        );

        let screen = render(&state);
        assert!(screen.contains("[Total Equipment: 0]"));
        assert!(screen.contains(EMPTY_PLACEHOLDER));
        assert!(!screen.contains("Type Distribution"));
        assert!(!screen.contains("Pressure / Temperature"));
    }
}
