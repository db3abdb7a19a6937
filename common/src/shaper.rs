//! 表示用データ整形
//!
//! バックエンドの行データ・集計値から、チャート・グリッド・KPIの形を作る。
//! 副作用なし。ラベルと系列は同じ行配列を同じ順序で走査して作るため、
//! インデックスiは常に同じ元データ行を指す。

use crate::types::{DisplayField, EquipmentRow, Field, StatsSummary, DISPLAY_FIELDS};

/// 円グラフの固定パレット
pub const PALETTE: [&str; 5] = ["#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF"];

/// canonicalキー優先、次に別名、どちらも無ければMissing
pub fn resolve_field(row: &EquipmentRow, canonical: &str, alias: Option<&str>) -> Field {
    let exact = Field::from_value(row.get(canonical));
    if exact.is_present() {
        return exact;
    }
    match alias {
        Some(key) => Field::from_value(row.get(key)),
        None => Field::Missing,
    }
}

/// 表示フィールドを解決
pub fn resolve_display(row: &EquipmentRow, field: DisplayField) -> Field {
    resolve_field(row, field.canonical_key(), field.alias_key())
}

/// グリッド1行（レポートの表も同じ値を使う）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub name: String,
    pub equipment_type: String,
    pub pressure: String,
    pub temperature: String,
    pub status: String,
}

impl GridRow {
    pub fn from_row(row: &EquipmentRow) -> Self {
        let [name, equipment_type, pressure, temperature, status] =
            DISPLAY_FIELDS.map(|field| resolve_display(row, field).display());
        Self {
            name,
            equipment_type,
            pressure,
            temperature,
            status,
        }
    }

    /// 列順（DISPLAY_FIELDSと同じ）のセル
    pub fn cells(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.equipment_type.as_str(),
            self.pressure.as_str(),
            self.temperature.as_str(),
            self.status.as_str(),
        ]
    }
}

pub fn grid_rows(rows: &[EquipmentRow]) -> Vec<GridRow> {
    rows.iter().map(GridRow::from_row).collect()
}

/// 棒グラフ用系列
///
/// 欠損・非数値は0に丸めず `None`（ギャップ）として保持する。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    pub labels: Vec<String>,
    pub pressure: Vec<Option<f64>>,
    pub temperature: Vec<Option<f64>>,
}

impl BarSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 両系列のギャップ数
    pub fn gaps(&self) -> usize {
        self.pressure
            .iter()
            .chain(self.temperature.iter())
            .filter(|v| v.is_none())
            .count()
    }

    /// 描画スケール用の最大値
    pub fn max_value(&self) -> Option<f64> {
        self.pressure
            .iter()
            .chain(self.temperature.iter())
            .flatten()
            .copied()
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

pub fn build_bar_series(rows: &[EquipmentRow]) -> BarSeries {
    BarSeries {
        labels: rows
            .iter()
            .map(|r| resolve_display(r, DisplayField::Name).display())
            .collect(),
        pressure: rows
            .iter()
            .map(|r| resolve_display(r, DisplayField::Pressure).as_number())
            .collect(),
        temperature: rows
            .iter()
            .map(|r| resolve_display(r, DisplayField::Temperature).as_number())
            .collect(),
    }
}

/// 位置に応じたパレット色（6件目以降は色が繰り返す）
pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// 円グラフ用系列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PieSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    /// 使用するパレット色（最大5色）
    pub colors: Vec<&'static str>,
}

impl PieSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// スライスiの色
    pub fn color_for(&self, index: usize) -> &'static str {
        palette_color(index)
    }

    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }

    /// スライスiの割合（%）
    pub fn share(&self, index: usize) -> f64 {
        let total = self.total();
        match self.values.get(index) {
            Some(v) if total > 0 => *v as f64 * 100.0 / total as f64,
            _ => 0.0,
        }
    }
}

pub fn build_pie_series(stats: &StatsSummary) -> PieSeries {
    let labels: Vec<String> = stats
        .type_distribution
        .iter()
        .map(|(name, _)| name.to_string())
        .collect();
    let values = stats.type_distribution.iter().map(|(_, c)| c).collect();
    let colors = PALETTE.iter().take(labels.len()).copied().collect();
    PieSeries {
        labels,
        values,
        colors,
    }
}

/// KPIカード
#[derive(Debug, Clone, PartialEq)]
pub struct Kpi {
    pub title: &'static str,
    pub value: String,
    pub unit: Option<&'static str>,
}

pub fn kpis(stats: &StatsSummary) -> Vec<Kpi> {
    vec![
        Kpi {
            title: "Total Equipment",
            value: stats.total_count.to_string(),
            unit: None,
        },
        Kpi {
            title: "Avg Pressure",
            value: format_number(stats.avg_pressure),
            unit: Some("psi"),
        },
        Kpi {
            title: "Avg Temp",
            value: format_number(stats.avg_temp),
            unit: Some("°C"),
        },
    ]
}

/// 整数値は小数点なし: 120.0 → "120", 80.25 → "80.25"
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// ステータスバッジ（スタイル付け専用、文字列はそのまま表示する）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBadge {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl StatusBadge {
    pub fn from_status(status: &str) -> Self {
        match status.trim().to_uppercase().as_str() {
            "OK" => StatusBadge::Ok,
            "WARN" | "WARNING" => StatusBadge::Warning,
            "CRIT" | "CRITICAL" => StatusBadge::Critical,
            _ => StatusBadge::Unknown,
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            StatusBadge::Ok => "●",
            StatusBadge::Warning => "▲",
            StatusBadge::Critical => "✖",
            StatusBadge::Unknown => "?",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDistribution;
    use serde_json::json;

    fn pump_row() -> EquipmentRow {
        EquipmentRow::new()
            .with("Equipment Name", "Pump-1")
            .with("Type", "Pump")
            .with("Pressure", 120)
            .with("Temperature", 80)
            .with("Status", "OK")
    }

    #[test]
    fn test_exact_key_wins_over_alias() {
        let row = EquipmentRow::new()
            .with("Equipment Name", "Reactor-A")
            .with("name", "reactor-a");
        let field = resolve_field(&row, "Equipment Name", Some("name"));
        assert_eq!(field, Field::Present(json!("Reactor-A")));
    }

    #[test]
    fn test_alias_used_when_exact_missing_or_blank() {
        let row = EquipmentRow::new().with("pressure", 55);
        assert_eq!(resolve_display(&row, DisplayField::Pressure).as_number(), Some(55.0));

        let blank = EquipmentRow::new().with("Temperature", "").with("temp", 33);
        assert_eq!(resolve_display(&blank, DisplayField::Temperature).as_number(), Some(33.0));
    }

    #[test]
    fn test_whitespace_value_is_not_missing() {
        let row = EquipmentRow::new().with("Type", " ").with("type", "Pump");
        assert_eq!(resolve_display(&row, DisplayField::Type).display(), " ");
    }

    #[test]
    fn test_zero_is_present_not_fallthrough() {
        let row = EquipmentRow::new().with("Pressure", 0).with("pressure", 99);
        assert_eq!(resolve_display(&row, DisplayField::Pressure).as_number(), Some(0.0));
    }

    #[test]
    fn test_status_has_no_alias() {
        let row = EquipmentRow::new().with("status", "OK");
        assert_eq!(resolve_display(&row, DisplayField::Status), Field::Missing);
    }

    #[test]
    fn test_bar_series_alignment() {
        let rows = vec![
            pump_row(),
            EquipmentRow::new().with("name", "Valve-2").with("pressure", "60"),
            EquipmentRow::new().with("Equipment Name", "HX-3").with("temp", 210.5),
        ];
        let series = build_bar_series(&rows);

        assert_eq!(series.len(), 3);
        assert_eq!(series.pressure.len(), 3);
        assert_eq!(series.temperature.len(), 3);
        assert_eq!(series.labels, vec!["Pump-1", "Valve-2", "HX-3"]);
        assert_eq!(series.pressure, vec![Some(120.0), Some(60.0), None]);
        assert_eq!(series.temperature, vec![Some(80.0), None, Some(210.5)]);
        assert_eq!(series.gaps(), 2);
        assert_eq!(series.max_value(), Some(210.5));
    }

    #[test]
    fn test_bar_series_empty() {
        let series = build_bar_series(&[]);
        assert!(series.is_empty());
        assert_eq!(series.max_value(), None);
    }

    #[test]
    fn test_pie_series_colors_truncate_and_cycle() {
        let stats = StatsSummary {
            type_distribution: TypeDistribution::from_pairs([
                ("A", 1),
                ("B", 2),
                ("C", 3),
                ("D", 4),
                ("E", 5),
                ("F", 6),
                ("G", 7),
            ]),
            ..Default::default()
        };
        let pie = build_pie_series(&stats);
        assert_eq!(pie.len(), 7);
        assert_eq!(pie.values, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(pie.colors.len(), 5);
        assert_eq!(pie.color_for(5), PALETTE[0]);
        assert_eq!(pie.color_for(6), PALETTE[1]);

        let small = StatsSummary {
            type_distribution: TypeDistribution::from_pairs([("Pump", 1), ("Valve", 1)]),
            ..Default::default()
        };
        let pie = build_pie_series(&small);
        assert_eq!(pie.colors, vec!["#FF6384", "#36A2EB"]);
        assert_eq!(pie.share(0), 50.0);
    }

    #[test]
    fn test_grid_row_uses_fallbacks() {
        let row = EquipmentRow::new().with("name", "Tank-9").with("type", "Tank");
        let grid = GridRow::from_row(&row);
        assert_eq!(grid.cells(), ["Tank-9", "Tank", "-", "-", "-"]);
    }

    #[test]
    fn test_kpis() {
        let stats = StatsSummary {
            total_count: 1,
            avg_pressure: 120.0,
            avg_temp: 80.25,
            ..Default::default()
        };
        let cards = kpis(&stats);
        assert_eq!(cards[0].title, "Total Equipment");
        assert_eq!(cards[0].value, "1");
        assert_eq!(cards[1].value, "120");
        assert_eq!(cards[2].value, "80.25");
    }

    #[test]
    fn test_status_badge() {
        assert_eq!(StatusBadge::from_status("OK"), StatusBadge::Ok);
        assert_eq!(StatusBadge::from_status("warning"), StatusBadge::Warning);
        assert_eq!(StatusBadge::from_status("CRIT"), StatusBadge::Critical);
        assert_eq!(StatusBadge::from_status("UNKNOWN"), StatusBadge::Unknown);
    }
}
