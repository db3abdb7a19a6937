//! ChemVis Common Library
//!
//! 画面状態マシンと表示用データ整形（CLIと共有、I/Oなし）

pub mod types;
pub mod shaper;
pub mod report;
pub mod state;
pub mod error;

pub use types::{
    AuthResponse, DisplayField, EquipmentRow, Field, HistoryEntry, HistoryItemResponse,
    HistoryResponse, StatsSummary, TypeDistribution, UploadResponse, DISPLAY_FIELDS,
};
pub use shaper::{build_bar_series, build_pie_series, grid_rows, kpis, resolve_field, BarSeries, GridRow, PieSeries};
pub use report::{build_report, ReportSpec, REPORT_FILE_NAME};
pub use state::{AppState, AuthMode, Delivery, RequestKind, RequestTicket, Session, ViewState};
pub use error::{Error, Result};
