//! Excel生成
//!
//! PDFと同じ `ReportSpec` から1シートのブックを作る。

use crate::error::{ChemVisError, Result};
use chemvis_common::types::MISSING_TEXT;
use chemvis_common::ReportSpec;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

const SHEET_NAME: &str = "Equipment";
const COLUMN_WIDTHS: [f64; 5] = [28.0, 20.0, 12.0, 12.0, 12.0];

fn xlsx_error(err: XlsxError) -> ChemVisError {
    ChemVisError::ExcelGeneration(err.to_string())
}

/// 表の開始行（タイトル・生成日時・集計値の後ろ）
pub fn table_start_row(report: &ReportSpec) -> u32 {
    // タイトル + 生成日時 + 空行
    let mut row = 3;
    if !report.summary.is_empty() {
        row += report.summary.len() as u32 + 1;
    }
    row
}

pub fn generate_excel(report: &ReportSpec, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let title_format = Format::new().set_bold().set_font_size(14);

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(xlsx_error)?;

    sheet
        .write_string_with_format(0, 0, report.title.as_str(), &title_format)
        .map_err(xlsx_error)?;
    sheet
        .write_string(1, 0, report.generated_line())
        .map_err(xlsx_error)?;

    for (i, line) in report.summary.iter().enumerate() {
        sheet
            .write_string(3 + i as u32, 0, line.as_str())
            .map_err(xlsx_error)?;
    }

    let header_row = table_start_row(report);
    for (col, header) in report.columns.iter().enumerate() {
        sheet
            .write_string_with_format(header_row, col as u16, *header, &bold)
            .map_err(xlsx_error)?;
        sheet
            .set_column_width(col as u16, COLUMN_WIDTHS[col])
            .map_err(xlsx_error)?;
    }

    for (i, row) in report.rows.iter().enumerate() {
        let excel_row = header_row + 1 + i as u32;
        for (col, cell) in row.cells().iter().enumerate() {
            // 圧力・温度は数値として書く（欠損は "-" のまま）
            let numeric = if (2..=3).contains(&col) && *cell != MISSING_TEXT {
                cell.parse::<f64>().ok()
            } else {
                None
            };
            match numeric {
                Some(value) => sheet.write_number(excel_row, col as u16, value),
                None => sheet.write_string(excel_row, col as u16, *cell),
            }
            .map_err(xlsx_error)?;
        }
    }

    workbook.save(output_path).map_err(xlsx_error)?;
    Ok(())
}
