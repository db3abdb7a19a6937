use crate::error::{ChemVisError, Result};
use chemvis_common::ReportSpec;
use printpdf::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 14.0;

/// 表のレイアウト（上端からの距離、mm）
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub first_page_start_mm: f32,
    pub next_page_start_mm: f32,
    pub bottom_limit_mm: f32,
    pub row_height_mm: f32,
    pub column_x_mm: [f32; 5],
    pub column_chars: [usize; 5],
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            first_page_start_mm: 60.0,
            next_page_start_mm: 20.0,
            bottom_limit_mm: A4_HEIGHT_MM - MARGIN_MM,
            row_height_mm: 7.0,
            column_x_mm: [MARGIN_MM, 70.0, 110.0, 140.0, 168.0],
            column_chars: [30, 20, 14, 13, 14],
        }
    }
}

impl TableLayout {
    /// 見出し行を除いて1ページに入る行数
    pub fn rows_per_page(&self, first_page: bool) -> usize {
        let start = if first_page {
            self.first_page_start_mm
        } else {
            self.next_page_start_mm
        };
        let usable = self.bottom_limit_mm - start - self.row_height_mm;
        (usable / self.row_height_mm).floor().max(1.0) as usize
    }

    /// 行をページに振り分け（ページごとの行数）
    pub fn paginate(&self, total_rows: usize) -> Vec<usize> {
        let mut pages = Vec::new();
        let mut remaining = total_rows;
        let mut first = true;
        loop {
            let capacity = self.rows_per_page(first);
            let take = remaining.min(capacity);
            pages.push(take);
            remaining -= take;
            first = false;
            if remaining == 0 {
                break;
            }
        }
        pages
    }
}

/// 列幅に収まるよう切り詰め
pub fn fit_cell(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut fitted: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    fitted.push('~');
    fitted
}

/// 上端基準のmmをPDF座標に変換
fn from_top(y_mm: f32) -> Mm {
    Mm(A4_HEIGHT_MM - y_mm)
}

pub fn generate_pdf(report: &ReportSpec, output_path: &Path) -> Result<()> {
    let layout = TableLayout::default();

    let (doc, page1, layer1) = PdfDocument::new(
        report.title.as_str(),
        Mm(A4_WIDTH_MM),
        Mm(A4_HEIGHT_MM),
        "Layer 1",
    );

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ChemVisError::PdfGeneration(format!("font: {:?}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ChemVisError::PdfGeneration(format!("font: {:?}", e)))?;

    let mut layer = doc.get_page(page1).get_layer(layer1);

    // ヘッダ
    layer.use_text(report.title.as_str(), 16.0, Mm(MARGIN_MM), from_top(20.0), &bold);
    layer.use_text(report.generated_line(), 10.0, Mm(MARGIN_MM), from_top(28.0), &font);
    for (i, line) in report.summary.iter().enumerate() {
        layer.use_text(line.as_str(), 10.0, Mm(MARGIN_MM), from_top(40.0 + i as f32 * 6.0), &font);
    }

    // 表
    let mut rows = report.rows.iter();
    for (page_index, count) in layout.paginate(report.rows.len()).into_iter().enumerate() {
        let start = if page_index == 0 {
            layout.first_page_start_mm
        } else {
            let (page, page_layer) = doc.add_page(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Layer 1");
            layer = doc.get_page(page).get_layer(page_layer);
            layout.next_page_start_mm
        };

        for (col, header) in report.columns.iter().enumerate() {
            layer.use_text(*header, 10.0, Mm(layout.column_x_mm[col]), from_top(start), &bold);
        }

        for slot in 0..count {
            let Some(row) = rows.next() else { break };
            let y = start + (slot + 1) as f32 * layout.row_height_mm;
            for (col, cell) in row.cells().iter().enumerate() {
                layer.use_text(
                    fit_cell(cell, layout.column_chars[col]),
                    9.0,
                    Mm(layout.column_x_mm[col]),
                    from_top(y),
                    &font,
                );
            }
        }
    }

    // 保存
    let file = File::create(output_path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| ChemVisError::PdfGeneration(format!("save: {:?}", e)))?;

    Ok(())
}
