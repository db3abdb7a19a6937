pub mod pdf;
pub mod excel;

use crate::cli::ExportFormat;
use crate::error::Result;
use chemvis_common::{ReportSpec, REPORT_FILE_NAME};
use std::path::{Path, PathBuf};

fn report_stem() -> &'static str {
    REPORT_FILE_NAME.trim_end_matches(".pdf")
}

fn output_path_for_format(output: &Path, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", report_stem(), extension))
    } else {
        output.to_path_buf()
    }
}

fn output_paths_for_both(output: &Path) -> (PathBuf, PathBuf) {
    if output.is_dir() || output.extension().is_none() {
        let pdf_path = output.join(format!("{}.pdf", report_stem()));
        let excel_path = output.join(format!("{}.xlsx", report_stem()));
        (pdf_path, excel_path)
    } else {
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(report_stem());
        let pdf_path = parent.join(format!("{}.pdf", stem));
        let excel_path = parent.join(format!("{}.xlsx", stem));
        (pdf_path, excel_path)
    }
}

/// レポートを出力して、書き出したパスを返す
pub fn export_report(report: &ReportSpec, format: &ExportFormat, output: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    match format {
        ExportFormat::Pdf => {
            let output_path = output_path_for_format(output, "pdf");
            pdf::generate_pdf(report, &output_path)?;
            written.push(output_path);
        }
        ExportFormat::Excel => {
            let output_path = output_path_for_format(output, "xlsx");
            excel::generate_excel(report, &output_path)?;
            written.push(output_path);
        }
        ExportFormat::Both => {
            let (pdf_path, excel_path) = output_paths_for_both(output);
            pdf::generate_pdf(report, &pdf_path)?;
            written.push(pdf_path);
            excel::generate_excel(report, &excel_path)?;
            written.push(excel_path);
        }
    }

    for path in &written {
        tracing::info!(path = %path.display(), rows = report.rows.len(), "report written");
    }
    Ok(written)
}
