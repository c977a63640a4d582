//! Excel生成
//!
//! Summaryシート（ソースごとの集計）と、ソースごとのペア一覧シートを出力

use crate::error::{GeoEvalError, Result};
use crate::evaluator::{EvaluationReport, SourceEvaluation};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use std::collections::HashSet;
use std::path::Path;

const SUMMARY_SHEET: &str = "Summary";
const MAX_SHEET_NAME_CHARS: usize = 31;
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

const PAIR_HEADERS: &[&str] = &[
    "ID",
    "Truth",
    "Truth Lat",
    "Truth Lon",
    "Prediction",
    "Pred Lat",
    "Pred Lon",
    "Error (km)",
    "Notes",
];

pub fn generate_excel(report: &EvaluationReport, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    write_workbook(&mut workbook, report)
        .map_err(|e| GeoEvalError::ExcelGeneration(format!("シート作成エラー: {}", e)))?;
    workbook
        .save(output_path)
        .map_err(|e| GeoEvalError::ExcelGeneration(format!("保存エラー: {}", e)))?;
    Ok(())
}

struct Formats {
    header: Format,
    km: Format,
    ratio: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_font_color(Color::RGB(0x333333))
                .set_background_color(Color::RGB(0xF5F5F5))
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Hair)
                .set_border_color(Color::RGB(0xAAAAAA)),
            km: Format::new().set_num_format("0.00"),
            ratio: Format::new().set_num_format("0.0%"),
        }
    }
}

fn write_workbook(workbook: &mut Workbook, report: &EvaluationReport) -> std::result::Result<(), XlsxError> {
    let formats = Formats::new();

    let summary = workbook.add_worksheet();
    summary.set_name(SUMMARY_SHEET)?;
    write_summary(summary, report, &formats)?;

    let mut used_names: HashSet<String> = HashSet::new();
    used_names.insert(SUMMARY_SHEET.to_lowercase());

    for (index, evaluation) in report.sources.iter().enumerate() {
        let name = unique_sheet_name(&evaluation.source, index, &mut used_names);
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        write_pairs(worksheet, evaluation, &formats)?;
    }

    Ok(())
}

fn write_summary(
    sheet: &mut Worksheet,
    report: &EvaluationReport,
    formats: &Formats,
) -> std::result::Result<(), XlsxError> {
    let thresholds: Vec<f64> = report
        .sources
        .first()
        .map(|s| s.summary.within.iter().map(|h| h.threshold_km).collect())
        .unwrap_or_default();

    let mut headers: Vec<String> = [
        "Source",
        "Matched",
        "Unmatched",
        "Invalid",
        "Skipped rows",
        "Mean (km)",
        "Median (km)",
        "Min (km)",
        "Max (km)",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    headers.extend(thresholds.iter().map(|t| format!("≤ {} km", t)));

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &formats.header)?;
    }

    for (i, evaluation) in report.sources.iter().enumerate() {
        let row = (i + 1) as u32;
        let summary = &evaluation.summary;

        sheet.write_string(row, 0, &evaluation.source)?;
        sheet.write_number(row, 1, summary.count as f64)?;
        sheet.write_number(row, 2, evaluation.unmatched as f64)?;
        sheet.write_number(row, 3, evaluation.invalid as f64)?;
        sheet.write_number(row, 4, evaluation.skipped_rows as f64)?;

        let stats = [summary.mean_km, summary.median_km, summary.min_km, summary.max_km];
        for (offset, value) in stats.iter().enumerate() {
            let col = 5 + offset as u16;
            match value {
                Some(v) => sheet.write_number_with_format(row, col, *v, &formats.km)?,
                None => sheet.write_string(row, col, "-")?,
            };
        }

        for (offset, hit) in summary.within.iter().enumerate() {
            sheet.write_number_with_format(row, 9 + offset as u16, hit.ratio, &formats.ratio)?;
        }
    }

    let footer = (report.sources.len() + 2) as u32;
    sheet.write_string(footer, 0, format!("Truth: {} ({} records)", report.truth_source, report.truth_count))?;
    sheet.write_string(footer + 1, 0, format!("Generated: {}", report.generated_at))?;
    for (i, failure) in report.failures.iter().enumerate() {
        sheet.write_string(footer + 2 + i as u32, 0, format!("Failed: {}", failure))?;
    }

    sheet.set_column_width(0, 36)?;
    sheet.set_freeze_panes(1, 1)?;
    Ok(())
}

fn write_pairs(
    sheet: &mut Worksheet,
    evaluation: &SourceEvaluation,
    formats: &Formats,
) -> std::result::Result<(), XlsxError> {
    for (col, header) in PAIR_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &formats.header)?;
    }

    for (i, pair) in evaluation.pairs.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, &pair.id)?;
        sheet.write_string(row, 1, &pair.truth.label)?;
        sheet.write_number(row, 2, pair.truth.latitude)?;
        sheet.write_number(row, 3, pair.truth.longitude)?;
        sheet.write_string(row, 4, &pair.prediction.label)?;
        sheet.write_number(row, 5, pair.prediction.latitude)?;
        sheet.write_number(row, 6, pair.prediction.longitude)?;
        sheet.write_number_with_format(row, 7, pair.error_km, &formats.km)?;
        if let Some(notes) = &pair.prediction.notes {
            sheet.write_string(row, 8, notes)?;
        }
    }

    sheet.set_column_width(0, 30)?;
    sheet.set_column_width(1, 30)?;
    sheet.set_column_width(4, 30)?;
    sheet.set_column_width(8, 40)?;
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Excelのシート名制約に合わせる（31文字以内・禁止文字除去・重複回避）
pub fn unique_sheet_name(source: &str, index: usize, used: &mut HashSet<String>) -> String {
    let cleaned: String = source
        .chars()
        .filter(|c| !INVALID_SHEET_CHARS.contains(c))
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    let base = if cleaned.is_empty() {
        format!("Source{}", index + 1)
    } else {
        cleaned
    };

    let mut candidate: String = base.chars().take(MAX_SHEET_NAME_CHARS).collect();
    let mut suffix = 2;
    while used.contains(&candidate.to_lowercase()) {
        let tail = format!("~{}", suffix);
        let keep = MAX_SHEET_NAME_CHARS - tail.chars().count();
        candidate = base.chars().take(keep).collect::<String>() + &tail;
        suffix += 1;
    }

    used.insert(candidate.to_lowercase());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_name_strips_invalid_chars() {
        let mut used = HashSet::new();
        assert_eq!(unique_sheet_name("a/b:c*d?", 0, &mut used), "abcd");
    }

    #[test]
    fn test_sheet_name_truncates() {
        let mut used = HashSet::new();
        let name = unique_sheet_name("llama_4_maverick_17B_128E_instruct", 0, &mut used);
        assert_eq!(name, "llama_4_maverick_17B_128E_instr");
        assert_eq!(name.chars().count(), 31);
    }

    #[test]
    fn test_sheet_name_unique() {
        let mut used = HashSet::new();
        used.insert("summary".to_string());

        assert_eq!(unique_sheet_name("Summary", 0, &mut used), "Summary~2");
        assert_eq!(unique_sheet_name("model", 1, &mut used), "model");
        assert_eq!(unique_sheet_name("MODEL", 2, &mut used), "MODEL~2");
        assert_eq!(unique_sheet_name("[]", 3, &mut used), "Source4");
    }
}
