//! JSONレポート出力

use crate::error::Result;
use crate::evaluator::EvaluationReport;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub fn write_report(report: &EvaluationReport, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// 出力済みレポートを読み込み
pub fn read_report(path: &Path) -> Result<EvaluationReport> {
    let file = File::open(path)?;
    let report = serde_json::from_reader(BufReader::new(file))?;
    Ok(report)
}
