pub mod excel;
pub mod html;
pub mod json;

use crate::cli::ExportFormat;
use crate::config::MapStyle;
use crate::error::Result;
use crate::evaluator::EvaluationReport;
use crate::map::MapDocument;
use std::path::{Path, PathBuf};

/// 出力先パスを決める
///
/// ディレクトリまたは拡張子なし → `<output>/<title>.<ext>`
/// 複数形式の同時出力時は拡張子だけ差し替える
fn output_path_for(output: &Path, title: &str, extension: &str, multiple: bool) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", file_stem_for(title), extension))
    } else if multiple {
        output.with_extension(extension)
    } else {
        output.to_path_buf()
    }
}

/// タイトルをファイル名に使える形にする
fn file_stem_for(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    if stem.is_empty() { "geo-eval".into() } else { stem }
}

/// 評価結果を指定形式で出力
///
/// 出力したファイルのパスを返す
pub fn export_results(
    report: &EvaluationReport,
    map: &MapDocument,
    style: &MapStyle,
    format: &ExportFormat,
    output: &Path,
    title: &str,
) -> Result<Vec<PathBuf>> {
    let multiple = matches!(format, ExportFormat::All);
    let mut written = Vec::new();

    if format.includes_json() {
        let path = prepare(output_path_for(output, title, "json", multiple))?;
        println!("- JSONレポートを出力中...");
        json::write_report(report, &path)?;
        println!("✔ JSON出力: {}", path.display());
        written.push(path);
    }

    if format.includes_excel() {
        let path = prepare(output_path_for(output, title, "xlsx", multiple))?;
        println!("- Excelを生成中...");
        excel::generate_excel(report, &path)?;
        println!("✔ Excel出力: {}", path.display());
        written.push(path);
    }

    if format.includes_html() {
        let path = prepare(output_path_for(output, title, "html", multiple))?;
        println!("- 地図HTMLを生成中... ({}マーカー)", map.marker_count());
        html::generate_html(map, style, &path)?;
        println!("✔ HTML出力: {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// 親ディレクトリを作成
fn prepare(path: PathBuf) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(path)
}
