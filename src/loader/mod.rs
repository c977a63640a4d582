//! 入力ソースの読み込み
//!
//! ローカルファイルまたは http(s) URL からテキストを取得し、
//! 拡張子に応じて CSV / JSONL としてパースする。
//! 読み込みに失敗したソースは記録だけして処理を続ける。

pub mod table;

use crate::config::CsvColumns;
use crate::error::{GeoEvalError, Result};
use geo_eval_common::{parse_jsonl, GeoRecord, ParsedRecords};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 入力ソース
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(String),
}

impl Source {
    /// ソース名（ファイル名の拡張子なし）
    pub fn name(&self) -> String {
        let file_name = match self {
            Source::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            Source::Url(url) => url_file_name(url).to_string(),
        };
        Path::new(&file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or(file_name)
    }

    pub fn format(&self) -> Result<SourceFormat> {
        let file_name = match self {
            Source::Path(path) => path.to_string_lossy().to_string(),
            Source::Url(url) => url_file_name(url).to_string(),
        };
        let ext = Path::new(&file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(SourceFormat::Csv),
            Some("jsonl") | Some("ndjson") => Ok(SourceFormat::Jsonl),
            _ => Err(GeoEvalError::UnsupportedFormat(self.to_string())),
        }
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Source must not be empty".into());
        }
        let lower = s.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(Source::Url(s.to_string()))
        } else {
            Ok(Source::Path(PathBuf::from(s)))
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Url(url) => write!(f, "{}", url),
        }
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

/// URLのパス末尾（クエリ・フラグメント除く）
fn url_file_name(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Jsonl,
}

/// 読み込み済みソース
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub name: String,
    pub origin: String,
    pub format: SourceFormat,
    pub records: Vec<GeoRecord>,
    /// 読み飛ばした不正行の数
    pub skipped: usize,
}

impl LoadedSource {
    /// 読み込みに失敗した場合の空ソース
    pub fn empty(source: &Source, format: SourceFormat) -> Self {
        Self {
            name: source.name(),
            origin: source.to_string(),
            format,
            records: Vec::new(),
            skipped: 0,
        }
    }
}

/// 読み込み失敗
#[derive(Debug)]
pub struct LoadFailure {
    pub origin: String,
    pub error: GeoEvalError,
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.origin, self.error)
    }
}

/// 複数ソースの読み込み結果
#[derive(Debug, Default)]
pub struct LoadResult {
    pub loaded: Vec<LoadedSource>,
    pub failures: Vec<LoadFailure>,
}

/// ソースのテキストを取得
pub async fn fetch_text(source: &Source) -> Result<String> {
    match source {
        Source::Path(path) => {
            if !path.exists() {
                return Err(GeoEvalError::FileNotFound(path.display().to_string()));
            }
            Ok(tokio::fs::read_to_string(path).await?)
        }
        Source::Url(url) => {
            let response = reqwest::get(url)
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| GeoEvalError::Fetch(format!("{}: {}", url, e)))?;
            response
                .text()
                .await
                .map_err(|e| GeoEvalError::Fetch(format!("{}: {}", url, e)))
        }
    }
}

/// テキストを形式に応じてパース
pub fn parse_text(text: &str, format: SourceFormat, columns: &CsvColumns) -> Result<ParsedRecords> {
    match format {
        SourceFormat::Csv => table::parse_csv(text, columns),
        SourceFormat::Jsonl => Ok(parse_jsonl(text)),
    }
}

/// 1ソースを読み込み
pub async fn load_source(source: &Source, columns: &CsvColumns) -> Result<LoadedSource> {
    let format = source.format()?;
    let text = fetch_text(source).await?;
    let parsed = parse_text(&text, format, columns)?;

    debug!(
        source = %source,
        records = parsed.records.len(),
        skipped = parsed.skipped,
        "ソース読み込み完了"
    );

    Ok(LoadedSource {
        name: source.name(),
        origin: source.to_string(),
        format,
        records: parsed.records,
        skipped: parsed.skipped,
    })
}

/// 複数ソースを順に読み込み
///
/// 失敗したソースは `failures` に記録し、残りの読み込みを続ける
pub async fn load_sources(sources: &[Source], columns: &CsvColumns) -> LoadResult {
    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut result = LoadResult::default();

    for source in sources {
        pb.set_message(source.name());
        match load_source(source, columns).await {
            Ok(loaded) => result.loaded.push(loaded),
            Err(error) => {
                warn!(source = %source, error = %error, "ソース読み込み失敗");
                result.failures.push(LoadFailure {
                    origin: source.to_string(),
                    error,
                });
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    result
}
