use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoEvalError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("取得エラー: {0}")]
    Fetch(String),

    #[error("未対応の形式です（.csv / .jsonl のみ）: {0}")]
    UnsupportedFormat(String),

    #[error("CSVに必須列がありません: {0}")]
    MissingColumn(String),

    #[error("CSV解析エラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("入力ファイルが指定されていません: {0}")]
    NoSourcesFound(String),

    #[error(transparent)]
    Common(#[from] geo_eval_common::Error),
}

pub type Result<T> = std::result::Result<T, GeoEvalError>;
