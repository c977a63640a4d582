use crate::loader::Source;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "geo-eval")]
#[command(about = "ジオコーディング・位置推定結果の誤差評価・地図生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 正解JSONLと予測JSONLをIDで突き合わせて誤差を評価
    Evaluate {
        /// 正解データ（ファイルパスまたはURL）
        #[arg(short, long, required = true)]
        truth: Source,

        /// 予測データ（ファイルパスまたはURL）
        #[arg(short, long, required = true)]
        predictions: Source,

        /// 出力ファイル/ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (json/excel/html/all)
        #[arg(short, long, default_value = "all")]
        format: ExportFormat,

        /// 地図・ファイルのタイトル
        #[arg(long, default_value = "geoguessr-evaluation")]
        title: String,
    },

    /// 複数のCSV（モデルごと）を正解CSVと比較
    Compare {
        /// 入力CSV（ファイルパスまたはURL）
        sources: Vec<Source>,

        /// 入力CSVを含むフォルダ
        #[arg(long)]
        folder: Option<PathBuf>,

        /// 正解CSV（省略時は設定の truth_source と同名のソース）
        #[arg(short, long)]
        truth: Option<Source>,

        /// 出力ファイル/ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (json/excel/html/all)
        #[arg(short, long, default_value = "all")]
        format: ExportFormat,

        /// 地図・ファイルのタイトル
        #[arg(long, default_value = "geocoding-comparison")]
        title: String,
    },

    /// 設定を表示/初期化
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 既定値で設定ファイルを作成
        #[arg(long)]
        init: bool,

        /// 設定ファイルのパスを表示
        #[arg(long)]
        path: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Excel,
    Html,
    #[default]
    All,
}

impl ExportFormat {
    pub fn includes_json(&self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::All)
    }

    pub fn includes_excel(&self) -> bool {
        matches!(self, ExportFormat::Excel | ExportFormat::All)
    }

    pub fn includes_html(&self) -> bool {
        matches!(self, ExportFormat::Html | ExportFormat::All)
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "html" | "map" => Ok(ExportFormat::Html),
            "all" => Ok(ExportFormat::All),
            _ => Err(format!("Unknown format: {}. Use json, excel, html, or all", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Excel => write!(f, "excel"),
            ExportFormat::Html => write!(f, "html"),
            ExportFormat::All => write!(f, "all"),
        }
    }
}
