//! ジオコーディング・位置推定結果の誤差評価ライブラリ
//!
//! 共通ロジックは geo_eval_common、入出力はこのクレートで扱う

pub mod cli;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod loader;
pub mod map;
pub mod scanner;
