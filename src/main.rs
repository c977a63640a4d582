use anyhow::Context;
use clap::Parser;
use geo_eval_rust::{cli, config, evaluator, export, loader, map, scanner};
use cli::{Cli, Commands};
use config::Config;
use evaluator::EvaluationReport;
use geo_eval_rust::error::{GeoEvalError, Result};
use loader::{LoadedSource, Source, SourceFormat};
use map::MapDocument;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("設定ファイルの読み込みに失敗しました")?;

    match cli.command {
        Commands::Evaluate { truth, predictions, output, format, title } => {
            println!("🌍 geo-eval - 位置推定の誤差評価\n");

            // 1. 読み込み
            println!("[1/3] データを読み込み中...");
            let sources = vec![truth.clone(), predictions.clone()];
            let loaded = loader::load_sources(&sources, &config.csv_columns).await;
            report_failures(&loaded.failures);

            let mut loaded_sets = loaded.loaded;
            let truth_set = evaluator::take_source(&mut loaded_sets, &truth, SourceFormat::Jsonl);
            let prediction_set =
                evaluator::take_source(&mut loaded_sets, &predictions, SourceFormat::Jsonl);
            println!(
                "✔ 正解 {}件 / 予測 {}件\n",
                truth_set.records.len(),
                prediction_set.records.len()
            );

            // 2. 突き合わせ
            println!("[2/3] 突き合わせ中...");
            let report = evaluator::evaluate(
                &truth_set,
                std::slice::from_ref(&prediction_set),
                &config.thresholds_km,
                &loaded.failures,
            );
            print_summary(&report);

            // 3. 出力
            println!("[3/3] 結果を出力中...");
            let pairs = report
                .sources
                .first()
                .map(|s| s.pairs.as_slice())
                .unwrap_or_default();
            let map = MapDocument::from_pairs(&title, pairs, &config.map);
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            export::export_results(&report, &map, &config.map, &format, &output_dir, &title)?;

            println!("\n✅ 評価完了");
        }

        Commands::Compare { sources, folder, truth, output, format, title } => {
            println!("🗺  geo-eval - ジオコーディング比較\n");

            // 1. 入力の列挙
            println!("[1/4] 入力ファイルを確認中...");
            let inputs = collect_compare_sources(sources, folder.as_deref(), truth.as_ref())?;
            println!("✔ {}ファイル\n", inputs.len());

            // 2. 読み込み
            println!("[2/4] データを読み込み中...");
            let loaded = loader::load_sources(&inputs, &config.csv_columns).await;
            report_failures(&loaded.failures);
            println!("✔ {}ファイル読み込み完了\n", loaded.loaded.len());

            // 3. 比較
            println!("[3/4] 正解と比較中...");
            let truth_name = truth
                .as_ref()
                .map(|t| t.name())
                .unwrap_or_else(|| config.truth_source.clone());

            let map = MapDocument::from_sources(&title, &loaded.loaded, &config.map, &truth_name);

            let (truth_set, predictions) = evaluator::split_truth(loaded.loaded, &truth_name);
            let truth_set = truth_set.unwrap_or_else(|| {
                println!("⚠ 正解ソース '{}' が見つかりません（誤差は計算されません）", truth_name);
                LoadedSource {
                    name: truth_name.clone(),
                    origin: String::new(),
                    format: SourceFormat::Csv,
                    records: Vec::new(),
                    skipped: 0,
                }
            });

            let report = evaluator::evaluate(
                &truth_set,
                &predictions,
                &config.thresholds_km,
                &loaded.failures,
            );
            print_summary(&report);

            // 4. 出力
            println!("[4/4] 結果を出力中...");
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            export::export_results(&report, &map, &config.map, &format, &output_dir, &title)?;

            println!("\n✅ 比較完了");
        }

        Commands::Config { show, init, path } => {
            if init {
                let saved = Config::default().save()?;
                println!("✔ 設定ファイルを作成しました: {}", saved.display());
            }

            if path {
                println!("{}", Config::config_path()?.display());
            }

            if show || !(init || path) {
                println!("設定:");
                println!("  正解ソース名: {}", config.truth_source);
                println!("  しきい値(km): {:?}", config.thresholds_km);
                println!(
                    "  CSV列: {} / {} / {}",
                    config.csv_columns.id, config.csv_columns.latitude, config.csv_columns.longitude
                );
                println!("  タイル: {}", config.map.tile_url);
                println!("  配色: {} ソース登録済み", config.map.palette.len());
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// compare の入力を集める（引数 + フォルダ + 正解）
fn collect_compare_sources(
    mut sources: Vec<Source>,
    folder: Option<&std::path::Path>,
    truth: Option<&Source>,
) -> Result<Vec<Source>> {
    if let Some(folder) = folder {
        let files = scanner::scan_folder(folder, &[SourceFormat::Csv])?;
        sources.extend(files.iter().map(|f| f.to_source()));
    }

    if let Some(truth) = truth {
        if !sources.contains(truth) {
            sources.insert(0, truth.clone());
        }
    }

    let mut unique = Vec::with_capacity(sources.len());
    for source in sources {
        if !unique.contains(&source) {
            unique.push(source);
        }
    }

    if unique.is_empty() {
        return Err(GeoEvalError::NoSourcesFound(
            "CSVファイルまたは --folder を指定してください".into(),
        ));
    }

    Ok(unique)
}

fn report_failures(failures: &[loader::LoadFailure]) {
    for failure in failures {
        println!("⚠ 読み込み失敗: {}", failure);
    }
}

fn print_summary(report: &EvaluationReport) {
    println!("✔ 正解: {} ({}件)", report.truth_source, report.truth_count);
    for source in &report.sources {
        let summary = &source.summary;
        let fmt_km = |v: Option<f64>| v.map(|v| format!("{:.2} km", v)).unwrap_or_else(|| "-".into());
        println!(
            "  {}: 一致 {}件 / 未一致 {}件 / 不正 {}件 / 平均 {} / 中央値 {}",
            source.source,
            summary.count,
            source.unmatched,
            source.invalid,
            fmt_km(summary.mean_km),
            fmt_km(summary.median_km),
        );
        for hit in &summary.within {
            println!("    ≤ {} km: {}件 ({:.1}%)", hit.threshold_km, hit.count, hit.ratio * 100.0);
        }
    }
    println!();
}
