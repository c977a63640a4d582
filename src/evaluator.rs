//! 誤差評価
//!
//! 正解ソースと予測ソースを突き合わせ、ソースごとの誤差統計をまとめる。
//! 正解が読めなかった場合も空の結果を返し、エラーにはしない。

use crate::loader::{LoadFailure, LoadedSource, Source, SourceFormat};
use geo_eval_common::{match_with_outcome, ErrorSummary, GeoRecord, MatchedPair};
use serde::{Deserialize, Serialize};

/// 予測ソース1つ分の評価結果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEvaluation {
    pub source: String,
    pub pairs: Vec<MatchedPair>,
    pub summary: ErrorSummary,
    /// 正解にIDが無かった予測数
    pub unmatched: usize,
    /// 座標が不正だった予測数
    pub invalid: usize,
    /// パース時に読み飛ばした行数
    pub skipped_rows: usize,
}

/// 評価レポート
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    /// 作成日時（RFC 3339）
    pub generated_at: String,
    pub truth_source: String,
    pub truth_count: usize,
    pub sources: Vec<SourceEvaluation>,
    /// 読み込みに失敗したソース
    #[serde(default)]
    pub failures: Vec<String>,
}

impl EvaluationReport {
    pub fn total_pairs(&self) -> usize {
        self.sources.iter().map(|s| s.pairs.len()).sum()
    }
}

/// 1ソースを評価
pub fn evaluate_source(
    truth: &[GeoRecord],
    prediction: &LoadedSource,
    thresholds_km: &[f64],
) -> SourceEvaluation {
    let outcome = match_with_outcome(truth, &prediction.records);
    let summary = ErrorSummary::from_pairs(&outcome.pairs, thresholds_km);

    SourceEvaluation {
        source: prediction.name.clone(),
        pairs: outcome.pairs,
        summary,
        unmatched: outcome.unmatched,
        invalid: outcome.invalid,
        skipped_rows: prediction.skipped,
    }
}

/// 正解と複数の予測ソースを評価してレポートを作成
pub fn evaluate(
    truth: &LoadedSource,
    predictions: &[LoadedSource],
    thresholds_km: &[f64],
    failures: &[LoadFailure],
) -> EvaluationReport {
    let sources = predictions
        .iter()
        .map(|p| evaluate_source(&truth.records, p, thresholds_km))
        .collect();

    EvaluationReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        truth_source: truth.name.clone(),
        truth_count: truth.records.len(),
        sources,
        failures: failures.iter().map(|f| f.to_string()).collect(),
    }
}

/// 読み込み済みソースから正解を取り出す
///
/// 名前が一致するものを正解とし、残りを予測として返す
pub fn split_truth(
    mut sources: Vec<LoadedSource>,
    truth_name: &str,
) -> (Option<LoadedSource>, Vec<LoadedSource>) {
    match sources.iter().position(|s| s.name == truth_name) {
        Some(idx) => {
            let truth = sources.remove(idx);
            (Some(truth), sources)
        }
        None => (None, sources),
    }
}

/// 読み込み結果から指定ソースを取り出す
///
/// 読み込みに失敗していれば空のソースを返す。他のソースには触れない
pub fn take_source(
    loaded: &mut Vec<LoadedSource>,
    source: &Source,
    format: SourceFormat,
) -> LoadedSource {
    let origin = source.to_string();
    match loaded.iter().position(|l| l.origin == origin) {
        Some(idx) => loaded.remove(idx),
        None => LoadedSource::empty(source, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, lat: f64, lon: f64) -> GeoRecord {
        GeoRecord {
            id: id.to_string(),
            latitude: lat,
            longitude: lon,
            ..Default::default()
        }
    }

    fn source(name: &str, records: Vec<GeoRecord>) -> LoadedSource {
        LoadedSource {
            name: name.to_string(),
            origin: format!("{}.jsonl", name),
            format: SourceFormat::Jsonl,
            records,
            skipped: 0,
        }
    }

    #[test]
    fn test_evaluate_source_counts() {
        let truth = vec![record("1", 10.0, 20.0), record("2", 0.0, 0.0)];
        let mut prediction = source("model", vec![record("1", 10.0, 20.0), record("9", 0.0, 0.0)]);
        prediction.skipped = 3;

        let eval = evaluate_source(&truth, &prediction, &[1.0]);
        assert_eq!(eval.source, "model");
        assert_eq!(eval.pairs.len(), 1);
        assert_eq!(eval.unmatched, 1);
        assert_eq!(eval.invalid, 0);
        assert_eq!(eval.skipped_rows, 3);
        assert_eq!(eval.summary.count, 1);
        assert_eq!(eval.summary.within[0].count, 1);
    }

    #[test]
    fn test_evaluate_with_empty_truth() {
        let truth = source("truth", vec![]);
        let predictions = vec![source("model", vec![record("1", 1.0, 1.0)])];

        let report = evaluate(&truth, &predictions, &[], &[]);
        assert_eq!(report.truth_count, 0);
        assert_eq!(report.total_pairs(), 0);
        assert_eq!(report.sources[0].unmatched, 1);
    }

    #[test]
    fn test_split_truth() {
        let sources = vec![
            source("chatgpt_o1", vec![]),
            source("address_source_of_truth", vec![record("a", 0.0, 0.0)]),
            source("deepseek_r1", vec![]),
        ];

        let (truth, rest) = split_truth(sources, "address_source_of_truth");
        assert_eq!(truth.unwrap().records.len(), 1);
        let names: Vec<&str> = rest.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["chatgpt_o1", "deepseek_r1"]);
    }

    #[test]
    fn test_split_truth_missing() {
        let (truth, rest) = split_truth(vec![source("a", vec![])], "truth");
        assert!(truth.is_none());
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn test_report_serialize() {
        let truth = source("truth", vec![record("1", 0.0, 0.0)]);
        let report = evaluate(&truth, &[source("p", vec![record("1", 0.0, 1.0)])], &[200.0], &[]);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"truthSource\":\"truth\""));
        assert!(json.contains("\"generatedAt\""));
        assert!(json.contains("\"errorKm\""));
    }

    #[test]
    fn test_take_source_when_truth_failed() {
        // 正解の読み込みに失敗し、予測だけが残っている
        let mut loaded = vec![source("predictions", vec![record("1", 1.0, 1.0)])];
        let truth_src: Source = "truth.jsonl".parse().unwrap();
        let pred_src: Source = "predictions.jsonl".parse().unwrap();

        let truth = take_source(&mut loaded, &truth_src, SourceFormat::Jsonl);
        let prediction = take_source(&mut loaded, &pred_src, SourceFormat::Jsonl);

        assert_eq!(truth.name, "truth");
        assert!(truth.records.is_empty());
        assert_eq!(prediction.records.len(), 1);

        let report = evaluate(&truth, std::slice::from_ref(&prediction), &[], &[]);
        assert_eq!(report.sources[0].unmatched, 1);
    }

    #[test]
    fn test_take_source_in_any_order() {
        let mut loaded = vec![
            source("predictions", vec![record("1", 1.0, 1.0)]),
            source("truth", vec![record("1", 0.0, 0.0), record("2", 0.0, 0.0)]),
        ];
        let truth_src: Source = "truth.jsonl".parse().unwrap();
        let pred_src: Source = "predictions.jsonl".parse().unwrap();

        assert_eq!(take_source(&mut loaded, &truth_src, SourceFormat::Jsonl).records.len(), 2);
        assert_eq!(take_source(&mut loaded, &pred_src, SourceFormat::Jsonl).records.len(), 1);
        assert!(loaded.is_empty());
    }
}
