//! 正解・予測の突き合わせ
//!
//! 正解セットをIDで引けるようにし、予測ごとに誤差距離を計算する。
//! 突き合わせできない予測はエラーにせず捨てる。

use crate::geo::haversine_km;
use crate::types::{GeoRecord, MatchedPair};
use std::collections::HashMap;

/// 突き合わせ結果（件数つき）
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// 予測の入力順
    pub pairs: Vec<MatchedPair>,
    /// 正解にIDが無かった予測数
    pub unmatched: usize,
    /// 座標が有限値でなかった予測数
    pub invalid: usize,
}

/// 予測を正解と突き合わせる
///
/// 結果は予測の入力順。詳細は [`match_with_outcome`]。
pub fn match_predictions(truth: &[GeoRecord], predictions: &[GeoRecord]) -> Vec<MatchedPair> {
    match_with_outcome(truth, predictions).pairs
}

/// 予測を正解と突き合わせ、捨てた件数も返す
///
/// 正解側のIDが重複した場合にどれが使われるかは未定義。
pub fn match_with_outcome(truth: &[GeoRecord], predictions: &[GeoRecord]) -> MatchOutcome {
    let lookup: HashMap<&str, &GeoRecord> = truth
        .iter()
        .filter(|r| !r.id.is_empty())
        .map(|r| (r.id.as_str(), r))
        .collect();

    let mut outcome = MatchOutcome::default();

    for prediction in predictions {
        let Some(truth_record) = lookup.get(prediction.id.as_str()) else {
            outcome.unmatched += 1;
            continue;
        };

        if !truth_record.has_valid_coordinates() || !prediction.has_valid_coordinates() {
            outcome.invalid += 1;
            continue;
        }

        outcome.pairs.push(MatchedPair {
            id: prediction.id.clone(),
            truth: (*truth_record).clone(),
            prediction: prediction.clone(),
            error_km: haversine_km(truth_record.position(), prediction.position()),
        });
    }

    outcome
}
