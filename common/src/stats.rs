//! 誤差統計

use crate::types::MatchedPair;
use serde::{Deserialize, Serialize};

/// 既定の誤差しきい値（km）: 通り / 市 / 地域 / 国 / 大陸
pub const DEFAULT_THRESHOLDS_KM: [f64; 5] = [1.0, 25.0, 200.0, 750.0, 2500.0];

/// しきい値以内に収まった件数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdHit {
    pub threshold_km: f64,
    pub count: usize,
    /// count / 全件数（0件なら0.0）
    pub ratio: f64,
}

/// 誤差距離の集計
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    pub count: usize,
    pub mean_km: Option<f64>,
    pub median_km: Option<f64>,
    pub min_km: Option<f64>,
    pub max_km: Option<f64>,
    #[serde(default)]
    pub within: Vec<ThresholdHit>,
}

impl ErrorSummary {
    pub fn from_pairs(pairs: &[MatchedPair], thresholds_km: &[f64]) -> Self {
        let mut errors: Vec<f64> = pairs.iter().map(|p| p.error_km).collect();
        errors.sort_by(|a, b| a.total_cmp(b));

        let count = errors.len();
        let within = thresholds_km
            .iter()
            .map(|&threshold_km| {
                let hits = errors.iter().filter(|&&e| e <= threshold_km).count();
                ThresholdHit {
                    threshold_km,
                    count: hits,
                    ratio: if count == 0 { 0.0 } else { hits as f64 / count as f64 },
                }
            })
            .collect();

        if count == 0 {
            return Self {
                within,
                ..Default::default()
            };
        }

        let mean = errors.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 1 {
            errors[count / 2]
        } else {
            (errors[count / 2 - 1] + errors[count / 2]) / 2.0
        };

        Self {
            count,
            mean_km: Some(mean),
            median_km: Some(median),
            min_km: errors.first().copied(),
            max_km: errors.last().copied(),
            within,
        }
    }
}
