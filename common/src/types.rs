//! 位置レコードの型定義
//!
//! CLIと地図出力で共有される型:
//! - GeoRecord: 入力ファイル1行分の位置情報
//! - MatchedPair: 正解と予測をIDで突き合わせた結果
//! - ParsedRecords: ファイル単位のパース結果

use crate::geo::LatLng;
use serde::{Deserialize, Serialize};

/// 入力ファイル1行（1レコード）分の位置情報
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRecord {
    pub id: String,

    pub latitude: f64,

    pub longitude: f64,

    /// 表示用ラベル（住所、または「都市, 国」）
    #[serde(default)]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl GeoRecord {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// 緯度・経度がともに有限値か
    pub fn has_valid_coordinates(&self) -> bool {
        self.position().is_finite()
    }
}

/// 正解・予測ペア
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPair {
    pub id: String,
    pub truth: GeoRecord,
    pub prediction: GeoRecord,
    /// 大円距離による誤差（km）
    pub error_km: f64,
}

/// ファイル単位のパース結果
#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub records: Vec<GeoRecord>,
    /// 不正な行として読み飛ばした件数
    pub skipped: usize,
}

impl ParsedRecords {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
