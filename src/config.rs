use crate::error::{GeoEvalError, Result};
use geo_eval_common::DEFAULT_THRESHOLDS_KM;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "GEO_EVAL_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 正解データとして扱うソース名（ファイル名の拡張子なし）
    pub truth_source: String,
    pub thresholds_km: Vec<f64>,
    pub csv_columns: CsvColumns,
    pub map: MapStyle,
}

/// CSVの列名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvColumns {
    /// ID兼ラベルとして使う列
    pub id: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            id: "Address".into(),
            latitude: "Latitude".into(),
            longitude: "Longitude".into(),
        }
    }
}

/// 地図の描画設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapStyle {
    pub tile_url: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub marker_radius: f64,
    /// fitBounds時の余白(px)
    pub fit_padding: u32,
    pub fit_max_zoom: u8,
    /// 平均位置を中心に表示する時のズーム（CSV比較）
    pub center_zoom: u8,
    /// CSV比較時の正解ソースの色
    pub truth_color: String,
    /// JSONL評価時の正解・予測・誤差線の色
    pub ground_truth_color: String,
    pub prediction_color: String,
    pub path_color: String,
    /// ソース名 → 色
    pub palette: BTreeMap<String, String>,
    /// パレットに無いソースへ順に割り当てる色
    pub fallback_colors: Vec<String>,
    pub legend_visible: bool,
    pub layers_visible: bool,
}

impl Default for MapStyle {
    fn default() -> Self {
        let palette = [
            ("address_source_of_truth", "black"),
            ("chatgpt_o1", "blue"),
            ("claude_3_7_sonnet", "green"),
            ("deepseek_r1", "red"),
            ("deepseek_v3", "purple"),
            ("gemini_2_5_pro_experimental", "orange"),
            ("llama_3_1_405B_instruct", "darkred"),
            ("llama_4_maverick_17B_128E_instruct", "cadetblue"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors".into(),
            max_zoom: 19,
            marker_radius: 5.0,
            fit_padding: 50,
            fit_max_zoom: 12,
            center_zoom: 2,
            truth_color: "black".into(),
            ground_truth_color: "blue".into(),
            prediction_color: "red".into(),
            path_color: "purple".into(),
            palette,
            fallback_colors: ["blue", "green", "red", "purple", "orange", "darkred", "cadetblue", "darkgreen"]
                .into_iter()
                .map(String::from)
                .collect(),
            legend_visible: true,
            layers_visible: true,
        }
    }
}

impl MapStyle {
    /// ソースの色を決める
    ///
    /// パレット優先、無ければ `index` 番目の予備色
    pub fn color_for(&self, source: &str, index: usize) -> String {
        if let Some(color) = self.palette.get(source) {
            return color.clone();
        }
        if self.fallback_colors.is_empty() {
            return "gray".into();
        }
        self.fallback_colors[index % self.fallback_colors.len()].clone()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            truth_source: "address_source_of_truth".into(),
            thresholds_km: DEFAULT_THRESHOLDS_KM.to_vec(),
            csv_columns: CsvColumns::default(),
            map: MapStyle::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// 指定パスから読み込み（無ければ既定値）
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        // 環境変数を優先
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let home = dirs::home_dir()
            .ok_or_else(|| GeoEvalError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("geo-eval").join("config.json"))
    }

    fn validate(&self) -> Result<()> {
        if let Some(t) = self.thresholds_km.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(GeoEvalError::Config(format!("しきい値が不正です: {}", t)));
        }
        let columns = &self.csv_columns;
        if [&columns.id, &columns.latitude, &columns.longitude]
            .iter()
            .any(|c| c.trim().is_empty())
        {
            return Err(GeoEvalError::Config("CSV列名が空です".into()));
        }
        Ok(())
    }
}
