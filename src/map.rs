//! 地図ドキュメント
//!
//! 描画対象（レイヤー・マーカー・誤差線・表示範囲）を組み立てる。
//! 色などの描画設定はすべて MapStyle から受け取る。

use crate::config::MapStyle;
use crate::loader::LoadedSource;
use geo_eval_common::{
    escape_html, mean_center, Bounds, LatLng, LayerControlView, LayerEntry, LegendItem,
    LegendView, MatchedPair, Visibility,
};
use serde::Serialize;

pub const GROUND_TRUTH_LAYER: &str = "Ground Truth";
pub const PREDICTIONS_LAYER: &str = "Predictions";
pub const ERROR_PATHS_LAYER: &str = "Error Paths";

/// マーカーの描き方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    /// 半径指定の円（CSV比較）
    Circle,
    /// 固定サイズの点アイコン（JSONL評価）
    Dot,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapMarker {
    pub lat: f64,
    pub lon: f64,
    pub tooltip: String,
    /// ポップアップHTML（エスケープ済み）
    pub popup: String,
}

/// 正解と予測を結ぶ誤差線
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPath {
    pub from: LatLng,
    pub to: LatLng,
    pub popup: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapLayer {
    pub name: String,
    pub color: String,
    pub visibility: Visibility,
    pub marker: MarkerKind,
    pub markers: Vec<MapMarker>,
    pub paths: Vec<ErrorPath>,
}

impl MapLayer {
    fn new(name: impl Into<String>, color: impl Into<String>, marker: MarkerKind) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            visibility: Visibility::Visible,
            marker,
            markers: Vec::new(),
            paths: Vec::new(),
        }
    }
}

/// 初期表示の決め方
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum MapView {
    /// 全点が収まる範囲に合わせる（JSONL評価）
    FitBounds { bounds: Bounds },
    /// 全点の平均位置を中心に広域表示（CSV比較）
    Center { center: LatLng },
    /// 点が無い場合の世界全体
    World,
}

#[derive(Debug, Clone)]
pub struct MapDocument {
    pub title: String,
    pub legend_title: String,
    pub layers: Vec<MapLayer>,
    pub view: MapView,
    legend_items: Vec<LegendItem>,
}

impl MapDocument {
    /// CSV比較用: ソースごとに1レイヤー、有効な全行を描画
    pub fn from_sources(
        title: &str,
        sources: &[LoadedSource],
        style: &MapStyle,
        truth_name: &str,
    ) -> Self {
        let mut layers = Vec::with_capacity(sources.len());
        let mut prediction_index = 0;

        for source in sources {
            let color = if source.name == truth_name {
                style.truth_color.clone()
            } else {
                let color = style.color_for(&source.name, prediction_index);
                prediction_index += 1;
                color
            };

            let mut layer = MapLayer::new(display_name(&source.name), color, MarkerKind::Circle);
            let name = escape_html(&source.name);

            for record in &source.records {
                let address = escape_html(&record.label);
                layer.markers.push(MapMarker {
                    lat: record.latitude,
                    lon: record.longitude,
                    tooltip: format!("{}: {}", name, address),
                    popup: format!(
                        "<b>Source:</b> {}<br><b>Address:</b> {}<br><b>Coordinates:</b> {}, {}",
                        name, address, record.latitude, record.longitude
                    ),
                });
            }
            layers.push(layer);
        }

        let legend_items = layers
            .iter()
            .map(|l| LegendItem {
                label: l.name.clone(),
                color: l.color.clone(),
            })
            .collect();

        let view = mean_center(&finite_points(&layers))
            .map(|center| MapView::Center { center })
            .unwrap_or(MapView::World);

        Self::assemble(title, "Data Sources", layers, legend_items, view)
    }

    /// JSONL評価用: 突き合わせできたペアのみ描画
    pub fn from_pairs(title: &str, pairs: &[MatchedPair], style: &MapStyle) -> Self {
        let mut truth_layer = MapLayer::new(GROUND_TRUTH_LAYER, &style.ground_truth_color, MarkerKind::Dot);
        let mut prediction_layer = MapLayer::new(PREDICTIONS_LAYER, &style.prediction_color, MarkerKind::Dot);
        let mut path_layer = MapLayer::new(ERROR_PATHS_LAYER, &style.path_color, MarkerKind::Dot);

        for pair in pairs {
            let truth = &pair.truth;
            let prediction = &pair.prediction;

            truth_layer.markers.push(MapMarker {
                lat: truth.latitude,
                lon: truth.longitude,
                tooltip: format!("Ground Truth: {}", escape_html(&truth.label)),
                popup: format!(
                    "<b>ID:</b> {}<br><b>Ground Truth:</b> {}<br><b>Coordinates:</b> {:.6}, {:.6}<br><b>Notes:</b> {}",
                    escape_html(&truth.id),
                    escape_html(&truth.label),
                    truth.latitude,
                    truth.longitude,
                    notes_or_na(truth.notes.as_deref()),
                ),
            });

            prediction_layer.markers.push(MapMarker {
                lat: prediction.latitude,
                lon: prediction.longitude,
                tooltip: format!("Prediction: {}", escape_html(&prediction.label)),
                popup: format!(
                    "<b>ID:</b> {}<br><b>Prediction:</b> {}<br><b>Coordinates:</b> {:.6}, {:.6}<br><b>Error:</b> {:.2} km<br><b>Notes:</b> {}",
                    escape_html(&prediction.id),
                    escape_html(&prediction.label),
                    prediction.latitude,
                    prediction.longitude,
                    pair.error_km,
                    notes_or_na(prediction.notes.as_deref()),
                ),
            });

            path_layer.paths.push(ErrorPath {
                from: truth.position(),
                to: prediction.position(),
                popup: format!("<b>Error:</b> {:.2} km", pair.error_km),
            });
        }

        let legend_items = vec![
            LegendItem { label: "Ground Truth Locations".into(), color: style.ground_truth_color.clone() },
            LegendItem { label: "Predicted Locations".into(), color: style.prediction_color.clone() },
            LegendItem { label: "Error Paths".into(), color: style.path_color.clone() },
        ];

        let layers = vec![truth_layer, prediction_layer, path_layer];
        let view = Bounds::from_points(&finite_points(&layers))
            .map(|bounds| MapView::FitBounds { bounds })
            .unwrap_or(MapView::World);

        Self::assemble(title, "Map Legend", layers, legend_items, view)
    }

    fn assemble(
        title: &str,
        legend_title: &str,
        layers: Vec<MapLayer>,
        legend_items: Vec<LegendItem>,
        view: MapView,
    ) -> Self {
        Self {
            title: title.to_string(),
            legend_title: legend_title.to_string(),
            layers,
            view,
            legend_items,
        }
    }

    pub fn marker_count(&self) -> usize {
        self.layers.iter().map(|l| l.markers.len()).sum()
    }

    pub fn legend(&self, style: &MapStyle) -> LegendView {
        let mut legend = LegendView::new(self.legend_title.clone(), self.legend_items.clone());
        legend.visibility = Visibility::from_visible(style.legend_visible);
        legend
    }

    pub fn layer_control(&self, style: &MapStyle) -> LayerControlView {
        let entries = self
            .layers
            .iter()
            .map(|l| LayerEntry {
                name: l.name.clone(),
                color: l.color.clone(),
                visibility: l.visibility,
            })
            .collect();
        let mut control = LayerControlView::new(entries);
        control.visibility = Visibility::from_visible(style.layers_visible);
        control
    }
}

/// 全レイヤーのマーカー・誤差線の端点（有限値のみ）
fn finite_points(layers: &[MapLayer]) -> Vec<LatLng> {
    layers
        .iter()
        .flat_map(|l| {
            l.markers
                .iter()
                .map(|m| LatLng::new(m.lat, m.lon))
                .chain(l.paths.iter().flat_map(|p| [p.from, p.to]))
        })
        .filter(|p| p.is_finite())
        .collect()
}

/// `llama_3_1_405B_instruct` → `llama 3 1 405B instruct`
fn display_name(source: &str) -> String {
    source.replace('_', " ")
}

fn notes_or_na(notes: Option<&str>) -> String {
    notes.map(escape_html).unwrap_or_else(|| "N/A".to_string())
}
