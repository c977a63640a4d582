//! 凡例・レイヤー切替のビューモデル
//!
//! 表示状態（表示/非表示）とHTML断片の生成だけを持ち、
//! 評価ロジックとは独立させる。

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// 表示状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    pub fn from_visible(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    pub fn toggled(self) -> Self {
        match self {
            Visibility::Visible => Visibility::Hidden,
            Visibility::Hidden => Visibility::Visible,
        }
    }

    /// 非表示時に付与するCSSクラス
    fn collapsed_class(self) -> &'static str {
        match self {
            Visibility::Visible => "",
            Visibility::Hidden => " collapsed",
        }
    }
}

/// 表示状態と描画を持つUI部品
pub trait ViewModel {
    fn visibility(&self) -> Visibility;

    fn set_visibility(&mut self, visibility: Visibility);

    fn toggle(&mut self) {
        let next = self.visibility().toggled();
        self.set_visibility(next);
    }

    /// HTML断片を生成
    fn render(&self) -> String;
}

/// 凡例の1項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendItem {
    pub label: String,
    pub color: String,
}

/// 凡例
#[derive(Debug, Clone, PartialEq)]
pub struct LegendView {
    pub title: String,
    pub items: Vec<LegendItem>,
    pub visibility: Visibility,
}

impl LegendView {
    pub fn new(title: impl Into<String>, items: Vec<LegendItem>) -> Self {
        Self {
            title: title.into(),
            items,
            visibility: Visibility::Visible,
        }
    }

    pub fn button_label(&self) -> &'static str {
        if self.visibility.is_visible() { "Hide Legend" } else { "Show Legend" }
    }
}

impl ViewModel for LegendView {
    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    fn render(&self) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            r#"<div class="legend"><div class="legend-box{}"><h4>{}</h4><div class="legend-content">"#,
            self.visibility.collapsed_class(),
            escape_html(&self.title),
        );
        for item in &self.items {
            let _ = write!(
                html,
                r#"<div class="legend-item"><span class="color-box" style="background-color: {}"></span>{}</div>"#,
                escape_html(&item.color),
                escape_html(&item.label),
            );
        }
        let _ = write!(
            html,
            r#"</div></div><button type="button" class="map-control-button legend-toggle" data-show="Show Legend" data-hide="Hide Legend">{}</button></div>"#,
            self.button_label(),
        );
        html
    }
}

/// レイヤー切替の1項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry {
    pub name: String,
    pub color: String,
    pub visibility: Visibility,
}

/// レイヤー切替パネル
#[derive(Debug, Clone, PartialEq)]
pub struct LayerControlView {
    pub entries: Vec<LayerEntry>,
    pub visibility: Visibility,
}

impl LayerControlView {
    pub fn new(entries: Vec<LayerEntry>) -> Self {
        Self {
            entries,
            visibility: Visibility::Visible,
        }
    }

    pub fn button_label(&self) -> &'static str {
        if self.visibility.is_visible() { "Hide Layers" } else { "Show Layers" }
    }

    /// 名前でレイヤーの表示状態を切り替える（該当なしなら false）
    pub fn toggle_layer(&mut self, name: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.visibility = entry.visibility.toggled();
                true
            }
            None => false,
        }
    }
}

impl ViewModel for LayerControlView {
    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    fn render(&self) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            r#"<div class="layer-control-toggle"><div class="layer-box{}">"#,
            self.visibility.collapsed_class(),
        );
        for (index, entry) in self.entries.iter().enumerate() {
            let _ = write!(
                html,
                r#"<label class="layer-entry"><input type="checkbox" data-layer="{}"{}><span class="color-box" style="background-color: {}"></span>{}</label>"#,
                index,
                if entry.visibility.is_visible() { " checked" } else { "" },
                escape_html(&entry.color),
                escape_html(&entry.name),
            );
        }
        let _ = write!(
            html,
            r#"</div><button type="button" class="map-control-button layer-toggle" data-show="Show Layers" data-hide="Hide Layers">{}</button></div>"#,
            self.button_label(),
        );
        html
    }
}

/// HTML特殊文字をエスケープ
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legend() -> LegendView {
        LegendView::new(
            "Map Legend",
            vec![
                LegendItem { label: "Ground Truth Locations".into(), color: "blue".into() },
                LegendItem { label: "Predicted Locations".into(), color: "red".into() },
            ],
        )
    }

    #[test]
    fn test_visibility_toggle() {
        assert_eq!(Visibility::Visible.toggled(), Visibility::Hidden);
        assert_eq!(Visibility::Hidden.toggled(), Visibility::Visible);
        assert_eq!(Visibility::from_visible(false), Visibility::Hidden);
    }

    #[test]
    fn test_legend_render_visible() {
        let html = legend().render();
        assert!(html.contains(r#"<div class="legend-box">"#));
        assert!(html.contains("<h4>Map Legend</h4>"));
        assert!(html.contains("background-color: blue"));
        assert!(html.contains("Predicted Locations"));
        assert!(html.contains(">Hide Legend</button>"));
    }

    #[test]
    fn test_legend_toggle_collapses() {
        let mut view = legend();
        view.toggle();
        assert_eq!(view.visibility(), Visibility::Hidden);

        let html = view.render();
        assert!(html.contains(r#"<div class="legend-box collapsed">"#));
        assert!(html.contains(">Show Legend</button>"));
    }

    #[test]
    fn test_layer_control_render() {
        let mut view = LayerControlView::new(vec![
            LayerEntry { name: "Ground Truth".into(), color: "blue".into(), visibility: Visibility::Visible },
            LayerEntry { name: "Error Paths".into(), color: "purple".into(), visibility: Visibility::Hidden },
        ]);
        let html = view.render();
        assert!(html.contains(r#"data-layer="0" checked"#));
        assert!(html.contains(r#"data-layer="1">"#));
        assert!(html.contains(">Hide Layers</button>"));

        assert!(view.toggle_layer("Error Paths"));
        assert!(!view.toggle_layer("missing"));
        assert!(view.entries[1].visibility.is_visible());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<b>"A & B"</b>"#), "&lt;b&gt;&quot;A &amp; B&quot;&lt;/b&gt;");
        assert_eq!(escape_html("O'Hare"), "O&#39;Hare");
    }

    #[test]
    fn test_legend_escapes_labels() {
        let view = LegendView::new("<script>", vec![]);
        assert!(!view.render().contains("<script>"));
    }
}
