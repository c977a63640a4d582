//! 地図HTML出力
//!
//! Leaflet（CDN）を使う単体HTMLを生成する。
//! 描画データはJSONとして埋め込み、凡例・レイヤー切替はビューモデルが描画する。

use crate::config::MapStyle;
use crate::error::Result;
use crate::map::{MapDocument, MapLayer, MapView};
use geo_eval_common::{escape_html, ViewModel};
use serde::Serialize;
use std::path::Path;

const FALLBACK_ZOOM: u8 = 2;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageData<'a> {
    tiles: TileOptions<'a>,
    marker_radius: f64,
    view: ViewOptions,
    layers: &'a [MapLayer],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TileOptions<'a> {
    url: &'a str,
    attribution: &'a str,
    max_zoom: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewOptions {
    #[serde(flatten)]
    target: MapView,
    padding: u32,
    max_zoom: u8,
    center_zoom: u8,
    fallback_zoom: u8,
}

/// HTMLを生成してファイルに保存
pub fn generate_html(doc: &MapDocument, style: &MapStyle, output_path: &Path) -> Result<()> {
    let html = render_map_html(doc, style)?;
    std::fs::write(output_path, html)?;
    Ok(())
}

/// HTML文字列を生成
pub fn render_map_html(doc: &MapDocument, style: &MapStyle) -> Result<String> {
    let data = PageData {
        tiles: TileOptions {
            url: &style.tile_url,
            attribution: &style.attribution,
            max_zoom: style.max_zoom,
        },
        marker_radius: style.marker_radius,
        view: ViewOptions {
            target: doc.view,
            padding: style.fit_padding,
            max_zoom: style.fit_max_zoom,
            center_zoom: style.center_zoom,
            fallback_zoom: FALLBACK_ZOOM,
        },
        layers: &doc.layers,
    };

    let legend_html = doc.legend(style).render();
    let layer_control_html = doc.layer_control(style).render();

    let html = PAGE_TEMPLATE
        .replace("{{TITLE}}", &escape_html(&doc.title))
        .replace("{{PATH_COLOR}}", &escape_html(&style.path_color))
        .replace("{{MAP_DATA}}", &script_json(&data)?)
        .replace("{{LEGEND_HTML}}", &script_json(&legend_html)?)
        .replace("{{LAYER_CONTROL_HTML}}", &script_json(&layer_control_html)?);

    Ok(html)
}

/// <script> 内に埋め込めるJSON
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" crossorigin="" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js" crossorigin=""></script>
  <style>
    html, body { height: 100%; margin: 0; }
    #map { position: absolute; inset: 0; }
    .legend-box, .layer-box {
      background-color: white;
      padding: 6px 8px;
      border-radius: 4px;
      box-shadow: 0 1px 5px rgba(0, 0, 0, 0.4);
      transition: all 0.3s ease;
    }
    .legend-box.collapsed, .layer-box.collapsed { display: none; }
    .legend-content { max-height: 500px; overflow: hidden; }
    .legend-item, .layer-entry { display: flex; align-items: center; gap: 6px; margin: 2px 0; }
    .layer-entry { cursor: pointer; }
    .color-box { display: inline-block; width: 12px; height: 12px; border-radius: 2px; }
    .map-control-button {
      display: block;
      width: 100%;
      margin-top: 5px;
      padding: 4px 8px;
      background: white;
      border: 1px solid #999;
      border-radius: 4px;
      cursor: pointer;
    }
    .error-path { stroke: {{PATH_COLOR}}; animation: dash 3s linear infinite; }
    @keyframes dash { to { stroke-dashoffset: -30; } }
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
    const DATA = {{MAP_DATA}};
    const LEGEND_HTML = {{LEGEND_HTML}};
    const LAYER_CONTROL_HTML = {{LAYER_CONTROL_HTML}};

    const map = L.map('map').setView([0, 0], DATA.view.fallbackZoom);
    L.tileLayer(DATA.tiles.url, {
      attribution: DATA.tiles.attribution,
      maxZoom: DATA.tiles.maxZoom
    }).addTo(map);

    const groups = DATA.layers.map(layer => {
      const group = L.layerGroup();
      layer.markers.forEach(m => {
        const marker = layer.marker === 'circle'
          ? L.circleMarker([m.lat, m.lon], {
              radius: DATA.markerRadius,
              color: layer.color,
              fillColor: layer.color,
              fillOpacity: 0.7,
              weight: 1
            })
          : L.marker([m.lat, m.lon], {
              icon: L.divIcon({
                className: 'dot-marker',
                html: `<div style="background-color:${layer.color};width:10px;height:10px;border-radius:50%;"></div>`,
                iconSize: [10, 10]
              })
            });
        marker.bindPopup(m.popup).bindTooltip(m.tooltip).addTo(group);
      });
      layer.paths.forEach(p => {
        L.polyline([[p.from.lat, p.from.lon], [p.to.lat, p.to.lon]], {
          color: layer.color,
          weight: 2,
          dashArray: '10, 20',
          opacity: 0.7,
          className: 'error-path'
        }).bindPopup(p.popup).addTo(group);
      });
      if (layer.visibility === 'visible') {
        group.addTo(map);
      }
      return group;
    });

    const view = DATA.view;
    if (view.mode === 'fitBounds') {
      const b = view.bounds;
      map.fitBounds([[b.south, b.west], [b.north, b.east]], {
        padding: [view.padding, view.padding],
        maxZoom: view.maxZoom
      });
    } else if (view.mode === 'center') {
      map.setView([view.center.lat, view.center.lon], view.centerZoom);
    }

    function bindToggle(container, boxSelector) {
      const button = container.querySelector('.map-control-button');
      const box = container.querySelector(boxSelector);
      button.addEventListener('click', () => {
        const collapsed = box.classList.toggle('collapsed');
        button.textContent = collapsed ? button.dataset.show : button.dataset.hide;
      });
    }

    function htmlControl(position, html, boxSelector, onReady) {
      const control = L.control({ position: position });
      control.onAdd = function () {
        const div = L.DomUtil.create('div', 'geo-eval-control');
        div.innerHTML = html;
        L.DomEvent.disableClickPropagation(div);
        L.DomEvent.disableScrollPropagation(div);
        bindToggle(div, boxSelector);
        if (onReady) {
          onReady(div);
        }
        return div;
      };
      control.addTo(map);
    }

    htmlControl('bottomright', LEGEND_HTML, '.legend-box');
    htmlControl('topright', LAYER_CONTROL_HTML, '.layer-box', div => {
      div.querySelectorAll('input[data-layer]').forEach(input => {
        input.addEventListener('change', () => {
          const group = groups[Number(input.dataset.layer)];
          if (input.checked) {
            map.addLayer(group);
          } else {
            map.removeLayer(group);
          }
        });
      });
    });
  </script>
</body>
</html>
"#;
