// src/render/map.rs
use serde::Serialize;

use crate::geo::{Aggregation, MapView};
use crate::render::{notice, page};

const HEAD: &str = r#"<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.4/leaflet.awesome-markers.css">
<link rel="stylesheet" href="https://netdna.bootstrapcdn.com/bootstrap/3.0.0/css/bootstrap-glyphicons.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js"></script>
<script src="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.4/leaflet.awesome-markers.js"></script>"#;

const SCRIPT: &str = r#"<script>
(function () {
  var view = __VIEW__;
  var markers = __MARKERS__;
  var map = L.map('map').setView(view.center, view.zoom);
  L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
    maxZoom: 19,
    attribution: '&copy; OpenStreetMap contributors'
  }).addTo(map);
  var cluster = L.markerClusterGroup();
  markers.forEach(function (m) {
    var icon = L.AwesomeMarkers.icon({ icon: m.icon, markerColor: m.color, prefix: 'glyphicon' });
    L.marker([m.lat, m.lon], { icon: icon })
      .bindTooltip(m.label)
      .bindPopup(m.popup)
      .addTo(cluster);
  });
  map.addLayer(cluster);
})();
</script>"#;

#[derive(Serialize)]
struct JsMarker<'a> {
    lat: f64,
    lon: f64,
    label: &'a str,
    popup: &'a str,
    color: &'a str,
    icon: &'a str,
}

#[derive(Serialize)]
struct JsView {
    center: [f64; 2],
    zoom: u8,
}

/// JSON that is safe to inline inside `<script>`.
fn script_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
        .replace("<!--", "<\\!--")
}

/// Full map page: one cluster for every marker, one error line per failed source.
pub fn render_map_page(view: &MapView, agg: &Aggregation) -> String {
    let markers: Vec<JsMarker<'_>> = agg
        .markers()
        .map(|m| JsMarker {
            lat: m.lat,
            lon: m.lon,
            label: &m.label,
            popup: &m.popup,
            color: &m.style.color,
            icon: &m.style.icon,
        })
        .collect();

    let mut body = String::new();
    for f in agg.failures() {
        body.push_str(&notice(
            "error",
            &format!("Could not load {}: {}", f.source, f.reason),
        ));
    }
    body.push_str(&notice(
        "info",
        &format!(
            "{} markers from {} of {} sources.",
            markers.len(),
            agg.outcomes.len() - agg.failures().len(),
            agg.outcomes.len()
        ),
    ));
    body.push_str(&format!(
        r#"<div id="map" style="width: {}px; height: {}px;"></div>"#,
        view.width, view.height
    ));
    body.push('\n');

    let js_view = JsView {
        center: [view.center.0, view.center.1],
        zoom: view.zoom,
    };
    body.push_str(
        &SCRIPT
            .replace("__VIEW__", &script_json(&js_view))
            .replace("__MARKERS__", &script_json(&markers)),
    );

    page("Facility map", HEAD, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{DirectionsLink, Marker, SourceDefinition, SourceOutcome};

    fn agg() -> Aggregation {
        let src = SourceDefinition::new("toilets.csv", "y좌표", "x좌표").with_style("blue", "tint");
        let m = Marker::from_raw(&src, 1, "37.5", "127.0", &DirectionsLink::default()).unwrap();
        Aggregation {
            outcomes: vec![
                SourceOutcome::Loaded {
                    source: src.name.clone(),
                    markers: vec![m],
                    skipped_rows: 2,
                },
                SourceOutcome::Failed {
                    source: "chargers.xlsx".into(),
                    reason: "opening data/chargers.xlsx: <missing>".into(),
                },
            ],
        }
    }

    #[test]
    fn map_page_has_view_markers_and_errors() {
        let html = render_map_page(&MapView::default(), &agg());
        assert!(html.contains(r#""center":[37.5665,126.978],"zoom":11"#));
        assert!(html.contains("width: 1200px; height: 700px;"));
        assert!(html.contains(r#""color":"blue","icon":"tint""#));
        assert!(html.contains("destination=37.5,127.0"));
        assert!(html.contains("Could not load chargers.xlsx: opening data/chargers.xlsx: &lt;missing&gt;"));
        assert!(html.contains("1 markers from 1 of 2 sources."));
    }

    #[test]
    fn popup_markup_cannot_close_the_script() {
        let html = render_map_page(&MapView::default(), &agg());
        let script = html.split("<script>").nth(1).unwrap();
        let script = script.split("</script>").next().unwrap();
        assert!(script.contains(r#"<a href=\"https://www.google.com/maps/dir/?api=1&amp;destination=37.5,127.0\""#));
        assert!(script.contains(r#"<\/a>"#));
    }
}
