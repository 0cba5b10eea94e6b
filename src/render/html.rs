use std::fmt::Write as _;

use quick_xml::escape::escape;

use super::figure::{Figure, TITLE};
use crate::models::DistrictCode;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Filter form shown above the chart when the page is served
#[derive(Debug, Clone)]
pub struct Controls {
    /// URL the form reloads with `districts` and `show_points` parameters
    pub action: String,
    pub districts: Vec<(DistrictCode, bool)>,
    pub show_points: bool,
}

/// Standalone HTML page drawing `figure` with Plotly
pub fn render_html(figure: &Figure, controls: Option<&Controls>) -> String {
    // serde_json output is valid JS; only a closing script tag could break out
    let figure_json = serde_json::to_string(figure)
        .unwrap_or_else(|_| "{\"data\":[],\"layout\":{}}".to_string())
        .replace("</", "<\\/");

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"ca\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>Mapa de Voronoi d'Oficines per Districte</title>");
    let _ = writeln!(html, "<script src=\"{}\"></script>", PLOTLY_CDN);
    html.push_str("<style>body{font-family:sans-serif;margin:1rem}#chart{width:100%;height:80vh}fieldset{margin-bottom:1rem}</style>\n");
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape(TITLE));

    if let Some(controls) = controls {
        write_controls(&mut html, controls);
    }

    html.push_str("<div id=\"chart\"></div>\n<script>\n");
    let _ = writeln!(html, "const figure = {};", figure_json);
    html.push_str("Plotly.newPlot('chart', figure.data, figure.layout, {scrollZoom: true, responsive: true});\n");
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn write_controls(html: &mut String, controls: &Controls) {
    html.push_str("<form id=\"filters\">\n<fieldset>\n<legend>Selecciona districtes:</legend>\n");
    for (code, checked) in &controls.districts {
        let _ = writeln!(
            html,
            "<label><input type=\"checkbox\" name=\"district\" value=\"{code}\"{}> {code}</label>",
            if *checked { " checked" } else { "" }
        );
    }
    html.push_str("</fieldset>\n");
    let _ = writeln!(
        html,
        "<label><input type=\"checkbox\" id=\"show_points\"{}> Mostrar punts d'oficines</label>",
        if controls.show_points { " checked" } else { "" }
    );
    html.push_str("<button type=\"submit\">Actualitza</button>\n</form>\n<script>\n");
    let _ = writeln!(
        html,
        "const action = {};",
        serde_json::to_string(&controls.action).unwrap_or_else(|_| "\"\"".to_string())
    );
    html.push_str(
        "document.getElementById('filters').addEventListener('submit', function (ev) {\n\
  ev.preventDefault();\n\
  const codes = Array.from(document.querySelectorAll('input[name=district]:checked')).map(e => e.value);\n\
  const show = document.getElementById('show_points').checked;\n\
  window.location = action + '?districts=' + codes.join(',') + '&show_points=' + show;\n\
});\n</script>\n",
    );
}
