use serde::{Deserialize, Serialize};

/// Marker icon description handed to the rendering surface.
///
/// Mirrors the shape of a map library "div icon": raw HTML plus CSS class,
/// pixel size and anchor offset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    pub html: String,
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "iconSize")]
    pub size: [u32; 2],
    #[serde(rename = "iconAnchor")]
    pub anchor: [u32; 2],
}

const PLANE_ICON_SIZE: u32 = 48;
const PLANE_ICON_CLASS: &str = "plane-marker";

/// Build the plane icon rotated to `heading` degrees.
///
/// Pure function: the same heading always yields an identical icon.
pub fn plane_icon(heading: f64) -> Icon {
    let html = format!(
        concat!(
            r#"<svg width="48" height="48" viewBox="0 0 24 24" style="transform: rotate({rotation}deg);">"#,
            r#"<defs><linearGradient id="planeGradient" x1="0%" y1="0%" x2="100%" y2="100%">"#,
            r##"<stop offset="0%" style="stop-color:#3b82f6"/>"##,
            r##"<stop offset="50%" style="stop-color:#2563eb"/>"##,
            r##"<stop offset="100%" style="stop-color:#1e40af"/>"##,
            r#"</linearGradient></defs>"#,
            r##"<ellipse cx="12" cy="12" rx="1.5" ry="8" fill="url(#planeGradient)" stroke="#1e40af" stroke-width="0.3"/>"##,
            r##"<ellipse cx="12" cy="10" rx="7" ry="1.5" fill="url(#planeGradient)" stroke="#1e40af" stroke-width="0.3"/>"##,
            r##"<ellipse cx="12" cy="16" rx="3" ry="1" fill="url(#planeGradient)" stroke="#1e40af" stroke-width="0.3"/>"##,
            r##"<ellipse cx="12" cy="6" rx="1" ry="2" fill="#1e40af"/>"##,
            r##"<circle cx="5" cy="10" r="0.5" fill="#ef4444"/>"##,
            r##"<circle cx="19" cy="10" r="0.5" fill="#22c55e"/>"##,
            r#"</svg>"#,
        ),
        rotation = heading,
    );

    Icon {
        html,
        class_name: PLANE_ICON_CLASS.to_string(),
        size: [PLANE_ICON_SIZE, PLANE_ICON_SIZE],
        anchor: [PLANE_ICON_SIZE / 2, PLANE_ICON_SIZE / 2],
    }
}
