use serde_json::Value;
use std::collections::HashMap;

/// Render the flight tooltip for an entity from its merged metadata.
///
/// Recognised keys: `flightNumber`, `origin`, `destination`, `altitude`,
/// `speed`. Missing or empty values fall back to the entity id,
/// `Unknown`, or `0`.
pub fn flight_tooltip(id: &str, metadata: &HashMap<String, Value>) -> String {
    let title = display_value(metadata.get("flightNumber")).unwrap_or_else(|| escape_html(id));
    let origin = display_value(metadata.get("origin")).unwrap_or_else(|| "Unknown".to_string());
    let destination =
        display_value(metadata.get("destination")).unwrap_or_else(|| "Unknown".to_string());

    let altitude = match metadata.get("altitude") {
        Some(Value::Number(n)) => n.as_f64().map(format_thousands),
        other => display_value(other),
    }
    .unwrap_or_else(|| "0".to_string());

    let speed = display_value(metadata.get("speed")).unwrap_or_else(|| "0".to_string());

    format!(
        "<div class=\"plane-tooltip\"><strong>{}</strong><br>{} \u{2192} {}<br>Alt: {}ft<br>Speed: {} kts</div>",
        title, origin, destination, altitude, speed
    )
}

/// Format a number with comma thousands separators and at most three
/// fraction digits (`3000` → `3,000`, `1234.5` → `1,234.5`).
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = (value * 1000.0).round() / 1000.0;
    let negative = rounded < 0.0;
    let abs = rounded.abs();
    let whole = abs.trunc() as u64;
    let fraction = format!("{:.3}", abs.fract());
    let fraction = fraction.trim_start_matches('0').trim_end_matches('0');

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative && (whole > 0 || fraction.len() > 1) {
        out.push('-');
    }
    out.push_str(&grouped);
    if fraction.len() > 1 {
        out.push_str(fraction);
    }
    out
}

/// Display a JSON value the way a template literal would, treating falsy
/// values (null, false, 0, "") as absent.
fn display_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(escape_html(s)),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        other => Some(escape_html(&other.to_string())),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> HashMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_tooltip() {
        let metadata = meta(json!({
            "flightNumber": "KL123",
            "origin": "AMS",
            "destination": "JFK",
            "altitude": 35000,
            "speed": 480
        }));

        let text = flight_tooltip("A1", &metadata);
        assert!(text.contains("<strong>KL123</strong>"));
        assert!(text.contains("AMS \u{2192} JFK"));
        assert!(text.contains("Alt: 35,000ft"));
        assert!(text.contains("Speed: 480 kts"));
    }

    #[test]
    fn test_fallbacks_when_metadata_empty() {
        let text = flight_tooltip("A1", &HashMap::new());
        assert!(text.contains("<strong>A1</strong>"));
        assert!(text.contains("Unknown \u{2192} Unknown"));
        assert!(text.contains("Alt: 0ft"));
        assert!(text.contains("Speed: 0 kts"));
    }

    #[test]
    fn test_empty_flight_number_falls_back_to_id() {
        let metadata = meta(json!({ "flightNumber": "" }));
        assert!(flight_tooltip("plane_7", &metadata).contains("<strong>plane_7</strong>"));
    }

    #[test]
    fn test_values_are_escaped() {
        let metadata = meta(json!({ "origin": "<script>" }));
        let text = flight_tooltip("A1", &metadata);
        assert!(text.contains("&lt;script&gt;"));
        assert!(!text.contains("<script>"));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(3000.0), "3,000");
        assert_eq!(format_thousands(1234567.0), "1,234,567");
        assert_eq!(format_thousands(1234.5), "1,234.5");
        assert_eq!(format_thousands(-2500.0), "-2,500");
        assert_eq!(format_thousands(0.12345), "0.123");
    }
}
