//! Display colours for merged plot series.

use serde_json::{Map, Value};

/// Colours used by the report front-end, one per assembler trace.
pub const COLOURS: [&str; 12] = [
    "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f", "#ff7f00",
    "#cab2d6", "#6a3d9a", "#ebdb75", "#b15928",
];

/// Palette index of the first trace of a merged-in fragment.
pub const FIRST_INDEX: usize = 1;

/// Colour at a palette index, wrapping past the end of the palette.
pub fn colour_at(index: usize) -> &'static str {
    COLOURS[index % COLOURS.len()]
}

/// Which style object of a trace holds its colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourTarget {
    /// Scatter/box traces: `item.marker.color`
    Marker,
    /// Line traces: `item.line.color`
    Line,
}

impl ColourTarget {
    pub fn key(&self) -> &'static str {
        match self {
            ColourTarget::Marker => "marker",
            ColourTarget::Line => "line",
        }
    }
}

/// Colour the traces of one series, starting at palette index `start`.
///
/// Traces that are not objects are left alone. A missing or non-object
/// style entry is replaced by one holding just the colour.
pub fn colour_series(items: &mut [Value], target: ColourTarget, start: usize) {
    for (offset, item) in items.iter_mut().enumerate() {
        let Some(trace) = item.as_object_mut() else {
            continue;
        };

        let style = trace
            .entry(target.key())
            .or_insert_with(|| Value::Object(Map::new()));
        if !style.is_object() {
            *style = Value::Object(Map::new());
        }
        if let Some(style) = style.as_object_mut() {
            style.insert(
                "color".to_string(),
                Value::String(colour_at(start + offset).to_string()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_colour_at_wraps() {
        assert_eq!(colour_at(1), "#1f78b4");
        assert_eq!(colour_at(11), "#b15928");
        assert_eq!(colour_at(12), "#a6cee3");
        assert_eq!(colour_at(13), "#1f78b4");
    }

    #[test]
    fn test_colour_series_starts_at_index() {
        let mut items = vec![
            json!({"x": [1], "line": {"color": "#000000", "width": 2}}),
            json!({"x": [2], "line": {"color": "#000000"}}),
        ];

        colour_series(&mut items, ColourTarget::Line, FIRST_INDEX);

        assert_eq!(items[0]["line"]["color"], json!("#1f78b4"));
        assert_eq!(items[0]["line"]["width"], json!(2));
        assert_eq!(items[1]["line"]["color"], json!("#b2df8a"));
    }

    #[test]
    fn test_colour_series_adds_missing_style() {
        let mut items = vec![json!({"y": [0.5]}), json!("not a trace")];

        colour_series(&mut items, ColourTarget::Marker, FIRST_INDEX);

        assert_eq!(items[0]["marker"]["color"], json!("#1f78b4"));
        assert_eq!(items[1], json!("not a trace"));
    }

    #[test]
    fn test_colour_series_beyond_palette() {
        let mut items: Vec<Value> = (0..14).map(|i| json!({"name": i})).collect();

        colour_series(&mut items, ColourTarget::Marker, FIRST_INDEX);

        assert_eq!(items[10]["marker"]["color"], json!("#b15928"));
        assert_eq!(items[11]["marker"]["color"], json!("#a6cee3"));
        assert_eq!(items[13]["marker"]["color"], json!("#b2df8a"));
    }
}
