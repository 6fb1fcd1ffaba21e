//! Style and attribute resolution.
//!
//! Folds the layered property sets (base area → "area" chunk entry →
//! gap extras → the label's own entry) into one concrete value set per
//! chunk label, evaluating computed values once per render, and fills
//! in the marker defaults that derive from the resolved area values.

use std::collections::BTreeMap;

use crate::config::{AreaChart, AREA_LABEL, GAP_LABEL};
use crate::path::fmt_num;

/// Concrete, fully evaluated styling for one chunk label.
#[derive(Debug, Clone, Default)]
pub struct EvaluatedChunk {
    pub styles: BTreeMap<String, String>,
    pub attrs: BTreeMap<String, String>,
    pub point_styles: BTreeMap<String, String>,
    pub point_attrs: BTreeMap<String, String>,
}

/// Parse a numeric-looking attribute value, stripping a unit suffix
/// such as `px`. Returns None when no leading number is present.
pub(crate) fn parse_px(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let end = trimmed
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .last()
        .map(|(i, c)| i + c.len_utf8())?;
    trimmed[..end].parse().ok()
}

/// Evaluate the full definition chain for every label in render order.
pub(crate) fn evaluate_definitions<D: 'static, S: 'static>(
    chart: &AreaChart<D, S>,
    data: &S,
    index: usize,
) -> Vec<(String, EvaluatedChunk)> {
    let area_def = chart.chunk_definition_for(AREA_LABEL);

    chart
        .chunk_names(false)
        .into_iter()
        .map(|label| {
            let own = chart.chunk_definition_for(&label);

            let mut styles = BTreeMap::new();
            chart.area_styles.evaluate_into(data, index, &mut styles);
            if let Some(def) = area_def {
                def.styles.evaluate_into(data, index, &mut styles);
            }
            if label == GAP_LABEL {
                chart.gap_styles.evaluate_into(data, index, &mut styles);
            }
            if let Some(def) = own {
                def.styles.evaluate_into(data, index, &mut styles);
            }

            let mut attrs = BTreeMap::new();
            chart.area_attrs.evaluate_into(data, index, &mut attrs);
            if let Some(def) = area_def {
                def.attrs.evaluate_into(data, index, &mut attrs);
            }
            if label == GAP_LABEL {
                chart.gap_attrs.evaluate_into(data, index, &mut attrs);
            }
            if let Some(def) = own {
                def.attrs.evaluate_into(data, index, &mut attrs);
            }

            // marker attrs default from this label's resolved area attrs
            let mut point_attrs = BTreeMap::new();
            if let Some(fill) = attrs.get("fill") {
                point_attrs.insert("fill".to_string(), fill.clone());
            }
            let radius = match attrs.get("stroke-width").and_then(|v| parse_px(v)) {
                Some(sw) => sw / 2.0 + 1.0,
                None => 2.0,
            };
            point_attrs.insert("r".to_string(), fmt_num(radius));

            chart.point_attrs.evaluate_into(data, index, &mut point_attrs);
            if let Some(def) = area_def {
                def.point_attrs.evaluate_into(data, index, &mut point_attrs);
            }
            if let Some(def) = own {
                def.point_attrs.evaluate_into(data, index, &mut point_attrs);
            }

            // normalize the radius to a plain number
            if let Some(parsed) = point_attrs.get("r").and_then(|v| parse_px(v)) {
                point_attrs.insert("r".to_string(), fmt_num(parsed));
            }

            // marker style fill falls back to the resolved area stroke
            // unless the label's own marker attrs carry a fill
            let own_has_fill = own
                .map(|def| def.point_attrs.get("fill").is_some())
                .unwrap_or(false);
            let mut point_styles = BTreeMap::new();
            if !own_has_fill {
                if let Some(stroke) = styles.get("stroke") {
                    point_styles.insert("fill".to_string(), stroke.clone());
                }
            }
            chart.point_styles.evaluate_into(data, index, &mut point_styles);
            if let Some(def) = area_def {
                def.point_styles.evaluate_into(data, index, &mut point_styles);
            }
            if let Some(def) = own {
                def.point_styles.evaluate_into(data, index, &mut point_styles);
            }

            (
                label,
                EvaluatedChunk { styles, attrs, point_styles, point_attrs },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkDefinition, PropertySet};

    type Chart = AreaChart<(f64, f64)>;

    fn chunk_of<'a>(
        evaluated: &'a [(String, EvaluatedChunk)],
        label: &str,
    ) -> &'a EvaluatedChunk {
        &evaluated.iter().find(|(n, _)| n == label).unwrap().1
    }

    #[test]
    fn parse_px_strips_units() {
        assert_eq!(parse_px("2"), Some(2.0));
        assert_eq!(parse_px("2px"), Some(2.0));
        assert_eq!(parse_px("-1.5px"), Some(-1.5));
        assert_eq!(parse_px("none"), None);
        assert_eq!(parse_px(""), None);
    }

    #[test]
    fn gap_overrides_area_but_shares_its_base() {
        let chart = Chart::new()
            .area_attrs(
                PropertySet::new()
                    .set("stroke-width", 4)
                    .set_with("fill", |_, i| if i == 0 { "blue".into() } else { "red".into() }),
            )
            .gap_attrs(PropertySet::new().set("stroke-width", 2).set("fill", "teal"))
            .area_styles(PropertySet::new().set("stroke", "purple"));

        let evaluated = evaluate_definitions(&chart, &vec![], 0);
        let area = chunk_of(&evaluated, "area");
        let gap = chunk_of(&evaluated, "gap");

        assert_eq!(area.attrs.get("stroke-width").unwrap(), "4");
        assert_eq!(area.attrs.get("fill").unwrap(), "blue");
        assert_eq!(gap.attrs.get("stroke-width").unwrap(), "2");
        assert_eq!(gap.attrs.get("fill").unwrap(), "teal");
        assert_eq!(gap.styles.get("stroke").unwrap(), "purple");
    }

    #[test]
    fn area_chunk_entry_feeds_every_label() {
        let chart = Chart::new()
            .chunk_definition(
                "area",
                ChunkDefinition::new().attrs(PropertySet::new().set("fill", "blue")),
            )
            .chunk_definition(
                "chunk1",
                ChunkDefinition::new().attrs(PropertySet::new().set("stroke", "orange")),
            );

        let evaluated = evaluate_definitions(&chart, &vec![], 0);
        let chunk1 = chunk_of(&evaluated, "chunk1");
        assert_eq!(chunk1.attrs.get("fill").unwrap(), "blue");
        assert_eq!(chunk1.attrs.get("stroke").unwrap(), "orange");
    }

    #[test]
    fn marker_radius_derives_from_stroke_width() {
        let chart = Chart::new().area_attrs(PropertySet::new().set("stroke-width", 4));
        let evaluated = evaluate_definitions(&chart, &vec![], 0);
        assert_eq!(chunk_of(&evaluated, "area").point_attrs.get("r").unwrap(), "3");

        // no resolvable stroke width at all
        let chart = Chart::new().area_attrs(PropertySet::new().set("fill", "red"));
        let evaluated = evaluate_definitions(&chart, &vec![], 0);
        assert_eq!(chunk_of(&evaluated, "area").point_attrs.get("r").unwrap(), "2");
    }

    #[test]
    fn marker_radius_is_normalized_to_a_number() {
        let chart = Chart::new().point_attrs(PropertySet::new().set("r", "20px"));
        let evaluated = evaluate_definitions(&chart, &vec![], 0);
        assert_eq!(chunk_of(&evaluated, "area").point_attrs.get("r").unwrap(), "20");
    }

    #[test]
    fn marker_fill_attr_follows_area_fill() {
        let chart = Chart::new();
        let evaluated = evaluate_definitions(&chart, &vec![], 0);
        assert_eq!(
            chunk_of(&evaluated, "area").point_attrs.get("fill").unwrap(),
            "#222"
        );
    }

    #[test]
    fn marker_style_fill_falls_back_to_area_stroke() {
        let chart = Chart::new().area_styles(PropertySet::new().set("stroke", "purple"));
        let evaluated = evaluate_definitions(&chart, &vec![], 0);
        assert_eq!(
            chunk_of(&evaluated, "area").point_styles.get("fill").unwrap(),
            "purple"
        );

        // an explicit marker fill in the label's own attrs suppresses it
        let chart = Chart::new()
            .area_styles(PropertySet::new().set("stroke", "purple"))
            .chunk_definition(
                "area",
                ChunkDefinition::new()
                    .point_attrs(PropertySet::new().set("fill", "gold")),
            );
        let evaluated = evaluate_definitions(&chart, &vec![], 0);
        assert_eq!(chunk_of(&evaluated, "area").point_styles.get("fill"), None);
    }
}
