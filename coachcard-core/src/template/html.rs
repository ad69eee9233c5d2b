//! HTML/CSS serialization of the workout day card, for the remote rendering API

use super::{TABLE_HEADERS, VisualNode, escape_xml};

const CARD_HTML_TEMPLATE: &str = include_str!("../../resources/workout_card.html");

pub(super) const CARD_CSS: &str = "* { margin: 0; padding: 0; box-sizing: border-box; } \
body { background: #0a0a0a; margin: 0; padding: 0; }";

/// Header cell widths in percent, same order as `TABLE_HEADERS`
const COLUMN_WIDTHS: [u32; 6] = [30, 11, 11, 18, 10, 10];

pub(super) fn build_card_html(node: &VisualNode) -> String {
    let accent = node.accent.to_hex();

    CARD_HTML_TEMPLATE
        .replace("{{WIDTH}}", &node.width.to_string())
        .replace("{{HEIGHT}}", &node.height.to_string())
        .replace("{{ACCENT}}", &accent)
        .replace("{{WEEK_TITLE}}", &escape_xml(&node.week_title()))
        .replace("{{DAY_LABEL}}", &escape_xml(&node.day_label))
        .replace("{{MUSCLE_GROUP}}", &escape_xml(&node.muscle_group.to_uppercase()))
        .replace("{{HEADER_CELLS}}", &header_cells(&accent))
        .replace("{{ROWS}}", &row_cells(node, &accent))
        .replace("{{CARDIO_DESCRIPTION}}", &escape_xml(&node.cardio_description))
        .replace("{{CARDIO_NOTE}}", &escape_xml(&node.cardio_note))
        .replace("{{COACH_HANDLE}}", &escape_xml(&node.coach_handle))
}

fn header_cells(accent: &str) -> String {
    TABLE_HEADERS
        .iter()
        .zip(COLUMN_WIDTHS)
        .map(|(header, width)| {
            let label = header.replace(' ', "<br>");
            let font_size = if label.contains("<br>") { 11 } else { 13 };
            format!(
                r#"<th style="padding: 12px 8px; text-align: center; border: 1px solid {accent}; font-size: {font_size}px; font-weight: 800; color: {accent}; letter-spacing: 1px; width: {width}%;">{label}</th>"#
            )
        })
        .collect()
}

fn row_cells(node: &VisualNode, accent: &str) -> String {
    let mut out = String::new();
    for row in &node.rows {
        out.push_str("<tr>");
        for cell in row.cells() {
            out.push_str(&format!(
                r#"<td style="padding: 14px 8px; text-align: center; border: 1px solid {accent}; color: #fff; font-size: 15px;">{v}</td>"#,
                v = escape_xml(cell),
            ));
        }
        out.push_str("</tr>");
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::template::{RenderContext, render};
    use coachcard_common::factory::{create_exercise, create_workout_day};

    #[test]
    fn test_html_rows_and_escaping() {
        let mut day = create_workout_day(4);
        day.muscle_group = "Hombro".to_string();
        day.exercises = vec![create_exercise("Press <militar>"), create_exercise("Elevaciones")];
        day.cardio.note = "Hidrátate & descansa".to_string();

        let node = render(&day, &RenderContext::new(2));
        let html = node.to_html();

        assert_eq!(html.matches("<tr>").count(), 3);
        assert!(html.contains("Press &lt;militar&gt;"));
        assert!(html.contains("Hidrátate &amp; descansa"));
        assert!(html.contains("SEMANA 2"));
        assert!(html.contains("HOMBRO"));
        assert!(html.contains("Dia 4"));
        assert!(html.contains("TIEMPO<br>DESCANSO"));
        assert!(html.contains("Pipetrainer_11"));
        assert!(!html.contains("{{"));
        assert!(node.stylesheet().contains("box-sizing"));
    }
}
