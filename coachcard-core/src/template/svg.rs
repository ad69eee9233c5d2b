///! SVG serialization of the workout day card

use super::{TABLE_HEADERS, VisualNode, escape_xml};

const CARD_SVG_TEMPLATE: &str = include_str!("../../resources/workout_card.svg");

/// Card geometry in the 1080-wide design space
struct CardLayout;

impl CardLayout {
    const DESIGN_WIDTH: f32 = 1080.0;
    const MARGIN_X: f32 = 40.0;
    const TABLE_WIDTH: f32 = 1000.0;

    const DAY_BAR_TOP: f32 = 200.0;
    const DAY_BAR_HEIGHT: f32 = 44.0;

    const TABLE_TOP: f32 = 268.0;
    const HEADER_HEIGHT: f32 = 60.0;
    const ROW_HEIGHT: f32 = 52.0;
    const MAX_NAME_CHARS: usize = 34;
    /// Relative column widths: name, series, reps, rest, rir, rpe
    const COLUMN_FRACTIONS: [f32; 6] = [2.5, 1.0, 1.0, 1.5, 0.8, 0.8];

    const SPACER_MIN: f32 = 40.0;
    const CARDIO_TITLE_HEIGHT: f32 = 56.0;
    const CARDIO_BOX_MIN_HEIGHT: f32 = 100.0;
    const CARDIO_LINE_HEIGHT: f32 = 24.0;
    const CARDIO_MAX_LINES: usize = 6;
    const NOTE_LINE_HEIGHT: f32 = 22.0;
    const NOTE_MAX_LINES: usize = 3;
    const FOOTER_HEIGHT: f32 = 56.0;

    /// Text wrapping uses an average glyph width estimate per font size
    const AVG_CHAR_WIDTH_16: f32 = 8.6;
    const AVG_CHAR_WIDTH_14: f32 = 7.6;

    fn design_height(node: &VisualNode) -> f32 {
        if node.width == 0 {
            return node.height as f32;
        }
        node.height as f32 * Self::DESIGN_WIDTH / node.width as f32
    }

    /// Left edge of every column plus the right edge of the table
    fn column_edges() -> [f32; 7] {
        let total: f32 = Self::COLUMN_FRACTIONS.iter().sum();
        let mut edges = [Self::MARGIN_X; 7];
        for (i, fraction) in Self::COLUMN_FRACTIONS.iter().enumerate() {
            edges[i + 1] = edges[i] + Self::TABLE_WIDTH * fraction / total;
        }
        edges
    }
}

pub(super) fn build_card_svg(node: &VisualNode) -> String {
    let design_height = CardLayout::design_height(node);
    let accent = node.accent.to_hex();

    let (table, table_bottom) = build_table(node, &accent);
    let bottom = BottomBlock::measure(node, design_height, table_bottom);

    CARD_SVG_TEMPLATE
        .replace("{{WIDTH}}", &node.width.to_string())
        .replace("{{HEIGHT}}", &node.height.to_string())
        .replace("{{DESIGN_HEIGHT}}", &format!("{:.0}", design_height))
        .replace("{{ACCENT}}", &accent)
        .replace("{{WEEK_TITLE}}", &escape_xml(&node.week_title()))
        .replace("{{DAY_BAR}}", &build_day_bar(node, &accent))
        .replace("{{TABLE}}", &table)
        .replace("{{CARDIO}}", &bottom.cardio_svg(&accent))
        .replace("{{NOTE}}", &bottom.note_svg())
        .replace("{{FOOTER}}", &bottom.footer_svg(&node.coach_handle))
}

fn build_day_bar(node: &VisualNode, accent: &str) -> String {
    let top = CardLayout::DAY_BAR_TOP;
    let height = CardLayout::DAY_BAR_HEIGHT;
    let mid_y = top + height / 2.0 + 6.0;

    let label_width = (node.day_label.chars().count() as f32 * 10.0 + 40.0).max(96.0);
    let muscle = node.muscle_group.to_uppercase();
    let muscle_width = (muscle.chars().count() as f32 * 14.0 + 64.0).max(160.0);
    let muscle_x = CardLayout::MARGIN_X + label_width;

    let mut out = String::new();
    out.push_str(&format!(
        r##"<rect x="{x}" y="{y}" width="{w:.0}" height="{h}" fill="#1a1a1a" stroke="#333333" stroke-width="1"/>"##,
        x = CardLayout::MARGIN_X,
        y = top,
        w = label_width,
        h = height,
    ));
    out.push_str(&format!(
        r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" class="day-label">{v}</text>"#,
        x = CardLayout::MARGIN_X + label_width / 2.0,
        y = mid_y,
        v = escape_xml(&node.day_label),
    ));
    out.push_str(&format!(
        r#"<rect x="{x:.1}" y="{y}" width="{w:.0}" height="{h}" fill="{accent}"/>"#,
        x = muscle_x,
        y = top,
        w = muscle_width,
        h = height,
        accent = accent,
    ));
    out.push_str(&format!(
        r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" class="muscle">{v}</text>"#,
        x = muscle_x + muscle_width / 2.0,
        y = mid_y,
        v = escape_xml(&muscle),
    ));
    out
}

/// Returns the table markup and the y coordinate of its bottom edge
fn build_table(node: &VisualNode, accent: &str) -> (String, f32) {
    let edges = CardLayout::column_edges();
    let top = CardLayout::TABLE_TOP;
    let header_bottom = top + CardLayout::HEADER_HEIGHT;
    let bottom = header_bottom + node.rows.len() as f32 * CardLayout::ROW_HEIGHT;

    let mut out = String::new();

    // Outer frame and header row
    out.push_str(&format!(
        r#"<rect x="{x}" y="{y}" width="{w}" height="{h:.0}" fill="none" stroke="{accent}" stroke-width="1"/>"#,
        x = CardLayout::MARGIN_X,
        y = top,
        w = CardLayout::TABLE_WIDTH,
        h = bottom - top,
        accent = accent,
    ));
    for (i, header) in TABLE_HEADERS.iter().enumerate() {
        let center_x = (edges[i] + edges[i + 1]) / 2.0;
        if let Some((first, second)) = header.split_once(' ') {
            out.push_str(&format!(
                r#"<text x="{x:.1}" y="{y1:.1}" text-anchor="middle" class="th-small accent">{a}</text><text x="{x:.1}" y="{y2:.1}" text-anchor="middle" class="th-small accent">{b}</text>"#,
                x = center_x,
                y1 = top + 27.0,
                y2 = top + 43.0,
                a = first,
                b = second,
            ));
        } else {
            out.push_str(&format!(
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" class="th accent">{v}</text>"#,
                x = center_x,
                y = top + CardLayout::HEADER_HEIGHT / 2.0 + 5.0,
                v = header,
            ));
        }
    }

    // Horizontal rules below the header and between rows
    for i in 0..node.rows.len() {
        let y = header_bottom + i as f32 * CardLayout::ROW_HEIGHT;
        out.push_str(&format!(
            r#"<line x1="{x1}" y1="{y:.0}" x2="{x2}" y2="{y:.0}" stroke="{accent}" stroke-width="1"/>"#,
            x1 = CardLayout::MARGIN_X,
            x2 = CardLayout::MARGIN_X + CardLayout::TABLE_WIDTH,
            y = y,
            accent = accent,
        ));
    }

    // Column dividers
    for edge in &edges[1..6] {
        out.push_str(&format!(
            r#"<line x1="{x:.1}" y1="{y1}" x2="{x:.1}" y2="{y2:.0}" stroke="{accent}" stroke-width="1"/>"#,
            x = edge,
            y1 = top,
            y2 = bottom,
            accent = accent,
        ));
    }

    for (row_index, row) in node.rows.iter().enumerate() {
        let mid_y = header_bottom
            + row_index as f32 * CardLayout::ROW_HEIGHT
            + CardLayout::ROW_HEIGHT / 2.0
            + 5.0;
        for (i, cell) in row.cells().iter().enumerate() {
            let value = if i == 0 {
                truncate_chars(cell, CardLayout::MAX_NAME_CHARS)
            } else {
                cell.to_string()
            };
            out.push_str(&format!(
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" class="td">{v}</text>"#,
                x = (edges[i] + edges[i + 1]) / 2.0,
                y = mid_y,
                v = escape_xml(&value),
            ));
        }
    }

    (out, bottom)
}

/// Cardio box, note and watermark, pinned to the bottom of the card
struct BottomBlock {
    cardio_title_y: f32,
    cardio_box_top: f32,
    cardio_box_height: f32,
    cardio_lines: Vec<String>,
    note_top: f32,
    note_lines: Vec<String>,
    footer_y: f32,
}

impl BottomBlock {
    fn measure(node: &VisualNode, design_height: f32, table_bottom: f32) -> Self {
        let text_width = CardLayout::TABLE_WIDTH - 48.0;

        let cardio_lines = wrap_text(
            &node.cardio_description,
            text_width / CardLayout::AVG_CHAR_WIDTH_16,
            CardLayout::CARDIO_MAX_LINES,
        );
        let note_lines = wrap_text(
            &format!("NOTA: {}", node.cardio_note),
            CardLayout::TABLE_WIDTH / CardLayout::AVG_CHAR_WIDTH_14,
            CardLayout::NOTE_MAX_LINES,
        );

        let cardio_box_height = (cardio_lines.len() as f32 * CardLayout::CARDIO_LINE_HEIGHT + 40.0)
            .max(CardLayout::CARDIO_BOX_MIN_HEIGHT);
        let note_height = note_lines.len() as f32 * CardLayout::NOTE_LINE_HEIGHT;

        let block_height = CardLayout::CARDIO_TITLE_HEIGHT
            + cardio_box_height
            + 32.0
            + note_height
            + CardLayout::FOOTER_HEIGHT;

        // Pinned to the bottom unless the table pushes it down
        let block_top = (design_height - block_height).max(table_bottom + CardLayout::SPACER_MIN);

        let cardio_box_top = block_top + CardLayout::CARDIO_TITLE_HEIGHT;
        let note_top = cardio_box_top + cardio_box_height + 32.0;

        Self {
            cardio_title_y: block_top + 36.0,
            cardio_box_top,
            cardio_box_height,
            cardio_lines,
            note_top,
            note_lines,
            footer_y: note_top + note_height + CardLayout::FOOTER_HEIGHT / 2.0 + 5.0,
        }
    }

    fn cardio_svg(&self, accent: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            r#"<text x="540" y="{y:.1}" text-anchor="middle" class="cardio-title accent" filter="url(#glow)">CARDIO</text>"#,
            y = self.cardio_title_y,
        ));
        out.push_str(&format!(
            r#"<rect x="{x}" y="{y:.1}" width="{w}" height="{h:.0}" rx="4" fill="none" stroke="{accent}" stroke-width="2"/>"#,
            x = CardLayout::MARGIN_X,
            y = self.cardio_box_top,
            w = CardLayout::TABLE_WIDTH,
            h = self.cardio_box_height,
            accent = accent,
        ));
        for (i, line) in self.cardio_lines.iter().enumerate() {
            out.push_str(&format!(
                r#"<text x="{x}" y="{y:.1}" class="cardio-text">{v}</text>"#,
                x = CardLayout::MARGIN_X + 24.0,
                y = self.cardio_box_top + 36.0 + i as f32 * CardLayout::CARDIO_LINE_HEIGHT,
                v = escape_xml(line),
            ));
        }
        out
    }

    fn note_svg(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.note_lines.iter().enumerate() {
            let y = self.note_top + 16.0 + i as f32 * CardLayout::NOTE_LINE_HEIGHT;
            let content = match (i, line.strip_prefix("NOTA:")) {
                (0, Some(rest)) => format!(
                    r#"<tspan class="note-label">NOTA:</tspan>{}"#,
                    escape_xml(rest)
                ),
                _ => escape_xml(line),
            };
            out.push_str(&format!(
                r#"<text x="{x}" y="{y:.1}" class="note" xml:space="preserve">{v}</text>"#,
                x = CardLayout::MARGIN_X,
                y = y,
                v = content,
            ));
        }
        out
    }

    fn footer_svg(&self, coach_handle: &str) -> String {
        format!(
            r#"<text x="540" y="{y:.1}" text-anchor="middle" class="watermark">{v}</text>"#,
            y = self.footer_y,
            v = escape_xml(coach_handle),
        )
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// Greedy word wrap by character budget; the last kept line gets an ellipsis
/// when text is dropped.
fn wrap_text(text: &str, max_chars_per_line: f32, max_lines: usize) -> Vec<String> {
    let budget = max_chars_per_line.max(1.0) as usize;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut truncated = false;

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > budget && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            if lines.len() == max_lines {
                truncated = true;
                break;
            }
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !truncated && !current.is_empty() {
        lines.push(current);
    }

    if truncated {
        if let Some(last) = lines.last_mut() {
            *last = truncate_chars(&format!("{} ...", last), budget);
            if !last.ends_with("...") {
                last.push_str("...");
            }
        }
    }

    lines
}
