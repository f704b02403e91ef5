//! Deterministic text layout for labels and quote panels. The renderer and
//! the hit-tester both derive panel rectangles from here, so a click always
//! lands on what was drawn.

/// Estimated average glyph advance for the 14px UI font
pub const CHAR_WIDTH: f32 = 7.2;
/// Font size used for labels and quotes
pub const FONT_SIZE: f32 = 14.0;
/// Line advance inside a quote panel
pub const LINE_HEIGHT: f32 = 20.0;
/// Inner padding of label and quote panels
pub const PANEL_PADDING: f32 = 10.0;
/// Gap between a circle's rim and its panel
pub const PANEL_GAP: f32 = 10.0;
/// Height of the idle name plate
pub const LABEL_HEIGHT: f32 = 30.0;
/// Maximum text width inside a quote panel
pub const QUOTE_MAX_WIDTH: f32 = 180.0;

/// Estimate rendered width at the fixed UI font.
pub fn measure_text(text: &str) -> f32 {
    text.chars().count() as f32 * CHAR_WIDTH
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn clean_whitespace(text: &str) -> String {
    let text = text.trim();
    let mut result = String::with_capacity(text.len());
    let mut last_was_whitespace = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_whitespace {
                result.push(' ');
                last_was_whitespace = true;
            }
        } else {
            result.push(c);
            last_was_whitespace = false;
        }
    }
    result
}

/// Drop any leading "Name:" style attribution the generator tacked on; only
/// the words spoken by the current circle are displayed.
pub fn strip_speaker_prefix(text: &str) -> &str {
    match text.rfind(':') {
        Some(idx) => text[idx + 1..].trim(),
        None => text.trim(),
    }
}

/// Greedy word wrap against the fixed-font measure. A single word longer
/// than `max_width` gets a line of its own and may exceed it.
pub fn wrap_words(text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let test = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if measure_text(&test) > max_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = test;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// The lines shown while a circle is speaking: its name, then the wrapped
/// quote with any attribution prefix removed.
pub fn quote_lines(speaker: &str, quote: &str) -> Vec<String> {
    let cleaned = clean_whitespace(strip_speaker_prefix(quote));
    let mut lines = vec![speaker.to_string()];
    lines.extend(wrap_words(&cleaned, QUOTE_MAX_WIDTH));
    lines
}

/// Axis-aligned panel rectangle in canvas coordinates (top-left anchored).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Panel {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// Name plate shown below an idle circle.
pub fn label_panel(cx: f32, cy: f32, radius: f32, speaker: &str) -> Panel {
    let width = measure_text(speaker) + 2.0 * PANEL_PADDING;
    Panel {
        x: cx - width / 2.0,
        y: cy + radius + PANEL_GAP,
        width,
        height: LABEL_HEIGHT,
    }
}

/// Quote panel shown below a speaking circle, sized for `line_count` lines.
pub fn quote_panel(cx: f32, cy: f32, radius: f32, line_count: usize) -> Panel {
    let width = QUOTE_MAX_WIDTH + 2.0 * PANEL_PADDING;
    Panel {
        x: cx - width / 2.0,
        y: cy + radius + PANEL_GAP,
        width,
        height: line_count as f32 * LINE_HEIGHT + 2.0 * PANEL_PADDING,
    }
}
