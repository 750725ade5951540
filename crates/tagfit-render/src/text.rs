use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
    pub font_weight: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 16.0,
            font_weight: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Font-free measurer: every terminal column is `font_size * char_width_factor` wide.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl DeterministicTextMeasurer {
    pub fn normalized_text_lines(text: &str) -> Vec<String> {
        let t = text
            .replace("<br/>", "\n")
            .replace("<br />", "\n")
            .replace("<br>", "\n");
        let out = t.split('\n').map(|s| s.to_string()).collect::<Vec<_>>();
        if out.is_empty() {
            return vec!["".to_string()];
        }
        out
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let char_width_factor = if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        };
        let line_height_factor = if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        };

        let lines = Self::normalized_text_lines(text);
        let font_size = style.font_size.max(1.0);
        let mut max_columns = 0usize;
        for line in &lines {
            max_columns = max_columns.max(UnicodeWidthStr::width(line.as_str()));
        }

        let width = max_columns as f64 * font_size * char_width_factor;
        let height = lines.len() as f64 * font_size * line_height_factor;
        TextMetrics {
            width,
            height,
            line_count: lines.len(),
        }
    }
}

/// Collapses runs of whitespace the way `white-space: nowrap` renders them.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_width_scales_with_font_size() {
        let m = DeterministicTextMeasurer::default();
        let style = TextStyle {
            font_size: 40.0,
            ..Default::default()
        };
        let metrics = m.measure("too long", &style);
        assert_eq!(metrics.width, 8.0 * 40.0 * 0.6);
        assert_eq!(metrics.line_count, 1);

        let half = m.measure(
            "too long",
            &TextStyle {
                font_size: 20.0,
                ..Default::default()
            },
        );
        assert_eq!(half.width * 2.0, metrics.width);
    }

    #[test]
    fn wide_glyphs_take_two_columns() {
        let m = DeterministicTextMeasurer {
            char_width_factor: 0.5,
            line_height_factor: 1.0,
        };
        let style = TextStyle {
            font_size: 10.0,
            ..Default::default()
        };
        assert_eq!(m.measure("日本", &style).width, 20.0);
        assert_eq!(m.measure("ab<br>abcd", &style).width, 20.0);
        assert_eq!(m.measure("ab<br>abcd", &style).line_count, 2);
    }

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        assert_eq!(collapse_whitespace("  too \n  long "), "too long");
    }
}
