//! Terminal rendering of a viewer's visible text.

use codeview_syntax::HighlightKind;

use crate::theme::Theme;
use crate::widget::CodeViewer;

const RESET: &str = "\x1b[0m";

/// What to draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Emit 24-bit ANSI colors from the viewer's theme
    pub color: bool,

    /// Stop after this many lines
    pub max_lines: Option<usize>,
}

/// Draws the viewer's text from its first visible line, one numbered line
/// of output per source line.
pub fn render(viewer: &CodeViewer, options: &RenderOptions) -> String {
    let theme = Theme::resolve(viewer.theme());
    let text = viewer.text();
    let kinds = kinds_by_byte(&text, viewer);

    let total = viewer.line_count();
    let width = total.to_string().len();
    let first = viewer.first_visible_line() - 1;
    let last = options
        .max_lines
        .map_or(total, |n| first.saturating_add(n).min(total));

    let mut out = String::new();
    for line_idx in first..last {
        let Ok(start) = viewer.buffer().line_to_byte(line_idx) else {
            break;
        };
        let end = viewer
            .buffer()
            .line_to_byte(line_idx + 1)
            .unwrap_or(text.len());
        let line = text[start..end].trim_end_matches(['\n', '\r']);

        if options.color {
            out.push_str(&theme.gutter.ansi_fg());
        }
        out.push_str(&format!("{:>width$} | ", line_idx + 1));

        let mut current = None;
        for (offset, ch) in line.char_indices() {
            if options.color {
                let kind = kinds[start + offset];
                if current != Some(kind) {
                    out.push_str(&theme.color(kind).ansi_fg());
                    current = Some(kind);
                }
            }
            out.push(ch);
        }
        if options.color {
            out.push_str(RESET);
        }
        out.push('\n');
    }
    out
}

/// Resolves the innermost highlight kind for every byte of `text`.
fn kinds_by_byte(text: &str, viewer: &CodeViewer) -> Vec<HighlightKind> {
    let mut kinds = vec![HighlightKind::None; text.len()];
    // Spans arrive parent first; later writes win
    for span in viewer.spans() {
        let end = span.end.min(text.len());
        let start = span.start.min(end);
        kinds[start..end].fill(span.kind);
    }
    kinds
}
