//! Terminal rendering of reveal units.

use super::markup::{TagKind, Unit};
use super::{Frame, FrameSink};
use owo_colors::OwoColorize;
use std::io::Write;

/// Streams revealed units to a terminal as styled text.
///
/// `<strong>`/`<b>` turn on bold, `<em>`/`<i>` italic, `<li>` starts a
/// bullet and `<br>` a new line. Other markup is dropped.
#[derive(Debug, Default)]
pub struct AnsiRenderer {
    colored: bool,
    bold: usize,
    italic: usize,
}

impl AnsiRenderer {
    pub fn new(colored: bool) -> Self {
        Self {
            colored,
            bold: 0,
            italic: 0,
        }
    }

    pub fn render(&mut self, units: &[Unit]) -> String {
        let mut out = String::new();
        for unit in units {
            match unit {
                Unit::Text(text) => self.push_text(&mut out, &decode_entity(text)),
                Unit::Tag(tag) => match (tag.name.as_str(), tag.kind) {
                    ("strong" | "b", TagKind::Open) => self.bold += 1,
                    ("strong" | "b", TagKind::Close) => self.bold = self.bold.saturating_sub(1),
                    ("em" | "i", TagKind::Open) => self.italic += 1,
                    ("em" | "i", TagKind::Close) => self.italic = self.italic.saturating_sub(1),
                    ("li", TagKind::Open) => out.push_str("  • "),
                    ("br", _) => out.push('\n'),
                    _ => {}
                },
            }
        }
        out
    }

    fn push_text(&self, out: &mut String, text: &str) {
        let styled = match (self.colored, self.bold > 0, self.italic > 0) {
            (false, _, _) | (true, false, false) => text.to_string(),
            (true, true, false) => text.bold().to_string(),
            (true, false, true) => text.italic().to_string(),
            (true, true, true) => text.bold().italic().to_string(),
        };
        out.push_str(&styled);
    }
}

fn decode_entity(text: &str) -> String {
    let Some(body) = text.strip_prefix('&').and_then(|t| t.strip_suffix(';')) else {
        return text.to_string();
    };

    let decoded = match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => body.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };

    decoded.map(String::from).unwrap_or_else(|| text.to_string())
}

/// [`FrameSink`] that writes each newly revealed slice to a writer.
pub struct TerminalSink<W: Write + Send> {
    writer: W,
    renderer: AnsiRenderer,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(writer: W, colored: bool) -> Self {
        Self {
            writer,
            renderer: AnsiRenderer::new(colored),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> FrameSink for TerminalSink<W> {
    fn render(&mut self, frame: &Frame, delta: &[Unit]) {
        let text = self.renderer.render(delta);
        // Terminal output is best-effort; a closed pipe just ends the effect.
        let _ = self.writer.write_all(text.as_bytes());
        if frame.is_done() {
            let _ = self.writer.write_all(b"\n");
        }
        let _ = self.writer.flush();
    }
}
