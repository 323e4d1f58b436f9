//! Advanced SubStation Alpha documents.
//!
//! Only the parts the translator touches are parsed: the font field of style
//! records and the text field of `Dialogue:` events. Every other byte of the
//! document, line endings included, is carried through unchanged.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Result, JellysubError};
use super::{ensure_unit_count, strip_bom, SubtitleAdapter, TranslationUnit};

/// Inline override blocks such as `{\i1}` or `{\pos(10,20)}`
static OVERRIDE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{.+?\}").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Events sections default to the v4+ layout: Layer, Start, End, Style, Name,
/// MarginL, MarginR, MarginV, Effect, Text
const DEFAULT_EVENT_FIELDS: usize = 10;

/// Fontname is the second style field unless a Format line says otherwise
const DEFAULT_FONT_FIELD: usize = 1;

#[derive(Debug)]
enum AssLine {
    Verbatim(String),
    Style { head: String, font: String, tail: String },
    Dialogue { head: String, tags: String, ending: String },
}

/// Parsed document minus the translatable dialogue text
#[derive(Debug)]
pub struct AssContext {
    lines: Vec<AssLine>,
    unit_count: usize,
}

/// Tag-based adapter: one unit per dialogue event, override tags kept aside
#[derive(Debug, Clone, Default)]
pub struct AssAdapter {
    font_name: Option<String>,
}

impl AssAdapter {
    /// `font_name`, when set, replaces the font of every style record.
    pub fn new(font_name: Option<String>) -> Self {
        Self { font_name }
    }
}

/// Split event text into its concatenated override tags and normalized plain text.
pub fn split_event_text(text: &str) -> (String, String) {
    let tags: String = OVERRIDE_TAG.find_iter(text).map(|m| m.as_str()).collect();

    let plain = OVERRIDE_TAG.replace_all(text, "");
    let plain = plain.replace("\\N", "\n").replace("\\n", "\n");

    (tags, collapse_whitespace(&plain))
}

/// Line breaks become spaces along with every other whitespace run.
fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Rebuild event text from the original tag run and a translated line.
pub fn join_event_text(tags: &str, text: &str) -> String {
    format!("{}{}", tags, collapse_whitespace(text))
}

fn split_line_ending(piece: &str) -> (&str, &str) {
    if let Some(content) = piece.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = piece.strip_suffix('\n') {
        (content, "\n")
    } else {
        (piece, "")
    }
}

/// Byte offset in `body` where comma-separated field `n` starts.
fn nth_field_start(body: &str, n: usize) -> Option<usize> {
    if n == 0 {
        return Some(0);
    }
    body.match_indices(',').nth(n - 1).map(|(i, _)| i + 1)
}

/// Offset of the first byte after `key` in a line whose trimmed form starts with it.
fn value_offset(content: &str, key: &str) -> usize {
    content.len() - content.trim_start().len() + key.len()
}

impl SubtitleAdapter for AssAdapter {
    type Context = AssContext;

    fn extract(&self, raw: &str) -> Result<(Vec<TranslationUnit>, AssContext)> {
        let mut lines = Vec::new();
        let mut units = Vec::new();
        let mut section = String::new();
        let mut saw_events = false;
        let mut font_field = DEFAULT_FONT_FIELD;
        let mut event_fields = DEFAULT_EVENT_FIELDS;

        for (line_no, piece) in raw.split_inclusive('\n').enumerate() {
            let (content, ending) = split_line_ending(piece);
            let trimmed = strip_bom(content).trim();

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                section = trimmed.to_lowercase();
                saw_events |= section == "[events]";
                lines.push(AssLine::Verbatim(piece.to_string()));
                continue;
            }

            match section.as_str() {
                "[v4+ styles]" | "[v4 styles]" => {
                    if let Some(fields) = trimmed.strip_prefix("Format:") {
                        font_field = fields
                            .split(',')
                            .position(|f| f.trim().eq_ignore_ascii_case("fontname"))
                            .ok_or_else(|| {
                                JellysubError::Format(format!(
                                    "line {}: style format has no Fontname field",
                                    line_no + 1
                                ))
                            })?;
                    } else if trimmed.starts_with("Style:") {
                        let offset = value_offset(content, "Style:");
                        let body = &content[offset..];
                        let field_start = nth_field_start(body, font_field).ok_or_else(|| {
                            JellysubError::Format(format!("line {}: malformed style record", line_no + 1))
                        })?;
                        let end = body[field_start..].find(',').map_or(body.len(), |i| field_start + i);
                        let field = &body[field_start..end];
                        let start = field_start + (field.len() - field.trim_start().len());

                        lines.push(AssLine::Style {
                            head: content[..offset + start].to_string(),
                            font: body[start..end].to_string(),
                            tail: format!("{}{}", &body[end..], ending),
                        });
                        continue;
                    }
                }
                "[events]" => {
                    if let Some(fields) = trimmed.strip_prefix("Format:") {
                        event_fields = fields.split(',').count();
                    } else if trimmed.starts_with("Dialogue:") {
                        let offset = value_offset(content, "Dialogue:");
                        let body = &content[offset..];
                        let start = nth_field_start(body, event_fields - 1).ok_or_else(|| {
                            JellysubError::Format(format!(
                                "line {}: dialogue event has fewer than {} fields",
                                line_no + 1,
                                event_fields
                            ))
                        })?;

                        let (tags, text) = split_event_text(&body[start..]);
                        units.push(TranslationUnit {
                            index: units.len(),
                            text,
                        });
                        lines.push(AssLine::Dialogue {
                            head: content[..offset + start].to_string(),
                            tags,
                            ending: ending.to_string(),
                        });
                        continue;
                    }
                }
                _ => {}
            }

            lines.push(AssLine::Verbatim(piece.to_string()));
        }

        if !saw_events {
            return Err(JellysubError::Format("missing [Events] section".to_string()));
        }

        let unit_count = units.len();
        Ok((units, AssContext { lines, unit_count }))
    }

    fn reinject(&self, translated: Vec<String>, context: AssContext) -> Result<String> {
        ensure_unit_count(context.unit_count, translated.len())?;

        let mut texts = translated.into_iter();
        let mut out = String::new();

        for line in context.lines {
            match line {
                AssLine::Verbatim(raw) => out.push_str(&raw),
                AssLine::Style { head, font, tail } => {
                    out.push_str(&head);
                    out.push_str(self.font_name.as_deref().unwrap_or(&font));
                    out.push_str(&tail);
                }
                AssLine::Dialogue { head, tags, ending } => {
                    let text = texts.next().unwrap_or_default();
                    out.push_str(&head);
                    out.push_str(&join_event_text(&tags, &text));
                    out.push_str(&ending);
                }
            }
        }

        Ok(out)
    }
}
