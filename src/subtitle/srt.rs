use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::error::{Result, JellysubError};
use super::{ensure_unit_count, strip_bom, SubtitleAdapter, TranslationUnit};

static TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})",
    )
    .unwrap()
});

/// A numbered, timed SRT cue
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// Cue number as written in the source
    pub number: String,
    /// Timing line as written in the source, including any position hints
    pub timing: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Cues of the source document; their text is replaced on reinjection
#[derive(Debug)]
pub struct SrtContext {
    cues: Vec<Cue>,
}

/// Plain-timed adapter: one unit per cue
#[derive(Debug, Clone, Copy, Default)]
pub struct SrtAdapter;

fn timestamp_ms(caps: &Captures, first: usize) -> u64 {
    let part = |i: usize| caps[first + i].parse::<u64>().unwrap_or_default();
    part(0) * 3_600_000 + part(1) * 60_000 + part(2) * 1_000 + part(3)
}

/// Parse an SRT document into its cues.
pub fn parse_srt(raw: &str) -> Result<Vec<Cue>> {
    let mut lines = strip_bom(raw).lines().peekable();
    let mut cues = Vec::new();

    loop {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }
        let Some(number_line) = lines.next() else {
            break;
        };

        let number = number_line.trim();
        if number.parse::<u64>().is_err() {
            return Err(JellysubError::Format(format!(
                "expected cue number after cue {}, found '{}'",
                cues.len(),
                number
            )));
        }

        let timing = lines
            .next()
            .ok_or_else(|| JellysubError::Format(format!("cue {} has no timing line", number)))?;
        let caps = TIMING_LINE.captures(timing).ok_or_else(|| {
            JellysubError::Format(format!("cue {} has invalid timing line '{}'", number, timing.trim()))
        })?;

        let start_ms = timestamp_ms(&caps, 1);
        let end_ms = timestamp_ms(&caps, 5);
        if end_ms < start_ms {
            return Err(JellysubError::Format(format!(
                "cue {} ends before it starts: '{}'",
                number,
                timing.trim()
            )));
        }

        let mut text_lines = Vec::new();
        while let Some(&line) = lines.peek() {
            if line.trim().is_empty() {
                break;
            }
            text_lines.push(line.trim_end());
            lines.next();
        }

        cues.push(Cue {
            number: number.to_string(),
            timing: timing.trim().to_string(),
            start_ms,
            end_ms,
            text: text_lines.join("\n"),
        });
    }

    if cues.is_empty() {
        return Err(JellysubError::Format("no subtitle cues found".to_string()));
    }

    Ok(cues)
}

impl SubtitleAdapter for SrtAdapter {
    type Context = SrtContext;

    fn extract(&self, raw: &str) -> Result<(Vec<TranslationUnit>, SrtContext)> {
        let cues = parse_srt(raw)?;
        let units = cues
            .iter()
            .enumerate()
            .map(|(index, cue)| TranslationUnit {
                index,
                text: cue.text.clone(),
            })
            .collect();

        Ok((units, SrtContext { cues }))
    }

    fn reinject(&self, translated: Vec<String>, context: SrtContext) -> Result<String> {
        ensure_unit_count(context.cues.len(), translated.len())?;

        let mut out = String::new();
        for (cue, text) in context.cues.iter().zip(translated) {
            // A blank line would end the cue early
            let text = text
                .lines()
                .map(str::trim_end)
                .filter(|l| !l.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            out.push_str(&format!("{}\n{}\n{}\n\n", cue.number, cue.timing, text));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n\
00:00:01,000 --> 00:00:04,000\n\
Hello, world!\n\
\n\
2\n\
00:00:05,500 --> 00:00:07,250 X1:100 X2:200\n\
First line\n\
Second line\n\
\n\
3\n\
01:02:03,004 --> 01:02:05,000\n\
<i>Bye</i>\n\
\n";

    #[test]
    fn test_parse_cues() {
        let cues = parse_srt(SAMPLE).unwrap();
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].start_ms, 1_000);
        assert_eq!(cues[1].end_ms, 7_250);
        assert_eq!(cues[1].text, "First line\nSecond line");
        assert_eq!(cues[1].timing, "00:00:05,500 --> 00:00:07,250 X1:100 X2:200");
        assert_eq!(cues[2].start_ms, 3_723_004);
    }

    #[test]
    fn test_crlf_and_bom_are_accepted() {
        let raw = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nYo\r\n";
        let cues = parse_srt(raw).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "Hi");
        assert_eq!(cues[1].timing, "00:00:03,000 --> 00:00:04,000");
    }

    #[test]
    fn test_identity_round_trip() {
        let (units, context) = SrtAdapter.extract(SAMPLE).unwrap();
        assert_eq!(units.len(), 3);
        let texts = units.into_iter().map(|u| u.text).collect();
        assert_eq!(SrtAdapter.reinject(texts, context).unwrap(), SAMPLE);
    }

    #[test]
    fn test_reinject_keeps_numbers_and_timing() {
        let (_, context) = SrtAdapter.extract(SAMPLE).unwrap();
        let out = SrtAdapter
            .reinject(vec!["Bonjour".into(), "Ligne un\nLigne deux".into(), "Salut".into()], context)
            .unwrap();
        let reparsed = parse_srt(&out).unwrap();
        assert_eq!(reparsed[0].text, "Bonjour");
        assert_eq!(reparsed[1].timing, "00:00:05,500 --> 00:00:07,250 X1:100 X2:200");
        assert_eq!(reparsed[1].text, "Ligne un\nLigne deux");
        assert_eq!(reparsed[2].number, "3");
    }

    #[test]
    fn test_bad_timing_is_format_error() {
        let err = parse_srt("1\n00:00:01 -> 00:00:02\nHello\n").unwrap_err();
        assert!(matches!(err, JellysubError::Format(_)));
    }

    #[test]
    fn test_reversed_timing_is_format_error() {
        let err = parse_srt("1\n00:00:05,000 --> 00:00:04,999\nHello\n").unwrap_err();
        assert!(matches!(err, JellysubError::Format(_)));
    }

    #[test]
    fn test_missing_number_is_format_error() {
        let err = parse_srt("[Script Info]\nTitle: not srt\n").unwrap_err();
        assert!(matches!(err, JellysubError::Format(_)));
    }

    #[test]
    fn test_empty_document_is_format_error() {
        assert!(matches!(parse_srt("\n\n").unwrap_err(), JellysubError::Format(_)));
    }
}
