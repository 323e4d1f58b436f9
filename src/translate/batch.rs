use tracing::{debug, warn};

use super::{no_progress, ProgressFn, Translator, SEGMENT_SEPARATOR};
use crate::error::{JellysubError, Result};
use crate::subtitle::TranslationUnit;

/// Translate subtitle units, several per request.
///
/// Returns exactly one string per unit, in unit order. Blank units are passed
/// through without a request. When a batched answer does not split back into
/// the expected number of segments, that batch is retried one unit at a time.
/// `on_progress` receives `(translated, total)` over the non-blank units.
pub async fn translate_units(
    translator: &dyn Translator,
    units: &[TranslationUnit],
    batch_size: usize,
    on_progress: &ProgressFn<'_>,
) -> Result<Vec<String>> {
    let mut translated: Vec<String> = units.iter().map(|u| u.text.clone()).collect();
    let pending: Vec<usize> = units
        .iter()
        .enumerate()
        .filter(|(_, u)| !u.text.trim().is_empty())
        .map(|(i, _)| i)
        .collect();

    let total = pending.len();
    on_progress(0, total);

    let mut done = 0;
    for chunk in pending.chunks(batch_size.max(1)) {
        let texts: Vec<&str> = chunk.iter().map(|&i| units[i].text.as_str()).collect();
        let results = translate_chunk(translator, &texts).await?;
        for (&i, text) in chunk.iter().zip(results) {
            translated[i] = text;
        }

        done += chunk.len();
        on_progress(done, total);
    }

    Ok(translated)
}

/// Translate one unit; an empty answer for non-blank text is an error.
async fn translate_one(translator: &dyn Translator, text: &str) -> Result<String> {
    let translated = translator.translate(text, &no_progress).await?;
    let translated = translated.trim();
    if translated.is_empty() {
        return Err(JellysubError::Translation(format!(
            "{} returned an empty translation",
            translator.name()
        )));
    }
    Ok(translated.to_string())
}

async fn translate_chunk(translator: &dyn Translator, texts: &[&str]) -> Result<Vec<String>> {
    if texts.len() == 1 {
        return Ok(vec![translate_one(translator, texts[0]).await?]);
    }

    let separator = format!("\n{}\n", SEGMENT_SEPARATOR);
    let joined = texts.join(separator.as_str());
    let response = translator.translate(&joined, &no_progress).await?;

    let segments = split_segments(&response);
    let empty = segments.iter().filter(|s| s.is_empty()).count();
    if segments.len() == texts.len() && empty == 0 {
        debug!("Translated batch of {} segments with {}", texts.len(), translator.name());
        return Ok(segments);
    }

    warn!(
        "Expected {} translated segments from {}, got {} ({} empty); retrying line by line",
        texts.len(),
        translator.name(),
        segments.len(),
        empty
    );

    let mut results = Vec::with_capacity(texts.len());
    for text in texts {
        results.push(translate_one(translator, text).await?);
    }
    Ok(results)
}

/// Split a batched answer on the separator, ignoring a dangling trailing one.
fn split_segments(response: &str) -> Vec<String> {
    let mut segments: Vec<String> = response
        .split(SEGMENT_SEPARATOR)
        .map(|s| s.trim().to_string())
        .collect();

    if segments.len() > 1 && segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    segments
}
