//! Eligibility check and stream choice for a single library item.

use crate::server::{MediaItem, SubtitleStreamDescriptor};
use crate::subtitle::SubtitleCodec;

/// Pick the subtitle stream to translate for `item`, if it needs translating.
///
/// Only streams with a declared language and a supported codec are considered.
/// `None` means the item is not a candidate, or one of those streams is already
/// in `target_language`. Otherwise the first stream of the highest-priority
/// codec wins, in the order the server reported them.
pub fn select_stream<'a>(
    item: &'a MediaItem,
    target_language: &str,
) -> Option<&'a SubtitleStreamDescriptor> {
    let candidates: Vec<(&SubtitleStreamDescriptor, SubtitleCodec)> = item
        .streams
        .iter()
        .filter(|s| s.language.as_deref().is_some_and(|l| !l.trim().is_empty()))
        .filter_map(|s| s.subtitle_codec().map(|codec| (s, codec)))
        .collect();

    if candidates.is_empty() {
        return None;
    }

    let already_translated = candidates.iter().any(|(s, _)| {
        s.language
            .as_deref()
            .is_some_and(|l| l.trim().eq_ignore_ascii_case(target_language))
    });
    if already_translated {
        return None;
    }

    SubtitleCodec::PRIORITY.iter().find_map(|wanted| {
        candidates
            .iter()
            .find(|(_, codec)| codec == wanted)
            .map(|(s, _)| *s)
    })
}
