// FormatSelector - picks the single playable rendition
//
// Only combined (progressive) formats qualify. Adaptive audio-only and
// video-only streams are skipped whatever their quality.

use super::models::Format;

pub struct FormatSelector;

impl FormatSelector {
    /// Best combined format: highest `quality_rank`, first one wins on ties.
    ///
    /// `None` is a normal outcome; many videos only ship split streams.
    pub fn select_best(formats: &[Format]) -> Option<&Format> {
        // Iterator::max_by_key keeps the *last* maximum, so fold by hand.
        formats
            .iter()
            .filter(|f| f.is_combined())
            .fold(None, |best: Option<&Format>, candidate| match best {
                Some(b) if b.quality_rank >= candidate.quality_rank => Some(b),
                _ => Some(candidate),
            })
    }

    /// Ordinal for a quality label such as "1080p60" or "720p HDR"
    pub fn rank_from_label(label: &str) -> Option<u32> {
        let digits: String = label
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}
