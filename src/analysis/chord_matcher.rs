// Chord matching by cosine similarity against the chord dictionary

use super::{ChordMatch, ChromaVector};
use crate::config::ChordDetectionConfig;
use crate::theory::chords::{ChordTemplate, CHORDS};

/// Default acceptance threshold; lenient so soft strums still register
pub const DEFAULT_DETECTION_THRESHOLD: f32 = 0.55;

/// dot(a, b) / (|a| |b|), defined as 0 when either norm is 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = (norm_a * norm_b).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}

/// Scale a vector so its largest element is 1
///
/// A vector whose maximum is not positive is returned unchanged.
pub fn normalize_by_max(vector: &ChromaVector) -> ChromaVector {
    let max = vector.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max <= 0.0 || !max.is_finite() {
        return *vector;
    }
    let mut out = *vector;
    for v in out.iter_mut() {
        *v /= max;
    }
    out
}

/// Template matcher over an ordered chord dictionary
#[derive(Debug, Clone)]
pub struct ChordMatcher {
    templates: &'static [ChordTemplate],
    threshold: f32,
}

impl Default for ChordMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DETECTION_THRESHOLD)
    }
}

impl ChordMatcher {
    /// Matcher over the full curriculum
    pub fn new(threshold: f32) -> Self {
        Self::with_templates(&CHORDS, threshold)
    }

    /// Matcher over a custom ordered dictionary
    pub fn with_templates(templates: &'static [ChordTemplate], threshold: f32) -> Self {
        Self {
            templates,
            threshold,
        }
    }

    pub fn from_config(config: &ChordDetectionConfig) -> Self {
        Self::new(config.detection_threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Best-scoring template regardless of threshold
    ///
    /// Earlier templates win exact ties. `None` only for an empty dictionary.
    pub fn best_candidate(&self, vector: &ChromaVector) -> Option<ChordMatch> {
        let normalized = normalize_by_max(vector);
        let mut best: Option<(&ChordTemplate, f32)> = None;

        for template in self.templates {
            let similarity = cosine_similarity(&normalized, &template.chroma);
            let better = match best {
                None => true,
                Some((_, score)) => similarity > score,
            };
            if better {
                best = Some((template, similarity));
            }
        }

        best.map(|(template, confidence)| ChordMatch {
            chord: template.name.to_string(),
            confidence,
        })
    }

    /// Best match if its similarity reaches the threshold
    pub fn match_chord(&self, vector: &ChromaVector) -> Option<ChordMatch> {
        self.best_candidate(vector)
            .filter(|candidate| candidate.confidence >= self.threshold)
    }
}

/// Match against the full dictionary with the default threshold
pub fn match_chord(vector: &ChromaVector) -> Option<ChordMatch> {
    ChordMatcher::default().match_chord(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::chords;

    #[test]
    fn test_every_template_matches_itself() {
        for template in chords::curriculum() {
            let found = match_chord(&template.chroma).unwrap();
            assert!((found.confidence - 1.0).abs() < 1e-6, "{}", template.name);
            assert_eq!(found.chord, template.name);
        }
    }

    #[test]
    fn test_scaled_input_is_scale_invariant() {
        let em = chords::chord("Em").unwrap();
        let mut loud = em.chroma;
        for v in loud.iter_mut() {
            *v *= 37.5;
        }
        let found = match_chord(&loud).unwrap();
        assert_eq!(found.chord, "Em");
        assert!((found.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_has_no_match() {
        assert!(match_chord(&[0.0; 12]).is_none());
        let candidate = ChordMatcher::default().best_candidate(&[0.0; 12]).unwrap();
        assert_eq!(candidate.chord, "Em");
        assert_eq!(candidate.confidence, 0.0);
    }

    #[test]
    fn test_below_threshold_rejected() {
        // D# only appears in B7, at cos = 0.5
        let mut lone = [0.0; 12];
        lone[3] = 1.0;
        let best = ChordMatcher::default().best_candidate(&lone).unwrap();
        assert_eq!(best.chord, "B7");
        assert!(best.confidence < DEFAULT_DETECTION_THRESHOLD);
        assert!(match_chord(&lone).is_none());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let em = chords::chord("Em").unwrap();
        let exact = ChordMatcher::new(0.999).match_chord(&em.chroma);
        assert_eq!(exact.map(|m| m.chord), Some("Em".to_string()));
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_normalize_by_max() {
        let mut v = [0.0; 12];
        v[2] = 4.0;
        v[5] = 2.0;
        let n = normalize_by_max(&v);
        assert_eq!(n[2], 1.0);
        assert_eq!(n[5], 0.5);
        assert_eq!(normalize_by_max(&[0.0; 12]), [0.0; 12]);
    }
}
