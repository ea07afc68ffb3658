use vader_sentiment::SentimentIntensityAnalyzer;

use crate::types::SentimentLabel;

/// VADER-based polarity scorer. The lexicon is fixed, so the same text
/// always yields the same compound score; the label is a pure threshold
/// function of the compound.
pub struct SentimentAnalyzer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    /// Score a piece of text: compound polarity in [-1, 1] plus its label.
    pub fn score(&self, text: &str) -> (f64, SentimentLabel) {
        if text.trim().is_empty() {
            return (0.0, SentimentLabel::Neutral);
        }
        let scores = self.analyzer.polarity_scores(text);
        let compound = scores.get("compound").copied().unwrap_or(0.0);
        (compound, SentimentLabel::from_compound(compound))
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoring_is_deterministic() {
        let analyzer = SentimentAnalyzer::new();
        let text = "Siemens posts record profit, shares surge on strong outlook.";
        let (first, first_label) = analyzer.score(text);
        let (second, second_label) = analyzer.score(text);
        assert_eq!(first, second);
        assert_eq!(first_label, second_label);
    }

    #[test]
    fn label_follows_compound_thresholds() {
        let analyzer = SentimentAnalyzer::new();
        for text in [
            "Great earnings beat, fantastic growth!",
            "The quarterly report was published on Tuesday.",
            "Catastrophic losses, lawsuit fears and a terrible crash.",
        ] {
            let (compound, label) = analyzer.score(text);
            assert_eq!(label, SentimentLabel::from_compound(compound));
            assert!((-1.0..=1.0).contains(&compound));
        }
    }

    #[test]
    fn empty_text_is_neutral() {
        let analyzer = SentimentAnalyzer::new();
        assert_eq!(analyzer.score("   "), (0.0, SentimentLabel::Neutral));
    }
}
