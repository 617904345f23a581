//! Lexicon-based polarity classifier.
//!
//! Each word found in the lexicon contributes its polarity, scaled by a
//! preceding intensifier ("very good") and flipped and halved by a preceding
//! negation ("not good"). The text score is the mean of those contributions.
//! Classification never fails: text without any scored word is `(0.0, Neutral)`.

use crate::models::{Sentiment, SentimentLabel};

const LEXICON: &[(&str, f64)] = &[
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("bad", -0.7),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("better", 0.5),
    ("brilliant", 0.9),
    ("broken", -0.4),
    ("cheap", 0.4),
    ("clean", 0.37),
    ("corrupt", -0.5),
    ("crazy", -0.6),
    ("dangerous", -0.6),
    ("difficult", -0.5),
    ("dirty", -0.6),
    ("disappointing", -0.6),
    ("easy", 0.43),
    ("effective", 0.6),
    ("excellent", 1.0),
    ("expensive", -0.5),
    ("fair", 0.7),
    ("fantastic", 0.4),
    ("fine", 0.42),
    ("free", 0.4),
    ("fun", 0.3),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("hate", -0.8),
    ("helpful", 0.4),
    ("hope", 0.3),
    ("horrible", -1.0),
    ("important", 0.4),
    ("impossible", -0.67),
    ("improve", 0.4),
    ("interesting", 0.5),
    ("love", 0.5),
    ("lovely", 0.5),
    ("nice", 0.6),
    ("perfect", 1.0),
    ("pleasant", 0.73),
    ("poor", -0.4),
    ("positive", 0.23),
    ("problem", -0.3),
    ("sad", -0.5),
    ("safe", 0.5),
    ("simple", 0.2),
    ("slow", -0.3),
    ("strong", 0.43),
    ("stupid", -0.8),
    ("success", 0.5),
    ("terrible", -1.0),
    ("ugly", -0.7),
    ("unfair", -0.5),
    ("useful", 0.3),
    ("useless", -0.5),
    ("weak", -0.38),
    ("wonderful", 1.0),
    ("worse", -0.4),
    ("worst", -1.0),
    ("wrong", -0.5),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.2),
    ("extremely", 1.5),
    ("so", 1.2),
    ("too", 1.2),
    ("quite", 1.1),
    ("slightly", 0.7),
    ("somewhat", 0.8),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "nothing", "neither", "nor", "without"];

const NEGATION_FACTOR: f64 = -0.5;

fn polarity(word: &str) -> Option<f64> {
    LEXICON
        .binary_search_by(|(w, _)| w.cmp(&word))
        .ok()
        .map(|i| LEXICON[i].1)
}

fn intensity(word: &str) -> Option<f64> {
    INTENSIFIERS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, f)| *f)
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

/// Continuous polarity in [-1, 1].
pub fn polarity_score(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let words = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty());

    let mut contributions = Vec::new();
    let mut negated = false;
    let mut factor = 1.0;

    for word in words {
        if is_negation(word) {
            negated = true;
            continue;
        }
        if let Some(f) = intensity(word) {
            factor *= f;
            continue;
        }
        if let Some(p) = polarity(word) {
            let mut value = (p * factor).clamp(-1.0, 1.0);
            if negated {
                value *= NEGATION_FACTOR;
            }
            contributions.push(value);
        }
        negated = false;
        factor = 1.0;
    }

    if contributions.is_empty() {
        return 0.0;
    }
    let mean = contributions.iter().sum::<f64>() / contributions.len() as f64;
    if mean.is_finite() {
        mean.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Score and label a text. Deterministic and infallible.
pub fn classify(text: &str) -> Sentiment {
    let score = polarity_score(text);
    Sentiment {
        score,
        label: SentimentLabel::from_score(score),
    }
}
