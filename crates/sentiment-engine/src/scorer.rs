/// Bullish keywords. Each one found in a text adds a point.
pub const BULLISH_WORDS: &[&str] = &[
    "buy", "bullish", "moon", "long", "undervalued", "growth", "high", "good", "great", "win",
    "profit", "up", "call", "green",
];

/// Bearish keywords. Each one found in a text removes a point.
pub const BEARISH_WORDS: &[&str] = &[
    "sell", "bearish", "crash", "short", "overvalued", "dump", "low", "bad", "terrible", "loss",
    "down", "put", "red", "bankrupt",
];

/// Stateless lexical classifier over two fixed word lists.
pub struct KeywordScorer {
    bullish: Vec<&'static str>,
    bearish: Vec<&'static str>,
}

impl KeywordScorer {
    pub fn new() -> Self {
        Self::with_lexicon(BULLISH_WORDS, BEARISH_WORDS)
    }

    pub fn with_lexicon(bullish: &[&'static str], bearish: &[&'static str]) -> Self {
        Self {
            bullish: bullish.to_vec(),
            bearish: bearish.to_vec(),
        }
    }

    /// Signed presence score over the lowercased text.
    ///
    /// Each list word contributes at most one point however often it
    /// appears: presence, not frequency.
    pub fn score(&self, text: &str) -> i32 {
        let text = text.to_lowercase();
        let mut score = 0;
        for word in &self.bullish {
            if text.contains(word) {
                score += 1;
            }
        }
        for word in &self.bearish {
            if text.contains(word) {
                score -= 1;
            }
        }
        score
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new()
    }
}
