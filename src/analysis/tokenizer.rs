//! Word tokenization and frequency ranking.
//!
//! The input is lower-cased, then split into maximal runs of letters joined
//! by single internal apostrophes (`don't`, `rock'n'roll`). Digits,
//! punctuation and whitespace only ever separate tokens.

use std::{collections::HashMap, sync::OnceLock};

use regex::Regex;

use crate::db::models::WordFrequency;

/// Only the most frequent words are kept per analysis.
pub const TOP_WORDS: usize = 10;

fn word_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{L}+(?:'\p{L}+)*").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextAnalysis {
    /// Every token in the text, counted before truncation.
    pub total_words: u64,
    /// At most [`TOP_WORDS`] entries, highest count first.
    pub frequencies: Vec<WordCount>,
}

impl TextAnalysis {
    /// Assign 1-based ranks and percentages of `total_words`.
    pub fn ranked(&self) -> Vec<WordFrequency> {
        self.frequencies
            .iter()
            .enumerate()
            .map(|(index, entry)| WordFrequency {
                word: entry.word.clone(),
                count: entry.count,
                percentage: format_percentage(entry.count, self.total_words),
                rank: index as u32 + 1,
            })
            .collect()
    }
}

/// Lower-cased tokens in text order, duplicates included.
pub fn tokenize(text: &str) -> Vec<String> {
    let folded = text.to_lowercase();
    word_pattern()
        .find_iter(&folded)
        .map(|token| token.as_str().to_string())
        .collect()
}

pub fn analyze_text(text: &str) -> TextAnalysis {
    let tokens = tokenize(text);
    let total_words = tokens.len() as u64;

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<WordCount> = Vec::new();

    for token in &tokens {
        match positions.get(token.as_str()) {
            Some(&index) => counts[index].count += 1,
            None => {
                positions.insert(token, counts.len());
                counts.push(WordCount {
                    word: token.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable: equal counts stay in first-occurrence order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_WORDS);

    TextAnalysis {
        total_words,
        frequencies: counts,
    }
}

/// `count / total * 100` to two decimals, halves rounded up.
fn format_percentage(count: u64, total: u64) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    let hundredths = (count * 20_000 + total) / (2 * total);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(analysis: &TextAnalysis) -> Vec<&str> {
        analysis.frequencies.iter().map(|f| f.word.as_str()).collect()
    }

    #[test]
    fn test_quick_brown_fox() {
        let analysis = analyze_text("The quick brown fox jumps over the lazy dog");

        assert_eq!(analysis.total_words, 9);
        assert_eq!(
            analysis.frequencies[0],
            WordCount {
                word: "the".into(),
                count: 2
            }
        );
        assert_eq!(
            words(&analysis)[1..],
            ["quick", "brown", "fox", "jumps", "over", "lazy", "dog"]
        );
        assert!(analysis.frequencies[1..].iter().all(|f| f.count == 1));

        let ranked = analysis.ranked();
        let ranks: Vec<u32> = ranked.iter().map(|f| f.rank).collect();
        assert_eq!(ranks, (1..=8).collect::<Vec<_>>());
        assert_eq!(ranked[0].percentage, "22.22");
        assert_eq!(ranked[1].percentage, "11.11");
    }

    #[test]
    fn test_empty_and_tokenless_input() {
        assert_eq!(analyze_text(""), TextAnalysis::default());
        assert_eq!(analyze_text("  123 !!! 4.5 -- "), TextAnalysis::default());
        assert!(analyze_text("").ranked().is_empty());
    }

    #[test]
    fn test_apostrophes_and_separators() {
        assert_eq!(
            tokenize("Don't stop: it's 2am, rock-n-roll's 'quoted'"),
            vec!["don't", "stop", "it's", "am", "rock", "n", "roll's", "quoted"]
        );
        // Doubled apostrophes separate.
        assert_eq!(tokenize("a''b"), vec!["a", "b"]);
        assert_eq!(tokenize("abc123def"), vec!["abc", "def"]);
    }

    #[test]
    fn test_chained_apostrophes_stay_one_token() {
        assert_eq!(
            tokenize("Rock'n'roll O'Neill's"),
            vec!["rock'n'roll", "o'neill's"]
        );
        assert_eq!(tokenize("it's' 'tis"), vec!["it's", "tis"]);
    }

    #[test]
    fn test_percentage_rounds_halves_up() {
        assert_eq!(format_percentage(1, 800), "0.13");
        assert_eq!(format_percentage(3, 800), "0.38");
        assert_eq!(format_percentage(5, 800), "0.63");
        assert_eq!(format_percentage(2, 3), "66.67");
        assert_eq!(format_percentage(1, 3), "33.33");
        assert_eq!(format_percentage(4, 4), "100.00");
        assert_eq!(format_percentage(0, 0), "0.00");
    }

    #[test]
    fn test_ranked_percentage_over_many_distinct_words() {
        let alphabet: Vec<char> = ('a'..='z').collect();
        let text = (0..800)
            .map(|n| {
                [alphabet[n / 676], alphabet[n / 26 % 26], alphabet[n % 26]]
                    .iter()
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(" ");

        let analysis = analyze_text(&text);
        assert_eq!(analysis.total_words, 800);
        assert_eq!(analysis.ranked()[0].percentage, "0.13");
    }

    #[test]
    fn test_case_folding_groups_words() {
        let analysis = analyze_text("Apple apple APPLE banana");
        assert_eq!(analysis.total_words, 4);
        assert_eq!(
            analysis.frequencies,
            vec![
                WordCount {
                    word: "apple".into(),
                    count: 3
                },
                WordCount {
                    word: "banana".into(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_ties_keep_first_occurrence_order() {
        let analysis = analyze_text("b a c a b c d");
        assert_eq!(words(&analysis), ["b", "a", "c", "d"]);
    }

    #[test]
    fn test_truncates_to_top_words_but_counts_everything() {
        let text = "one two three four five six seven eight nine ten eleven twelve twelve";
        let analysis = analyze_text(text);

        assert_eq!(analysis.total_words, 13);
        assert_eq!(analysis.frequencies.len(), TOP_WORDS);
        assert_eq!(analysis.frequencies[0].word, "twelve");
        assert_eq!(analysis.frequencies[0].count, 2);
        assert_eq!(words(&analysis)[TOP_WORDS - 1], "nine");

        let ranks: Vec<u32> = analysis.ranked().iter().map(|f| f.rank).collect();
        assert_eq!(ranks, (1..=TOP_WORDS as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_counts_sum_to_total_and_match_token_count() {
        let samples = [
            "It was the best of times, it was the worst of times.",
            "Don't panic. DON'T PANIC!",
            "a b c d e f g h i j",
            "",
        ];
        for text in samples {
            let analysis = analyze_text(text);
            let sum: u64 = analysis.frequencies.iter().map(|f| f.count).sum();
            assert_eq!(sum, analysis.total_words, "text: {text:?}");
            assert_eq!(tokenize(text).len() as u64, analysis.total_words);

            for pair in analysis.frequencies.windows(2) {
                assert!(pair[0].count >= pair[1].count);
            }
        }
    }
}
