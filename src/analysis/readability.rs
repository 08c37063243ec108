//! Flesch reading-ease scoring for README prose.

use super::syllables::count_syllables;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::sync::OnceLock;

struct CleaningPatterns {
    block_close: Regex,
    tag: Regex,
    entity: Regex,
    separators: Regex,
    terminators: Regex,
    email: Regex,
    line_break: Regex,
    repeated_terminators: Regex,
    terminator_padding: Regex,
    whitespace: Regex,
}

fn cleaning() -> &'static CleaningPatterns {
    static PATTERNS: OnceLock<CleaningPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CleaningPatterns {
        block_close: Regex::new(r"(?i)</(li|p|h[1-6]|dd)\s*>").expect("valid regex"),
        tag: Regex::new(r"<[^>]+>").expect("valid regex"),
        entity: Regex::new(r"&(#[0-9]+|[a-zA-Z]+);").expect("valid regex"),
        separators: Regex::new(r"[,:;()/&+]|--").expect("valid regex"),
        terminators: Regex::new(r"[.!?]").expect("valid regex"),
        email: Regex::new(r"\.?(\w+)\.?(\w+)@(\w+)\.(\w+)\.?").expect("valid regex"),
        line_break: Regex::new(r"[ ]*(\r\n|\n|\r)[ ]*").expect("valid regex"),
        repeated_terminators: Regex::new(r"\.[. ]+").expect("valid regex"),
        terminator_padding: Regex::new(r"[ ]*\.").expect("valid regex"),
        whitespace: Regex::new(r"\s+").expect("valid regex"),
    })
}

/// Render CommonMark (with GitHub tables) to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// Reduce rendered HTML to plain sentences ending in `.` separated by spaces.
pub fn clean_text(html: &str) -> String {
    let p = cleaning();

    // Block elements end a sentence even when the author left off punctuation.
    let text = p.block_close.replace_all(html, ".$0");
    let text = p.tag.replace_all(&text, "");
    let text = p.entity.replace_all(&text, " ");
    let text = p.separators.replace_all(&text, " ");
    let text = p.terminators.replace_all(&text, ".");
    let text = text.trim_start();
    // Keep addresses like a.b@host.org as one word.
    let text = p.email.replace_all(text, "${1}${2}@${3}${4}");
    let text = p.line_break.replace_all(&text, " ");
    let text = p.repeated_terminators.replace_all(&text, ".");
    let text = p.terminator_padding.replace_all(&text, ". ");
    let text = p.whitespace.replace_all(&text, " ");

    let mut cleaned = text.trim_end().to_string();
    if !cleaned.ends_with('.') {
        cleaned.push('.');
    }
    cleaned
}

/// Counts gathered from cleaned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStatistics {
    pub words: usize,
    pub sentences: usize,
    pub syllables: usize,
}

impl TextStatistics {
    pub fn from_clean_text(text: &str) -> Self {
        let words: Vec<&str> = text
            .split_whitespace()
            .filter(|token| token.chars().any(char::is_alphanumeric))
            .collect();

        Self {
            words: words.len(),
            sentences: text.matches('.').count().max(1),
            syllables: words.iter().map(|w| count_syllables(w)).sum(),
        }
    }

    pub fn average_words_per_sentence(&self) -> f64 {
        self.words as f64 / self.sentences.max(1) as f64
    }

    pub fn average_syllables_per_word(&self) -> f64 {
        self.syllables.max(1) as f64 / self.words.max(1) as f64
    }

    /// Flesch reading ease, rounded to one decimal place.
    pub fn flesch_reading_ease(&self) -> f64 {
        let score = 206.835
            - 1.015 * self.average_words_per_sentence()
            - 84.6 * self.average_syllables_per_word();
        (score * 10.0).round() / 10.0
    }
}

/// Map a reading-ease score onto [0, 1].
///
/// Scores above 100 are divided by ten until they fit, so this is not
/// monotonic past the top of the scale.
pub fn normalize_reading_ease(score: f64) -> f64 {
    let mut normalized = (score / 100.0).abs();
    while normalized > 1.0 {
        normalized /= 10.0;
    }
    normalized
}

/// Full pipeline from README markdown to a [0, 1] score.
pub fn readability_score(markdown: &str) -> f64 {
    let cleaned = clean_text(&markdown_to_html(markdown));
    let stats = TextStatistics::from_clean_text(&cleaned);
    let ease = stats.flesch_reading_ease();
    log::debug!("readability: {stats:?} ease={ease}");
    normalize_reading_ease(ease)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_elements_become_sentences() {
        let cleaned = clean_text("<h1>Widget</h1><ul><li>fast</li><li>small</li></ul>");
        assert_eq!(cleaned, "Widget. fast. small.");
    }

    #[test]
    fn unifies_and_collapses_terminators() {
        let cleaned = clean_text("<p>Really?! Yes... it works, mostly</p>");
        assert_eq!(cleaned, "Really. Yes. it works mostly.");
    }

    #[test]
    fn email_periods_do_not_split_sentences() {
        let cleaned = clean_text("<p>Mail jane.doe@example.com today</p>");
        assert_eq!(cleaned, "Mail janedoe@examplecom today.");
        assert_eq!(TextStatistics::from_clean_text(&cleaned).sentences, 1);
    }

    #[test]
    fn always_ends_with_terminator() {
        assert_eq!(clean_text("plain words"), "plain words.");
        assert_eq!(clean_text(""), ".");
    }

    #[test]
    fn counts_words_sentences_and_syllables() {
        let stats = TextStatistics::from_clean_text("The cat sat on the mat. It was readable.");
        assert_eq!(stats.words, 9);
        assert_eq!(stats.sentences, 2);
        // 6 one-syllable words, then it(1) was(1) readable(3).
        assert_eq!(stats.syllables, 11);
    }

    #[test]
    fn simple_prose_scores_via_divide_by_ten() {
        // 206.835 - 1.015*6 - 84.6*1 = 116.145 -> 116.1 -> 1.161 -> 0.1161
        let score = readability_score("The cat sat on the mat.");
        assert!((score - 0.1161).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn normalization_keeps_in_range_scores() {
        assert!((normalize_reading_ease(65.0) - 0.65).abs() < 1e-12);
        assert!((normalize_reading_ease(-20.0) - 0.2).abs() < 1e-12);
        assert!((normalize_reading_ease(1500.0) - 0.15).abs() < 1e-12);
        assert_eq!(normalize_reading_ease(100.0), 1.0);
    }
}
