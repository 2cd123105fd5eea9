//! # Text Correction Module
//!
//! ## Purpose
//! Pure, idempotent fix-up pass over known data-entry inconsistencies in the
//! source text, applied once when a book is promoted from the persistent
//! cache or the document store into memory.
//!
//! The pass normalizes every text field to Unicode NFC and applies a fixed
//! substitution table. Both steps are idempotent, so re-running the pass on
//! already-corrected text is a no-op.

use crate::corpus::Book;
use crate::errors::{ReaderError, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Known data-entry errors in the source corpus and their corrections
const SUBSTITUTIONS: &[(&str, &str)] = &[
    // Misspelled commentator name
    ("\u{05d0}\u{05d1}\u{05df} \u{05e2}\u{05d6}\u{05e8}\u{05d4}", "\u{05d0}\u{05d1}\u{05df} \u{05e2}\u{05d6}\u{05e8}\u{05d0}"),
    // Euphemistic divine-name spelling carried over from the data source
    ("\u{05d9}\u{05e7}\u{05d5}\u{05e7}", "\u{05d9}\u{05d4}\u{05d5}\u{05d4}"),
];

/// Text correction pass over book documents
pub struct TextCorrector {
    substitutions: Vec<(Regex, &'static str)>,
}

impl TextCorrector {
    /// Compile the substitution table
    pub fn new() -> Result<Self> {
        let mut substitutions = Vec::with_capacity(SUBSTITUTIONS.len());
        for (pattern, replacement) in SUBSTITUTIONS {
            let regex = Regex::new(&regex::escape(pattern)).map_err(|e| ReaderError::Internal {
                message: format!("invalid substitution pattern: {}", e),
            })?;
            substitutions.push((regex, *replacement));
        }
        Ok(Self { substitutions })
    }

    /// Correct a single text field
    pub fn correct_text(&self, text: &str) -> String {
        let mut fixed: String = text.nfc().collect();
        for (regex, replacement) in &self.substitutions {
            if regex.is_match(&fixed) {
                fixed = regex.replace_all(&fixed, *replacement).into_owned();
            }
        }
        fixed
    }

    /// Correct every text field of a book document
    pub fn correct_book(&self, mut book: Book) -> Book {
        book.book_name = self.correct_text(&book.book_name);
        book.english_name = self.correct_text(&book.english_name);
        for section in &mut book.sections {
            section.section_name = self.correct_text(&section.section_name);
            for chapter in &mut section.chapters {
                for verse in &mut chapter.verses {
                    verse.text = self.correct_text(&verse.text);
                    for block in &mut verse.commentary {
                        block.title = self.correct_text(&block.title);
                        for question in &mut block.questions {
                            question.text = self.correct_text(&question.text);
                            for answer in &mut question.answers {
                                answer.source = self.correct_text(&answer.source);
                                answer.text = self.correct_text(&answer.text);
                            }
                        }
                    }
                }
            }
        }
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::fixtures::sample_book;

    #[test]
    fn test_substitutions_applied() {
        let corrector = TextCorrector::new().unwrap();
        let fixed = corrector.correct_text("\u{05d3}\u{05d1}\u{05e8} \u{05d9}\u{05e7}\u{05d5}\u{05e7}");
        assert_eq!(fixed, "\u{05d3}\u{05d1}\u{05e8} \u{05d9}\u{05d4}\u{05d5}\u{05d4}");
    }

    #[test]
    fn test_clean_text_untouched() {
        let corrector = TextCorrector::new().unwrap();
        let text = "In the beginning there was light";
        assert_eq!(corrector.correct_text(text), text);
    }

    #[test]
    fn test_correction_is_idempotent() {
        let corrector = TextCorrector::new().unwrap();
        let dirty = "\u{05d0}\u{05de}\u{05e8} \u{05d0}\u{05d1}\u{05df} \u{05e2}\u{05d6}\u{05e8}\u{05d4}: caf\u{0065}\u{0301}";
        let once = corrector.correct_text(dirty);
        let twice = corrector.correct_text(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_nfc_normalization() {
        let corrector = TextCorrector::new().unwrap();
        // Decomposed e + combining acute should collapse to the precomposed form
        let decomposed = "caf\u{0065}\u{0301}";
        assert_eq!(corrector.correct_text(decomposed), "caf\u{00e9}");
    }

    #[test]
    fn test_book_walk_reaches_commentary() {
        let corrector = TextCorrector::new().unwrap();
        let mut book = sample_book(1);
        book.sections[0].chapters[0].verses[0].commentary[0].questions[0]
            .answers[0]
            .source = "\u{05d0}\u{05d1}\u{05df} \u{05e2}\u{05d6}\u{05e8}\u{05d4}".to_string();

        let corrected = corrector.correct_book(book);
        assert_eq!(
            corrected.sections[0].chapters[0].verses[0].commentary[0].questions[0].answers[0]
                .source,
            "\u{05d0}\u{05d1}\u{05df} \u{05e2}\u{05d6}\u{05e8}\u{05d0}"
        );
    }

    #[test]
    fn test_correct_book_idempotent() {
        let corrector = TextCorrector::new().unwrap();
        let book = sample_book(3);
        let once = corrector.correct_book(book.clone());
        let twice = corrector.correct_book(once.clone());
        assert_eq!(once, twice);
    }
}
