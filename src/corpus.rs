//! # Corpus Data Model
//!
//! ## Purpose
//! Defines the immutable document tree for the five-book corpus and the
//! flattened verse projection consumed by the search engine and virtualized
//! rendering.
//!
//! ## Structure
//! Book -> Section -> Chapter -> Verse -> CommentaryBlock -> Question -> Answer.
//! Books are immutable once defined; only their cached copies have lifecycle.
//! `FlattenedVerse` is a derived, ephemeral projection produced fresh from a
//! book document and never persisted.

use crate::BookId;
use serde::{Deserialize, Serialize};

/// Top-level document, one of the five books of the corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub book_name: String,
    pub english_name: String,
    pub sections: Vec<Section>,
}

/// Named subdivision of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section_id: u32,
    pub section_name: String,
    pub chapters: Vec<Chapter>,
}

/// Numbered subdivision of a section, 1-based and unique within a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter_num: u32,
    pub verses: Vec<Verse>,
}

/// Numbered leaf content unit, 1-based and unique within a chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub id: u64,
    pub verse_num: u32,
    pub text: String,
    #[serde(default)]
    pub commentary: Vec<CommentaryBlock>,
}

/// Commentary thread attached to a verse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentaryBlock {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub questions: Vec<Question>,
}

/// Question raised within a commentary block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub text: String,
    pub answers: Vec<Answer>,
}

/// Attributed answer to a commentary question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: u64,
    pub source: String,
    pub text: String,
}

/// Denormalized verse projection carrying its position metadata.
///
/// This is the unit the search engine and the virtualized renderer operate
/// on. Recomputed whenever the source book or active filters change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedVerse {
    pub id: u64,
    pub book: BookId,
    pub book_name: String,
    pub section_id: u32,
    pub section_name: String,
    pub chapter: u32,
    pub verse_num: u32,
    pub text: String,
    pub commentary: Vec<CommentaryBlock>,
}

/// Flatten a book into its verse projections, in reading order
pub fn flatten_book(book: &Book) -> Vec<FlattenedVerse> {
    let mut flat = Vec::with_capacity(verse_count(book));
    for section in &book.sections {
        for chapter in &section.chapters {
            for verse in &chapter.verses {
                flat.push(FlattenedVerse {
                    id: verse.id,
                    book: book.book_id,
                    book_name: book.book_name.clone(),
                    section_id: section.section_id,
                    section_name: section.section_name.clone(),
                    chapter: chapter.chapter_num,
                    verse_num: verse.verse_num,
                    text: verse.text.clone(),
                    commentary: verse.commentary.clone(),
                });
            }
        }
    }
    flat
}

/// Total number of verses in a book
pub fn verse_count(book: &Book) -> usize {
    book.sections
        .iter()
        .flat_map(|s| &s.chapters)
        .map(|c| c.verses.len())
        .sum()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a small two-section book with commentary for tests
    pub fn sample_book(book_id: BookId) -> Book {
        let answer = |id, source: &str, text: &str| Answer {
            id,
            source: source.to_string(),
            text: text.to_string(),
        };

        Book {
            book_id,
            book_name: format!("Book {}", book_id),
            english_name: format!("English {}", book_id),
            sections: vec![
                Section {
                    section_id: 1,
                    section_name: "Opening".to_string(),
                    chapters: vec![Chapter {
                        chapter_num: 1,
                        verses: vec![
                            Verse {
                                id: u64::from(book_id) * 1000 + 1,
                                verse_num: 1,
                                text: "In the beginning there was light".to_string(),
                                commentary: vec![CommentaryBlock {
                                    id: 1,
                                    title: "On beginnings".to_string(),
                                    questions: vec![Question {
                                        id: 1,
                                        text: "Why does it open with light?".to_string(),
                                        answers: vec![answer(
                                            1,
                                            "First Commentator",
                                            "Light precedes all ordering",
                                        )],
                                    }],
                                }],
                            },
                            Verse {
                                id: u64::from(book_id) * 1000 + 2,
                                verse_num: 2,
                                text: "And the waters gathered below".to_string(),
                                commentary: vec![],
                            },
                        ],
                    }],
                },
                Section {
                    section_id: 2,
                    section_name: "Journey".to_string(),
                    chapters: vec![Chapter {
                        chapter_num: 2,
                        verses: vec![Verse {
                            id: u64::from(book_id) * 1000 + 3,
                            verse_num: 1,
                            text: "They walked toward the mountain".to_string(),
                            commentary: vec![],
                        }],
                    }],
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_book;
    use super::*;

    #[test]
    fn test_flatten_preserves_reading_order() {
        let book = sample_book(2);
        let flat = flatten_book(&book);

        assert_eq!(flat.len(), 3);
        assert_eq!(flat.len(), verse_count(&book));
        assert_eq!(flat[0].section_id, 1);
        assert_eq!(flat[0].chapter, 1);
        assert_eq!(flat[0].verse_num, 1);
        assert_eq!(flat[2].section_id, 2);
        assert_eq!(flat[2].chapter, 2);
        assert!(flat.iter().all(|v| v.book == 2));
        assert!(flat.iter().all(|v| v.book_name == "Book 2"));
    }

    #[test]
    fn test_flatten_carries_commentary() {
        let book = sample_book(1);
        let flat = flatten_book(&book);

        assert_eq!(flat[0].commentary.len(), 1);
        assert_eq!(flat[0].commentary[0].questions.len(), 1);
        assert!(flat[1].commentary.is_empty());
    }

    #[test]
    fn test_json_roundtrip() {
        let book = sample_book(4);
        let json = serde_json::to_string(&book).unwrap();
        let parsed: Book = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, book);
    }

    #[test]
    fn test_missing_commentary_defaults_to_empty() {
        let raw = r#"{
            "book_id": 1,
            "book_name": "Book 1",
            "english_name": "English 1",
            "sections": [{
                "section_id": 1,
                "section_name": "Opening",
                "chapters": [{
                    "chapter_num": 1,
                    "verses": [{"id": 1, "verse_num": 1, "text": "A verse"}]
                }]
            }]
        }"#;
        let book: Book = serde_json::from_str(raw).unwrap();
        assert!(book.sections[0].chapters[0].verses[0].commentary.is_empty());
    }
}
