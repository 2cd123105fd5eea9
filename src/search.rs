//! # Search Engine Module
//!
//! ## Purpose
//! Scores and ranks verses against a free-text query with optional
//! book/section/chapter filters. This module is a pure function over its
//! input; it never touches cache state. The worker module runs it off the
//! caller's execution context.
//!
//! ## Scoring
//! Per scanned sub-text (verse text, question texts, answer texts, chosen by
//! the search scope):
//! - +10 if the full lower-cased query is a substring
//! - +5 for each whitespace-separated query word present as a substring
//! - +2 additional bonus when that word occurs at the start of the text
//!
//! A verse's total is the sum over every scanned sub-text. Zero-total verses
//! are excluded; results are sorted by descending score with encounter order
//! breaking ties, then truncated.

use crate::corpus::FlattenedVerse;
use crate::BookId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum number of results returned per search
pub const MAX_RESULTS: usize = 50;

/// Which sub-texts of a verse are scanned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Verse text, questions, and answers
    #[default]
    All,
    /// Verse text only
    Verse,
    /// Commentary question texts only
    Question,
    /// Commentary answer texts only
    Answer,
}

/// Filters narrowing the candidate verse set.
///
/// A verse is excluded when a set filter does not equal the verse's
/// corresponding field; unset filters exclude nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub book: Option<BookId>,
    pub section: Option<u32>,
    pub chapter: Option<u32>,
    #[serde(default)]
    pub scope: SearchScope,
}

/// Score a single sub-text against the lower-cased query and its words
fn score_text(text: &str, query: &str, words: &[&str]) -> u32 {
    let lower = text.to_lowercase();
    let mut score = 0;

    // Full match
    if lower.contains(query) {
        score += 10;
    }

    // Each word match
    for word in words {
        if lower.contains(word) {
            score += 5;

            // Bonus for a word at the start of the text
            if lower.starts_with(word) {
                score += 2;
            }
        }
    }

    score
}

/// Accumulate a verse's score across the sub-texts selected by the scope
fn score_verse(verse: &FlattenedVerse, query: &str, words: &[&str], scope: SearchScope) -> u32 {
    let mut total = 0;

    if matches!(scope, SearchScope::All | SearchScope::Verse) {
        total += score_text(&verse.text, query, words);
    }

    for block in &verse.commentary {
        for question in &block.questions {
            if matches!(scope, SearchScope::All | SearchScope::Question) {
                total += score_text(&question.text, query, words);
            }
            if matches!(scope, SearchScope::All | SearchScope::Answer) {
                for answer in &question.answers {
                    total += score_text(&answer.text, query, words);
                }
            }
        }
    }

    total
}

/// Rank the corpus against a query, returning at most `limit` verses.
///
/// Deterministic for a fixed input: scoring is parallel but order-preserving,
/// and ties keep encounter order via the explicit index tiebreaker.
pub fn rank_verses(
    verses: &[FlattenedVerse],
    query: &str,
    filters: &SearchFilters,
    limit: usize,
) -> Vec<FlattenedVerse> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let words: Vec<&str> = query.split_whitespace().collect();

    let mut scored: Vec<(usize, u32, &FlattenedVerse)> = verses
        .par_iter()
        .enumerate()
        .filter_map(|(index, verse)| {
            if filters.book.is_some_and(|book| book != verse.book) {
                return None;
            }
            if filters.section.is_some_and(|section| section != verse.section_id) {
                return None;
            }
            if filters.chapter.is_some_and(|chapter| chapter != verse.chapter) {
                return None;
            }

            let score = score_verse(verse, &query, &words, filters.scope);
            (score > 0).then_some((index, score, verse))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(limit);
    scored.into_iter().map(|(_, _, verse)| verse.clone()).collect()
}
