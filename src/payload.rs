//! Token payloads for payload-aware search fields
//!
//! Open-class words are written as `lemma|score`, where the score rewards
//! the part of speech and, more strongly, subject/object/root dependencies.
//! Everything else passes through as plain text.

use crate::annotation::AnnotatedToken;
use std::collections::HashMap;

/// Universal POS tags that carry payloads
pub const OPEN_CLASS: [&str; 6] = ["ADJ", "ADV", "INTJ", "NOUN", "PROPN", "VERB"];

const DELIMITER: char = '|';

#[derive(Debug, Clone)]
pub struct Payloader {
    pos_scores: HashMap<String, f64>,
    dep_scores: HashMap<String, f64>,
}

impl Default for Payloader {
    fn default() -> Self {
        let pos_scores = [
            ("ADJ", 1.5),
            ("ADV", 1.5),
            ("INTJ", 1.0),
            ("NOUN", 2.5),
            ("PROPN", 2.0),
            ("VERB", 2.5),
        ];
        let dep_scores = [
            ("nsubjpass", 2.0),
            ("nsubj", 2.0),
            ("dobj", 2.0),
            ("pobj", 1.5),
            ("root", 2.0),
        ];
        Self::new(pos_scores, dep_scores)
    }
}

impl Payloader {
    pub fn new<P, D, S>(pos_scores: P, dep_scores: D) -> Self
    where
        P: IntoIterator<Item = (S, f64)>,
        D: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            pos_scores: pos_scores.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            // dependency labels compare case-insensitively ("ROOT" vs "root")
            dep_scores: dep_scores
                .into_iter()
                .map(|(k, v)| (k.into().to_lowercase(), v))
                .collect(),
        }
    }

    /// Score of one token, or `None` when it carries no payload
    pub fn score(&self, token: &AnnotatedToken) -> Option<f64> {
        if !token.is_alpha || token.lemma.is_empty() {
            return None;
        }
        let pos = token.pos.as_deref()?;
        let base = self.pos_scores.get(pos)?;
        let bonus = self.dep_scores.get(&token.dep.to_lowercase()).copied().unwrap_or(0.0);
        Some(base + bonus)
    }

    /// Encode a token stream as a space-separated payload field
    pub fn encode(&self, tokens: &[AnnotatedToken]) -> String {
        tokens
            .iter()
            .map(|token| {
                if token.text.contains(DELIMITER) {
                    return token.text.replace(DELIMITER, "");
                }
                match self.score(token) {
                    Some(score) => format!("{}{}{:?}", token.lemma, DELIMITER, score),
                    None => token.text.clone(),
                }
            })
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Encode with the default scores
pub fn encode(tokens: &[AnnotatedToken]) -> String {
    Payloader::default().encode(tokens)
}

/// Replace open-class words of an annotated query with their lemmas
pub fn lemmatize_query(tokens: &[AnnotatedToken]) -> String {
    tokens
        .iter()
        .map(|token| {
            let open = token.pos.as_deref().is_some_and(|pos| OPEN_CLASS.contains(&pos));
            if token.is_alpha && !token.lemma.is_empty() && open {
                token.lemma.as_str()
            } else {
                token.text.as_str()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
