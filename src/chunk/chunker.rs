//! Span chunking state machine
//!
//! Walks the terms of one sentence and emits concept spans (runs of nouns and
//! adjectives) and predicate spans (runs of verbs and adverbs). A span may
//! absorb up to `max_slop` consecutive function words; punctuation always
//! closes it. The chunker holds no state between sentences.

use super::label::{Label, SentenceRef, SpanBuffer};
use super::term::{Term, TermBuilder};
use super::tags::TagClass;
use crate::annotation::AnnotatedToken;
use serde::{Deserialize, Serialize};

/// Span limits for the chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Consecutive non-content terms tolerated inside an open span
    pub max_slop: usize,
    pub max_concept_length: usize,
    pub max_predicate_length: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_slop: 4,
            max_concept_length: 4,
            max_predicate_length: 4,
        }
    }
}

/// Spans found in one sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceChunks {
    pub concepts: Vec<Label>,
    pub predicates: Vec<Label>,
}

impl SentenceChunks {
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty() && self.predicates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InConcept,
    InPredicate,
}

#[derive(Debug, Clone)]
pub struct Chunker {
    builder: TermBuilder,
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(builder: TermBuilder, config: ChunkerConfig) -> Self {
        Self { builder, config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn term_builder(&self) -> &TermBuilder {
        &self.builder
    }

    /// Chunk one sentence of annotated tokens. Noise tokens build no term but
    /// keep their token position.
    pub fn chunk_sentence(&self, tokens: &[AnnotatedToken], at: &SentenceRef) -> SentenceChunks {
        let terms = tokens
            .iter()
            .enumerate()
            .filter_map(|(position, tok)| self.builder.build(tok).map(|term| (position, term)));
        self.chunk_positioned(terms, at)
    }

    /// Chunk an already-built term sequence, one position per term.
    pub fn chunk_terms(&self, terms: impl IntoIterator<Item = Term>, at: &SentenceRef) -> SentenceChunks {
        self.chunk_positioned(terms.into_iter().enumerate(), at)
    }

    fn chunk_positioned(&self, terms: impl IntoIterator<Item = (usize, Term)>, at: &SentenceRef) -> SentenceChunks {
        let mut run = Run::new(self, at);
        for (position, term) in terms {
            run.step(term, position);
        }
        run.finish()
    }
}

/// One pass over a sentence.
struct Run<'a> {
    chunker: &'a Chunker,
    at: &'a SentenceRef,
    state: State,
    buffer: SpanBuffer,
    out: SentenceChunks,
}

impl<'a> Run<'a> {
    fn new(chunker: &'a Chunker, at: &'a SentenceRef) -> Self {
        Self {
            chunker,
            at,
            state: State::Idle,
            buffer: SpanBuffer::default(),
            out: SentenceChunks::default(),
        }
    }

    fn step(&mut self, term: Term, position: usize) {
        let tags = self.chunker.builder.tags();
        let config = &self.chunker.config;

        if term.class == TagClass::Concept && term.is_alpha {
            if self.state == State::InPredicate {
                self.flush();
            }
            self.state = State::InConcept;
            let form = term.concept_form().to_string();
            self.buffer.push_content(&form, term, position);
            if self.buffer.content_len() >= config.max_concept_length {
                self.flush();
            }
        } else if term.class == TagClass::Predicate && term.is_alpha && !tags.is_excluded_dep(&term.dep) {
            if self.state == State::InConcept {
                self.flush();
            }
            self.state = State::InPredicate;
            let form = term.predicate_form().to_string();
            self.buffer.push_content(&form, term, position);
            if self.buffer.content_len() >= config.max_predicate_length {
                self.flush();
            }
        } else if self.state != State::Idle {
            let closes = tags.is_punctuation(&term.norm)
                || (self.state == State::InPredicate && tags.is_excluded_dep(&term.dep));
            self.buffer.push_slop(term, position);
            if closes || self.buffer.slop > config.max_slop {
                self.flush();
            }
        }
    }

    /// Emit the open span, if any, and return to idle.
    fn flush(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        let tags = self.chunker.builder.tags();
        let label = buffer.into_label(self.at, |f| tags.is_punctuation(f));
        match (self.state, label) {
            (State::InConcept, Some(label)) => self.out.concepts.push(label),
            (State::InPredicate, Some(label)) => self.out.predicates.push(label),
            _ => {}
        }
        self.state = State::Idle;
    }

    fn finish(mut self) -> SentenceChunks {
        self.flush();
        self.out
    }
}
