//! Shared fixtures for spangraph integration tests
//!
//! A tiny hand-annotated corpus about foxes, dogs and their habits, plus
//! builders for writing more sentences in the same shape.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use spangraph::{AnnotatedDocument, AnnotatedSentence, AnnotatedToken, EnrichConfig};

pub fn token(text: &str, lemma: &str, tag: &str, dep: &str) -> AnnotatedToken {
    AnnotatedToken::new(text, tag, dep).with_lemma(lemma)
}

/// `<subject> <verb> [the] <object> .` with subject/object governed by the verb
pub fn clause(subject: (&str, &str), verb: (&str, &str), object: (&str, &str), determiner: bool) -> AnnotatedSentence {
    let mut tokens = vec![
        token(subject.0, subject.1, "NN", "nsubj").with_head("VBZ", verb.1),
        token(verb.0, verb.1, "VBZ", "ROOT"),
    ];
    if determiner {
        tokens.push(token("the", "the", "DT", "det").with_head("NN", object.1));
    }
    tokens.push(token(object.0, object.1, "NN", "dobj").with_head("VBZ", verb.1));
    tokens.push(token(".", ".", ".", "punct").with_head("VBZ", verb.1));
    tokens
}

pub fn document(id: &str, sentences: Vec<AnnotatedSentence>) -> AnnotatedDocument {
    AnnotatedDocument {
        payload: json!({"id": id, "title": format!("doc {}", id)}),
        sentences,
    }
}

/// Foxes chase dogs. The fox digs dens. / A fox chases rabbits. Dogs chase the fox.
pub fn corpus() -> Vec<AnnotatedDocument> {
    vec![
        document(
            "1",
            vec![
                clause(("foxes", "fox"), ("chase", "chase"), ("dogs", "dog"), false),
                clause(("fox", "fox"), ("digs", "dig"), ("dens", "den"), false),
            ],
        ),
        document(
            "2",
            vec![
                clause(("fox", "fox"), ("chases", "chase"), ("rabbits", "rabbit"), false),
                clause(("dogs", "dog"), ("chase", "chase"), ("fox", "fox"), true),
            ],
        ),
    ]
}

/// Keeps every span and every group, however short or rare
pub fn permissive() -> EnrichConfig {
    EnrichConfig {
        min_concept_length: 1,
        min_predicate_length: 1,
        min_labels: 1,
        ..Default::default()
    }
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}
