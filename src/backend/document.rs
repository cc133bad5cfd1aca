//! Span documents written to the graph index

use crate::chunk::{ContentType, Label};
use crate::group::ConceptGroup;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Field names of the graph index
pub mod fields {
    pub const ID: &str = "id";
    pub const KEY: &str = "key";
    pub const LABEL: &str = "label";
    pub const PREFLABEL: &str = "preflabel";
    pub const SENTENCEID: &str = "sentenceid";
    pub const OBJECTOF: &str = "objectof";
    pub const SUBJECTOF: &str = "subjectof";
    pub const CONTENTTYPE: &str = "contenttype";
    pub const CONCEPTLABEL: &str = "conceptlabel";
    pub const PREDICATELABEL: &str = "predicatelabel";
}

/// One span occurrence, flattened with its group's canonical label.
///
/// `sentenceid` is qualified by the document id so that sentence
/// co-occurrence queries never mix sentences of different documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub id: String,
    pub key: String,
    pub idiom: String,
    pub label: String,
    pub length: usize,
    pub start: usize,
    pub end: usize,
    pub docid: String,
    pub sentenceid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectof: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjectof: Option<String>,
    pub contenttype: ContentType,
    pub createtime: String,
    pub preflabel: String,
    pub prefcount: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conceptlabel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicatelabel: Option<String>,
}

impl GraphDocument {
    pub fn from_label(group: &ConceptGroup, label: &Label, content_type: ContentType, createtime: &str) -> Self {
        let surface = Some(label.label.clone());
        let (conceptlabel, predicatelabel) = match content_type {
            ContentType::Concept => (surface, None),
            ContentType::Predicate => (None, surface),
        };
        Self {
            id: document_id(&group.key, &label.docid, label.sentenceid),
            key: group.key.clone(),
            idiom: label.idiom.clone(),
            label: label.label.clone(),
            length: label.length,
            start: label.start,
            end: label.end,
            docid: label.docid.clone(),
            sentenceid: format!("{}_{}", label.docid, label.sentenceid),
            objectof: label.object_of.clone(),
            subjectof: label.subject_of.clone(),
            contenttype: content_type,
            createtime: createtime.to_string(),
            preflabel: group.preflabel.clone(),
            prefcount: group.prefcount,
            total: group.total,
            conceptlabel,
            predicatelabel,
        }
    }
}

/// `key_docid_sentenceid`: stable across reindexing of the same content
pub fn document_id(key: &str, docid: &str, sentenceid: usize) -> String {
    format!("{}_{}_{}", key, docid, sentenceid)
}

/// Flatten groups into one document per member label.
///
/// Repeated spans of one key in one sentence share an id, so the backend
/// keeps a single document for them.
pub fn graph_documents(groups: &[ConceptGroup], content_type: ContentType, createtime: DateTime<Utc>) -> Vec<GraphDocument> {
    let stamp = createtime.to_rfc3339_opts(SecondsFormat::Secs, true);
    groups
        .iter()
        .flat_map(|group| {
            group
                .labels
                .iter()
                .map(|label| GraphDocument::from_label(group, label, content_type, &stamp))
                .collect::<Vec<_>>()
        })
        .collect()
}
