//! Grouping of labels that share a key

use crate::chunk::Label;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// All spans of a batch that share one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptGroup {
    pub key: String,
    /// Number of member labels in the batch
    pub total: usize,
    /// Canonical display label. Batch-local until reconciled with the preflabel store.
    pub preflabel: String,
    /// Frequency of the batch-local preferred label
    pub prefcount: usize,
    /// Every surface form seen for the key, with its count
    pub alternates: BTreeMap<String, usize>,
    pub labels: Vec<Label>,
}

impl ConceptGroup {
    /// Build a group from its member labels.
    ///
    /// The preferred label is the most frequent surface form; ties go to the
    /// form seen first. Returns `None` for an empty member list.
    pub fn from_labels(key: impl Into<String>, labels: Vec<Label>) -> Option<Self> {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in &labels {
            let count = counts.entry(label.label.as_str()).or_insert(0);
            if *count == 0 {
                order.push(label.label.as_str());
            }
            *count += 1;
        }

        let mut best: Option<(&str, usize)> = None;
        for text in &order {
            let count = counts[text];
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((*text, count));
            }
        }
        let (preflabel, prefcount) = best?;

        let alternates = counts.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let preflabel = preflabel.to_string();

        Some(Self {
            key: key.into(),
            total: labels.len(),
            preflabel,
            prefcount,
            alternates,
            labels,
        })
    }
}

/// Outcome of grouping one batch.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    /// Groups by descending total; equal totals keep first-seen key order
    pub groups: Vec<ConceptGroup>,
    /// Keys discarded for having fewer than `min_labels` members
    pub dropped: usize,
}

/// Merges a batch's labels into ranked groups.
#[derive(Debug, Clone, Copy)]
pub struct Grouper {
    min_labels: usize,
}

impl Grouper {
    pub fn new(min_labels: usize) -> Self {
        Self { min_labels }
    }

    pub fn min_labels(&self) -> usize {
        self.min_labels
    }

    pub fn group(&self, labels: impl IntoIterator<Item = Label>) -> Grouping {
        let mut keys: Vec<String> = Vec::new();
        let mut members: HashMap<String, Vec<Label>> = HashMap::new();
        for label in labels {
            if !members.contains_key(&label.key) {
                keys.push(label.key.clone());
            }
            members.entry(label.key.clone()).or_default().push(label);
        }

        let mut grouping = Grouping::default();
        for key in keys {
            let labels = members.remove(&key).unwrap_or_default();
            if labels.len() < self.min_labels {
                grouping.dropped += 1;
                continue;
            }
            if let Some(group) = ConceptGroup::from_labels(key, labels) {
                grouping.groups.push(group);
            }
        }

        // sort_by is stable: ties stay in first-seen order
        grouping.groups.sort_by(|a, b| b.total.cmp(&a.total));
        grouping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(key: &str, text: &str, docid: &str) -> Label {
        Label {
            key: key.to_string(),
            idiom: key.to_string(),
            label: text.to_string(),
            length: 1,
            start: 0,
            end: 1,
            docid: docid.to_string(),
            sentenceid: 0,
            object_of: None,
            subject_of: None,
        }
    }

    #[test]
    fn singletons_are_dropped_below_min_labels() {
        let grouping = Grouper::new(2).group(vec![
            label("fox", "fox", "1"),
            label("fox", "foxes", "2"),
            label("den", "den", "3"),
        ]);
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].key, "fox");
        assert_eq!(grouping.dropped, 1);
    }

    #[test]
    fn preflabel_is_most_frequent_form() {
        let grouping = Grouper::new(1).group(vec![
            label("fox", "foxes", "1"),
            label("fox", "fox", "2"),
            label("fox", "fox", "3"),
        ]);
        let group = &grouping.groups[0];
        assert_eq!(group.preflabel, "fox");
        assert_eq!(group.prefcount, 2);
        assert_eq!(group.total, 3);
        assert_eq!(group.alternates.get("foxes"), Some(&1));
    }

    #[test]
    fn preflabel_tie_goes_to_first_seen() {
        let grouping = Grouper::new(1).group(vec![label("fox", "foxes", "1"), label("fox", "fox", "2")]);
        assert_eq!(grouping.groups[0].preflabel, "foxes");
    }

    #[test]
    fn alternates_sum_to_total() {
        let grouping = Grouper::new(1).group(vec![
            label("a_b", "a b", "1"),
            label("a_b", "b a", "2"),
            label("a_b", "a of b", "3"),
            label("a_b", "a b", "4"),
        ]);
        let group = &grouping.groups[0];
        assert_eq!(group.alternates.values().sum::<usize>(), group.total);
    }

    #[test]
    fn groups_sorted_by_total_with_stable_ties() {
        let grouping = Grouper::new(1).group(vec![
            label("den", "den", "1"),
            label("fox", "fox", "1"),
            label("hen", "hen", "1"),
            label("fox", "fox", "2"),
        ]);
        let keys: Vec<_> = grouping.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["fox", "den", "hen"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let grouping = Grouper::new(1).group(Vec::new());
        assert!(grouping.groups.is_empty());
        assert_eq!(grouping.dropped, 0);
    }
}
