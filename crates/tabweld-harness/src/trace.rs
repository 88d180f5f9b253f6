#![forbid(unsafe_code)]

//! Mutation-history export as a JSONL action trace.
//!
//! One line per recorded mutation, stable field order, no timestamps, so two
//! runs of the same scenario produce byte-identical traces.

use serde::Serialize;
use tabweld_host::{Actor, MutationKind, MutationRecord};

/// One trace line.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub seq: usize,
    pub actor: &'static str,
    pub target: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
}

/// Flatten document mutation history into trace records.
pub fn records(history: &[MutationRecord]) -> Vec<ActionRecord> {
    history
        .iter()
        .enumerate()
        .map(|(seq, rec)| {
            let actor = match rec.actor {
                Actor::Host => "host",
                Actor::Engine => "engine",
            };
            match &rec.kind {
                MutationKind::Attribute { name, old, new } => ActionRecord {
                    seq,
                    actor,
                    target: rec.target.to_string(),
                    kind: "attribute",
                    attribute: Some(name.clone()),
                    old: old.clone(),
                    new: new.clone(),
                },
                MutationKind::ChildList => ActionRecord {
                    seq,
                    actor,
                    target: rec.target.to_string(),
                    kind: "children",
                    attribute: None,
                    old: None,
                    new: None,
                },
            }
        })
        .collect()
}

/// Serialize records as JSON Lines.
pub fn to_jsonl(records: &[ActionRecord]) -> String {
    let mut out = String::new();
    for rec in records {
        // ActionRecord contains no map types, so serialization cannot fail.
        let line = serde_json::to_string(rec).expect("trace record serializes");
        out.push_str(&line);
        out.push('\n');
    }
    out
}
