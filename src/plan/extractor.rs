//! Recover a plan from free-form generated text
//!
//! One pass over the text records every balanced `[...]` span, then:
//!
//! 1. after each `JSON:` marker (whitespace allowed), the span starting
//!    there;
//! 2. otherwise the earliest span holding an object at its top level.
//!
//! Quotes inside an open array delimit string literals, so `"]"` inside a
//! value does not close the span. A candidate must be a JSON array of
//! objects; the objects themselves are read leniently. Extraction never
//! fails loudly: anything that cannot be recovered becomes `Plan::Failed`
//! carrying the raw text.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use super::types::{Plan, PlanStep};

pub const PLAN_MARKER: &str = "JSON:";
pub const PARSE_ERROR: &str = "Could not parse plan";

/// A balanced bracket span, `start..end` in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArraySpan {
    start: usize,
    end: usize,
    has_top_level_object: bool,
}

enum Open {
    Array { start: usize, has_top_level_object: bool },
    Object,
}

/// Every balanced `[...]` span keyed by its start offset. Linear in the
/// text length; unclosed brackets simply never produce a span.
fn array_spans(bytes: &[u8]) -> HashMap<usize, ArraySpan> {
    let mut spans = HashMap::new();
    let mut open: Vec<Open> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (at, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            // prose quotes outside any array are not string delimiters
            b'"' if !open.is_empty() => in_string = true,
            b'[' => open.push(Open::Array {
                start: at,
                has_top_level_object: false,
            }),
            b'{' if !open.is_empty() => {
                if let Some(Open::Array {
                    has_top_level_object,
                    ..
                }) = open.last_mut()
                {
                    *has_top_level_object = true;
                }
                open.push(Open::Object);
            }
            b'}' => {
                if matches!(open.last(), Some(Open::Object)) {
                    open.pop();
                }
            }
            b']' => {
                // unclosed objects inside the array are dropped with it
                while let Some(frame) = open.pop() {
                    if let Open::Array {
                        start,
                        has_top_level_object,
                    } = frame
                    {
                        spans.insert(
                            start,
                            ArraySpan {
                                start,
                                end: at + 1,
                                has_top_level_object,
                            },
                        );
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    spans
}

/// Array of objects, each read as a `PlanStep`
fn parse_steps(candidate: &str) -> Option<Vec<PlanStep>> {
    let items: Vec<Value> = match serde_json::from_str(candidate) {
        Ok(items) => items,
        Err(e) => {
            debug!("Plan candidate rejected: {}", e);
            return None;
        }
    };

    items
        .into_iter()
        .map(|item| {
            if !item.is_object() {
                debug!("Plan candidate rejected: element is not an object");
                return None;
            }
            serde_json::from_value::<PlanStep>(item)
                .map_err(|e| debug!("Plan candidate rejected: {}", e))
                .ok()
        })
        .collect()
}

/// Candidates following a `JSON:` marker, in text order
fn marked_candidates<'a>(
    text: &'a str,
    spans: &'a HashMap<usize, ArraySpan>,
) -> impl Iterator<Item = &'a str> + 'a {
    let bytes = text.as_bytes();
    text.match_indices(PLAN_MARKER).filter_map(move |(at, _)| {
        let after = at + PLAN_MARKER.len();
        let start = after + bytes[after..].iter().take_while(|b| b.is_ascii_whitespace()).count();
        spans.get(&start).map(|span| &text[span.start..span.end])
    })
}

/// Earliest span with an object at its top level
fn first_object_array<'a>(text: &'a str, spans: &HashMap<usize, ArraySpan>) -> Option<&'a str> {
    spans
        .values()
        .filter(|span| span.has_top_level_object)
        .min_by_key(|span| span.start)
        .map(|span| &text[span.start..span.end])
}

/// Extract the plan from generated text
pub fn extract(raw: &str) -> Plan {
    let spans = array_spans(raw.as_bytes());

    for candidate in marked_candidates(raw, &spans) {
        if let Some(steps) = parse_steps(candidate) {
            debug!(steps = steps.len(), "Plan extracted after marker");
            return Plan::Steps(steps);
        }
    }

    if let Some(steps) = first_object_array(raw, &spans).and_then(parse_steps) {
        debug!(steps = steps.len(), "Plan extracted from bare array");
        return Plan::Steps(steps);
    }

    Plan::failed(PARSE_ERROR, Some(raw.to_string()))
}
