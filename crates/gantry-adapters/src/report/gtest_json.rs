//! Google Test JSON report parser
//!
//! The JSON output nests test cases under suite/group containers whose key
//! varies by level (`testsuites`, `testsuite`, `testcases`, `tests`,
//! `children`). The walk builds a dotted test name from the chain of
//! ancestor `name` fields and keeps descending past leaf nodes.

use serde_json::Value;

use gantry_core::{CaseResult, CaseStatus, RunResult};

use super::duration::suffixed_ms;

const CONTAINER_KEYS: [&str; 5] = ["testsuites", "testsuite", "testcases", "tests", "children"];

/// Parse Google Test JSON output into a `RunResult`.
pub fn parse(json_text: &str, transcript: &str) -> RunResult {
    let mut result = RunResult {
        raw_output: transcript.to_string(),
        ..Default::default()
    };

    let Ok(payload) = serde_json::from_str::<Value>(json_text) else {
        return result;
    };
    if !payload.is_object() {
        return result;
    }

    let mut cases = Vec::new();
    walk(&payload, &mut Vec::new(), &mut cases);
    for case in cases {
        result.push_case(case);
    }

    result.recompute_success();
    result
}

fn walk(node: &Value, parents: &mut Vec<String>, out: &mut Vec<CaseResult>) {
    match node {
        Value::Array(items) => {
            for item in items {
                walk(item, parents, out);
            }
        }
        Value::Object(map) => {
            let current_name = map.get("name").and_then(Value::as_str).unwrap_or("");
            let pushed = !current_name.is_empty();
            if pushed {
                parents.push(current_name.to_string());
            }

            // A node is a leaf case when it carries a status/result field
            // or a failures list
            if is_leaf_case(node) {
                let (status, failure_message) = status_and_failure(node);
                let duration_ms = node
                    .get("time")
                    .or_else(|| node.get("duration"))
                    .map(duration_value_ms)
                    .unwrap_or(0.0);
                let name = if parents.is_empty() {
                    "unknown".to_string()
                } else {
                    parents.join(".")
                };

                out.push(CaseResult {
                    name,
                    status,
                    duration_ms,
                    failure_message,
                    file_path: node
                        .get("file")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                });
            }

            // Containers are traversed regardless of leaf-ness
            for key in CONTAINER_KEYS {
                if let Some(child) = map.get(key) {
                    walk(child, parents, out);
                }
            }

            if pushed {
                parents.pop();
            }
        }
        _ => {}
    }
}

fn is_leaf_case(node: &Value) -> bool {
    if node.get("status").is_some() || node.get("result").is_some() {
        return true;
    }
    matches!(node.get("failures"), Some(Value::Array(_)))
}

fn status_and_failure(node: &Value) -> (CaseStatus, String) {
    let failure_message = format_failures(node.get("failures"));

    let raw_status = node
        .get("status")
        .or_else(|| node.get("result"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_lowercase();

    if !failure_message.is_empty() || matches!(raw_status.as_str(), "failed" | "failure" | "fail") {
        return (CaseStatus::Failed, failure_message);
    }
    if matches!(
        raw_status.as_str(),
        "skipped" | "notrun" | "disabled" | "pending"
    ) {
        return (CaseStatus::Skipped, String::new());
    }
    if matches!(raw_status.as_str(), "passed" | "run" | "ok" | "success") {
        return (CaseStatus::Passed, String::new());
    }
    (CaseStatus::Error, failure_message)
}

/// Failure entries may be bare strings or objects keyed `failure`,
/// `message`, or `value`; collect one line per entry.
fn format_failures(failures: Option<&Value>) -> String {
    let Some(Value::Array(entries)) = failures else {
        return String::new();
    };

    let mut messages = Vec::new();
    for entry in entries {
        match entry {
            Value::String(text) => messages.push(text.clone()),
            Value::Object(map) => {
                for key in ["failure", "message", "value"] {
                    if let Some(Value::String(text)) = map.get(key) {
                        if !text.is_empty() {
                            messages.push(text.clone());
                            break;
                        }
                    }
                }
            }
            _ => {}
        }
    }
    messages.join("\n")
}

fn duration_value_ms(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().map(|s| s * 1000.0).unwrap_or(0.0),
        Value::String(s) => suffixed_ms(s),
        _ => 0.0,
    }
}
