//! pytest-json-report parser
//!
//! The JSON report lands on stdout surrounded by regular pytest chatter
//! (progress dots, warnings), so the payload is cut out with a balanced-
//! brace scan before deserializing. Test entries carry a `nodeid` of the
//! form `path/to/test.py::test_name`.

use serde_json::Value;

use gantry_core::{CaseResult, CaseStatus, RunResult};

/// Parse pytest-json-report stdout into a `RunResult`.
pub fn parse(stdout: &str, transcript: &str) -> RunResult {
    let mut result = RunResult {
        raw_output: transcript.to_string(),
        ..Default::default()
    };

    let Some(report) = extract_json_object(stdout) else {
        return result;
    };

    // Run duration comes from the report root, in seconds
    let report_duration = to_f64(report.get("duration"));

    let tests = match report.get("tests") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };
    for entry in tests {
        let Value::Object(_) = entry else {
            continue;
        };

        let nodeid = entry
            .get("nodeid")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let outcome = entry
            .get("outcome")
            .and_then(Value::as_str)
            .unwrap_or("error");
        let status = map_outcome(outcome);

        // Duration sits at the test level or inside the call phase
        let mut duration_s = to_f64(entry.get("duration"));
        let call_phase = entry.get("call").and_then(Value::as_object);
        if duration_s == 0.0 {
            if let Some(call) = call_phase {
                duration_s = to_f64(call.get("duration"));
            }
        }

        let mut failure_message = String::new();
        if let Some(call) = call_phase {
            if let Some(Value::String(longrepr)) = call.get("longrepr") {
                failure_message = longrepr.clone();
            }
            if failure_message.is_empty() {
                if let Some(Value::Object(crash)) = call.get("crash") {
                    if let Some(Value::String(message)) = crash.get("message") {
                        failure_message = message.clone();
                    }
                }
            }
        }

        let file_path = match nodeid.split_once("::") {
            Some((path, _)) => path.to_string(),
            None => String::new(),
        };

        result.test_cases.push(CaseResult {
            name: nodeid.to_string(),
            status,
            duration_ms: duration_s * 1000.0,
            failure_message,
            file_path,
        });
        match status {
            CaseStatus::Passed => result.passed += 1,
            CaseStatus::Failed => result.failed += 1,
            CaseStatus::Skipped => result.skipped += 1,
            CaseStatus::Error => result.errors += 1,
        }
    }

    result.duration_ms = report_duration * 1000.0;
    result.recompute_success();
    result
}

/// Cut the first balanced JSON object out of mixed stdout. Brace depth
/// is tracked outside string literals, with `\"` escapes honored, so
/// trailing pytest output after the report cannot widen the slice.
fn extract_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..start + offset + 1];
                    return serde_json::from_str::<Value>(candidate)
                        .ok()
                        .filter(Value::is_object);
                }
            }
            _ => {}
        }
    }
    None
}

fn map_outcome(outcome: &str) -> CaseStatus {
    match outcome {
        "passed" | "xpassed" => CaseStatus::Passed,
        "failed" => CaseStatus::Failed,
        "skipped" | "xfailed" => CaseStatus::Skipped,
        _ => CaseStatus::Error,
    }
}

fn to_f64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
