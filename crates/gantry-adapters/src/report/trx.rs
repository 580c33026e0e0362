//! Visual Studio TRX report parser
//!
//! TRX files are namespaced XML; element matching goes through
//! `local_name()` so the `xmlns` prefix never matters. Each
//! `UnitTestResult` element becomes one test case. Failure text comes
//! from `Output/ErrorInfo/Message`, falling back to
//! `Output/ErrorInfo/StackTrace`, then a direct `Message` child.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use gantry_core::{CaseResult, CaseStatus, RunResult};

use super::duration::trx_ms;

#[derive(Default)]
struct PendingUnit {
    name: String,
    outcome: String,
    duration_ms: f64,
    computer_name: String,
    error_info_message: Option<String>,
    error_info_stack: Option<String>,
    direct_message: Option<String>,
}

#[derive(PartialEq)]
enum Capture {
    None,
    ErrorInfoMessage,
    ErrorInfoStack,
    DirectMessage,
}

/// Parse a TRX document into a `RunResult`.
pub fn parse(xml: &str, transcript: &str) -> RunResult {
    let mut result = RunResult {
        raw_output: transcript.to_string(),
        ..Default::default()
    };

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut unit: Option<PendingUnit> = None;
    let mut in_output = false;
    let mut in_error_info = false;
    let mut capture = Capture::None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().local_name().as_ref() {
                b"UnitTestResult" => unit = Some(unit_from_attrs(&e)),
                b"Output" if unit.is_some() => in_output = true,
                b"ErrorInfo" if in_output => in_error_info = true,
                b"Message" if unit.is_some() => {
                    capture = if in_error_info {
                        Capture::ErrorInfoMessage
                    } else if !in_output {
                        Capture::DirectMessage
                    } else {
                        Capture::None
                    };
                    text.clear();
                }
                b"StackTrace" if in_error_info => {
                    capture = Capture::ErrorInfoStack;
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.name().local_name().as_ref() == b"UnitTestResult" {
                    result.push_case(finalize(unit_from_attrs(&e)));
                }
            }
            Ok(Event::Text(t)) => {
                if capture != Capture::None {
                    if let Ok(value) = t.unescape() {
                        text.push_str(&value);
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if capture != Capture::None {
                    text.push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Ok(Event::End(e)) => match e.name().local_name().as_ref() {
                b"UnitTestResult" => {
                    if let Some(pending) = unit.take() {
                        result.push_case(finalize(pending));
                    }
                }
                b"Output" => in_output = false,
                b"ErrorInfo" => in_error_info = false,
                b"Message" | b"StackTrace" => {
                    if let Some(pending) = unit.as_mut() {
                        let trimmed = text.trim().to_string();
                        if !trimmed.is_empty() {
                            match capture {
                                Capture::ErrorInfoMessage => {
                                    pending.error_info_message.get_or_insert(trimmed);
                                }
                                Capture::ErrorInfoStack => {
                                    pending.error_info_stack.get_or_insert(trimmed);
                                }
                                Capture::DirectMessage => {
                                    pending.direct_message.get_or_insert(trimmed);
                                }
                                Capture::None => {}
                            }
                        }
                    }
                    capture = Capture::None;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            // Malformed XML keeps whatever was already extracted
            Err(_) => break,
            Ok(_) => {}
        }
        buf.clear();
    }

    result.recompute_success();
    result
}

fn unit_from_attrs(element: &BytesStart<'_>) -> PendingUnit {
    let mut pending = PendingUnit {
        name: "unknown".to_string(),
        ..Default::default()
    };
    for attr in element.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"testName" => pending.name = value.into_owned(),
            b"outcome" => pending.outcome = value.trim().to_string(),
            b"duration" => pending.duration_ms = trx_ms(&value),
            b"computerName" => pending.computer_name = value.into_owned(),
            _ => {}
        }
    }
    pending
}

fn finalize(unit: PendingUnit) -> CaseResult {
    let status = outcome_to_status(&unit.outcome);
    let failure_message = unit
        .error_info_message
        .or(unit.error_info_stack)
        .or(unit.direct_message)
        .unwrap_or_default();

    CaseResult {
        name: unit.name,
        status,
        duration_ms: unit.duration_ms,
        failure_message,
        file_path: unit.computer_name,
    }
}

fn outcome_to_status(outcome: &str) -> CaseStatus {
    match outcome {
        "Passed" => CaseStatus::Passed,
        "Failed" | "Error" => CaseStatus::Failed,
        "NotExecuted" | "Skipped" | "Ignored" => CaseStatus::Skipped,
        _ => CaseStatus::Error,
    }
}
