//! JUnit-style XML report parser
//!
//! Streaming parse of `testsuite`/`testcase` documents as emitted by CTest
//! (`--output-junit`) and by Catch2's junit reporter. The two dialects share
//! their structure but not their skip vocabulary: CTest also signals skips
//! through the `status` attribute, Catch2 only through a `<skipped>` child.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use gantry_core::{CaseResult, CaseStatus, RunResult};

use super::duration::suffixed_ms;

/// Dialect knob for the two JUnit flavors
#[derive(Debug, Clone, Copy)]
pub struct JunitDialect {
    /// Treat `status="notrun|disabled|skipped"` on the testcase as a skip
    pub honor_status_attr: bool,
}

impl JunitDialect {
    /// CTest / Google Test XML output
    pub const CTEST: Self = Self {
        honor_status_attr: true,
    };

    /// Catch2 junit reporter output
    pub const CATCH2: Self = Self {
        honor_status_attr: false,
    };
}

const SKIP_STATUS_VOCABULARY: [&str; 3] = ["notrun", "disabled", "skipped"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum ChildKind {
    Failure,
    Error,
}

#[derive(Debug, Default)]
struct PendingCase {
    classname: String,
    name: String,
    duration_ms: f64,
    status_attr: String,
    file_path: String,
    failure: Option<String>,
    error: Option<String>,
    skipped: bool,
}

/// Parse JUnit-style XML into a `RunResult`.
///
/// Never panics; a document with no parseable `testcase` elements yields
/// `total == 0, success == false`.
pub fn parse(xml: &str, transcript: &str, dialect: JunitDialect) -> RunResult {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut result = RunResult {
        raw_output: transcript.to_string(),
        ..Default::default()
    };

    let mut case: Option<PendingCase> = None;
    // (kind, message attr, body) of the failure/error element being read
    let mut child: Option<(ChildKind, String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().local_name().as_ref() == b"testcase" => {
                case = Some(pending_from_attrs(attr_map(&e)));
            }
            // Self-closing testcase: no children, finalize right away
            Ok(Event::Empty(e)) if e.name().local_name().as_ref() == b"testcase" => {
                result.push_case(finalize(pending_from_attrs(attr_map(&e)), dialect));
            }
            Ok(Event::End(e)) if e.name().local_name().as_ref() == b"testcase" => {
                if let Some(pending) = case.take() {
                    result.push_case(finalize(pending, dialect));
                }
            }
            Ok(Event::Start(e)) if case.is_some() => {
                let attrs = attr_map(&e);
                match e.name().local_name().as_ref() {
                    b"failure" => child = Some((
                        ChildKind::Failure,
                        attrs.get("message").cloned().unwrap_or_default(),
                        String::new(),
                    )),
                    b"error" => child = Some((
                        ChildKind::Error,
                        attrs.get("message").cloned().unwrap_or_default(),
                        String::new(),
                    )),
                    b"skipped" => {
                        if let Some(pending) = case.as_mut() {
                            pending.skipped = true;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) if case.is_some() => {
                let attrs = attr_map(&e);
                if let Some(pending) = case.as_mut() {
                    match e.name().local_name().as_ref() {
                        b"failure" => assign_child(
                            pending,
                            ChildKind::Failure,
                            attrs.get("message").cloned().unwrap_or_default(),
                        ),
                        b"error" => assign_child(
                            pending,
                            ChildKind::Error,
                            attrs.get("message").cloned().unwrap_or_default(),
                        ),
                        b"skipped" => pending.skipped = true,
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e))
                if matches!(
                    e.name().local_name().as_ref(),
                    b"failure" | b"error"
                ) =>
            {
                if let (Some(pending), Some((kind, message, body))) =
                    (case.as_mut(), child.take())
                {
                    assign_child(pending, kind, compose_message(&message, body.trim()));
                }
            }
            Ok(Event::Text(t)) => {
                if let Some((_, _, body)) = child.as_mut() {
                    if let Ok(text) = t.unescape() {
                        body.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some((_, _, body)) = child.as_mut() {
                    body.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            // Malformed XML: keep whatever was already extracted
            Err(_) => break,
        }
    }

    result.recompute_success();
    result
}

fn pending_from_attrs(mut attrs: HashMap<String, String>) -> PendingCase {
    PendingCase {
        classname: attrs.remove("classname").unwrap_or_default(),
        name: attrs
            .remove("name")
            .unwrap_or_else(|| "unknown".to_string()),
        duration_ms: suffixed_ms(attrs.get("time").map(String::as_str).unwrap_or("0")),
        status_attr: attrs.remove("status").unwrap_or_default().to_lowercase(),
        file_path: attrs.remove("file").unwrap_or_default(),
        failure: None,
        error: None,
        skipped: false,
    }
}

/// First failure/error element wins; later siblings are ignored
fn assign_child(pending: &mut PendingCase, kind: ChildKind, message: String) {
    match kind {
        ChildKind::Failure => {
            if pending.failure.is_none() {
                pending.failure = Some(message);
            }
        }
        ChildKind::Error => {
            if pending.error.is_none() {
                pending.error = Some(message);
            }
        }
    }
}

/// `"{message}\n{body}"` when both exist, either alone otherwise
fn compose_message(message_attr: &str, body: &str) -> String {
    match (message_attr.is_empty(), body.is_empty()) {
        (false, false) => format!("{message_attr}\n{body}"),
        (false, true) => message_attr.to_string(),
        (true, _) => body.to_string(),
    }
}

fn finalize(pending: PendingCase, dialect: JunitDialect) -> CaseResult {
    let full_name = if pending.classname.is_empty() {
        pending.name.clone()
    } else {
        format!("{}.{}", pending.classname, pending.name)
    };

    let status_says_skip = dialect.honor_status_attr
        && SKIP_STATUS_VOCABULARY.contains(&pending.status_attr.as_str());

    // Precedence: explicit failure > explicit error > any skip signal > pass
    let (status, failure_message) = if let Some(message) = pending.failure {
        (CaseStatus::Failed, message)
    } else if let Some(message) = pending.error {
        (CaseStatus::Error, message)
    } else if pending.skipped || status_says_skip {
        (CaseStatus::Skipped, String::new())
    } else {
        (CaseStatus::Passed, String::new())
    };

    CaseResult {
        name: full_name,
        status,
        duration_ms: pending.duration_ms,
        failure_message,
        file_path: pending.file_path,
    }
}

fn attr_map(e: &BytesStart<'_>) -> HashMap<String, String> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_default();
            (key, value)
        })
        .collect()
}
