//! Detection heuristics
//!
//! Read-only, bounded-cost filesystem probes shared by all adapters.
//! Each adapter applies them as an ordered OR of independent signals,
//! cheapest first, short-circuiting on the first match. None of these
//! touch the network or spawn processes.

use std::path::Path;

use glob::Pattern;
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

/// How much of each candidate file the include scan reads
const SCAN_PREFIX_BYTES: usize = 8192;

/// Config probe: the file must mention the framework's name AND carry at
/// least one marker substring specific to that build system.
///
/// A config merely mentioning the name in a comment must not trigger
/// detection; the marker requirement is what keeps this signal honest.
pub fn config_has_marker(
    project_path: &Path,
    config_file: &str,
    framework_name: &str,
    markers: &[&str],
) -> bool {
    let config = project_path.join(config_file);
    if !config.is_file() {
        return false;
    }

    let Ok(content) = std::fs::read_to_string(&config) else {
        return false;
    };

    let normalized = content.to_lowercase();
    if !normalized.contains(framework_name) {
        return false;
    }

    markers
        .iter()
        .any(|marker| normalized.contains(&marker.to_lowercase()))
}

/// Source probe: any file within the extension allow-list whose content
/// prefix matches *include_pattern*. Hidden directories are skipped.
pub fn source_include_present(
    project_path: &Path,
    extensions: &[&str],
    include_pattern: &Regex,
) -> bool {
    for entry in walk_visible_files(project_path) {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        {
            continue;
        }

        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        let prefix = truncate_to_boundary(&content, SCAN_PREFIX_BYTES);
        if include_pattern.is_match(prefix) {
            return true;
        }
    }
    false
}

/// Glob probe: any visible file matching one of the test-file patterns
pub fn matches_test_pattern(project_path: &Path, patterns: &[&str]) -> bool {
    let compiled: Vec<Pattern> = patterns
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();
    if compiled.is_empty() {
        return false;
    }

    for entry in walk_visible_files(project_path) {
        let Ok(relative) = entry.path().strip_prefix(project_path) else {
            continue;
        };
        let relative = relative.to_string_lossy();
        if compiled.iter().any(|p| p.matches(&relative)) {
            return true;
        }
    }
    false
}

/// Walk regular files under *root*, skipping hidden directories
pub(crate) fn walk_visible_files(root: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Clamp *content* to at most *limit* bytes on a char boundary
fn truncate_to_boundary(content: &str, limit: usize) -> &str {
    if content.len() <= limit {
        return content;
    }
    let mut end = limit;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_requires_marker_not_just_name() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("CMakeLists.txt"),
            "# gtest is mentioned in this comment only\nproject(demo)\n",
        )
        .unwrap();

        assert!(!config_has_marker(
            temp.path(),
            "CMakeLists.txt",
            "gtest",
            &["find_package(GTest", "gtest_discover_tests"],
        ));

        std::fs::write(
            temp.path().join("CMakeLists.txt"),
            "find_package(GTest REQUIRED)\ngtest_discover_tests(calc_tests)\n",
        )
        .unwrap();

        assert!(config_has_marker(
            temp.path(),
            "CMakeLists.txt",
            "gtest",
            &["find_package(GTest", "gtest_discover_tests"],
        ));
    }

    #[test]
    fn test_config_missing_file_is_false() {
        let temp = TempDir::new().unwrap();
        assert!(!config_has_marker(
            temp.path(),
            "CMakeLists.txt",
            "gtest",
            &["find_package(GTest"],
        ));
    }

    #[test]
    fn test_include_scan_respects_extension_allow_list() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("notes.md"),
            "#include <gtest/gtest.h>\n",
        )
        .unwrap();

        let pattern = Regex::new(r#"#include\s*[<"]gtest/gtest\.h[>"]"#).unwrap();
        assert!(!source_include_present(temp.path(), &["cpp", "cc"], &pattern));

        std::fs::write(
            temp.path().join("calc_test.cpp"),
            "#include <gtest/gtest.h>\nTEST(Calc, Adds) {}\n",
        )
        .unwrap();
        assert!(source_include_present(temp.path(), &["cpp", "cc"], &pattern));
    }

    #[test]
    fn test_include_scan_skips_hidden_dirs() {
        let temp = TempDir::new().unwrap();
        let hidden = temp.path().join(".cache");
        std::fs::create_dir(&hidden).unwrap();
        std::fs::write(hidden.join("stale.cpp"), "#include <gtest/gtest.h>\n").unwrap();

        let pattern = Regex::new(r#"#include\s*[<"]gtest/gtest\.h[>"]"#).unwrap();
        assert!(!source_include_present(temp.path(), &["cpp"], &pattern));
    }

    #[test]
    fn test_glob_probe_matches_nested_files() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("src").join("math");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("calc_test.cpp"), "").unwrap();

        assert!(matches_test_pattern(temp.path(), &["**/*_test.cpp"]));
        assert!(!matches_test_pattern(temp.path(), &["**/*_test.cc"]));
    }

    #[test]
    fn test_empty_project_matches_nothing() {
        let temp = TempDir::new().unwrap();
        let pattern = Regex::new("anything").unwrap();

        assert!(!matches_test_pattern(temp.path(), &["**/*_test.cpp"]));
        assert!(!source_include_present(temp.path(), &["cpp"], &pattern));
    }
}
