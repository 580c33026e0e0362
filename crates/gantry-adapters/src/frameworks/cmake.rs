//! Shared CMake/CTest plumbing for the C++ adapters
//!
//! Both C++ frameworks prefer running through CTest when a configured
//! build tree exists and fall back to invoking test binaries directly.
//! The helpers here cover build-tree probing, the CTest attempt, and
//! binary discovery; everything framework-specific (binary name
//! patterns, report flags) stays with the adapter.

use std::path::{Path, PathBuf};

use gantry_core::RunResult;

use crate::context::RunContext;
use crate::exec::{run_command, Transcript};
use crate::report::junit::{self, JunitDialect};

const BUILD_DIR_CANDIDATES: [&str; 3] = ["build", "cmake-build-debug", "cmake-build-release"];

/// File extensions never treated as test binaries during discovery
const NON_BINARY_EXTENSIONS: [&str; 7] = ["cpp", "cc", "cxx", "h", "hpp", "txt", "cmake"];

/// Locate a configured CMake build tree.
///
/// Conventional build directories win; a project root that itself holds
/// cache artifacts (in-source build) comes last.
pub(crate) fn find_build_dir(project_path: &Path) -> Option<PathBuf> {
    for dirname in BUILD_DIR_CANDIDATES {
        let candidate = project_path.join(dirname);
        if looks_like_build_dir(&candidate) {
            return Some(candidate);
        }
    }

    if looks_like_build_dir(project_path) {
        return Some(project_path.to_path_buf());
    }

    None
}

fn looks_like_build_dir(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    path.join("CMakeCache.txt").is_file()
        || path.join("CTestTestfile.cmake").is_file()
        || path.join("Testing").is_dir()
}

/// Attempt the CTest route: build the `test` target, run `ctest` with a
/// JUnit artifact, parse it.
///
/// Returns `None` when the route is unavailable (no build tree, cmake
/// missing from PATH, no artifact produced) so the caller falls through
/// to direct binary execution. A timeout on either step is terminal and
/// returns a failed result instead.
pub(crate) async fn try_ctest(
    build_dir: Option<&Path>,
    report_dir: &Path,
    ctx: &RunContext,
    transcript: &mut Transcript,
    dialect: JunitDialect,
) -> Option<RunResult> {
    let build_dir = build_dir?;
    let artifact = report_dir.join("ctest-results.xml");

    let build_cmd: Vec<String> = ["cmake", "--build", ".", "--target", "test"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let build = run_command(&build_cmd, build_dir, ctx.timeout).await;
    transcript.record(&build_cmd, &build);

    if build.timed_out {
        return Some(RunResult::failure(transcript.render()));
    }
    if build.not_found {
        return None;
    }

    let mut ctest_cmd: Vec<String> = vec![
        "ctest".to_string(),
        "--output-on-failure".to_string(),
        "--output-junit".to_string(),
        artifact.display().to_string(),
    ];
    let regex = filter_regex(&ctx.test_files);
    if !regex.is_empty() {
        ctest_cmd.push("-R".to_string());
        ctest_cmd.push(regex);
    }

    let ctest = run_command(&ctest_cmd, build_dir, ctx.timeout).await;
    transcript.record(&ctest_cmd, &ctest);

    if ctest.timed_out {
        return Some(RunResult::failure(transcript.render()));
    }
    if !artifact.is_file() {
        return None;
    }

    let xml = std::fs::read_to_string(&artifact).ok()?;
    Some(junit::parse(&xml, &transcript.render(), dialect))
}

/// CTest `-R` filter selecting tests named after the requested files.
/// Empty when no files were requested (run everything).
pub(crate) fn filter_regex(test_files: &[PathBuf]) -> String {
    let escaped: Vec<String> = test_files
        .iter()
        .filter_map(|path| path.file_stem())
        .filter_map(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(regex::escape)
        .collect();
    escaped.join("|")
}

/// Find executable test binaries by name pattern, build tree first.
///
/// Symlinked or copied binaries reachable from both roots are reported
/// once, keyed by resolved path, in discovery order.
pub(crate) fn discover_test_binaries(
    project_path: &Path,
    build_dir: Option<&Path>,
    name_patterns: &[&str],
) -> Vec<PathBuf> {
    let compiled: Vec<glob::Pattern> = name_patterns
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();

    let mut roots: Vec<&Path> = Vec::new();
    if let Some(dir) = build_dir {
        roots.push(dir);
    }
    roots.push(project_path);

    let mut seen = std::collections::HashSet::new();
    let mut ordered = Vec::new();

    for root in roots {
        for pattern in &compiled {
            for entry in walkdir::WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
            {
                let path = entry.path();
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if !pattern.matches(file_name) || !is_executable_file(path) {
                    continue;
                }

                let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
                if seen.insert(resolved.clone()) {
                    ordered.push(resolved);
                }
            }
        }
    }

    ordered
}

fn is_executable_file(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if NON_BINARY_EXTENSIONS
            .iter()
            .any(|blocked| blocked.eq_ignore_ascii_case(ext))
        {
            return false;
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match path.metadata() {
            Ok(meta) => meta.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

/// Narrow discovered binaries to those named after the requested test
/// files. A filter that matches nothing keeps the full candidate list
/// rather than silently running zero tests.
pub(crate) fn select_binaries(binaries: Vec<PathBuf>, test_files: &[PathBuf]) -> Vec<PathBuf> {
    if test_files.is_empty() {
        return binaries;
    }

    let wanted: std::collections::HashSet<String> = test_files
        .iter()
        .filter_map(|path| path.file_stem())
        .filter_map(|stem| stem.to_str())
        .map(str::to_lowercase)
        .collect();

    let filtered: Vec<PathBuf> = binaries
        .iter()
        .filter(|binary| {
            binary
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(|stem| wanted.contains(&stem.to_lowercase()))
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    if filtered.is_empty() {
        binaries
    } else {
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_build_dir_prefers_conventional_names() {
        let dir = TempDir::new().unwrap();
        let build = dir.path().join("build");
        std::fs::create_dir(&build).unwrap();
        std::fs::write(build.join("CMakeCache.txt"), "").unwrap();

        assert_eq!(find_build_dir(dir.path()), Some(build));
    }

    #[test]
    fn test_find_build_dir_accepts_in_source_build() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("CTestTestfile.cmake"), "").unwrap();

        assert_eq!(find_build_dir(dir.path()), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_find_build_dir_requires_cache_artifacts() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("build")).unwrap();

        assert_eq!(find_build_dir(dir.path()), None);
    }

    #[test]
    fn test_filter_regex_escapes_metacharacters() {
        let files = vec![PathBuf::from("math_test.cpp"), PathBuf::from("io+net.cpp")];
        assert_eq!(filter_regex(&files), r"math_test|io\+net");
    }

    #[test]
    fn test_filter_regex_empty_without_files() {
        assert_eq!(filter_regex(&[]), "");
    }

    #[test]
    fn test_select_binaries_no_filter_keeps_all() {
        let binaries = vec![PathBuf::from("/b/math_test"), PathBuf::from("/b/io_test")];
        assert_eq!(select_binaries(binaries.clone(), &[]), binaries);
    }

    #[test]
    fn test_select_binaries_narrows_by_stem() {
        let binaries = vec![PathBuf::from("/b/math_test"), PathBuf::from("/b/io_test")];
        let selected = select_binaries(binaries, &[PathBuf::from("src/Math_Test.cpp")]);
        assert_eq!(selected, vec![PathBuf::from("/b/math_test")]);
    }

    #[test]
    fn test_select_binaries_unmatched_filter_keeps_all() {
        let binaries = vec![PathBuf::from("/b/math_test")];
        let selected = select_binaries(binaries.clone(), &[PathBuf::from("other.cpp")]);
        assert_eq!(selected, binaries);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_sources_and_non_executables() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("math_test.cpp"), "int main(){}").unwrap();
        std::fs::write(dir.path().join("notes_test.txt"), "").unwrap();

        let binary = dir.path().join("math_test");
        std::fs::write(&binary, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        let plain = dir.path().join("other_test");
        std::fs::write(&plain, "").unwrap();
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).unwrap();

        let found = discover_test_binaries(dir.path(), None, &["*test*"]);
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("math_test"));
    }
}
