//! Attaches source and test text to under-covered files before they are
//! rendered into the analysis request.

use std::path::{Path, PathBuf};

use crate::logcap::RunLog;
use crate::model::UncoveredFile;

/// Read each file's full source and a best-effort matching test file.
///
/// Returns a new list in the same order. A file whose source cannot be
/// read is passed through unmodified with a warning; one unreadable file
/// never aborts enrichment of the rest.
pub fn enrich_with_sources(
    project_root: &Path,
    files: &[UncoveredFile],
    log: &RunLog,
) -> Vec<UncoveredFile> {
    files
        .iter()
        .map(|file| {
            let full_path = resolve_path(project_root, &file.file_path);
            match std::fs::read_to_string(&full_path) {
                Ok(source) => {
                    let mut enriched = file.clone();
                    enriched.test_code = find_test_file(&full_path);
                    enriched.source_code = Some(source);
                    enriched
                }
                Err(_) => {
                    log.warn(format!("Could not read source file: {}", file.file_path));
                    file.clone()
                }
            }
        })
        .collect()
}

/// Absolute paths are used as-is; relative paths are joined to the root.
fn resolve_path(project_root: &Path, file_path: &str) -> PathBuf {
    let path = Path::new(file_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

/// Try the conventional test-file locations for a source file, in priority
/// order, and read the first one that exists.
fn find_test_file(source_path: &Path) -> Option<String> {
    let dir = source_path.parent()?;
    let stem = source_path.file_stem()?.to_str()?;

    let candidates = [
        dir.join("__test__").join(format!("{stem}.test.js")),
        dir.join("__tests__").join(format!("{stem}.test.js")),
        dir.join("test.js"),
        dir.join(format!("{stem}.test.js")),
        dir.join(format!("{stem}.spec.js")),
    ];

    candidates
        .iter()
        .find_map(|candidate| std::fs::read_to_string(candidate).ok())
}
