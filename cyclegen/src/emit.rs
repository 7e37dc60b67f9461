//! Merges the generated blocks into the host template and writes the result.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::info;
use tempfile::NamedTempFile;

use crate::template::Template;
use crate::GenerateError;

/// Placeholder receiving the dispatch cases.
pub const DECODE_BLOCK_PLACEHOLDER: &str = "decode_block";
/// Placeholder receiving the offset table rows.
pub const OPTABLE_PLACEHOLDER: &str = "optable";

/// Substitute the generated blocks into `template`.
pub fn merge(template: &str, decode_block: &str, optable: &str) -> String {
    Template::new(template).safe_substitute(&[
        (DECODE_BLOCK_PLACEHOLDER, decode_block),
        (OPTABLE_PLACEHOLDER, optable),
    ])
}

/// Replace the file at `path` with `contents`.
///
/// The contents go to a temporary file next to `path` which is then renamed over it, so
/// the previous output stays intact unless the new one was written completely. If `path`
/// already exists, its permissions are carried over to the new file.
pub fn write_output(path: &Path, contents: &str) -> Result<(), GenerateError> {
    let io_err = |source: io::Error| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)?;
    if let Ok(metadata) = fs::metadata(path) {
        file.as_file()
            .set_permissions(metadata.permissions())
            .map_err(io_err)?;
    }
    file.persist(path).map_err(|err| io_err(err.error))?;
    info!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn merges_both_blocks() {
        let template = "static const uint16_t opstep[256] = {\n$optable };\n\
                        switch (c->step++) {\n$decode_block\n}\n";
        let merged = merge(template, "case 2: break;", "   0,");
        assert_eq!(
            merged,
            "static const uint16_t opstep[256] = {\n   0, };\n\
             switch (c->step++) {\ncase 2: break;\n}\n"
        );
    }

    #[test]
    fn merge_leaves_other_placeholders() {
        assert_eq!(merge("$optable $cpu_name", "", "X"), "X $cpu_name");
    }

    #[test]
    fn writes_and_replaces_output() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.h");
        write_output(&path, "first").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
        write_output(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        // Only the output itself is left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.h");
        let err = write_output(&path, "x").unwrap_err();
        assert!(matches!(err, GenerateError::Io { .. }), "{:?}", err);
        assert!(!path.exists());
    }
}
