//! Template source resolution.
//!
//! A template identifier is either a file name relative to a template
//! directory or the template source itself. Resolution tries the file first
//! and falls back to the identifier:
//!
//! | Identifier | Directory | Files tried |
//! |------------|-----------|-------------|
//! | `welcome` | `./templates` | `welcome.md`, then `welcome.txt` |
//! | `layout.html` | `./templates` | `layout.html` |
//! | `Hello {{ name }}` | any | none (inline) |
//! | anything | none | none (inline) |
//!
//! A file that is missing is not an error. A file that exists but cannot be
//! read is reported as [`RenderError::Resolution`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::RenderError;

/// Extensions tried, in order, for identifiers without one.
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".md", ".txt"];

/// Markers that can only appear in inline template source.
const INLINE_MARKERS: &[&str] = &["\n", "{{", "{%", "{#"];

/// Turns a template identifier into source text.
pub trait SourceResolver: Send + Sync {
    /// Returns the source for `identifier`, looking in `dir` when given.
    fn resolve(&self, identifier: &str, dir: Option<&Path>) -> Result<String, RenderError>;
}

/// Reads templates from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSourceResolver;

impl SourceResolver for FileSourceResolver {
    fn resolve(&self, identifier: &str, dir: Option<&Path>) -> Result<String, RenderError> {
        let dir = match dir {
            Some(dir) if !is_inline(identifier) => dir,
            _ => return Ok(identifier.to_string()),
        };

        for path in candidates(dir, identifier) {
            match fs::read_to_string(&path) {
                Ok(source) => {
                    debug!(template = identifier, path = %path.display(), "resolved template file");
                    return Ok(source);
                }
                Err(err) if no_such_file(&err) => continue,
                Err(source) => {
                    return Err(RenderError::Resolution {
                        template: identifier.to_string(),
                        source,
                    })
                }
            }
        }

        debug!(template = identifier, dir = %dir.display(), "no template file, using identifier as source");
        Ok(identifier.to_string())
    }
}

/// Errors meaning no file can exist at the path, as opposed to one that
/// exists but cannot be read.
fn no_such_file(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::NotADirectory
            | io::ErrorKind::InvalidFilename
            | io::ErrorKind::InvalidInput
    )
}

/// Whether an identifier is template source that should never be looked up.
pub fn is_inline(identifier: &str) -> bool {
    identifier.trim().is_empty() || INLINE_MARKERS.iter().any(|m| identifier.contains(m))
}

fn candidates(dir: &Path, identifier: &str) -> Vec<PathBuf> {
    let path = dir.join(identifier);
    if path.extension().is_some() {
        return vec![path];
    }
    TEMPLATE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{identifier}{ext}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn no_dir_returns_identifier() {
        let out = FileSourceResolver.resolve("welcome", None).unwrap();
        assert_eq!(out, "welcome");
    }

    #[test]
    fn md_before_txt() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "welcome.md", "from md");
        write(temp.path(), "welcome.txt", "from txt");

        let out = FileSourceResolver.resolve("welcome", Some(temp.path())).unwrap();
        assert_eq!(out, "from md");
    }

    #[test]
    fn txt_fallback() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "welcome.txt", "from txt");

        let out = FileSourceResolver.resolve("welcome", Some(temp.path())).unwrap();
        assert_eq!(out, "from txt");
    }

    #[test]
    fn explicit_extension_is_read_exactly() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "layout.html", "<p>{{ x }}</p>");
        write(temp.path(), "layout.html.md", "wrong");

        let out = FileSourceResolver.resolve("layout.html", Some(temp.path())).unwrap();
        assert_eq!(out, "<p>{{ x }}</p>");
    }

    #[test]
    fn missing_file_falls_back_to_identifier() {
        let temp = TempDir::new().unwrap();
        let out = FileSourceResolver.resolve("Hello there", Some(temp.path())).unwrap();
        assert_eq!(out, "Hello there");
    }

    #[test]
    fn overlong_single_line_is_literal() {
        let temp = TempDir::new().unwrap();
        let source = "a".repeat(300);
        let out = FileSourceResolver.resolve(&source, Some(temp.path())).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn path_through_a_file_is_literal() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "notes", "plain file");

        let out = FileSourceResolver.resolve("notes/reset", Some(temp.path())).unwrap();
        assert_eq!(out, "notes/reset");
    }

    #[test]
    fn nested_identifier() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("emails")).unwrap();
        write(&temp.path().join("emails"), "reset.md", "reset");

        let out = FileSourceResolver.resolve("emails/reset", Some(temp.path())).unwrap();
        assert_eq!(out, "reset");
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        // a directory with a file-like name cannot be read as a string
        fs::create_dir(temp.path().join("broken.md")).unwrap();

        let err = FileSourceResolver.resolve("broken.md", Some(temp.path())).unwrap_err();
        assert_eq!(err.stage(), "resolution");
    }

    #[test]
    fn inline_markers() {
        assert!(is_inline("Hello {{ name }}"));
        assert!(is_inline("line one\nline two"));
        assert!(is_inline(""));
        assert!(!is_inline("emails/reset"));
    }
}
