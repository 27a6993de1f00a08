//! Folder Tree Rendering
//!
//! Presentation-only helper that renders a directory tree in the familiar
//! `tree`-style format for human inspection. Not part of the classification
//! or splitting logic.

use std::fs;
use std::path::Path;

use crate::utils::error::Result;

/// Render the folder structure under `path` as an indented tree.
///
/// Entries are sorted by name so output is deterministic; directories are
/// suffixed with `/`. Returns the rendered tree as a string so callers decide
/// where it goes (stdout, logs, tests).
pub fn render_tree(path: &Path) -> Result<String> {
    let mut out = String::new();
    render_into(path, "", &mut out)?;
    Ok(out)
}

fn render_into(path: &Path, indent: &str, out: &mut String) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(path)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    entries.sort();

    let last = entries.len().saturating_sub(1);
    for (i, entry) in entries.iter().enumerate() {
        let (prefix, child_indent) = if i == last {
            ("└── ", format!("{}    ", indent))
        } else {
            ("├── ", format!("{}│   ", indent))
        };

        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if entry.is_dir() {
            out.push_str(&format!("{}{}{}/\n", indent, prefix, name));
            render_into(entry, &child_indent, out)?;
        } else {
            out.push_str(&format!("{}{}{}\n", indent, prefix, name));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_render_tree_shape() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("cats")).unwrap();
        File::create(dir.path().join("cats/a.jpg")).unwrap();
        File::create(dir.path().join("cats/b.jpg")).unwrap();
        File::create(dir.path().join("readme.txt")).unwrap();

        let tree = render_tree(dir.path()).unwrap();
        assert!(tree.contains("├── cats/"));
        assert!(tree.contains("│   ├── a.jpg"));
        assert!(tree.contains("│   └── b.jpg"));
        assert!(tree.contains("└── readme.txt"));
    }

    #[test]
    fn test_render_empty_dir() {
        let dir = TempDir::new().unwrap();
        let tree = render_tree(dir.path()).unwrap();
        assert!(tree.is_empty());
    }
}
