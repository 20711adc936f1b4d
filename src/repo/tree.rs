//! Directory tree listing fed to the file selection prompt

use ignore::WalkBuilder;
use std::path::Path;

use crate::constants::tree::{BINARY_EXTENSIONS, INDENT, NOISE_DIRS};
use crate::types::{DocError, Result, file_name_or};

/// Render the tree under `root` as indented text.
///
/// The first line is `<root name>/`; each entry below it is indented by
/// depth, and directories carry a trailing `/`. Noise directories are pruned
/// entirely and binary files are left out.
pub fn generate_tree(root: &Path) -> Result<String> {
    if !root.is_dir() {
        return Err(DocError::Workspace(format!(
            "Cannot list {}: not a directory",
            root.display()
        )));
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && entry.depth() > 0 && is_noise_dir(entry.file_name()))
        })
        .build();

    let mut lines = vec![format!("{}/", file_name_or(root, "."))];

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        let indent = INDENT.repeat(entry.depth());

        if entry.file_type().is_some_and(|t| t.is_dir()) {
            lines.push(format!("{}{}/", indent, name));
        } else if !is_binary(entry.path()) {
            lines.push(format!("{}{}", indent, name));
        }
    }

    Ok(lines.join("\n"))
}

fn is_noise_dir(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| NOISE_DIRS.contains(&n))
}

fn is_binary(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            BINARY_EXTENSIONS
                .iter()
                .any(|b| b.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_noise_and_binaries_excluded() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("proj");
        touch(&root, ".git/HEAD");
        touch(&root, "node_modules/lib/index.js");
        touch(&root, "a.py");
        touch(&root, "b.png");

        let tree = generate_tree(&root).unwrap();
        assert_eq!(tree, "proj/\n    a.py");
    }

    #[test]
    fn test_nested_layout_and_sorting() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        touch(&root, "src/main.rs");
        touch(&root, "src/lib.rs");
        touch(&root, "Cargo.toml");
        touch(&root, "src/ui/LOGO.PNG");
        touch(&root, "target/debug/app");

        let tree = generate_tree(&root).unwrap();
        let expected = [
            "app/",
            "    Cargo.toml",
            "    src/",
            "        lib.rs",
            "        main.rs",
            "        ui/",
        ]
        .join("\n");
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_hidden_files_and_gitignored_paths_listed() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("r");
        touch(&root, ".gitignore");
        touch(&root, ".github/workflows/ci.yml");
        fs::write(root.join(".gitignore"), "secret.txt\n").unwrap();
        touch(&root, "secret.txt");

        let tree = generate_tree(&root).unwrap();
        assert!(tree.contains("    .github/"));
        assert!(tree.contains("            ci.yml"));
        assert!(tree.contains("    secret.txt"));
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(generate_tree(&temp.path().join("nope")).is_err());
    }
}
