//! Path resolution against the project workspace.

use std::path::{Path, PathBuf};

/// Resolve a file path against a working directory.
///
/// - Absolute paths are returned unchanged.
/// - Relative paths are joined with `working_directory`.
pub fn resolve_path(file_path: &str, working_directory: &str) -> PathBuf {
    let path = Path::new(file_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(working_directory).join(path)
    }
}

/// Display `path` relative to `workspace` when it lies inside it.
pub fn workspace_relative(path: &Path, workspace: &Path) -> String {
    path.strip_prefix(workspace)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_absolute_path_unchanged() {
        assert_eq!(
            resolve_path("/srv/projects/x.html", "/home/user"),
            PathBuf::from("/srv/projects/x.html")
        );
    }

    #[test]
    fn resolve_relative_path_joined() {
        assert_eq!(
            resolve_path("src/App.tsx", "/projects/project_7"),
            PathBuf::from("/projects/project_7/src/App.tsx")
        );
    }

    #[test]
    fn relative_inside_workspace() {
        let ws = Path::new("/projects/project_7");
        assert_eq!(
            workspace_relative(Path::new("/projects/project_7/src/App.tsx"), ws),
            "src/App.tsx"
        );
        assert_eq!(
            workspace_relative(Path::new("/elsewhere/a.txt"), ws),
            "/elsewhere/a.txt"
        );
    }
}
