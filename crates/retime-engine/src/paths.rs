//! Resolution of user-supplied file names against a default directory.

use std::path::{Component, Path, PathBuf};

/// Directory that bare file names resolve into, relative to the working
/// directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Resolve `user_path` against `default_dir`.
///
/// - Absolute paths are returned unchanged.
/// - Relative paths with more than one segment (`out/route.json`,
///   `../route.json`) are returned unchanged, to be read relative to the
///   working directory.
/// - A bare file name is joined onto `default_dir`.
///
/// `.` segments are not counted, so `./route.json` is a bare file name.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use retime_engine::paths::resolve_path;
///
/// assert_eq!(resolve_path("route.json", Path::new("data")), PathBuf::from("data/route.json"));
/// assert_eq!(resolve_path("out/x.json", Path::new("data")), PathBuf::from("out/x.json"));
/// ```
pub fn resolve_path(user_path: impl AsRef<Path>, default_dir: &Path) -> PathBuf {
    let path = user_path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let segments: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if segments.components().count() > 1 {
        path.to_path_buf()
    } else {
        default_dir.join(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> &'static Path {
        Path::new(DEFAULT_DATA_DIR)
    }

    #[test]
    fn test_bare_name_goes_to_default_dir() {
        assert_eq!(resolve_path("route.json", data()), PathBuf::from("data/route.json"));
    }

    #[test]
    fn test_absolute_path_unchanged() {
        assert_eq!(resolve_path("/tmp/x.json", data()), PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn test_relative_path_with_dir_unchanged() {
        assert_eq!(resolve_path("out/x.json", data()), PathBuf::from("out/x.json"));
        assert_eq!(resolve_path("data/route.json", data()), PathBuf::from("data/route.json"));
        assert_eq!(resolve_path("../x.json", data()), PathBuf::from("../x.json"));
    }

    #[test]
    fn test_dot_prefix_counts_as_bare_name() {
        let resolved = resolve_path("./route.json", data());
        assert_eq!(resolved.to_str(), Some("data/route.json"));
    }

    #[test]
    fn test_injected_default_dir() {
        assert_eq!(
            resolve_path("route.json", Path::new("/srv/schedules")),
            PathBuf::from("/srv/schedules/route.json")
        );
    }
}
