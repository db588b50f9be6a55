use std::path::Path;

use mar_format::path::PATH_PLATFORM_SEP;
use mar_format::MarPath;

/// `-` names stdin or stdout in place of an archive path.
pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Format a MarPath for display, marking directories with a trailing separator.
pub fn format_path(mar_path: &MarPath, is_dir: bool) -> String {
    let mut path = mar_path.to_string();
    if is_dir {
        path.push_str(PATH_PLATFORM_SEP);
    }
    path
}

/// Format file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    use humansize::{FormatSize, BINARY};
    bytes.format_size(BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdio_dash() {
        assert!(is_stdio(Path::new("-")));
        assert!(!is_stdio(Path::new("./-")));
    }

    #[test]
    fn directories_get_a_separator() {
        let path = MarPath::new("a/c").unwrap();
        assert_eq!(format_path(&path, true), format!("a{0}c{0}", PATH_PLATFORM_SEP));
        assert_eq!(format_size(2048), "2 KiB");
    }
}
