//! Configuration utility functions.

use std::path::{Path, PathBuf};

use url::Url;

/// Parse a compile service URL. Only `http` and `https` are accepted.
///
/// # Examples
/// ```ignore
/// parse_service_url("http://localhost:8080/api")  -> Some(..)
/// parse_service_url("ftp://example.com")          -> None
/// parse_service_url("localhost:8080")             -> None
/// ```
pub fn parse_service_url(url_str: &str) -> Option<Url> {
    let parsed = Url::parse(url_str).ok()?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Some(parsed),
        _ => None,
    }
}

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until finding `config_name`.
/// An absolute `config_name` is only checked as-is.
///
/// # Example
/// ```text
/// /home/user/notes/drafts/   ← start
/// /home/user/notes/folio.toml ← found!
/// ```
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_service_url() {
        assert!(parse_service_url("http://localhost:8080/api").is_some());
        assert!(parse_service_url("https://compile.example.com").is_some());

        // Wrong scheme
        assert!(parse_service_url("ftp://example.com/api").is_none());
        // No scheme: "localhost" parses as the scheme
        assert!(parse_service_url("localhost:8080/api").is_none());
        assert!(parse_service_url("").is_none());
    }

    #[test]
    fn test_find_config_file_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a/folio.toml"), "").unwrap();

        let found = find_config_file(Path::new("folio.toml"), &nested).unwrap();
        assert_eq!(found, dir.path().join("a/folio.toml"));
    }

    #[test]
    fn test_find_config_file_ignores_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("folio.toml")).unwrap();
        let found = find_config_file(Path::new("folio.toml"), dir.path());
        assert_ne!(found, Some(dir.path().join("folio.toml")));
    }

    #[test]
    fn test_find_config_file_absolute() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert!(find_config_file(&path, dir.path()).is_none());

        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(&path, Path::new("/")), Some(path));
    }
}
