//! The "ready to serve" predicate driven by the wait coordinator.

use std::fs::Metadata;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Weak ETag for a file, derived from its length and mtime in milliseconds.
///
/// This is the freshness token the coordinator compares against the request's
/// `If-None-Match` value. Returns `None` when the platform reports no
/// modification time.
pub fn metadata_etag(meta: &Metadata) -> Option<String> {
    let modified = meta.modified().ok()?;
    let millis = modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    Some(format!("W/\"{}-{}\"", meta.len(), millis))
}

/// Whether `path` currently satisfies the request.
///
/// A failed probe or a non-regular file is "not ready yet", never an error:
/// absence is the expected state while waiting. An existing file is ready
/// unless freshness checking is on and its current token still matches one of
/// the tokens the client already holds.
pub(crate) async fn check_ready(path: &Path, client_etag: Option<&str>, etag_enabled: bool) -> bool {
    let Ok(meta) = tokio::fs::metadata(path).await else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    let (true, Some(held)) = (etag_enabled, client_etag) else {
        return true;
    };
    match metadata_etag(&meta) {
        Some(current) => !held.split(',').any(|token| token.trim() == current),
        // No token can be minted for the file, so the client's cannot match.
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_path_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!check_ready(&dir.path().join("absent.txt"), None, false).await);
    }

    #[tokio::test]
    async fn directory_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!check_ready(dir.path(), None, false).await);
    }

    #[tokio::test]
    async fn existing_file_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ready.txt");
        tokio::fs::write(&path, b"ready").await.unwrap();
        assert!(check_ready(&path, None, false).await);
    }

    #[tokio::test]
    async fn matching_token_keeps_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.txt");
        tokio::fs::write(&path, b"stale").await.unwrap();
        let token = metadata_etag(&std::fs::metadata(&path).unwrap()).unwrap();
        assert!(!check_ready(&path, Some(&token), true).await);
    }

    #[tokio::test]
    async fn matching_token_in_list_keeps_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.txt");
        tokio::fs::write(&path, b"stale").await.unwrap();
        let token = metadata_etag(&std::fs::metadata(&path).unwrap()).unwrap();
        let held = format!("\"unrelated\", {token}");
        assert!(!check_ready(&path, Some(&held), true).await);
    }

    #[tokio::test]
    async fn differing_token_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changed.txt");
        tokio::fs::write(&path, b"changed").await.unwrap();
        assert!(check_ready(&path, Some("W/\"0-0\""), true).await);
    }

    #[tokio::test]
    async fn token_is_ignored_when_etag_checking_is_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        tokio::fs::write(&path, b"plain").await.unwrap();
        let token = metadata_etag(&std::fs::metadata(&path).unwrap()).unwrap();
        assert!(check_ready(&path, Some(&token), false).await);
    }

    #[test]
    fn etag_reflects_length_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.txt");
        std::fs::write(&path, b"12345").unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        let token = metadata_etag(&meta).unwrap();
        assert!(token.starts_with("W/\"5-"));
        assert_eq!(token, metadata_etag(&meta).unwrap());
    }
}
