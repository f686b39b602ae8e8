//! Reading block sources from disk at template registration.

use std::{fs, path::Path};

use super::error::InfraError;

pub fn read_text(path: &Path) -> Result<String, InfraError> {
    let bytes = read_bytes(path)?;
    String::from_utf8(bytes).map_err(|err| {
        InfraError::asset(format!("`{}` is not valid UTF-8: {err}", path.display()))
    })
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>, InfraError> {
    fs::read(path).map_err(|err| InfraError::unreadable(path, err))
}

/// Reject names that would escape the directory they are joined onto.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && !name.ends_with('/')
        && !name.contains("..")
        && !name.contains('\\')
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn reads_text_and_bytes() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"body{}").expect("write");

        assert_eq!(read_text(file.path()).expect("text"), "body{}");
        assert_eq!(read_bytes(file.path()).expect("bytes"), b"body{}");
    }

    #[test]
    fn missing_file_is_an_asset_error() {
        let err = read_text(Path::new("/definitely/not/here.css")).expect_err("missing");
        assert!(matches!(err, InfraError::Asset { .. }));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(&[0xff, 0xfe]).expect("write");
        assert!(read_text(file.path()).is_err());
    }

    #[test]
    fn rejects_traversal_names() {
        assert!(is_safe_name("home"));
        assert!(is_safe_name("blog/post-1"));
        assert!(!is_safe_name("../secret"));
        assert!(!is_safe_name("/etc/passwd"));
        assert!(!is_safe_name(""));
    }
}
