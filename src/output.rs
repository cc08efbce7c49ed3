use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Local time stamp safe to embed in file names.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H-%M-%S").to_string()
}

pub fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let text = serde_json::to_string_pretty(value)?;
    write_text(dir, name, &text)
}

pub fn write_text(dir: &Path, name: &str, text: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, text)?;
    Ok(path)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_lands_in_created_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        let path = write_json(&out, "prs.json", &vec!["https://github.com/a/b/pull/1"]).unwrap();
        let back: Vec<String> = read_json(&path).unwrap();
        assert_eq!(back, vec!["https://github.com/a/b/pull/1".to_string()]);
    }

    #[test]
    fn timestamp_has_no_colons() {
        let ts = timestamp();
        assert_eq!(ts.len(), 19);
        assert!(!ts.contains(':'));
    }
}
