use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{instrument, warn};

/// Comparison results stored as `<fingerprint>.json` in one directory.
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{fingerprint}.json"))
    }

    /// Cached result for the fingerprint; unreadable entries count as misses.
    #[instrument(skip(self), name = "Reading cached result")]
    pub fn read(&self, fingerprint: &str) -> Option<Value> {
        let path = self.path(fingerprint);
        read_fallibly(&path).unwrap_or_else(|error| {
            warn!(path = %path.display(), %error, "ignoring unreadable cache entry");
            None
        })
    }

    #[instrument(skip(self, value), name = "Writing cached result")]
    pub fn write(&self, fingerprint: &str, value: &Value) {
        let path = self.path(fingerprint);
        if let Err(error) = write_fallibly(&self.dir, &path, value) {
            warn!(path = %path.display(), %error, "failed to save cached result");
        }
    }
}

fn read_fallibly(path: &Path) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if path.is_file() {
        Ok(Some(serde_json::from_str(&fs::read_to_string(path)?)?))
    } else {
        Ok(None)
    }
}

fn write_fallibly(dir: &Path, path: &Path, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tco-cache-{name}-{}", std::process::id()))
    }

    #[test]
    fn test_write_then_read_hits() {
        let cache = ResultCache::new(scratch_dir("hit"));
        let value = serde_json::json!({ "result": { "npv_savings": "123.45" } });
        cache.write("abc123", &value);
        assert_eq!(cache.read("abc123"), Some(value));
    }

    #[test]
    fn test_unknown_fingerprint_misses() {
        let cache = ResultCache::new(scratch_dir("miss"));
        assert_eq!(cache.read("nope"), None);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = scratch_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bad.json"), "not json").unwrap();
        assert_eq!(ResultCache::new(dir).read("bad"), None);
    }
}
