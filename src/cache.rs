use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

use crate::generator::GeneratedFile;

#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub file: GeneratedFile,
}

/// Content-addressed compile cache: the key hashes the raw document, the
/// request parameters and the config fingerprint, so any input change
/// invalidates the entry. Cache misses and IO failures are silent; the
/// cache can only ever skip work, never change output.
pub struct CompileCache {
    cache_dir: PathBuf,
}

impl CompileCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).ok();
        }
        Self { cache_dir }
    }

    pub fn compute_hash(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, component_name: &str) -> PathBuf {
        let safe_name = component_name
            .replace('/', "_")
            .replace('\\', "_")
            .replace(':', "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    pub fn get(&self, component_name: &str, key_source: &str) -> Option<GeneratedFile> {
        let path = self.entry_path(component_name);
        if !path.exists() {
            return None;
        }

        let data = match fs::read_to_string(&path) {
            Ok(d) => d,
            Err(_) => return None,
        };

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("cache entry for {} is corrupt: {}", component_name, e);
                fs::remove_file(path).ok();
                return None;
            }
        };

        if entry.hash == Self::compute_hash(key_source) {
            Some(entry.file)
        } else {
            None
        }
    }

    pub fn set(&self, component_name: &str, key_source: &str, file: &GeneratedFile) {
        let entry = CacheEntry {
            hash: Self::compute_hash(key_source),
            file: file.clone(),
        };
        if let Ok(data) = serde_json::to_string(&entry) {
            fs::write(self.entry_path(component_name), data).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file() -> GeneratedFile {
        GeneratedFile {
            code: "export default function Card() {\n  return (\n    null\n  );\n}\n".to_string(),
            imports: vec![],
            component_name: "Card".to_string(),
        }
    }

    #[test]
    fn test_round_trip_and_invalidation() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CompileCache::new(dir.path().join("cache"));
        assert!(cache.get("Card", "key-1").is_none());

        cache.set("Card", "key-1", &sample_file());
        let hit = cache.get("Card", "key-1").unwrap();
        assert_eq!(hit.code, sample_file().code);

        assert!(cache.get("Card", "key-2").is_none());
    }

    #[test]
    fn test_corrupt_entry_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CompileCache::new(dir.path().join("cache"));
        cache.set("Card", "key", &sample_file());
        fs::write(dir.path().join("cache/Card.json"), "{broken").unwrap();
        assert!(cache.get("Card", "key").is_none());
    }
}
