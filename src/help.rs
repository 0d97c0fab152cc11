//! Static help-text lookup.
//!
//! Categories map to `<help_dir>/<category>.txt`. Lookups never fail: bad
//! category names and unreadable files degrade to a user-visible error
//! string delivered like any other help text.

use std::collections::HashMap;
use std::path::PathBuf;

pub struct Help {
    dir: PathBuf,
    use_cache: bool,
    cache: HashMap<String, String>,
}

impl Help {
    pub fn new(dir: impl Into<PathBuf>, use_cache: bool) -> Self {
        Self {
            dir: dir.into(),
            use_cache,
            cache: HashMap::new(),
        }
    }

    /// Fetch a help text. An empty category falls back to `index`; names
    /// are restricted to letters only.
    pub fn get(&mut self, category: &str) -> String {
        let category = if category.is_empty() { "index" } else { category };

        if let Some(cached) = self.cache.get(category) {
            return cached.clone();
        }

        if !category.chars().all(|c| c.is_ascii_alphabetic()) {
            return "Invalid category name. Only characters from A to Z are allowed.".into();
        }

        let path = self.dir.join(format!("{category}.txt"));
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let text = text.trim_end_matches(['\r', '\n']).to_string();
                if self.use_cache {
                    self.cache.insert(category.to_string(), text.clone());
                }
                text
            }
            Err(error) => {
                tracing::debug!(category, path = %path.display(), %error, "help lookup failed");
                format!("Could not open help. {error}")
            }
        }
    }

    /// Like [`Help::get`], split into lines for private delivery.
    pub fn lines(&mut self, category: &str) -> Vec<String> {
        self.get(category).lines().map(str::to_string).collect()
    }
}
