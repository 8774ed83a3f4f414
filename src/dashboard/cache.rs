use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

#[derive(Debug, Clone)]
struct CachedResponse {
    fetched_at: Instant,
    body: Value,
}

/// API responses keyed by call signature, each valid for `ttl`.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// `path?k=v&k=v` with parameters in call order, so repeated keys stay distinct.
    pub fn key(path: &str, params: &[(String, String)]) -> String {
        if params.is_empty() {
            return path.to_string();
        }
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{path}?{query}")
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    pub fn put(&self, key: String, body: Value) {
        self.put_at(key, body, Instant::now());
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        let mut guard = self.entries.lock().ok()?;
        let fresh = guard
            .get(key)
            .map(|entry| now.saturating_duration_since(entry.fetched_at) < self.ttl)?;
        if fresh {
            guard.get(key).map(|entry| entry.body.clone())
        } else {
            guard.remove(key);
            None
        }
    }

    fn put_at(&self, key: String, body: Value, now: Instant) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.insert(
                key,
                CachedResponse {
                    fetched_at: now,
                    body,
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn key_preserves_parameter_order() {
        let params = vec![
            ("parties".to_string(), "BJP".to_string()),
            ("parties".to_string(), "INC".to_string()),
        ];
        assert_eq!(
            ResponseCache::key("/party-seat-share", &params),
            "/party-seat-share?parties=BJP&parties=INC"
        );
        assert_eq!(ResponseCache::key("/filters", &[]), "/filters");
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(600));
        let start = Instant::now();
        cache.put_at("/filters".to_string(), json!({"years": [2019]}), start);

        let hit = cache.get_at("/filters", start + Duration::from_secs(599));
        assert_eq!(hit, Some(json!({"years": [2019]})));

        assert!(cache
            .get_at("/filters", start + Duration::from_secs(600))
            .is_none());
        assert!(cache.is_empty());
    }
}
