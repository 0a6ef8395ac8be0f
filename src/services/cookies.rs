use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    /// Days until expiry. Zero or negative stores the cookie already expired.
    pub expires_in_days: Option<i64>,
    pub path: Option<String>,
}

impl CookieOptions {
    pub fn days(days: i64) -> Self {
        Self {
            expires_in_days: Some(days),
            path: Some("/".to_string()),
        }
    }
}

/// String key-value store with optional expiry, standing in for the
/// browser's cookie jar.
pub trait CookieStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    fn set(&self, name: &str, value: &str, options: CookieOptions);

    fn remove(&self, name: &str) {
        self.set(
            name,
            "",
            CookieOptions {
                expires_in_days: Some(-1),
                path: Some("/".to_string()),
            },
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Cookie {
    value: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl Cookie {
    fn new(value: &str, options: CookieOptions) -> Self {
        Self {
            value: value.to_string(),
            path: options.path,
            expires_at: options.expires_in_days.and_then(|days| expiry(Utc::now(), days)),
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Non-positive `days` expire the cookie at once. A lifetime past chrono's
/// range leaves it without an expiry.
fn expiry(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    if days <= 0 {
        return Some(DateTime::<Utc>::MIN_UTC);
    }
    Duration::try_days(days).and_then(|lifetime| now.checked_add_signed(lifetime))
}

type Jar = HashMap<String, Cookie>;

fn live_value(jar: &Jar, name: &str) -> Option<String> {
    jar.get(name)
        .filter(|c| c.is_live(Utc::now()))
        .map(|c| c.value.clone())
}

/// In-process cookie jar, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    jar: Mutex<Jar>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        live_value(&self.jar.lock(), name)
    }

    fn set(&self, name: &str, value: &str, options: CookieOptions) {
        self.jar.lock().insert(name.to_string(), Cookie::new(value, options));
    }
}

/// Cookie jar persisted as JSON so a session survives between runs.
pub struct FileCookieStore {
    path: PathBuf,
    jar: Mutex<Jar>,
}

impl FileCookieStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let jar = Self::read_jar(&path);
        debug!("Loaded {} cookie(s) from {}", jar.len(), path.display());

        Self {
            path,
            jar: Mutex::new(jar),
        }
    }

    fn read_jar(path: &Path) -> Jar {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Jar::new(),
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring unreadable cookie jar {}: {}", path.display(), e);
            Jar::new()
        })
    }

    fn persist(&self, jar: &Jar) {
        let now = Utc::now();
        let live: Jar = jar
            .iter()
            .filter(|(_, c)| c.is_live(now))
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect();

        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(&live)?;
            std::fs::write(&self.path, content)
        })();

        if let Err(e) = result {
            warn!("Failed to persist cookies to {}: {}", self.path.display(), e);
        }
    }
}

impl CookieStore for FileCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        live_value(&self.jar.lock(), name)
    }

    fn set(&self, name: &str, value: &str, options: CookieOptions) {
        let mut jar = self.jar.lock();
        jar.insert(name.to_string(), Cookie::new(value, options));
        self.persist(&jar);
    }
}
