use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    /// Defaults, then the rc file at `config_path`, then the environment.
    pub fn load_from(config_path: PathBuf) -> Self {
        let mut map = default_map();

        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(60))
    }

    pub fn apply_timeout(&self) -> Duration {
        Duration::from_millis(self.get_u64("APPLY_QUERY_TIMEOUT").unwrap_or(120_000))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.get_u64("POLL_INTERVAL_MS").unwrap_or(250))
    }

    pub fn log_level(&self) -> String {
        self.get("LOG_LEVEL").unwrap_or_else(|| "warn".into())
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "REQUEST_TIMEOUT",
        "APPLY_QUERY_TIMEOUT",
        "POLL_INTERVAL_MS",
        "LOG_LEVEL",
    ];

    KEYS.contains(&k) || k.starts_with("DBX_")
}

pub fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    config_file_in(&base)
}

fn config_file_in(base: &Path) -> PathBuf {
    base.join("dbx_exec").join(".dbxexecrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    // Numbers
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("APPLY_QUERY_TIMEOUT".into(), "120000".into());
    m.insert("POLL_INTERVAL_MS".into(), "250".into());

    // Strings
    m.insert("LOG_LEVEL".into(), "warn".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_file_overrides_defaults_and_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_in(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "# workspace\nDBX_TEST_RC_HOST = https://example.cloud\n\nPOLL_INTERVAL_MS=10\n",
        )
        .unwrap();

        let cfg = Config::load_from(path);
        assert_eq!(cfg.get("DBX_TEST_RC_HOST").as_deref(), Some("https://example.cloud"));
        if env::var("POLL_INTERVAL_MS").is_err() {
            assert_eq!(cfg.poll_interval(), Duration::from_millis(10));
        }
    }

    #[test]
    fn missing_rc_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(dir.path().join("absent"));
        if env::var("APPLY_QUERY_TIMEOUT").is_err() {
            assert_eq!(cfg.apply_timeout(), Duration::from_millis(120_000));
        }
        if env::var("REQUEST_TIMEOUT").is_err() {
            assert_eq!(cfg.request_timeout(), Duration::from_secs(60));
        }
    }
}
