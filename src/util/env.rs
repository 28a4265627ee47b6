//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Get required env var; error if missing.
pub fn env_req(key: &str) -> anyhow::Result<String> {
    init_env();
    std::env::var(key).map_err(|_| anyhow::anyhow!("missing env var {key}"))
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    init_env();
    match std::env::var(key) {
        Ok(raw) => {
            let v = raw.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "on" | "yes")
        }
        Err(_) => default,
    }
}

/// Database DSN resolution: first non-empty of DATABASE_URL / DB_URL.
pub fn db_url() -> anyhow::Result<String> {
    init_env();
    for k in ["DATABASE_URL", "DB_URL"] {
        if let Some(v) = env_opt(k) {
            return Ok(v);
        }
    }
    Err(anyhow::anyhow!("no database URL env vars set"))
}

/// Meilisearch endpoint (host + optional API key + index uid).
pub struct SearchEnv {
    pub url: String,
    pub api_key: Option<String>,
    pub index: String,
}

pub fn search_env() -> SearchEnv {
    init_env();
    let url = env_opt("MEILI_URL").unwrap_or_else(|| "http://127.0.0.1:7700".to_string());
    let api_key = env_opt("MEILI_API_KEY");
    let index = env_opt("MEILI_PRODUCTS_INDEX").unwrap_or_else(|| "products".to_string());
    info!(url = %url, index = %index, "search endpoint resolved");
    SearchEnv {
        url,
        api_key,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_flag_accepts_truthy_spellings() {
        std::env::set_var("TEST_FLAG_TRUTHY", "Yes");
        assert!(env_flag("TEST_FLAG_TRUTHY", false));
        std::env::set_var("TEST_FLAG_TRUTHY", "0");
        assert!(!env_flag("TEST_FLAG_TRUTHY", true));
        std::env::remove_var("TEST_FLAG_TRUTHY");
        assert!(env_flag("TEST_FLAG_TRUTHY", true));
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("TEST_PARSE_NUM", "not-a-number");
        assert_eq!(env_parse::<u32>("TEST_PARSE_NUM", 7), 7);
        std::env::set_var("TEST_PARSE_NUM", "42");
        assert_eq!(env_parse::<u32>("TEST_PARSE_NUM", 7), 42);
        std::env::remove_var("TEST_PARSE_NUM");
    }
}
