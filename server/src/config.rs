use std::path::PathBuf;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_TOPOLOGY_PATH: &str = "data/kommuner.json";
pub const DEFAULT_STATIC_DIR: &str = "client/dist";

pub const DATASET_CACHE_CONTROL: &str = "public, max-age=300";
pub const GROUPS_CACHE_CONTROL: &str = "public, max-age=300";

pub fn server_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn topology_path() -> PathBuf {
    non_empty_var("KARTQUIZ_TOPOLOGY")
        .unwrap_or_else(|| DEFAULT_TOPOLOGY_PATH.to_string())
        .into()
}

pub fn static_dir() -> PathBuf {
    non_empty_var("KARTQUIZ_STATIC_DIR")
        .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
        .into()
}

/// Object layer to read from the topology; `None` takes the first one.
pub fn topology_layer() -> Option<String> {
    non_empty_var("KARTQUIZ_LAYER")
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
