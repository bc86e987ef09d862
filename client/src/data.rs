use std::sync::Arc;

use kartquiz_shared::{AreaSet, BorderLine, Dataset, GroupRef};

/// Dataset as the client keeps it: one shared area set for the whole session.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub all: AreaSet,
    pub borders: Arc<[BorderLine]>,
    pub groups: Arc<[GroupRef]>,
    /// Areas dropped because they could never be clicked.
    pub skipped: usize,
}

impl LoadedMap {
    /// Only playable areas enter the set, so the map and the round agree on ids.
    pub fn from_dataset(mut dataset: Dataset) -> Self {
        let skipped = dataset.retain_playable();
        let all = AreaSet::new(dataset.areas);
        let groups = all.groups().into();
        Self {
            all,
            borders: dataset.borders.into(),
            groups,
            skipped,
        }
    }

    pub fn has_group(&self, id: &str) -> bool {
        self.groups.iter().any(|group| group.id == id)
    }
}

/// Identity comparison, matching [`AreaSet`].
impl PartialEq for LoadedMap {
    fn eq(&self, other: &Self) -> bool {
        self.all == other.all && Arc::ptr_eq(&self.borders, &other.borders)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Fetch the boundary dataset served by the backend.
pub async fn fetch_dataset() -> Result<Dataset, String> {
    let resp = gloo_net::http::Request::get("/api/dataset")
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<Dataset>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}
