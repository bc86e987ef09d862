use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use kartquiz_shared::{AreaSet, GroupRef, Topology, TopologyError};
use thiserror::Error;

/// Read-only state: the dataset is decoded once and served pre-serialized.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dataset_json: Arc<Bytes>,
    pub dataset_etag: Arc<str>,
    pub groups: Arc<[GroupRef]>,
    pub groups_json: Arc<Bytes>,
    pub area_count: usize,
    pub border_count: usize,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to decode topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("failed to serialize dataset: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AppState {
    pub fn from_topology_str(json: &str, layer: Option<&str>) -> Result<Self, StateError> {
        let dataset = Topology::parse(json)?.dataset(layer)?;
        let dataset_json = serde_json::to_vec(&dataset)?;
        let area_count = dataset.areas.len();
        let border_count = dataset.borders.len();
        let groups = AreaSet::new(dataset.areas).groups();
        let groups_json = serde_json::to_vec(&groups)?;

        tracing::info!(
            areas = area_count,
            groups = groups.len(),
            borders = border_count,
            bytes = dataset_json.len(),
            "dataset loaded"
        );

        Ok(Self {
            dataset_etag: dataset_etag(&dataset_json).into(),
            dataset_json: Arc::new(Bytes::from(dataset_json)),
            groups: groups.into(),
            groups_json: Arc::new(Bytes::from(groups_json)),
            area_count,
            border_count,
            started_at: Utc::now(),
        })
    }
}

/// Strong ETag over the serialized payload.
pub fn dataset_etag(payload: &[u8]) -> String {
    format!("\"dataset-{:08x}\"", crc32fast::hash(payload))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_counts_and_groups() {
        let state = AppState::from_topology_str(fixtures::TOPOLOGY, None).unwrap();
        assert_eq!(state.area_count, 2);
        assert_eq!(state.border_count, 1);
        let ids: Vec<&str> = state.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["03", "32"]);
    }

    #[test]
    fn etag_follows_payload() {
        let state = AppState::from_topology_str(fixtures::TOPOLOGY, None).unwrap();
        assert_eq!(&*state.dataset_etag, dataset_etag(&state.dataset_json));
        assert_ne!(dataset_etag(b"a"), dataset_etag(b"b"));
        assert!(state.dataset_etag.starts_with("\"dataset-"));
    }

    #[test]
    fn unknown_layer_is_an_error() {
        let err = AppState::from_topology_str(fixtures::TOPOLOGY, Some("fylker")).unwrap_err();
        assert!(matches!(
            err,
            StateError::Topology(TopologyError::MissingLayer(ref name)) if name == "fylker"
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = AppState::from_topology_str("{", None).unwrap_err();
        assert!(matches!(err, StateError::Topology(TopologyError::Json(_))));
    }
}
