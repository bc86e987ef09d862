use thiserror::Error;

pub type Result<T> = std::result::Result<T, TopologyError>;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Invalid topology JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Topology has no object layer named `{0}`")]
    MissingLayer(String),

    #[error("Layer `{0}` is not a GeometryCollection")]
    NotACollection(String),

    #[error("No geometry in layer `{layer}` carries a usable {field} property")]
    MissingProperty { layer: String, field: &'static str },

    #[error("Arc index {0} is out of range")]
    ArcOutOfRange(i64),
}
