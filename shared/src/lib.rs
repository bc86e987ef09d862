pub mod area;
pub mod error;
pub mod lens;
pub mod path_cache;
pub mod projection;
pub mod quiz;
pub mod topology;

pub use area::*;
pub use error::{Result, TopologyError};
pub use lens::{Affine, Circle, LENS_RADIUS, LENS_ZOOM, Lens};
pub use path_cache::{MapPaths, PathCache, ProjectedPath};
pub use projection::{MAP_PADDING, MAP_WIDTH, Point, Projection, VIEWPORT_PADDING, Viewport, is_drawable};
pub use quiz::{AreaIndex, Phase, Quiz, QuizEvent, Transition, shuffle};
pub use topology::Topology;
