use std::collections::HashSet;
use std::sync::Arc;

use crate::area::{AreaId, AreaSet, BorderLine};
use crate::projection::{Projection, Viewport};

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPath {
    pub id: AreaId,
    pub d: String,
}

/// Everything the map layers draw for one (dataset, active subset) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPaths {
    /// Every drawable area of the dataset.
    pub all: Arc<[ProjectedPath]>,
    /// The drawable areas currently in play.
    pub active: Vec<ProjectedPath>,
    pub active_ids: HashSet<AreaId>,
    pub viewport: Viewport,
    pub borders: Option<Arc<str>>,
    pub is_filtered: bool,
}

impl MapPaths {
    pub fn is_active(&self, id: &str) -> bool {
        self.active_ids.contains(id)
    }
}

/// Base layer derived from the dataset alone.
#[derive(Debug)]
struct BaseLayer {
    dataset: AreaSet,
    projection: Arc<Projection>,
    all: Arc<[ProjectedPath]>,
    borders: Option<Arc<str>>,
}

/// Memoized paths keyed on the identity of the dataset and the active subset.
///
/// The projection and the full path list are rebuilt only when a different
/// dataset is passed; the active list and viewport only when a different
/// active subset is passed. Anything else returns the cached value.
#[derive(Debug, Default)]
pub struct PathCache {
    base: Option<BaseLayer>,
    active: Option<(AreaSet, Arc<MapPaths>)>,
    projection_builds: u64,
    active_builds: u64,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, all: &AreaSet, borders: &[BorderLine], active: &AreaSet) -> Arc<MapPaths> {
        let base_changed = !self
            .base
            .as_ref()
            .is_some_and(|base| base.dataset.same_as(all));
        if base_changed {
            self.base = Some(self.build_base(all, borders));
            self.active = None;
        }

        if let Some((cached_active, paths)) = &self.active
            && cached_active.same_as(active)
        {
            return Arc::clone(paths);
        }

        let paths = Arc::new(self.build_active(active));
        self.active = Some((active.clone(), Arc::clone(&paths)));
        paths
    }

    pub fn projection(&self) -> Option<Arc<Projection>> {
        self.base.as_ref().map(|base| Arc::clone(&base.projection))
    }

    pub fn projection_builds(&self) -> u64 {
        self.projection_builds
    }

    pub fn active_builds(&self) -> u64 {
        self.active_builds
    }

    fn build_base(&mut self, all: &AreaSet, borders: &[BorderLine]) -> BaseLayer {
        self.projection_builds += 1;
        let projection = Projection::new(all);
        let paths: Vec<ProjectedPath> = all
            .iter()
            .filter_map(|area| {
                projection.path_of(area).map(|d| ProjectedPath {
                    id: area.id.clone(),
                    d,
                })
            })
            .collect();
        let skipped = all.len() - paths.len();
        if skipped > 0 {
            tracing::warn!(skipped, "areas without drawable geometry left out of the map");
        }
        let borders = projection.lines_path(borders).map(Arc::from);

        BaseLayer {
            dataset: all.clone(),
            projection: Arc::new(projection),
            all: paths.into(),
            borders,
        }
    }

    fn build_active(&mut self, active: &AreaSet) -> MapPaths {
        self.active_builds += 1;
        let Some(base) = &self.base else {
            return MapPaths {
                all: Arc::from(Vec::new()),
                active: Vec::new(),
                active_ids: HashSet::new(),
                viewport: Projection::new(&[]).full_viewport(),
                borders: None,
                is_filtered: false,
            };
        };

        let active_ids: HashSet<AreaId> = active.ids().map(str::to_string).collect();
        let active_paths = base
            .all
            .iter()
            .filter(|path| active_ids.contains(&path.id))
            .cloned()
            .collect();

        MapPaths {
            all: Arc::clone(&base.all),
            active: active_paths,
            active_ids,
            viewport: base.projection.viewport_of(active),
            borders: base.borders.clone(),
            is_filtered: active.len() < base.dataset.len(),
        }
    }
}
