use std::collections::{BTreeMap, HashSet};
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub type AreaId = String;

/// One `[lon, lat]` position.
pub type Position = [f64; 2];

/// Ordered list of positions. Closed rings repeat the first point at the end.
pub type Ring = Vec<Position>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

/// Polygon or multi-polygon outline in longitude/latitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Boundary {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Boundary {
    /// Every ring of every polygon, flattened.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        let polygons: &[Vec<Ring>] = match self {
            Self::Polygon(rings) => std::slice::from_ref(rings),
            Self::MultiPolygon(polygons) => polygons,
        };
        polygons.iter().flat_map(|rings| rings.iter())
    }

    pub fn point_count(&self) -> usize {
        self.rings().map(Vec::len).sum()
    }

    pub fn into_polygons(self) -> Vec<Vec<Ring>> {
        match self {
            Self::Polygon(rings) => vec![rings],
            Self::MultiPolygon(polygons) => polygons,
        }
    }

    /// Both outlines as one multi-polygon.
    pub fn merge(self, other: Boundary) -> Boundary {
        let mut polygons = self.into_polygons();
        polygons.extend(other.into_polygons());
        Self::MultiPolygon(polygons)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRef>,
    pub boundary: Boundary,
}

impl Area {
    pub fn group_id(&self) -> Option<&str> {
        self.group.as_ref().map(|group| group.id.as_str())
    }

    pub fn group_name(&self) -> Option<&str> {
        self.group.as_ref().map(|group| group.name.as_str())
    }
}

/// Open polyline of `[lon, lat]` positions, used for internal group borders.
pub type BorderLine = Vec<Position>;

/// Wire payload: every area of the dataset plus the internal group borders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub areas: Vec<Area>,
    #[serde(default)]
    pub borders: Vec<BorderLine>,
}

impl Dataset {
    /// Drop areas that can never be clicked: those without a single projectable
    /// position and repeats of an id already seen. Returns how many were dropped.
    pub fn retain_playable(&mut self) -> usize {
        let before = self.areas.len();
        let mut seen = HashSet::new();
        self.areas
            .retain(|area| crate::projection::is_drawable(area) && seen.insert(area.id.clone()));
        before - self.areas.len()
    }
}

/// Immutable, shared collection of areas.
///
/// Equality is identity: two sets are equal only when they are the same
/// allocation. Filtering always produces a new identity, so consumers can
/// detect a changed active set with a pointer comparison.
#[derive(Debug, Clone)]
pub struct AreaSet(Arc<[Area]>);

impl AreaSet {
    pub fn new(areas: Vec<Area>) -> Self {
        Self(areas.into())
    }

    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    pub fn same_as(&self, other: &AreaSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|area| area.id.as_str())
    }

    /// Areas whose group id matches. `None` keeps the same set and identity.
    pub fn filter_group(&self, group_id: Option<&str>) -> AreaSet {
        let Some(group_id) = group_id else {
            return self.clone();
        };
        let areas: Vec<Area> = self
            .0
            .iter()
            .filter(|area| area.group_id() == Some(group_id))
            .cloned()
            .collect();
        Self::new(areas)
    }

    /// Distinct groups referenced by the set, sorted by id.
    pub fn groups(&self) -> Vec<GroupRef> {
        let mut groups: BTreeMap<&str, &GroupRef> = BTreeMap::new();
        for group in self.0.iter().filter_map(|area| area.group.as_ref()) {
            groups.entry(group.id.as_str()).or_insert(group);
        }
        groups.into_values().cloned().collect()
    }
}

impl PartialEq for AreaSet {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for AreaSet {}

impl Deref for AreaSet {
    type Target = [Area];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Area>> for AreaSet {
    fn from(areas: Vec<Area>) -> Self {
        Self::new(areas)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{Area, Boundary, GroupRef};

    /// Axis-aligned square ring with its south-west corner at `(lon, lat)`.
    pub fn square(lon: f64, lat: f64, size: f64) -> Vec<[f64; 2]> {
        vec![
            [lon, lat],
            [lon + size, lat],
            [lon + size, lat + size],
            [lon, lat + size],
            [lon, lat],
        ]
    }

    pub fn area(id: &str, group: Option<(&str, &str)>, lon: f64, lat: f64) -> Area {
        Area {
            id: id.to_string(),
            name: format!("Area {id}"),
            group: group.map(|(id, name)| GroupRef {
                id: id.to_string(),
                name: name.to_string(),
            }),
            boundary: Boundary::Polygon(vec![square(lon, lat, 1.0)]),
        }
    }
}
