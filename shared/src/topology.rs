//! TopoJSON decoding: turns a topology layer into [`Area`] records and extracts
//! the borders between neighbouring groups.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::area::{Area, BorderLine, Boundary, Dataset, GroupRef, Position, Ring};
use crate::error::{Result, TopologyError};
use crate::projection::is_drawable;

const ID_KEYS: &[&str] = &["kommunenummer", "id", "KOMMUNENR"];
const NAME_KEYS: &[&str] = &["navn", "kommune", "kommunenavn", "name"];
const GROUP_ID_KEYS: &[&str] = &["fylkesnummer", "fylkenummer"];
const GROUP_NAME_KEYS: &[&str] = &["fylkenavn", "fylkesnavn"];

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopoGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub arcs: Value,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometries: Vec<TopoGeometry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    pub objects: BTreeMap<String, TopoGeometry>,
}

/// Arc indices of one geometry, grouped as polygons of rings.
enum ArcRefs {
    Polygon(Vec<Vec<i64>>),
    MultiPolygon(Vec<Vec<Vec<i64>>>),
}

impl ArcRefs {
    fn of(geometry: &TopoGeometry) -> Option<Self> {
        match geometry.kind.as_str() {
            "Polygon" => Vec::<Vec<i64>>::deserialize(&geometry.arcs)
                .ok()
                .map(Self::Polygon),
            "MultiPolygon" => Vec::<Vec<Vec<i64>>>::deserialize(&geometry.arcs)
                .ok()
                .map(Self::MultiPolygon),
            _ => None,
        }
    }

    fn indices(&self) -> Vec<i64> {
        match self {
            Self::Polygon(rings) => rings.iter().flatten().copied().collect(),
            Self::MultiPolygon(polygons) => polygons.iter().flatten().flatten().copied().collect(),
        }
    }
}

/// Absolute coordinates of every arc, decoded once.
struct ArcTable {
    arcs: Vec<Vec<Position>>,
}

impl ArcTable {
    fn decode(topology: &Topology) -> Self {
        let arcs = topology
            .arcs
            .iter()
            .map(|arc| decode_arc(arc, topology.transform))
            .collect();
        Self { arcs }
    }

    fn get(&self, index: i64) -> Result<&[Position]> {
        let resolved = if index < 0 { !index } else { index };
        usize::try_from(resolved)
            .ok()
            .and_then(|i| self.arcs.get(i))
            .map(Vec::as_slice)
            .ok_or(TopologyError::ArcOutOfRange(index))
    }

    /// Stitch arcs into one ring without repeating shared endpoints.
    fn ring(&self, indices: &[i64]) -> Result<Ring> {
        let mut points: Ring = Vec::new();
        for &index in indices {
            let arc = self.get(index)?;
            points.pop();
            let start = points.len();
            points.extend_from_slice(arc);
            if index < 0 {
                points[start..].reverse();
            }
        }
        if let Some(&first) = points.first() {
            while points.len() < 4 {
                points.push(first);
            }
        }
        Ok(points)
    }

    fn boundary(&self, refs: &ArcRefs) -> Result<Boundary> {
        match refs {
            ArcRefs::Polygon(rings) => Ok(Boundary::Polygon(self.rings(rings)?)),
            ArcRefs::MultiPolygon(polygons) => polygons
                .iter()
                .map(|rings| self.rings(rings))
                .collect::<Result<Vec<_>>>()
                .map(Boundary::MultiPolygon),
        }
    }

    fn rings(&self, rings: &[Vec<i64>]) -> Result<Vec<Ring>> {
        rings.iter().map(|ring| self.ring(ring)).collect()
    }
}

fn decode_arc(arc: &[Vec<f64>], transform: Option<Transform>) -> Vec<Position> {
    let coord = |p: &[f64], axis: usize| p.get(axis).copied().unwrap_or(0.0);
    match transform {
        Some(Transform { scale, translate }) => {
            let (mut x, mut y) = (0.0, 0.0);
            arc.iter()
                .map(|p| {
                    x += coord(p, 0);
                    y += coord(p, 1);
                    [x * scale[0] + translate[0], y * scale[1] + translate[1]]
                })
                .collect()
        }
        None => arc.iter().map(|p| [coord(p, 0), coord(p, 1)]).collect(),
    }
}

fn property(properties: Option<&Map<String, Value>>, keys: &[&str]) -> Option<String> {
    let properties = properties?;
    keys.iter().find_map(|key| match properties.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn group_of(geometry: &TopoGeometry) -> Option<GroupRef> {
    let properties = geometry.properties.as_ref();
    let id = property(properties, GROUP_ID_KEYS)?;
    let name = property(properties, GROUP_NAME_KEYS).unwrap_or_else(|| id.clone());
    Some(GroupRef { id, name })
}

impl Topology {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Named layer, or the first layer by name when `name` is `None`.
    pub fn layer(&self, name: Option<&str>) -> Result<(&str, &[TopoGeometry])> {
        let (layer_name, object) = match name {
            Some(name) => self
                .objects
                .get_key_value(name)
                .ok_or_else(|| TopologyError::MissingLayer(name.to_string()))?,
            None => self
                .objects
                .iter()
                .next()
                .ok_or_else(|| TopologyError::MissingLayer(String::new()))?,
        };
        if object.kind != "GeometryCollection" {
            return Err(TopologyError::NotACollection(layer_name.clone()));
        }
        Ok((layer_name.as_str(), object.geometries.as_slice()))
    }

    pub fn areas(&self, layer: Option<&str>) -> Result<Vec<Area>> {
        self.areas_with(&ArcTable::decode(self), layer)
    }

    pub fn internal_borders(&self, layer: Option<&str>) -> Result<Vec<BorderLine>> {
        self.borders_with(&ArcTable::decode(self), layer)
    }

    /// Areas plus internal group borders, sharing one arc decode.
    pub fn dataset(&self, layer: Option<&str>) -> Result<Dataset> {
        let table = ArcTable::decode(self);
        Ok(Dataset {
            areas: self.areas_with(&table, layer)?,
            borders: self.borders_with(&table, layer)?,
        })
    }

    fn areas_with(&self, table: &ArcTable, layer: Option<&str>) -> Result<Vec<Area>> {
        let (layer_name, geometries) = self.layer(layer)?;
        let mut areas: Vec<Area> = Vec::with_capacity(geometries.len());
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut missing_id = 0usize;
        let mut missing_name = 0usize;

        for geometry in geometries {
            let properties = geometry.properties.as_ref();
            let Some(id) = property(properties, ID_KEYS) else {
                missing_id += 1;
                continue;
            };
            let Some(name) = property(properties, NAME_KEYS) else {
                missing_name += 1;
                continue;
            };
            let Some(refs) = ArcRefs::of(geometry) else {
                tracing::warn!(%id, kind = %geometry.kind, "skipping non-polygonal geometry");
                continue;
            };
            let boundary = table.boundary(&refs)?;
            if let Some(&existing) = by_id.get(&id) {
                // Islands are sometimes stored as separate features.
                tracing::warn!(%id, "merging geometries that share an id");
                let area = &mut areas[existing];
                let first =
                    std::mem::replace(&mut area.boundary, Boundary::MultiPolygon(Vec::new()));
                area.boundary = first.merge(boundary);
                continue;
            }
            by_id.insert(id.clone(), areas.len());
            areas.push(Area {
                id,
                name,
                group: group_of(geometry),
                boundary,
            });
        }

        areas.retain(|area| {
            let drawable = is_drawable(area);
            if !drawable {
                tracing::warn!(id = %area.id, "skipping area without a valid position");
            }
            drawable
        });

        if areas.is_empty() && (missing_id > 0 || missing_name > 0) {
            let field = if missing_id > 0 { "id" } else { "name" };
            return Err(TopologyError::MissingProperty {
                layer: layer_name.to_string(),
                field,
            });
        }
        if missing_id + missing_name > 0 {
            tracing::warn!(
                layer = layer_name,
                missing_id,
                missing_name,
                "skipped geometries without id or name"
            );
        }
        tracing::debug!(layer = layer_name, areas = areas.len(), "decoded topology layer");
        Ok(areas)
    }

    /// Arcs shared by exactly two geometries of different groups.
    fn borders_with(&self, table: &ArcTable, layer: Option<&str>) -> Result<Vec<BorderLine>> {
        let (_, geometries) = self.layer(layer)?;
        let groups: Vec<Option<String>> = geometries
            .iter()
            .map(|geometry| property(geometry.properties.as_ref(), GROUP_ID_KEYS))
            .collect();

        let mut geometries_by_arc: HashMap<usize, Vec<usize>> = HashMap::new();
        for (geometry_idx, geometry) in geometries.iter().enumerate() {
            let Some(refs) = ArcRefs::of(geometry) else {
                continue;
            };
            for index in refs.indices() {
                let arc = if index < 0 { !index } else { index };
                if let Ok(arc) = usize::try_from(arc) {
                    geometries_by_arc.entry(arc).or_default().push(geometry_idx);
                }
            }
        }

        let mut shared: Vec<usize> = geometries_by_arc
            .into_iter()
            .filter(|(_, owners)| {
                owners.len() == 2 && groups[owners[0]] != groups[owners[1]]
            })
            .map(|(arc, _)| arc)
            .collect();
        shared.sort_unstable();

        shared
            .into_iter()
            .map(|arc| table.get(arc as i64).map(<[Position]>::to_vec))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two unit squares side by side sharing the arc x = 1, plus a third square
    /// above the left one sharing the arc y = 1 (same group as the left one).
    ///
    /// Arcs (quantized, delta-encoded, scale 1 / translate (10, 60)):
    ///   0: (1,0) -> (1,1)            shared A|B
    ///   1: (1,1) -> (0,1)            shared A|C
    ///   2: (0,1) -> (0,0) -> (1,0)   A outer
    ///   3: (1,0) -> (2,0) -> (2,1) -> (1,1)  B outer
    ///   4: (1,1) -> (1,2) -> (0,2) -> (0,1)  C outer
    const FIXTURE: &str = r#"{
        "type": "Topology",
        "transform": { "scale": [1, 1], "translate": [10, 60] },
        "arcs": [
            [[1, 0], [0, 1]],
            [[1, 1], [-1, 0]],
            [[0, 1], [0, -1], [1, 0]],
            [[1, 0], [1, 0], [0, 1], [-1, 0]],
            [[1, 1], [0, 1], [-1, 0], [0, -1]]
        ],
        "objects": {
            "kommuner": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Polygon", "arcs": [[0, 1, 2]],
                      "properties": { "kommunenummer": "0301", "navn": "Oslo",
                                      "fylkesnummer": "03", "fylkenavn": "Oslo" } },
                    { "type": "Polygon", "arcs": [[3, -1]],
                      "properties": { "kommunenummer": "3201", "navn": "Bærum",
                                      "fylkesnummer": "32", "fylkenavn": "Akershus" } },
                    { "type": "MultiPolygon", "arcs": [[[-2, 4]]],
                      "properties": { "kommunenummer": 302, "navn": "Nordmarka",
                                      "fylkesnummer": "03" } },
                    { "type": "Point", "coordinates": [0, 0],
                      "properties": { "kommunenummer": "9999", "navn": "Fyr" } },
                    { "type": "Polygon", "arcs": [],
                      "properties": { "navn": "Uten nummer" } }
                ]
            }
        }
    }"#;

    fn topology() -> Topology {
        Topology::parse(FIXTURE).unwrap()
    }

    #[test]
    fn decodes_quantized_polygon_rings() {
        let areas = topology().areas(None).unwrap();
        assert_eq!(areas.len(), 3);

        let oslo = &areas[0];
        assert_eq!(oslo.id, "0301");
        assert_eq!(oslo.name, "Oslo");
        let Boundary::Polygon(rings) = &oslo.boundary else {
            panic!("expected polygon");
        };
        assert_eq!(
            rings[0],
            vec![[11.0, 60.0], [11.0, 61.0], [10.0, 61.0], [10.0, 60.0], [11.0, 60.0]]
        );
    }

    #[test]
    fn reversed_arcs_close_the_ring() {
        let areas = topology().areas(None).unwrap();
        let Boundary::Polygon(rings) = &areas[1].boundary else {
            panic!("expected polygon");
        };
        let ring = &rings[0];
        assert_eq!(ring.first(), ring.last());
        assert_eq!(
            ring,
            &vec![[11.0, 60.0], [12.0, 60.0], [12.0, 61.0], [11.0, 61.0], [11.0, 60.0]]
        );
    }

    #[test]
    fn numeric_ids_and_missing_group_names_are_resolved() {
        let areas = topology().areas(None).unwrap();
        let nordmarka = &areas[2];
        assert_eq!(nordmarka.id, "302");
        assert_eq!(
            nordmarka.group,
            Some(GroupRef {
                id: "03".to_string(),
                name: "03".to_string()
            })
        );
        assert!(matches!(nordmarka.boundary, Boundary::MultiPolygon(_)));
    }

    #[test]
    fn internal_borders_only_between_different_groups() {
        let borders = topology().internal_borders(None).unwrap();
        assert_eq!(borders, vec![vec![[11.0, 60.0], [11.0, 61.0]]]);
    }

    #[test]
    fn short_rings_are_padded_to_four_points() {
        let table = ArcTable {
            arcs: vec![vec![[0.0, 0.0], [1.0, 1.0]]],
        };
        let ring = table.ring(&[0]).unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[2], [0.0, 0.0]);
        assert_eq!(ring[3], [0.0, 0.0]);
    }

    #[test]
    fn unknown_layer_is_reported() {
        let err = topology().areas(Some("fylker")).unwrap_err();
        assert!(matches!(err, TopologyError::MissingLayer(name) if name == "fylker"));
    }

    #[test]
    fn out_of_range_arc_is_an_error() {
        let json = r#"{
            "type": "Topology",
            "arcs": [],
            "objects": { "k": { "type": "GeometryCollection", "geometries": [
                { "type": "Polygon", "arcs": [[7]],
                  "properties": { "id": "1", "name": "One" } }
            ] } }
        }"#;
        let err = Topology::parse(json).unwrap().areas(None).unwrap_err();
        assert!(matches!(err, TopologyError::ArcOutOfRange(7)));
    }

    #[test]
    fn layer_without_ids_fails() {
        let json = r#"{
            "type": "Topology",
            "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]],
            "objects": { "k": { "type": "GeometryCollection", "geometries": [
                { "type": "Polygon", "arcs": [[0]], "properties": { "label": "x" } }
            ] } }
        }"#;
        let err = Topology::parse(json).unwrap().areas(None).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::MissingProperty { field: "id", .. }
        ));
    }

    #[test]
    fn non_collection_layer_is_rejected() {
        let json = r#"{ "type": "Topology", "arcs": [],
                        "objects": { "k": { "type": "Polygon", "arcs": [] } } }"#;
        let err = Topology::parse(json).unwrap().areas(None).unwrap_err();
        assert!(matches!(err, TopologyError::NotACollection(name) if name == "k"));
    }

    #[test]
    fn blank_property_falls_through_to_next_key() {
        let properties: Map<String, Value> =
            serde_json::from_str(r#"{ "kommunenummer": "  ", "id": 5, "KOMMUNENR": "9" }"#).unwrap();
        assert_eq!(property(Some(&properties), ID_KEYS), Some("5".to_string()));

        let properties: Map<String, Value> =
            serde_json::from_str(r#"{ "navn": null, "kommune": ["x"], "name": "Fem" }"#).unwrap();
        assert_eq!(property(Some(&properties), NAME_KEYS), Some("Fem".to_string()));
    }

    #[test]
    fn geometries_sharing_an_id_become_one_area() {
        let json = r#"{
            "type": "Topology",
            "arcs": [
                [[10, 60], [11, 60], [11, 61], [10, 60]],
                [[12, 60], [13, 60], [13, 61], [12, 60]],
                [[14, 60], [15, 60], [15, 61], [14, 60]]
            ],
            "objects": { "k": { "type": "GeometryCollection", "geometries": [
                { "type": "Polygon", "arcs": [[0]],
                  "properties": { "kommunenummer": "1", "navn": "Øy" } },
                { "type": "Polygon", "arcs": [[1]],
                  "properties": { "kommunenummer": "2", "navn": "Fastland" } },
                { "type": "MultiPolygon", "arcs": [[[2]]],
                  "properties": { "kommunenummer": "1", "navn": "Øy" } }
            ] } }
        }"#;
        let areas = Topology::parse(json).unwrap().areas(None).unwrap();
        let ids: Vec<&str> = areas.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);

        let Boundary::MultiPolygon(polygons) = &areas[0].boundary else {
            panic!("expected merged multipolygon");
        };
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0][0][0], [10.0, 60.0]);
        assert_eq!(polygons[1][0][0], [14.0, 60.0]);
    }

    #[test]
    fn areas_without_a_valid_position_are_skipped() {
        let json = r#"{
            "type": "Topology",
            "arcs": [
                [[10, 60], [11, 60], [11, 61], [10, 60]],
                [[10, 95], [11, 95], [11, 96], [10, 95]]
            ],
            "objects": { "k": { "type": "GeometryCollection", "geometries": [
                { "type": "Polygon", "arcs": [[0]],
                  "properties": { "id": "1", "name": "Synlig" } },
                { "type": "Polygon", "arcs": [[1]],
                  "properties": { "id": "2", "name": "Utenfor" } },
                { "type": "Polygon", "arcs": [],
                  "properties": { "id": "3", "name": "Tom" } }
            ] } }
        }"#;
        let areas = Topology::parse(json).unwrap().areas(None).unwrap();
        let ids: Vec<&str> = areas.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn dataset_bundles_areas_and_borders() {
        let dataset = topology().dataset(Some("kommuner")).unwrap();
        assert_eq!(dataset.areas.len(), 3);
        assert_eq!(dataset.borders.len(), 1);
    }
}
