//! Conformal projection from longitude/latitude into the shared 2D drawing
//! space. Scale and origin are derived once from the full dataset and reused
//! for every path and viewport so all layers line up.

use std::f64::consts::PI;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::area::{Area, BorderLine, Position};

/// Width of the drawing space. Height follows from the dataset's aspect ratio.
pub const MAP_WIDTH: f64 = 500.0;
/// Symmetric padding around the full dataset.
pub const MAP_PADDING: f64 = 10.0;
/// Padding added around a subset viewport.
pub const VIEWPORT_PADDING: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rectangle in the shared 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// `"x y width height"`, as consumed by an SVG `viewBox`.
    pub fn view_box(&self) -> String {
        let mut out = String::with_capacity(24);
        write_coord(&mut out, self.x);
        out.push(' ');
        write_coord(&mut out, self.y);
        out.push(' ');
        write_coord(&mut out, self.width);
        out.push(' ');
        write_coord(&mut out, self.height);
        out
    }
}

/// Running min/max over projected points.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    const EMPTY: Self = Self {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }
}

fn mercator_y(lat: f64) -> f64 {
    (PI / 4.0 + lat * PI / 360.0).tan().ln()
}

/// Raw (unscaled) transformed coordinates, or `None` for an unusable position.
fn raw(position: &Position) -> Option<(f64, f64)> {
    let [lon, lat] = *position;
    if !lon.is_finite() || !lat.is_finite() || lat.abs() >= 90.0 {
        return None;
    }
    let y = mercator_y(lat);
    y.is_finite().then(|| (lon * PI / 180.0, y))
}

/// Whether at least one position of the area can be projected.
pub fn is_drawable(area: &Area) -> bool {
    area.boundary.rings().flatten().any(|position| raw(position).is_some())
}

fn write_coord(out: &mut String, value: f64) {
    let rounded = (value * 1000.0).round() / 1000.0;
    // Avoid "-0" for values that round to zero.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let _ = write!(out, "{rounded}");
}

/// Fixed transform for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    min_x: f64,
    max_y: f64,
    scale: f64,
    height: f64,
    area_count: usize,
    full: Viewport,
}

impl Projection {
    /// Scan every coordinate of the full dataset once and fix scale and origin.
    pub fn new(areas: &[Area]) -> Self {
        let mut bounds = Bounds::EMPTY;
        for area in areas {
            for position in area.boundary.rings().flatten() {
                if let Some((x, y)) = raw(position) {
                    bounds.include(x, y);
                }
            }
        }

        if bounds.is_empty() {
            bounds = Bounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 0.0,
                max_y: 0.0,
            };
        }

        let raw_w = bounds.max_x - bounds.min_x;
        let raw_h = bounds.max_y - bounds.min_y;
        let usable_width = MAP_WIDTH - MAP_PADDING * 2.0;
        let scale = if raw_w > f64::EPSILON {
            usable_width / raw_w
        } else if raw_h > f64::EPSILON {
            usable_width / raw_h
        } else {
            1.0
        };
        let height = raw_h * scale + MAP_PADDING * 2.0;

        tracing::debug!(
            areas = areas.len(),
            scale,
            height,
            "projection fixed for dataset"
        );

        Self {
            min_x: bounds.min_x,
            max_y: bounds.max_y,
            scale,
            height,
            area_count: areas.len(),
            full: Viewport {
                x: 0.0,
                y: 0.0,
                width: MAP_WIDTH,
                height: height.ceil(),
            },
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Project one `[lon, lat]` position; `None` if it is not a valid point.
    pub fn project(&self, position: &Position) -> Option<Point> {
        let (x, y) = raw(position)?;
        Some(Point {
            x: (x - self.min_x) * self.scale + MAP_PADDING,
            y: (self.max_y - y) * self.scale + MAP_PADDING,
        })
    }

    /// Drawable path for an area, `None` when its boundary has no valid point.
    pub fn path_of(&self, area: &Area) -> Option<String> {
        let mut out = String::new();
        for ring in area.boundary.rings() {
            self.write_line(&mut out, ring, true);
        }
        if out.is_empty() {
            tracing::debug!(id = %area.id, "area has no drawable points");
            return None;
        }
        Some(out)
    }

    /// Open polylines (borders) as one path.
    pub fn lines_path(&self, lines: &[BorderLine]) -> Option<String> {
        let mut out = String::new();
        for line in lines {
            self.write_line(&mut out, line, false);
        }
        (!out.is_empty()).then_some(out)
    }

    fn write_line(&self, out: &mut String, positions: &[Position], close: bool) {
        let mut first = true;
        for point in positions.iter().filter_map(|p| self.project(p)) {
            out.push(if first { 'M' } else { 'L' });
            write_coord(out, point.x);
            out.push(',');
            write_coord(out, point.y);
            first = false;
        }
        if close && !first {
            out.push('Z');
        }
    }

    pub fn full_viewport(&self) -> Viewport {
        self.full
    }

    /// Padded bounding box of a subset, in the same space as the full map.
    ///
    /// A subset the size of the whole dataset is treated as the whole dataset.
    /// Empty subsets and subsets without valid points get the full viewport.
    pub fn viewport_of(&self, subset: &[Area]) -> Viewport {
        if subset.len() == self.area_count {
            return self.full;
        }

        let mut bounds = Bounds::EMPTY;
        for area in subset {
            for point in area.boundary.rings().flatten().filter_map(|p| self.project(p)) {
                bounds.include(point.x, point.y);
            }
        }
        if bounds.is_empty() {
            return self.full;
        }

        let x = (bounds.min_x - VIEWPORT_PADDING).max(0.0);
        let y = (bounds.min_y - VIEWPORT_PADDING).max(0.0);
        Viewport {
            x,
            y,
            width: bounds.max_x + VIEWPORT_PADDING - x,
            height: bounds.max_y + VIEWPORT_PADDING - y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::fixtures::{area, square};
    use crate::area::Boundary;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    fn dataset() -> Vec<Area> {
        vec![
            area("a", Some(("1", "One")), 5.0, 58.0),
            area("b", Some(("1", "One")), 8.0, 60.0),
            area("c", Some(("2", "Two")), 25.0, 70.0),
        ]
    }

    #[test]
    fn mercator_matches_reference_values() {
        assert_close(mercator_y(0.0), 0.0);
        assert_close(mercator_y(45.0), (PI / 4.0 + PI / 8.0).tan().ln());
        assert!(mercator_y(70.0) > mercator_y(60.0) * 1.2);
    }

    #[test]
    fn width_is_fixed_and_height_follows_aspect_ratio() {
        let areas = dataset();
        let projection = Projection::new(&areas);
        let full = projection.full_viewport();
        assert_eq!(full.x, 0.0);
        assert_eq!(full.y, 0.0);
        assert_eq!(full.width, MAP_WIDTH);

        let raw_w = (26.0 - 5.0) * PI / 180.0;
        let raw_h = mercator_y(71.0) - mercator_y(58.0);
        let scale = (MAP_WIDTH - 2.0 * MAP_PADDING) / raw_w;
        assert_close(projection.scale(), scale);
        assert_close(projection.height(), raw_h * scale + 2.0 * MAP_PADDING);
        assert_eq!(full.height, projection.height().ceil());
    }

    #[test]
    fn extreme_points_land_on_padding() {
        let projection = Projection::new(&dataset());
        let south_west = projection.project(&[5.0, 58.0]).unwrap();
        let north_east = projection.project(&[26.0, 71.0]).unwrap();
        assert_close(south_west.x, MAP_PADDING);
        assert_close(south_west.y, projection.height() - MAP_PADDING);
        assert_close(north_east.x, MAP_WIDTH - MAP_PADDING);
        assert_close(north_east.y, MAP_PADDING);
    }

    #[test]
    fn invalid_positions_are_not_projected() {
        let projection = Projection::new(&dataset());
        assert!(projection.project(&[f64::NAN, 60.0]).is_none());
        assert!(projection.project(&[10.0, 90.0]).is_none());
        assert!(projection.project(&[10.0, f64::INFINITY]).is_none());
    }

    #[test]
    fn path_closes_every_ring() {
        let areas = dataset();
        let projection = Projection::new(&areas);
        let d = projection.path_of(&areas[0]).unwrap();
        assert!(d.starts_with("M10,"));
        assert_eq!(d.matches('M').count(), 1);
        assert_eq!(d.matches('L').count(), 4);
        assert!(d.ends_with('Z'));
    }

    #[test]
    fn multipolygon_paths_have_one_subpath_per_ring() {
        let areas = dataset();
        let projection = Projection::new(&areas);
        let island = Area {
            boundary: Boundary::MultiPolygon(vec![
                vec![square(5.0, 58.0, 1.0)],
                vec![square(7.0, 59.0, 0.5)],
            ]),
            ..areas[0].clone()
        };
        let d = projection.path_of(&island).unwrap();
        assert_eq!(d.matches('M').count(), 2);
        assert_eq!(d.matches('Z').count(), 2);
    }

    #[test]
    fn path_is_deterministic() {
        let areas = dataset();
        let first = Projection::new(&areas).path_of(&areas[2]);
        let second = Projection::new(&areas).path_of(&areas[2]);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn area_without_valid_points_has_no_path() {
        let mut areas = dataset();
        areas.push(Area {
            boundary: Boundary::Polygon(vec![vec![[f64::NAN, f64::NAN]; 4]]),
            ..area("broken", None, 0.0, 0.0)
        });
        let projection = Projection::new(&areas);
        assert_eq!(projection.path_of(&areas[3]), None);

        let clean = Projection::new(&areas[..3]);
        assert_close(projection.scale(), clean.scale());
        assert_close(projection.height(), clean.height());
    }

    #[test]
    fn drawable_needs_one_valid_position() {
        let mut broken = area("broken", None, 0.0, 0.0);
        broken.boundary = Boundary::Polygon(vec![vec![[f64::NAN, f64::NAN]; 4]]);
        assert!(!is_drawable(&broken));

        broken.boundary = Boundary::Polygon(vec![vec![[f64::NAN, 1.0], [10.0, 60.0]]]);
        assert!(is_drawable(&broken));

        broken.boundary = Boundary::MultiPolygon(Vec::new());
        assert!(!is_drawable(&broken));
    }

    #[test]
    fn full_subset_returns_precomputed_viewport() {
        let areas = dataset();
        let projection = Projection::new(&areas);
        assert_eq!(projection.viewport_of(&areas), projection.full_viewport());
        assert_eq!(projection.viewport_of(&[]), projection.full_viewport());
    }

    #[test]
    fn subset_viewport_contains_every_projected_point() {
        let areas = dataset();
        let projection = Projection::new(&areas);
        for subset in [&areas[..1], &areas[1..], &areas[2..]] {
            let viewport = projection.viewport_of(subset);
            assert!(viewport.x >= 0.0 && viewport.y >= 0.0);
            for position in subset.iter().flat_map(|a| a.boundary.rings().flatten()) {
                let point = projection.project(position).unwrap();
                assert!(viewport.contains(point), "{point:?} outside {viewport:?}");
            }
        }
    }

    #[test]
    fn subset_viewport_is_padded_and_clamped() {
        let areas = dataset();
        let projection = Projection::new(&areas);
        let viewport = projection.viewport_of(&areas[2..]);
        let top_right = projection.project(&[26.0, 71.0]).unwrap();
        let bottom_left = projection.project(&[25.0, 70.0]).unwrap();

        assert_close(viewport.x, bottom_left.x - VIEWPORT_PADDING);
        // The top edge of "c" sits on the map padding, so the origin clamps to 0.
        assert_eq!(viewport.y, 0.0);
        assert_close(viewport.x + viewport.width, top_right.x + VIEWPORT_PADDING);
        assert_close(viewport.height, bottom_left.y + VIEWPORT_PADDING);
    }

    #[test]
    fn border_lines_are_left_open() {
        let areas = dataset();
        let projection = Projection::new(&areas);
        let d = projection
            .lines_path(&[vec![[8.0, 60.0], [9.0, 60.0]], vec![[5.0, 58.0], [5.0, 59.0]]])
            .unwrap();
        assert_eq!(d.matches('M').count(), 2);
        assert!(!d.contains('Z'));
        assert_eq!(projection.lines_path(&[]), None);
    }

    #[test]
    fn empty_dataset_does_not_divide_by_zero() {
        let projection = Projection::new(&[]);
        assert_eq!(projection.scale(), 1.0);
        assert_eq!(projection.full_viewport().height, 2.0 * MAP_PADDING);
    }

    #[test]
    fn view_box_trims_decimals() {
        let viewport = Viewport {
            x: 12.5,
            y: 0.0,
            width: 100.123456,
            height: 412.0,
        };
        assert_eq!(viewport.view_box(), "12.5 0 100.123 412");
    }
}
