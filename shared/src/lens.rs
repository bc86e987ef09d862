//! Magnifier overlay math.
//!
//! The lens draws the active paths a second time, scaled about the pointer
//! and clipped to a circle. The only state is the last pointer position in
//! map space.

use crate::projection::Point;

pub const LENS_RADIUS: f64 = 30.0;
pub const LENS_ZOOM: f64 = 3.0;

/// 2D affine matrix in SVG order: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(k: f64) -> Self {
        Self {
            a: k,
            d: k,
            ..Self::IDENTITY
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// `None` when the matrix is singular or not finite.
    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        };
        [inv.a, inv.b, inv.c, inv.d, inv.e, inv.f]
            .iter()
            .all(|v| v.is_finite())
            .then_some(inv)
    }

    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    /// Composition that applies `other` first, then `self`.
    pub fn then(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pointer: Option<Point>,
    radius: f64,
    zoom: f64,
}

impl Default for Lens {
    fn default() -> Self {
        Self::new(LENS_RADIUS, LENS_ZOOM)
    }
}

impl Lens {
    pub fn new(radius: f64, zoom: f64) -> Self {
        Self {
            pointer: None,
            radius,
            zoom,
        }
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn is_visible(&self) -> bool {
        self.pointer.is_some()
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Update from raw client coordinates and the surface's screen matrix.
    ///
    /// Returns `false` and keeps the previous position when the matrix
    /// cannot be inverted.
    pub fn move_to(&mut self, raw: Point, screen_ctm: &Affine) -> bool {
        let Some(inverse) = screen_ctm.invert() else {
            return false;
        };
        self.pointer = Some(inverse.apply(raw));
        true
    }

    pub fn set_pointer(&mut self, p: Point) {
        self.pointer = Some(p);
    }

    pub fn clear(&mut self) {
        self.pointer = None;
    }

    /// `translate(p) · scale(k) · translate(-p)`; the pointer stays fixed.
    pub fn transform(&self) -> Option<Affine> {
        let p = self.pointer?;
        Some(
            Affine::translate(p.x, p.y)
                .then(&Affine::scale(self.zoom))
                .then(&Affine::translate(-p.x, -p.y)),
        )
    }

    pub fn transform_attr(&self) -> Option<String> {
        let p = self.pointer?;
        Some(format!(
            "translate({x}, {y}) scale({k}) translate({nx}, {ny})",
            x = p.x,
            y = p.y,
            k = self.zoom,
            nx = -p.x,
            ny = -p.y,
        ))
    }

    pub fn clip(&self) -> Option<Circle> {
        self.pointer.map(|p| Circle {
            cx: p.x,
            cy: p.y,
            r: self.radius,
        })
    }

    pub fn contains(&self, q: Point) -> bool {
        self.pointer.is_some_and(|p| {
            let dx = q.x - p.x;
            let dy = q.y - p.y;
            dx * dx + dy * dy <= self.radius * self.radius
        })
    }

    /// Base-map point drawn at `q` inside the lens.
    pub fn base_point(&self, q: Point) -> Option<Point> {
        let p = self.pointer?;
        Some(Point {
            x: p.x + (q.x - p.x) / self.zoom,
            y: p.y + (q.y - p.y) / self.zoom,
        })
    }
}
