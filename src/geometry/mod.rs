//! Geometric primitives for layout analysis.
//!
//! Rectangles use a top-left origin with Y growing downwards, matching the
//! coordinates delivered by the document-structure producer. A rectangle may
//! be expressed in page-normalized units (`[0, 1]`) or in absolute points;
//! nothing in this module cares which, as long as both operands agree.

use serde::{Deserialize, Serialize};

/// A 2D point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in page space.
///
/// Width and height may arrive negative from sloppy producers; every
/// measurement below works on the normalized edges, so such rectangles
/// behave like their mirrored positive counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the origin corner
    pub x: f32,
    /// Y coordinate of the origin corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragdown::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points.
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Left edge.
    pub fn min_x(&self) -> f32 {
        self.x.min(self.x + self.width)
    }

    /// Right edge.
    pub fn max_x(&self) -> f32 {
        self.x.max(self.x + self.width)
    }

    /// Top edge.
    pub fn min_y(&self) -> f32 {
        self.y.min(self.y + self.height)
    }

    /// Bottom edge.
    pub fn max_y(&self) -> f32 {
        self.y.max(self.y + self.height)
    }

    /// The same rectangle with non-negative width and height.
    pub fn normalized(&self) -> Rect {
        Rect::from_points(self.min_x(), self.min_y(), self.max_x(), self.max_y())
    }

    /// Get the center point of the rectangle.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragdown::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// let center = rect.center();
    /// assert_eq!(center.x, 50.0);
    /// assert_eq!(center.y, 25.0);
    /// ```
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Compute the area of the rectangle (always non-negative).
    ///
    /// # Examples
    ///
    /// ```
    /// use fragdown::geometry::Rect;
    ///
    /// assert_eq!(Rect::new(0.0, 0.0, 100.0, 50.0).area(), 5000.0);
    /// assert_eq!(Rect::new(0.0, 0.0, -100.0, 50.0).area(), 5000.0);
    /// ```
    pub fn area(&self) -> f32 {
        (self.width * self.height).abs()
    }

    /// Compute the perimeter of the rectangle (always non-negative).
    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width.abs() + self.height.abs())
    }

    /// Compute the union of this rectangle with another.
    ///
    /// Returns the smallest rectangle that contains both rectangles.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragdown::geometry::Rect;
    ///
    /// let r1 = Rect::new(100.0, 100.0, 100.0, 50.0);
    /// let r2 = Rect::new(220.0, 100.0, 100.0, 50.0);
    /// let union = r1.union(&r2);
    ///
    /// assert_eq!(union.min_x(), 100.0);
    /// assert_eq!(union.max_x(), 320.0);
    /// ```
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.min_x().min(other.min_x());
        let y0 = self.min_y().min(other.min_y());
        let x1 = self.max_x().max(other.max_x());
        let y1 = self.max_y().max(other.max_y());
        Rect::from_points(x0, y0, x1, y1)
    }

    /// Area of the intersection with `other`.
    ///
    /// Disjoint rectangles and rectangles that only share an edge or a
    /// corner yield `0.0`.
    pub fn overlap_area(&self, other: &Rect) -> f32 {
        let w = self.max_x().min(other.max_x()) - self.min_x().max(other.min_x());
        let h = self.max_y().min(other.max_y()) - self.min_y().max(other.min_y());
        if w <= 0.0 || h <= 0.0 {
            return 0.0;
        }
        w * h
    }

    /// Fraction of *this* rectangle's area covered by `other`.
    ///
    /// The measure is asymmetric: it is relative to the receiver, so a small
    /// box fully inside a large one reports `1.0` while the large box reports
    /// a small fraction. A zero-area receiver reports `0.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragdown::geometry::Rect;
    ///
    /// let a = Rect::new(100.0, 100.0, 100.0, 100.0);
    /// let b = Rect::new(150.0, 150.0, 100.0, 100.0);
    /// assert_eq!(a.overlap_percentage(&b), 0.25);
    /// ```
    pub fn overlap_percentage(&self, other: &Rect) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.overlap_area(other) / area
    }

    /// Whether `other` covers strictly more than `threshold` of this rectangle.
    pub fn overlaps(&self, other: &Rect, threshold: f32) -> bool {
        self.overlap_percentage(other) > threshold
    }

    /// Check if this rectangle intersects with another (positive-area overlap).
    pub fn intersects(&self, other: &Rect) -> bool {
        self.overlap_area(other) > 0.0
    }

    /// Check if this rectangle contains a point (edges inclusive).
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min_x() && p.x <= self.max_x() && p.y >= self.min_y() && p.y <= self.max_y()
    }

    /// Horizontal distance between the closest vertical edges, `0.0` when
    /// the X ranges overlap or touch.
    pub fn horizontal_gap(&self, other: &Rect) -> f32 {
        0.0_f32
            .max(self.min_x() - other.max_x())
            .max(other.min_x() - self.max_x())
    }

    /// Vertical distance between the closest horizontal edges, `0.0` when
    /// the Y ranges overlap or touch.
    pub fn vertical_gap(&self, other: &Rect) -> f32 {
        0.0_f32
            .max(self.min_y() - other.max_y())
            .max(other.min_y() - self.max_y())
    }

    /// Chebyshev distance between the two rectangles.
    ///
    /// Zero when they overlap or touch; otherwise the larger of the two
    /// directional gaps.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragdown::geometry::Rect;
    ///
    /// let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    /// let b = Rect::new(15.0, 30.0, 10.0, 10.0);
    /// assert_eq!(a.distance(&b), 20.0);
    /// ```
    pub fn distance(&self, other: &Rect) -> f32 {
        self.horizontal_gap(other).max(self.vertical_gap(other))
    }

    /// Whether this rectangle's center sits above `other`'s by more than `tolerance`.
    pub fn is_above(&self, other: &Rect, tolerance: f32) -> bool {
        self.center().y + tolerance < other.center().y
    }

    /// Whether this rectangle's center sits left of `other`'s by more than `tolerance`.
    pub fn is_left_of(&self, other: &Rect, tolerance: f32) -> bool {
        self.center().x + tolerance < other.center().x
    }

    /// Whether both centers lie on the same row (Y within `tolerance`).
    pub fn is_vertically_aligned(&self, other: &Rect, tolerance: f32) -> bool {
        (self.center().y - other.center().y).abs() <= tolerance
    }

    /// Whether both centers lie in the same column (X within `tolerance`).
    pub fn is_horizontally_aligned(&self, other: &Rect, tolerance: f32) -> bool {
        (self.center().x - other.center().x).abs() <= tolerance
    }

    /// Scale every coordinate, e.g. to move between normalized and absolute space.
    pub fn scaled(&self, sx: f32, sy: f32) -> Rect {
        Rect::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }
}
