//! Integer index-space coordinates and bounding boxes

use std::ops::{Add, Sub};

use glam::{DVec3, IVec3};

/// Integer index-space coordinate
///
/// Ordered lexicographically by (x, y, z); ordered maps keyed by `Coord`
/// iterate in that order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    /// Origin coordinate (0, 0, 0)
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Create a new coordinate
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Same value on all three axes
    pub const fn splat(v: i32) -> Self {
        Self::new(v, v, v)
    }

    /// Round each axis down to a multiple of `dim` (power of two)
    #[inline]
    pub const fn align_down(self, dim: i32) -> Self {
        let mask = !(dim - 1);
        Self::new(self.x & mask, self.y & mask, self.z & mask)
    }

    /// Component-wise minimum
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Multiply every axis by `factor`
    pub const fn scale(self, factor: i32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn as_dvec3(self) -> DVec3 {
        DVec3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    pub const fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[i32; 3]> for Coord {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<IVec3> for Coord {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Inclusive index-space bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordBBox {
    pub min: Coord,
    pub max: Coord,
}

impl CoordBBox {
    pub const fn new(min: Coord, max: Coord) -> Self {
        Self { min, max }
    }

    /// Box covering the `dim`³ cube starting at `origin`
    pub const fn cube(origin: Coord, dim: i32) -> Self {
        Self::new(
            origin,
            Coord::new(origin.x + dim - 1, origin.y + dim - 1, origin.z + dim - 1),
        )
    }

    /// Smallest box containing both
    pub fn union(self, other: Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Grow to include `coord`
    pub fn expand(self, coord: Coord) -> Self {
        Self::new(self.min.min(coord), self.max.max(coord))
    }

    /// Number of voxels along each axis
    pub fn dim(&self) -> Coord {
        self.max - self.min + Coord::splat(1)
    }

    pub fn contains(&self, c: Coord) -> bool {
        (self.min.x..=self.max.x).contains(&c.x)
            && (self.min.y..=self.max.y).contains(&c.y)
            && (self.min.z..=self.max.z).contains(&c.z)
    }

    /// True if any axis has zero extent
    pub fn is_degenerate(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Iterate every coordinate in the box, x outermost, z innermost
    pub fn iter(&self) -> impl Iterator<Item = Coord> + use<> {
        let (min, max) = (self.min, self.max);
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| Coord::new(x, y, z)))
        })
    }
}
