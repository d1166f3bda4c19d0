//! Geometric primitives for node placement.
//!
//! Positions are three dimensional. Layout algorithms only move nodes in the
//! `x`/`y` plane and carry `z` through untouched.
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     ▼
//!    +Y
//! ```

/// A position in graph coordinate space.
///
/// # Examples
///
/// ```
/// # use trellis_core::geometry::Position;
/// let p1 = Position::new(10.0, 20.0, 0.0);
/// let p2 = Position::planar(5.0, 5.0);
///
/// let sum = p1.add_position(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    x: f64,
    y: f64,
    z: f64,
}

impl Position {
    /// The origin, where nodes without coordinates are placed.
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Creates a new position with the specified coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a position on the `z = 0` plane.
    pub fn planar(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0)
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn z(self) -> f64 {
        self.z
    }

    /// Returns a copy with the specified x-coordinate.
    pub fn with_x(mut self, x: f64) -> Self {
        self.x = x;
        self
    }

    /// Returns a copy with the specified y-coordinate.
    pub fn with_y(mut self, y: f64) -> Self {
        self.y = y;
        self
    }

    /// Returns a copy with the specified z-coordinate.
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }

    /// Component-wise sum of two positions.
    pub fn add_position(self, other: Position) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    /// Component-wise difference of two positions.
    pub fn sub_position(self, other: Position) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    /// Multiplies every coordinate by `factor`.
    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    /// Length of the planar component, ignoring `z`.
    pub fn hypot(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Planar distance to `other`, ignoring `z`.
    pub fn distance_2d(self, other: Position) -> f64 {
        self.sub_position(other).hypot()
    }

    /// Returns `true` if every coordinate is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Returns `true` if both positions agree within `epsilon` on every axis.
    pub fn approx_eq(self, other: Position, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }

    /// Arithmetic mean of a set of positions, or `None` when the set is empty.
    ///
    /// ```
    /// # use trellis_core::geometry::Position;
    /// let centroid = Position::centroid([
    ///     Position::planar(0.0, 0.0),
    ///     Position::planar(10.0, 0.0),
    ///     Position::planar(5.0, 30.0),
    /// ]);
    /// assert_eq!(centroid, Some(Position::planar(5.0, 10.0)));
    /// assert_eq!(Position::centroid([]), None);
    /// ```
    pub fn centroid<I>(positions: I) -> Option<Position>
    where
        I: IntoIterator<Item = Position>,
    {
        let (sum, count) = positions
            .into_iter()
            .fold((Position::ORIGIN, 0usize), |(sum, count), p| {
                (sum.add_position(p), count + 1)
            });
        (count > 0).then(|| sum.scale(1.0 / count as f64))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_new_and_getters() {
        let p = Position::new(1.0, 2.0, 3.0);
        assert_eq!(p.x(), 1.0);
        assert_eq!(p.y(), 2.0);
        assert_eq!(p.z(), 3.0);
        assert_eq!(Position::planar(4.0, 5.0).z(), 0.0);
    }

    #[test]
    fn test_with_setters() {
        let p = Position::ORIGIN.with_x(1.0).with_y(2.0).with_z(3.0);
        assert_eq!(p, Position::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_add_sub() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::new(0.5, -2.0, 1.0);
        assert_eq!(a.add_position(b), Position::new(1.5, 0.0, 4.0));
        assert_eq!(a.sub_position(b), Position::new(0.5, 4.0, 2.0));
    }

    #[test]
    fn test_distance_ignores_z() {
        let a = Position::new(0.0, 0.0, 100.0);
        let b = Position::new(3.0, 4.0, -50.0);
        assert_approx_eq!(f64, a.distance_2d(b), 5.0);
    }

    #[test]
    fn test_is_finite() {
        assert!(Position::planar(1.0, 2.0).is_finite());
        assert!(!Position::planar(f64::NAN, 2.0).is_finite());
        assert!(!Position::new(0.0, 0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_centroid_single() {
        let p = Position::new(7.0, -3.0, 2.0);
        assert_eq!(Position::centroid([p]), Some(p));
    }

    #[test]
    fn test_centroid_averages_z() {
        let c = Position::centroid([Position::new(0.0, 0.0, 0.0), Position::new(0.0, 0.0, 10.0)])
            .unwrap();
        assert_approx_eq!(f64, c.z(), 5.0);
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn position_strategy() -> impl Strategy<Value = Position> {
        (-1000.0f64..1000.0, -1000.0f64..1000.0, -100.0f64..100.0)
            .prop_map(|(x, y, z)| Position::new(x, y, z))
    }

    fn check_add_sub_inverse(p1: Position, p2: Position) -> Result<(), TestCaseError> {
        let result = p1.add_position(p2).sub_position(p2);

        prop_assert!(approx_eq!(f64, result.x(), p1.x(), epsilon = 1e-9));
        prop_assert!(approx_eq!(f64, result.y(), p1.y(), epsilon = 1e-9));
        prop_assert!(approx_eq!(f64, result.z(), p1.z(), epsilon = 1e-9));
        Ok(())
    }

    fn check_centroid_within_bounds(points: Vec<Position>) -> Result<(), TestCaseError> {
        let centroid = Position::centroid(points.iter().copied()).unwrap();
        let min_x = points.iter().map(|p| p.x()).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x()).fold(f64::NEG_INFINITY, f64::max);
        let min_y = points.iter().map(|p| p.y()).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.y()).fold(f64::NEG_INFINITY, f64::max);

        prop_assert!(centroid.x() >= min_x - 1e-9 && centroid.x() <= max_x + 1e-9);
        prop_assert!(centroid.y() >= min_y - 1e-9 && centroid.y() <= max_y + 1e-9);
        Ok(())
    }

    proptest! {
        #[test]
        fn add_sub_inverse(p1 in position_strategy(), p2 in position_strategy()) {
            check_add_sub_inverse(p1, p2)?;
        }

        #[test]
        fn centroid_within_bounds(points in prop::collection::vec(position_strategy(), 1..20)) {
            check_centroid_within_bounds(points)?;
        }
    }
}
