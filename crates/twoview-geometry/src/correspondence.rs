use serde::{Deserialize, Serialize};

/// A pair of matching 2d points, one in each image.
///
/// `(x1, y1)` lives in image 1 and `(x2, y2)` in image 2, both in pixel coordinates.
///
/// # Example
///
/// ```
/// use twoview_geometry::Correspondence;
///
/// let c = Correspondence::new(1.0, 2.0, 11.0, 7.0);
/// assert_eq!(c.p1(), [1.0, 2.0]);
/// assert_eq!(c.p2(), [11.0, 7.0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// x coordinate in image 1.
    pub x1: f64,
    /// y coordinate in image 1.
    pub y1: f64,
    /// x coordinate in image 2.
    pub x2: f64,
    /// y coordinate in image 2.
    pub y2: f64,
}

impl Correspondence {
    /// Create a new correspondence from its four coordinates.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a correspondence from two points.
    pub fn from_points(p1: [f64; 2], p2: [f64; 2]) -> Self {
        Self::new(p1[0], p1[1], p2[0], p2[1])
    }

    /// The point in image 1.
    pub fn p1(&self) -> [f64; 2] {
        [self.x1, self.y1]
    }

    /// The point in image 2.
    pub fn p2(&self) -> [f64; 2] {
        [self.x2, self.y2]
    }

    /// The point in image 1 in homogeneous coordinates.
    pub fn h1(&self) -> [f64; 3] {
        [self.x1, self.y1, 1.0]
    }

    /// The point in image 2 in homogeneous coordinates.
    pub fn h2(&self) -> [f64; 3] {
        [self.x2, self.y2, 1.0]
    }
}

impl From<([f64; 2], [f64; 2])> for Correspondence {
    fn from((p1, p2): ([f64; 2], [f64; 2])) -> Self {
        Self::from_points(p1, p2)
    }
}

/// Copy the correspondences at `indices` into a new vector, keeping the order of `indices`.
pub fn select(correspondences: &[Correspondence], indices: &[usize]) -> Vec<Correspondence> {
    indices
        .iter()
        .filter_map(|&i| correspondences.get(i).copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correspondence_accessors() {
        let c = Correspondence::from(([1.0, 2.0], [3.0, 4.0]));
        assert_eq!(c, Correspondence::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(c.h1(), [1.0, 2.0, 1.0]);
        assert_eq!(c.h2(), [3.0, 4.0, 1.0]);
    }

    #[test]
    fn test_select_keeps_index_order() {
        let all = vec![
            Correspondence::new(0.0, 0.0, 0.0, 0.0),
            Correspondence::new(1.0, 1.0, 1.0, 1.0),
            Correspondence::new(2.0, 2.0, 2.0, 2.0),
        ];
        let picked = select(&all, &[2, 0, 7]);
        assert_eq!(picked, vec![all[2], all[0]]);
    }

    #[test]
    fn test_correspondence_serde() -> Result<(), Box<dyn std::error::Error>> {
        let c = Correspondence::new(1.5, 2.0, 3.0, 4.25);
        let json = serde_json::to_string(&c)?;
        assert_eq!(json, r#"{"x1":1.5,"y1":2.0,"x2":3.0,"y2":4.25}"#);
        Ok(())
    }
}
