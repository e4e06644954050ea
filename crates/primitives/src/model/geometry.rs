use serde::{Deserialize, Serialize};

/// A point in diagram coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
	pub width: f64,
	pub height: f64,
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Bounds {
	pub const EMPTY: Self = Self {
		x: 0.0,
		y: 0.0,
		width: -1.0,
		height: -1.0,
	};

	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self { x, y, width, height }
	}

	/// Normalized rectangle spanning two corner points.
	pub fn from_corners(a: Point, b: Point) -> Self {
		Self {
			x: a.x.min(b.x),
			y: a.y.min(b.y),
			width: (a.x - b.x).abs(),
			height: (a.y - b.y).abs(),
		}
	}

	/// Returns false for the negative-size sentinel used before layout.
	pub fn is_valid(&self) -> bool {
		self.width >= 0.0 && self.height >= 0.0
	}

	pub fn dimension(&self) -> Dimension {
		Dimension {
			width: self.width,
			height: self.height,
		}
	}
}
