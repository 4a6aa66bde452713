//! 2D vector arithmetic used by the transform engine.

use std::ops::{Add, AddAssign, Div, Mul};

use serde::{Deserialize, Serialize};

/// A 2D vector or point in screen/document space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a vector from components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, scale: f32) -> Self {
        Self::new(self.x * scale, self.y * scale)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;

    /// Scale division. A zero divisor is a caller precondition
    /// violation (zoom must never be driven to 0).
    fn div(self, scale: f32) -> Self {
        Self::new(self.x / scale, self.y / scale)
    }
}
