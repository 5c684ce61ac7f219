//! Window and workspace sizing structs.
use serde::{Deserialize, Serialize};

/// A rectangle in root coordinates. x,y from top left.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Xyhw {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// The two directions a split can partition its rectangle in.
///
/// `Horizontal` arranges the children side by side; `Vertical` stacks them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Xyhw {
    #[must_use]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[must_use]
    pub const fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    #[must_use]
    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    /// Shrink by `amount` pixels on every side.
    #[must_use]
    pub fn shrink(&self, amount: i32) -> Self {
        Self {
            x: self.x + amount,
            y: self.y + amount,
            w: (self.w - 2 * amount).max(1),
            h: (self.h - 2 * amount).max(1),
        }
    }

    /// Split into two rectangles along the given axis at `ratio` of the
    /// relevant dimension.
    #[must_use]
    pub fn split(&self, axis: Axis, ratio: f32) -> (Self, Self) {
        match axis {
            Axis::Horizontal => {
                let first_w = (self.w as f32 * ratio).round() as i32;
                (
                    Self::new(self.x, self.y, first_w, self.h),
                    Self::new(self.x + first_w, self.y, self.w - first_w, self.h),
                )
            }
            Axis::Vertical => {
                let first_h = (self.h as f32 * ratio).round() as i32;
                (
                    Self::new(self.x, self.y, self.w, first_h),
                    Self::new(self.x, self.y + first_h, self.w, self.h - first_h),
                )
            }
        }
    }

    /// The axis a new split of this rectangle should use: partition the
    /// longer dimension.
    #[must_use]
    pub const fn longer_axis(&self) -> Axis {
        if self.w >= self.h {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }

    /// A rectangle of `w_frac`×`h_frac` of this one, centered inside it.
    #[must_use]
    pub fn centered_fraction(&self, w_frac: f32, h_frac: f32) -> Self {
        let w = (self.w as f32 * w_frac) as i32;
        let h = (self.h as f32 * h_frac) as i32;
        Self {
            x: self.x + (self.w - w) / 2,
            y: self.y + (self.h - h) / 2,
            w,
            h,
        }
    }

    /// Carve per-edge reservations (left, right, top, bottom) off this
    /// rectangle.
    #[must_use]
    pub fn without_struts(&self, left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            x: self.x + left,
            y: self.y + top,
            w: (self.w - left - right).max(1),
            h: (self.h - top - bottom).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_halves_cover_the_parent() {
        let r = Xyhw::new(0, 0, 990, 790);
        let (a, b) = r.split(Axis::Horizontal, 0.5);
        assert_eq!(a, Xyhw::new(0, 0, 495, 790));
        assert_eq!(b, Xyhw::new(495, 0, 495, 790));
        let (top, bottom) = r.split(Axis::Vertical, 0.5);
        assert_eq!(top.h + bottom.h, r.h);
        assert_eq!(top.w, r.w);
    }

    #[test]
    fn wide_rect_splits_side_by_side() {
        assert_eq!(Xyhw::new(0, 0, 800, 600).longer_axis(), Axis::Horizontal);
        assert_eq!(Xyhw::new(0, 0, 400, 600).longer_axis(), Axis::Vertical);
    }

    #[test]
    fn centered_fraction_is_centered() {
        let monitor = Xyhw::new(0, 0, 1200, 900);
        let pad = monitor.centered_fraction(0.8, 0.6);
        assert_eq!(pad, Xyhw::new(120, 180, 960, 540));
    }
}
