use crate::touch::Point;

/// Touchpad coordinate range, grown as contacts report larger values.
pub struct Dimensions {
    pub touchpad_max_extent_x: f32,
    pub touchpad_max_extent_y: f32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            touchpad_max_extent_x: 1345.0,
            touchpad_max_extent_y: 865.0,
        }
    }
}

impl Dimensions {
    pub fn maybe_grow_touchpad_extent(&mut self, x: f32, y: f32) {
        if self.touchpad_max_extent_x < x {
            self.touchpad_max_extent_x = x;
        }
        if self.touchpad_max_extent_y < y {
            self.touchpad_max_extent_y = y;
        }
    }

    /// Map raw device coordinates into [0, 1].
    pub fn normalize(&mut self, x: i32, y: i32) -> Point {
        let (x, y) = (x.max(0) as f32, y.max(0) as f32);
        self.maybe_grow_touchpad_extent(x, y);
        Point::new(
            (x / self.touchpad_max_extent_x) as f64,
            (y / self.touchpad_max_extent_y) as f64,
        )
    }
}
