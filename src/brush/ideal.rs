use emath::Pos2;

use crate::{Brush, StrokeSurface};

/// Paints with vector-based "perfect" circles: a filled circle of the
/// configured radius at the stroke start, round-capped segments of width
/// 2*radius between points. Used when anti-aliased, resolution-independent
/// dabs are required.
pub struct IdealBrush {
    radius: u32,
    last: Option<Pos2>,
}

impl IdealBrush {
    pub fn new(radius: u32) -> Self {
        Self { radius, last: None }
    }

    fn diameter(&self) -> f32 {
        self.radius as f32 * 2.0
    }
}

impl Brush for IdealBrush {
    fn set_radius(&mut self, radius: u32) {
        self.radius = radius;
    }

    fn stroke_start(&mut self, surface: &mut StrokeSurface, point: Pos2) {
        surface.fill_circle(point, self.radius as f32);
        self.last = Some(point);
    }

    fn stroke_point(&mut self, surface: &mut StrokeSurface, point: Pos2) {
        match self.last {
            Some(last) => surface.stroke_segment(last, point, self.diameter()),
            // connecting to a previous stroke that never happened
            None => surface.fill_circle(point, self.radius as f32),
        }
        self.last = Some(point);
    }
}
