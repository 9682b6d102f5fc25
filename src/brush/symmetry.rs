use emath::{pos2, Pos2};
use serde::{Deserialize, Serialize};

use crate::{AffectedArea, Brush, IdealBrush, StrokeSurface};

/// Mirroring of stroke input points across the canvas center axes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symmetry {
    #[default]
    None,
    /// Mirror across the vertical center line.
    Horizontal,
    /// Mirror across the horizontal center line.
    Vertical,
    /// Half-turn about the canvas center.
    Central,
}

impl Symmetry {
    pub fn mirrored(&self, point: Pos2, width: f32, height: f32) -> Option<Pos2> {
        match self {
            Symmetry::None => None,
            Symmetry::Horizontal => Some(pos2(width - point.x, point.y)),
            Symmetry::Vertical => Some(pos2(point.x, height - point.y)),
            Symmetry::Central => Some(pos2(width - point.x, height - point.y)),
        }
    }
}

/// Repeats each input point across the configured symmetry before
/// delegating to the per-point draw primitive, and records every delegated
/// point in the affected area.
///
/// The mirrored points go to a second brush instance so that both halves
/// keep their own current-point state.
pub struct SymmetryBrush {
    primary: Box<dyn Brush>,
    mirror: Box<dyn Brush>,
    symmetry: Symmetry,
    affected: AffectedArea,
}

impl SymmetryBrush {
    pub fn new(radius: u32, symmetry: Symmetry) -> Self {
        Self::with_brushes(
            Box::new(IdealBrush::new(radius)),
            Box::new(IdealBrush::new(radius)),
            symmetry,
        )
    }

    pub fn with_brushes(
        primary: Box<dyn Brush>,
        mirror: Box<dyn Brush>,
        symmetry: Symmetry,
    ) -> Self {
        Self {
            primary,
            mirror,
            symmetry,
            affected: AffectedArea::default(),
        }
    }

    pub fn symmetry(&self) -> Symmetry {
        self.symmetry
    }

    pub fn set_symmetry(&mut self, symmetry: Symmetry) {
        self.symmetry = symmetry;
    }

    pub fn affected_area(&self) -> &AffectedArea {
        &self.affected
    }

    pub fn affected_area_mut(&mut self) -> &mut AffectedArea {
        &mut self.affected
    }
}

impl Brush for SymmetryBrush {
    fn set_radius(&mut self, radius: u32) {
        self.primary.set_radius(radius);
        self.mirror.set_radius(radius);
    }

    fn stroke_start(&mut self, surface: &mut StrokeSurface, point: Pos2) {
        self.affected.update(point);
        self.primary.stroke_start(surface, point);

        let (w, h) = (surface.width() as f32, surface.height() as f32);
        if let Some(mirrored) = self.symmetry.mirrored(point, w, h) {
            self.affected.update(mirrored);
            self.mirror.stroke_start(surface, mirrored);
        }
    }

    fn stroke_point(&mut self, surface: &mut StrokeSurface, point: Pos2) {
        self.affected.update(point);
        self.primary.stroke_point(surface, point);

        let (w, h) = (surface.width() as f32, surface.height() as f32);
        if let Some(mirrored) = self.symmetry.mirrored(point, w, h) {
            self.affected.update(mirrored);
            self.mirror.stroke_point(surface, mirrored);
        }
    }
}
