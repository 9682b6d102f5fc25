use emath::{Pos2, Rect};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

mod ideal;
mod symmetry;

pub use ideal::*;
pub use symmetry::*;

/// Generic per-point draw interface implemented by brush variants.
///
/// The surface belongs to the stroke session and is passed into every draw
/// call, so a brush never outlives the pixels it paints on.
pub trait Brush {
    fn set_radius(&mut self, radius: u32);
    /// First point of a (sub-)stroke.
    fn stroke_start(&mut self, surface: &mut StrokeSurface, point: Pos2);
    /// Every subsequent point.
    fn stroke_point(&mut self, surface: &mut StrokeSurface, point: Pos2);
}

/// Drawing surface bound to one brush stroke: the canvas pixels taken from
/// the target, plus the selection clip applied at stroke start.
pub struct StrokeSurface {
    pixmap: Pixmap,
    clip: Option<Mask>,
    color: Color,
}

impl StrokeSurface {
    pub fn new(pixmap: Pixmap, clip: Option<Mask>) -> Self {
        Self {
            pixmap,
            clip,
            color: Color::BLACK,
        }
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Anti-aliased dab: a filled circle centered at `center`.
    pub fn fill_circle(&mut self, center: Pos2, radius: f32) {
        let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) else {
            return;
        };
        let paint = self.paint();
        self.pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            self.clip.as_ref(),
        );
    }

    /// Round-capped line segment of the given stroke width.
    pub fn stroke_segment(&mut self, from: Pos2, to: Pos2, width: f32) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        let Some(path) = pb.finish() else {
            return;
        };
        let paint = self.paint();
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint,
            &stroke,
            Transform::identity(),
            self.clip.as_ref(),
        );
    }

    /// Releases the surface, handing the pixels back.
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(self.color);
        paint.anti_alias = true;
        paint
    }
}

/// Bounding region touched during a stroke, accumulated per input point and
/// used afterwards to snapshot the pre-stroke pixels for undo.
#[derive(Debug, Default, Clone, Copy)]
pub struct AffectedArea {
    bounds: Option<Rect>,
}

impl AffectedArea {
    /// Re-anchors the area at a single point.
    pub fn init(&mut self, point: Pos2) {
        self.bounds = Some(Rect::from_min_max(point, point));
    }

    /// Grows the area to include `point`, anchoring there if it was empty.
    pub fn update(&mut self, point: Pos2) {
        match &mut self.bounds {
            Some(bounds) => bounds.extend_with(point),
            None => self.init(point),
        }
    }

    /// Rectangle affected by a brush of `radius` painting at the
    /// accumulated points, or `None` if no point was recorded yet.
    pub fn bounds(&self, radius: u32) -> Option<Rect> {
        self.bounds.map(|b| b.expand(radius as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emath::pos2;

    #[test]
    fn empty_area_has_no_bounds() {
        assert!(AffectedArea::default().bounds(5).is_none());
    }

    #[test]
    fn single_point_extends_one_radius_in_every_direction() {
        let mut area = AffectedArea::default();
        area.update(pos2(20.0, 30.0));

        let bounds = area.bounds(5).unwrap();
        assert_eq!(bounds.center(), pos2(20.0, 30.0));
        assert_eq!(bounds.width(), 10.0);
        assert_eq!(bounds.height(), 10.0);
    }

    #[test]
    fn init_discards_earlier_points() {
        let mut area = AffectedArea::default();
        area.update(pos2(0.0, 0.0));
        area.init(pos2(50.0, 50.0));
        area.update(pos2(60.0, 50.0));

        let bounds = area.bounds(1).unwrap();
        assert_eq!(bounds.min, pos2(49.0, 49.0));
        assert_eq!(bounds.max, pos2(61.0, 51.0));
    }

    #[test]
    fn clip_restricts_dabs_to_the_mask() {
        let selection = crate::Selection::new(tiny_skia::PathBuilder::from_rect(
            tiny_skia::Rect::from_xywh(0.0, 0.0, 10.0, 20.0).unwrap(),
        ));
        let clip = selection.clip_mask(20, 20);
        let mut surface = StrokeSurface::new(Pixmap::new(20, 20).unwrap(), clip);

        surface.fill_circle(pos2(5.0, 10.0), 3.0);
        surface.fill_circle(pos2(15.0, 10.0), 3.0);

        let pixmap = surface.into_pixmap();
        assert!(pixmap.pixel(5, 10).unwrap().alpha() > 0);
        assert_eq!(pixmap.pixel(15, 10).unwrap().alpha(), 0);
    }
}
