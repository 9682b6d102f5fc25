use emath::{Pos2, Rect};
use kurbo::PathEl;
use log::debug;
use serde::{Deserialize, Serialize};
use tiny_skia::{Color, IntRect, Path, PathSegment, Pixmap};

use crate::{Brush, Selection, StrokeSurface, Symmetry, SymmetryBrush};

pub const MIN_BRUSH_RADIUS: u32 = 1;
pub const MAX_BRUSH_RADIUS: u32 = 100;
pub const DEFAULT_BRUSH_RADIUS: u32 = 10;

/// Curved path segments are flattened to lines with this maximum deviation,
/// in device units.
const FLATTEN_TOLERANCE: f64 = 1.0;

/// Pre-stroke pixels of the affected rectangle, keyed by its position on
/// the canvas, for restoring the stroke on undo.
pub struct UndoSnapshot {
    pub left: u32,
    pub top: u32,
    pub pixels: Pixmap,
}

/// The image/layer being painted on, as seen by the brush tool.
///
/// The canvas is handed out exclusively for the duration of one stroke and
/// returned on every exit path, including aborted traces.
pub trait StrokeTarget {
    fn take_canvas(&mut self) -> Pixmap;
    fn put_canvas(&mut self, canvas: Pixmap);
    fn selection(&self) -> Option<&Selection>;
    fn save_undo_snapshot(&mut self, snapshot: UndoSnapshot);
    /// A stroke changed the pixels inside `affected`: refresh cached
    /// previews and recompute anything derived from the pixels, like the
    /// histogram.
    fn stroke_committed(&mut self, affected: Rect);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    #[error("unexpected curve segment survived flattening")]
    UnexpectedSegment,
}

/// Persisted brush configuration.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(default)]
pub struct BrushSettings {
    pub radius: i32,
    pub symmetry: Symmetry,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_BRUSH_RADIUS as i32,
            symmetry: Symmetry::None,
        }
    }
}

struct StrokeSession {
    surface: StrokeSurface,
    /// Canvas as it was before the first dab, for the undo snapshot.
    original: Pixmap,
}

/// Freehand brush tool: translates pointer events (and traced paths) into
/// per-point brush draw calls against a per-stroke surface.
///
/// Coordinates are expected in image space; the caller converts from device
/// coordinates beforehand.
pub struct BrushTool {
    brush: SymmetryBrush,
    /// Raw slider value; clamped on every read.
    radius: i32,
    color: Color,
    respect_selection: bool,
    first_click: bool,
    stroke: Option<StrokeSession>,
}

impl BrushTool {
    pub fn new() -> Self {
        Self::with_brush(SymmetryBrush::new(DEFAULT_BRUSH_RADIUS, Symmetry::None))
    }

    pub fn with_brush(brush: SymmetryBrush) -> Self {
        Self {
            brush,
            radius: DEFAULT_BRUSH_RADIUS as i32,
            color: Color::BLACK,
            respect_selection: true,
            first_click: true,
            stroke: None,
        }
    }

    pub fn from_settings(settings: &BrushSettings) -> Self {
        let mut tool = Self::with_brush(SymmetryBrush::new(DEFAULT_BRUSH_RADIUS, settings.symmetry));
        tool.set_radius(settings.radius);
        tool
    }

    pub fn settings(&self) -> BrushSettings {
        BrushSettings {
            radius: self.radius.max(MIN_BRUSH_RADIUS as i32),
            symmetry: self.brush.symmetry(),
        }
    }

    /// Current radius, clamped to the minimum and written back. A platform
    /// slider defect can drive the stored value negative.
    pub fn radius(&mut self) -> u32 {
        if self.radius < MIN_BRUSH_RADIUS as i32 {
            self.radius = MIN_BRUSH_RADIUS as i32;
        }
        self.radius as u32
    }

    pub fn set_radius(&mut self, radius: i32) {
        self.radius = radius.min(MAX_BRUSH_RADIUS as i32);
        let clamped = self.radius();
        self.brush.set_radius(clamped);
    }

    pub fn set_symmetry(&mut self, symmetry: Symmetry) {
        self.brush.set_symmetry(symmetry);
    }

    /// Color applied at the next stroke start.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Called on tool activation and whenever the active image changes.
    pub fn reset_state(&mut self) {
        self.first_click = true;
        self.respect_selection = true;
    }

    /// Pointer pressed. `connect_modifier` asks for a straight line from
    /// the previous stroke's end point; it is ignored on the first click
    /// since activation, because there is no previous point yet.
    pub fn pointer_down(&mut self, target: &mut dyn StrokeTarget, pos: Pos2, connect_modifier: bool) {
        let with_line = connect_modifier && !self.first_click;
        self.first_click = false;

        if with_line {
            self.brush.affected_area_mut().update(pos);
        } else {
            self.brush.affected_area_mut().init(pos);
        }
        self.new_stroke_point(target, pos, with_line);
    }

    /// Pointer moved with the button held. `pos` is already zoom-corrected
    /// image space.
    pub fn pointer_move(&mut self, target: &mut dyn StrokeTarget, pos: Pos2) {
        self.new_stroke_point(target, pos, false);
    }

    /// Pointer released: snapshot the affected region for undo, release the
    /// surface and notify the target. A release without an active surface
    /// (the press was consumed by another tool mode) is a no-op.
    pub fn pointer_up(&mut self, target: &mut dyn StrokeTarget) {
        let Some(session) = self.stroke.take() else {
            return;
        };
        self.finish_stroke(target, session);
    }

    /// Programmatic two-point stroke.
    pub fn draw_line(&mut self, target: &mut dyn StrokeTarget, start: Pos2, end: Pos2) {
        self.pointer_down(target, start, false);
        self.pointer_move(target, end);
        self.pointer_up(target);
    }

    /// Replays `shape` through the stroke state machine, flattening curved
    /// segments first. Selection clipping is suppressed while tracing, so
    /// the selection boundary itself can be stroked, and the tool state is
    /// restored afterwards whether or not the trace succeeded.
    pub fn trace(&mut self, target: &mut dyn StrokeTarget, shape: &Path) -> Result<(), TraceError> {
        self.respect_selection = false;
        let result = self.trace_with_clipping_suppressed(target, shape);
        self.reset_state();
        result
    }

    fn trace_with_clipping_suppressed(
        &mut self,
        target: &mut dyn StrokeTarget,
        shape: &Path,
    ) -> Result<(), TraceError> {
        let mut elements = Vec::new();
        kurbo::flatten(path_elements(shape), FLATTEN_TOLERANCE, |el| {
            elements.push(el)
        });

        if self.stroke.is_none() {
            let session = self.begin_session(target);
            self.stroke = Some(session);
        }

        let result = self.replay(&elements);
        match (self.stroke.take(), result) {
            (Some(session), Ok(())) => {
                self.finish_stroke(target, session);
                Ok(())
            }
            (Some(session), Err(e)) => {
                // the trace is aborted, but the surface still has to go back
                target.put_canvas(session.surface.into_pixmap());
                Err(e)
            }
            (None, result) => result,
        }
    }

    fn replay(&mut self, elements: &[PathEl]) -> Result<(), TraceError> {
        let Some(session) = self.stroke.as_mut() else {
            return Ok(());
        };

        let mut sub_start = Pos2::ZERO;
        for element in elements {
            match element {
                PathEl::MoveTo(p) => {
                    let p = to_pos(*p);
                    sub_start = p;
                    self.brush.affected_area_mut().update(p);
                    self.brush.stroke_start(&mut session.surface, p);
                }
                PathEl::LineTo(p) => {
                    let p = to_pos(*p);
                    self.brush.affected_area_mut().update(p);
                    self.brush.stroke_point(&mut session.surface, p);
                }
                PathEl::ClosePath => {
                    self.brush.stroke_point(&mut session.surface, sub_start);
                }
                PathEl::QuadTo(..) | PathEl::CurveTo(..) => {
                    return Err(TraceError::UnexpectedSegment)
                }
            }
        }
        Ok(())
    }

    fn new_stroke_point(&mut self, target: &mut dyn StrokeTarget, pos: Pos2, with_line: bool) {
        let fresh = self.stroke.is_none();
        if fresh {
            let session = self.begin_session(target);
            self.stroke = Some(session);
        }
        let Some(session) = self.stroke.as_mut() else {
            return;
        };
        if fresh && !with_line {
            self.brush.stroke_start(&mut session.surface, pos);
        } else {
            self.brush.stroke_point(&mut session.surface, pos);
        }
    }

    fn begin_session(&mut self, target: &mut dyn StrokeTarget) -> StrokeSession {
        let canvas = target.take_canvas();
        let clip = if self.respect_selection {
            target
                .selection()
                .and_then(|s| s.clip_mask(canvas.width(), canvas.height()))
        } else {
            None
        };
        let original = canvas.clone();
        let mut surface = StrokeSurface::new(canvas, clip);
        surface.set_color(self.color);
        StrokeSession { surface, original }
    }

    fn finish_stroke(&mut self, target: &mut dyn StrokeTarget, session: StrokeSession) {
        let radius = self.radius();
        let affected = self.brush.affected_area().bounds(radius);

        if let Some(affected) = affected {
            if let Some(snapshot) = snapshot_region(&session.original, affected) {
                target.save_undo_snapshot(snapshot);
            }
            target.put_canvas(session.surface.into_pixmap());
            debug!("stroke affected {affected:?}");
            target.stroke_committed(affected);
        } else {
            target.put_canvas(session.surface.into_pixmap());
        }
    }
}

impl Default for BrushTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Crops the part of `affected` that lies on the canvas out of the
/// pre-stroke pixels. `None` when the rectangle misses the canvas entirely.
fn snapshot_region(original: &Pixmap, affected: Rect) -> Option<UndoSnapshot> {
    let left = affected.min.x.floor().max(0.0) as u32;
    let top = affected.min.y.floor().max(0.0) as u32;
    let right = affected.max.x.ceil().clamp(0.0, original.width() as f32) as u32;
    let bottom = affected.max.y.ceil().clamp(0.0, original.height() as f32) as u32;
    if right <= left || bottom <= top {
        return None;
    }

    let rect = IntRect::from_xywh(left as i32, top as i32, right - left, bottom - top)?;
    let pixels = original.clone_rect(rect)?;
    Some(UndoSnapshot { left, top, pixels })
}

fn path_elements(path: &Path) -> impl Iterator<Item = PathEl> + '_ {
    path.segments().map(|segment| match segment {
        PathSegment::MoveTo(p) => PathEl::MoveTo(to_kurbo(p)),
        PathSegment::LineTo(p) => PathEl::LineTo(to_kurbo(p)),
        PathSegment::QuadTo(p1, p2) => PathEl::QuadTo(to_kurbo(p1), to_kurbo(p2)),
        PathSegment::CubicTo(p1, p2, p3) => {
            PathEl::CurveTo(to_kurbo(p1), to_kurbo(p2), to_kurbo(p3))
        }
        PathSegment::Close => PathEl::ClosePath,
    })
}

fn to_kurbo(p: tiny_skia::Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

fn to_pos(p: kurbo::Point) -> Pos2 {
    emath::pos2(p.x as f32, p.y as f32)
}
