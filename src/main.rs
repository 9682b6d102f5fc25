use std::error::Error;

use emath::pos2;
use log::info;
use paint_tools::{
    BrushTool, MaskAddMode, PixelLayer, Selection, StrokeTarget, Symmetry, UndoSnapshot,
};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

const WIDTH: u32 = 256;
const HEIGHT: u32 = 192;

/// Renders every mask mode and a couple of brush strokes to PNG files in
/// the working directory.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let layer = sample_layer(WIDTH, HEIGHT)?;
    let selection = sample_selection()?;

    for mode in MaskAddMode::ALL {
        let mask = mode.generate(&layer, WIDTH, HEIGHT, Some(&selection))?;
        let file = format!("mask_{}.png", mode.to_string().to_lowercase().replace(' ', "_"));
        mask.save(&file)?;
        info!("wrote {file}");
    }

    let mut target = DemoTarget::new(WIDTH, HEIGHT, sample_selection()?)?;
    let mut tool = BrushTool::new();
    tool.reset_state();

    tool.set_radius(6);
    tool.set_color(Color::from_rgba8(30, 60, 200, 255));
    tool.set_symmetry(Symmetry::Horizontal);
    tool.draw_line(&mut target, pos2(40.0, 40.0), pos2(120.0, 160.0));

    // stroke the selection boundary itself
    tool.set_symmetry(Symmetry::None);
    tool.set_radius(2);
    tool.set_color(Color::from_rgba8(200, 40, 40, 255));
    let outline = target
        .selection()
        .map(|s| s.shape().clone())
        .ok_or("demo selection missing")?;
    tool.trace(&mut target, &outline)?;

    target.canvas().save_png("stroke_demo.png")?;
    info!(
        "wrote stroke_demo.png ({} undo snapshots recorded)",
        target.undo_count()
    );
    Ok(())
}

fn sample_layer(width: u32, height: u32) -> Result<PixelLayer, Box<dyn Error>> {
    let mut image = Pixmap::new(width, height).ok_or("invalid demo layer size")?;

    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(220, 120, 30, 255));
    paint.anti_alias = true;
    let circle =
        PathBuilder::from_circle(width as f32 * 0.4, height as f32 * 0.5, height as f32 * 0.3)
            .ok_or("invalid demo circle")?;
    image.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);

    paint.set_color(Color::from_rgba8(30, 120, 220, 128));
    let rect = Rect::from_xywh(width as f32 * 0.5, height as f32 * 0.2, 80.0, 100.0)
        .ok_or("invalid demo rect")?;
    image.fill_rect(rect, &paint, Transform::identity(), None);

    Ok(PixelLayer::new(image, (0, 0)))
}

fn sample_selection() -> Result<Selection, Box<dyn Error>> {
    let oval = Rect::from_xywh(60.0, 40.0, 140.0, 110.0).ok_or("invalid selection rect")?;
    let shape = PathBuilder::from_oval(oval).ok_or("invalid selection oval")?;
    Ok(Selection::new(shape))
}

struct DemoTarget {
    canvas: Option<Pixmap>,
    selection: Option<Selection>,
    undo: Vec<UndoSnapshot>,
}

impl DemoTarget {
    fn new(width: u32, height: u32, selection: Selection) -> Result<Self, Box<dyn Error>> {
        let mut canvas = Pixmap::new(width, height).ok_or("invalid demo canvas size")?;
        canvas.fill(Color::WHITE);
        Ok(Self {
            canvas: Some(canvas),
            selection: Some(selection),
            undo: Vec::new(),
        })
    }

    fn canvas(&self) -> &Pixmap {
        self.canvas
            .as_ref()
            .expect("canvas is only taken for the duration of a stroke")
    }

    fn undo_count(&self) -> usize {
        self.undo.len()
    }
}

impl StrokeTarget for DemoTarget {
    fn take_canvas(&mut self) -> Pixmap {
        self.canvas
            .take()
            .expect("canvas is only taken for the duration of a stroke")
    }

    fn put_canvas(&mut self, canvas: Pixmap) {
        self.canvas = Some(canvas);
    }

    fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    fn save_undo_snapshot(&mut self, snapshot: UndoSnapshot) {
        self.undo.push(snapshot);
    }

    fn stroke_committed(&mut self, affected: emath::Rect) {
        info!("stroke committed, affected {affected:?}");
    }
}
