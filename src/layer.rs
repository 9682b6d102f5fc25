use tiny_skia::{Pixmap, PixmapPaint, Transform};

/// Capability required by content-based mask generation: render the layer's
/// visible content as a canvas-sized image.
///
/// Layer kinds without renderable content (adjustment layers, groups, ...)
/// return `None`; mask generation then falls back to a fully revealed mask.
pub trait Layer {
    fn canvas_image(&self, width: u32, height: u32) -> Option<Pixmap>;
}

/// A pixel-content layer: an image plus its translation relative to the
/// canvas origin. The stored image may be bigger than the canvas.
pub struct PixelLayer {
    image: Pixmap,
    offset: (i32, i32),
}

impl PixelLayer {
    pub fn new(image: Pixmap, offset: (i32, i32)) -> Self {
        Self { image, offset }
    }

    pub fn image(&self) -> &Pixmap {
        &self.image
    }
}

impl Layer for PixelLayer {
    /// Canvas-sized sub-image: the stored image cropped and padded to the
    /// canvas through its offset.
    fn canvas_image(&self, width: u32, height: u32) -> Option<Pixmap> {
        let mut canvas = Pixmap::new(width, height)?;
        canvas.draw_pixmap(
            self.offset.0,
            self.offset.1,
            self.image.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Some(canvas)
    }
}
