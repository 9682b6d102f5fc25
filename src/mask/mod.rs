use image::{GrayImage, Luma};
use log::debug;
use tiny_skia::{
    BlendMode, Color, FillRule, GradientStop, Paint, Pixmap, PixmapPaint, Point, RadialGradient,
    Rect, SpreadMode, Transform,
};

use crate::{Layer, Selection};

/// Ways to create a new layer mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskAddMode {
    RevealAll,
    HideAll,
    RevealSelection,
    HideSelection,
    FromTransparency,
    FromLayer,
    /// Radial test pattern; not offered to users.
    Pattern,
}

#[derive(Debug, thiserror::Error)]
pub enum MaskError {
    #[error("{0} requires an active selection")]
    MissingSelection(MaskAddMode),
    #[error("invalid mask dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),
}

impl MaskAddMode {
    pub const ALL: [Self; 7] = [
        Self::RevealAll,
        Self::HideAll,
        Self::RevealSelection,
        Self::HideSelection,
        Self::FromTransparency,
        Self::FromLayer,
        Self::Pattern,
    ];

    pub fn needs_selection(&self) -> bool {
        matches!(self, Self::RevealSelection | Self::HideSelection)
    }

    /// True if this mode needs a selection and there is none. Callers are
    /// expected to check this before calling [`generate`](Self::generate).
    pub fn missing_selection(&self, selection: Option<&Selection>) -> bool {
        self.needs_selection() && selection.is_none()
    }

    /// Produces the grayscale mask bitmap for this mode, exactly
    /// `width` x `height`. The layer is not mutated.
    pub fn generate(
        &self,
        layer: &dyn Layer,
        width: u32,
        height: u32,
        selection: Option<&Selection>,
    ) -> Result<GrayImage, MaskError> {
        if self.missing_selection(selection) {
            return Err(MaskError::MissingSelection(*self));
        }

        let pixmap = match self {
            Self::RevealAll => filled_image(width, height, Color::WHITE, None)?,
            Self::HideAll => filled_image(width, height, Color::BLACK, None)?,
            Self::RevealSelection => {
                filled_image(width, height, Color::BLACK, selection.map(|s| (Color::WHITE, s)))?
            }
            Self::HideSelection => {
                filled_image(width, height, Color::WHITE, selection.map(|s| (Color::BLACK, s)))?
            }
            Self::FromTransparency => mask_from_layer(layer, true, width, height)?,
            Self::FromLayer => mask_from_layer(layer, false, width, height)?,
            Self::Pattern => pattern_image(width, height)?,
        };

        Ok(to_gray(&pixmap))
    }
}

impl std::fmt::Display for MaskAddMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RevealAll => "Reveal All",
            Self::HideAll => "Hide All",
            Self::RevealSelection => "Reveal Selection",
            Self::HideSelection => "Hide Selection",
            Self::FromTransparency => "From Transparency",
            Self::FromLayer => "From Layer",
            Self::Pattern => "Pattern",
        };
        f.write_str(name)
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, MaskError> {
    Pixmap::new(width, height).ok_or(MaskError::InvalidDimensions(width, height))
}

fn filled_image(
    width: u32,
    height: u32,
    bg: Color,
    fg: Option<(Color, &Selection)>,
) -> Result<Pixmap, MaskError> {
    let mut pixmap = new_pixmap(width, height)?;
    pixmap.fill(bg);

    if let Some((color, selection)) = fg {
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        pixmap.fill_path(
            selection.shape(),
            &paint,
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
    Ok(pixmap)
}

fn mask_from_layer(
    layer: &dyn Layer,
    only_transparency: bool,
    width: u32,
    height: u32,
) -> Result<Pixmap, MaskError> {
    match layer.canvas_image(width, height) {
        Some(content) => mask_from_image(&content, only_transparency, width, height),
        None => {
            // there is nothing better for layers without renderable content
            debug!("layer has no canvas-sized rendering, falling back to a fully revealed mask");
            filled_image(width, height, Color::WHITE, None)
        }
    }
}

fn mask_from_image(
    content: &Pixmap,
    only_transparency: bool,
    width: u32,
    height: u32,
) -> Result<Pixmap, MaskError> {
    debug_assert_eq!((content.width(), content.height()), (width, height));

    let mut pixmap = new_pixmap(width, height)?;
    // transparent parts of the content must end up white
    pixmap.fill(Color::WHITE);

    let paint = PixmapPaint {
        // with DestinationOut only the source alpha matters
        blend_mode: if only_transparency {
            BlendMode::DestinationOut
        } else {
            BlendMode::SourceOver
        },
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, content.as_ref(), &paint, Transform::identity(), None);
    Ok(pixmap)
}

fn pattern_image(width: u32, height: u32) -> Result<Pixmap, MaskError> {
    let mut pixmap = new_pixmap(width, height)?;
    pixmap.fill(Color::WHITE);

    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let radius = cx.min(cy);
    let center = Point::from_xy(cx, cy);
    let shader = RadialGradient::new(
        center,
        center,
        radius,
        vec![
            GradientStop::new(0.5, Color::WHITE),
            GradientStop::new(1.0, Color::BLACK),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )
    .ok_or(MaskError::InvalidDimensions(width, height))?;

    let paint = Paint {
        shader,
        ..Paint::default()
    };
    let full = Rect::from_xywh(0.0, 0.0, width as f32, height as f32)
        .ok_or(MaskError::InvalidDimensions(width, height))?;
    pixmap.fill_rect(full, &paint, Transform::identity(), None);
    Ok(pixmap)
}

fn to_gray(pixmap: &Pixmap) -> GrayImage {
    let width = pixmap.width();
    let pixels = pixmap.pixels();
    // premultiplied channels are already composited over black, which is
    // what a single-channel mask wants
    GrayImage::from_fn(width, pixmap.height(), |x, y| {
        let p = pixels[(y * width + x) as usize];
        Luma([luma(p.red(), p.green(), p.blue())])
    })
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::PathBuilder;

    struct NoContentLayer;

    impl Layer for NoContentLayer {
        fn canvas_image(&self, _width: u32, _height: u32) -> Option<Pixmap> {
            None
        }
    }

    fn solid_layer(width: u32, height: u32, color: Color) -> crate::PixelLayer {
        let mut image = Pixmap::new(width, height).unwrap();
        image.fill(color);
        crate::PixelLayer::new(image, (0, 0))
    }

    fn rect_selection(x: f32, y: f32, w: f32, h: f32) -> Selection {
        let rect = tiny_skia::Rect::from_xywh(x, y, w, h).unwrap();
        Selection::new(PathBuilder::from_rect(rect))
    }

    #[test]
    fn only_selection_modes_miss_an_absent_selection() {
        for mode in MaskAddMode::ALL {
            let expected = matches!(
                mode,
                MaskAddMode::RevealSelection | MaskAddMode::HideSelection
            );
            assert_eq!(mode.missing_selection(None), expected, "{mode}");
        }

        let selection = rect_selection(0.0, 0.0, 2.0, 2.0);
        for mode in MaskAddMode::ALL {
            assert!(!mode.missing_selection(Some(&selection)), "{mode}");
        }
    }

    #[test]
    fn selection_modes_fail_without_a_selection() {
        let err = MaskAddMode::RevealSelection
            .generate(&NoContentLayer, 4, 4, None)
            .unwrap_err();
        assert!(matches!(err, MaskError::MissingSelection(_)));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let err = MaskAddMode::RevealAll
            .generate(&NoContentLayer, 0, 4, None)
            .unwrap_err();
        assert!(matches!(err, MaskError::InvalidDimensions(0, 4)));
    }

    #[test]
    fn reveal_all_and_hide_all_are_exact_inverses() {
        let reveal = MaskAddMode::RevealAll
            .generate(&NoContentLayer, 8, 6, None)
            .unwrap();
        let hide = MaskAddMode::HideAll
            .generate(&NoContentLayer, 8, 6, None)
            .unwrap();

        assert_eq!((reveal.width(), reveal.height()), (8, 6));
        for (a, b) in reveal.pixels().zip(hide.pixels()) {
            assert_eq!(a.0[0], 255);
            assert_eq!(b.0[0], 0);
        }
    }

    #[test]
    fn selection_modes_are_exact_inverses_of_each_other() {
        let selection = rect_selection(2.0, 1.0, 4.0, 3.0);
        let reveal = MaskAddMode::RevealSelection
            .generate(&NoContentLayer, 10, 8, Some(&selection))
            .unwrap();
        let hide = MaskAddMode::HideSelection
            .generate(&NoContentLayer, 10, 8, Some(&selection))
            .unwrap();

        for (a, b) in reveal.pixels().zip(hide.pixels()) {
            assert_eq!(a.0[0] as u16 + b.0[0] as u16, 255);
        }
        assert_eq!(reveal.get_pixel(3, 2).0[0], 255);
        assert_eq!(reveal.get_pixel(9, 7).0[0], 0);
    }

    #[test]
    fn from_transparency_inverts_alpha_into_luminance() {
        let opaque = solid_layer(5, 4, Color::from_rgba8(200, 10, 10, 255));
        let mask = MaskAddMode::FromTransparency
            .generate(&opaque, 5, 4, None)
            .unwrap();
        assert!(mask.pixels().all(|p| p.0[0] == 0));

        let transparent = crate::PixelLayer::new(Pixmap::new(5, 4).unwrap(), (0, 0));
        let mask = MaskAddMode::FromTransparency
            .generate(&transparent, 5, 4, None)
            .unwrap();
        assert!(mask.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn from_transparency_interpolates_partial_alpha() {
        let half = solid_layer(4, 4, Color::from_rgba8(0, 0, 0, 128));
        let mask = MaskAddMode::FromTransparency
            .generate(&half, 4, 4, None)
            .unwrap();
        let value = mask.get_pixel(1, 1).0[0];
        assert!((126..=128).contains(&value), "got {value}");
    }

    #[test]
    fn from_layer_produces_a_luminance_rendering() {
        let red = solid_layer(4, 4, Color::from_rgba8(255, 0, 0, 255));
        let mask = MaskAddMode::FromLayer.generate(&red, 4, 4, None).unwrap();
        let value = mask.get_pixel(2, 2).0[0];
        // Rec. 709 luma of pure red
        assert!((52..=56).contains(&value), "got {value}");
    }

    #[test]
    fn content_modes_fall_back_to_reveal_all() {
        for mode in [MaskAddMode::FromTransparency, MaskAddMode::FromLayer] {
            let mask = mode.generate(&NoContentLayer, 6, 6, None).unwrap();
            assert!(mask.pixels().all(|p| p.0[0] == 255), "{mode}");
        }
    }

    #[test]
    fn pattern_is_symmetric_under_half_turn() {
        let mask = MaskAddMode::Pattern
            .generate(&NoContentLayer, 40, 30, None)
            .unwrap();

        for y in 0..30 {
            for x in 0..40 {
                let a = mask.get_pixel(x, y).0[0] as i16;
                let b = mask.get_pixel(39 - x, 29 - y).0[0] as i16;
                assert!((a - b).abs() <= 1, "({x},{y}): {a} vs {b}");
            }
        }
        assert_eq!(mask.get_pixel(20, 15).0[0], 255);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
    }
}
