use tiny_skia::{FillRule, Mask, Path, Transform};

/// Externally owned selection region, as a shape in layer coordinates.
///
/// The mask generator and the brush tool only ever read it.
pub struct Selection {
    shape: Path,
}

impl Selection {
    pub fn new(shape: Path) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> &Path {
        &self.shape
    }

    /// Anti-aliased clip restricting drawing to the selected region.
    pub fn clip_mask(&self, width: u32, height: u32) -> Option<Mask> {
        let mut mask = Mask::new(width, height)?;
        mask.fill_path(&self.shape, FillRule::Winding, true, Transform::identity());
        Some(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::{PathBuilder, Rect};

    #[test]
    fn clip_mask_covers_the_shape_only() {
        let rect = Rect::from_xywh(2.0, 2.0, 4.0, 4.0).unwrap();
        let selection = Selection::new(PathBuilder::from_rect(rect));
        let mask = selection.clip_mask(10, 10).unwrap();

        let data = mask.data();
        assert_eq!(data[3 * 10 + 3], 255);
        assert_eq!(data[8 * 10 + 8], 0);
    }
}
