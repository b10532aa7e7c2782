//! Raster rendering of exported SVG.

use crate::export::ImageRenderer;
use crate::{Error, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use modeler_editor_api::ExportFormat;
use resvg::tiny_skia::{self, Pixmap};
use resvg::usvg::{Options, Tree};
use std::io::Cursor;
use tracing::debug;

/// [`ImageRenderer`] backed by `resvg`.
///
/// Images are drawn on a white background, so JPEG output needs no alpha
/// channel.
///
/// # Example
///
/// ```rust
/// use modeler_core::{ImageRenderer, SvgRenderer};
/// use modeler_editor_api::ExportFormat;
///
/// let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#;
/// let png = SvgRenderer::new().render(svg, ExportFormat::Png).unwrap();
/// assert_eq!(&png[1..4], b"PNG");
/// ```
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    scale: f32,
    system_fonts: bool,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            system_fonts: true,
        }
    }

    /// Render at `scale` times the SVG's own size.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Skip loading system fonts; labels are then not drawn.
    pub fn without_system_fonts(mut self) -> Self {
        self.system_fonts = false;
        self
    }

    fn rasterize(&self, svg: &str) -> Result<RgbaImage> {
        let mut options = Options::default();
        if self.system_fonts {
            options.fontdb_mut().load_system_fonts();
        }

        let tree = Tree::from_str(svg, &options)
            .map_err(|e| Error::export(format!("Invalid SVG: {}", e)))?;

        let size = tree.size();
        let width = (size.width() * self.scale).ceil() as u32;
        let height = (size.height() * self.scale).ceil() as u32;

        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| Error::export(format!("Cannot render a {}x{} image", width, height)))?;
        pixmap.fill(tiny_skia::Color::WHITE);

        let transform = tiny_skia::Transform::from_scale(self.scale, self.scale);
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        debug!("Rendered {}x{} image", width, height);

        RgbaImage::from_raw(width, height, pixmap.take())
            .ok_or_else(|| Error::export("Failed to create image buffer"))
    }
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageRenderer for SvgRenderer {
    fn render(&self, svg: &str, format: ExportFormat) -> Result<Vec<u8>> {
        let image = DynamicImage::ImageRgba8(self.rasterize(svg)?);

        let (image, image_format) = match format {
            ExportFormat::Png => (image, ImageFormat::Png),
            ExportFormat::Jpeg => (DynamicImage::ImageRgb8(image.to_rgb8()), ImageFormat::Jpeg),
            other => return Err(Error::export(format!("{} is not a raster format", other))),
        };

        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image_format)
            .map_err(|e| Error::export(format!("Failed to encode {}: {}", format, e)))?;

        Ok(bytes.into_inner())
    }
}
