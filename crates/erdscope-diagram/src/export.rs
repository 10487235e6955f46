//! PNG export of the diagram

use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use erdscope_core::{ErdError, Result};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};

/// Default height of the footer strip
pub const FOOTER_HEIGHT: u32 = 70;
/// Default padding around the footer logo
pub const FOOTER_PADDING: u32 = 16;

/// Options for [`crate::SchemaDiagram::generate_image`]
#[derive(Debug, Clone)]
pub struct ImageOptions {
    /// Pixel ratio of the output. Defaults to 1.
    pub scale: Option<f64>,
    pub background: Rgba<u8>,
    pub footer: Option<ImageFooter>,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            scale: None,
            background: Rgba([0, 0, 0, 255]),
            footer: None,
        }
    }
}

impl ImageOptions {
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_background(mut self, background: Rgba<u8>) -> Self {
        self.background = background;
        self
    }

    pub fn with_footer(mut self, footer: ImageFooter) -> Self {
        self.footer = Some(footer);
        self
    }

    /// Scale to render at; missing or non-positive scales render at 1
    pub fn pixel_ratio(&self) -> f64 {
        self.scale.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(1.0)
    }
}

/// A strip appended below the exported diagram carrying a logo
#[derive(Debug, Clone)]
pub struct ImageFooter {
    pub logo: RgbaImage,
    pub height: u32,
    pub background: Rgba<u8>,
    pub padding: u32,
}

impl ImageFooter {
    pub fn new(logo: RgbaImage) -> Self {
        Self {
            logo,
            height: FOOTER_HEIGHT,
            background: Rgba([0, 0, 0, 255]),
            padding: FOOTER_PADDING,
        }
    }

    pub fn with_background(mut self, background: Rgba<u8>) -> Self {
        self.background = background;
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Compose `image` with the footer strip below it.
    ///
    /// The logo is scaled down to fit the padded strip, never up, and is
    /// right-aligned and vertically centred.
    pub fn append_to(&self, image: &RgbaImage) -> RgbaImage {
        let width = image.width();
        let mut composed = RgbaImage::from_pixel(width, image.height() + self.height, self.background);
        imageops::replace(&mut composed, image, 0, 0);

        let max_width = width as f64 - 2.0 * self.padding as f64;
        let max_height = self.height as f64 - 2.0 * self.padding as f64;
        let (logo_width, logo_height) = self.logo.dimensions();
        if max_width <= 0.0 || max_height <= 0.0 || logo_width == 0 || logo_height == 0 {
            return composed;
        }

        let scale = (max_width / logo_width as f64)
            .min(max_height / logo_height as f64)
            .min(1.0);
        let draw_width = ((logo_width as f64 * scale).round() as u32).max(1);
        let draw_height = ((logo_height as f64 * scale).round() as u32).max(1);
        let logo = if scale < 1.0 {
            imageops::resize(&self.logo, draw_width, draw_height, FilterType::Triangle)
        } else {
            self.logo.clone()
        };

        let x = width as i64 - draw_width as i64 - self.padding as i64;
        let y = image.height() as i64 + (self.height as i64 - draw_height as i64) / 2;
        imageops::overlay(&mut composed, &logo, x, y);
        composed
    }
}

/// An encoded diagram image
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl GeneratedImage {
    pub fn encode(image: &RgbaImage) -> Result<Self> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ErdError::image(e.to_string()))?;
        Ok(Self {
            png,
            width: image.width(),
            height: image.height(),
        })
    }

    /// `data:image/png;base64,...`
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }
}
