//! Configuration types for page export.
//!
//! A conversion run is controlled by [`ConversionConfig`]: output format,
//! encoder quality and render scale. The struct is `Clone` so a run can take
//! a snapshot when it starts; later edits to the session settings never reach
//! an in-flight run.
//!
//! User-facing controls speak in integer percents (quality 1–100, scale
//! 10–500); the config stores the equivalent fractions.

use crate::error::Pdf2ImgError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest accepted scale, in percent of the native page size.
pub const MIN_SCALE_PERCENT: u32 = 10;
/// Highest accepted scale, in percent of the native page size.
pub const MAX_SCALE_PERCENT: u32 = 500;

/// Output image format for exported pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossy JPEG; honours `quality`.
    Jpeg,
    /// Lossless PNG (default); `quality` is ignored.
    #[default]
    Png,
    /// Lossy WebP; honours `quality`.
    Webp,
}

impl ImageFormat {
    /// All supported formats, in menu order.
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Webp];

    /// File extension used for archive entries (`page-3.png`).
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }

    /// MIME type of the encoded bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// Whether the encoder uses the quality setting.
    pub fn is_lossy(self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::Webp)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = Pdf2ImgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(Pdf2ImgError::InvalidConfig(format!(
                "unknown image format '{other}' (expected png, jpeg or webp)"
            ))),
        }
    }
}

/// Settings for one conversion run.
///
/// # Example
/// ```rust
/// use pdf2img::{ConversionConfig, ImageFormat};
///
/// let config = ConversionConfig::builder()
///     .format(ImageFormat::Jpeg)
///     .quality_percent(80)
///     .scale_percent(150)
///     .build()
///     .unwrap();
/// assert_eq!(config.scale, 1.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Output image format. Default: PNG.
    pub format: ImageFormat,

    /// Encoder quality as a fraction in `[0.01, 1.0]`. Default: 0.92.
    ///
    /// Only lossy formats use it.
    pub quality: f32,

    /// Render scale relative to the page's native size (1 px per PDF point
    /// at `1.0`). Default: 1.0.
    pub scale: f32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            quality: 0.92,
            scale: 1.0,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Quality as the 1–100 integer the encoders expect.
    pub fn quality_percent(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Scale as an integer percent.
    pub fn scale_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn format(mut self, format: ImageFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Quality from an integer percent, clamped to 1–100.
    pub fn quality_percent(mut self, percent: u8) -> Self {
        self.config.quality = f32::from(percent.clamp(1, 100)) / 100.0;
        self
    }

    pub fn quality(mut self, fraction: f32) -> Self {
        self.config.quality = fraction;
        self
    }

    /// Scale from an integer percent, clamped to the accepted range.
    pub fn scale_percent(mut self, percent: u32) -> Self {
        let p = percent.clamp(MIN_SCALE_PERCENT, MAX_SCALE_PERCENT);
        self.config.scale = p as f32 / 100.0;
        self
    }

    pub fn scale(mut self, factor: f32) -> Self {
        self.config.scale = factor;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2ImgError> {
        let c = &self.config;
        if !(0.01..=1.0).contains(&c.quality) {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "quality must be within 0.01–1.0, got {}",
                c.quality
            )));
        }
        let min = MIN_SCALE_PERCENT as f32 / 100.0;
        let max = MAX_SCALE_PERCENT as f32 / 100.0;
        if !c.scale.is_finite() || c.scale < min || c.scale > max {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "scale must be within {min}–{max}, got {}",
                c.scale
            )));
        }
        Ok(self.config)
    }
}

// ── Page selection expressions ───────────────────────────────────────────

/// A textual page selection, as typed on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed), in the given order.
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand into 1-indexed page numbers within `1..=total_pages`.
    ///
    /// Order follows the expression; duplicates and out-of-range entries
    /// are dropped.
    pub fn to_pages(&self, total_pages: usize) -> Vec<usize> {
        let candidates: Vec<usize> = match self {
            PageSelection::All => (1..=total_pages).collect(),
            PageSelection::Single(p) => vec![*p],
            PageSelection::Range(start, end) => ((*start).max(1)..=(*end).min(total_pages)).collect(),
            PageSelection::Set(pages) => pages.clone(),
        };
        let mut pages = Vec::with_capacity(candidates.len());
        for p in candidates {
            if p >= 1 && p <= total_pages && !pages.contains(&p) {
                pages.push(p);
            }
        }
        pages
    }
}

impl FromStr for PageSelection {
    type Err = Pdf2ImgError;

    /// Parse `all`, `5`, `3-15` or `1,3,5,7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let invalid = |msg: String| Pdf2ImgError::InvalidConfig(msg);
        let parse_page = |p: &str| -> Result<usize, Pdf2ImgError> {
            let n: usize = p
                .trim()
                .parse()
                .map_err(|_| invalid(format!("invalid page number: '{}'", p.trim())))?;
            if n < 1 {
                return Err(invalid(format!("pages are 1-indexed, minimum is 1 (got {n})")));
            }
            Ok(n)
        };

        if s == "all" {
            return Ok(PageSelection::All);
        }

        if s.contains(',') {
            let pages = s
                .split(',')
                .filter(|p| !p.trim().is_empty())
                .map(parse_page)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(PageSelection::Set(pages));
        }

        if let Some((start, end)) = s.split_once('-') {
            let start = parse_page(start)?;
            let end = parse_page(end)?;
            if start > end {
                return Err(invalid(format!(
                    "invalid page range '{start}-{end}': start must be <= end"
                )));
            }
            return Ok(PageSelection::Range(start, end));
        }

        Ok(PageSelection::Single(parse_page(&s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_maps_percent_to_fraction() {
        let c = ConversionConfig::builder()
            .format(ImageFormat::Png)
            .quality_percent(80)
            .scale_percent(100)
            .build()
            .unwrap();
        assert_eq!(c.format, ImageFormat::Png);
        assert!((c.quality - 0.8).abs() < f32::EPSILON);
        assert_eq!(c.scale, 1.0);
        assert_eq!(c.quality_percent(), 80);
        assert_eq!(c.scale_percent(), 100);
    }

    #[test]
    fn builder_clamps_percent_inputs() {
        let c = ConversionConfig::builder()
            .quality_percent(0)
            .scale_percent(5000)
            .build()
            .unwrap();
        assert_eq!(c.quality_percent(), 1);
        assert_eq!(c.scale_percent(), MAX_SCALE_PERCENT);
    }

    #[test]
    fn build_rejects_bad_fractions() {
        assert!(ConversionConfig::builder().quality(1.5).build().is_err());
        assert!(ConversionConfig::builder().scale(0.0).build().is_err());
        assert!(ConversionConfig::builder().scale(f32::NAN).build().is_err());
    }

    #[test]
    fn format_parsing_and_extension() {
        assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!("jpg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("webp".parse::<ImageFormat>().unwrap(), ImageFormat::Webp);
        assert!("gif".parse::<ImageFormat>().is_err());
        assert_eq!(ImageFormat::Jpeg.extension(), "jpeg");
        assert_eq!(ImageFormat::Webp.mime_type(), "image/webp");
        assert!(ImageFormat::Jpeg.is_lossy());
        assert!(ImageFormat::Webp.is_lossy());
        assert!(!ImageFormat::Png.is_lossy());
    }

    #[test]
    fn format_serialises_lowercase() {
        let json = serde_json::to_string(&ImageFormat::Webp).unwrap();
        assert_eq!(json, "\"webp\"");
    }

    #[test]
    fn page_selection_parsing() {
        assert_eq!("all".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!("5".parse::<PageSelection>().unwrap(), PageSelection::Single(5));
        assert_eq!(
            "3-15".parse::<PageSelection>().unwrap(),
            PageSelection::Range(3, 15)
        );
        assert_eq!(
            "1, 3,5".parse::<PageSelection>().unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
        assert!("0".parse::<PageSelection>().is_err());
        assert!("9-2".parse::<PageSelection>().is_err());
        assert!("x".parse::<PageSelection>().is_err());
    }

    #[test]
    fn page_selection_to_pages() {
        assert_eq!(PageSelection::All.to_pages(3), vec![1, 2, 3]);
        assert_eq!(PageSelection::Single(4).to_pages(3), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 9).to_pages(4), vec![2, 3, 4]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3, 8]).to_pages(5),
            vec![3, 1] // order kept, duplicates and out-of-range dropped
        );
    }
}
