//! # Documents
//!
//! PDF forms rendered with `genpdf`, CSV exports and the ZIP bundle used
//! when several analysis reports are exported at once.
//!
//! Fonts are loaded from the configured fonts directory: the Arial family
//! when present, LiberationSans otherwise.

pub mod activity_form;
pub mod bundle;
pub mod csv_export;
pub mod tar;

use crate::config::AppConfig;
use crate::error::AppError;
use genpdf::elements::{Image as PdfImage, Paragraph};
use genpdf::style::Style;
use genpdf::{Alignment, Document, Element};
use image::imageops::FilterType;
use image::{load_from_memory, DynamicImage, GenericImageView};
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const PAGE_WIDTH_INCH: f64 = 8.27;
const MARGIN_MM: f64 = 10.0;
const IMAGE_DPI: f64 = 150.0;

/// What the PDF generators need from the configuration.
#[derive(Debug, Clone)]
pub struct PdfSettings {
    pub fonts_dir: PathBuf,
    pub company_name: String,
    pub site_name: String,
}

impl From<&AppConfig> for PdfSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            fonts_dir: config.fonts_dir.clone(),
            company_name: config.company_name.clone(),
            site_name: config.site_name.clone(),
        }
    }
}

/// A rendered file ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

fn load_font(
    fonts_dir: &Path,
) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, AppError> {
    if let Ok(family) = genpdf::fonts::from_files(fonts_dir, "Arial", None) {
        return Ok(family);
    }
    Ok(genpdf::fonts::from_files(fonts_dir, "LiberationSans", None)?)
}

/// A document with the font, margins and base size shared by every form.
fn configure_document(settings: &PdfSettings, title: &str) -> Result<Document, AppError> {
    let font_family = load_font(&settings.fonts_dir)?;
    let mut doc = Document::new(font_family);
    doc.set_title(title);
    doc.set_font_size(9);
    doc.set_line_spacing(1.0f64);

    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);
    Ok(doc)
}

fn render(doc: Document) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    doc.render(&mut bytes)?;
    Ok(bytes)
}

pub(crate) fn bold(text: impl Into<String>) -> impl Element {
    Paragraph::new(text.into()).styled(Style::new().bold())
}

pub(crate) fn title(text: &str, size: u8) -> impl Element {
    Paragraph::new(text)
        .aligned(Alignment::Center)
        .styled(Style::new().bold().with_font_size(size))
}

/// `text` or `-` for blanks.
pub(crate) fn or_dash(text: Option<&str>) -> String {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_owned(),
        _ => "-".to_owned(),
    }
}

/// Target pixel size fitting `max_px` on both sides and the printable page width.
fn fit_size(width: u32, height: u32, max_px: f64) -> (u32, u32) {
    let margin_in = MARGIN_MM / 25.4_f64;
    let content_target_px = (PAGE_WIDTH_INCH - 2.0 * margin_in) * IMAGE_DPI;
    let (w, h) = (width as f64, height as f64);
    let scale = (content_target_px / w)
        .min(max_px / w)
        .min(max_px / h)
        .min(1.0);
    if scale >= 1.0 {
        (width, height)
    } else {
        (
            (w * scale).max(1.0).round() as u32,
            (h * scale).max(1.0).round() as u32,
        )
    }
}

/// Decodes an uploaded image, scales it to at most `max_px` on each side,
/// flattens transparency over white and embeds it through a temporary PNG.
/// The temporary file is kept in `temp_files` until rendering is done.
pub(crate) fn embed_image(
    bytes: &[u8],
    max_px: f64,
    temp_files: &mut Vec<NamedTempFile>,
) -> Result<PdfImage, AppError> {
    let img = load_from_memory(bytes)?;
    let (orig_w, orig_h) = img.dimensions();
    let (new_w, new_h) = fit_size(orig_w, orig_h, max_px);
    let resized: DynamicImage = if (new_w, new_h) == (orig_w, orig_h) {
        img
    } else {
        img.resize(new_w, new_h, FilterType::Lanczos3)
    };

    let rgba = resized.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut background = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut background, &rgba, 0, 0);
    let raw = DynamicImage::ImageRgba8(background).to_rgb8().into_raw();

    let mut tmp = NamedTempFile::new()?;
    {
        let file = tmp.as_file_mut();
        let mut encoder = PngEncoder::new(file, w, h);
        encoder.set_color(PngColorType::Rgb);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&raw)?;
    }

    let mut element = PdfImage::from_path(tmp.path())?;
    element.set_dpi(IMAGE_DPI);
    element.set_alignment(Alignment::Center);
    temp_files.push(tmp);
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100, 80, 300.0, (100, 80))]
    #[case(1200, 600, 300.0, (300, 150))]
    #[case(600, 1200, 300.0, (150, 300))]
    fn images_shrink_to_fit(
        #[case] w: u32,
        #[case] h: u32,
        #[case] max_px: f64,
        #[case] expected: (u32, u32),
    ) {
        assert_eq!(fit_size(w, h, max_px), expected);
    }

    #[test]
    fn blank_text_prints_dash() {
        assert_eq!(or_dash(Some("  ")), "-");
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("HD785")), "HD785");
    }
}
