use nom_exif::*;
use std::path::Path;

/// Camera and capture metadata pulled out of an image file.
///
/// Every field is independently optional: a phone screenshot, a PNG export,
/// or a stripped JPEG simply yields `None` for whatever is missing. Numeric
/// fields are formatted human-readable here (`f6.3`, `1/200 sec`, `42.6 mm`)
/// so downstream caption code never has to know unit semantics.
#[derive(Debug, Clone, Default)]
pub struct PhotoMetadata {
    pub make: Option<String>,
    pub model: Option<String>,
    /// Aperture with "f" prefix, e.g. `f6.3`.
    pub f_number: Option<String>,
    /// Shutter speed, e.g. `1/200 sec` or `2.5 sec`.
    pub exposure_time: Option<String>,
    /// Focal length with "mm" suffix, e.g. `42.6 mm`.
    pub focal_length: Option<String>,
    /// Bare focal length value, e.g. `42.6`.
    pub focal_length_value: Option<String>,
    /// ISO value as a bare number, e.g. `200`.
    pub sensitivity: Option<String>,
    /// Capture timestamp as reported by the camera.
    pub date_time: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Extract metadata from an image file.
///
/// Never fails: formats without embedded tags (PNG) and malformed EXIF
/// blocks degrade to absent fields, since a missing caption enhancement
/// must never block an upload.
pub fn extract(path: &Path) -> PhotoMetadata {
    let mut meta = PhotoMetadata::default();

    // Pixel dimensions come from the image header, not EXIF.
    match image::image_dimensions(path) {
        Ok((w, h)) => {
            meta.width = Some(w);
            meta.height = Some(h);
        }
        Err(e) => log::debug!("No readable dimensions in {}: {e}", path.display()),
    }

    let mut parser = MediaParser::new();
    let ms = match MediaSource::file_path(path) {
        Ok(ms) => ms,
        Err(e) => {
            log::debug!("Cannot open {} for EXIF: {e}", path.display());
            return meta;
        }
    };

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return meta;
        }
    };
    let exif: Exif = iter.into();

    if let Some(val) = exif.get(ExifTag::Make) {
        meta.make = entry_to_string(val);
    }
    if let Some(val) = exif.get(ExifTag::Model) {
        meta.model = entry_to_string(val);
    }
    if let Some(val) = exif.get(ExifTag::FNumber) {
        meta.f_number = entry_to_f64(val).map(|v| format!("f{}", format_decimal(v)));
    }
    if let Some(val) = exif.get(ExifTag::ExposureTime) {
        meta.exposure_time = entry_to_f64(val).and_then(format_exposure_time);
    }
    if let Some(val) = exif.get(ExifTag::FocalLength) {
        let v = entry_to_f64(val).map(format_decimal);
        meta.focal_length = v.as_deref().map(|v| format!("{v} mm"));
        meta.focal_length_value = v;
    }
    if let Some(val) = exif.get(ExifTag::ISOSpeedRatings) {
        meta.sensitivity = entry_to_f64(val).map(format_decimal);
    }
    if let Some(val) = exif.get(ExifTag::DateTimeOriginal) {
        meta.date_time = entry_to_string(val);
    }

    meta
}

/// Convert an EntryValue to an Option<String>.
fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').to_string();
    if s.is_empty() { None } else { Some(s) }
}

/// Convert an EntryValue to a number, resolving rationals.
fn entry_to_f64(val: &EntryValue) -> Option<f64> {
    match val {
        EntryValue::URational(r) if r.1 != 0 => Some(r.0 as f64 / r.1 as f64),
        EntryValue::IRational(r) if r.1 != 0 => Some(r.0 as f64 / r.1 as f64),
        EntryValue::U32(v) => Some(*v as f64),
        // Integer-valued entries display as plain numbers.
        _ => val.to_string().trim().parse().ok(),
    }
}

/// Format a value with at most one decimal place, dropping ".0".
fn format_decimal(v: f64) -> String {
    let rounded = (v * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

/// Format an exposure time the way photographers read it: fractional
/// shutter speeds as `1/N sec`, long exposures as `N sec`.
fn format_exposure_time(seconds: f64) -> Option<String> {
    if seconds <= 0.0 {
        return None;
    }
    if seconds >= 1.0 {
        Some(format!("{} sec", format_decimal(seconds)))
    } else {
        Some(format!("1/{} sec", (1.0 / seconds).round() as u64))
    }
}
