use std::path::Path;

use image::RgbaImage;
use tracing::debug;

use crate::error::{Error, Result};

/// Resolution the overlay is rendered at.
pub const REFERENCE_DPI: f64 = 96.0;

/// Stored resolution of an image, in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dpi {
    pub x: f64,
    pub y: f64,
}

impl Default for Dpi {
    fn default() -> Self {
        Self {
            x: REFERENCE_DPI,
            y: REFERENCE_DPI,
        }
    }
}

impl Dpi {
    /// Non-positive or non-finite values fall back to the reference resolution.
    pub fn new(x: f64, y: f64) -> Self {
        let sane = |v: f64| if v.is_finite() && v > 0.0 { v } else { REFERENCE_DPI };
        Self {
            x: sane(x),
            y: sane(y),
        }
    }

    /// `96 / dpi` per axis.
    pub fn resize_factor(&self) -> (f64, f64) {
        (REFERENCE_DPI / self.x, REFERENCE_DPI / self.y)
    }
}

/// The bitmap currently on screen.
#[derive(Clone)]
pub struct DisplayImage {
    pub image: RgbaImage,
    pub dpi: Dpi,
}

impl std::fmt::Debug for DisplayImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayImage")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("dpi", &self.dpi)
            .finish()
    }
}

impl DisplayImage {
    pub fn new(image: RgbaImage, dpi: Dpi) -> Self {
        Self { image, dpi }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| Error::Image {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(err),
        })?;
        let image = image::load_from_memory(&bytes).map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let dpi = read_jpeg_dpi(&bytes).unwrap_or_default();
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            dpi_x = dpi.x,
            dpi_y = dpi.y,
            "loaded image"
        );

        Ok(Self::new(image.to_rgba8(), dpi))
    }

    pub fn size(&self) -> [usize; 2] {
        [self.image.width() as usize, self.image.height() as usize]
    }
}

/// Reads the stored resolution of a JPEG from its JFIF header, or from the
/// EXIF resolution tags when the JFIF header carries none.
pub fn read_jpeg_dpi(data: &[u8]) -> Option<Dpi> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut jfif = None;
    let mut exif = None;
    let mut offset = 2;

    while offset + 4 <= data.len() {
        if data[offset] != 0xFF {
            return None;
        }
        let marker = data[offset + 1];
        // fill bytes
        if marker == 0xFF {
            offset += 1;
            continue;
        }
        // start of scan / end of image: no more metadata
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        let length = u16::from_be_bytes([data[offset + 2], data[offset + 3]]) as usize;
        if length < 2 || offset + 2 + length > data.len() {
            break;
        }
        let segment = &data[offset + 4..offset + 2 + length];

        match marker {
            0xE0 if jfif.is_none() => jfif = parse_jfif_density(segment),
            0xE1 if exif.is_none() => exif = parse_exif_resolution(segment),
            _ => {}
        }

        offset += 2 + length;
    }

    jfif.or(exif)
}

fn parse_jfif_density(segment: &[u8]) -> Option<Dpi> {
    // "JFIF\0", version (2), units (1), x density (2), y density (2)
    if segment.len() < 12 || &segment[0..5] != b"JFIF\0" {
        return None;
    }
    let units = segment[7];
    let x = u16::from_be_bytes([segment[8], segment[9]]) as f64;
    let y = u16::from_be_bytes([segment[10], segment[11]]) as f64;
    if x == 0.0 || y == 0.0 {
        return None;
    }
    match units {
        1 => Some(Dpi::new(x, y)),
        2 => Some(Dpi::new(x * 2.54, y * 2.54)),
        // aspect ratio only
        _ => None,
    }
}

fn parse_exif_resolution(segment: &[u8]) -> Option<Dpi> {
    if segment.len() < 14 || &segment[0..6] != b"Exif\0\0" {
        return None;
    }
    let tiff = &segment[6..];
    let big_endian = match &tiff[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };
    let read_u16 = |at: usize| -> Option<u16> {
        let b = tiff.get(at..at + 2)?;
        Some(if big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    };
    let read_u32 = |at: usize| -> Option<u32> {
        let b = tiff.get(at..at + 4)?;
        Some(if big_endian {
            u32::from_be_bytes([b[0], b[1], b[2], b[3]])
        } else {
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })
    };
    let read_rational = |at: usize| -> Option<f64> {
        let numerator = read_u32(at)?;
        let denominator = read_u32(at + 4)?;
        (denominator != 0).then(|| numerator as f64 / denominator as f64)
    };

    if read_u16(2)? != 42 {
        return None;
    }
    let ifd = read_u32(4)? as usize;
    let entries = read_u16(ifd)? as usize;

    let (mut x, mut y, mut unit) = (None, None, 2u16);
    for i in 0..entries {
        let entry = ifd + 2 + i * 12;
        let tag = read_u16(entry)?;
        match tag {
            0x011A => x = read_rational(read_u32(entry + 8)? as usize),
            0x011B => y = read_rational(read_u32(entry + 8)? as usize),
            0x0128 => unit = read_u16(entry + 8)?,
            _ => {}
        }
    }

    let (x, y) = (x?, y?);
    match unit {
        2 => Some(Dpi::new(x, y)),
        3 => Some(Dpi::new(x * 2.54, y * 2.54)),
        _ => None,
    }
}
