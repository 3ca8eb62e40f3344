use image::imageops::FilterType;
use image::Rgba;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::display::{Dpi, DisplayImage};
use crate::face::FaceRectangle;

pub const OUTLINE_COLOR: Rgba<u8> = Rgba([255u8, 0u8, 0u8, 255u8]);

/// Maps a rectangle from source pixels to reference-resolution pixels.
pub fn scale_rectangle(rect: &FaceRectangle, dpi: Dpi) -> FaceRectangle {
    let (fx, fy) = dpi.resize_factor();
    let scale = |v: i32, f: f64| (v as f64 * f).round() as i32;
    FaceRectangle::new(
        scale(rect.left, fx),
        scale(rect.top, fy),
        scale(rect.width, fx),
        scale(rect.height, fy),
    )
}

/// Returns a copy of `source`, brought to the reference resolution, with a
/// hollow outline drawn over every rectangle.
///
/// Rectangles are given in source pixels and scaled with [`scale_rectangle`].
pub fn render_overlay(
    source: &DisplayImage,
    rects: &[FaceRectangle],
    thickness: u32,
) -> DisplayImage {
    let (fx, fy) = source.dpi.resize_factor();

    let mut image = if fx == 1.0 && fy == 1.0 {
        source.image.clone()
    } else {
        let width = ((source.image.width() as f64 * fx).round() as u32).max(1);
        let height = ((source.image.height() as f64 * fy).round() as u32).max(1);
        image::imageops::resize(&source.image, width, height, FilterType::Triangle)
    };

    for rect in rects {
        let scaled = scale_rectangle(rect, source.dpi);
        // thicker outlines grow inwards
        for inset in 0..thickness as i32 {
            let width = scaled.width - 2 * inset;
            let height = scaled.height - 2 * inset;
            if width <= 0 || height <= 0 {
                break;
            }
            let outline = Rect::at(scaled.left + inset, scaled.top + inset)
                .of_size(width as u32, height as u32);
            draw_hollow_rect_mut(&mut image, outline, OUTLINE_COLOR);
        }
    }

    DisplayImage::new(image, Dpi::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn white(width: u32, height: u32, dpi: Dpi) -> DisplayImage {
        DisplayImage::new(RgbaImage::from_pixel(width, height, WHITE), dpi)
    }

    #[test]
    fn scale_by_reference_over_source_dpi() {
        let rect = FaceRectangle::new(100, 40, 60, 80);
        assert_eq!(
            scale_rectangle(&rect, Dpi::new(192.0, 192.0)),
            FaceRectangle::new(50, 20, 30, 40)
        );
        assert_eq!(
            scale_rectangle(&rect, Dpi::new(72.0, 48.0)),
            FaceRectangle::new(133, 80, 80, 160)
        );
        assert_eq!(scale_rectangle(&rect, Dpi::default()), rect);
    }

    #[test]
    fn outline_is_drawn_at_scaled_coordinates() {
        let source = white(400, 200, Dpi::new(192.0, 192.0));
        let out = render_overlay(&source, &[FaceRectangle::new(100, 40, 60, 80)], 1);

        assert_eq!(out.image.dimensions(), (200, 100));
        assert_eq!(*out.image.get_pixel(50, 20), OUTLINE_COLOR);
        assert_eq!(*out.image.get_pixel(79, 59), OUTLINE_COLOR);
        assert_eq!(*out.image.get_pixel(49, 20), WHITE);
        // transparent fill
        assert_eq!(*out.image.get_pixel(65, 40), WHITE);
    }

    #[test]
    fn source_is_left_untouched() {
        let source = white(50, 50, Dpi::default());
        let out = render_overlay(&source, &[FaceRectangle::new(5, 5, 10, 10)], 2);
        assert_eq!(*source.image.get_pixel(5, 5), WHITE);
        assert_eq!(*out.image.get_pixel(5, 5), OUTLINE_COLOR);
        assert_eq!(*out.image.get_pixel(6, 6), OUTLINE_COLOR);
        assert_eq!(*out.image.get_pixel(7, 7), WHITE);
    }

    #[test]
    fn degenerate_and_offscreen_rectangles_do_not_panic() {
        let source = white(20, 20, Dpi::default());
        let out = render_overlay(
            &source,
            &[
                FaceRectangle::new(5, 5, 0, 10),
                FaceRectangle::new(15, 15, 30, 30),
                FaceRectangle::new(-5, -5, 8, 8),
            ],
            2,
        );
        assert_eq!(*out.image.get_pixel(15, 15), OUTLINE_COLOR);
        assert_eq!(*out.image.get_pixel(2, 2), OUTLINE_COLOR);
    }

    #[test]
    fn no_rectangles_is_a_plain_copy() {
        let source = white(8, 8, Dpi::default());
        let out = render_overlay(&source, &[], 2);
        assert_eq!(out.image, source.image);
    }
}
