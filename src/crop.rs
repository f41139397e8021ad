/**
 * Timestamp-band cropping
 *
 * Trail cameras burn the date/time overlay into a strip along the bottom
 * of the frame. The crop region is a fixed fraction of the image height so
 * it scales with the source resolution instead of assuming pixel offsets.
 */

use image::{DynamicImage, GenericImageView};

/// Fraction of the frame height above the timestamp band.
const BAND_TOP_RATIO: f64 = 0.95;

/// Crop rectangle (x, y, width, height) for the bottom timestamp band.
///
/// Rounding policy: the top edge is floored and the band runs to the bottom
/// row, so an odd height rounds the band up to ceil(5%) rather than losing
/// a pixel row of the overlay.
pub fn crop_rect(width: u32, height: u32) -> (u32, u32, u32, u32) {
    let top = (f64::from(height) * BAND_TOP_RATIO).floor() as u32;
    (0, top, width, height - top)
}

/// Extract the timestamp band as a new image, preserving the source pixel
/// format.
pub fn crop_timestamp_band(frame: &DynamicImage) -> DynamicImage {
    let (width, height) = frame.dimensions();
    let (x, y, w, h) = crop_rect(width, height);
    frame.crop_imm(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_covers_bottom_five_percent_full_width() {
        assert_eq!(crop_rect(1920, 1080), (0, 1026, 1920, 54));
        assert_eq!(crop_rect(640, 480), (0, 456, 640, 24));
        assert_eq!(crop_rect(1280, 720), (0, 684, 1280, 36));
    }

    #[test]
    fn odd_heights_floor_the_top_edge() {
        // 0.95 * 1081 = 1026.95: the band starts at 1026 and is 55 rows tall.
        assert_eq!(crop_rect(1920, 1081), (0, 1026, 1920, 55));
        // 0.95 * 99 = 94.05: band starts at 94, 5 rows tall.
        assert_eq!(crop_rect(100, 99), (0, 94, 100, 5));
    }

    #[test]
    fn band_always_reaches_the_bottom_row() {
        for height in [1, 2, 19, 20, 480, 719, 1080, 1081] {
            let (_, y, _, h) = crop_rect(640, height);
            assert_eq!(y + h, height, "height {}", height);
        }
    }

    #[test]
    fn cropped_image_has_rect_dimensions_and_format() {
        let frame = DynamicImage::new_rgb8(64, 40);
        let band = crop_timestamp_band(&frame);
        // 0.95 * 40 = 38, so the band is the bottom 2 rows.
        assert_eq!(band.dimensions(), (64, 2));
        assert_eq!(band.color(), frame.color());
    }
}
