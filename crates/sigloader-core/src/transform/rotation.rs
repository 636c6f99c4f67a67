//! Lossless quarter-turn rotation.
//!
//! The widget only rotates in 90 degree steps, so rotation is a pixel
//! permutation and never needs interpolation.

use crate::decode::DecodedImage;

/// A normalized rotation in 90 degree steps (clockwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuarterTurn {
    #[default]
    None,
    Cw90,
    Half,
    Cw270,
}

impl QuarterTurn {
    /// Snap an arbitrary angle to the nearest quarter turn.
    pub fn from_degrees(degrees: f64) -> Self {
        let turns = (degrees / 90.0).round() as i64;
        match turns.rem_euclid(4) {
            1 => QuarterTurn::Cw90,
            2 => QuarterTurn::Half,
            3 => QuarterTurn::Cw270,
            _ => QuarterTurn::None,
        }
    }

    /// Whether this turn swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, QuarterTurn::Cw90 | QuarterTurn::Cw270)
    }
}

/// Dimensions of a `width` x `height` image after rotating by `degrees`.
pub fn rotated_dimensions(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    if QuarterTurn::from_degrees(degrees).swaps_dimensions() {
        (height, width)
    } else {
        (width, height)
    }
}

/// Rotate an image clockwise by the quarter turn nearest to `degrees`.
pub fn rotate_quarter_turns(image: &DecodedImage, degrees: f64) -> DecodedImage {
    let turn = QuarterTurn::from_degrees(degrees);
    if turn == QuarterTurn::None {
        return image.clone();
    }

    let (src_w, src_h) = (image.width as usize, image.height as usize);
    let (dst_w, dst_h) = if turn.swaps_dimensions() {
        (src_h, src_w)
    } else {
        (src_w, src_h)
    };

    let mut output = vec![0u8; image.pixels.len()];
    for sy in 0..src_h {
        for sx in 0..src_w {
            let (dx, dy) = match turn {
                QuarterTurn::Cw90 => (src_h - 1 - sy, sx),
                QuarterTurn::Half => (src_w - 1 - sx, src_h - 1 - sy),
                QuarterTurn::Cw270 => (sy, src_w - 1 - sx),
                QuarterTurn::None => (sx, sy),
            };
            let src = (sy * src_w + sx) * 4;
            let dst = (dy * dst_w + dx) * 4;
            output[dst..dst + 4].copy_from_slice(&image.pixels[src..src + 4]);
        }
    }

    DecodedImage::new(dst_w as u32, dst_h as u32, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x2 image whose red channel is the pixel index.
    fn indexed_image() -> DecodedImage {
        let pixels = (0u8..6).flat_map(|i| [i, 0, 0, 255]).collect();
        DecodedImage::new(3, 2, pixels)
    }

    fn reds(img: &DecodedImage) -> Vec<u8> {
        img.pixels.chunks(4).map(|p| p[0]).collect()
    }

    #[test]
    fn test_quarter_turn_from_degrees() {
        assert_eq!(QuarterTurn::from_degrees(0.0), QuarterTurn::None);
        assert_eq!(QuarterTurn::from_degrees(90.0), QuarterTurn::Cw90);
        assert_eq!(QuarterTurn::from_degrees(-90.0), QuarterTurn::Cw270);
        assert_eq!(QuarterTurn::from_degrees(540.0), QuarterTurn::Half);
        assert_eq!(QuarterTurn::from_degrees(89.6), QuarterTurn::Cw90);
    }

    #[test]
    fn test_rotated_dimensions() {
        assert_eq!(rotated_dimensions(100, 50, 90.0), (50, 100));
        assert_eq!(rotated_dimensions(100, 50, 180.0), (100, 50));
        assert_eq!(rotated_dimensions(100, 50, 270.0), (50, 100));
    }

    #[test]
    fn test_rotate_90() {
        // 0 1 2        3 0
        // 3 4 5   ->   4 1
        //              5 2
        let result = rotate_quarter_turns(&indexed_image(), 90.0);
        assert_eq!((result.width, result.height), (2, 3));
        assert_eq!(reds(&result), vec![3, 0, 4, 1, 5, 2]);
    }

    #[test]
    fn test_rotate_180() {
        let result = rotate_quarter_turns(&indexed_image(), 180.0);
        assert_eq!((result.width, result.height), (3, 2));
        assert_eq!(reds(&result), vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_rotate_270() {
        let result = rotate_quarter_turns(&indexed_image(), 270.0);
        assert_eq!((result.width, result.height), (2, 3));
        assert_eq!(reds(&result), vec![2, 5, 1, 4, 0, 3]);
    }

    #[test]
    fn test_four_turns_is_identity() {
        let img = indexed_image();
        let mut rotated = img.clone();
        for _ in 0..4 {
            rotated = rotate_quarter_turns(&rotated, 90.0);
        }
        assert_eq!(rotated, img);
    }
}
