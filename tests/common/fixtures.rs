use defectscan::{BinaryMask, Locator, Storage, StorageError};
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Creates an image filled with one color.
pub fn solid_image(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(width, height, color)
}

/// Creates a white canvas with filled black squares given as (x, y, size).
pub fn canvas_with_squares(width: u32, height: u32, squares: &[(u32, u32, u32)]) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let inside = squares
            .iter()
            .any(|&(sx, sy, size)| x >= sx && x < sx + size && y >= sy && y < sy + size);
        if inside { BLACK } else { WHITE }
    })
}

/// A deterministic, non-uniform test pattern.
pub fn pattern_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x * 7 + y * 13) % 256) as u8,
        ])
    })
}

/// Encodes an image as PNG bytes, as an upload would deliver it.
pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    defectscan::report::encode_png(img).expect("Failed to encode test image")
}

/// Builds a mask from (x, y) foreground coordinates.
pub fn mask_from_points(width: u32, height: u32, points: &[(u32, u32)]) -> BinaryMask {
    let mut img = GrayImage::new(width, height);
    for &(x, y) in points {
        img.put_pixel(x, y, Luma([255]));
    }
    BinaryMask::from_gray(img)
}

/// Builds a mask with filled rectangles given as (x, y, w, h).
pub fn mask_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> BinaryMask {
    BinaryMask::from_gray(GrayImage::from_fn(width, height, |x, y| {
        let inside = rects
            .iter()
            .any(|&(rx, ry, rw, rh)| x >= rx && x < rx + rw && y >= ry && y < ry + rh);
        if inside { Luma([255]) } else { Luma([0]) }
    }))
}

/// Storage that keeps objects in memory, for exercising the trait.
#[derive(Default)]
pub struct MemoryStorage {
    pub objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl Storage for MemoryStorage {
    fn save(&self, logical_name: &str, bytes: &[u8]) -> Result<Locator, StorageError> {
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(logical_name) {
            return Err(StorageError::AlreadyExists(logical_name.to_string()));
        }
        objects.insert(logical_name.to_string(), bytes.to_vec());
        Ok(Locator {
            name: logical_name.to_string(),
            path: PathBuf::from(logical_name),
            url: format!("mem://{}", logical_name),
        })
    }

    fn remove(&self, logical_name: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().remove(logical_name);
        Ok(())
    }
}
