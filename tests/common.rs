#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use workout_images::{ObjectStorage, PutOptions, StorageError, StoredObject};

/// Deterministic pseudo-random RGB noise; compresses poorly on purpose
pub fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9E37_79B9;
    let img = RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xFF) as u8
        };
        image::Rgb([next(), next(), next()])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Store that fails every call and counts how often it was reached
#[derive(Default)]
pub struct FailingStorage {
    pub puts: AtomicUsize,
    pub removes: AtomicUsize,
}

impl FailingStorage {
    pub fn calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst) + self.removes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for FailingStorage {
    async fn put(
        &self,
        _bucket: &str,
        _key: &str,
        _data: Bytes,
        _options: &PutOptions,
    ) -> Result<StoredObject, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Backend("quota exceeded".to_string()))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://failing.example.com/{}/{}", bucket, key)
    }

    async fn remove(&self, _bucket: &str, _keys: &[String]) -> Result<(), StorageError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Backend("network unreachable".to_string()))
    }
}
