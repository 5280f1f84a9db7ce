//! 品牌滤镜：轻微提饱和与亮度、柔化对比、暖金色叠加、柔光，可选右下角 Logo 水印，输出 PNG
//!
//! 纯 CPU 计算，调用方应放在 spawn_blocking 中执行。

use std::io::Cursor;
use std::path::PathBuf;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image decode/encode failed: {0}")]
    Codec(#[from] image::ImageError),

    #[error("filter task failed: {0}")]
    Task(String),
}

/// 图片后处理接口
pub trait ImageEditor: Send + Sync {
    fn apply_brand_filter(&self, image: &[u8], add_logo: bool) -> Result<Vec<u8>, ImageError>;
}

const SATURATION: f32 = 1.05;
const BRIGHTNESS: f32 = 1.03;
const CONTRAST: f32 = 0.95;
const WARM_TINT: [f32; 3] = [255.0, 243.0, 224.0];
const WARM_ALPHA: f32 = 0.06;
const GLOW_SIGMA: f32 = 2.0;
const GLOW_ALPHA: f32 = 0.08;
const LOGO_OPACITY: f32 = 0.6;
const LOGO_PADDING: u32 = 20;

/// 品牌滤镜实现；logo_path 缺失或无法读取时跳过水印
#[derive(Debug, Clone, Default)]
pub struct BrandFilter {
    logo_path: Option<PathBuf>,
}

impl BrandFilter {
    pub fn new(logo_path: Option<PathBuf>) -> Self {
        Self { logo_path }
    }

    fn load_logo(&self) -> Option<RgbaImage> {
        let path = self.logo_path.as_ref()?;
        if !path.exists() {
            return None;
        }
        match image::open(path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load logo, skipping watermark"
                );
                None
            }
        }
    }
}

impl ImageEditor for BrandFilter {
    fn apply_brand_filter(&self, image: &[u8], add_logo: bool) -> Result<Vec<u8>, ImageError> {
        let mut img = image::load_from_memory(image)?.to_rgb8();
        tone(&mut img);

        let blurred = imageops::blur(&img, GLOW_SIGMA);
        for (p, b) in img.pixels_mut().zip(blurred.pixels()) {
            for c in 0..3 {
                p.0[c] = mix(p.0[c] as f32, b.0[c] as f32, GLOW_ALPHA);
            }
        }

        let logo = if add_logo { self.load_logo() } else { None };
        let output = match logo {
            Some(logo) => {
                let mut canvas = DynamicImage::ImageRgb8(img).to_rgba8();
                watermark(&mut canvas, &logo);
                DynamicImage::ImageRgba8(canvas).to_rgb8()
            }
            None => img,
        };

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(output).write_to(&mut cursor, ImageFormat::Png)?;
        Ok(cursor.into_inner())
    }
}

fn mix(a: f32, b: f32, alpha: f32) -> u8 {
    clamp(a * (1.0 - alpha) + b * alpha)
}

fn clamp(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn luma(p: &Rgb<u8>) -> f32 {
    0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32
}

/// 饱和度、亮度、对比度（围绕平均亮度）与暖色叠加
fn tone(img: &mut RgbImage) {
    let count = (img.width() as f32 * img.height() as f32).max(1.0);
    let mean = img.pixels().map(luma).sum::<f32>() / count;

    for p in img.pixels_mut() {
        let l = luma(p);
        for c in 0..3 {
            let mut v = p.0[c] as f32;
            v = l + (v - l) * SATURATION;
            v *= BRIGHTNESS;
            v = mean + (v - mean) * CONTRAST;
            p.0[c] = mix(v.clamp(0.0, 255.0), WARM_TINT[c], WARM_ALPHA);
        }
    }
}

/// Logo 缩放到图宽的 1/10，按透明度叠加在右下角
fn watermark(canvas: &mut RgbaImage, logo: &RgbaImage) {
    let logo_w = (canvas.width() / 10).max(1);
    let scale = logo_w as f32 / logo.width().max(1) as f32;
    let logo_h = ((logo.height() as f32 * scale) as u32).max(1);
    let mut logo = imageops::resize(logo, logo_w, logo_h, FilterType::Lanczos3);
    for p in logo.pixels_mut() {
        p.0[3] = clamp(p.0[3] as f32 * LOGO_OPACITY);
    }
    let x = canvas.width().saturating_sub(logo_w + LOGO_PADDING);
    let y = canvas.height().saturating_sub(logo_h + LOGO_PADDING);
    imageops::overlay(canvas, &logo, x as i64, y as i64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_filter_keeps_size_and_warms_tone() {
        let filter = BrandFilter::new(None);
        let out = filter
            .apply_brand_filter(&png(8, 6, [120, 120, 120]), true)
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 6));
        let p = decoded.get_pixel(4, 3);
        assert!(p.0[0] > p.0[2], "red should end above blue: {:?}", p);
    }

    #[test]
    fn test_invalid_bytes_are_an_error() {
        let filter = BrandFilter::new(None);
        assert!(filter.apply_brand_filter(b"not an image", false).is_err());
    }

    #[test]
    fn test_logo_watermark_applied_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let logo_path = dir.path().join("logo.png");
        let logo = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));
        DynamicImage::ImageRgba8(logo).save(&logo_path).unwrap();

        let filter = BrandFilter::new(Some(logo_path));
        let source = png(100, 100, [200, 200, 200]);

        let plain = filter.apply_brand_filter(&source, false).unwrap();
        let marked = filter.apply_brand_filter(&source, true).unwrap();
        let plain = image::load_from_memory(&plain).unwrap().to_rgb8();
        let marked = image::load_from_memory(&marked).unwrap().to_rgb8();

        // logo 10x10 位于 (70, 70)
        let a = plain.get_pixel(75, 75);
        let b = marked.get_pixel(75, 75);
        assert!(b.0[2] as i32 - b.0[0] as i32 > a.0[2] as i32 - a.0[0] as i32);
        assert_eq!(plain.get_pixel(5, 5), marked.get_pixel(5, 5));
    }
}
