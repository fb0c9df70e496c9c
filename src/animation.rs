//! Reveal animation composer
//!
//! Assembles a looping GIF from the local placeholder frames ("frozen",
//! "cracking", "cracked further") followed by the downloaded final artwork.
//! The final frame holds longer than all placeholders combined so it
//! dominates the loop.
//!
//! Composition degrades softly: missing placeholder files are skipped, a
//! failed download drops the final frame, and any encode failure yields
//! `None` so the caller can fall back to a static image.

use crate::logger::{self, LogTag};
use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::{self, FilterType};
use image::{Delay, Frame, RgbaImage};
use std::path::Path;

/// Placeholder frames in display order, with per-frame duration in ms
const PLACEHOLDER_FRAMES: [(&str, u32); 3] = [
    ("ice2.png", 1000),
    ("crack2.png", 1000),
    ("crack3.png", 1000),
];

/// Final reveal frame duration: longer than all placeholders combined
const FINAL_FRAME_DURATION_MS: u32 = 5000;

/// Compose the reveal GIF for one token.
///
/// Returns the encoded GIF bytes, or `None` when fewer than two frames are
/// available or encoding fails.
pub async fn compose_reveal_gif(
    http: &reqwest::Client,
    images_dir: &Path,
    final_image_url: Option<&str>,
    token_id: u64,
) -> Option<Vec<u8>> {
    let mut frames: Vec<(RgbaImage, u32)> = Vec::new();

    for (name, duration_ms) in PLACEHOLDER_FRAMES {
        let path = images_dir.join(name);
        if !path.exists() {
            logger::debug(
                LogTag::Animation,
                &format!("placeholder {} missing, skipping", path.display()),
            );
            continue;
        }
        match image::open(&path) {
            Ok(img) => frames.push((img.to_rgba8(), duration_ms)),
            Err(e) => logger::warning(
                LogTag::Animation,
                &format!("failed to decode placeholder {}: {}", path.display(), e),
            ),
        }
    }

    if let Some(url) = final_image_url {
        match download_final_frame(http, url).await {
            Ok(img) => frames.push((img, FINAL_FRAME_DURATION_MS)),
            Err(e) => logger::warning(
                LogTag::Animation,
                &format!("token #{}: final image unavailable: {}", token_id, e),
            ),
        }
    }

    if frames.len() < 2 {
        logger::warning(
            LogTag::Animation,
            &format!(
                "token #{}: only {} frame(s) available, no animation",
                token_id,
                frames.len()
            ),
        );
        return None;
    }

    match encode_gif(frames) {
        Ok(buffer) => Some(buffer),
        Err(e) => {
            logger::error(
                LogTag::Animation,
                &format!("token #{}: GIF encoding failed: {}", token_id, e),
            );
            None
        }
    }
}

async fn download_final_frame(http: &reqwest::Client, url: &str) -> Result<RgbaImage, String> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| format!("download failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("body read failed: {}", e))?;

    image::load_from_memory(&bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| format!("decode failed: {}", e))
}

/// Encode frames into one infinitely looping GIF. Every frame is resized to
/// the first frame's dimensions; mismatched aspect ratios distort rather
/// than abort.
fn encode_gif(frames: Vec<(RgbaImage, u32)>) -> Result<Vec<u8>, String> {
    let (width, height) = frames[0].0.dimensions();
    let mut buffer = Vec::new();

    {
        let mut encoder = GifEncoder::new(&mut buffer);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| e.to_string())?;

        for (img, duration_ms) in frames {
            let img = if img.dimensions() == (width, height) {
                img
            } else {
                imageops::resize(&img, width, height, FilterType::Lanczos3)
            };
            let frame = Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(duration_ms, 1));
            encoder.encode_frame(frame).map_err(|e| e.to_string())?;
        }
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::AnimationDecoder;
    use std::io::Cursor;

    fn write_placeholder(dir: &Path, name: &str, width: u32, height: u32) {
        let mut img = RgbaImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgba([120, 180, 240, 255]);
        }
        img.save(dir.join(name)).unwrap();
    }

    fn decode_frames(buffer: &[u8]) -> Vec<image::Frame> {
        let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(buffer)).unwrap();
        decoder.into_frames().collect_frames().unwrap()
    }

    #[tokio::test]
    async fn two_placeholders_compose_without_final_image() {
        let dir = tempfile::tempdir().unwrap();
        write_placeholder(dir.path(), "ice2.png", 16, 16);
        write_placeholder(dir.path(), "crack2.png", 16, 16);

        let http = reqwest::Client::new();
        let buffer = compose_reveal_gif(&http, dir.path(), None, 101)
            .await
            .expect("two frames should compose");

        let frames = decode_frames(&buffer);
        assert_eq!(frames.len(), 2);

        let total_ms: u32 = frames
            .iter()
            .map(|f| {
                let (numer, denom) = f.delay().numer_denom_ms();
                numer / denom
            })
            .sum();
        assert_eq!(total_ms, 2000);
    }

    #[tokio::test]
    async fn single_frame_aborts_composition() {
        let dir = tempfile::tempdir().unwrap();
        write_placeholder(dir.path(), "ice2.png", 16, 16);

        let http = reqwest::Client::new();
        assert!(compose_reveal_gif(&http, dir.path(), None, 101)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn no_frames_aborts_composition() {
        let dir = tempfile::tempdir().unwrap();
        let http = reqwest::Client::new();
        assert!(compose_reveal_gif(&http, dir.path(), None, 101)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn mismatched_frame_sizes_are_resized_to_first() {
        let dir = tempfile::tempdir().unwrap();
        write_placeholder(dir.path(), "ice2.png", 16, 16);
        write_placeholder(dir.path(), "crack2.png", 32, 8);
        write_placeholder(dir.path(), "crack3.png", 16, 16);

        let http = reqwest::Client::new();
        let buffer = compose_reveal_gif(&http, dir.path(), None, 101)
            .await
            .unwrap();

        let frames = decode_frames(&buffer);
        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert_eq!(frame.buffer().dimensions(), (16, 16));
        }
    }
}
