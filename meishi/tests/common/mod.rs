use image::{Rgb, RgbImage};
use serde_json::json;

/// Encode a synthetic card photo: light background with dark text-like bars.
pub fn card_png(width: u32, height: u32) -> Vec<u8> {
    let mut img = RgbImage::from_pixel(width, height, Rgb([245, 245, 240]));
    for y in (height / 5..height - height / 5).step_by(20) {
        for x in width / 10..width - width / 10 {
            for dy in 0..3 {
                if y + dy < height {
                    img.put_pixel(x, y + dy, Rgb([30, 30, 30]));
                }
            }
        }
    }
    encode_png(img)
}

/// Encode a flat single-color image.
pub fn blank_png(width: u32, height: u32) -> Vec<u8> {
    encode_png(RgbImage::from_pixel(width, height, Rgb([200, 200, 200])))
}

fn encode_png(img: RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("Failed to encode fixture PNG");
    bytes
}

pub const MULTIPART_BOUNDARY: &str = "meishi-test-boundary";

/// Build a multipart/form-data body with a `file` part and an optional
/// `extract` field.
pub fn multipart_body(file: Option<&[u8]>, extract: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(bytes) = file {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"card.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(value) = extract {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"extract\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}")
}

/// Wire shape of the remote recognition server's response.
pub fn recognition_body(lines: &[(&str, f32)]) -> serde_json::Value {
    json!({
        "blocks": lines
            .iter()
            .map(|(text, confidence)| json!({"text": text, "confidence": confidence}))
            .collect::<Vec<_>>()
    })
}

/// Wire shape of an OpenAI-compatible chat completion response.
pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}
