//! Image normalization for the recognition engine.
//!
//! Card photos arrive small, skewed, and unevenly lit. This module turns a
//! decoded photo into something the recognition engine reads reliably:
//!
//! 1. Upscale when the shorter side is below the resolution floor
//! 2. Estimate the skew angle (detected lines, then a bounding-box fallback)
//! 3. Rotate about the center when the estimate is worth applying
//! 4. Equalize luminance contrast locally (CLAHE on the Y channel)
//!
//! The whole pass is best-effort: a sub-step that cannot produce a usable
//! estimate is skipped and the pipeline continues with the best image
//! computed so far. Normalization itself never fails.

mod normalize;

pub use normalize::normalize;
