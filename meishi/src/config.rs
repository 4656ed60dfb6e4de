use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub preprocess: PreprocessConfig,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub model: String,
    pub base_url: Option<String>,
    pub languages: String,
    pub timeout_secs: u64,
    pub min_image_dimension: u32,
}

/// Image-normalization thresholds.
///
/// Every constant here is empirically tuned on real card photos rather than
/// derived from first principles, so they are surfaced as configuration with
/// the tuned values as defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessConfig {
    /// Shorter-side floor in pixels; smaller inputs are upscaled to this.
    pub upscale_floor_px: u32,
    /// Detected lines steeper than this (degrees from horizontal) are
    /// discarded as non-text edges.
    pub max_line_angle_degrees: f32,
    /// Minimum qualifying lines before the line-based estimate is trusted.
    pub min_line_count: usize,
    /// Minimum foreground pixels before the bounding-box fallback is trusted.
    pub min_foreground_pixels: usize,
    /// Rotation is clamped to this magnitude in degrees.
    pub max_rotation_degrees: f32,
    /// Rotation below this magnitude in degrees is skipped entirely.
    pub min_rotation_degrees: f32,
    /// CLAHE contrast clip limit.
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid size (grid × grid tiles).
    pub clahe_grid_size: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            upscale_floor_px: 1200,
            max_line_angle_degrees: 25.0,
            min_line_count: 6,
            min_foreground_pixels: 2000,
            max_rotation_degrees: 15.0,
            min_rotation_degrees: 0.2,
            clahe_clip_limit: 2.0,
            clahe_grid_size: 8,
        }
    }
}

/// LLM configuration for the contact field-extraction step
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_output_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("MEISHI_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("MEISHI_PORT", 3000),
                api_keys: env::var("MEISHI_API_KEYS")
                    .map(|keys| keys.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default(),
                max_upload_bytes: parse_env_or("MEISHI_MAX_UPLOAD_BYTES", 25 * 1024 * 1024),
            },
            ocr: OcrConfig {
                model: env::var("OCR_MODEL").unwrap_or_else(|_| "local/tesseract".to_string()),
                base_url: env::var("OCR_BASE_URL").ok(),
                languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "jpn+eng".to_string()),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 60),
                min_image_dimension: parse_env_or("OCR_MIN_DIMENSION", 50),
            },
            preprocess: PreprocessConfig {
                upscale_floor_px: parse_env_or("PREPROCESS_UPSCALE_FLOOR", 1200),
                max_line_angle_degrees: parse_env_or("PREPROCESS_MAX_LINE_ANGLE", 25.0),
                min_line_count: parse_env_or("PREPROCESS_MIN_LINE_COUNT", 6),
                min_foreground_pixels: parse_env_or("PREPROCESS_MIN_FOREGROUND_PIXELS", 2000),
                max_rotation_degrees: parse_env_or("PREPROCESS_MAX_ROTATION", 15.0),
                min_rotation_degrees: parse_env_or("PREPROCESS_MIN_ROTATION", 0.2),
                clahe_clip_limit: parse_env_or("PREPROCESS_CLAHE_CLIP", 2.0),
                clahe_grid_size: parse_env_or("PREPROCESS_CLAHE_GRID", 8),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                max_output_tokens: parse_env_or("LLM_MAX_OUTPUT_TOKENS", 1024),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_server_config_defaults() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("MEISHI_HOST");
        std::env::remove_var("MEISHI_PORT");
        std::env::remove_var("MEISHI_API_KEYS");

        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.api_keys.is_empty());
        assert_eq!(config.server.max_upload_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn test_ocr_config_defaults() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("OCR_MODEL");
        std::env::remove_var("OCR_LANGUAGES");

        let config = Config::default();
        assert_eq!(config.ocr.model, "local/tesseract");
        assert!(config.ocr.base_url.is_none());
        assert_eq!(config.ocr.languages, "jpn+eng");
        assert_eq!(config.ocr.timeout_secs, 60);
    }

    #[test]
    fn test_preprocess_config_defaults() {
        let defaults = PreprocessConfig::default();
        assert_eq!(defaults.upscale_floor_px, 1200);
        assert_eq!(defaults.max_line_angle_degrees, 25.0);
        assert_eq!(defaults.min_line_count, 6);
        assert_eq!(defaults.min_foreground_pixels, 2000);
        assert_eq!(defaults.max_rotation_degrees, 15.0);
        assert_eq!(defaults.min_rotation_degrees, 0.2);
        assert_eq!(defaults.clahe_clip_limit, 2.0);
        assert_eq!(defaults.clahe_grid_size, 8);
    }

    #[test]
    fn test_preprocess_config_from_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::set_var("PREPROCESS_UPSCALE_FLOOR", "800");
        std::env::set_var("PREPROCESS_MAX_ROTATION", "10.0");

        let config = Config::default();
        assert_eq!(config.preprocess.upscale_floor_px, 800);
        assert_eq!(config.preprocess.max_rotation_degrees, 10.0);

        std::env::remove_var("PREPROCESS_UPSCALE_FLOOR");
        std::env::remove_var("PREPROCESS_MAX_ROTATION");
    }

    #[test]
    fn test_llm_config_absent_without_model() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("LLM_MODEL");
        let config = Config::default();
        assert!(config.llm.is_none());
    }

    #[test]
    fn test_llm_config_from_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::set_var("LLM_MODEL", "openai/gpt-4o-mini");
        std::env::set_var("LLM_TIMEOUT", "10");

        let config = Config::default();
        let llm = config.llm.expect("LLM config should be present");
        assert_eq!(llm.model, "openai/gpt-4o-mini");
        assert_eq!(llm.timeout_secs, 10);
        assert_eq!(llm.max_output_tokens, 1024);

        std::env::remove_var("LLM_MODEL");
        std::env::remove_var("LLM_TIMEOUT");
    }

    #[test]
    fn test_parse_llm_provider_model() {
        assert_eq!(
            parse_llm_provider_model("openai/gpt-4o-mini"),
            ("openai", "gpt-4o-mini")
        );
        assert_eq!(
            parse_llm_provider_model("ollama/llama3.2"),
            ("ollama", "llama3.2")
        );
        assert_eq!(
            parse_llm_provider_model("unknown-model"),
            ("local", "unknown-model")
        );
    }

    #[test]
    fn test_parse_env_or_invalid_value_falls_back() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::set_var("__TEST_MEISHI_PORT", "not-a-number");
        let result: u16 = parse_env_or("__TEST_MEISHI_PORT", 3000);
        assert_eq!(result, 3000);
        std::env::remove_var("__TEST_MEISHI_PORT");
    }
}
