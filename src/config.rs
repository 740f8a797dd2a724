use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::source::FacingMode;

// ---------- Memory ----------
/// Largest ring the config may ask for (a week at one frame per second).
pub const MAX_CAPACITY: usize = 7 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    pub capture_cadence_ms: u64,
    pub retention_secs: u64,
    pub sample_stride: usize,
    /// Consecutive unavailable ticks before a stall is reported (0 = never).
    pub stall_after_ticks: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capture_cadence_ms: 3_000,
            retention_secs: 15 * 60,
            sample_stride: 5,
            stall_after_ticks: 10,
        }
    }
}

impl MemoryConfig {
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.capture_cadence_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Frames needed to cover the retention window at the capture cadence.
    /// Saturates at `MAX_CAPACITY`; `Config::validate` rejects anything above.
    pub fn capacity(&self) -> usize {
        let cadence_ms = self.capture_cadence_ms.max(1);
        let frames = self
            .retention_ms()
            .map_or(u64::MAX, |retention_ms| retention_ms / cadence_ms);
        frames.clamp(1, MAX_CAPACITY as u64) as usize
    }

    fn retention_ms(&self) -> Option<u64> {
        self.retention_secs.checked_mul(1_000)
    }
}

// ---------- Camera ----------
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub facing: FacingMode,
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
    /// Grabs without pixels right after a source opens.
    pub warmup_ticks: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::User,
            width: 640,
            height: 480,
            jpeg_quality: 60,
            warmup_ticks: 1,
        }
    }
}

// ---------- Answering ----------
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnswerConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

// ---------- API ----------
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "127.0.0.1:3010".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub memory: MemoryConfig,
    pub camera: CameraConfig,
    pub answer: AnswerConfig,
    pub api: ApiConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let memory = &self.memory;
        if memory.capture_cadence_ms == 0 {
            return Err(ConfigError::message("memory.capture_cadence_ms must be > 0"));
        }
        if memory.retention_secs == 0 {
            return Err(ConfigError::message("memory.retention_secs must be > 0"));
        }
        let Some(retention_ms) = memory.retention_ms() else {
            return Err(ConfigError::message(format!(
                "memory.retention_secs ({}) is out of range",
                memory.retention_secs
            )));
        };
        if retention_ms < memory.capture_cadence_ms {
            return Err(ConfigError::message(format!(
                "memory.retention_secs ({}s) is shorter than one capture cadence ({}ms)",
                memory.retention_secs, memory.capture_cadence_ms
            )));
        }
        let frames = retention_ms / memory.capture_cadence_ms;
        if frames > MAX_CAPACITY as u64 {
            return Err(ConfigError::message(format!(
                "memory.retention_secs / memory.capture_cadence_ms needs {} frames, at most {} allowed",
                frames, MAX_CAPACITY
            )));
        }
        if memory.sample_stride == 0 {
            return Err(ConfigError::message("memory.sample_stride must be >= 1"));
        }
        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(ConfigError::message(format!(
                "camera.jpeg_quality must be within 1..=100, got {}",
                self.camera.jpeg_quality
            )));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::message("camera.width and camera.height must be > 0"));
        }
        if self.api.enabled && self.api.bind.trim().is_empty() {
            return Err(ConfigError::message("api.bind must not be empty"));
        }
        Ok(())
    }
}

pub fn parse(text: &str) -> Result<Config, ConfigError> {
    let cfg: Config =
        toml::from_str(text).map_err(|e| ConfigError::with_context("parsing config", e))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let txt = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::with_context(format!("reading {}", path.display()), e))?;
    parse(&txt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.memory.capacity(), 300);
        assert_eq!(cfg.memory.cadence(), Duration::from_secs(3));
        assert_eq!(cfg.memory.retention(), Duration::from_secs(900));
        assert_eq!(cfg.camera.facing, FacingMode::User);
    }

    #[test]
    fn test_partial_sections() {
        let cfg = parse(
            r#"
            [memory]
            capture_cadence_ms = 1000
            retention_secs = 60

            [camera]
            facing = "environment"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.memory.capacity(), 60);
        assert_eq!(cfg.memory.sample_stride, 5);
        assert_eq!(cfg.camera.facing, FacingMode::Environment);
        assert_eq!(cfg.camera.jpeg_quality, 60);
    }

    #[test]
    fn test_capacity_rounds_down() {
        let memory = MemoryConfig {
            capture_cadence_ms: 7_000,
            retention_secs: 60,
            ..MemoryConfig::default()
        };
        assert_eq!(memory.capacity(), 8);
    }

    #[test]
    fn test_rejects_zero_cadence() {
        let err = parse("[memory]\ncapture_cadence_ms = 0").unwrap_err();
        assert!(err.to_string().contains("capture_cadence_ms"));
    }

    #[test]
    fn test_rejects_retention_shorter_than_cadence() {
        let err = parse("[memory]\ncapture_cadence_ms = 5000\nretention_secs = 2").unwrap_err();
        assert!(err.to_string().contains("retention_secs"));
    }

    #[test]
    fn test_rejects_bad_quality_and_stride() {
        assert!(parse("[camera]\njpeg_quality = 0").is_err());
        assert!(parse("[memory]\nsample_stride = 0").is_err());
    }

    #[test]
    fn test_rejects_unknown_facing_mode() {
        let err = parse("[camera]\nfacing = \"sideways\"").unwrap_err();
        assert!(err.to_string().starts_with("parsing config"));
    }

    #[test]
    fn test_rejects_overflowing_retention() {
        let err = parse("[memory]\nretention_secs = 100000000000000000\n").unwrap_err();
        assert!(err.to_string().contains("memory.retention_secs"));
    }

    #[test]
    fn test_rejects_oversized_window() {
        let err = parse("[memory]\nretention_secs = 1000000000000\ncapture_cadence_ms = 1\n")
            .unwrap_err();
        assert!(err.to_string().contains("at most"));

        let at_limit = format!(
            "[memory]\nretention_secs = {}\ncapture_cadence_ms = 1000\n",
            MAX_CAPACITY
        );
        assert_eq!(parse(&at_limit).unwrap().memory.capacity(), MAX_CAPACITY);
    }

    #[test]
    fn test_capacity_saturates_without_validation() {
        let memory = MemoryConfig {
            capture_cadence_ms: 1,
            retention_secs: u64::MAX,
            ..MemoryConfig::default()
        };
        assert_eq!(memory.capacity(), MAX_CAPACITY);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("/nonexistent/recall.toml").unwrap_err();
        assert!(err.to_string().contains("reading /nonexistent/recall.toml"));
    }
}
