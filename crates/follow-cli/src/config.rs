//! Settings file – reads/writes `~/.follow/config.toml`.
//!
//! Every section and field is optional; anything missing takes its default.
//!
//! ```toml
//! [brain]
//! base_speed = 13
//! turn_delta = 10
//!
//! [brain.bands]
//! left_ratio = 0.35
//! center_ratio = 0.30
//! right_ratio = 0.35
//!
//! [detector]
//! confidence_threshold = 0.7
//! detect_every_n_frames = 3
//! model_path = "models/person_ssd.onnx"
//!
//! [camera]
//! rotate_180 = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use follow_perception::SsdPostprocessor;
use follow_perception::ZoneClassifier;
use follow_perception::ssd::VOC_PERSON_CLASS;
use follow_types::{BrainConfig, ZoneBands};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Detector post-processing and cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Minimum confidence for a person row to count.
    pub confidence_threshold: f32,
    /// Class id of "person" in the model's label map.
    pub person_class_id: u32,
    /// Run inference on every N-th frame only.
    pub detect_every_n_frames: u32,
    /// SSD model to run.  Without one, `run` uses the scripted detector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    /// Network input size in pixels.
    pub input_width: u32,
    pub input_height: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            person_class_id: VOC_PERSON_CLASS,
            detect_every_n_frames: 3,
            model_path: None,
            input_width: 300,
            input_height: 300,
        }
    }
}

impl DetectorSettings {
    /// Post-processor applying this section's threshold and person class,
    /// classifying into `bands`.
    pub fn postprocessor(&self, bands: ZoneBands) -> SsdPostprocessor {
        SsdPostprocessor {
            confidence_threshold: self.confidence_threshold,
            person_class: self.person_class_id,
            classifier: ZoneClassifier::new(bands),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// The camera is mounted upside down.
    pub rotate_180: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
            rotate_180: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Pause between control-loop iterations.
    pub loop_sleep_ms: u64,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self { loop_sleep_ms: 10 }
    }
}

/// Persisted settings stored in `~/.follow/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub brain: BrainConfig,
    pub detector: DetectorSettings,
    pub camera: CameraSettings,
    pub control: ControlSettings,
}

impl Config {
    /// Check every section.  Called once at startup; a failure aborts the
    /// run before any hardware is touched.
    pub fn validate(&self) -> Result<(), String> {
        self.brain
            .validate()
            .map_err(|e| format!("[brain] {e}"))?;
        if self.detector.detect_every_n_frames == 0 {
            return Err("[detector] detect_every_n_frames must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(format!(
                "[detector] confidence_threshold must be within 0..=1, got {}",
                self.detector.confidence_threshold
            ));
        }
        if self.detector.input_width == 0 || self.detector.input_height == 0 {
            return Err(format!(
                "[detector] input size must be non-zero, got {}x{}",
                self.detector.input_width, self.detector.input_height
            ));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(format!(
                "[camera] frame size must be non-zero, got {}x{}",
                self.camera.width, self.camera.height
            ));
        }
        if self.camera.fps == 0 {
            return Err("[camera] fps must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Return the path to `~/.follow/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".follow").join("config.toml")
}

/// Load `path` (or the defaults when it is absent) and apply environment
/// overrides.  This is what the binary runs with.
pub fn load_effective(path: &Path) -> Result<Config, String> {
    let mut cfg = load_from(path)?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `FOLLOW_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `FOLLOW_BASE_SPEED` | `brain.base_speed` |
/// | `FOLLOW_TURN_DELTA` | `brain.turn_delta` |
/// | `FOLLOW_SEARCH_SPIN_SPEED` | `brain.search_spin_speed` |
/// | `FOLLOW_MEMORY_SECONDS` | `brain.memory_seconds` |
/// | `FOLLOW_CONFIDENCE_THRESHOLD` | `detector.confidence_threshold` |
/// | `FOLLOW_DETECT_EVERY_N` | `detector.detect_every_n_frames` |
///
/// Values that do not parse are ignored with a warning.
pub fn apply_env_overrides(cfg: &mut Config) {
    override_from_env("FOLLOW_BASE_SPEED", &mut cfg.brain.base_speed);
    override_from_env("FOLLOW_TURN_DELTA", &mut cfg.brain.turn_delta);
    override_from_env("FOLLOW_SEARCH_SPIN_SPEED", &mut cfg.brain.search_spin_speed);
    override_from_env("FOLLOW_MEMORY_SECONDS", &mut cfg.brain.memory_seconds);
    override_from_env(
        "FOLLOW_CONFIDENCE_THRESHOLD",
        &mut cfg.detector.confidence_threshold,
    );
    override_from_env(
        "FOLLOW_DETECT_EVERY_N",
        &mut cfg.detector.detect_every_n_frames,
    );
}

fn override_from_env<T: std::str::FromStr>(var: &str, field: &mut T) {
    let Ok(raw) = std::env::var(var) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => *field = v,
        Err(_) => warn!(var, value = %raw, "ignoring unparsable override"),
    }
}

/// Write `cfg` to `path`, creating the parent directory if necessary.  On
/// Unix the directory is owner-only (0o700) and the file 0o600.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.brain.base_speed, 13);
        assert_eq!(cfg.detector.person_class_id, 15);
        assert_eq!(cfg.detector.detect_every_n_frames, 3);
        assert_eq!((cfg.camera.width, cfg.camera.height), (640, 480));
        assert_eq!(cfg.control.loop_sleep_ms, 10);
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, Config::default());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[brain]\nbase_speed = 20\n\n[camera]\nrotate_180 = true\n",
        )
        .unwrap();

        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.brain.base_speed, 20);
        assert_eq!(cfg.brain.turn_delta, 10);
        assert!(cfg.camera.rotate_180);
        assert_eq!(cfg.camera.width, 640);
        assert_eq!(cfg.detector, DetectorSettings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[brain\nbase_speed = ").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(err.contains("parse"), "got: {err}");
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn config_path_points_to_follow_dir() {
        let p = config_path_for_home("/home/testuser");
        assert_eq!(p, PathBuf::from("/home/testuser/.follow/config.toml"));
    }

    #[test]
    fn validate_reports_section() {
        let mut cfg = Config::default();
        cfg.brain.turn_delta = 50;
        assert!(cfg.validate().unwrap_err().starts_with("[brain]"));

        let mut cfg = Config::default();
        cfg.detector.detect_every_n_frames = 0;
        assert!(cfg.validate().unwrap_err().starts_with("[detector]"));

        let mut cfg = Config::default();
        cfg.detector.confidence_threshold = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.camera.height = 0;
        assert!(cfg.validate().unwrap_err().starts_with("[camera]"));
    }

    #[test]
    fn postprocessor_uses_detector_settings() {
        let mut cfg = Config::default();
        cfg.detector.confidence_threshold = 0.4;
        cfg.detector.person_class_id = 1;
        let pp = cfg.detector.postprocessor(cfg.brain.bands);
        assert_eq!(pp.confidence_threshold, 0.4);
        assert_eq!(pp.person_class, 1);

        // A COCO-style person row at 0.5 passes only with these settings.
        let ev = pp.event(&[[0.0, 1.0, 0.5, 0.0, 0.0, 0.25, 1.0]], 640, 480);
        assert!(ev.found);
        let default_pp = DetectorSettings::default().postprocessor(ZoneBands::default());
        let ev = default_pp.event(&[[0.0, 1.0, 0.5, 0.0, 0.0, 0.25, 1.0]], 640, 480);
        assert!(!ev.found);
    }

    #[test]
    fn model_path_is_read_from_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[detector]\nmodel_path = \"models/person_ssd.onnx\"\ninput_width = 320\n",
        )
        .unwrap();
        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(
            cfg.detector.model_path,
            Some(PathBuf::from("models/person_ssd.onnx"))
        );
        assert_eq!((cfg.detector.input_width, cfg.detector.input_height), (320, 300));
    }

    #[test]
    fn zero_input_size_is_rejected() {
        let mut cfg = Config::default();
        cfg.detector.input_height = 0;
        assert!(cfg.validate().unwrap_err().starts_with("[detector]"));
    }

    // Each env test owns a distinct variable so they can run in parallel.

    #[test]
    fn apply_env_overrides_changes_base_speed() {
        // SAFETY: only this test touches FOLLOW_BASE_SPEED.
        unsafe { std::env::set_var("FOLLOW_BASE_SPEED", "20") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.brain.base_speed, 20);
        unsafe { std::env::remove_var("FOLLOW_BASE_SPEED") };
    }

    #[test]
    fn apply_env_overrides_changes_memory_seconds() {
        // SAFETY: only this test touches FOLLOW_MEMORY_SECONDS.
        unsafe { std::env::set_var("FOLLOW_MEMORY_SECONDS", "1.5") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.brain.memory_seconds, 1.5);
        unsafe { std::env::remove_var("FOLLOW_MEMORY_SECONDS") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_value() {
        // SAFETY: only this test touches FOLLOW_DETECT_EVERY_N.
        unsafe { std::env::set_var("FOLLOW_DETECT_EVERY_N", "often") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.detector.detect_every_n_frames, 3);
        unsafe { std::env::remove_var("FOLLOW_DETECT_EVERY_N") };
    }

    #[test]
    fn load_effective_applies_overrides_without_file() {
        // SAFETY: only this test touches FOLLOW_CONFIDENCE_THRESHOLD.
        unsafe { std::env::set_var("FOLLOW_CONFIDENCE_THRESHOLD", "0.5") };
        let dir = tempfile::tempdir().expect("tmp dir");
        let cfg = load_effective(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(cfg.detector.confidence_threshold, 0.5);
        unsafe { std::env::remove_var("FOLLOW_CONFIDENCE_THRESHOLD") };
    }
}
