// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Evaluation configuration system
//!
//! Values come from, in increasing priority: built-in defaults, a TOML file
//! (`recon-eval.toml` in the working directory unless one is named
//! explicitly), `RECON_EVAL_*` environment variables, and finally CLI flags
//! applied by the binaries.

use crate::error::EvalError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up by [`EvalConfig::load`]
pub const CONFIG_FILE: &str = "recon-eval.toml";

/// Settings for the precision/recall evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Voxel edge for downsampling both clouds; non-positive disables it
    pub voxel_size: f32,
    /// Distance at which a point counts as matched
    pub threshold: f32,
    /// Plot range as a multiple of the threshold
    pub plot_stretch: f32,
    /// Seed for ground-truth surface sampling
    pub seed: u64,
    /// Write distance-colored point clouds next to the plots
    pub write_colored_clouds: bool,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            voxel_size: 0.05,
            threshold: 0.1,
            plot_stretch: 3.0,
            seed: 0,
            write_colored_clouds: true,
        }
    }
}

impl GeometryConfig {
    pub fn validate(&self) -> Result<(), EvalError> {
        crate::evaluation::precision_recall::check_parameters(self.threshold, self.plot_stretch)?;
        if self.voxel_size.is_nan() {
            return Err(EvalError::invalid("voxel_size", "must be a number"));
        }
        Ok(())
    }
}

/// Compute device for the perceptual network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Cpu,
    Cuda,
    Metal,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Cpu => "cpu",
            DeviceKind::Cuda => "cuda",
            DeviceKind::Metal => "metal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Some(DeviceKind::Cpu),
            "cuda" => Some(DeviceKind::Cuda),
            "metal" => Some(DeviceKind::Metal),
            _ => None,
        }
    }

    /// Open the device. CUDA and Metal need the matching cargo feature.
    pub fn open(&self, ordinal: usize) -> Result<candle_core::Device> {
        let device = match self {
            DeviceKind::Cpu => candle_core::Device::Cpu,
            DeviceKind::Cuda => candle_core::Device::new_cuda(ordinal)
                .with_context(|| format!("Failed to open CUDA device {}", ordinal))?,
            DeviceKind::Metal => candle_core::Device::new_metal(ordinal)
                .with_context(|| format!("Failed to open Metal device {}", ordinal))?,
        };
        Ok(device)
    }
}

/// Settings for the image metric evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// LPIPS weights in safetensors format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lpips_weights: Option<PathBuf>,
    pub device: DeviceKind,
    pub device_ordinal: usize,
    /// SSIM window edge (odd)
    pub ssim_window: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            lpips_weights: None,
            device: DeviceKind::Cpu,
            device_ordinal: 0,
            ssim_window: 7,
        }
    }
}

/// Full configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub geometry: GeometryConfig,
    pub images: ImageConfig,
}

impl EvalConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EvalConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `path` (or `recon-eval.toml` when present), then apply
    /// environment variable overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `RECON_EVAL_*` overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(weights) = lookup("RECON_EVAL_LPIPS_WEIGHTS") {
            self.images.lpips_weights = Some(PathBuf::from(weights));
        }

        if let Some(device) = lookup("RECON_EVAL_DEVICE") {
            match DeviceKind::from_str(&device) {
                Some(kind) => self.images.device = kind,
                None => tracing::warn!(value = %device, "ignoring unknown RECON_EVAL_DEVICE"),
            }
        }

        if let Some(seed) = lookup("RECON_EVAL_SEED") {
            match seed.parse() {
                Ok(seed) => self.geometry.seed = seed,
                Err(_) => tracing::warn!(value = %seed, "ignoring unparsable RECON_EVAL_SEED"),
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_cli() {
        let config = EvalConfig::default();
        assert_eq!(config.geometry.voxel_size, 0.05);
        assert_eq!(config.geometry.threshold, 0.1);
        assert_eq!(config.geometry.plot_stretch, 3.0);
        assert_eq!(config.images.device, DeviceKind::Cpu);
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("eval.toml");
        std::fs::write(&path, "[geometry]\nthreshold = 0.02\n\n[images]\ndevice = \"cuda\"\n")?;

        let config = EvalConfig::from_file(&path)?;
        assert_eq!(config.geometry.threshold, 0.02);
        assert_eq!(config.geometry.voxel_size, 0.05);
        assert_eq!(config.images.device, DeviceKind::Cuda);
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("eval.toml");
        let mut config = EvalConfig::default();
        config.geometry.seed = 11;
        config.images.lpips_weights = Some(PathBuf::from("weights/alex.safetensors"));

        config.save(&path)?;
        assert_eq!(EvalConfig::from_file(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EvalConfig::default();
        config.apply_env(|key| match key {
            "RECON_EVAL_DEVICE" => Some("Metal".to_string()),
            "RECON_EVAL_LPIPS_WEIGHTS" => Some("/tmp/lpips.safetensors".to_string()),
            "RECON_EVAL_SEED" => Some("9".to_string()),
            _ => None,
        });

        assert_eq!(config.images.device, DeviceKind::Metal);
        assert_eq!(
            config.images.lpips_weights.as_deref(),
            Some(Path::new("/tmp/lpips.safetensors"))
        );
        assert_eq!(config.geometry.seed, 9);
    }

    #[test]
    fn test_unparsable_env_values_keep_current_settings() {
        let mut config = EvalConfig::default();
        config.geometry.seed = 4;
        config.apply_env(|key| match key {
            "RECON_EVAL_DEVICE" => Some("tpu".to_string()),
            "RECON_EVAL_SEED" => Some("not-a-number".to_string()),
            _ => None,
        });

        assert_eq!(config.geometry.seed, 4);
        assert_eq!(config.images.device, DeviceKind::Cpu);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let config = GeometryConfig {
            threshold: -1.0,
            ..GeometryConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
