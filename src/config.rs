//! Simulation configuration and error taxonomy
//!
//! [`SimConfig`] is the full user-facing knob surface; it deserializes
//! directly from a JS object on the Wasm side. [`SimParams`] holds the
//! quantities derived from it once (sample rate, time step, cell size, wall
//! impedance) that the rest of the crate consumes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Physical constants
// ============================================================================

/// Air density (kg/m^3).
pub const RHO: f32 = 1.140;
/// Speed of sound (m/s).
pub const C_SOUND: f32 = 350.0;
/// Wall reflection coefficient for the locally-reacting impedance.
pub const ALPHA: f32 = 0.008;
/// Per-sample damping of the outermost PML ring.
pub const SIGMA_MAX: f32 = 0.5;
/// Base audio sample rate (Hz); scaled by `srate_multiplier`.
pub const BASE_SRATE: f32 = 44100.0;

/// Depth-plane mode for the out-of-plane height correction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Depth planes stay at 1.0.
    #[default]
    #[serde(rename = "2d")]
    TwoD,
    /// Depth planes are set by the geometry builder (tube diameter in cells).
    #[serde(rename = "2_5d")]
    TwoPointFiveD,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    #[default]
    OpenAir,
    ClosedTube,
    VerticalWall,
    OpenTube,
    Vowel,
}

/// Vowel selector for the area-function scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vowel {
    A,
    U,
    I,
}

/// Excitation signal selector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    /// Continuous sinusoid at `freq` Hz.
    Sinusoid { freq: f32 },
    /// Gaussian pulse with width 0.5/`freq`.
    Gaussian { freq: f32 },
    /// Band-limited impulse with flat response between `fmin` and `fmax` Hz.
    Impulse { fmin: f32, fmax: f32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub mode: Mode,
    pub pml: bool,
    pub pml_layers: usize,
    pub scene: SceneKind,
    /// Required when `scene` is [`SceneKind::Vowel`].
    pub vowel: Option<Vowel>,
    /// Interior cell counts; ignored for the vowel scene, which derives its
    /// own domain from the area function.
    pub domain_w: usize,
    pub domain_h: usize,
    /// Tube dimensions in cells, for the fixed-tube scenes.
    pub tube_length: usize,
    pub tube_width: usize,
    /// Sample rate = 44100 * srate_multiplier.
    pub srate_multiplier: u32,
    pub source: SourceSpec,
    pub duration_ms: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            mode: Mode::TwoD,
            pml: true,
            pml_layers: 6,
            scene: SceneKind::OpenAir,
            vowel: None,
            domain_w: 100,
            domain_h: 100,
            tube_length: 80,
            tube_width: 5,
            srate_multiplier: 1,
            source: SourceSpec::Gaussian { freq: 2000.0 },
            duration_ms: 50.0,
        }
    }
}

/// Quantities derived from a validated [`SimConfig`].
#[derive(Clone, Copy, Debug)]
pub struct SimParams {
    /// Sample rate (Hz).
    pub srate: f32,
    /// Time step (s).
    pub dt: f32,
    /// Cell size (m); dx = dy = c * dt * sqrt(2) at the CFL limit.
    pub ds: f32,
    /// 1 / Z_n for the locally-reacting wall condition.
    pub z_inv: f32,
    /// Fused pressure-update constant rho * c^2 * dt / dx.
    pub p_coef: f32,
    /// Total step count for the configured duration.
    pub steps: usize,
}

impl SimParams {
    pub fn derive(config: &SimConfig) -> SimParams {
        let srate = BASE_SRATE * config.srate_multiplier as f32;
        let dt = 1.0 / srate;
        let ds = C_SOUND * dt * std::f32::consts::SQRT_2;
        let root = (1.0 - ALPHA).sqrt();
        let z_n = RHO * C_SOUND * (1.0 + root) / (1.0 - root);
        SimParams {
            srate,
            dt,
            ds,
            z_inv: 1.0 / z_n,
            p_coef: RHO * C_SOUND * C_SOUND * dt / ds,
            steps: (config.duration_ms * 1e-3 * srate).round() as usize,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Rejected configuration; reported before any simulation runs.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("interior domain {w}x{h} is too small, need at least {min}x{min} cells")]
    DomainTooSmall { w: usize, h: usize, min: usize },
    #[error("tube {length}x{width} does not fit the {w}x{h} interior domain")]
    TubeDoesNotFit {
        length: usize,
        width: usize,
        w: usize,
        h: usize,
    },
    #[error("scene `vowel` requires a vowel selection")]
    MissingVowel,
    #[error("pml_layers must be positive when the PML is enabled")]
    NoPmlLayers,
    #[error("srate_multiplier must be positive")]
    ZeroSampleRate,
    #[error("duration_ms must be positive")]
    NonPositiveDuration,
    #[error("source frequency bounds must be positive and ordered")]
    BadSourceBand,
}

/// Non-finite value detected in a field plane; the run stops and the
/// offending step's output is discarded.
#[derive(Debug, Error, PartialEq)]
#[error("non-finite field value at step {step}")]
pub struct NumericError {
    pub step: u64,
}

/// Anything the driver can fail with.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Numeric(#[from] NumericError),
}

/// Non-fatal geometry diagnostics; the build continues.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryWarning {
    /// The snapped tube length misses the true area-function length by more
    /// than the tolerance.
    TubeLengthError { percent: f32 },
}

impl std::fmt::Display for GeometryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryWarning::TubeLengthError { percent } => {
                write!(f, "tube length rounding error {percent:.2}% exceeds tolerance")
            }
        }
    }
}

impl SimConfig {
    /// Validate the selector/dimension surface. Scene builders perform the
    /// fit checks that need derived geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.srate_multiplier == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if !(self.duration_ms > 0.0) {
            return Err(ConfigError::NonPositiveDuration);
        }
        if self.pml && self.pml_layers == 0 {
            return Err(ConfigError::NoPmlLayers);
        }
        match self.source {
            SourceSpec::Sinusoid { freq } | SourceSpec::Gaussian { freq } => {
                if !(freq > 0.0) {
                    return Err(ConfigError::BadSourceBand);
                }
            }
            SourceSpec::Impulse { fmin, fmax } => {
                if !(fmin > 0.0 && fmax > fmin) {
                    return Err(ConfigError::BadSourceBand);
                }
            }
        }
        match self.scene {
            SceneKind::Vowel => {
                if self.vowel.is_none() {
                    return Err(ConfigError::MissingVowel);
                }
            }
            SceneKind::OpenAir | SceneKind::VerticalWall => {
                if self.domain_w < 4 || self.domain_h < 4 {
                    return Err(ConfigError::DomainTooSmall {
                        w: self.domain_w,
                        h: self.domain_h,
                        min: 4,
                    });
                }
            }
            SceneKind::ClosedTube | SceneKind::OpenTube => {
                if self.domain_w < 4 || self.domain_h < 4 {
                    return Err(ConfigError::DomainTooSmall {
                        w: self.domain_w,
                        h: self.domain_h,
                        min: 4,
                    });
                }
                if self.tube_length == 0
                    || self.tube_width == 0
                    || self.tube_length + 2 > self.domain_w
                    || self.tube_width + 2 > self.domain_h
                {
                    return Err(ConfigError::TubeDoesNotFit {
                        length: self.tube_length,
                        width: self.tube_width,
                        w: self.domain_w,
                        h: self.domain_h,
                    });
                }
            }
        }
        Ok(())
    }
}
