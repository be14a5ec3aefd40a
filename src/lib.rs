//! VocalTube Core - 2D Acoustic FDTD Synthesizer
//!
//! Interactive time-domain simulation of acoustic wave propagation in
//! enclosed domains: vocal tracts built from area functions, simple tubes,
//! and free-field scenes, with a graded PML absorbing boundary and
//! locally-reacting wall impedance.
//!
//! The listener's pressure series is the synthesized audio signal; periodic
//! field snapshots feed visualization. Compiles natively and to WebAssembly
//! for browser-based play.

mod cells;
mod coeffs;
mod config;
mod fdtd;
mod grid;
mod scenarios;
mod sim;
mod sources;
mod vowels;
mod wasm;

use wasm_bindgen::prelude::*;

pub use cells::{CellKind, CoeffTable};
pub use coeffs::FaceCoeffs;
pub use config::{
    ConfigError, GeometryWarning, Mode, NumericError, SceneKind, SimConfig, SimError, SimParams,
    SourceSpec, Vowel, ALPHA, BASE_SRATE, C_SOUND, RHO, SIGMA_MAX,
};
pub use fdtd::{FdtdEngine, WALL_SENTINEL};
pub use grid::{CellGrid, StepPlanes};
pub use scenarios::{build as build_scene, FaceDirs, Scene};
pub use sim::Simulation;
pub use sources::{FieldSink, LatestFrame, Listener, SourceSignal, SpectrumAnalyzer};
pub use vowels::{area_function, AreaFunction, SECTIONS};
pub use wasm::TractSim;

/// Initialize the Wasm module (call once at startup).
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages in the browser console.
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get library version string.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Get WebAssembly memory for zero-copy array access; JavaScript creates
/// Float32Array views over it at the pointers the simulation exposes.
#[wasm_bindgen]
pub fn get_wasm_memory() -> JsValue {
    wasm_bindgen::memory()
}
