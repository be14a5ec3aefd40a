//! WebAssembly surface
//!
//! Exposes the driver to JavaScript: configuration comes in as a plain
//! object, the pressure field goes out as a raw pointer for a zero-copy
//! Float32Array view over Wasm memory, and the listener series is copied out
//! on demand.

use wasm_bindgen::prelude::*;

use crate::config::SimConfig;
use crate::sim::Simulation;

/// A configured acoustic simulation, driven from JavaScript.
#[wasm_bindgen]
pub struct TractSim {
    sim: Simulation,
}

#[wasm_bindgen]
impl TractSim {
    /// Build from a configuration object. Unknown scenes, unfittable
    /// geometry and the like are rejected here, before anything runs.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<TractSim, JsValue> {
        let config: SimConfig = if config.is_undefined() || config.is_null() {
            SimConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        let sim = Simulation::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        for warning in sim.warnings() {
            web_sys::console::warn_1(&JsValue::from_str(&warning.to_string()));
        }
        Ok(TractSim { sim })
    }

    /// Advance `n` steps (capped at the configured duration). Returns the
    /// number of steps actually taken; a numeric fault surfaces as an error
    /// with everything recorded so far still readable.
    pub fn step_n(&mut self, n: u32) -> Result<u32, JsValue> {
        let remaining = self.sim.total_steps() - self.sim.steps_done();
        let count = (n as usize).min(remaining);
        for _ in 0..count {
            self.sim.step().map_err(|e| {
                let message = JsValue::from_str(&e.to_string());
                web_sys::console::error_1(&message);
                message
            })?;
        }
        Ok(count as u32)
    }

    /// True once the configured duration has fully run.
    pub fn finished(&self) -> bool {
        self.sim.steps_done() >= self.sim.total_steps()
    }

    pub fn steps_done(&self) -> usize {
        self.sim.steps_done()
    }

    pub fn width(&self) -> usize {
        self.sim.engine().grid().width()
    }

    pub fn height(&self) -> usize {
        self.sim.engine().grid().height()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sim.params().srate
    }

    /// Raw pointer to the published pressure plane for a zero-copy
    /// Float32Array view (length `width * height`).
    ///
    /// # Safety
    /// The view is valid only until the next mutable call on this object.
    pub fn pressure_ptr(&self) -> *const f32 {
        self.sim.engine().grid().pressure().as_ptr()
    }

    /// Listener pressure series recorded so far (copied out).
    pub fn listener_samples(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.sim.output())
    }

    /// Cell-kind codes for overlay rendering:
    /// 0 air, 1 wall, 2 excitation, 3 pressure-release, 4 dead, 5 PML.
    pub fn cell_codes(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.sim.engine().kind_codes().as_slice())
    }
}
