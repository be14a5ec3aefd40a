//! Simulation driver
//!
//! Wires configuration, scene building, coefficient derivation and the
//! engine into one run loop. Geometry problems are reported before the first
//! step; numeric blow-ups stop the run with the offending step's output
//! discarded, and everything recorded up to that point stays valid.

use crate::cells::CoeffTable;
use crate::config::{
    GeometryWarning, NumericError, SimConfig, SimError, SimParams, SIGMA_MAX,
};
use crate::fdtd::FdtdEngine;
use crate::scenarios;
use crate::sources::{FieldSink, Listener, SourceSignal};

/// Steps between full-plane finiteness scans; the probed sample is checked
/// every step.
const FINITE_SCAN_INTERVAL: u64 = 256;

pub struct Simulation {
    engine: FdtdEngine,
    params: SimParams,
    listener: Listener,
    warnings: Vec<GeometryWarning>,
    /// Scratch frame for snapshots, allocated once.
    frame: Vec<f32>,
    total_steps: usize,
}

impl Simulation {
    /// Validate the configuration and build everything the run needs. No
    /// allocation happens after this returns.
    pub fn new(config: SimConfig) -> Result<Simulation, crate::config::ConfigError> {
        config.validate()?;
        let params = SimParams::derive(&config);

        let mut scene = scenarios::build(&config, &params)?;
        let warnings = std::mem::take(&mut scene.warnings);
        let listener = Listener::new(scene.listener);

        let layers = if config.pml { config.pml_layers } else { 0 };
        let table = CoeffTable::new(layers, SIGMA_MAX);
        let excitation = SourceSignal::from_spec(config.source, params.srate, params.steps);
        let engine = FdtdEngine::new(scene, &table, &params, excitation.into_samples());

        let frame_size = engine.grid().width() * engine.grid().height();
        log::debug!(
            "simulation ready: {} steps at {} Hz, frame {} cells",
            params.steps,
            params.srate,
            frame_size
        );

        Ok(Simulation {
            engine,
            params,
            listener,
            warnings,
            frame: vec![0.0; frame_size],
            total_steps: params.steps,
        })
    }

    /// Advance one step, recording the listener sample. On a numeric fault
    /// the sample is discarded and the error returned; earlier output stays
    /// valid.
    pub fn step(&mut self) -> Result<f32, NumericError> {
        let sample = self.engine.step();
        self.listener.record(sample);

        let mut fault = !sample.is_finite();
        if !fault && self.engine.step_count() % FINITE_SCAN_INTERVAL == 0 {
            fault = self.engine.check_finite().is_err();
        }
        if fault {
            self.listener.discard_last();
            return Err(NumericError {
                step: self.engine.step_count() - 1,
            });
        }
        Ok(sample)
    }

    /// Run the configured duration to completion.
    pub fn run(&mut self) -> Result<&[f32], SimError> {
        while (self.engine.step_count() as usize) < self.total_steps {
            self.step()?;
        }
        self.engine.check_finite()?;
        Ok(self.listener.samples())
    }

    /// Run to completion, handing a snapshot to `sink` every `every` steps.
    pub fn run_with_sink<S: FieldSink>(
        &mut self,
        sink: &mut S,
        every: usize,
    ) -> Result<(), SimError> {
        let every = every.max(1);
        while (self.engine.step_count() as usize) < self.total_steps {
            self.step()?;
            if self.engine.step_count() % every as u64 == 0 {
                self.engine.snapshot_into(&mut self.frame);
                sink.frame(
                    self.engine.step_count(),
                    self.engine.grid().width(),
                    self.engine.grid().height(),
                    &self.frame,
                );
            }
        }
        self.engine.check_finite()?;
        Ok(())
    }

    pub fn output(&self) -> &[f32] {
        self.listener.samples()
    }

    pub fn warnings(&self) -> &[GeometryWarning] {
        &self.warnings
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn engine(&self) -> &FdtdEngine {
        &self.engine
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn steps_done(&self) -> usize {
        self.engine.step_count() as usize
    }
}
