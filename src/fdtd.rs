//! Acoustic FDTD engine
//!
//! Explicit leap-frog update of the staggered pressure/velocity field over
//! the classified cell grid. One step is a fixed pipeline:
//!
//! 1. pressure from the velocity divergence (2.5D depth weighted),
//! 2. Dirichlet cells forced to zero,
//! 3. velocity pre-update from the fresh pressure gradient,
//! 4. source injection on excitation faces,
//! 5. locally-reacting wall impedance on air/rigid faces,
//! 6. velocity normalization,
//! 7. border wipe, listener probe, plane flip.
//!
//! The pipeline order matters: velocities consume the pressure written
//! earlier in the same step. All cell-type dispatch happened at build time
//! (see the coefficient planes), so the loops below are pure arithmetic.

use crate::cells::CoeffTable;
use crate::coeffs::FaceCoeffs;
use crate::config::{NumericError, SimParams};
use crate::grid::CellGrid;
use crate::scenarios::Scene;

/// Snapshot marker for solid cells, distinguishable from any valid pressure.
pub const WALL_SENTINEL: f32 = f32::INFINITY;

pub struct FdtdEngine {
    grid: CellGrid,
    coeffs: FaceCoeffs,
    /// Pre-generated excitation sequence; zero past its end.
    excitation: Vec<f32>,
    listener: (usize, usize),
    step_count: u64,
    /// rho * c^2 * dt / dx.
    p_coef: f32,
    /// 1 / dx = 1 / dy.
    inv_ds: f32,
}

impl FdtdEngine {
    /// Wire a built scene to the update loop. Coefficient planes are derived
    /// here, once; the scene's geometry is frozen from now on.
    pub fn new(
        scene: Scene,
        table: &CoeffTable,
        params: &SimParams,
        excitation: Vec<f32>,
    ) -> FdtdEngine {
        let coeffs = FaceCoeffs::derive(&scene.grid, table, params, scene.dir);
        FdtdEngine {
            grid: scene.grid,
            coeffs,
            excitation,
            listener: scene.listener,
            step_count: 0,
            p_coef: params.p_coef,
            inv_ds: 1.0 / params.ds,
        }
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn listener(&self) -> (usize, usize) {
        self.listener
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Advance one step and return the listener's pressure sample.
    pub fn step(&mut self) -> f32 {
        let w = self.grid.width();
        let h = self.grid.height();
        let e = self
            .excitation
            .get(self.step_count as usize)
            .copied()
            .unwrap_or(0.0);
        let cf = &self.coeffs;
        let p_coef = self.p_coef;
        let inv_ds = self.inv_ds;
        let listener_idx = self.listener.0 * w + self.listener.1;

        let pl = self.grid.step_planes();

        // Pressure from the depth-weighted velocity divergence; the norm
        // plane folds in the sigma divisor and the Dirichlet mask.
        for r in 1..h - 1 {
            let row = r * w;
            for i in row + 1..row + w - 1 {
                let cxvx = pl.vx_prev[i] * pl.depth_x[i] - pl.vx_prev[i - 1] * pl.depth_x[i - 1];
                let cyvy = pl.vy_prev[i] * pl.depth_y[i] - pl.vy_prev[i + w] * pl.depth_y[i + w];
                pl.p_next[i] =
                    (pl.p_prev[i] * pl.depth_p[i] - p_coef * (cxvx + cyvy)) * cf.p_norm[i];
            }
        }

        // X velocities: gradient toward the right neighbor, plus injection
        // and wall terms, then the face normalization.
        for r in 1..h - 1 {
            let row = r * w;
            for i in row + 1..row + w - 1 {
                let grad = (pl.p_next[i + 1] - pl.p_next[i]) * inv_ds;
                let v = cf.min_beta_x[i] * pl.vx_prev[i] - cf.vel_coef_x[i] * grad
                    + e * cf.exc_x[i]
                    + cf.imp_self_x[i] * pl.p_next[i]
                    - cf.imp_nb_x[i] * pl.p_next[i + 1];
                pl.vx_next[i] = v * cf.inv_norm_x[i];
            }
        }

        // Y velocities: gradient toward the upper neighbor (row above).
        for r in 1..h - 1 {
            let row = r * w;
            for i in row + 1..row + w - 1 {
                let grad = (pl.p_next[i - w] - pl.p_next[i]) * inv_ds;
                let v = cf.min_beta_y[i] * pl.vy_prev[i] - cf.vel_coef_y[i] * grad
                    + e * cf.exc_y[i]
                    + cf.imp_self_y[i] * pl.p_next[i]
                    - cf.imp_nb_y[i] * pl.p_next[i - w];
                pl.vy_next[i] = v * cf.inv_norm_y[i];
            }
        }

        let sample = pl.p_next[listener_idx];

        // Border wipe: the dead ring never carries field values.
        for plane in [pl.p_next, pl.vx_next, pl.vy_next] {
            wipe_border(plane, w, h);
        }

        self.grid.flip();
        self.step_count += 1;
        sample
    }

    /// Run `n` steps, discarding the probe samples.
    pub fn step_n(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Total pressure energy over the interior domain (PML rings excluded).
    pub fn interior_energy(&self) -> f32 {
        let w = self.grid.width();
        let m = self.grid.margin();
        let (dh, dw) = self.grid.domain_size();
        let p = self.grid.pressure();
        let mut energy = 0.0;
        for r in m..m + dh {
            for c in m..m + dw {
                let v = p[r * w + c];
                energy += v * v;
            }
        }
        energy
    }

    /// Scan all field planes for non-finite values.
    pub fn check_finite(&self) -> Result<(), NumericError> {
        let planes = [
            self.grid.pressure(),
            self.grid.velocity_x(),
            self.grid.velocity_y(),
        ];
        for plane in planes {
            if plane.iter().any(|v| !v.is_finite()) {
                return Err(NumericError {
                    step: self.step_count,
                });
            }
        }
        Ok(())
    }

    /// Copy the published pressure plane into `frame`, marking solid cells
    /// with [`WALL_SENTINEL`].
    pub fn snapshot_into(&self, frame: &mut [f32]) {
        let p = self.grid.pressure();
        let kinds = self.grid.kinds();
        for (out, (value, kind)) in frame.iter_mut().zip(p.iter().zip(kinds.iter())) {
            *out = if kind.is_solid() { WALL_SENTINEL } else { *value };
        }
    }

    /// Cell-kind codes for visualization overlays.
    pub fn kind_codes(&self) -> Vec<u8> {
        self.grid.kinds().iter().map(|k| k.code()).collect()
    }
}

fn wipe_border(plane: &mut [f32], w: usize, h: usize) {
    plane[..w].fill(0.0);
    plane[(h - 1) * w..].fill(0.0);
    for r in 1..h - 1 {
        plane[r * w] = 0.0;
        plane[r * w + w - 1] = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::CellKind;
    use crate::config::{SceneKind, SimConfig, SimParams, SIGMA_MAX};
    use crate::scenarios;
    use crate::sources::SourceSignal;

    fn engine_for(config: &SimConfig, excitation: Vec<f32>) -> FdtdEngine {
        let params = SimParams::derive(config);
        let scene = scenarios::build(config, &params).unwrap();
        let layers = if config.pml { config.pml_layers } else { 0 };
        let table = CoeffTable::new(layers, SIGMA_MAX);
        FdtdEngine::new(scene, &table, &params, excitation)
    }

    #[test]
    fn test_quiescence_without_excitation() {
        let config = SimConfig {
            domain_w: 30,
            domain_h: 30,
            ..SimConfig::default()
        };
        let mut engine = engine_for(&config, vec![0.0; 64]);
        engine.step_n(64);
        assert!(engine.grid().pressure().iter().all(|&v| v == 0.0));
        assert!(engine.grid().velocity_x().iter().all(|&v| v == 0.0));
        assert!(engine.grid().velocity_y().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_first_sample_is_silent() {
        // The probe reads the pressure written before the first injection
        // reaches it.
        let config = SimConfig {
            domain_w: 30,
            domain_h: 30,
            ..SimConfig::default()
        };
        let params = SimParams::derive(&config);
        let signal = SourceSignal::sinusoid(1000.0, params.srate, 16);
        let mut engine = engine_for(&config, signal.into_samples());
        assert_eq!(engine.step(), 0.0);
    }

    #[test]
    fn test_pulse_spreads_and_stays_finite() {
        let config = SimConfig {
            domain_w: 40,
            domain_h: 40,
            ..SimConfig::default()
        };
        let params = SimParams::derive(&config);
        let signal = SourceSignal::gaussian_pulse(3000.0, params.srate, 200);
        let mut engine = engine_for(&config, signal.into_samples());
        engine.step_n(120);
        assert!(engine.check_finite().is_ok());
        assert!(engine.interior_energy() > 0.0);

        // Energy reached cells away from the source.
        let (sr, sc) = engine.listener();
        let w = engine.grid().width();
        let p = engine.grid().pressure();
        let off = p[(sr - 10) * w + sc].abs() + p[sr * w + sc + 10].abs();
        assert!(off > 0.0);
    }

    #[test]
    fn test_mirror_symmetry_in_open_air() {
        let config = SimConfig {
            domain_w: 41,
            domain_h: 41,
            pml: false,
            ..SimConfig::default()
        };
        let params = SimParams::derive(&config);
        let signal = SourceSignal::gaussian_pulse(3000.0, params.srate, 64);
        let mut engine = engine_for(&config, signal.into_samples());
        engine.step_n(16);

        let (sr, sc) = engine.listener();
        let w = engine.grid().width();
        let h = engine.grid().height();
        let p = engine.grid().pressure();
        for r in 1..h - 1 {
            for d in 1..sc {
                if sc + d >= w - 1 {
                    continue;
                }
                let a = p[r * w + sc + d];
                let b = p[r * w + sc - d];
                assert!(
                    (a - b).abs() <= 1e-4 * (a.abs() + b.abs() + 1e-3),
                    "column asymmetry at r={r} d={d}: {a} vs {b}"
                );
            }
        }
        for c in 1..w - 1 {
            for d in 1..sr {
                if sr + d >= h - 1 {
                    continue;
                }
                let a = p[(sr + d) * w + c];
                let b = p[(sr - d) * w + c];
                assert!(
                    (a - b).abs() <= 1e-4 * (a.abs() + b.abs() + 1e-3),
                    "row asymmetry at c={c} d={d}: {a} vs {b}"
                );
            }
        }
    }

    #[test]
    fn test_dirichlet_cells_stay_silent() {
        let config = SimConfig {
            scene: SceneKind::ClosedTube,
            domain_w: 40,
            domain_h: 11,
            tube_length: 30,
            tube_width: 5,
            ..SimConfig::default()
        };
        let params = SimParams::derive(&config);
        let signal = SourceSignal::gaussian_pulse(2000.0, params.srate, 256);
        let mut engine = engine_for(&config, signal.into_samples());
        engine.step_n(256);
        assert!(engine.check_finite().is_ok());

        let (lr, lc) = engine.listener();
        let w = engine.grid().width();
        let p = engine.grid().pressure();
        assert_eq!(engine.grid().kind(lr, lc + 1), CellKind::NoPressure);
        assert_eq!(p[lr * w + lc + 1], 0.0);
        // The tube actually rang.
        assert!(p[lr * w + lc] != 0.0);
    }

    #[test]
    fn test_snapshot_marks_solids() {
        let config = SimConfig {
            scene: SceneKind::VerticalWall,
            domain_w: 32,
            domain_h: 32,
            ..SimConfig::default()
        };
        let engine = engine_for(&config, vec![0.0; 8]);
        let size = engine.grid().width() * engine.grid().height();
        let mut frame = vec![0.0; size];
        engine.snapshot_into(&mut frame);

        let m = engine.grid().margin();
        let (sr, sc) = (m + config.domain_h / 2, m + config.domain_w / 2);
        let w = engine.grid().width();
        let wall_c = sc + (config.domain_w / 8).max(2);
        assert_eq!(frame[sr * w + wall_c], WALL_SENTINEL);
        assert_eq!(frame[sr * w + sc], WALL_SENTINEL); // excitation cell
        assert_eq!(frame[0], WALL_SENTINEL); // dead ring
        assert_eq!(frame[(sr + 1) * w + sc], 0.0);
    }

    #[test]
    fn test_numeric_guard_detects_poison() {
        let config = SimConfig {
            domain_w: 16,
            domain_h: 16,
            ..SimConfig::default()
        };
        let mut engine = engine_for(&config, vec![0.0; 8]);
        assert!(engine.check_finite().is_ok());
        let idx = engine.grid.idx(8, 8);
        engine.grid.step_planes().p_next[idx] = f32::NAN;
        engine.grid.flip();
        assert!(engine.check_finite().is_err());
    }
}
