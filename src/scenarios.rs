//! Scene builders
//!
//! Each scene populates a fresh [`CellGrid`] and reports where the listener
//! sits and which faces of the excitation cells receive injected velocity.
//! Geometry is stamped after the PML rings are laid down, so walls win over
//! PML assignments where they overlap.

use std::f32::consts::PI;

use crate::cells::CellKind;
use crate::config::{ConfigError, GeometryWarning, Mode, SceneKind, SimConfig, SimParams, Vowel};
use crate::grid::CellGrid;
use crate::vowels::{self, SECTIONS};

/// Relative tube-length rounding error tolerated without a warning.
const LENGTH_TOLERANCE: f32 = 0.02;

/// Face-weight order: left, down, right, up.
pub type FaceDirs = [f32; 4];

/// A built scene, ready for coefficient derivation.
pub struct Scene {
    pub grid: CellGrid,
    /// Listener cell in frame coordinates.
    pub listener: (usize, usize),
    /// Injection weight per excitation face.
    pub dir: FaceDirs,
    pub warnings: Vec<GeometryWarning>,
}

/// Build the configured scene.
pub fn build(config: &SimConfig, params: &SimParams) -> Result<Scene, ConfigError> {
    let scene = match config.scene {
        SceneKind::OpenAir => build_open_air(config),
        SceneKind::ClosedTube => build_tube(config, true),
        SceneKind::OpenTube => build_tube(config, false),
        SceneKind::VerticalWall => build_vertical_wall(config),
        SceneKind::Vowel => {
            let vowel = config.vowel.ok_or(ConfigError::MissingVowel)?;
            build_vowel(config, params, vowel)
        }
    };
    log::debug!(
        "scene {:?}: frame {}x{}, listener {:?}",
        config.scene,
        scene.grid.height(),
        scene.grid.width(),
        scene.listener
    );
    Ok(scene)
}

/// Open air: a single omnidirectional excitation cell at the interior
/// center, listener co-located with it.
fn build_open_air(config: &SimConfig) -> Scene {
    let mut grid = CellGrid::new(config.domain_h, config.domain_w, config.pml, config.pml_layers);
    let (sr, sc) = grid.interior(config.domain_h / 2, config.domain_w / 2);
    grid.set_kind(sr, sc, CellKind::Excitation);
    Scene {
        grid,
        listener: (sr, sc),
        dir: [-1.0, -1.0, 1.0, 1.0],
        warnings: Vec::new(),
    }
}

/// Open air plus a short wall column to the right of the source, for
/// reflection experiments. The listener sits midway between source and wall,
/// where it hears the direct wave and its reflection; the source cell itself
/// would not, because its faces are clamped to the drive.
fn build_vertical_wall(config: &SimConfig) -> Scene {
    let mut grid = CellGrid::new(config.domain_h, config.domain_w, config.pml, config.pml_layers);
    let (sr, sc) = grid.interior(config.domain_h / 2, config.domain_w / 2);
    grid.set_kind(sr, sc, CellKind::Excitation);

    let offset = (config.domain_w / 8).max(2);
    let half_h = (config.domain_h / 8).max(1);
    let wall_c = sc + offset;
    for r in sr - half_h..=sr + half_h {
        grid.set_kind(r, wall_c, CellKind::Wall);
    }

    Scene {
        grid,
        listener: (sr, sc + offset / 2),
        dir: [-1.0, -1.0, 1.0, 1.0],
        warnings: Vec::new(),
    }
}

/// Straight horizontal tube, driven from the left, Dirichlet-open on the
/// right. `closed` adds the glottal wall column behind the excitation.
fn build_tube(config: &SimConfig, closed: bool) -> Scene {
    let mut grid = CellGrid::new(config.domain_h, config.domain_w, config.pml, config.pml_layers);
    let tl = config.tube_length;
    let tw = config.tube_width;
    let (r0, c0) = grid.interior((config.domain_h - tw) / 2, (config.domain_w - tl) / 2);

    // Wall rows above and below the air channel.
    for c in c0 - 1..c0 + tl {
        grid.set_kind(r0 - 1, c, CellKind::Wall);
        grid.set_kind(r0 + tw, c, CellKind::Wall);
    }
    if closed {
        for r in r0 - 1..=r0 + tw {
            grid.set_kind(r, c0 - 1, CellKind::Wall);
        }
    }

    // Glottal excitation column spanning the tube width.
    for r in r0..r0 + tw {
        grid.set_kind(r, c0, CellKind::Excitation);
    }

    // Open end: pressure release one cell beyond the tube.
    for r in r0 - 1..=r0 + tw {
        grid.set_kind(r, c0 + tl, CellKind::NoPressure);
    }

    if config.mode == Mode::TwoPointFiveD {
        for r in r0..r0 + tw {
            for c in c0..c0 + tl {
                grid.set_depth(r, c, tw as f32);
            }
        }
    }

    Scene {
        grid,
        listener: (r0 + tw / 2, c0 + tl - 1),
        dir: [0.0, 0.0, 1.0, 0.0],
        warnings: Vec::new(),
    }
}

/// Snap a physical diameter to an odd cell count (at least 1), so the tube
/// keeps a single center row as its mirror axis.
fn odd_cell_count(diameter_m: f32, ds: f32) -> usize {
    let exact = diameter_m / ds;
    let mut n = exact.round().max(1.0) as usize;
    if n % 2 == 0 {
        if n as f32 > exact {
            n -= 1;
        } else {
            n += 1;
        }
    }
    n.max(1)
}

/// Vocal-tract tube built from a 44-section area function. Derives its own
/// interior domain from the snapped geometry.
fn build_vowel(config: &SimConfig, params: &SimParams, vowel: Vowel) -> Scene {
    let af = vowels::area_function(vowel);
    let ds = params.ds;

    // Per-section diameters in cells, odd-snapped.
    let mut diam = [1usize; SECTIONS];
    for (i, &area) in af.areas_cm2.iter().enumerate() {
        let d_m = 2.0 * (area * 1e-4 / PI).sqrt();
        diam[i] = odd_cell_count(d_m, ds);
    }

    // Snapped tube length and its rounding error.
    let true_len = af.tract_len_m();
    let len_cells = ((true_len / ds).round() as usize).max(1);
    let err = (len_cells as f32 * ds - true_len).abs() / true_len;
    let mut warnings = Vec::new();
    if err > LENGTH_TOLERANCE {
        let warning = GeometryWarning::TubeLengthError {
            percent: err * 100.0,
        };
        log::warn!("vowel /{}/: {warning}", af.name);
        warnings.push(warning);
    }

    // Tallest stamped feature off the center row: wall rings reach
    // (diam+1)/2, the lip pressure-release column (last diam + 1)/2.
    let max_diam = diam.iter().copied().fold(1, usize::max);
    let half = (max_diam + 1) / 2;

    let margin_v = 2;
    let domain_h = 2 * (half + margin_v) + 1;
    let domain_w = len_cells + 6;

    let mut grid = CellGrid::new(domain_h, domain_w, config.pml, config.pml_layers);
    let (rc, x0) = grid.interior(half + margin_v, 2);

    // Walk the tube left to right, advancing sections by cumulative axial
    // distance and keeping the wall profile fluid-tight across jumps.
    let depth_mode = config.mode == Mode::TwoPointFiveD;
    let mut sec = 0usize;
    let mut prev_radius: Option<usize> = None;
    for j in 0..len_cells {
        let dist = (j + 1) as f32 * ds;
        while sec + 1 < SECTIONS && dist > (sec + 1) as f32 * af.section_len_m + 0.5 * ds {
            sec += 1;
        }
        let radius = (diam[sec] - 1) / 2 + 1;
        let c = x0 + j;
        grid.set_kind(rc - radius, c, CellKind::Wall);
        grid.set_kind(rc + radius, c, CellKind::Wall);
        if let Some(prev) = prev_radius {
            if radius.abs_diff(prev) > 1 {
                let (lo, hi) = (radius.min(prev), radius.max(prev));
                for rr in lo..=hi {
                    grid.set_kind(rc - rr, c, CellKind::Wall);
                    grid.set_kind(rc + rr, c, CellKind::Wall);
                }
            }
        }
        prev_radius = Some(radius);

        if depth_mode {
            for rr in 0..radius {
                grid.set_depth(rc - rr, c, diam[sec] as f32);
                grid.set_depth(rc + rr, c, diam[sec] as f32);
            }
        }
    }

    // Glottal excitation column spanning the first section, walled above and
    // below.
    let glottal_half = (diam[0] - 1) / 2;
    for r in rc - glottal_half..=rc + glottal_half {
        grid.set_kind(r, x0, CellKind::Excitation);
    }
    grid.set_kind(rc - glottal_half - 1, x0, CellKind::Wall);
    grid.set_kind(rc + glottal_half + 1, x0, CellKind::Wall);

    // Pressure release across the lips, one cell beyond the tube, spanning
    // the last diameter plus one cell each side.
    let lip_half = (diam[SECTIONS - 1] + 1) / 2;
    let lip_c = x0 + len_cells;
    for r in rc - lip_half..=rc + lip_half {
        grid.set_kind(r, lip_c, CellKind::NoPressure);
    }

    Scene {
        grid,
        listener: (rc, x0 + len_cells - 1),
        dir: [0.0, 0.0, 1.0, 0.0],
        warnings,
    }
}
