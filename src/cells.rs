//! Cell Type Registry
//!
//! Every cell in the simulation frame carries exactly one [`CellKind`].
//! The kind selects the pair of propagation coefficients (β, σ′Δt):
//! β is the cell "fluidity" (1 for air, 0 for solids) and governs velocity
//! permeability, σ′Δt is the per-sample damping term that drives exponential
//! decay inside the PML rings and freezes the dead border.
//!
//! The numeric values live in a single [`CoeffTable`] built once at startup
//! and consulted by index; no other module hard-codes them.

/// Classification of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    /// Rigid boundary cell with a locally-reacting surface impedance.
    Wall,
    /// Propagating air cell.
    Air,
    /// Source cell; velocity is injected on its faces.
    Excitation,
    /// Outer-ring cell, effectively frozen.
    Dead,
    /// Dirichlet cell whose pressure is forced to zero each step
    /// (models an open tube end).
    NoPressure,
    /// Absorbing layer cell; the argument is the layer index, 0 at the
    /// innermost (weakest) ring.
    Pml(u8),
}

impl CellKind {
    /// Dense index into the coefficient table.
    pub fn index(self) -> usize {
        match self {
            CellKind::Wall => 0,
            CellKind::Air => 1,
            CellKind::Excitation => 2,
            CellKind::Dead => 3,
            CellKind::NoPressure => 4,
            CellKind::Pml(layer) => 5 + layer as usize,
        }
    }

    /// Compact code for visualization overlays.
    pub fn code(self) -> u8 {
        match self {
            CellKind::Air => 0,
            CellKind::Wall => 1,
            CellKind::Excitation => 2,
            CellKind::NoPressure => 3,
            CellKind::Dead => 4,
            CellKind::Pml(_) => 5,
        }
    }

    /// True for kinds with β = 0 (solid to the velocity field).
    pub fn is_solid(self) -> bool {
        matches!(self, CellKind::Wall | CellKind::Excitation | CellKind::Dead)
    }

    /// True for kinds that take part in the locally-reacting wall condition.
    pub fn is_rigid(self) -> bool {
        matches!(self, CellKind::Wall | CellKind::Dead)
    }

    pub fn is_pml(self) -> bool {
        matches!(self, CellKind::Pml(_))
    }
}

/// Damping applied to dead cells; large enough to freeze them outright.
const DEAD_SIGMA: f32 = 1.0e6;

/// The (β, σ′Δt) coefficient table, one entry per cell kind.
///
/// σ′Δt is dimensionless (per simulation sample). PML layers grade linearly
/// from 0 at the innermost ring to `sigma_max` at the outermost.
pub struct CoeffTable {
    beta: Vec<f32>,
    sigma_dt: Vec<f32>,
}

impl CoeffTable {
    /// Build the table for a frame with `pml_layers` absorbing rings.
    pub fn new(pml_layers: usize, sigma_max: f32) -> CoeffTable {
        let mut beta = vec![0.0; 5 + pml_layers];
        let mut sigma_dt = vec![0.0; 5 + pml_layers];

        let mut set = |kind: CellKind, b: f32, s: f32| {
            beta[kind.index()] = b;
            sigma_dt[kind.index()] = s;
        };

        set(CellKind::Wall, 0.0, 1.0);
        set(CellKind::Air, 1.0, 0.0);
        set(CellKind::Excitation, 0.0, 1.0);
        set(CellKind::Dead, 0.0, DEAD_SIGMA);
        set(CellKind::NoPressure, 1.0, 0.0);

        for i in 0..pml_layers {
            // Innermost layer (index 0) is the weakest; a single-layer PML
            // gets the full sigma_max.
            let grade = if pml_layers > 1 {
                i as f32 / (pml_layers - 1) as f32
            } else {
                1.0
            };
            set(CellKind::Pml(i as u8), 1.0, grade * sigma_max);
        }

        CoeffTable { beta, sigma_dt }
    }

    pub fn beta(&self, kind: CellKind) -> f32 {
        self.beta[kind.index()]
    }

    pub fn sigma_dt(&self, kind: CellKind) -> f32 {
        self.sigma_dt[kind.index()]
    }

    /// (β, σ′Δt) lookup.
    pub fn coefficients(&self, kind: CellKind) -> (f32, f32) {
        (self.beta(kind), self.sigma_dt(kind))
    }
}
