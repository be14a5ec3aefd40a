//! Per-face coefficient derivation
//!
//! After geometry is final, one pass over the interior turns the cell-kind
//! plane into pure-arithmetic coefficient planes, so the engine's hot loops
//! never branch on cell types:
//!
//! - `min_beta` / `max_sigma` per face follow the MIN/MAX policy: a wall cell
//!   (beta = 0) kills the velocity through its faces, a PML cell (sigma > 0)
//!   damps it.
//! - excitation faces get a pre-scaled injection weight,
//! - air/rigid faces get the two locally-reacting impedance terms,
//! - the pressure norm plane folds the Dirichlet mask, the sigma divisor and
//!   the 2.5D depth divisor into one multiply.
//!
//! Face convention: the x face of cell (r, c) is shared with (r, c+1), the
//! y face with (r-1, c) - row 0 is the top of the frame.

use std::f32::consts::FRAC_1_SQRT_2;

use crate::cells::{CellKind, CoeffTable};
use crate::config::{SimParams, RHO};
use crate::grid::CellGrid;
use crate::scenarios::FaceDirs;

pub struct FaceCoeffs {
    pub min_beta_x: Vec<f32>,
    pub min_beta_y: Vec<f32>,
    pub max_sigma_x: Vec<f32>,
    pub max_sigma_y: Vec<f32>,
    /// Pressure damping, taken from the cell itself.
    pub sigma_p: Vec<f32>,
    /// Fused beta^2 * dt / rho per face.
    pub vel_coef_x: Vec<f32>,
    pub vel_coef_y: Vec<f32>,
    /// 1 / (min_beta + max_sigma) per face.
    pub inv_norm_x: Vec<f32>,
    pub inv_norm_y: Vec<f32>,
    /// Source injection weight * max_sigma per face.
    pub exc_x: Vec<f32>,
    pub exc_y: Vec<f32>,
    /// Locally-reacting impedance terms per face, applied to the cell's own
    /// pressure and its neighbor's.
    pub imp_self_x: Vec<f32>,
    pub imp_nb_x: Vec<f32>,
    pub imp_self_y: Vec<f32>,
    pub imp_nb_y: Vec<f32>,
    /// dirichlet_mask / ((1 + sigma_p) * depth_p).
    pub p_norm: Vec<f32>,
}

impl FaceCoeffs {
    pub fn derive(
        grid: &CellGrid,
        table: &CoeffTable,
        params: &SimParams,
        dir: FaceDirs,
    ) -> FaceCoeffs {
        let w = grid.width();
        let h = grid.height();
        let size = w * h;
        let kinds = grid.kinds();
        let depth_p = grid.depth_p();
        let dt_rho = params.dt / RHO;

        let mut coeffs = FaceCoeffs {
            min_beta_x: vec![0.0; size],
            min_beta_y: vec![0.0; size],
            max_sigma_x: vec![0.0; size],
            max_sigma_y: vec![0.0; size],
            sigma_p: vec![0.0; size],
            vel_coef_x: vec![0.0; size],
            vel_coef_y: vec![0.0; size],
            inv_norm_x: vec![0.0; size],
            inv_norm_y: vec![0.0; size],
            exc_x: vec![0.0; size],
            exc_y: vec![0.0; size],
            imp_self_x: vec![0.0; size],
            imp_nb_x: vec![0.0; size],
            imp_self_y: vec![0.0; size],
            imp_nb_y: vec![0.0; size],
            p_norm: vec![0.0; size],
        };

        for r in 1..h - 1 {
            for c in 1..w - 1 {
                let i = r * w + c;
                let (beta, sigma) = table.coefficients(kinds[i]);

                coeffs.sigma_p[i] = sigma;
                let mask = if kinds[i] == CellKind::NoPressure { 0.0 } else { 1.0 };
                coeffs.p_norm[i] = mask / ((1.0 + sigma) * depth_p[i]);

                // Right face, shared with (r, c+1).
                let (beta_r, sigma_r) = table.coefficients(kinds[i + 1]);
                let min_beta = beta.min(beta_r);
                let max_sigma = sigma.max(sigma_r);
                debug_assert!(min_beta + max_sigma > 0.0);
                coeffs.min_beta_x[i] = min_beta;
                coeffs.max_sigma_x[i] = max_sigma;
                coeffs.vel_coef_x[i] = min_beta * min_beta * dt_rho;
                coeffs.inv_norm_x[i] = 1.0 / (min_beta + max_sigma);
                coeffs.exc_x[i] =
                    max_sigma * injection_weight(kinds[i], kinds[i + 1], dir[2], dir[0]);
                let (imp_self, imp_nb) = impedance_terms(
                    kinds, i, i + 1, beta, beta_r, max_sigma, params.z_inv, w,
                );
                coeffs.imp_self_x[i] = imp_self;
                coeffs.imp_nb_x[i] = imp_nb;

                // Top face, shared with (r-1, c).
                let (beta_u, sigma_u) = table.coefficients(kinds[i - w]);
                let min_beta = beta.min(beta_u);
                let max_sigma = sigma.max(sigma_u);
                debug_assert!(min_beta + max_sigma > 0.0);
                coeffs.min_beta_y[i] = min_beta;
                coeffs.max_sigma_y[i] = max_sigma;
                coeffs.vel_coef_y[i] = min_beta * min_beta * dt_rho;
                coeffs.inv_norm_y[i] = 1.0 / (min_beta + max_sigma);
                coeffs.exc_y[i] =
                    max_sigma * injection_weight(kinds[i], kinds[i - w], dir[3], dir[1]);
                let (imp_self, imp_nb) = impedance_terms(
                    kinds, i, i - w, beta, beta_u, max_sigma, params.z_inv, w,
                );
                coeffs.imp_self_y[i] = imp_self;
                coeffs.imp_nb_y[i] = imp_nb;
            }
        }

        coeffs
    }
}

/// Injection weight for the face between `own` and `neighbor`:
/// `outgoing` when the cell itself is the excitation, `incoming` when the
/// neighbor is. Excitation-to-excitation faces receive nothing.
fn injection_weight(own: CellKind, neighbor: CellKind, outgoing: f32, incoming: f32) -> f32 {
    match (own == CellKind::Excitation, neighbor == CellKind::Excitation) {
        (true, false) => outgoing,
        (false, true) => incoming,
        _ => 0.0,
    }
}

/// True for the kinds that close the locally-reacting wall condition with an
/// adjacent air cell.
fn takes_impedance(kind: CellKind) -> bool {
    matches!(
        kind,
        CellKind::Wall | CellKind::Dead | CellKind::NoPressure
    )
}

/// Impedance coefficients for the face between cells `i` (self) and `j`
/// (neighbor): the boundary velocity is
/// `z_inv * N * (beta_j (1 - beta_i) * P_i - beta_i (1 - beta_j) * P_j)`,
/// pre-scaled here by the face's max_sigma. `N = 1/sqrt(2)` when the air cell
/// sits in a corner (rigid neighbors on both axes).
fn impedance_terms(
    kinds: &[CellKind],
    i: usize,
    j: usize,
    beta_i: f32,
    beta_j: f32,
    max_sigma: f32,
    z_inv: f32,
    w: usize,
) -> (f32, f32) {
    let qualifies = (kinds[i] == CellKind::Air && takes_impedance(kinds[j]))
        || (kinds[j] == CellKind::Air && takes_impedance(kinds[i]));
    if !qualifies {
        return (0.0, 0.0);
    }

    let air = if kinds[i] == CellKind::Air { i } else { j };
    let hit_x = kinds[air - 1].is_rigid() || kinds[air + 1].is_rigid();
    let hit_y = kinds[air - w].is_rigid() || kinds[air + w].is_rigid();
    let n_factor = if hit_x && hit_y { FRAC_1_SQRT_2 } else { 1.0 };

    let scale = max_sigma * z_inv * n_factor;
    (
        scale * beta_j * (1.0 - beta_i),
        scale * beta_i * (1.0 - beta_j),
    )
}
