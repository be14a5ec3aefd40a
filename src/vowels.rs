//! Vowel area functions
//!
//! MRI-derived vocal-tract area functions, 44 equispaced sections from the
//! glottis (index 0) to the lips (index 43), areas in cm^2. Section length
//! differs per vowel because the tract length does.

use crate::config::Vowel;

pub const SECTIONS: usize = 44;

/// One vowel's cross-section table.
pub struct AreaFunction {
    pub name: &'static str,
    /// Cross-sectional areas in cm^2, glottis to lips.
    pub areas_cm2: [f32; SECTIONS],
    /// Axial length of one section in meters.
    pub section_len_m: f32,
}

impl AreaFunction {
    /// Total tract length in meters.
    pub fn tract_len_m(&self) -> f32 {
        SECTIONS as f32 * self.section_len_m
    }
}

pub const VOWEL_A: AreaFunction = AreaFunction {
    name: "a",
    areas_cm2: [
        0.45, 0.20, 0.26, 0.21, 0.32, 0.30, 0.33, 1.05, 1.12, 0.85, 0.63, 0.39, 0.26, 0.28, 0.23,
        0.32, 0.29, 0.28, 0.40, 0.66, 1.20, 1.05, 1.62, 2.09, 2.56, 2.78, 2.86, 3.02, 3.75, 4.60,
        5.09, 6.02, 6.55, 6.29, 6.27, 5.94, 5.28, 4.70, 3.87, 4.13, 4.25, 4.27, 4.69, 5.03,
    ],
    section_len_m: 0.396_825e-2,
};

pub const VOWEL_U: AreaFunction = AreaFunction {
    name: "u",
    areas_cm2: [
        0.40, 0.38, 0.28, 0.43, 0.55, 1.72, 2.91, 2.88, 2.37, 2.10, 3.63, 5.86, 5.63, 5.43, 4.80,
        4.56, 4.29, 3.63, 3.37, 3.16, 3.31, 3.22, 2.33, 2.07, 2.07, 1.52, 0.74, 0.23, 0.15, 0.22,
        0.22, 0.37, 0.60, 0.76, 0.86, 1.82, 2.35, 2.55, 3.73, 5.47, 4.46, 2.39, 1.10, 0.77,
    ],
    section_len_m: 0.407_727e-2,
};

pub const VOWEL_I: AreaFunction = AreaFunction {
    name: "i",
    areas_cm2: [
        0.51, 0.17, 0.28, 0.13, 0.28, 0.40, 0.66, 1.03, 1.61, 2.34, 2.86, 3.99, 4.78, 5.37, 5.92,
        6.27, 6.71, 6.72, 6.52, 6.14, 5.84, 5.44, 5.09, 4.68, 4.15, 3.51, 2.95, 2.03, 1.66, 1.38,
        1.05, 0.60, 0.35, 0.32, 0.12, 0.10, 0.16, 0.25, 0.24, 0.38, 0.28, 0.36, 0.65, 1.58,
    ],
    section_len_m: 0.378_932e-2,
};

/// Table lookup by selector.
pub fn area_function(vowel: Vowel) -> &'static AreaFunction {
    match vowel {
        Vowel::A => &VOWEL_A,
        Vowel::U => &VOWEL_U,
        Vowel::I => &VOWEL_I,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_positive() {
        for af in [&VOWEL_A, &VOWEL_U, &VOWEL_I] {
            assert!(af.areas_cm2.iter().all(|&a| a > 0.0), "vowel {}", af.name);
            assert!(af.section_len_m > 0.0);
        }
    }

    #[test]
    fn test_tract_lengths_plausible() {
        // Adult vocal tracts run roughly 15-19 cm.
        for af in [&VOWEL_A, &VOWEL_U, &VOWEL_I] {
            let len = af.tract_len_m();
            assert!((0.15..0.19).contains(&len), "vowel {} len {len}", af.name);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(area_function(Vowel::A).name, "a");
        assert_eq!(area_function(Vowel::I).name, "i");
        assert_eq!(area_function(Vowel::U).name, "u");
    }
}
