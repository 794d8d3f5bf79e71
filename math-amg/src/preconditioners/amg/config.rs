//! AMG configuration
//!
//! All knobs of the hierarchy setup and of the cycle live in [`AmgConfig`].
//! The struct is serde-serializable so runs can be driven from JSON files.

use crate::error::{AmgError, Result};
use crate::traits::ComplexField;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Scalar norm of a matrix entry used by the strength-of-connection test
/// and by the interpolation weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrengthNorm {
    /// max(|re|, |im|), the conservative choice; equals |a| on real entries
    #[default]
    MaxComponent,

    /// |a|, the modulus of the entry
    Modulus,
}

impl StrengthNorm {
    /// Evaluate the norm of one entry
    #[inline]
    pub fn eval<T: ComplexField>(self, value: T) -> T::Real {
        match self {
            StrengthNorm::MaxComponent => value.max_component_norm(),
            StrengthNorm::Modulus => value.norm(),
        }
    }
}

/// Smoother type for AMG relaxation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AmgSmoother {
    /// Symmetric Gauss-Seidel - forward then backward sweep
    #[default]
    SymmetricGaussSeidel,

    /// Damped Jacobi relaxation (ω = `jacobi_weight`)
    Jacobi,

    /// l1-Jacobi - Jacobi with l1 row-norm scaling, no damping needed
    L1Jacobi,
}

/// Configuration for the AMG hierarchy and cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmgConfig {
    /// Strong connection threshold θ (default: 0.25)
    /// Connections with |a_ij| >= θ * max_k |a_ik| are considered strong
    pub strength_threshold: f64,

    /// Maximum number of levels in the hierarchy, coarsest included
    pub max_levels: usize,

    /// Levels with fewer rows than this are solved directly
    pub min_coarse_size: usize,

    /// Levels denser than this fraction (nnz / n²) are solved directly
    pub max_coarse_density: f64,

    /// Run the second, aggressive coarsening pass on the finest level
    pub aggressive_coarsening: bool,

    /// Number of two-hop paths needed to connect two coarse nodes in the
    /// aggressive pass (1 = "A1", 2 = "A2")
    pub aggressive_paths: usize,

    /// Entry norm for strength and weights
    pub strength_norm: StrengthNorm,

    /// Smoother for pre- and post-relaxation
    pub smoother: AmgSmoother,

    /// Number of pre-smoothing sweeps (ν₁)
    pub num_pre_smooth: usize,

    /// Number of post-smoothing sweeps (ν₂)
    pub num_post_smooth: usize,

    /// Jacobi damping parameter (ω)
    pub jacobi_weight: f64,
}

impl Default for AmgConfig {
    fn default() -> Self {
        Self {
            strength_threshold: 0.25,
            max_levels: 10,
            min_coarse_size: 100,
            max_coarse_density: 0.5,
            aggressive_coarsening: false,
            aggressive_paths: 2,
            strength_norm: StrengthNorm::default(),
            smoother: AmgSmoother::default(),
            num_pre_smooth: 1,
            num_post_smooth: 1,
            jacobi_weight: 2.0 / 3.0,
        }
    }
}

impl AmgConfig {
    /// Aggressive coarsening where one two-hop path connects coarse nodes
    pub fn aggressive_a1() -> Self {
        Self {
            aggressive_coarsening: true,
            aggressive_paths: 1,
            ..Default::default()
        }
    }

    /// Aggressive coarsening requiring two distinct two-hop paths
    pub fn aggressive_a2() -> Self {
        Self {
            aggressive_coarsening: true,
            aggressive_paths: 2,
            ..Default::default()
        }
    }

    /// Check that every parameter is in range
    pub fn validate(&self) -> Result<()> {
        if !(self.strength_threshold > 0.0 && self.strength_threshold <= 1.0) {
            return Err(AmgError::InvalidConfig(format!(
                "strength_threshold must be in (0, 1], got {}",
                self.strength_threshold
            )));
        }
        if self.max_levels == 0 {
            return Err(AmgError::InvalidConfig(
                "max_levels must be at least 1".to_string(),
            ));
        }
        if !(self.max_coarse_density > 0.0 && self.max_coarse_density <= 1.0) {
            return Err(AmgError::InvalidConfig(format!(
                "max_coarse_density must be in (0, 1], got {}",
                self.max_coarse_density
            )));
        }
        if self.aggressive_paths == 0 {
            return Err(AmgError::InvalidConfig(
                "aggressive_paths must be at least 1".to_string(),
            ));
        }
        if self.smoother == AmgSmoother::Jacobi
            && !(self.jacobi_weight > 0.0 && self.jacobi_weight <= 1.0)
        {
            return Err(AmgError::InvalidConfig(format!(
                "jacobi_weight must be in (0, 1], got {}",
                self.jacobi_weight
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AmgConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
