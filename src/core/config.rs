//! Construction settings for the sweep-hull triangulation.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default jitter magnitude added to each coordinate before sorting.
pub const DEFAULT_JITTER: f64 = 1e-6;

/// Lower bound on the jitter magnitude, relative to the largest absolute
/// coordinate of the input. Keeps the perturbation roughly a thousand ulps
/// wide for inputs far from the origin.
pub const JITTER_RELATIVE_FLOOR: f64 = 1024.0 * f64::EPSILON;

/// How far edge legalization propagates after a new triangle is formed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Legalization {
    /// Check the seeded pair and keep checking the edges opposite the new
    /// point after every flip until no illegal edge remains.
    #[default]
    Propagate,
    /// Check only the seeded pair, once. Faster, but the result is not
    /// guaranteed to be Delaunay.
    SingleCheck,
}

impl fmt::Display for Legalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propagate => write!(f, "propagate"),
            Self::SingleCheck => write!(f, "single-check"),
        }
    }
}

/// Settings for [`Triangulation::new_with_config`](crate::core::triangulation::Triangulation::new_with_config).
///
/// # Examples
///
/// ```rust
/// use sweep_delaunay::core::config::{Legalization, SweepConfigBuilder};
///
/// let config = SweepConfigBuilder::default()
///     .jitter(1e-9)
///     .seed(7)
///     .legalization(Legalization::Propagate)
///     .build()
///     .unwrap();
/// assert_eq!(config.seed, Some(7));
///
/// // Negative jitter is rejected at build time.
/// assert!(SweepConfigBuilder::default().jitter(-1.0).build().is_err());
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct SweepConfig {
    /// Upper bound of the uniform perturbation `[0, jitter)` added to each
    /// coordinate. `0.0` disables jitter. A positive value is raised to
    /// [`JITTER_RELATIVE_FLOOR`] times the largest absolute input coordinate
    /// when that is larger.
    pub jitter: f64,
    /// Seed for the jitter RNG. `None` draws from the thread RNG, which makes
    /// the output differ between runs.
    #[builder(setter(strip_option))]
    pub seed: Option<u64>,
    /// Legalization mode.
    pub legalization: Legalization,
    /// Validate the hull cycle after every processed point.
    pub validate_steps: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            jitter: DEFAULT_JITTER,
            seed: None,
            legalization: Legalization::default(),
            validate_steps: false,
        }
    }
}

impl SweepConfig {
    /// Default settings with a fixed jitter seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Default settings with jitter disabled; the input is used verbatim.
    #[must_use]
    pub fn exact() -> Self {
        Self {
            jitter: 0.0,
            ..Self::default()
        }
    }
}

impl SweepConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(jitter) = self.jitter
            && !(jitter.is_finite() && jitter >= 0.0)
        {
            return Err(format!("jitter must be finite and non-negative, got {jitter}"));
        }
        Ok(())
    }
}
