//! The distribution family.
//!
//! A closed set of laws, matched exhaustively. Each law may be owned by a
//! parameter; ownership is what the registry checks before it lets a
//! distribution be assigned or compared inside a relation.

use crate::error::{ensure_finite, ParamSpaceError};
use crate::math::{normal_cdf, normal_pdf, standard_normal};
use crate::parameter::Parameter;
use qrl_types::ParameterId;
use rand::Rng;
use std::fmt;

/// Default cap on rejection-sampling attempts for [`TruncatedGaussian`].
pub const DEFAULT_MAX_REJECTION_ATTEMPTS: u32 = 10_000;

/// Tag identifying a distribution variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionKind {
    Uniform,
    Normal,
    TruncatedGaussian,
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistributionKind::Uniform => "uniform",
            DistributionKind::Normal => "normal",
            DistributionKind::TruncatedGaussian => "truncated_gaussian",
        };
        f.write_str(name)
    }
}

/// Uniform law over `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    owner: Option<ParameterId>,
    min: f64,
    max: f64,
}

impl Uniform {
    /// Create an unowned uniform law. The range must be strictly positive.
    pub fn new(min: f64, max: f64) -> Result<Self, ParamSpaceError> {
        ensure_finite("min", min)?;
        ensure_finite("max", max)?;
        if max <= min {
            return Err(ParamSpaceError::InvalidBounds { min, max });
        }
        // Finite bounds can still be too far apart to subtract.
        ensure_finite("max - min", max - min)?;
        Ok(Self {
            owner: None,
            min,
            max,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    fn width(&self) -> f64 {
        self.max - self.min
    }

    fn pdf(&self, x: f64) -> f64 {
        if x < self.min || x > self.max {
            0.0
        } else {
            1.0 / self.width()
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        if x <= self.min {
            0.0
        } else if x >= self.max {
            1.0
        } else {
            (x - self.min) / self.width()
        }
    }

    fn std_dev(&self) -> f64 {
        self.width() / 12f64.sqrt()
    }

    /// `min + width · u` for `u` in `[0, 1)`. `new` guarantees a finite width.
    fn sample(&self, rng: &mut impl Rng) -> f64 {
        (self.min + self.width() * rng.gen::<f64>()).min(self.max)
    }
}

/// Unbounded Gaussian law.
///
/// Bounds are never enforced here, even when the owning parameter has them;
/// use [`TruncatedGaussian`] for a bounded law.
#[derive(Debug, Clone, PartialEq)]
pub struct Normal {
    owner: Option<ParameterId>,
    mean: f64,
    std_dev: f64,
}

impl Normal {
    /// Create an unowned normal law.
    pub fn new(mean: f64, std_dev: f64) -> Result<Self, ParamSpaceError> {
        ensure_finite("mean", mean)?;
        ensure_finite("std_dev", std_dev)?;
        if std_dev <= 0.0 {
            return Err(ParamSpaceError::InvalidStdDev(std_dev));
        }
        Ok(Self {
            owner: None,
            mean,
            std_dev,
        })
    }
}

/// Gaussian law restricted to `[min, max]`, sampled by rejection.
///
/// [`Distribution::mean`] and [`Distribution::std_dev`] report the configured
/// (untruncated) moments, not those of the truncated law.
///
/// Sampling draws from the untruncated Gaussian until a draw lands inside the
/// bounds. When the bounds hold negligible probability mass this can take an
/// arbitrary number of draws, so the loop is capped at `max_attempts` and
/// fails with [`ParamSpaceError::SamplingExhausted`] instead of stalling.
#[derive(Debug, Clone, PartialEq)]
pub struct TruncatedGaussian {
    owner: Option<ParameterId>,
    mean: f64,
    std_dev: f64,
    min: f64,
    max: f64,
    max_attempts: u32,
}

impl TruncatedGaussian {
    /// Create an unowned truncated Gaussian.
    pub fn new(mean: f64, std_dev: f64, min: f64, max: f64) -> Result<Self, ParamSpaceError> {
        ensure_finite("mean", mean)?;
        ensure_finite("std_dev", std_dev)?;
        ensure_finite("min", min)?;
        ensure_finite("max", max)?;
        if std_dev <= 0.0 {
            return Err(ParamSpaceError::InvalidStdDev(std_dev));
        }
        if min >= max {
            return Err(ParamSpaceError::InvalidBounds { min, max });
        }
        Ok(Self {
            owner: None,
            mean,
            std_dev,
            min,
            max,
            max_attempts: DEFAULT_MAX_REJECTION_ATTEMPTS,
        })
    }

    /// Set the rejection-sampling cap (at least one attempt is always made).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Probability mass of the untruncated law inside the bounds.
    fn mass(&self) -> f64 {
        normal_cdf(self.max, self.mean, self.std_dev) - normal_cdf(self.min, self.mean, self.std_dev)
    }

    fn pdf(&self, x: f64) -> f64 {
        let mass = self.mass();
        if x < self.min || x > self.max || mass <= 0.0 {
            return 0.0;
        }
        normal_pdf(x, self.mean, self.std_dev) / mass
    }

    fn cdf(&self, x: f64) -> f64 {
        if x <= self.min {
            return 0.0;
        }
        if x >= self.max {
            return 1.0;
        }
        let mass = self.mass();
        if mass <= 0.0 {
            return 0.0;
        }
        (normal_cdf(x, self.mean, self.std_dev) - normal_cdf(self.min, self.mean, self.std_dev))
            / mass
    }

    fn sample(&self, rng: &mut impl Rng) -> Result<f64, ParamSpaceError> {
        for _ in 0..self.max_attempts {
            let draw = self.mean + self.std_dev * standard_normal(rng);
            if draw >= self.min && draw <= self.max {
                return Ok(draw);
            }
        }
        Err(ParamSpaceError::SamplingExhausted {
            attempts: self.max_attempts,
            min: self.min,
            max: self.max,
        })
    }
}

/// A probability law over the reals.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    Uniform(Uniform),
    Normal(Normal),
    TruncatedGaussian(TruncatedGaussian),
}

impl Distribution {
    /// Uniform law over the parameter's bounds, owned by that parameter.
    ///
    /// Fails with [`ParamSpaceError::InvalidParameter`] if the parameter has no
    /// bounds and with [`ParamSpaceError::InvalidBounds`] if `max <= min`.
    pub fn uniform(parameter: &Parameter) -> Result<Self, ParamSpaceError> {
        let bounds = parameter
            .bounds()
            .ok_or_else(|| ParamSpaceError::InvalidParameter(parameter.name().to_string()))?;
        let mut law = Uniform::new(bounds.min, bounds.max)?;
        law.owner = Some(parameter.id());
        Ok(Distribution::Uniform(law))
    }

    /// Normal law owned by `parameter`.
    pub fn normal(parameter: &Parameter, mean: f64, std_dev: f64) -> Result<Self, ParamSpaceError> {
        let mut law = Normal::new(mean, std_dev)?;
        law.owner = Some(parameter.id());
        Ok(Distribution::Normal(law))
    }

    /// Truncated Gaussian owned by `parameter`.
    pub fn truncated_gaussian(
        parameter: &Parameter,
        mean: f64,
        std_dev: f64,
        min: f64,
        max: f64,
    ) -> Result<Self, ParamSpaceError> {
        let mut law = TruncatedGaussian::new(mean, std_dev, min, max)?;
        law.owner = Some(parameter.id());
        Ok(Distribution::TruncatedGaussian(law))
    }

    pub fn kind(&self) -> DistributionKind {
        match self {
            Distribution::Uniform(_) => DistributionKind::Uniform,
            Distribution::Normal(_) => DistributionKind::Normal,
            Distribution::TruncatedGaussian(_) => DistributionKind::TruncatedGaussian,
        }
    }

    /// The parameter this law was built for, if any.
    pub fn owner(&self) -> Option<ParameterId> {
        match self {
            Distribution::Uniform(d) => d.owner,
            Distribution::Normal(d) => d.owner,
            Distribution::TruncatedGaussian(d) => d.owner,
        }
    }

    pub(crate) fn bind(&mut self, owner: ParameterId) {
        match self {
            Distribution::Uniform(d) => d.owner = Some(owner),
            Distribution::Normal(d) => d.owner = Some(owner),
            Distribution::TruncatedGaussian(d) => d.owner = Some(owner),
        }
    }

    /// Check if the spread can change independently of the support.
    ///
    /// A uniform law's standard deviation is fixed by its bounds.
    pub fn has_free_spread(&self) -> bool {
        !matches!(self, Distribution::Uniform(_))
    }

    /// Copy of this law with a different standard deviation, keeping the
    /// owner, mean and bounds. `None` for laws without a free spread.
    pub fn with_std_dev(&self, std_dev: f64) -> Result<Option<Self>, ParamSpaceError> {
        ensure_finite("std_dev", std_dev)?;
        if std_dev <= 0.0 {
            return Err(ParamSpaceError::InvalidStdDev(std_dev));
        }
        let law = match self {
            Distribution::Uniform(_) => return Ok(None),
            Distribution::Normal(d) => Distribution::Normal(Normal {
                std_dev,
                ..d.clone()
            }),
            Distribution::TruncatedGaussian(d) => {
                Distribution::TruncatedGaussian(TruncatedGaussian {
                    std_dev,
                    ..d.clone()
                })
            }
        };
        Ok(Some(law))
    }

    /// Support bounds, if the law has any.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            Distribution::Uniform(d) => Some((d.min, d.max)),
            Distribution::Normal(_) => None,
            Distribution::TruncatedGaussian(d) => Some((d.min, d.max)),
        }
    }

    pub fn mean(&self) -> f64 {
        match self {
            Distribution::Uniform(d) => (d.min + d.max) / 2.0,
            Distribution::Normal(d) => d.mean,
            Distribution::TruncatedGaussian(d) => d.mean,
        }
    }

    /// The uncertainty used by relations.
    pub fn std_dev(&self) -> f64 {
        match self {
            Distribution::Uniform(d) => d.std_dev(),
            Distribution::Normal(d) => d.std_dev,
            Distribution::TruncatedGaussian(d) => d.std_dev,
        }
    }

    pub fn pdf(&self, x: f64) -> f64 {
        match self {
            Distribution::Uniform(d) => d.pdf(x),
            Distribution::Normal(d) => normal_pdf(x, d.mean, d.std_dev),
            Distribution::TruncatedGaussian(d) => d.pdf(x),
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            Distribution::Uniform(d) => d.cdf(x),
            Distribution::Normal(d) => normal_cdf(x, d.mean, d.std_dev),
            Distribution::TruncatedGaussian(d) => d.cdf(x),
        }
    }

    /// Draw one sample. Only the truncated law can fail.
    pub fn sample(&self, rng: &mut impl Rng) -> Result<f64, ParamSpaceError> {
        match self {
            Distribution::Uniform(d) => Ok(d.sample(rng)),
            Distribution::Normal(d) => Ok(d.mean + d.std_dev * standard_normal(rng)),
            Distribution::TruncatedGaussian(d) => d.sample(rng),
        }
    }
}

impl From<Uniform> for Distribution {
    fn from(law: Uniform) -> Self {
        Distribution::Uniform(law)
    }
}

impl From<Normal> for Distribution {
    fn from(law: Normal) -> Self {
        Distribution::Normal(law)
    }
}

impl From<TruncatedGaussian> for Distribution {
    fn from(law: TruncatedGaussian) -> Self {
        Distribution::TruncatedGaussian(law)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn bounded(name: &str, min: f64, max: f64) -> Parameter {
        Parameter::with_bounds(name, min, max).unwrap()
    }

    #[test]
    fn test_uniform_pdf_integrates_to_one() {
        let param = bounded("block_size", 2.0, 7.0);
        let dist = Distribution::uniform(&param).unwrap();

        let steps = 10_000;
        let dx = 5.0 / steps as f64;
        let integral: f64 = (0..steps)
            .map(|i| dist.pdf(2.0 + (i as f64 + 0.5) * dx) * dx)
            .sum();

        assert!((integral - 1.0).abs() < 1e-9);
        assert_eq!(dist.pdf(1.999), 0.0);
        assert_eq!(dist.pdf(7.001), 0.0);
    }

    #[test]
    fn test_uniform_cdf_is_a_clamped_ramp() {
        let param = bounded("block_size", 0.0, 10.0);
        let dist = Distribution::uniform(&param).unwrap();

        assert_eq!(dist.cdf(0.0), 0.0);
        assert_eq!(dist.cdf(10.0), 1.0);
        assert_eq!(dist.cdf(-3.0), 0.0);
        assert_eq!(dist.cdf(42.0), 1.0);
        assert!((dist.cdf(2.5) - 0.25).abs() < 1e-12);

        let mut previous = 0.0;
        for i in 0..=100 {
            let value = dist.cdf(-1.0 + i as f64 * 0.12);
            assert!(value >= previous, "CDF must be non-decreasing");
            previous = value;
        }
    }

    #[test]
    fn test_uniform_std_dev() {
        let param = bounded("throughput", 0.0, 10.0);
        let dist = Distribution::uniform(&param).unwrap();
        assert!((dist.std_dev() - 2.886_751).abs() < 1e-6);
        assert_eq!(dist.mean(), 5.0);
    }

    #[test]
    fn test_uniform_requires_positive_range() {
        let degenerate = bounded("fixed", 3.0, 3.0);
        assert_eq!(
            Distribution::uniform(&degenerate),
            Err(ParamSpaceError::InvalidBounds { min: 3.0, max: 3.0 })
        );

        let unbounded = Parameter::new("free", None);
        assert_eq!(
            Distribution::uniform(&unbounded),
            Err(ParamSpaceError::InvalidParameter("free".to_string()))
        );
    }

    #[test]
    fn test_uniform_rejects_unrepresentable_width() {
        assert!(matches!(
            Uniform::new(-f64::MAX, f64::MAX),
            Err(ParamSpaceError::InvalidNumeric(_))
        ));
        // Half the range still fits, and sampling it must not overflow.
        let law: Distribution = Uniform::new(0.0, f64::MAX).unwrap().into();
        assert!(law.std_dev().is_finite());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(law.sample(&mut rng).unwrap() >= 0.0);
    }

    #[test]
    fn test_uniform_samples_stay_in_range() {
        let param = bounded("block_size", 1.0, 10.0);
        let dist = Distribution::uniform(&param).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for _ in 0..500 {
            let x = dist.sample(&mut rng).unwrap();
            assert!((1.0..=10.0).contains(&x));
        }
    }

    #[test]
    fn test_normal_cdf_and_pdf_at_mean() {
        let param = Parameter::new("latency", None);
        let dist = Distribution::normal(&param, 2.0, 0.6).unwrap();

        assert!((dist.cdf(2.0) - 0.5).abs() < 1e-4);
        let expected = 1.0 / (0.6 * (2.0 * std::f64::consts::PI).sqrt());
        assert!((dist.pdf(2.0) - expected).abs() < 1e-12);
        assert_eq!(dist.std_dev(), 0.6);
        assert_eq!(dist.bounds(), None);
    }

    #[test]
    fn test_normal_rejects_non_positive_std_dev() {
        assert_eq!(
            Normal::new(0.0, 0.0),
            Err(ParamSpaceError::InvalidStdDev(0.0))
        );
        assert_eq!(
            Normal::new(0.0, -1.0),
            Err(ParamSpaceError::InvalidStdDev(-1.0))
        );
        assert!(matches!(
            Normal::new(0.0, f64::NAN),
            Err(ParamSpaceError::InvalidNumeric(_))
        ));
    }

    #[test]
    fn test_truncated_gaussian_samples_within_bounds() {
        let dist: Distribution = TruncatedGaussian::new(0.0, 5.0, -1.0, 2.0)
            .unwrap()
            .into();
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        for _ in 0..200 {
            let x = dist.sample(&mut rng).unwrap();
            assert!((-1.0..=2.0).contains(&x), "sample {x} escaped bounds");
        }
    }

    #[test]
    fn test_truncated_gaussian_reports_configured_moments() {
        let dist: Distribution = TruncatedGaussian::new(10.0, 3.0, 0.0, 11.0)
            .unwrap()
            .into();
        assert_eq!(dist.mean(), 10.0);
        assert_eq!(dist.std_dev(), 3.0);
    }

    #[test]
    fn test_truncated_gaussian_construction_errors() {
        assert_eq!(
            TruncatedGaussian::new(0.0, 0.0, 0.0, 1.0),
            Err(ParamSpaceError::InvalidStdDev(0.0))
        );
        assert_eq!(
            TruncatedGaussian::new(0.0, 1.0, 1.0, 1.0),
            Err(ParamSpaceError::InvalidBounds { min: 1.0, max: 1.0 })
        );
    }

    #[test]
    fn test_truncated_gaussian_exhausts_on_negligible_mass() {
        // Bounds sit 1000 standard deviations from the mean.
        let dist: Distribution = TruncatedGaussian::new(0.0, 1.0, 1000.0, 1001.0)
            .unwrap()
            .with_max_attempts(50)
            .into();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        assert_eq!(
            dist.sample(&mut rng),
            Err(ParamSpaceError::SamplingExhausted {
                attempts: 50,
                min: 1000.0,
                max: 1001.0,
            })
        );
        assert_eq!(dist.pdf(1000.5), 0.0);
    }

    #[test]
    fn test_truncated_gaussian_cdf_spans_zero_to_one() {
        let dist: Distribution = TruncatedGaussian::new(0.0, 1.0, -1.0, 1.0)
            .unwrap()
            .into();
        assert_eq!(dist.cdf(-1.0), 0.0);
        assert_eq!(dist.cdf(1.0), 1.0);
        assert!((dist.cdf(0.0) - 0.5).abs() < 1e-6);
        // Renormalised density is taller than the untruncated one.
        assert!(dist.pdf(0.0) > normal_pdf(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_with_std_dev_keeps_owner_and_shape() {
        let param = bounded("latency", 0.1, 5.0);
        let normal = Distribution::normal(&param, 2.0, 0.3).unwrap();
        let wider = normal.with_std_dev(0.9).unwrap().unwrap();
        assert_eq!(wider.std_dev(), 0.9);
        assert_eq!(wider.mean(), 2.0);
        assert_eq!(wider.owner(), Some(param.id()));

        let truncated = Distribution::truncated_gaussian(&param, 1.0, 0.5, 0.1, 5.0).unwrap();
        let wider = truncated.with_std_dev(2.0).unwrap().unwrap();
        assert_eq!(wider.bounds(), Some((0.1, 5.0)));
        assert_eq!(wider.std_dev(), 2.0);

        let uniform = Distribution::uniform(&param).unwrap();
        assert!(!uniform.has_free_spread());
        assert_eq!(uniform.with_std_dev(1.0), Ok(None));

        assert_eq!(
            normal.with_std_dev(0.0),
            Err(ParamSpaceError::InvalidStdDev(0.0))
        );
        assert!(matches!(
            normal.with_std_dev(f64::INFINITY),
            Err(ParamSpaceError::InvalidNumeric(_))
        ));
    }

    #[test]
    fn test_ownership_binding() {
        let param = Parameter::new("latency", None);
        let owned = Distribution::normal(&param, 1.0, 1.0).unwrap();
        assert_eq!(owned.owner(), Some(param.id()));

        let unowned: Distribution = Normal::new(1.0, 1.0).unwrap().into();
        assert_eq!(unowned.owner(), None);
        assert_eq!(unowned.kind(), DistributionKind::Normal);
    }
}
