//! Parameters governed by a distribution.

use crate::distribution::Distribution;
use crate::error::{ensure_finite, ParamSpaceError};
use qrl_types::ParameterId;
use rand::Rng;
use tracing::{debug, warn};

/// Closed interval a parameter's value is meant to live in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// Check if a value lies inside the interval (inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value into the interval.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Width of the interval.
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// A named simulation quantity with an optional law and a current value.
///
/// Identity is carried by [`ParameterId`], allocated at construction.
/// Deliberately not `Clone`: a copy would share the id and therefore the
/// identity of the original.
#[derive(Debug)]
pub struct Parameter {
    id: ParameterId,
    name: String,
    bounds: Option<Bounds>,
    distribution: Option<Distribution>,
    current_value: f64,
}

impl Parameter {
    /// Create a parameter with an optional law.
    ///
    /// Always succeeds. An empty name or a missing distribution is accepted;
    /// both are logged since they usually point at a wiring mistake. An
    /// unowned distribution is bound to the new parameter. A distribution
    /// already owned by another parameter is refused with a warning and the
    /// parameter starts without a law.
    ///
    /// The current value is 0.0 until the parameter is sampled or updated.
    pub fn new(name: impl Into<String>, distribution: Option<Distribution>) -> Self {
        let name = name.into();
        let id = ParameterId::fresh();

        if name.is_empty() {
            debug!(%id, "Parameter created with an empty name");
        }
        if distribution.is_none() {
            debug!(%id, name = %name, "Parameter created without a distribution");
        }

        let distribution = match distribution {
            Some(dist) if dist.owner().is_some() => {
                warn!(
                    %id,
                    name = %name,
                    "Distribution belongs to another parameter; ignoring it"
                );
                None
            }
            Some(mut dist) => {
                dist.bind(id);
                Some(dist)
            }
            None => None,
        };

        Self {
            id,
            name,
            bounds: None,
            distribution,
            current_value: 0.0,
        }
    }

    /// Create a bounded parameter without a law.
    ///
    /// Fails with [`ParamSpaceError::InvalidBounds`] if `min > max`. Equal
    /// bounds are allowed (a pinned parameter), though no uniform law can be
    /// built over them.
    pub fn with_bounds(
        name: impl Into<String>,
        min: f64,
        max: f64,
    ) -> Result<Self, ParamSpaceError> {
        ensure_finite("min", min)?;
        ensure_finite("max", max)?;
        if min > max {
            return Err(ParamSpaceError::InvalidBounds { min, max });
        }
        let mut parameter = Self::new(name, None);
        parameter.bounds = Some(Bounds { min, max });
        Ok(parameter)
    }

    pub fn id(&self) -> ParameterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn distribution(&self) -> Option<&Distribution> {
        self.distribution.as_ref()
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    /// Check a value against the parameter's bounds. Unbounded parameters
    /// accept every finite value.
    pub fn is_within_bounds(&self, value: f64) -> bool {
        match self.bounds {
            Some(bounds) => bounds.contains(value),
            None => value.is_finite(),
        }
    }

    /// Assign a law, returning the previous one.
    ///
    /// An unowned law is bound to this parameter; a law built for another
    /// parameter is refused with [`ParamSpaceError::DistributionMismatch`].
    pub fn set_distribution(
        &mut self,
        mut distribution: Distribution,
    ) -> Result<Option<Distribution>, ParamSpaceError> {
        match distribution.owner() {
            Some(owner) if owner != self.id => {
                return Err(ParamSpaceError::DistributionMismatch(self.name.clone()));
            }
            Some(_) => {}
            None => distribution.bind(self.id),
        }
        Ok(self.distribution.replace(distribution))
    }

    /// Put back a law the registry took out. Skips the ownership check,
    /// which already passed when the law was first assigned.
    pub(crate) fn restore_distribution(&mut self, distribution: Option<Distribution>) {
        self.distribution = distribution;
    }

    /// Overwrite the current value from an external update rule.
    pub fn set_current_value(&mut self, value: f64) -> Result<(), ParamSpaceError> {
        self.current_value = ensure_finite(&self.name, value)?;
        Ok(())
    }

    /// Draw a fresh value from the law and store it.
    pub fn sample(&mut self, rng: &mut impl Rng) -> Result<f64, ParamSpaceError> {
        let distribution = self
            .distribution
            .as_ref()
            .ok_or_else(|| ParamSpaceError::MissingDistribution(self.name.clone()))?;
        let value = distribution.sample(rng)?;
        self.current_value = value;
        Ok(value)
    }

    /// One deterministic Langevin step: `v' = v - eta * dt * gradient`.
    ///
    /// The result is clamped to the law's support (if bounded) and then to the
    /// parameter's own bounds. Noise and diffusion terms are not modelled.
    pub fn apply_update(
        &mut self,
        gradient: f64,
        eta: f64,
        dt: f64,
    ) -> Result<f64, ParamSpaceError> {
        let distribution = self
            .distribution
            .as_ref()
            .ok_or_else(|| ParamSpaceError::MissingDistribution(self.name.clone()))?;

        let mut next = self.current_value - eta * dt * gradient;
        if let Some((min, max)) = distribution.bounds() {
            next = next.clamp(min, max);
        }
        if let Some(bounds) = self.bounds {
            next = bounds.clamp(next);
        }

        self.current_value = ensure_finite(&self.name, next)?;
        Ok(self.current_value)
    }
}
