//! Pairwise uncertainty relations.

use crate::distribution::Distribution;
use crate::error::ParamSpaceError;
use crate::parameter::Parameter;
use qrl_types::ParameterId;

/// Constraint `σ(first) · σ(second) ≥ constant` between two distinct
/// parameters.
///
/// Parameters are referenced by identity. The names are kept only for
/// reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct UncertaintyRelation {
    first: ParameterId,
    second: ParameterId,
    first_name: String,
    second_name: String,
    constant: f64,
}

impl UncertaintyRelation {
    /// Create a relation between two parameters.
    ///
    /// Fails with [`ParamSpaceError::SameParameter`] if both arguments are the
    /// same parameter (by identity) and with
    /// [`ParamSpaceError::NegativeConstant`] if `constant < 0`.
    pub fn new(
        first: &Parameter,
        second: &Parameter,
        constant: f64,
    ) -> Result<Self, ParamSpaceError> {
        if first.id() == second.id() {
            return Err(ParamSpaceError::SameParameter(first.name().to_string()));
        }
        if constant.is_nan() {
            return Err(ParamSpaceError::InvalidNumeric(format!(
                "constant = {constant}"
            )));
        }
        if constant < 0.0 {
            return Err(ParamSpaceError::NegativeConstant(constant));
        }
        Ok(Self {
            first: first.id(),
            second: second.id(),
            first_name: first.name().to_string(),
            second_name: second.name().to_string(),
            constant,
        })
    }

    pub fn first(&self) -> ParameterId {
        self.first
    }

    pub fn second(&self) -> ParameterId {
        self.second
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn second_name(&self) -> &str {
        &self.second_name
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Check if the relation touches a parameter.
    pub fn involves(&self, id: ParameterId) -> bool {
        self.first == id || self.second == id
    }

    /// Check if the relation joins `a` and `b`, in either order.
    pub fn connects(&self, a: ParameterId, b: ParameterId) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }

    /// Evaluate the relation against a pair of laws.
    ///
    /// Returns `Ok(false)` when either law is not owned by the expected
    /// endpoint, so laws wired to the wrong parameter can never satisfy a
    /// relation. NaN or infinite uncertainties (or an overflowing product)
    /// are reported as [`ParamSpaceError::InvalidNumeric`].
    pub fn is_satisfied(
        &self,
        first: &Distribution,
        second: &Distribution,
    ) -> Result<bool, ParamSpaceError> {
        if first.owner() != Some(self.first) || second.owner() != Some(self.second) {
            return Ok(false);
        }

        let sigma_first = first.std_dev();
        let sigma_second = second.std_dev();
        let product = sigma_first * sigma_second;
        if !sigma_first.is_finite() || !sigma_second.is_finite() || !product.is_finite() {
            return Err(ParamSpaceError::InvalidNumeric(format!(
                "σ({}) · σ({}) = {sigma_first} · {sigma_second}",
                self.first_name, self.second_name
            )));
        }

        Ok(product >= self.constant)
    }
}
