//! The parameter registry and its uncertainty validator.

use crate::distribution::Distribution;
use crate::error::ParamSpaceError;
use crate::parameter::Parameter;
use crate::relation::UncertaintyRelation;
use indexmap::IndexMap;
use qrl_types::ParameterId;
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Outcome of [`ParameterSpace::validate_uncertainty_relations`].
///
/// Validation is necessarily partial: relations whose endpoints do not both
/// carry a law cannot be evaluated and land in `skipped`.
#[derive(Debug, Default)]
pub struct ValidationReport<'a> {
    /// Relations found violated, in registration order.
    pub violations: Vec<&'a UncertaintyRelation>,
    /// Relations that could not be evaluated because a law is missing.
    pub skipped: Vec<&'a UncertaintyRelation>,
    /// Relations whose evaluation hit a numeric error.
    pub errors: Vec<(&'a UncertaintyRelation, ParamSpaceError)>,
    /// Relations registered when the report was taken.
    pub total: usize,
}

impl ValidationReport<'_> {
    /// True iff every relation that could be evaluated held.
    ///
    /// A numeric error counts against the result: it is not silently read as
    /// either satisfied or violated, but it is not a pass either.
    pub fn is_satisfied(&self) -> bool {
        self.violations.is_empty() && self.errors.is_empty()
    }

    /// Number of relations that were actually evaluated.
    pub fn evaluated(&self) -> usize {
        self.total.saturating_sub(self.skipped.len())
    }
}

/// Registry owning parameters and the relations between them.
///
/// Parameter names are unique keys. Every registered relation references two
/// parameters present, by identity, in this registry.
///
/// Mutation needs `&mut self`, so registration and validation are serialized
/// by the borrow checker. Wrap in a lock to share across threads.
#[derive(Debug, Default)]
pub struct ParameterSpace {
    /// Insertion-ordered so sampling and iteration are reproducible.
    parameters: IndexMap<String, Parameter>,
    /// Identity index into `parameters`.
    by_id: HashMap<ParameterId, usize>,
    relations: Vec<UncertaintyRelation>,
}

impl ParameterSpace {
    /// Create an empty space.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Register a parameter, taking ownership of it.
    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<ParameterId, ParamSpaceError> {
        if self.parameters.contains_key(parameter.name()) {
            return Err(ParamSpaceError::DuplicateParameter(
                parameter.name().to_string(),
            ));
        }

        let id = parameter.id();
        debug!(%id, name = parameter.name(), "Registered parameter");
        let (index, _) = self
            .parameters
            .insert_full(parameter.name().to_string(), parameter);
        self.by_id.insert(id, index);
        Ok(id)
    }

    /// Register a relation.
    ///
    /// Both endpoints must be registered here by identity; a parameter from
    /// another space with a matching name does not count. At most one
    /// relation per unordered pair.
    pub fn add_relation(&mut self, relation: UncertaintyRelation) -> Result<(), ParamSpaceError> {
        if !self.by_id.contains_key(&relation.first()) {
            return Err(ParamSpaceError::UnknownParameter(
                relation.first_name().to_string(),
            ));
        }
        if !self.by_id.contains_key(&relation.second()) {
            return Err(ParamSpaceError::UnknownParameter(
                relation.second_name().to_string(),
            ));
        }
        if self
            .relations
            .iter()
            .any(|r| r.connects(relation.first(), relation.second()))
        {
            return Err(ParamSpaceError::DuplicateRelation {
                first: relation.first_name().to_string(),
                second: relation.second_name().to_string(),
            });
        }

        debug!(
            first = relation.first_name(),
            second = relation.second_name(),
            constant = relation.constant(),
            "Registered uncertainty relation"
        );
        self.relations.push(relation);
        Ok(())
    }

    pub fn get_parameter(&self, id: ParameterId) -> Option<&Parameter> {
        self.by_id
            .get(&id)
            .and_then(|&index| self.parameters.get_index(index))
            .map(|(_, parameter)| parameter)
    }

    pub fn get_parameter_by_name(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    fn parameter_mut(&mut self, id: ParameterId) -> Result<&mut Parameter, ParamSpaceError> {
        let index = *self
            .by_id
            .get(&id)
            .ok_or_else(|| ParamSpaceError::UnknownParameter(id.to_string()))?;
        self.parameters
            .get_index_mut(index)
            .map(|(_, parameter)| parameter)
            .ok_or_else(|| ParamSpaceError::UnknownParameter(id.to_string()))
    }

    /// Iterate parameters in registration order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    /// Relations in registration order.
    pub fn relations(&self) -> &[UncertaintyRelation] {
        &self.relations
    }

    /// All relations touching a parameter.
    pub fn relations_for(&self, id: ParameterId) -> Vec<&UncertaintyRelation> {
        self.relations.iter().filter(|r| r.involves(id)).collect()
    }

    /// The relation joining two parameters, in either order.
    pub fn relation_between(&self, a: ParameterId, b: ParameterId) -> Option<&UncertaintyRelation> {
        self.relations.iter().find(|r| r.connects(a, b))
    }

    /// Current law of a parameter.
    pub fn get_distribution(&self, id: ParameterId) -> Option<&Distribution> {
        self.get_parameter(id).and_then(Parameter::distribution)
    }

    /// Assign or replace a parameter's law, returning the previous one.
    ///
    /// Fails if the parameter is not registered here or if the law was built
    /// for a different parameter. Violations introduced by the new law are
    /// logged but not refused; see [`Self::set_distribution_constrained`].
    pub fn set_distribution(
        &mut self,
        id: ParameterId,
        distribution: Distribution,
    ) -> Result<Option<Distribution>, ParamSpaceError> {
        let previous = self.parameter_mut(id)?.set_distribution(distribution)?;

        let broken = self.violations_involving(id);
        if broken > 0 {
            debug!(%id, broken, "Distribution assignment leaves relations violated");
        }
        Ok(previous)
    }

    /// Assign a law only if no evaluable relation touching the parameter
    /// ends up violated. On refusal the previous law stays in place.
    pub fn set_distribution_constrained(
        &mut self,
        id: ParameterId,
        distribution: Distribution,
    ) -> Result<Option<Distribution>, ParamSpaceError> {
        let previous = self.parameter_mut(id)?.set_distribution(distribution)?;

        let broken = self.violations_involving(id);
        if broken > 0 {
            let parameter = self.parameter_mut(id)?;
            parameter.restore_distribution(previous);
            return Err(ParamSpaceError::WouldViolate {
                parameter: parameter.name().to_string(),
                violations: broken,
            });
        }
        Ok(previous)
    }

    /// Count relations touching `id` that are violated or numerically broken.
    fn violations_involving(&self, id: ParameterId) -> usize {
        self.relations
            .iter()
            .filter(|r| r.involves(id))
            .filter(|r| matches!(self.evaluate(r), Some(Ok(false)) | Some(Err(_))))
            .count()
    }

    /// Evaluate one relation; `None` if either endpoint lacks a law.
    fn evaluate(&self, relation: &UncertaintyRelation) -> Option<Result<bool, ParamSpaceError>> {
        let first = self.get_distribution(relation.first())?;
        let second = self.get_distribution(relation.second())?;
        Some(relation.is_satisfied(first, second))
    }

    /// Check every registered relation against the current laws.
    ///
    /// Never fails outright: relations with a missing law are skipped and
    /// numeric errors are collected, both with a warning.
    pub fn validate_uncertainty_relations(&self) -> ValidationReport<'_> {
        let mut report = ValidationReport {
            total: self.relations.len(),
            ..Default::default()
        };

        for relation in &self.relations {
            match self.evaluate(relation) {
                None => {
                    warn!(
                        first = relation.first_name(),
                        second = relation.second_name(),
                        "Skipping uncertainty relation: missing distribution"
                    );
                    report.skipped.push(relation);
                }
                Some(Ok(true)) => {}
                Some(Ok(false)) => report.violations.push(relation),
                Some(Err(err)) => {
                    warn!(
                        first = relation.first_name(),
                        second = relation.second_name(),
                        error = %err,
                        "Uncertainty relation could not be evaluated"
                    );
                    report.errors.push((relation, err));
                }
            }
        }

        debug!(
            relations = self.relations.len(),
            violations = report.violations.len(),
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "Validated uncertainty relations"
        );
        report
    }

    /// Widen laws until every violated relation holds.
    ///
    /// For each violated relation the endpoints with a free spread (normal or
    /// truncated Gaussian) are widened: both by `sqrt(C / product)` when both
    /// can move, otherwise the movable one by the full ratio. Uniform laws are
    /// never touched. Widening only grows σ, so a relation repaired earlier
    /// stays satisfied.
    ///
    /// Fails with [`ParamSpaceError::AdjustmentFailed`] if relations remain
    /// violated (or numerically broken) afterwards, and with
    /// [`ParamSpaceError::InvalidNumeric`] if a widened σ overflows. Laws
    /// widened before a failure keep their new spread.
    pub fn adjust_distributions(&mut self) -> Result<(), ParamSpaceError> {
        let violated: Vec<(ParameterId, ParameterId, f64)> = self
            .validate_uncertainty_relations()
            .violations
            .iter()
            .map(|r| (r.first(), r.second(), r.constant()))
            .collect();

        for (first, second, constant) in violated {
            let (Some(law_a), Some(law_b)) =
                (self.get_distribution(first), self.get_distribution(second))
            else {
                continue;
            };
            let (sigma_a, sigma_b) = (law_a.std_dev(), law_b.std_dev());
            if sigma_a * sigma_b >= constant {
                continue;
            }

            let free = (law_a.has_free_spread(), law_b.has_free_spread());
            let (widened_a, widened_b) = match free {
                (true, true) => {
                    let sigma = sigma_a * (constant / (sigma_a * sigma_b)).sqrt();
                    (
                        law_a.with_std_dev(sigma)?,
                        law_b.with_std_dev(covering_std_dev(sigma, constant))?,
                    )
                }
                (true, false) => (
                    law_a.with_std_dev(covering_std_dev(sigma_b, constant))?,
                    None,
                ),
                (false, true) => (
                    None,
                    law_b.with_std_dev(covering_std_dev(sigma_a, constant))?,
                ),
                (false, false) => {
                    warn!(%first, %second, "Relation violated but neither law can be widened");
                    continue;
                }
            };

            for (id, law) in [(first, widened_a), (second, widened_b)] {
                if let Some(law) = law {
                    debug!(%id, std_dev = law.std_dev(), "Widened distribution");
                    self.parameter_mut(id)?.restore_distribution(Some(law));
                }
            }
        }

        let report = self.validate_uncertainty_relations();
        if !report.is_satisfied() {
            return Err(ParamSpaceError::AdjustmentFailed {
                remaining: report.violations.len() + report.errors.len(),
            });
        }
        info!(relations = report.total, "Uncertainty relations satisfied after adjustment");
        Ok(())
    }

    /// Overwrite a parameter's current value.
    pub fn set_current_value(&mut self, id: ParameterId, value: f64) -> Result<(), ParamSpaceError> {
        self.parameter_mut(id)?.set_current_value(value)
    }

    /// Apply one update-rule step to a named parameter.
    pub fn apply_update(
        &mut self,
        name: &str,
        gradient: f64,
        eta: f64,
        dt: f64,
    ) -> Result<f64, ParamSpaceError> {
        self.parameters
            .get_mut(name)
            .ok_or_else(|| ParamSpaceError::UnknownParameter(name.to_string()))?
            .apply_update(gradient, eta, dt)
    }

    /// Draw a fresh current value for every parameter that has a law.
    ///
    /// Parameters without a law are left untouched. Stops at the first
    /// sampling failure; parameters sampled before it keep their new values.
    /// Returns how many parameters were sampled.
    pub fn sample_parameters(&mut self, rng: &mut impl Rng) -> Result<usize, ParamSpaceError> {
        let mut sampled = 0;
        for parameter in self.parameters.values_mut() {
            if parameter.distribution().is_none() {
                continue;
            }
            parameter.sample(rng)?;
            sampled += 1;
        }
        info!(sampled, total = self.parameters.len(), "Sampled parameters");
        Ok(sampled)
    }
}

/// Smallest σ (up to a few ulps) with `partner · σ >= constant`.
fn covering_std_dev(partner: f64, constant: f64) -> f64 {
    let mut sigma = constant / partner;
    while partner * sigma < constant {
        sigma *= 1.0 + f64::EPSILON;
    }
    sigma
}
