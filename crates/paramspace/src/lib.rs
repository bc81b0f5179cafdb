//! Constrained parameter space.
//!
//! Simulation parameters such as block size or latency are modelled as random
//! variables. Selected pairs of parameters are bound by an uncertainty
//! relation: the product of their standard deviations must never fall below a
//! configured constant.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    ParameterSpace                       │
//! │                                                         │
//! │  parameters: IndexMap<name, Parameter>                  │
//! │      └── Parameter ── owns ──► Option<Distribution>     │
//! │                                                         │
//! │  relations: Vec<UncertaintyRelation>                    │
//! │      └── (ParameterId, ParameterId, C)                  │
//! │                                                         │
//! │  validate ─► σ(a) · σ(b) ≥ C for every evaluable pair   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Parameters are compared by [`ParameterId`], never by name, so a relation
//! built against another registry's parameter is rejected even when the names
//! coincide.
//!
//! All sampling takes an explicit `&mut impl Rng`; seed it for reproducible
//! runs.

mod distribution;
mod error;
mod math;
mod parameter;
mod relation;
mod space;

pub use distribution::{
    Distribution, DistributionKind, Normal, TruncatedGaussian, Uniform,
    DEFAULT_MAX_REJECTION_ATTEMPTS,
};
pub use error::ParamSpaceError;
pub use parameter::{Bounds, Parameter};
pub use relation::UncertaintyRelation;
pub use space::{ParameterSpace, ValidationReport};

pub use qrl_types::ParameterId;
