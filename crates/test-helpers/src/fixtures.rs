//! Parameter-space and RNG fixtures.

use qrl_paramspace::{Distribution, Parameter, ParameterId, ParameterSpace, UncertaintyRelation};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Deterministic RNG for tests.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Handles into the space built by [`block_size_latency_space`].
#[derive(Debug, Clone, Copy)]
pub struct BlockSizeLatency {
    pub block_size: ParameterId,
    pub latency: ParameterId,
}

/// The reference two-parameter space.
///
/// - `block_size`: bounds `[1, 10]` with a uniform law (σ ≈ 2.6)
/// - `latency`: bounds `[0.1, 5]` with `Normal(2.0, latency_std_dev)`
/// - relation `σ(block_size) · σ(latency) ≥ constant`
///
/// # Panics
///
/// Panics if `latency_std_dev` is not positive or `constant` is negative.
pub fn block_size_latency_space(
    latency_std_dev: f64,
    constant: f64,
) -> (ParameterSpace, BlockSizeLatency) {
    let mut block_size = Parameter::with_bounds("block_size", 1.0, 10.0).expect("valid bounds");
    let uniform = Distribution::uniform(&block_size).expect("uniform over [1, 10]");
    block_size
        .set_distribution(uniform)
        .expect("law built for this parameter");

    let mut latency = Parameter::with_bounds("latency", 0.1, 5.0).expect("valid bounds");
    let normal = Distribution::normal(&latency, 2.0, latency_std_dev).expect("valid normal law");
    latency
        .set_distribution(normal)
        .expect("law built for this parameter");

    let relation =
        UncertaintyRelation::new(&block_size, &latency, constant).expect("valid relation");

    let mut space = ParameterSpace::new();
    let handles = BlockSizeLatency {
        block_size: space.add_parameter(block_size).expect("fresh name"),
        latency: space.add_parameter(latency).expect("fresh name"),
    };
    space.add_relation(relation).expect("both endpoints registered");

    (space, handles)
}
