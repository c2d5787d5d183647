//! Differentiable function pairs for activations and costs.
//!
//! An activation or cost is plain data: a named pair of pure `fn` pointers
//! exposing the value and its derivative. The gradient engine applies them
//! uniformly and never special-cases a particular pair; in particular the
//! output-layer error is always `cost.prime ⊙ activation.prime`, and any
//! algebraic simplification lives in the pair itself.

/// A named (value, derivative) pair. `F` is the unary activation role
/// (`fn(f64) -> f64`) or the binary actual-vs-desired cost role
/// (`fn(f64, f64) -> f64`).
#[derive(Clone, Copy, Debug)]
pub struct Differentiable<F> {
    pub name: &'static str,
    pub value: F,
    pub prime: F,
}

pub type Activation = Differentiable<fn(f64) -> f64>;
pub type Cost = Differentiable<fn(f64, f64) -> f64>;

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn sigmoid_prime(z: f64) -> f64 {
    let s = sigmoid(z);
    s * (1.0 - s)
}

fn quadratic(actual: f64, desired: f64) -> f64 {
    (desired - actual) * (desired - actual)
}

fn quadratic_prime(actual: f64, desired: f64) -> f64 {
    actual - desired
}

fn cross_entropy(actual: f64, desired: f64) -> f64 {
    -desired * actual.ln() - (1.0 - desired) * (1.0 - actual).ln()
}

// dC/da = (a - y) / (a * (1 - a)). For a sigmoid output layer the engine's
// multiplication by sigmoid'(z) = a * (1 - a) cancels this denominator,
// leaving the familiar (a - y) error term.
fn cross_entropy_prime(actual: f64, desired: f64) -> f64 {
    (actual - desired) / (actual * (1.0 - actual))
}

pub const SIGMOID: Activation = Differentiable {
    name: "sigmoid",
    value: sigmoid,
    prime: sigmoid_prime,
};

pub const QUADRATIC: Cost = Differentiable {
    name: "quadratic",
    value: quadratic,
    prime: quadratic_prime,
};

pub const CROSS_ENTROPY: Cost = Differentiable {
    name: "cross-entropy",
    value: cross_entropy,
    prime: cross_entropy_prime,
};
