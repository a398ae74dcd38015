//! Random Source Port

/// Source of uniform draws in `[0, 1)` for the simulation fallback.
pub trait UniformSource: Send {
    fn next_unit(&mut self) -> f64;
}
