pub mod bernoulli;

pub use bernoulli::*;
