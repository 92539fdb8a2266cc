pub mod dummy;

pub use dummy::*;
