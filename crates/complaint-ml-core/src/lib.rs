pub mod tensor;
pub mod sparse;
pub mod dtype;
pub mod error;
pub mod class_weight;

pub use tensor::Tensor;
pub use sparse::{SparseMatrix, SparseRow};
pub use dtype::Float;
pub use error::{TensorError, TensorResult};
pub use class_weight::{class_counts, ClassWeight};
