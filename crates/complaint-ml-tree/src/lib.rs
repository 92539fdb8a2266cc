pub mod decision_tree;
pub mod random_forest;

pub use decision_tree::*;
pub use random_forest::*;
