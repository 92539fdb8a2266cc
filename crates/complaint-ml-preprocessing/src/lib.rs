pub mod error;
pub mod encoder;
pub mod text;
pub mod column_transformer;

pub use error::{PreprocessError, PreprocessResult};
pub use encoder::OneHotEncoder;
pub use text::{tokenize, CountVectorizer, ENGLISH_STOP_WORDS};
pub use column_transformer::{FittedPlan, PreprocessingPlan};
