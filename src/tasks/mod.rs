//! Builtin transform/aggregate capabilities
//!
//! Two ready-made task pairs for the pipeline engine: letter frequency
//! counting and whole-word line search. Both double as reference
//! implementations of the capability contracts.

pub mod letter_count;
pub mod word_find;

pub use letter_count::{LetterCountAggregate, LetterCountTransform};
pub use word_find::{WordFindAggregate, WordFindTransform};
