//! Chain query implementations.

pub mod era;
pub mod nominator;
pub mod validators;
