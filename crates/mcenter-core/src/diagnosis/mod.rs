//! 20-question small-business self-diagnosis: form validation and weighted
//! scoring across five capability categories.

pub mod form;
pub mod scoring;
