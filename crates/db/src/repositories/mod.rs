//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod font_score_repo;

pub use font_score_repo::FontScoreRepo;
