pub mod auth;
pub mod feedback;
pub mod font_scores;
