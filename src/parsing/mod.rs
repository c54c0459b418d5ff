pub mod answer_matcher;

// Re-export the matchers the session calls
pub use answer_matcher::{match_button, match_spoken, match_typed, normalize_for_comparison};
