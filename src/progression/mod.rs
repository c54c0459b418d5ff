pub mod engine;
pub mod mastery;
pub mod phase;
pub mod round;
pub mod rules;
pub mod selector;
pub mod state;
pub mod timing;

// Re-export the pieces a front end drives directly
pub use engine::{record_answer, AnswerOutcome, ProgressEvent};
pub use mastery::{build_level_mastery, MasteryMap, MasteryProgress, SessionStreak};
pub use phase::{available_forms, Phase};
pub use round::{ManualTimer, Round, RoundEnd, RoundTimer, SystemTimer};
pub use rules::ProgressionRules;
pub use selector::{compute_active_pool_size, pick_next_question, resample_pool};
pub use state::{GameState, ItemCatalog, MercyChoice};
pub use timing::{compute_time_limit, TimingPolicy};
