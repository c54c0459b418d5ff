//*** START FILE: src/lib.rs ***//

// Declare all modules that are part of this library
pub mod config;
pub mod error;
pub mod types {
    pub mod category;
    pub mod vocabulary;
}
pub mod parsing;
pub mod progression;
pub mod profile;
pub mod profile_io;
pub mod prompts;
pub mod session;
pub mod speech;
pub mod stats;

// Re-export the types a front end touches first
pub use config::Config;
pub use error::{DrillError, Result};
pub use profile::Progress;
pub use session::{Answer, GameSession, SubmitOutcome};
pub use types::category::{Category, Form};
pub use types::vocabulary::VocabularyRegistry;

//*** END FILE: src/lib.rs ***//
