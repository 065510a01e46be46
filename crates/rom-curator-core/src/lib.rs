pub mod catalog;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod progress;
pub mod scanner;
pub mod session;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use fingerprint::Fingerprint;
pub use matcher::{MatchCandidate, MatchMethod, MatchOutcome, Matcher};
pub use model::LocalItem;
pub use progress::{ProgressReporter, SilentReporter};
pub use session::{MatchSession, ReviewDecision, SessionOutcome};
