//! Conversation engine for ghostpen: the tool registry, system context
//! assembly, the bounded history window and the turn state machine that
//! ties the model, the tools and the human reviewer together.

pub mod context;
pub mod error;
pub mod human;
pub mod intent;
pub mod notion;
pub mod recorder;
pub mod registry;
pub mod runner;
pub mod save;
pub mod session;
pub mod tools;
pub mod usage;

#[cfg(test)]
mod testing;

pub use context::{assemble, AssembledContext, History, ProfileSelection};
pub use error::{EngineError, ProfileSide, SetupError};
pub use human::{ConsoleIo, HumanIo, ScriptedHuman};
pub use intent::{IntentClassifier, UserIntent};
pub use registry::ToolRegistry;
pub use runner::{EngineConfig, SaveReport, SessionOutcome, TurnEngine};
pub use session::Session;
pub use usage::UsageTracker;
