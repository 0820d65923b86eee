//! # Codeloom Engine
//!
//! The per-turn orchestration loop — the heart of codeloom.
//!
//! One turn follows a fixed cycle:
//!
//! 1. **Attach** the editor's items to the last turn
//! 2. **Advertise** the tool-capable kinds' callable tools
//! 3. **Assemble** every turn into role-tagged messages
//! 4. **Call the model** via the wired runtime
//! 5. **If tool calls**: execute the batch (settle-all), reconcile the
//!    results into the last turn's attachments, and loop back to step 2
//! 6. **If content**: append the AI turn and return the new context value
//!
//! The loop terminates when the model returns plain content or the
//! configured round limit is reached.

pub mod runner;

pub use runner::{TurnOutcome, TurnPhase, TurnRunner};
