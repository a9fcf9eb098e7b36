//! Pipeline stages for contract analysis.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the model or the store can be swapped without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ prompt ──▶ analyze ──▶ parse ──▶ store
//! (lopdf)    (template)  (LLM+retry) (JSON?)   (Supabase)
//! ```
//!
//! 1. [`extract`]: PDF bytes to plain text; runs in `spawn_blocking`
//! 2. [`crate::prompts`]: render the analysis template around the text
//! 3. [`analyze`]: call the model with bounded retry; network I/O
//! 4. [`parse`]: reply text to structured flags, or raw-text fallback
//! 5. [`store`]: insert the record; network I/O
//!
//! [`retry`] holds the service-independent bounded-retry helper used by
//! [`analyze`].

pub mod analyze;
pub mod extract;
pub mod parse;
pub mod retry;
pub mod store;
