//! These models represent the objects exchanged with the assistants service
//!
//! There are a few related formats we need to interact with:
//! - the json body posted to the relay by its callers
//! - openai thread messages, both appended by us and listed back after a run
//! - openai run objects, polled until they reach a terminal status
//! - openai chat completion messages, used by the single-shot exchange
//!
//! We always immediately convert those payloads into the internal structs using
//! the helpers in `providers::utils`, so the rest of the crate never touches raw json.
pub mod content;
pub mod message;
pub mod role;
pub mod run;
