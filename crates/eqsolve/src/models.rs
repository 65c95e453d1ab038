//! These models represent the objects passed between the solver and the assistant service
//!
//! There are two related shapes we need to interact with:
//! - assistant resources (assistants, threads, messages), created through the REST surface
//! - run stream events, decoded from the server-sent events of a streaming run
//!
//! The provider converts the wire formats into these structs immediately, so nothing outside
//! `providers` needs to know about the remote JSON layout.
pub mod assistant;
pub mod events;
pub mod thread;
