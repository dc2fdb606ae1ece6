//! Observability vocabulary.
//!
//! Event names and field keys shared by every `tracing` call site, so log queries stay
//! stable across layers. Library code only emits events; subscribers are installed by
//! binaries and tests.

pub mod events;
pub mod fields;
