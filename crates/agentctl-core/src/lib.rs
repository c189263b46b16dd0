//! agentctl-core: domain types and the state synchronization core for the
//! agent control client.
//!
//! Pure and deterministic — no IO, no async. Decodes push-channel envelopes
//! into typed events and reconciles them, together with one-shot status
//! snapshots, into derived agent state plus a bounded log buffer.

pub mod normalize;
pub mod reconcile;
pub mod types;
