// Shared type definitions
// Each submodule defines types used on both sides of the host/view boundary.

pub mod errors;
pub mod messages;
pub mod session;
pub mod settings;
pub mod tab;
