//! The three detection rules. Each is independent of the others and only
//! reads from its sources.

pub mod install_elevated;
pub mod modifiable;
pub mod unquoted;
