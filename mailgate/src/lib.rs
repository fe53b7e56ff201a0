//! The mailgate service binary.
//!
//! Everything interesting happens in the member crates; this one only
//! deserializes the configuration file into a [`controller::Mailgate`]
//! and runs it.

pub mod controller;
