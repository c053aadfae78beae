#![allow(clippy::all)] // TODO: Remove this later

pub mod serde_support;
pub mod common;
pub mod crypto;
pub mod tss;
pub mod protocols;