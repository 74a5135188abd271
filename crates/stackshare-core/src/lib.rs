// stackshare-core - Pure logic for the share pipeline
//
// This crate contains the PURE logic of republishing: elaborating a
// compiled CloudFormation template for public consumption, and building
// the console quick-create link. No I/O, no async, no runtime dependencies.
//
// Orchestration and object storage live in the stackshare binary and
// stackshare-storage.

pub mod error;
pub mod link;
pub mod template;

pub use error::ShareError;
pub use template::{elaborate, Elaborated, ElaborateOptions, ParameterRule};
