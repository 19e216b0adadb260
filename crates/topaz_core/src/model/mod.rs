//! Read models handed to front ends.
//!
//! # Responsibility
//! - Define the plain data shapes returned by note/tag reads.
//! - Keep the aggregated and flattened note views as distinct types.
//!
//! # Invariants
//! - Models carry no storage handles; they are detached copies of rows.

pub mod note;
