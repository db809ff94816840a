//! Domain Models - The vocabulary of ARCHCAP
//!
//! These types represent the "Ubiquitous Language" of capability mapping.
//! Every name here should match how enterprise architects talk about it.

pub mod assignment;
pub mod capability;
pub mod event;
pub mod id;
pub mod level;
pub mod realization;
