//! Domain Services - Tree logic that spans more than one aggregate

pub mod ancestry;
pub mod inheritance;
pub mod invariants;
