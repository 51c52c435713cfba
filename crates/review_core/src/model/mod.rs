//! Review domain model.
//!
//! # Responsibility
//! - Define the in-memory review record and its field rules.
//! - Keep validated and trusted construction paths separate.
//!
//! # Invariants
//! - Instances built through public constructors/setters always hold valid fields.
//! - Only the store assigns or clears `Review::id`.

pub mod review;
