//! # ecompta-core — Foundational Types
//!
//! Leaf crate of the eCompta lifecycle workspace. Every other crate depends
//! on it; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for record identifiers.** `CompanyId`, `UserId` and
//!    `ExecutionId` cannot be swapped for one another at call sites.
//!
//! 2. **Validated codes.** `CountryCode` and `CurrencyCode` are checked at
//!    construction and on deserialization. A lower-case or overlong code never
//!    reaches a lifecycle record.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC with seconds precision, so
//!    two snapshots of the same instant serialize identically.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement `Serialize`/`Deserialize`.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::CoreError;
pub use identity::{CompanyId, CountryCode, CurrencyCode, ExecutionId, UserId};
pub use temporal::Timestamp;
