//! Domain Layer
//!
//! The core of envgate - reconciliation logic without I/O dependencies.
//!
//! ## Structure
//!
//! - `entities/` - Contract, secret references, targets, desired/deployed state
//! - `value_objects/` - Immutable value types (VarType, Provider, ContentHash)
//! - `policies/` - Rule matching, auth posture, preflight
//! - `services/` - Desired-state builder and differ
//! - `ports/` - Interface definitions for infrastructure
//!
//! ## Design Principles
//!
//! 1. **No I/O** - This layer never touches the file system or network directly
//! 2. **Pure Functions** - Services are stateless and testable
//! 3. **Ports & Adapters** - All I/O goes through trait-defined ports

pub mod entities;
pub mod policies;
pub mod ports;
pub mod services;
pub mod value_objects;
