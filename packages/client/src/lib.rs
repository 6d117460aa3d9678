//! Stratum store client boundary.
//!
//! This is the narrow waist between the simplified façade
//! (`stratum-simple`) and whatever actually stores the data. Everything
//! at this level is scalar values and fully-qualified identifiers - no
//! connection policy, no ambient group/layer state, no event loop.
//!
//! Use this layer for:
//! - Implementing a new store backend (see `stratum-memory` for a
//!   complete example)
//! - Talking to a store directly when the façade's ambient addressing
//!   is too coarse
//!
//! # Example
//!
//! ```rust
//! use stratum_client::{KeyIdentifier, Value, ValueKind};
//!
//! let key = KeyIdentifier::typed("settings", "brightness", "user", ValueKind::Int32);
//! let value = Value::from(70i32);
//! assert_eq!(value.kind(), ValueKind::Int32);
//! assert_eq!(key.kind, Some(ValueKind::Int32));
//! ```

mod error;
mod key;
mod traits;
mod value;

pub use error::StoreError;
pub use key::{GroupIdentifier, KeyIdentifier};
pub use traits::{NotifyCallback, StoreClient, StoreTransport};
pub use value::{Value, ValueKind};
