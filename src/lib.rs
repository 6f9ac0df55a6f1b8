//! SIP and TEL URI parsing, comparison, and conversion.
//!
//! This crate implements the addressing primitives of a SIP signaling
//! stack: it parses `sip:`/`sips:`/`tel:` (and other-scheme) URIs into
//! structured values per [RFC 3261](https://tools.ietf.org/html/rfc3261)
//! and [RFC 3966](https://tools.ietf.org/html/rfc3966), re-encodes them to
//! wire-exact text, compares them with the order-independent parameter
//! semantics routing code expects, ranks them by `q` preference, and
//! converts telephone URIs into SIP URIs per
//! [RFC 3398](https://tools.ietf.org/html/rfc3398).
//!
//! # Examples
//!
//! ```rust
//! use sip_uri_core::prelude::*;
//!
//! // Parse and inspect
//! let uri = Uri::parse("sips:alice@example.com:5061;transport=tls").unwrap();
//! assert_eq!(uri.scheme(), &Scheme::Sips);
//! assert_eq!(uri.user(), Some("alice"));
//! assert_eq!(uri.port(), Some(5061));
//!
//! // Round-trip
//! assert_eq!(uri.to_string(), "sips:alice@example.com:5061;transport=tls");
//!
//! // Telephone conversion
//! let tel = Uri::parse("tel:+14085551212;isub=1411").unwrap();
//! let sip = Uri::from_tel(&tel, "gw.example.com").unwrap();
//! assert_eq!(sip.to_string(), "sip:+14085551212;isub=1411@gw.example.com;user=phone");
//! ```

pub mod error;
pub mod parser;
pub mod types;

pub use error::{Error, Result};
pub use types::param::{KnownParam, Param, ParamId, ParamKind, Params};
pub use types::uri::{greater_q, Scheme, Uri};

/// Re-export of common types and functions
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::param::{KnownParam, Param, ParamId, ParamKind, Params};
    pub use crate::types::uri::{greater_q, Scheme, Uri};
}
