//! # URI Types
//!
//! Core type definitions for the URI grammar engine.
//!
//! - [`Uri`] - the structured identifier (e.g. "sip:user@example.com")
//! - [`Scheme`] - URI scheme (sip, sips, tel, other)
//! - [`Params`] - the order-preserving parameter store
//! - [`Param`] / [`ParamId`] / [`KnownParam`] / [`ParamKind`] - the
//!   parameter model and registry

pub mod param;
pub mod uri;

pub use param::{KnownParam, Param, ParamId, ParamKind, Params};
pub use uri::{greater_q, Scheme, Uri};
