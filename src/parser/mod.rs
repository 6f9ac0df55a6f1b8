//! Parsers for SIP and TEL URIs.
//!
//! Parsers are plain functions over `&[u8]` returning [`ParseResult`].
//! The rest-slice carries position: the distance consumed from the
//! original input is the byte offset reported in parse failures.

pub mod uri;
pub mod utils;

use nom::IResult;

/// Result type shared by every parser in this module.
pub type ParseResult<'a, T> = IResult<&'a [u8], T>;

pub use uri::parse_uri;
