//! # URI Parameters
//!
//! This module provides types for representing SIP and TEL URI parameters as
//! defined in [RFC 3261](https://datatracker.ietf.org/doc/html/rfc3261) and
//! [RFC 3966](https://datatracker.ietf.org/doc/html/rfc3966).
//!
//! Parameters attach additional information to a URI as `;key=value` or
//! `;key` segments. The module distinguishes *known* parameters (a closed
//! set with declared value kinds and comparison policy) from *unknown*
//! parameters (identified by a normalized name), and provides [`Params`],
//! an order-preserving store with case-insensitive lookup.
//!
//! ## Examples
//!
//! ```rust
//! use sip_uri_core::prelude::*;
//!
//! let mut params = Params::new();
//! params.set(KnownParam::Transport, Some("tcp"));
//! params.set(KnownParam::Lr, None::<&str>);
//! params.set("x-fluffy", Some("foo"));
//!
//! assert_eq!(params.get("TRANSPORT").and_then(|p| p.value()), Some("tcp"));
//! assert!(params.exists_known(KnownParam::Lr));
//! assert!(params.exists("x-fluffy"));
//! ```

use std::fmt;

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::utils::unescape_uri_component;

/// The value kind a known parameter declares.
///
/// Flag parameters carry no value (existence alone matters); integer and
/// real parameters compare numerically; string parameters compare textually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// No value; existence alone matters (e.g. `lr`)
    Flag,
    /// Free-text value (e.g. `transport`, `maddr`)
    String,
    /// Integer value (e.g. `ttl`)
    Integer,
    /// Real value (e.g. `q`)
    Real,
}

/// The closed set of parameter identities this crate recognizes.
///
/// Covers the RFC 3261 uri-parameters plus the RFC 3966 telephone
/// parameters carried through tel→sip conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownParam {
    /// The `transport` parameter (udp, tcp, tls, sctp, ...)
    Transport,
    /// The `maddr` parameter, the multicast/override address
    Maddr,
    /// The `ttl` parameter, time-to-live for multicast
    Ttl,
    /// The `user` parameter (`user=phone` marks telephone-number users)
    User,
    /// The `method` parameter, rarely used in URIs
    Method,
    /// The `lr` flag parameter (loose routing)
    Lr,
    /// The `q` parameter, a preference weight for routing candidates
    Q,
    /// The `comp` parameter (signaling compression, RFC 3486)
    Comp,
    /// The `isub` parameter, an ISDN subaddress (tel)
    Isub,
    /// The `postd` parameter, post-dial digits (tel)
    Postd,
    /// The `phone-context` parameter, a dialing context (tel)
    PhoneContext,
    /// The `tsp` parameter, a telephony service provider (tel)
    Tsp,
}

/// Process-wide registry of known parameter names.
///
/// Immutable and read-only, so it is safe to consult from any thread
/// without synchronization. Lookup is case-insensitive.
pub static KNOWN_PARAMS: &[(&str, KnownParam)] = &[
    ("transport", KnownParam::Transport),
    ("maddr", KnownParam::Maddr),
    ("ttl", KnownParam::Ttl),
    ("user", KnownParam::User),
    ("method", KnownParam::Method),
    ("lr", KnownParam::Lr),
    ("q", KnownParam::Q),
    ("comp", KnownParam::Comp),
    ("isub", KnownParam::Isub),
    ("postd", KnownParam::Postd),
    ("phone-context", KnownParam::PhoneContext),
    ("tsp", KnownParam::Tsp),
];

impl KnownParam {
    /// Canonical (lower-case) wire name of the parameter.
    pub fn name(&self) -> &'static str {
        match self {
            KnownParam::Transport => "transport",
            KnownParam::Maddr => "maddr",
            KnownParam::Ttl => "ttl",
            KnownParam::User => "user",
            KnownParam::Method => "method",
            KnownParam::Lr => "lr",
            KnownParam::Q => "q",
            KnownParam::Comp => "comp",
            KnownParam::Isub => "isub",
            KnownParam::Postd => "postd",
            KnownParam::PhoneContext => "phone-context",
            KnownParam::Tsp => "tsp",
        }
    }

    /// The value kind this parameter declares.
    pub fn kind(&self) -> ParamKind {
        match self {
            KnownParam::Lr => ParamKind::Flag,
            KnownParam::Ttl => ParamKind::Integer,
            KnownParam::Q => ParamKind::Real,
            _ => ParamKind::String,
        }
    }

    /// Looks a name up in the registry, case-insensitively.
    pub fn from_name(name: &str) -> Option<KnownParam> {
        KNOWN_PARAMS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, k)| *k)
    }

    /// Whether the parameter's value compares case-insensitively.
    ///
    /// The RFC 3966 telephone parameters are; everything else is matched
    /// exactly.
    pub fn value_case_insensitive(&self) -> bool {
        matches!(
            self,
            KnownParam::Isub | KnownParam::Postd | KnownParam::PhoneContext | KnownParam::Tsp
        )
    }
}

impl fmt::Display for KnownParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parameter identity: a registry entry, or an unknown name.
///
/// Unknown names are stored normalized (ASCII lower-case), so two spellings
/// of the same name share one identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    /// A parameter from the registry
    Known(KnownParam),
    /// Any other parameter, identified by its normalized name
    Unknown(String),
}

impl ParamId {
    /// Resolves a name against the registry; unmatched names become
    /// [`ParamId::Unknown`] with the name lower-cased.
    pub fn from_name(name: &str) -> ParamId {
        match KnownParam::from_name(name) {
            Some(k) => ParamId::Known(k),
            None => ParamId::Unknown(name.to_ascii_lowercase()),
        }
    }

    /// The name this identity encodes as.
    pub fn name(&self) -> &str {
        match self {
            ParamId::Known(k) => k.name(),
            ParamId::Unknown(n) => n,
        }
    }

    /// The declared value kind. Unknown parameters are string-kind.
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamId::Known(k) => k.kind(),
            ParamId::Unknown(_) => ParamKind::String,
        }
    }

    fn value_case_insensitive(&self) -> bool {
        match self {
            ParamId::Known(k) => k.value_case_insensitive(),
            ParamId::Unknown(_) => false,
        }
    }
}

impl From<KnownParam> for ParamId {
    fn from(k: KnownParam) -> Self {
        ParamId::Known(k)
    }
}

impl From<&str> for ParamId {
    fn from(name: &str) -> Self {
        ParamId::from_name(name)
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single URI parameter: an identity and its raw value text.
///
/// The value is kept exactly as parsed; typed accessors validate lazily so
/// that a malformed `ttl=abc` still round-trips and only fails when read
/// through [`Param::as_integer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    id: ParamId,
    value: Option<String>,
}

impl Param {
    /// Creates a parameter. Flag-kind identities discard any value.
    pub fn new(id: impl Into<ParamId>, value: Option<impl Into<String>>) -> Param {
        let id = id.into();
        let value = match id.kind() {
            ParamKind::Flag => None,
            _ => value.map(Into::into),
        };
        Param { id, value }
    }

    /// The parameter's identity.
    pub fn id(&self) -> &ParamId {
        &self.id
    }

    /// The canonical name the parameter encodes as.
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// The declared value kind.
    pub fn kind(&self) -> ParamKind {
        self.id.kind()
    }

    /// The raw value text, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The value with percent-escapes decoded.
    pub fn value_decoded(&self) -> Result<Option<String>> {
        self.value
            .as_deref()
            .map(|v| unescape_uri_component(v.as_bytes()))
            .transpose()
    }

    /// Reads the value as an integer.
    ///
    /// Fails with [`Error::InvalidParameterValue`] when the stored text is
    /// absent or not a valid integer.
    pub fn as_integer(&self) -> Result<i64> {
        let text = self.value.as_deref().unwrap_or("");
        text.parse().map_err(|_| Error::InvalidParameterValue {
            name: self.name().to_string(),
            value: text.to_string(),
        })
    }

    /// Reads the value as a real number.
    ///
    /// Fails with [`Error::InvalidParameterValue`] when the stored text is
    /// absent, not a valid real, or NaN.
    pub fn as_real(&self) -> Result<NotNan<f32>> {
        let text = self.value.as_deref().unwrap_or("");
        let invalid = || Error::InvalidParameterValue {
            name: self.name().to_string(),
            value: text.to_string(),
        };
        let value: f32 = text.parse().map_err(|_| invalid())?;
        NotNan::new(value).map_err(|_| invalid())
    }

    /// Whether this is a flag parameter (no value).
    pub fn is_flag(&self) -> bool {
        self.kind() == ParamKind::Flag
    }
}

fn numeric_eq_integer(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(x), Ok(y)) => x == y,
            _ => a == b,
        },
        (None, None) => true,
        _ => false,
    }
}

fn numeric_eq_real(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => match (a.parse::<f32>(), b.parse::<f32>()) {
            (Ok(x), Ok(y)) => x == y,
            _ => a == b,
        },
        (None, None) => true,
        _ => false,
    }
}

// Equality follows the identity's comparison policy, not raw text:
// integers and reals compare numerically (falling back to exact text when
// either side fails to parse), tel parameters compare case-insensitively,
// everything else exactly.
impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        if self.id != other.id {
            return false;
        }
        match self.id.kind() {
            ParamKind::Flag => true,
            ParamKind::Integer => numeric_eq_integer(self.value(), other.value()),
            ParamKind::Real => numeric_eq_real(self.value(), other.value()),
            ParamKind::String => {
                let ci = self.id.value_case_insensitive();
                match (self.value(), other.value()) {
                    (Some(a), Some(b)) => {
                        if ci {
                            a.eq_ignore_ascii_case(b)
                        } else {
                            a == b
                        }
                    }
                    (None, None) => true,
                    _ => false,
                }
            }
        }
    }
}

impl Eq for Param {}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name(), v),
            None => f.write_str(self.name()),
        }
    }
}

/// An order-preserving parameter store with case-insensitive lookup.
///
/// Names are unique under case-insensitive comparison; re-setting a name
/// replaces the value in place, so encoding order reflects first
/// occurrence. Equality treats the collection as an unordered map over
/// normalized keys, so two stores differing only in parameter order are
/// equal while still encoding in their own insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Params {
    items: Vec<Param>,
}

impl Params {
    /// Creates an empty store.
    pub fn new() -> Params {
        Params { items: Vec::new() }
    }

    /// Number of parameters held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates parameters in insertion (encoding) order.
    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.items.iter()
    }

    /// Looks a parameter up by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&Param> {
        let id = ParamId::from_name(name);
        self.get_id(&id)
    }

    /// Looks a known parameter up by identity.
    pub fn get_known(&self, key: KnownParam) -> Option<&Param> {
        self.get_id(&ParamId::Known(key))
    }

    fn get_id(&self, id: &ParamId) -> Option<&Param> {
        self.items.iter().find(|p| p.id() == id)
    }

    /// Whether a parameter with this name exists.
    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether this known parameter exists.
    pub fn exists_known(&self, key: KnownParam) -> bool {
        self.get_known(key).is_some()
    }

    /// Convenience accessor for a known parameter's value text.
    pub fn value_of(&self, key: KnownParam) -> Option<&str> {
        self.get_known(key).and_then(|p| p.value())
    }

    /// Sets a parameter, replacing any existing value under the same
    /// normalized key in place.
    pub fn set(&mut self, id: impl Into<ParamId>, value: Option<impl Into<String>>) {
        self.insert_raw_param(Param::new(id, value));
    }

    /// Removes a parameter by name, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Param> {
        let id = ParamId::from_name(name);
        let pos = self.items.iter().position(|p| p.id() == &id)?;
        Some(self.items.remove(pos))
    }

    pub(crate) fn insert_raw(&mut self, id: ParamId, value: Option<String>) {
        self.insert_raw_param(Param { id, value });
    }

    fn insert_raw_param(&mut self, param: Param) {
        match self.items.iter_mut().find(|p| p.id == param.id) {
            Some(existing) => existing.value = param.value,
            None => self.items.push(param),
        }
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .all(|p| other.get_id(p.id()).map_or(false, |q| p == q))
    }
}

impl Eq for Params {}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_is_case_insensitive() {
        assert_eq!(KnownParam::from_name("transport"), Some(KnownParam::Transport));
        assert_eq!(KnownParam::from_name("TRANSPORT"), Some(KnownParam::Transport));
        assert_eq!(KnownParam::from_name("Phone-Context"), Some(KnownParam::PhoneContext));
        assert_eq!(KnownParam::from_name("x-fluffy"), None);
    }

    #[test]
    fn unknown_names_normalize() {
        assert_eq!(ParamId::from_name("X-Fluffy"), ParamId::Unknown("x-fluffy".to_string()));
        assert_eq!(ParamId::from_name("TTL"), ParamId::Known(KnownParam::Ttl));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut params = Params::new();
        params.set("a", Some("1"));
        params.set("b", Some("2"));
        params.set("A", Some("3"));

        assert_eq!(params.len(), 2);
        let names: Vec<&str> = params.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(params.get("a").and_then(|p| p.value()), Some("3"));
    }

    #[test]
    fn flag_kind_discards_value() {
        let p = Param::new(KnownParam::Lr, Some("true"));
        assert_eq!(p.value(), None);
        assert!(p.is_flag());
        assert_eq!(p.to_string(), "lr");
    }

    #[test]
    fn equality_ignores_order() {
        let mut a = Params::new();
        a.set("foo", Some("bar"));
        a.set("baz", Some("qux"));

        let mut b = Params::new();
        b.set("baz", Some("qux"));
        b.set("foo", Some("bar"));

        assert_eq!(a, b);
    }

    #[test]
    fn equality_respects_value_policy() {
        let postd_lower = Param::new(KnownParam::Postd, Some("pp22"));
        let postd_upper = Param::new(KnownParam::Postd, Some("PP22"));
        assert_eq!(postd_lower, postd_upper);

        let other_lower = Param::new("x-tag", Some("abc"));
        let other_upper = Param::new("x-tag", Some("ABC"));
        assert_ne!(other_lower, other_upper);

        let q_short = Param::new(KnownParam::Q, Some("1.0"));
        let q_long = Param::new(KnownParam::Q, Some("1.00"));
        assert_eq!(q_short, q_long);

        let ttl_plain = Param::new(KnownParam::Ttl, Some("5"));
        let ttl_padded = Param::new(KnownParam::Ttl, Some("05"));
        assert_eq!(ttl_plain, ttl_padded);
    }

    #[test]
    fn typed_accessors_validate_lazily() {
        let good = Param::new(KnownParam::Ttl, Some("15"));
        assert_eq!(good.as_integer().unwrap(), 15);

        let bad = Param::new(KnownParam::Ttl, Some("abc"));
        assert!(matches!(
            bad.as_integer(),
            Err(Error::InvalidParameterValue { .. })
        ));

        let q = Param::new(KnownParam::Q, Some("0.5"));
        assert_eq!(q.as_real().unwrap().into_inner(), 0.5);

        let bad_q = Param::new(KnownParam::Q, Some("high"));
        assert!(bad_q.as_real().is_err());
    }
}
