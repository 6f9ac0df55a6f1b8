//! # SIP and TEL URI Implementation
//!
//! This module provides the structured identifier at the heart of the
//! crate: parsing per [RFC 3261](https://tools.ietf.org/html/rfc3261) and
//! [RFC 3966](https://tools.ietf.org/html/rfc3966), canonical re-encoding,
//! the comparison relations used for address-of-record matching and
//! routing-list sorting, and the tel→sip conversion of
//! [RFC 3398](https://tools.ietf.org/html/rfc3398).
//!
//! ## URI Structure
//!
//! ```text
//! sip:user:password@host:port;uri-parameters
//! tel:number;parameters
//! ```
//!
//! `sip`/`sips` URIs use the authority grammar (`user@host`); `tel` URIs
//! are authority-less: the whole body is the user token, and parameter
//! text after it is kept verbatim alongside a normalized parameter store
//! so that unmodified parses re-encode byte-exactly.
//!
//! ## Usage Examples
//!
//! ```rust
//! use sip_uri_core::prelude::*;
//!
//! // Parse a URI from a string
//! let uri = Uri::parse("sip:alice@example.com:5060;transport=tcp").unwrap();
//!
//! // Access URI components
//! assert_eq!(uri.scheme(), &Scheme::Sip);
//! assert_eq!(uri.user(), Some("alice"));
//! assert_eq!(uri.host(), "example.com");
//! assert_eq!(uri.port(), Some(5060));
//! assert_eq!(uri.transport(), Some("tcp"));
//!
//! // Create a URI programmatically
//! let uri = Uri::sip("example.com")
//!     .with_user("bob")
//!     .with_port(5060)
//!     .with_parameter(KnownParam::Transport, Some("tcp"));
//!
//! assert_eq!(uri.to_string(), "sip:bob@example.com:5060;transport=tcp");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use nom::combinator::all_consuming;
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::parser::uri::parse_uri;
use crate::parser::utils::unescape_uri_component;
use crate::types::param::{KnownParam, Param, ParamId, Params};

/// URI scheme classification.
///
/// `sip` and `sips` take the authority grammar; `tel` is authority-less;
/// any other scheme token is retained in [`Scheme::Other`] (lower-cased)
/// and parsed with the authority grammar only when its body contains an
/// unescaped `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    /// SIP URI (non-secure)
    Sip,
    /// SIPS URI (secure SIP)
    Sips,
    /// TEL URI (telephone number)
    Tel,
    /// Any other scheme, lower-cased
    Other(String),
}

impl Scheme {
    /// Returns the string representation of the scheme
    ///
    /// # Examples
    ///
    /// ```
    /// use sip_uri_core::Scheme;
    ///
    /// assert_eq!(Scheme::Sip.as_str(), "sip");
    /// assert_eq!(Scheme::Sips.as_str(), "sips");
    /// assert_eq!(Scheme::Other("h323".to_string()).as_str(), "h323");
    /// ```
    pub fn as_str(&self) -> &str {
        match self {
            Scheme::Sip => "sip",
            Scheme::Sips => "sips",
            Scheme::Tel => "tel",
            Scheme::Other(scheme) => scheme,
        }
    }

    /// Whether this is one of the SIP schemes (`sip` or `sips`).
    pub fn is_sip(&self) -> bool {
        matches!(self, Scheme::Sip | Scheme::Sips)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let valid = !bytes.is_empty()
            && bytes[0].is_ascii_alphabetic()
            && bytes
                .iter()
                .all(|&c| c.is_ascii_alphanumeric() || matches!(c, b'+' | b'-' | b'.'));
        if !valid {
            return Err(Error::MalformedUri {
                offset: 0,
                message: format!("invalid scheme token {s:?}"),
            });
        }
        let lower = s.to_ascii_lowercase();
        Ok(match lower.as_str() {
            "sip" => Scheme::Sip,
            "sips" => Scheme::Sips,
            "tel" => Scheme::Tel,
            _ => Scheme::Other(lower),
        })
    }
}

const TEL_PRIORITY_PARAMS: [KnownParam; 4] = [
    KnownParam::Isub,
    KnownParam::Postd,
    KnownParam::PhoneContext,
    KnownParam::Tsp,
];

fn default_q() -> NotNan<f32> {
    NotNan::new(1.0).unwrap_or_default()
}

/// A structured SIP/TEL URI.
///
/// Constructed once by [`Uri::parse`] (or [`Uri::from_tel`]) and treated
/// as an immutable value afterwards: comparison, encoding, and conversion
/// never mutate. The builder-style mutators exist for programmatic
/// construction; any parameter mutation clears the verbatim tel parameter
/// text and forces re-encoding from the structured store.
///
/// # Examples
///
/// ```rust
/// use sip_uri_core::prelude::*;
///
/// let a = Uri::parse("sip:user@domain;foo=bar;baz=qux").unwrap();
/// let b = Uri::parse("sip:user@domain;baz=qux;foo=bar").unwrap();
///
/// // parameter order does not affect equality
/// assert_eq!(a, b);
///
/// // but encoding preserves each parse's own order
/// assert_eq!(a.to_string(), "sip:user@domain;foo=bar;baz=qux");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Uri {
    scheme: Scheme,
    user: Option<String>,
    password: Option<String>,
    host: String,
    port: Option<u16>,
    params: Params,
    // Verbatim parameter text for authority-less schemes. Authoritative for
    // encoding until a parameter mutation clears it; the store is
    // authoritative for equality and lookup always.
    user_params: String,
}

impl Uri {
    /// Creates a bare URI with the given scheme and host.
    pub fn new(scheme: Scheme, host: impl Into<String>) -> Self {
        Uri {
            scheme,
            user: None,
            password: None,
            host: host.into(),
            port: None,
            params: Params::new(),
            user_params: String::new(),
        }
    }

    /// Creates a new SIP URI with the given host.
    ///
    /// # Examples
    ///
    /// ```
    /// use sip_uri_core::Uri;
    ///
    /// let uri = Uri::sip("example.com");
    /// assert_eq!(uri.to_string(), "sip:example.com");
    /// ```
    pub fn sip(host: impl Into<String>) -> Self {
        Self::new(Scheme::Sip, host)
    }

    /// Creates a new SIPS URI with the given host.
    pub fn sips(host: impl Into<String>) -> Self {
        Self::new(Scheme::Sips, host)
    }

    /// Creates a new TEL URI for the given number.
    ///
    /// # Examples
    ///
    /// ```
    /// use sip_uri_core::Uri;
    ///
    /// let uri = Uri::tel("+14086661212");
    /// assert_eq!(uri.to_string(), "tel:+14086661212");
    /// ```
    pub fn tel(number: impl Into<String>) -> Self {
        let mut uri = Self::new(Scheme::Tel, String::new());
        uri.user = Some(number.into());
        uri
    }

    pub(crate) fn from_authority_parts(
        scheme: Scheme,
        user: Option<String>,
        password: Option<String>,
        host: String,
        port: Option<u16>,
        params: Params,
    ) -> Self {
        Uri {
            scheme,
            user,
            password,
            host,
            port,
            params,
            user_params: String::new(),
        }
    }

    pub(crate) fn from_opaque_parts(
        scheme: Scheme,
        user: String,
        user_params: String,
        params: Params,
    ) -> Self {
        Uri {
            scheme,
            user: Some(user),
            password: None,
            host: String::new(),
            port: None,
            params,
            user_params,
        }
    }

    /// Parses a URI from text.
    ///
    /// Fails with [`Error::MalformedUri`] carrying the byte offset of the
    /// first grammar violation. Nothing is repaired or defaulted: every
    /// violation is fatal to the parse attempt.
    ///
    /// # Examples
    ///
    /// ```
    /// use sip_uri_core::prelude::*;
    ///
    /// let uri = Uri::parse("sips:fluffy@iii.ca;transport=tls").unwrap();
    /// assert_eq!(uri.scheme(), &Scheme::Sips);
    /// assert_eq!(uri.transport(), Some("tls"));
    ///
    /// assert!(Uri::parse("noscheme@foo.com:1202").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        match all_consuming(parse_uri)(input.as_bytes()) {
            Ok((_rest, uri)) => Ok(uri),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let offset = input.len() - e.input.len();
                debug!(offset, input = %input, "failed to parse URI");
                Err(Error::MalformedUri {
                    offset,
                    message: e.code.description().to_string(),
                })
            }
            Err(nom::Err::Incomplete(_)) => Err(Error::MalformedUri {
                offset: input.len(),
                message: "incomplete input".to_string(),
            }),
        }
    }

    /// The URI scheme.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// The user token, kept wire-verbatim (it may contain `;`, `=`,
    /// spaces, or parentheses).
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The password token. `Some("")` means a password separator was
    /// present with nothing after it, which is distinct from absence.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The host, without brackets. Empty means "no authority" (tel URIs).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port, if one was specified.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Host and port formatted together (e.g. `example.com:5060`).
    pub fn host_port(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// The parameter store, in parse/insertion order.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The verbatim parameter text attached to the user token of an
    /// authority-less URI, without the leading `;`. Empty for sip/sips
    /// URIs and for tel URIs without parameters.
    pub fn user_parameters(&self) -> &str {
        &self.user_params
    }

    /// The user token with percent-escapes decoded.
    pub fn user_decoded(&self) -> Result<Option<String>> {
        self.user
            .as_deref()
            .map(|u| unescape_uri_component(u.as_bytes()))
            .transpose()
    }

    /// The password token with percent-escapes decoded.
    pub fn password_decoded(&self) -> Result<Option<String>> {
        self.password
            .as_deref()
            .map(|p| unescape_uri_component(p.as_bytes()))
            .transpose()
    }

    /// Sets the user token.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the password token.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Adds or replaces a parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use sip_uri_core::prelude::*;
    ///
    /// let uri = Uri::sip("example.com")
    ///     .with_parameter(KnownParam::Transport, Some("tcp"))
    ///     .with_parameter(KnownParam::Lr, None::<&str>);
    ///
    /// assert_eq!(uri.to_string(), "sip:example.com;transport=tcp;lr");
    /// ```
    pub fn with_parameter(
        mut self,
        id: impl Into<ParamId>,
        value: Option<impl Into<String>>,
    ) -> Self {
        self.set_param(id, value);
        self
    }

    /// Adds or replaces a parameter in place.
    ///
    /// Invalidates the verbatim tel parameter text: the URI re-encodes
    /// from the structured store afterwards.
    pub fn set_param(&mut self, id: impl Into<ParamId>, value: Option<impl Into<String>>) {
        self.params.set(id, value);
        self.user_params.clear();
    }

    /// Removes a parameter by name, in place.
    ///
    /// Invalidates the verbatim tel parameter text, like [`Uri::set_param`].
    pub fn remove_param(&mut self, name: &str) -> Option<Param> {
        let removed = self.params.remove(name);
        if removed.is_some() {
            self.user_params.clear();
        }
        removed
    }

    /// The transport parameter value, if present.
    pub fn transport(&self) -> Option<&str> {
        self.params.value_of(KnownParam::Transport)
    }

    /// Whether the URI carries the `user=phone` parameter.
    pub fn is_phone_number(&self) -> bool {
        self.params.value_of(KnownParam::User) == Some("phone")
    }

    /// The `q` preference value, defaulting to `1.0` when absent.
    ///
    /// Fails with [`Error::InvalidParameterValue`] when the stored text is
    /// not a valid real number.
    pub fn q(&self) -> Result<NotNan<f32>> {
        match self.params.get_known(KnownParam::Q) {
            Some(p) => p.as_real(),
            None => Ok(default_q()),
        }
    }

    /// The `q` value used for preference ordering; malformed text ranks
    /// as the default so sorting stays infallible.
    pub fn effective_q(&self) -> NotNan<f32> {
        self.q().unwrap_or_else(|_| default_q())
    }

    /// A deterministic total order suitable for sorted routing tables and
    /// set keys: lexicographic over (scheme, user, password, host, port,
    /// encoded parameter sequence).
    ///
    /// This is deliberately not an `Ord` implementation: two URIs that are
    /// `==` (same parameter set, different order) may still compare
    /// unequal here, because the last component is the *encoded* sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use sip_uri_core::Uri;
    ///
    /// let a = Uri::parse("sip:wombat@192.168.2.221:5062;transport=Udp").unwrap();
    /// let b = Uri::parse("sip:wombat@192.168.2.221:5063;transport=Udp").unwrap();
    /// assert_eq!(a.routing_cmp(&b), Ordering::Less);
    /// ```
    pub fn routing_cmp(&self, other: &Uri) -> Ordering {
        self.scheme
            .as_str()
            .cmp(other.scheme.as_str())
            .then_with(|| self.user.cmp(&other.user))
            .then_with(|| self.password.cmp(&other.password))
            .then_with(|| self.host.cmp(&other.host))
            .then_with(|| self.port.cmp(&other.port))
            .then_with(|| self.encoded_params().cmp(&other.encoded_params()))
    }

    /// Converts a `tel:` URI into a `sip:` URI at the given host, per
    /// RFC 3398: the telephone-subscriber part (number plus parameters)
    /// becomes the sip user token, and `user=phone` is appended as the
    /// single uri-parameter.
    ///
    /// The `isub`, `postd`, `phone-context`, and `tsp` parameters are
    /// emitted first, in that fixed order, with their values lower-cased;
    /// the remaining parameters follow in their original relative parse
    /// order with values verbatim. Two tel URIs differing only in the
    /// order or letter case of the priority parameters therefore convert
    /// to byte-identical output.
    ///
    /// Fails with [`Error::InvalidConversion`] when the source is not a
    /// tel URI.
    ///
    /// # Examples
    ///
    /// ```
    /// use sip_uri_core::Uri;
    ///
    /// let tel = Uri::parse("tel:+358-555-1234567;pOstd=pP2;isUb=1411").unwrap();
    /// let sip = Uri::from_tel(&tel, "company.com").unwrap();
    /// assert_eq!(
    ///     sip.to_string(),
    ///     "sip:+358-555-1234567;isub=1411;postd=pp2@company.com;user=phone"
    /// );
    /// ```
    pub fn from_tel(tel: &Uri, target_host: impl Into<String>) -> Result<Uri> {
        if tel.scheme != Scheme::Tel {
            debug!(scheme = %tel.scheme, "refusing tel conversion of non-tel URI");
            return Err(Error::InvalidConversion(format!(
                "expected a tel URI, got scheme {:?}",
                tel.scheme.as_str()
            )));
        }

        let mut user = tel.user.clone().unwrap_or_default();
        for key in TEL_PRIORITY_PARAMS {
            if let Some(p) = tel.params.get_known(key) {
                user.push(';');
                user.push_str(key.name());
                if let Some(v) = p.value() {
                    user.push('=');
                    user.push_str(&v.to_ascii_lowercase());
                }
            }
        }
        for p in tel.params.iter() {
            if matches!(p.id(), ParamId::Known(k) if TEL_PRIORITY_PARAMS.contains(k)) {
                continue;
            }
            user.push(';');
            user.push_str(p.name());
            if let Some(v) = p.value() {
                user.push('=');
                user.push_str(v);
            }
        }

        let mut params = Params::new();
        params.set(KnownParam::User, Some("phone"));

        Ok(Uri {
            scheme: Scheme::Sip,
            user: Some(user),
            password: None,
            host: target_host.into(),
            port: None,
            params,
            user_params: String::new(),
        })
    }

    // The `;...` tail exactly as the encoder emits it: the verbatim tel
    // parameter text when intact, otherwise the store in insertion order.
    fn encoded_params(&self) -> String {
        let mut out = String::new();
        if !self.user_params.is_empty() {
            out.push(';');
            out.push_str(&self.user_params);
        } else {
            for p in self.params.iter() {
                out.push(';');
                out.push_str(p.name());
                if let Some(v) = p.value() {
                    out.push('=');
                    out.push_str(v);
                }
            }
        }
        out
    }
}

/// Strict "greater preference" relation over `q` values, for sorting
/// priority-ordered candidate lists.
///
/// Holds iff `a`'s effective priority is strictly greater than `b`'s; a
/// missing `q` parameter counts as the `1.0` default. Equal priorities
/// (including both-absent) are unordered in both directions, so this is a
/// strict weak ordering: use a stable sort to preserve tie order.
///
/// # Examples
///
/// ```
/// use sip_uri_core::{greater_q, Uri};
///
/// let high = Uri::parse("sip:a@h;q=1.0").unwrap();
/// let low = Uri::parse("sip:a@h;q=0.5").unwrap();
/// let absent = Uri::parse("sip:a@h").unwrap();
///
/// assert!(greater_q(&high, &low));
/// assert!(!greater_q(&low, &high));
/// assert!(!greater_q(&high, &absent));
/// assert!(!greater_q(&absent, &high));
/// ```
pub fn greater_q(a: &Uri, b: &Uri) -> bool {
    a.effective_q() > b.effective_q()
}

// Canonical wire encoding. Never fails on a structurally valid Uri; empty
// password, empty host, and empty parameter segments are never emitted, so
// "sip:;:@" re-encodes as "sip:;".
impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;

        if let Some(user) = &self.user {
            f.write_str(user)?;
            if let Some(password) = &self.password {
                if !password.is_empty() {
                    write!(f, ":{}", password)?;
                }
            }
        }

        if !self.host.is_empty() {
            if self.user.is_some() {
                f.write_str("@")?;
            }
            if self.host.contains(':') {
                write!(f, "[{}]", self.host)?;
            } else {
                f.write_str(&self.host)?;
            }
        }

        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }

        f.write_str(&self.encoded_params())
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uri::parse(s)
    }
}

// Scalar fields compare exactly; parameters compare as an unordered map
// with per-identity value policy (see Params).
impl PartialEq for Uri {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.user == other.user
            && self.password == other.password
            && self.host == other.host
            && self.port == other.port
            && self.params == other.params
    }
}

impl Eq for Uri {}

// Parameters are left out: equality ignores their order, so only the
// scalar fields can feed the hash. Equal URIs still hash equally.
impl Hash for Uri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scheme.as_str().hash(state);
        self.user.hash(state);
        self.password.hash(state);
        self.host.hash(state);
        self.port.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_rebrackets_colon_hosts() {
        let uri = Uri::parse("sip:[2001:db8::1]:5060").unwrap();
        assert_eq!(uri.host(), "2001:db8::1");
        assert_eq!(uri.to_string(), "sip:[2001:db8::1]:5060");
    }

    #[test]
    fn display_skips_empty_password_and_host() {
        let uri = Uri::parse("sip:;:@").unwrap();
        assert_eq!(uri.to_string(), "sip:;");
    }

    #[test]
    fn hash_is_consistent_with_eq() {
        use std::collections::hash_map::DefaultHasher;

        let a = Uri::parse("sip:user@domain;foo=bar;baz=qux").unwrap();
        let b = Uri::parse("sip:user@domain;baz=qux;foo=bar").unwrap();
        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn mutation_invalidates_verbatim_text() {
        let mut uri = Uri::parse("tel:+14086661212;Foo=Bie").unwrap();
        assert_eq!(uri.user_parameters(), "Foo=Bie");
        assert_eq!(uri.to_string(), "tel:+14086661212;Foo=Bie");

        uri.set_param("bar", Some("1"));
        assert_eq!(uri.user_parameters(), "");
        // re-derived from the store: normalized names, verbatim values
        assert_eq!(uri.to_string(), "tel:+14086661212;foo=Bie;bar=1");
    }

    #[test]
    fn scheme_from_str() {
        assert_eq!("SIP".parse::<Scheme>().unwrap(), Scheme::Sip);
        assert_eq!("h323".parse::<Scheme>().unwrap(), Scheme::Other("h323".to_string()));
        assert!("no scheme".parse::<Scheme>().is_err());
        assert!("".parse::<Scheme>().is_err());
    }
}
