// Property tests for the URI grammar engine

use proptest::prelude::*;

use sip_uri_core::{greater_q, Scheme, Uri};

proptest! {
    /// Canonical sip URIs survive a parse/encode round trip.
    #[test]
    fn sip_roundtrip(
        sips in prop::bool::ANY,
        user in proptest::option::of("[a-z0-9]{1,8}"),
        host in "[a-z0-9][a-z0-9\\-]{0,10}",
        port in proptest::option::of(1024u16..65535),
        transport in proptest::option::of(prop::sample::select(vec!["udp", "tcp", "tls", "sctp"])),
    ) {
        let scheme_str = if sips { "sips" } else { "sip" };
        let user_part = user.as_ref().map(|u| format!("{}@", u)).unwrap_or_default();
        let port_part = port.map(|p| format!(":{}", p)).unwrap_or_default();
        let transport_part = transport.map(|t| format!(";transport={}", t)).unwrap_or_default();

        let uri_str = format!("{}:{}{}{}{}", scheme_str, user_part, host, port_part, transport_part);

        let uri = Uri::parse(&uri_str).expect("canonical URI should parse");
        prop_assert_eq!(uri.scheme(), &if sips { Scheme::Sips } else { Scheme::Sip });
        prop_assert_eq!(uri.user(), user.as_deref());
        prop_assert_eq!(uri.host(), host.as_str());
        prop_assert_eq!(uri.port(), port);
        prop_assert_eq!(uri.transport(), transport);

        prop_assert_eq!(uri.to_string(), uri_str);
    }

    /// Parameter order never affects equality.
    #[test]
    fn param_order_never_affects_equality(
        host in "[a-z]{2,8}",
        n1 in "[a-z][a-z0-9\\-]{0,5}",
        n2 in "[a-z][a-z0-9\\-]{0,5}",
        v1 in "[a-zA-Z0-9]{1,6}",
        v2 in "[a-zA-Z0-9]{1,6}",
    ) {
        prop_assume!(n1 != n2);

        let a = Uri::parse(&format!("sip:{};{}={};{}={}", host, n1, v1, n2, v2)).expect("parse");
        let b = Uri::parse(&format!("sip:{};{}={};{}={}", host, n2, v2, n1, v1)).expect("parse");

        prop_assert_eq!(a, b);
    }

    /// greater_q agrees with numeric comparison and is asymmetric.
    #[test]
    fn greater_q_is_strict(qa in 0u32..10, qb in 0u32..10) {
        let a = Uri::parse(&format!("sip:a@h;q=0.{}", qa)).expect("parse");
        let b = Uri::parse(&format!("sip:b@h;q=0.{}", qb)).expect("parse");

        prop_assert_eq!(greater_q(&a, &b), qa > qb);
        prop_assert!(!(greater_q(&a, &b) && greater_q(&b, &a)));
        if qa == qb {
            prop_assert!(!greater_q(&a, &b));
            prop_assert!(!greater_q(&b, &a));
        }
    }

    /// Unmodified tel parses re-encode byte-exactly, whatever the casing.
    #[test]
    fn tel_roundtrip_is_verbatim(
        number in "\\+?[0-9]{3,10}",
        name in "[a-zA-Z][a-zA-Z0-9]{0,5}",
        value in "[a-zA-Z0-9]{1,6}",
    ) {
        let uri_str = format!("tel:{};{}={}", number, name, value);

        let uri = Uri::parse(&uri_str).expect("parse");
        prop_assert_eq!(uri.user(), Some(number.as_str()));
        prop_assert_eq!(uri.user_parameters(), format!("{}={}", name, value));
        prop_assert_eq!(uri.to_string(), uri_str);
    }

    /// The scheme token is case-insensitive.
    #[test]
    fn scheme_case_insensitive(upper in prop::bool::ANY, host in "[a-z]{2,8}") {
        let scheme_str = if upper { "SIP" } else { "sip" };
        let uri = Uri::parse(&format!("{}:{}", scheme_str, host)).expect("parse");
        prop_assert_eq!(uri.scheme(), &Scheme::Sip);
    }

    /// The parser returns an error or a value, never panics.
    #[test]
    fn parse_never_panics(input in "[ -~]{0,40}") {
        let _ = Uri::parse(&input);
    }
}
