//! URI grammar.
//!
//! Recursive-descent parsers over `&[u8]`, one function per production,
//! returning [`ParseResult`]. The entry point is [`parse_uri`]; callers
//! wrap it in `all_consuming` and convert the nom error into
//! [`crate::error::Error::MalformedUri`] with a byte offset.
//!
//! Two grammars share the scheme production: the authority grammar
//! (`sip`, `sips`, and any other scheme whose body contains an unescaped
//! `@`) and the authority-less grammar (`tel` and the rest), which keeps
//! the parameter text verbatim next to a normalized parameter store.

use nom::{
    character::complete::digit1,
    error::{Error as NomError, ErrorKind},
};

use crate::parser::ParseResult;
use crate::types::param::{ParamId, ParamKind, Params};
use crate::types::uri::{Scheme, Uri};

fn fail(input: &[u8], kind: ErrorKind) -> nom::Err<NomError<&[u8]>> {
    nom::Err::Error(NomError::new(input, kind))
}

/// Position of the first unescaped `target`, treating `%XX` as opaque.
fn find_unescaped(input: &[u8], target: u8) -> Option<usize> {
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'%' {
            i += 3;
        } else if input[i] == target {
            return Some(i);
        } else {
            i += 1;
        }
    }
    None
}

// Input arrives as &str, so the bytes are valid UTF-8 already.
fn owned(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn is_scheme_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'+' | b'-' | b'.')
}

// scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ), terminated by ":"
//
// The colon is mandatory; any byte outside the alphabet before it (notably
// "@") fails at that byte's position.
pub(crate) fn scheme(input: &[u8]) -> ParseResult<Scheme> {
    let colon = match find_unescaped(input, b':') {
        Some(i) => i,
        None => return Err(fail(input, ErrorKind::Char)),
    };
    let token = &input[..colon];
    if token.is_empty() {
        return Err(fail(input, ErrorKind::Alpha));
    }
    for (i, &c) in token.iter().enumerate() {
        let valid = if i == 0 {
            c.is_ascii_alphabetic()
        } else {
            is_scheme_char(c)
        };
        if !valid {
            return Err(fail(&input[i..], ErrorKind::Char));
        }
    }
    let lower = owned(token).to_ascii_lowercase();
    let scheme = match lower.as_str() {
        "sip" => Scheme::Sip,
        "sips" => Scheme::Sips,
        "tel" => Scheme::Tel,
        _ => Scheme::Other(lower),
    };
    Ok((&input[colon + 1..], scheme))
}

// userinfo = user [ ":" password ] "@"
//
// Both tokens are opaque: the user may contain ";", "=", spaces, and
// parentheses verbatim. Absent entirely when the body has no unescaped "@".
// A lone ":" splits user from password; the password may be empty and is
// then the distinct "present but empty" Some("").
fn userinfo(input: &[u8]) -> ParseResult<(Option<String>, Option<String>)> {
    let at = match find_unescaped(input, b'@') {
        Some(i) => i,
        None => return Ok((input, (None, None))),
    };
    let span = &input[..at];
    let parsed = match find_unescaped(span, b':') {
        Some(c) => (Some(owned(&span[..c])), Some(owned(&span[c + 1..]))),
        None => (Some(owned(span)), None),
    };
    Ok((&input[at + 1..], parsed))
}

// host = "[" literal "]" / token up to ":" ";" or end
//
// Bracketed literals are stored without the brackets; the encoder
// re-brackets any host containing ":". An unclosed "[" is an error.
fn host(input: &[u8]) -> ParseResult<String> {
    if input.first() == Some(&b'[') {
        let close = match input.iter().position(|&c| c == b']') {
            Some(i) => i,
            None => return Err(fail(input, ErrorKind::Char)),
        };
        Ok((&input[close + 1..], owned(&input[1..close])))
    } else {
        let end = input
            .iter()
            .position(|&c| matches!(c, b':' | b';'))
            .unwrap_or(input.len());
        Ok((&input[end..], owned(&input[..end])))
    }
}

// port = ":" 1*DIGIT
//
// A parsed port of 0 normalizes to "unspecified".
fn port(input: &[u8]) -> ParseResult<Option<u16>> {
    if input.first() != Some(&b':') {
        return Ok((input, None));
    }
    let (rest, digits) = digit1(&input[1..])?;
    let value: u32 = owned(digits)
        .parse()
        .map_err(|_| fail(&input[1..], ErrorKind::MapRes))?;
    if value > u16::MAX as u32 {
        return Err(fail(&input[1..], ErrorKind::MapRes));
    }
    Ok((rest, if value == 0 { None } else { Some(value as u16) }))
}

// uri-parameters = *( ";" pname [ "=" pvalue ] )
//
// Names are matched against the registry case-insensitively; unmatched
// names become unknown parameters. A trailing ";" with nothing after it is
// accepted and dropped; an empty name anywhere else is an error. Values on
// flag-kind parameters are discarded.
pub(crate) fn uri_params(input: &[u8]) -> ParseResult<Params> {
    let mut params = Params::new();
    let mut rest = input;
    while rest.first() == Some(&b';') {
        let seg_start = &rest[1..];
        let end = find_unescaped(seg_start, b';').unwrap_or(seg_start.len());
        let seg = &seg_start[..end];
        if seg.is_empty() {
            if end == seg_start.len() {
                rest = &seg_start[end..];
                break;
            }
            return Err(fail(seg_start, ErrorKind::TakeWhile1));
        }
        let (name, value) = match find_unescaped(seg, b'=') {
            Some(eq) => (&seg[..eq], Some(owned(&seg[eq + 1..]))),
            None => (seg, None),
        };
        if name.is_empty() {
            return Err(fail(seg_start, ErrorKind::TakeWhile1));
        }
        let id = ParamId::from_name(&owned(name));
        let value = match id.kind() {
            ParamKind::Flag => None,
            _ => value,
        };
        params.insert_raw(id, value);
        rest = &seg_start[end..];
    }
    Ok((rest, params))
}

// Authority-less body: user token up to the first unescaped ";", then the
// parameter text kept character-for-character AND re-scanned into the
// store, so both the verbatim and the normalized view are available.
fn opaque_body(input: &[u8], scheme: Scheme) -> ParseResult<Uri> {
    match find_unescaped(input, b';') {
        None => {
            let uri = Uri::from_opaque_parts(scheme, owned(input), String::new(), Params::new());
            Ok((&input[input.len()..], uri))
        }
        Some(semi) => {
            let user = owned(&input[..semi]);
            let verbatim = owned(&input[semi + 1..]);
            let (rest, params) = uri_params(&input[semi..])?;
            Ok((rest, Uri::from_opaque_parts(scheme, user, verbatim, params)))
        }
    }
}

/// Parses a complete URI.
pub fn parse_uri(input: &[u8]) -> ParseResult<Uri> {
    let (body, scheme) = scheme(input)?;
    let has_authority = match &scheme {
        Scheme::Sip | Scheme::Sips => true,
        Scheme::Tel => false,
        Scheme::Other(_) => find_unescaped(body, b'@').is_some(),
    };
    if has_authority {
        let (rest, (user, password)) = userinfo(body)?;
        let (rest, host) = host(rest)?;
        let (rest, port) = port(rest)?;
        let (rest, params) = uri_params(rest)?;
        Ok((
            rest,
            Uri::from_authority_parts(scheme, user, password, host, port, params),
        ))
    } else {
        opaque_body(body, scheme)
    }
}
