//! Cookies found in captured response headers.
//!
//! Two views are offered over the raw header text of a transfer:
//!
//! - [`scan_cookies`] returns the `name=value` part of every `Set-Cookie:` line
//!   joined with `"; "`, which is ready to be sent back as a `Cookie:` request
//!   header.
//! - [`parse_set_cookies`] returns structured [`Cookie`] records, including
//!   their attributes.
//!
//! Both work on every header line captured during the transfer, so cookies set
//! by intermediate redirect responses are included.
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

lazy_static! {
    static ref SET_COOKIE: Regex = Regex::new(r"(?mi)^Set-Cookie:[ \t]*([^;\r\n]*)").unwrap();
}

/// Joins the leading `name=value` token of every `Set-Cookie:` line with `"; "`.
///
/// Returns `None` when the text holds no `Set-Cookie:` line.
pub fn scan_cookies(header: &str) -> Option<String> {
    let cookies: Vec<&str> = SET_COOKIE
        .captures_iter(header)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();

    if cookies.is_empty() {
        None
    } else {
        Some(cookies.join("; "))
    }
}

/// A cookie as announced by a `Set-Cookie:` response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Path scoping. Derived from the request URL when the header has no `Path`.
    pub path: Option<String>,

    /// Domain scoping with any leading dot stripped. `None` means host-only.
    pub domain: Option<String>,

    /// Sent only over HTTPS.
    pub secure: bool,

    /// Raw `Expires` attribute, if any.
    pub expires: Option<String>,

    /// SameSite policy, normalized to `"Strict"`, `"Lax"` or `"None"` when recognized.
    pub same_site: Option<String>,

    /// Hidden from client-side scripts.
    pub http_only: bool,
}

/// Parses every `Set-Cookie:` line of `header`.
///
/// `url` is the URL the cookies were received from and only serves to derive
/// the default path. A later cookie replaces an earlier one with the same name.
pub fn parse_set_cookies(header: &str, url: Option<&Url>) -> Vec<Cookie> {
    let default_path = url
        .map(|u| u.path().rsplit_once('/').map_or("/", |(a, _)| if a.is_empty() { "/" } else { a }))
        .unwrap_or("/");

    let mut cookies: Vec<Cookie> = Vec::new();

    for line in header.lines() {
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        if !field.trim().eq_ignore_ascii_case("set-cookie") {
            continue;
        }

        let Some(cookie) = parse_cookie(value.trim(), default_path) else {
            log::trace!("Skipping malformed Set-Cookie line: {}", line);
            continue;
        };

        if let Some(existing) = cookies.iter_mut().find(|c| c.name == cookie.name) {
            *existing = cookie;
        } else {
            cookies.push(cookie);
        }
    }

    cookies
}

fn parse_cookie(header: &str, default_path: &str) -> Option<Cookie> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie {
        name: name.to_string(),
        value: value.trim().to_string(),
        path: None,
        domain: None,
        secure: false,
        expires: None,
        same_site: None,
        http_only: false,
    };

    for part in parts {
        let part = part.trim();
        if let Some((k, v)) = part.split_once('=') {
            let v = v.trim();
            match k.trim().to_ascii_lowercase().as_str() {
                "path" => cookie.path = Some(v.to_string()),
                "domain" => cookie.domain = Some(v.trim_start_matches('.').to_string()),
                "expires" => cookie.expires = Some(v.to_string()),
                "samesite" => {
                    let normalized = if v.eq_ignore_ascii_case("lax") {
                        "Lax"
                    } else if v.eq_ignore_ascii_case("strict") {
                        "Strict"
                    } else if v.eq_ignore_ascii_case("none") {
                        "None"
                    } else {
                        v
                    };
                    cookie.same_site = Some(normalized.to_string());
                }
                _ => {}
            }
        } else if part.eq_ignore_ascii_case("secure") {
            cookie.secure = true;
        } else if part.eq_ignore_ascii_case("httponly") {
            cookie.http_only = true;
        }
    }

    if cookie.path.is_none() {
        cookie.path = Some(default_path.to_string());
    }

    Some(cookie)
}
