use http::{HeaderMap, HeaderValue, Uri, header::SET_COOKIE};

/// A cookie stored from a `Set-Cookie` response header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredCookie {
    name: String,
    value: String,
    path: Option<String>,
    scope: CookieScope,
}

/// The hosts a cookie is sent back to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CookieScope {
    /// No `Domain` attribute: only the exact origin that set it.
    HostOnly { host: String, port: Option<u16> },
    /// `Domain=example.org`: that domain and its subdomains.
    Domain(String),
}

impl StoredCookie {
    /// Parses `name=value; Attr=...`, keeping the `Path` and `Domain` attributes.
    ///
    /// Returns `None` for malformed headers and for a `Domain` the origin
    /// does not belong to.
    fn parse_set_cookie(header: &str, origin: &Uri) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let origin_host = origin.host()?.to_ascii_lowercase();

        let mut path = None;
        let mut domain = None;
        for attribute in parts {
            let Some((key, attribute_value)) = attribute.split_once('=') else {
                continue;
            };
            let attribute_value = attribute_value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "path" => path = Some(attribute_value.to_owned()),
                "domain" if !attribute_value.is_empty() => {
                    domain = Some(attribute_value.trim_start_matches('.').to_ascii_lowercase());
                }
                _ => {}
            }
        }

        let scope = match domain {
            Some(domain) => {
                if !domain_matches(&origin_host, &domain) {
                    return None;
                }
                CookieScope::Domain(domain)
            }
            None => CookieScope::HostOnly {
                host: origin_host,
                port: effective_port(origin),
            },
        };

        Some(Self {
            name: name.to_owned(),
            value: value.trim().to_owned(),
            path,
            scope,
        })
    }

    fn matches_host(&self, uri: &Uri) -> bool {
        let Some(host) = uri.host().map(str::to_ascii_lowercase) else {
            return false;
        };
        match &self.scope {
            CookieScope::HostOnly {
                host: origin_host,
                port,
            } => *origin_host == host && *port == effective_port(uri),
            CookieScope::Domain(domain) => domain_matches(&host, domain),
        }
    }

    fn matches_path(&self, request_path: &str) -> bool {
        match self.path.as_deref() {
            None | Some("" | "/") => true,
            Some(path) => {
                request_path == path
                    || request_path.strip_prefix(path).is_some_and(|rest| {
                        path.ends_with('/') || rest.starts_with('/')
                    })
            }
        }
    }
}

/// `host` is `domain` or one of its subdomains (RFC 6265 §5.1.3).
fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn effective_port(uri: &Uri) -> Option<u16> {
    uri.port_u16().or_else(|| match uri.scheme_str() {
        Some("http") => Some(80),
        Some("https") => Some(443),
        _ => None,
    })
}

/// Cookies set by the provider during one provisioning session.
///
/// Cookies are kept in arrival order; a later cookie with the same name
/// replaces the earlier one. Each cookie is only sent back to the origin
/// that set it, or to its `Domain`.
#[derive(Debug, Clone, Default)]
pub struct SessionJar {
    cookies: Vec<StoredCookie>,
}

impl SessionJar {
    /// Stores every `Set-Cookie` header of a response received from `origin`.
    pub fn store(&mut self, origin: &Uri, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            let Some(cookie) = value
                .to_str()
                .ok()
                .and_then(|header| StoredCookie::parse_set_cookie(header, origin))
            else {
                continue;
            };
            self.cookies.retain(|stored| stored.name != cookie.name);
            self.cookies.push(cookie);
        }
    }

    /// Returns `true` if no cookie has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Builds the `Cookie` header for a request to `uri`.
    ///
    /// Returns `None` when no stored cookie applies.
    #[must_use]
    pub fn cookie_header(&self, uri: &Uri) -> Option<HeaderValue> {
        let joined = self
            .cookies
            .iter()
            .filter(|cookie| cookie.matches_host(uri) && cookie.matches_path(uri.path()))
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");

        if joined.is_empty() {
            return None;
        }
        let mut value = HeaderValue::from_str(&joined).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}
