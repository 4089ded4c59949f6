//! Splitting configured addresses into scheme prefix and lookup domain.

/// Split an address into its scheme prefix and the SRV lookup domain.
///
/// With a scheme, the domain is the host component (userinfo and port
/// stripped). Without one, the whole address sits in the path position
/// (RFC 1808), so the domain is the leading path segment up to the first
/// `/` and the prefix is empty.
pub fn split_address(addr: &str) -> (String, String) {
    if let Some((scheme, rest)) = addr.split_once("://") {
        let authority = rest.split('/').next().unwrap_or("");
        let host = authority.rsplit('@').next().unwrap_or(authority);
        let host = host.split(':').next().unwrap_or(host);
        (format!("{scheme}://"), host.to_string())
    } else {
        let domain = addr.split('/').next().unwrap_or(addr);
        (String::new(), domain.to_string())
    }
}
