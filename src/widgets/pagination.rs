//! `Link` header construction for paged listings.

use axum::http::Uri;

/// Builds `<url>; rel="next"`, where `url` is the request URL with the query
/// parameter `key` replaced by `value`. Without a `host` the URL is relative.
pub fn next_page_link(host: Option<&str>, uri: &Uri, key: &str, value: &str) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some(key))
        .map(str::to_string)
        .collect();
    pairs.push(format!("{}={}", key, value));

    let path_and_query = format!("{}?{}", uri.path(), pairs.join("&"));
    let url = match host {
        Some(host) => format!("http://{}{}", host, path_and_query),
        None => path_and_query,
    };

    format!("<{}>; rel=\"next\"", url)
}

/// Extracts the URL from a `Link` header value built by [`next_page_link`].
#[cfg(test)]
pub(crate) fn parse_next_link(header: &str) -> Option<&str> {
    header
        .trim()
        .strip_prefix('<')?
        .strip_suffix(">; rel=\"next\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_appends_param_to_bare_path() {
        let uri: Uri = "/widgets".parse().unwrap();
        let link = next_page_link(Some("localhost:8080"), &uri, "fromZ", "5");
        assert_eq!(link, "<http://localhost:8080/widgets?fromZ=5>; rel=\"next\"");
    }

    #[test]
    fn test_link_replaces_existing_param_and_keeps_others() {
        let uri: Uri = "/widgets?perPage=2&fromZ=1".parse().unwrap();
        let link = next_page_link(None, &uri, "fromZ", "-7");
        assert_eq!(link, "</widgets?perPage=2&fromZ=-7>; rel=\"next\"");
    }

    #[test]
    fn test_parse_next_link_roundtrip() {
        let uri: Uri = "/widgets?perPage=3".parse().unwrap();
        let link = next_page_link(Some("h:1"), &uri, "fromZ", "9");
        assert_eq!(parse_next_link(&link), Some("http://h:1/widgets?perPage=3&fromZ=9"));
        assert_eq!(parse_next_link("garbage"), None);
    }
}
