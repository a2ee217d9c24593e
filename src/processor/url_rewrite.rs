//! Resource URL rewriting (spec.md §4.D step 1).

/// Rewrites a single `resourceDefinitions[*].url` for `ord_id`.
///
/// - A path segment equal to `ord_id` with colons replaced by underscores
///   is restored to the original, colon-bearing ORD id.
/// - Absolute `http(s)://` URLs pass through untouched.
/// - Everything else is resolved against `/ord/v1/`.
pub fn rewrite_resource_url(url: &str, ord_id: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }

    let underscored = ord_id.replace(':', "_");
    let fixed: String = url
        .split('/')
        .map(|segment| if segment == underscored { ord_id } else { segment })
        .collect::<Vec<_>>()
        .join("/");

    let resolved = posix_resolve("/", &fixed);
    format!("/ord/v1{resolved}")
}

/// Minimal POSIX path resolution: joins `base` and `path`, then collapses
/// `.` and `..` segments and repeated slashes.
pub fn posix_resolve(base: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    };

    let mut stack: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    format!("/{}", stack.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(
            rewrite_resource_url("https://example.com/api.yaml", "ns:apiResource:Foo:v1"),
            "https://example.com/api.yaml"
        );
    }

    #[test]
    fn restores_colons_in_matching_segment() {
        let rewritten = rewrite_resource_url(
            "/api/ns_apiResource_Foo_v1/openapi.yaml",
            "ns:apiResource:Foo:v1",
        );
        assert_eq!(rewritten, "/ord/v1/api/ns:apiResource:Foo:v1/openapi.yaml");
    }

    #[test]
    fn relative_path_is_resolved_under_ord_v1() {
        assert_eq!(
            rewrite_resource_url("docs/api.yaml", "ns:apiResource:Foo:v1"),
            "/ord/v1/docs/api.yaml"
        );
    }

    #[test]
    fn dot_dot_segments_are_collapsed() {
        assert_eq!(posix_resolve("/", "a/../b"), "/b");
        assert_eq!(posix_resolve("/", "a/./b"), "/a/b");
        assert_eq!(posix_resolve("/", "/a//b/"), "/a/b");
    }
}
