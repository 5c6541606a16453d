// Country hotpatch for the geolocation helper.
//
// The helper ships with a baked-in country code padded to 28 characters. Servers
// that self-host the runtime swap it for a placeholder they fill in per request.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::GEO_HOTPATCH_PLACEHOLDER;

lazy_static! {
    static ref GEO_FILENAME: Regex =
        Regex::new(r"(?:^|/)amp-geo(?:-(?:\d+\.\d+|latest))?\.m?js$").unwrap();
    static ref GEO_COUNTRY_TOKEN: Regex = Regex::new(r"[a-z]{2} {26}").unwrap();
}

/// Whether the file at `relative_path` gets the country hotpatch.
pub fn needs_geo_hotpatch(relative_path: &str) -> bool {
    GEO_FILENAME.is_match(relative_path)
}

/// Replace the first country token with the placeholder. Other bytes are untouched.
pub fn apply_geo_hotpatch(body: &str) -> Cow<'_, str> {
    GEO_COUNTRY_TOKEN.replace(body, GEO_HOTPATCH_PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_family() {
        assert!(needs_geo_hotpatch("amp-geo-0.1.js"));
        assert!(needs_geo_hotpatch("v0/amp-geo-0.1.mjs"));
        assert!(needs_geo_hotpatch("v0/amp-geo-latest.js"));
        assert!(needs_geo_hotpatch("v0/amp-geo.js"));
        assert!(!needs_geo_hotpatch("v0/amp-geo-0.1.js.map"));
        assert!(!needs_geo_hotpatch("v0/amp-geolocation-0.1.js"));
        assert!(!needs_geo_hotpatch("v0/xamp-geo-0.1.js"));
        assert!(!needs_geo_hotpatch("v0/amp-geo-0.1.css"));
    }

    #[test]
    fn test_replaces_first_token_only() {
        let pad = " ".repeat(26);
        let body = format!("a=\"us{pad}\";b=\"de{pad}\"");
        let patched = apply_geo_hotpatch(&body);
        assert_eq!(
            patched,
            format!("a=\"{{{{AMP_ISO_COUNTRY_HOTPATCH}}}}\";b=\"de{pad}\"")
        );
    }

    #[test]
    fn test_body_without_token_unchanged() {
        let body = "var x = \"US                          \";";
        assert!(matches!(apply_geo_hotpatch(body), Cow::Borrowed(_)));
    }
}
