//! Path-prefix scoping over the storage key namespace
//!
//! Pure string containment over `/`-separated keys. No existence checks
//! against the store: a non-existent path under the allowed boundary is
//! still in scope.

use crate::error::AuthError;

/// Canonical base for a restriction: trailing separators stripped, then
/// exactly one appended. `"team/alpha"` and `"team/alpha/"` both become
/// `"team/alpha/"`.
fn canonical_base(restriction: &str) -> String {
    format!("{}/", restriction.trim_end_matches('/'))
}

/// Resolve the effective prefix for a listing request.
///
/// Without a restriction the requested prefix passes through untouched.
/// With one, a request outside the restriction is forbidden, and an
/// empty request lands at the restriction root itself instead of being
/// denied; that is how a restricted user gets a sensible default view.
pub fn effective_list_prefix(
    restriction: Option<&str>,
    requested: &str,
) -> Result<String, AuthError> {
    let Some(restriction) = restriction.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(requested.to_string());
    };

    let base = canonical_base(restriction);
    let requested_norm = requested.trim().trim_end_matches('/');

    if requested_norm.is_empty() {
        return Ok(base);
    }
    if !format!("{}/", requested_norm).starts_with(&base) {
        return Err(AuthError::Forbidden);
    }
    Ok(requested.to_string())
}

/// Check whether a direct key access (download, delete, upload target)
/// lies at or under the restriction boundary.
///
/// Equality and strict descendants are allowed; siblings and ancestors
/// are not: `"a/b"` admits `"a/b"` and `"a/b/c"` but never `"a/bc"` or
/// `"a"`.
pub fn can_access_key(restriction: Option<&str>, key: &str) -> bool {
    let Some(restriction) = restriction.map(str::trim).filter(|r| !r.is_empty()) else {
        return true;
    };

    let base = canonical_base(restriction);
    let key_norm = format!("{}/", key.trim().trim_end_matches('/'));
    key_norm == base || key_norm.starts_with(&base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_restriction_passes_everything_through() {
        assert_eq!(effective_list_prefix(None, "").unwrap(), "");
        assert_eq!(effective_list_prefix(None, "x/y").unwrap(), "x/y");
        assert_eq!(effective_list_prefix(Some(""), "x/y").unwrap(), "x/y");
        assert!(can_access_key(None, "anything/at/all"));
        assert!(can_access_key(Some("  "), "anything"));
    }

    #[test]
    fn test_empty_request_lands_at_restriction_root() {
        let effective = effective_list_prefix(Some("team/alpha"), "").unwrap();
        assert_eq!(effective, "team/alpha/");
        // Trailing separator on the restriction makes no difference
        let effective = effective_list_prefix(Some("team/alpha/"), "").unwrap();
        assert_eq!(effective, "team/alpha/");
    }

    #[test]
    fn test_listing_outside_restriction_is_forbidden() {
        assert!(matches!(
            effective_list_prefix(Some("team/alpha"), "team/beta"),
            Err(AuthError::Forbidden)
        ));
        assert!(matches!(
            effective_list_prefix(Some("team/alpha"), "team"),
            Err(AuthError::Forbidden)
        ));
    }

    #[test]
    fn test_listing_inside_restriction_is_allowed() {
        assert_eq!(
            effective_list_prefix(Some("team/alpha"), "team/alpha").unwrap(),
            "team/alpha"
        );
        assert_eq!(
            effective_list_prefix(Some("team/alpha"), "team/alpha/reports").unwrap(),
            "team/alpha/reports"
        );
    }

    #[test]
    fn test_key_containment_boundary() {
        let r = Some("a/b");
        assert!(can_access_key(r, "a/b"));
        assert!(can_access_key(r, "a/b/"));
        assert!(can_access_key(r, "a/b/c"));
        assert!(can_access_key(r, "a/b/c/d.txt"));
        // Sibling sharing the prefix characters is outside the boundary
        assert!(!can_access_key(r, "a/bc"));
        // Ancestors are outside
        assert!(!can_access_key(r, "a"));
        assert!(!can_access_key(r, ""));
    }
}
