/// Where to go after login when no usable target was given
pub const DEFAULT_REDIRECT: &str = "/dashboard";

/// Post-login destination. Only internal paths are honored; anything that
/// could leave the app (absolute URLs, `//host`, `/\host`) falls back to
/// the dashboard.
pub fn safe_redirect(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") =>
        {
            path.to_string()
        }
        _ => DEFAULT_REDIRECT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_paths_allowed() {
        assert_eq!(safe_redirect(Some("/listings/new")), "/listings/new");
        assert_eq!(safe_redirect(Some("/")), "/");
    }

    #[test]
    fn test_external_targets_rejected() {
        assert_eq!(safe_redirect(None), DEFAULT_REDIRECT);
        assert_eq!(safe_redirect(Some("")), DEFAULT_REDIRECT);
        assert_eq!(safe_redirect(Some("https://evil.example")), DEFAULT_REDIRECT);
        assert_eq!(safe_redirect(Some("//evil.example")), DEFAULT_REDIRECT);
        assert_eq!(safe_redirect(Some("/\\evil.example")), DEFAULT_REDIRECT);
        assert_eq!(safe_redirect(Some("dashboard")), DEFAULT_REDIRECT);
    }
}
