//! Query filters.

use serde::{Deserialize, Serialize};

/// Narrows a similarity query. An empty filter matches every point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchFilter {
    /// Only points whose `path` starts with this prefix (e.g. `src/app/`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
}

impl VectorSearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.path_prefix.is_none()
    }

    /// Whether a point stored under `path` passes the filter.
    pub fn matches(&self, path: Option<&str>) -> bool {
        match (&self.path_prefix, path) {
            (None, _) => true,
            (Some(prefix), Some(path)) => path.starts_with(prefix.as_str()),
            (Some(_), None) => false,
        }
    }

    /// `WHERE` clause for LanceDB, `None` when the filter is empty.
    ///
    /// The prefix is matched literally: `%` and `_` are escaped with `\`.
    pub fn to_lance_filter(&self) -> Option<String> {
        self.path_prefix.as_ref().map(|prefix| {
            format!(
                "path LIKE '{}%' ESCAPE '\\'",
                escape_sql_string(&escape_like_pattern(prefix))
            )
        })
    }
}

fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_sql_string(s: &str) -> String {
    s.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = VectorSearchFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(None));
        assert!(filter.to_lance_filter().is_none());
    }

    #[test]
    fn test_path_prefix() {
        let filter = VectorSearchFilter::new().with_path_prefix("src/app/");
        assert!(filter.matches(Some("src/app/page.tsx")));
        assert!(!filter.matches(Some("src/lib/db/index.ts")));
        assert!(!filter.matches(None));
        assert_eq!(
            filter.to_lance_filter().as_deref(),
            Some(r"path LIKE 'src/app/%' ESCAPE '\'")
        );
    }

    #[test]
    fn test_quotes_are_escaped() {
        let filter = VectorSearchFilter::new().with_path_prefix("it's/");
        assert_eq!(
            filter.to_lance_filter().as_deref(),
            Some(r"path LIKE 'it''s/%' ESCAPE '\'")
        );
    }

    #[test]
    fn test_like_wildcards_are_literal() {
        let filter = VectorSearchFilter::new().with_path_prefix(r"src/my_app/100%\");
        assert_eq!(
            filter.to_lance_filter().as_deref(),
            Some(r"path LIKE 'src/my\_app/100\%\\%' ESCAPE '\'")
        );
        assert!(filter.matches(Some(r"src/my_app/100%\page.tsx")));
        assert!(!filter.matches(Some("src/myXapp/100%/page.tsx")));
    }
}
