//! Header-name suggestions, a pure function of the text typed so far

/// Source of completions for a partially typed key
pub trait SuggestionSource: Send + Sync {
    fn suggest(&self, input: &str) -> Vec<String>;
}

const COMMON_HEADERS: &[&str] = &[
    "Accept",
    "Accept-Encoding",
    "Accept-Language",
    "Authorization",
    "Cache-Control",
    "Connection",
    "Content-Length",
    "Content-Type",
    "Cookie",
    "If-Match",
    "If-Modified-Since",
    "If-None-Match",
    "Origin",
    "Pragma",
    "Range",
    "Referer",
    "User-Agent",
    "X-Api-Key",
    "X-Correlation-Id",
    "X-Forwarded-For",
    "X-Request-Id",
];

/// Well-known HTTP request headers, matched by case-insensitive prefix
#[derive(Debug, Clone, Copy)]
pub struct CommonHeaders {
    pub limit: usize,
}

impl Default for CommonHeaders {
    fn default() -> Self {
        CommonHeaders { limit: 6 }
    }
}

impl SuggestionSource for CommonHeaders {
    fn suggest(&self, input: &str) -> Vec<String> {
        let needle = input.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        COMMON_HEADERS
            .iter()
            .filter(|h| {
                let h = h.to_ascii_lowercase();
                h.starts_with(&needle) && h != needle
            })
            .take(self.limit)
            .map(|h| h.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        let source = CommonHeaders::default();
        assert_eq!(
            source.suggest("content-"),
            vec!["Content-Length".to_string(), "Content-Type".to_string()]
        );
    }

    #[test]
    fn test_empty_or_complete_input_has_no_suggestions() {
        let source = CommonHeaders::default();
        assert!(source.suggest("  ").is_empty());
        assert!(source.suggest("Origin").is_empty());
    }

    #[test]
    fn test_limit_applies() {
        let source = CommonHeaders { limit: 2 };
        assert_eq!(source.suggest("a").len(), 2);
    }
}
