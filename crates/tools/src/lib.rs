//! Built-in tool implementations for Briefly.
//!
//! The model gets exactly one capability: fetching a news article by URL
//! through a readability proxy.

pub mod fetch_article;

use briefly_config::ArticleConfig;
use briefly_core::tool::ToolRegistry;

pub use fetch_article::{Article, ArticleError, ArticleFetcher, FetchArticleTool};

/// Create the tool registry advertised to the model.
pub fn default_registry(config: &ArticleConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(FetchArticleTool::new(ArticleFetcher::new(config))));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_advertises_fetch_article_only() {
        let registry = default_registry(&ArticleConfig::default());
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "fetch_article");
        assert!(defs[0].strict);
        assert_eq!(defs[0].parameters["required"][0], "url");
    }
}
