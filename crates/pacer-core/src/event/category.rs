//! Job categories and the provider/model heuristic that assigns them.

use serde::{Deserialize, Serialize};

/// Sub-partition of the tiered family, used only for inflight accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Ordinary runs; these drive headroom.
    #[default]
    Primary,
    /// Long "deep" runs; counted but never gating.
    Secondary,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Primary, Category::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Primary => "primary",
            Category::Secondary => "secondary",
        }
    }

    /// Parse an explicit category token. Accepts `standard`/`deep` as aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "standard" => Some(Category::Primary),
            "secondary" | "deep" => Some(Category::Secondary),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One counter per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub primary: usize,
    pub secondary: usize,
}

impl CategoryCounts {
    pub fn new(primary: usize, secondary: usize) -> Self {
        Self { primary, secondary }
    }

    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Primary => self.primary,
            Category::Secondary => self.secondary,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut usize {
        match category {
            Category::Primary => &mut self.primary,
            Category::Secondary => &mut self.secondary,
        }
    }

    pub fn total(&self) -> usize {
        self.primary + self.secondary
    }
}

/// Names that mark a run as secondary when the record carries no explicit category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryHints {
    /// Providers whose runs are always secondary (exact match, case-insensitive).
    #[serde(default = "default_deep_providers")]
    pub deep_providers: Vec<String>,
    /// Substrings of a model name that mark it secondary (case-insensitive).
    #[serde(default = "default_deep_markers")]
    pub deep_markers: Vec<String>,
}

fn default_deep_providers() -> Vec<String> {
    vec!["openaidr".to_string()]
}

fn default_deep_markers() -> Vec<String> {
    vec!["deep-research".to_string()]
}

impl Default for CategoryHints {
    fn default() -> Self {
        Self {
            deep_providers: default_deep_providers(),
            deep_markers: default_deep_markers(),
        }
    }
}

impl CategoryHints {
    /// Heuristic category for a provider/model pair.
    pub fn classify(&self, provider: &str, model: &str) -> Category {
        let provider = provider.trim();
        let model = model.to_ascii_lowercase();
        let deep_provider = self
            .deep_providers
            .iter()
            .any(|p| p.eq_ignore_ascii_case(provider));
        let deep_model = self
            .deep_markers
            .iter()
            .filter(|m| !m.is_empty())
            .any(|m| model.contains(&m.to_ascii_lowercase()));
        if deep_provider || deep_model {
            Category::Secondary
        } else {
            Category::Primary
        }
    }

    /// Explicit token wins when it parses; otherwise fall back to the heuristic.
    pub fn resolve(&self, explicit: Option<&str>, provider: &str, model: &str) -> Category {
        explicit
            .and_then(Category::parse)
            .unwrap_or_else(|| self.classify(provider, model))
    }
}
