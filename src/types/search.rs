//! Smart search types

use serde::{Deserialize, Serialize};

/// One ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document_id: u64,
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub relevance_score: f32,
}

impl SearchHit {
    pub fn relevance(&self) -> Relevance {
        Relevance::from_score(self.relevance_score)
    }
}

/// Response of `POST /documents/search/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub total_found: u32,
    #[serde(default)]
    pub search_summary: String,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

/// Response of `POST /documents/search/suggestions/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Relevance band for a 0–10 score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    High,
    Moderate,
    Some,
}

impl Relevance {
    pub fn from_score(score: f32) -> Self {
        if score >= 8.0 {
            Relevance::High
        } else if score >= 6.0 {
            Relevance::Moderate
        } else {
            Relevance::Some
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Relevance::High => "Highly Relevant",
            Relevance::Moderate => "Moderately Relevant",
            Relevance::Some => "Somewhat Relevant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevance_bands() {
        assert_eq!(Relevance::from_score(9.1), Relevance::High);
        assert_eq!(Relevance::from_score(8.0), Relevance::High);
        assert_eq!(Relevance::from_score(6.0), Relevance::Moderate);
        assert_eq!(Relevance::from_score(5.9).label(), "Somewhat Relevant");
    }
}
