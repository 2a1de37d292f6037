use serde::{Deserialize, Serialize};

/// The three classes a sweep image can fall into. This set is closed: the
/// confusion matrix layout, the persisted slot format and the leaderboard
/// wire shape all depend on it staying exactly these three.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
pub enum Category {
    Neutral,
    Soft,
    Hard,
}

impl Category {
    pub const COUNT: usize = 3;
    pub const ALL: [Category; Category::COUNT] =
        [Category::Neutral, Category::Soft, Category::Hard];

    /// Stable index into matrix rows/columns.
    pub(crate) fn index(self) -> usize {
        match self {
            Category::Neutral => 0,
            Category::Soft => 1,
            Category::Hard => 2,
        }
    }

    /// Parse a user-entered token. Accepts the full name or the first
    /// letter, case-insensitive.
    pub fn from_token(token: &str) -> Option<Category> {
        match token.to_ascii_lowercase().as_str() {
            "n" | "neutral" => Some(Category::Neutral),
            "s" | "soft" => Some(Category::Soft),
            "h" | "hard" => Some(Category::Hard),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(Category::Neutral.to_string(), "Neutral");
        assert_eq!(Category::Soft.to_string(), "Soft");
        assert_eq!(Category::Hard.to_string(), "Hard");
    }

    #[test]
    fn serde_uses_variant_names() {
        let json = serde_json::to_string(&Category::Soft).unwrap();
        assert_eq!(json, "\"Soft\"");
        let back: Category = serde_json::from_str("\"Hard\"").unwrap();
        assert_eq!(back, Category::Hard);
    }

    #[test]
    fn from_token_accepts_names_and_shorthands() {
        assert_eq!(Category::from_token("neutral"), Some(Category::Neutral));
        assert_eq!(Category::from_token("S"), Some(Category::Soft));
        assert_eq!(Category::from_token("HARD"), Some(Category::Hard));
        assert_eq!(Category::from_token("x"), None);
        assert_eq!(Category::from_token(""), None);
    }

    #[test]
    fn indices_cover_all_cells() {
        for (i, cat) in Category::ALL.iter().enumerate() {
            assert_eq!(cat.index(), i);
        }
    }
}
