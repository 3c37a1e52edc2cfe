use serde::Serialize;

/// The closed set of moods the tracker accepts.
///
/// Declaration order is the selector order shown to users (the first variant
/// is the default selection) and the order chart colours are assigned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Frustrated,
    Confused,
    Celebratory,
    Sad,
    Thoughtful,
    Tired,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Happy,
        Mood::Frustrated,
        Mood::Confused,
        Mood::Celebratory,
        Mood::Sad,
        Mood::Thoughtful,
        Mood::Tired,
    ];

    /// The emoji written to the store.
    pub fn symbol(self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Frustrated => "😠",
            Mood::Confused => "😕",
            Mood::Celebratory => "🎉",
            Mood::Sad => "😥",
            Mood::Thoughtful => "🤔",
            Mood::Tired => "😴",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Frustrated => "Frustrated",
            Mood::Confused => "Confused",
            Mood::Celebratory => "Celebratory",
            Mood::Sad => "Sad",
            Mood::Thoughtful => "Thoughtful",
            Mood::Tired => "Tired",
        }
    }

    /// Selector label, e.g. `"😊 Happy"`.
    pub fn label(self) -> String {
        format!("{} {}", self.symbol(), self.name())
    }

    /// Position in selector order.
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|m| *m == self).unwrap_or(0)
    }

    pub fn from_symbol(symbol: &str) -> Option<Mood> {
        let symbol = symbol.trim();
        Self::ALL.into_iter().find(|m| m.symbol() == symbol)
    }

    /// Resolve user input given as a symbol, a selector label, or a name.
    pub fn parse_input(input: &str) -> Option<Mood> {
        let input = input.trim();
        if let Some(mood) = Self::from_symbol(input) {
            return Some(mood);
        }
        Self::ALL.into_iter().find(|m| {
            m.label() == input || m.name().eq_ignore_ascii_case(input)
        })
    }

    /// Catalog symbols in lexical order, the order count tables are reported in.
    pub fn sorted_by_symbol() -> Vec<Mood> {
        let mut moods = Self::ALL.to_vec();
        moods.sort_by_key(|m| m.symbol());
        moods
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_seven_distinct_symbols() {
        let mut symbols: Vec<&str> = Mood::ALL.iter().map(|m| m.symbol()).collect();
        symbols.sort();
        symbols.dedup();
        assert_eq!(symbols.len(), 7);
    }

    #[test]
    fn test_parse_input_accepts_symbol_label_and_name() {
        assert_eq!(Mood::parse_input("😠"), Some(Mood::Frustrated));
        assert_eq!(Mood::parse_input("😠 Frustrated"), Some(Mood::Frustrated));
        assert_eq!(Mood::parse_input("frustrated"), Some(Mood::Frustrated));
        assert_eq!(Mood::parse_input("  Tired "), Some(Mood::Tired));
    }

    #[test]
    fn test_parse_input_rejects_unknown() {
        assert_eq!(Mood::parse_input(""), None);
        assert_eq!(Mood::parse_input("🙂"), None);
        assert_eq!(Mood::parse_input("Grumpy"), None);
    }

    #[test]
    fn test_sorted_by_symbol_is_lexical() {
        let sorted = Mood::sorted_by_symbol();
        assert_eq!(sorted.len(), 7);
        assert!(sorted.windows(2).all(|w| w[0].symbol() < w[1].symbol()));
        assert_eq!(sorted[0], Mood::Celebratory);
        assert_eq!(sorted[6], Mood::Thoughtful);
    }

    #[test]
    fn test_index_follows_declaration_order() {
        assert_eq!(Mood::Happy.index(), 0);
        assert_eq!(Mood::Tired.index(), 6);
    }
}
