//! Region names understood by the news lookup

/// A region name and the country code the news service expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Lowercase name matched against user input
    pub name: &'static str,
    /// Lookup key sent to the news service
    pub code: &'static str,
}

const fn region(name: &'static str, code: &'static str) -> Region {
    Region { name, code }
}

/// Matching order matters: the first entry contained in the input wins
pub const REGIONS: &[Region] = &[
    region("india", "in"),
    region("usa", "us"),
    region("united states", "us"),
    region("america", "us"),
    region("germany", "de"),
    region("france", "fr"),
    region("japan", "jp"),
    region("china", "cn"),
    region("australia", "au"),
    region("uk", "gb"),
    region("united kingdom", "gb"),
    region("canada", "ca"),
    region("brazil", "br"),
    region("russia", "ru"),
    region("south africa", "za"),
    region("singapore", "sg"),
];

/// Drop everything but ASCII letters and whitespace, then trim
#[must_use]
pub fn clean_region_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// First table entry whose name occurs in `cleaned`, ignoring case
#[must_use]
pub fn lookup_region(cleaned: &str) -> Option<&'static Region> {
    let lowered = cleaned.to_lowercase();
    REGIONS.iter().find(|r| lowered.contains(r.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(input: &str) -> Option<&'static str> {
        lookup_region(&clean_region_input(input)).map(|r| r.code)
    }

    #[test]
    fn punctuation_and_case_are_ignored() {
        assert_eq!(code("India!!"), code("india"));
        assert_eq!(code("  FRANCE. "), Some("fr"));
    }

    #[test]
    fn substring_match_uses_table_order() {
        assert_eq!(code("news from the united kingdom please"), Some("gb"));
        // "usa" precedes "south africa"
        assert_eq!(code("usa and south africa"), Some("us"));
        // Substring, not whole-word, matching
        assert_eq!(code("Prussia"), Some("ru"));
    }

    #[test]
    fn unknown_region_has_no_match() {
        assert_eq!(code("Atlantis"), None);
    }

    #[test]
    fn cleaning_strips_digits_and_symbols() {
        assert_eq!(clean_region_input(" Japan #1 "), "Japan");
        assert_eq!(clean_region_input("123 !!"), "");
    }
}
