use crate::intelligence::types::CategoryClass;

const FIXED_KEYWORDS: [&str; 12] = [
    "rent",
    "mortgage",
    "insurance",
    "loan",
    "subscription",
    "utilit",
    "electric",
    "water",
    "internet",
    "phone",
    "tuition",
    "childcare",
];

const SINKING_KEYWORDS: [&str; 9] = [
    "savings",
    "saving",
    "vacation",
    "emergency",
    "investment",
    "invest",
    "sinking",
    "goal",
    "retirement",
];

/// Maps a free-text category label onto a spending class.
///
/// Fixed keywords win over sinking keywords when both match. Absent or blank
/// labels are variable spend.
pub fn classify_category(category: Option<&str>) -> CategoryClass {
    let Some(raw) = category else {
        return CategoryClass::Variable;
    };
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return CategoryClass::Variable;
    }

    if FIXED_KEYWORDS
        .iter()
        .any(|keyword| normalized.contains(keyword))
    {
        return CategoryClass::Fixed;
    }
    if SINKING_KEYWORDS
        .iter()
        .any(|keyword| normalized.contains(keyword))
    {
        return CategoryClass::Sinking;
    }
    CategoryClass::Variable
}

#[cfg(test)]
mod tests {
    use super::classify_category;
    use crate::intelligence::types::CategoryClass;

    #[test]
    fn blank_and_missing_labels_are_variable() {
        assert_eq!(classify_category(None), CategoryClass::Variable);
        assert_eq!(classify_category(Some("   ")), CategoryClass::Variable);
    }

    #[test]
    fn keywords_match_as_substrings_after_normalization() {
        assert_eq!(classify_category(Some("  RENT ")), CategoryClass::Fixed);
        assert_eq!(
            classify_category(Some("Car Insurance")),
            CategoryClass::Fixed
        );
        assert_eq!(
            classify_category(Some("Streaming Subscriptions")),
            CategoryClass::Fixed
        );
        assert_eq!(
            classify_category(Some("Vacation Fund")),
            CategoryClass::Sinking
        );
        assert_eq!(
            classify_category(Some("Emergency")),
            CategoryClass::Sinking
        );
        assert_eq!(
            classify_category(Some("Groceries")),
            CategoryClass::Variable
        );
    }

    #[test]
    fn fixed_keywords_take_priority_over_sinking() {
        assert_eq!(
            classify_category(Some("Loan savings plan")),
            CategoryClass::Fixed
        );
    }
}
