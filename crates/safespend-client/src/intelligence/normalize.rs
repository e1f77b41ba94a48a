/// Grouping key for a merchant label: uppercase alphanumerics with runs of
/// punctuation and whitespace collapsed to one space.
pub fn merchant_key(value: &str) -> Option<String> {
    normalize_text(value)
}

pub fn category_key(value: Option<&str>) -> Option<String> {
    value.and_then(normalize_text)
}

/// Human label kept next to a grouping key.
pub fn display_label(value: &str) -> String {
    value.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn normalize_text(value: &str) -> Option<String> {
    let mut output = String::new();
    let mut previous_space = false;
    for character in value.trim().chars() {
        if character.is_alphanumeric() {
            output.extend(character.to_uppercase());
            previous_space = false;
        } else if !previous_space {
            output.push(' ');
            previous_space = true;
        }
    }

    let normalized = output.trim().to_string();
    if normalized.is_empty() {
        return None;
    }
    Some(normalized)
}
