//! Name-derivation helpers used when a field or record type does not carry
//! an explicit `column:`/table override.

/// Converts `CamelCase` or `mixedCase` into `snake_case`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower_or_digit = false;
    for (i, ch) in name.char_indices() {
        if ch.is_uppercase() {
            if i != 0 && prev_lower_or_digit {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower_or_digit = false;
        } else {
            out.push(ch);
            prev_lower_or_digit = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

/// A deliberately simple pluralizer: handles the common English endings
/// (`-s`, `-es`, `-y` -> `-ies`) without attempting a full irregular-noun
/// dictionary.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return word.to_string();
    }
    let lower = word.to_ascii_lowercase();
    if lower.ends_with('y') && !ends_with_vowel_before_y(&lower) {
        format!("{}ies", &word[..word.len() - 1])
    } else if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

fn ends_with_vowel_before_y(lower: &str) -> bool {
    let bytes = lower.as_bytes();
    if bytes.len() < 2 {
        return false;
    }
    matches!(bytes[bytes.len() - 2], b'a' | b'e' | b'i' | b'o' | b'u')
}

/// Derives the default table name for a record type: `snake_case` then
/// pluralized.
pub fn default_table_name(type_name: &str) -> String {
    pluralize(&snake_case(type_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_conversions() {
        assert_eq!(snake_case("CrudTestModel"), "crud_test_model");
        assert_eq!(snake_case("nomeModelo"), "nome_modelo");
        assert_eq!(snake_case("id"), "id");
        assert_eq!(snake_case("ID"), "id");
    }

    #[test]
    fn pluralize_common_cases() {
        assert_eq!(pluralize("crud_test_model"), "crud_test_models");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("bus"), "buses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("day"), "days");
    }

    #[test]
    fn default_table_name_examples() {
        assert_eq!(default_table_name("CrudTestModel"), "crud_test_models");
        assert_eq!(default_table_name("Widget"), "widgets");
    }
}
