/// Converts a field name to SCREAMING_SNAKE_CASE.
///
/// Works for both `snake_case` and `CamelCase` input: `listen_port` and `ListenPort` both become
/// `LISTEN_PORT`, and acronyms stay together (`HTTPServer` becomes `HTTP_SERVER`).
pub fn to_screaming_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (index, &ch) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }

        if ch.is_uppercase() && index > 0 && !result.is_empty() && !result.ends_with('_') {
            let prev = chars[index - 1];
            let next_is_lower = chars.get(index + 1).is_some_and(|next| next.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                result.push('_');
            }
        }

        result.extend(ch.to_uppercase());
    }

    while result.ends_with('_') {
        result.pop();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_input() {
        assert_eq!(to_screaming_snake("value"), "VALUE");
        assert_eq!(to_screaming_snake("embedded_field"), "EMBEDDED_FIELD");
        assert_eq!(to_screaming_snake("retry_count_2"), "RETRY_COUNT_2");
    }

    #[test]
    fn camel_case_input() {
        assert_eq!(to_screaming_snake("StructField"), "STRUCT_FIELD");
        assert_eq!(to_screaming_snake("HTTPServer"), "HTTP_SERVER");
        assert_eq!(to_screaming_snake("listenPort"), "LISTEN_PORT");
        assert_eq!(to_screaming_snake("Value2Go"), "VALUE2_GO");
    }

    #[test]
    fn separators_collapse() {
        assert_eq!(to_screaming_snake("_leading__double_"), "LEADING_DOUBLE");
        assert_eq!(to_screaming_snake("kebab-case"), "KEBAB_CASE");
    }
}
