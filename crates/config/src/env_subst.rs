/// Replace `${ENV_VAR}` placeholders in raw config text.
///
/// Unresolvable variables are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Replace `${ENV_VAR}` placeholders using a custom lookup function.
pub fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(val) => result.push_str(&val),
                    None => {
                        result.push_str("${");
                        result.push_str(name);
                        result.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            // Malformed or empty placeholder, emit literally.
            _ => {
                result.push_str("${");
                rest = after;
            },
        }
    }
    result.push_str(rest);

    result
}
