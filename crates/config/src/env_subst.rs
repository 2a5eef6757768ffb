//! `${ENV_VAR}` placeholder expansion for raw config text.

/// Expand `${NAME}` and `${NAME:-fallback}` placeholders from the process
/// environment.
///
/// A placeholder whose variable is unset and has no fallback is kept verbatim
/// so that validation can point at it.
pub fn substitute_env(input: &str) -> String {
    expand(input, |name| std::env::var(name).ok())
}

fn expand(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // Unterminated: copy the remainder untouched.
            out.push_str(&rest[start..]);
            return out;
        };

        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };

        match (name.is_empty(), lookup(name), fallback) {
            (false, Some(value), _) => out.push_str(&value),
            (false, None, Some(fallback)) => out.push_str(fallback),
            _ => out.push_str(&rest[start..start + 3 + end]),
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Returns the first `${...}` placeholder still present in `value`, if any.
pub fn unresolved_placeholder(value: &str) -> Option<&str> {
    let start = value.find("${")?;
    let len = value[start..].find('}')?;
    Some(&value[start..start + len + 1])
}
