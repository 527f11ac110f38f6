//! JSON Pointer helpers shared by the compiler and the resolver.

use json_pointer::JsonPointer;

/// Splits a JSON Pointer string into its unescaped reference tokens.
///
/// The empty string is the whole-document pointer. `~1` decodes to `/` and
/// `~0` to `~`; any other use of `~` is rejected.
pub fn parse(pointer: &str) -> Result<Vec<String>, String> {
    if pointer.is_empty() {
        return Ok(vec![]);
    }

    if !pointer.starts_with('/') {
        return Err(format!("json pointer {:?} must start with '/'", pointer));
    }

    pointer[1..].split('/').map(unescape).collect()
}

fn unescape(token: &str) -> Result<String, String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(format!("invalid escape in json pointer token {:?}", token)),
        }
    }

    Ok(out)
}

/// Formats reference tokens as a canonical JSON Pointer string.
pub fn format<S: AsRef<str>>(tokens: &[S]) -> String {
    let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
    JsonPointer::new(tokens).to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_unescapes_tokens() {
        assert_eq!(parse(""), Ok(vec![]));
        assert_eq!(parse("/"), Ok(vec!["".to_owned()]));
        assert_eq!(
            parse("/definitions/a~1b/c~0d"),
            Ok(vec![
                "definitions".to_owned(),
                "a/b".to_owned(),
                "c~d".to_owned()
            ])
        );
        assert_eq!(parse("/~01"), Ok(vec!["~1".to_owned()]));
    }

    #[test]
    fn parse_rejects_bad_pointers() {
        assert!(parse("definitions").is_err());
        assert!(parse("/a~2").is_err());
        assert!(parse("/a~").is_err());
    }

    #[test]
    fn format_escapes_tokens() {
        assert_eq!(format::<&str>(&[]), "");
        assert_eq!(format(&["properties", "a/b", "~"]), "/properties/a~1b/~0");
    }
}
