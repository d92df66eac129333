/// Branch suffix appended to bare issue identifiers.
pub const IMPL_SUFFIX: &str = "/impl";

/// Directory suffix used when sanitizing leaves nothing behind.
pub const FALLBACK_SUFFIX: &str = "branch";

const UNSAFE_PATH_CHARS: &[char] = &['/', '\\', '*', '?', ':', '<', '>', '|', '"'];

/// Names derived from a raw identifier. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
    pub branch_name: String,
    pub dir_suffix: String,
}

/// Derives the branch name and directory suffix for an identifier.
///
/// A slash-containing identifier is used verbatim as the branch name and
/// sanitized into the suffix. Anything else is treated as an issue token:
/// the branch becomes `<id>/impl` and the suffix is the identifier as-is.
/// Total: the empty string yields `/impl` and an empty suffix, so callers
/// must reject empty identifiers before creating anything.
pub fn resolve(identifier: &str) -> ResolvedNames {
    if identifier.contains('/') {
        return ResolvedNames {
            branch_name: identifier.to_string(),
            dir_suffix: sanitize(identifier),
        };
    }
    ResolvedNames {
        branch_name: format!("{}{}", identifier, IMPL_SUFFIX),
        dir_suffix: identifier.to_string(),
    }
}

/// Replaces characters that are illegal in file names with `-`, collapses
/// runs of `-` and trims them from both ends.
pub fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_hyphen = false;
    for ch in value.chars() {
        let ch = if UNSAFE_PATH_CHARS.contains(&ch) {
            '-'
        } else {
            ch
        };
        if ch == '-' {
            if last_hyphen {
                continue;
            }
            last_hyphen = true;
        } else {
            last_hyphen = false;
        }
        out.push(ch);
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        return FALLBACK_SUFFIX.to_string();
    }
    trimmed.to_string()
}
