// ✉️ Email Validator
// Purely syntactic check. No DNS, no MX lookup, no side effects.

/// Shortest accepted top-level extension (in characters)
pub const MIN_EXTENSION_LEN: usize = 2;

/// Longest accepted top-level extension (in characters)
pub const MAX_EXTENSION_LEN: usize = 6;

/// Decide whether `email` is syntactically acceptable.
///
/// Rules, first failure wins:
/// 1. contains both `@` and `.`
/// 2. does not start or end with `@` or `.`
/// 3. exactly one `@`, splitting into `local_part` and `domain`
/// 4. `domain` contains a `.`
/// 5. `domain` splits on its last `.` into `domain_name` and `extension`
/// 6. `local_part` and `domain_name` are non-empty
/// 7. `extension` is 2 to 6 characters long
pub fn is_valid_email(email: &str) -> bool {
    if !email.contains('@') || !email.contains('.') {
        return false;
    }

    if email.starts_with('@')
        || email.ends_with('@')
        || email.starts_with('.')
        || email.ends_with('.')
    {
        return false;
    }

    let mut parts = email.split('@');
    let (local_part, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    let (domain_name, extension) = match domain.rsplit_once('.') {
        Some(split) => split,
        None => return false,
    };

    if local_part.is_empty() || domain_name.is_empty() {
        return false;
    }

    let extension_len = extension.chars().count();
    (MIN_EXTENSION_LEN..=MAX_EXTENSION_LEN).contains(&extension_len)
}

// ============================================================================
// TESTS
// ============================================================================
