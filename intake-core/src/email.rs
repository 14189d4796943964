//! Email → lookup domain.

/// The domain segment of `email`: the text after the first `@`, up to a
/// second `@` if one is present. `None` when there is no `@` or the segment
/// is blank.
pub fn domain_of(email: &str) -> Option<&str> {
    let domain = email.split('@').nth(1)?.trim();
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

pub fn is_well_formed(email: &str) -> bool {
    domain_of(email).is_some()
}

/// Case-folded directory key.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().to_lowercase()
}
