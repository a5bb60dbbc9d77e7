//! URL slug generation for storefronts and products.

/// Lowercase ASCII slug with single dashes between words.
///
/// Non-ASCII letters are dropped rather than transliterated.
///
/// ```
/// use pulse_threads_core::slugify;
///
/// assert_eq!(slugify("Lusaka Street Wear!"), "lusaka-street-wear");
/// assert_eq!(slugify("  --Kitenge & Co--  "), "kitenge-co");
/// ```
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
