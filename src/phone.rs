//! Normalization of Russian phone numbers to the canonical 11-digit form.

/// Normalizes an arbitrary phone string to a canonical 11-digit MSISDN
/// starting with `7`.
///
/// All non-digit characters are stripped first, so `+7 999 123-45-67` and
/// `89991234567` both normalize to `79991234567`. Returns `None` when the
/// input cannot be reduced to exactly 11 digits.
pub fn normalize(raw: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.len() == 10 {
        digits.insert(0, '7');
    } else if digits.len() == 11 && digits.starts_with('8') {
        digits.replace_range(0..1, "7");
    } else if digits.len() == 12 && digits.starts_with("87") {
        // Double prefix, e.g. `8` dialed in front of a full `7...` number.
        digits.remove(0);
    }

    (digits.len() == 11).then_some(digits)
}

/// Renders a canonical 11-digit phone as `+7 (XXX) XXX-XX-XX`.
///
/// Inputs that are not 11 digits are returned unchanged.
pub fn format_display(canonical: &str) -> String {
    if canonical.len() != 11 || !canonical.chars().all(|c| c.is_ascii_digit()) {
        return canonical.to_string();
    }
    format!(
        "+7 ({}) {}-{}-{}",
        &canonical[1..4],
        &canonical[4..7],
        &canonical[7..9],
        &canonical[9..11]
    )
}
