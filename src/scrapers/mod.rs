pub mod billa;
pub mod foodora;

/// Lowercases, collapses whitespace runs into '-', and drops everything
/// outside [a-z0-9-]. Czech diacritics fall away with the rest.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = false;
    for c in input.to_lowercase().chars() {
        if c.is_whitespace() {
            if !last_dash {
                out.push('-');
                last_dash = true;
            }
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            out.push(c);
            last_dash = c == '-';
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn collapses_whitespace_to_dashes() {
        assert_eq!(slugify("Ovoce  a   zelenina"), "ovoce-a-zelenina");
    }

    #[test]
    fn drops_non_ascii() {
        assert_eq!(slugify("Pečivo"), "peivo");
        assert_eq!(slugify("Mléčné výrobky a vejce"), "mln-vrobky-a-vejce");
    }

    #[test]
    fn keeps_existing_dashes_and_digits() {
        assert_eq!(slugify("napoje-1474"), "napoje-1474");
    }
}
