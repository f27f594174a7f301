//! Text cleanup for extracted field values.

/// Reduce a scraped price string to its digit groups, keeping the
/// thousands-separated shape ("€ 18.500,-" becomes "18 500").
///
/// Decimal tails and footnote markers after a comma are discarded;
/// leading labels before the first digit group are skipped.
pub fn clean_price(raw: &str) -> String {
    let flattened = raw
        .replace('€', " ")
        .replace("EUR", " ")
        .replace('.', " ");
    let whole = flattened.split(',').next().unwrap_or("");

    let mut groups: Vec<String> = Vec::new();
    for token in whole.split_whitespace() {
        if !token.chars().all(|c| c.is_ascii_digit()) {
            if groups.is_empty() {
                continue;
            }
            break;
        }
        if groups.is_empty() {
            groups.push(token.to_string());
        } else {
            // Thousands groups are three digits; anything extra is footnote residue
            groups.push(token.chars().take(3).collect());
        }
    }
    groups.join(" ")
}

/// Rewrite a scraped phone string into canonical digits-only form with the
/// given country prefix ("0498 12 34 56" with prefix "32" becomes
/// "32498123456"). A "00" lead-in is the international dialing prefix, a
/// single leading zero the national trunk digit. Empty input stays empty.
pub fn canonical_phone(raw: &str, country_prefix: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    // National numbers always get the prefix, even when their significant
    // digits happen to start with it (Antwerp's "03 2..." area code)
    let (rest, national) = match digits.strip_prefix("00") {
        Some(rest) => (rest, false),
        None => (digits.as_str(), digits.starts_with('0')),
    };
    let significant = rest.trim_start_matches('0');
    if significant.is_empty() {
        return String::new();
    }
    if !national && significant.starts_with(country_prefix) {
        significant.to_string()
    } else {
        format!("{}{}", country_prefix, significant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_keeps_thousand_groups_and_drops_decimals() {
        assert_eq!(clean_price("€ 18.500,-"), "18 500");
        assert_eq!(clean_price("20 0001, 5"), "20 000");
        assert_eq!(clean_price("20 000"), "20 000");
    }

    #[test]
    fn price_skips_leading_labels() {
        assert_eq!(clean_price("Prijs: € 9.990"), "9 990");
    }

    #[test]
    fn price_of_garbage_is_empty() {
        assert_eq!(clean_price(""), "");
        assert_eq!(clean_price("Prijs op aanvraag"), "");
    }

    #[test]
    fn phone_gets_the_country_prefix() {
        assert_eq!(canonical_phone("0498 12 34 56", "32"), "32498123456");
        assert_eq!(canonical_phone("0498123456", "32"), "32498123456");
    }

    #[test]
    fn phone_already_prefixed_is_untouched() {
        assert_eq!(canonical_phone("32498123456", "32"), "32498123456");
        assert_eq!(canonical_phone("+32 498 12 34 56", "32"), "32498123456");
        assert_eq!(canonical_phone("0032 498 12 34 56", "32"), "32498123456");
    }

    #[test]
    fn phone_with_a_trunk_zero_is_national_even_when_it_looks_prefixed() {
        // Antwerp landline: significant digits start with "32" but the
        // leading zero marks a national number
        assert_eq!(canonical_phone("03 234 56 78", "32"), "3232345678");
        assert_eq!(canonical_phone("032 345 678", "32"), "3232345678");
        // The same number written internationally is left alone
        assert_eq!(canonical_phone("+32 3 234 56 78", "32"), "3232345678");
        assert_eq!(canonical_phone("0032 3 234 56 78", "32"), "3232345678");
    }

    #[test]
    fn phone_of_no_digits_is_empty() {
        assert_eq!(canonical_phone("", "32"), "");
        assert_eq!(canonical_phone("bel ons", "32"), "");
        assert_eq!(canonical_phone("000", "32"), "");
    }
}
