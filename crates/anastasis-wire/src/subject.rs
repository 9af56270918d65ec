//! Wire-subject and `payto://` parsing (spec.md §4.3, §6's "Wire-subject
//! parsing (normative)"), grounded directly in the original `iban.c`'s
//! `extract_code()` and `anastasis-helper-authorization-iban.c`'s
//! `payto_get_iban()`.

/// Extract the Anastasis challenge code from a wire transfer's subject
/// line: the literal `anastasis` (case-insensitive, anywhere in the
/// string) must be present, then the first contiguous run of decimal
/// digits anywhere in the subject (not anchored to a position relative
/// to the keyword) is parsed as the code.
///
/// spec.md §9 flags the lack of anchoring as an open question; this
/// keeps the original's permissive behavior rather than inventing a
/// stricter rule the source never had.
pub fn extract_code(wire_subject: &str) -> Option<u64> {
    let lower = wire_subject.to_ascii_lowercase();
    if !lower.contains("anastasis") {
        return None;
    }
    let digit_start = wire_subject.find(|c: char| c.is_ascii_digit())?;
    let digits: String = wire_subject[digit_start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Extract the IBAN from a `payto://iban/...` URI, mirroring
/// `payto_get_iban`: strips the `payto://iban/` prefix, then an optional
/// `BIC/` segment, then trims a trailing `?params`.
pub fn iban_from_payto(payto_uri: &str) -> Option<String> {
    const PREFIX: &str = "payto://iban/";
    if payto_uri.len() < PREFIX.len() || !payto_uri[..PREFIX.len()].eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    let rest = &payto_uri[PREFIX.len()..];
    let query_pos = rest.find('?');
    let slash_pos = rest.find('/');

    let start = match (slash_pos, query_pos) {
        (Some(slash), Some(q)) if slash < q => slash + 1,
        (Some(slash), None) => slash + 1,
        _ => 0,
    };

    let end = query_pos.unwrap_or(rest.len());
    if start > end {
        return None;
    }
    Some(rest[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_code_regardless_of_keyword_case() {
        assert_eq!(extract_code("Anastasis 1234 thank you"), Some(1234));
        assert_eq!(extract_code("ANASTASIS 77"), Some(77));
        assert_eq!(extract_code("my anastasis code: 42"), Some(42));
    }

    #[test]
    fn requires_the_keyword() {
        assert_eq!(extract_code("thanks for 1234"), None);
    }

    #[test]
    fn requires_at_least_one_digit() {
        assert_eq!(extract_code("anastasis please"), None);
    }

    #[test]
    fn takes_the_first_digit_run_unanchored() {
        assert_eq!(extract_code("anastasis ref 9 and also 42"), Some(9));
    }

    #[test]
    fn plain_iban_uri_round_trips() {
        assert_eq!(iban_from_payto("payto://iban/DE1234567890"), Some("DE1234567890".into()));
    }

    #[test]
    fn iban_uri_with_bic_and_params() {
        assert_eq!(
            iban_from_payto("payto://iban/COBADEFFXXX/DE1234567890?message=hi"),
            Some("DE1234567890".into())
        );
    }

    #[test]
    fn iban_uri_with_params_only() {
        assert_eq!(iban_from_payto("payto://iban/DE1234567890?message=hi"), Some("DE1234567890".into()));
    }

    #[test]
    fn non_iban_uri_is_rejected() {
        assert_eq!(iban_from_payto("payto://x-taler-bank/host/acct"), None);
    }
}
