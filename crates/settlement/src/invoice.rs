//! Local pre-validation of payment requests.

const PREFIXES: [&str; 4] = ["lnbcrt", "lntbs", "lntb", "lnbc"];

/// Cheap sanity check that a string could be a BOLT11 payment request:
/// a known network prefix, bech32-ish body, consistent case. The processor
/// does the real decoding; this only keeps obvious garbage off the network.
pub fn looks_like_bolt11(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.len() < 20 {
        return false;
    }
    // BOLT11 forbids mixed case.
    if trimmed != trimmed.to_lowercase() && trimmed != trimmed.to_uppercase() {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    if !PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
        return false;
    }
    lowered.contains('1') && lowered.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "lnbc6000n1pjluvz5pp5b0tm79wgs5w0h0h6cqeqyw0msvs5k5q7weyrc227h5sjmdyrxsqdq2f38xy6t5wvs9getnwssyjmnkda5kxegcqzzsxqrrsssp5e2vs9g2m9nqvvs8ywhgk3mcqknc2hqkcjg8genavtnmhmwhfkstq9qyyssq";

    #[test]
    fn accepts_typical_invoice() {
        assert!(looks_like_bolt11(SAMPLE));
        assert!(looks_like_bolt11(&format!("  {SAMPLE}  ")));
        assert!(looks_like_bolt11(&SAMPLE.to_uppercase()));
    }

    #[test]
    fn rejects_garbage() {
        assert!(!looks_like_bolt11(""));
        assert!(!looks_like_bolt11("hello world"));
        assert!(!looks_like_bolt11("lnbc"));
        assert!(!looks_like_bolt11("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq"));
    }

    #[test]
    fn rejects_mixed_case() {
        let mixed = format!("lnbc{}", "1Qqqqqqqqqqqqqqqqqqqqqqqq");
        assert!(!looks_like_bolt11(&mixed));
    }
}
