//! Decoding of fping per-interval summary lines.
//!
//! In loop mode with `-Q`, fping writes one summary line per host per
//! interval on stderr:
//!
//! ```text
//! host1 : xmt/rcv/%loss = 5/5/0%, min/avg/max = 1.01/1.02/1.03
//! host2 : xmt/rcv/%loss = 5/0/100%
//! ```
//!
//! The timing triple only appears when at least one probe got a reply, so
//! the field count varies per line. Anything that does not fit this shape
//! (interval markers, blank lines, fping chatter) is skipped, never an
//! error: the stream is long-lived and one bad line must not kill it.

/// Length-checked view over the whitespace tokens of one line.
///
/// Every access is positional and optional, so a short line surfaces as
/// `None` at the access site instead of a panic.
struct TokenView<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> TokenView<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            tokens: line.split_whitespace().collect(),
        }
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn get(&self, index: usize) -> Option<&'a str> {
        self.tokens.get(index).copied()
    }
}

/// min/avg/max round-trip times for one interval, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

/// One decoded per-interval summary for one host.
///
/// `timing` is all-or-nothing: either every value of the triple parsed or
/// the whole triple is absent. `loss_percent` is passed through unclamped;
/// fping is trusted to emit sane percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub host: String,
    pub sent: u64,
    pub recv: u64,
    pub loss_percent: i64,
    pub timing: Option<Timing>,
}

/// Decode one diagnostic line into a sample, or `None` to skip it.
pub fn decode(line: &str) -> Option<SampleRecord> {
    let tokens = TokenView::new(line);
    if tokens.len() < 2 {
        return None;
    }

    let host = tokens.get(0)?;
    let (sent, recv, loss_percent) = parse_data_triple(tokens.get(4)?)?;

    // Timing presence is decided by token count alone; a summary without
    // replies simply ends after the loss triple.
    let timing = if tokens.len() > 5 {
        tokens.get(7).and_then(parse_timing_triple)
    } else {
        None
    };

    Some(SampleRecord {
        host: host.to_string(),
        sent,
        recv,
        loss_percent,
        timing,
    })
}

/// Parse `sent/recv/loss%,` (trailing `%` and `,` optional) into counts.
fn parse_data_triple(token: &str) -> Option<(u64, u64, i64)> {
    let token = token.trim_end_matches(|c| c == ',' || c == '%');
    let mut parts = token.split('/');
    let sent = parts.next()?.parse().ok()?;
    let recv = parts.next()?.parse().ok()?;
    let loss = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((sent, recv, loss))
}

/// Parse `min/avg/max` into a timing triple.
fn parse_timing_triple(token: &str) -> Option<Timing> {
    let mut parts = token.split('/');
    let min = parts.next()?.parse().ok()?;
    let avg = parts.next()?.parse().ok()?;
    let max = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Timing { min, avg, max })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_LINE: &str = "host1 : xmt/rcv/%loss = 5/5/0%, min/avg/max = 1.01/1.02/1.03";
    const LOSS_ONLY_LINE: &str = "host2 : xmt/rcv/%loss = 5/0/100%";

    #[test]
    fn test_decode_line_with_timing() {
        let sample = decode(FULL_LINE).unwrap();
        assert_eq!(sample.host, "host1");
        assert_eq!(sample.sent, 5);
        assert_eq!(sample.recv, 5);
        assert_eq!(sample.loss_percent, 0);
        assert_eq!(
            sample.timing,
            Some(Timing {
                min: 1.01,
                avg: 1.02,
                max: 1.03
            })
        );
    }

    #[test]
    fn test_decode_line_without_timing() {
        let sample = decode(LOSS_ONLY_LINE).unwrap();
        assert_eq!(sample.host, "host2");
        assert_eq!(sample.sent, 5);
        assert_eq!(sample.recv, 0);
        assert_eq!(sample.loss_percent, 100);
        assert_eq!(sample.timing, None);
    }

    #[test]
    fn test_decode_skips_empty_line() {
        assert_eq!(decode(""), None);
    }

    #[test]
    fn test_decode_skips_single_token() {
        // fping's -Q interval marker is a lone bracketed timestamp.
        assert_eq!(decode("[12:34:56]"), None);
    }

    #[test]
    fn test_decode_skips_line_missing_data_triple() {
        // Two tokens pass the length gate but there is no token[4].
        assert_eq!(decode("host1 :"), None);
    }

    #[test]
    fn test_decode_skips_malformed_loss_value() {
        assert_eq!(decode("host1 : xmt/rcv/%loss = 5/5/zero%,"), None);
    }

    #[test]
    fn test_decode_skips_wrong_arity_data_triple() {
        assert_eq!(decode("host1 : xmt/rcv/%loss = 5/5%,"), None);
        assert_eq!(decode("host1 : xmt/rcv/%loss = 5/5/0/9%,"), None);
    }

    #[test]
    fn test_decode_malformed_timing_degrades_to_absent() {
        // Seven tokens: timing announced but the triple itself is missing.
        let sample = decode("host1 : xmt/rcv/%loss = 5/5/0%, min/avg/max =").unwrap();
        assert_eq!(sample.timing, None);

        let sample =
            decode("host1 : xmt/rcv/%loss = 5/5/0%, min/avg/max = 1.01/bad/1.03").unwrap();
        assert_eq!(sample.timing, None);
    }

    #[test]
    fn test_decode_six_tokens_yields_timing_absent() {
        let sample = decode("host1 : xmt/rcv/%loss = 5/5/0%, extra").unwrap();
        assert_eq!(sample.loss_percent, 0);
        assert_eq!(sample.timing, None);
    }

    #[test]
    fn test_decode_loss_passed_through_unclamped() {
        let sample = decode("host1 : xmt/rcv/%loss = 5/5/150%,").unwrap();
        assert_eq!(sample.loss_percent, 150);
    }

    #[test]
    fn test_decode_is_idempotent() {
        assert_eq!(decode(FULL_LINE), decode(FULL_LINE));
        assert_eq!(decode(LOSS_ONLY_LINE), decode(LOSS_ONLY_LINE));
    }

    #[test]
    fn test_decode_timing_never_partial() {
        for line in [
            "host1 : xmt/rcv/%loss = 5/5/0%, min/avg/max = 1.01/1.02",
            "host1 : xmt/rcv/%loss = 5/5/0%, min/avg/max = 1.01/1.02/1.03/1.04",
        ] {
            let sample = decode(line).unwrap();
            assert_eq!(sample.timing, None, "line: {line}");
        }
    }
}
