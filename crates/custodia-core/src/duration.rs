//! Human-readable duration parsing.
//!
//! Consent types declare auto-revoke windows as free text ("30 days",
//! "2h32m", "1:24"). Malformed input is not an error anywhere in the
//! system, so the parser returns `Option` and callers fall back explicitly.

/// Parse a human-readable duration into whole seconds.
///
/// Accepted forms:
/// - unit words: "30 days", "6 hours", "90 seconds", "1.5 minutes"
/// - compound: "2h32m", "3d 2h 32m", "1 day and 6 hours"
/// - clock: "1:24" (mm:ss), "2:04:13" (hh:mm:ss)
/// - a bare number is taken as seconds
///
/// Returns `None` for anything it cannot fully consume.
pub fn parse_duration(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.contains(':') {
        return parse_clock(text);
    }

    let lexemes = lex(&text.to_lowercase())?;
    let mut total = 0.0_f64;
    let mut iter = lexemes.iter().peekable();

    while let Some(lexeme) = iter.next() {
        let value = match lexeme {
            Lexeme::Number(n) => *n,
            Lexeme::Word(_) => return None,
        };
        let factor = match iter.peek() {
            Some(Lexeme::Word(unit)) => Some(unit_seconds(unit)?),
            Some(Lexeme::Number(_)) => return None,
            // A trailing bare number counts as seconds.
            None => None,
        };
        match factor {
            Some(factor) => {
                total += value * factor;
                iter.next();
            }
            None => total += value,
        }
    }

    if !total.is_finite() || total > i64::MAX as f64 / 2.0 {
        return None;
    }
    Some(total.round() as i64)
}

#[derive(Debug, PartialEq)]
enum Lexeme {
    Number(f64),
    Word(String),
}

fn lex(text: &str) -> Option<Vec<Lexeme>> {
    let mut lexemes = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() || ch == ',' {
            chars.next();
        } else if ch.is_ascii_digit() || ch == '.' {
            let mut buf = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() || c == '.' {
                    buf.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            lexemes.push(Lexeme::Number(buf.parse().ok()?));
        } else if ch.is_ascii_alphabetic() {
            let mut buf = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphabetic() {
                    buf.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            // Connective words carry no value.
            if buf != "and" {
                lexemes.push(Lexeme::Word(buf));
            }
        } else {
            return None;
        }
    }

    if lexemes.is_empty() {
        None
    } else {
        Some(lexemes)
    }
}

fn unit_seconds(unit: &str) -> Option<f64> {
    let seconds = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600.0,
        "d" | "day" | "days" => 86_400.0,
        "w" | "wk" | "wks" | "week" | "weeks" => 604_800.0,
        _ => return None,
    };
    Some(seconds)
}

fn parse_clock(text: &str) -> Option<i64> {
    let parts: Vec<&str> = text.split(':').collect();
    let values: Vec<f64> = parts
        .iter()
        .map(|p| {
            let p = p.trim();
            if p.is_empty() || !p.chars().all(|c| c.is_ascii_digit() || c == '.') {
                None
            } else {
                p.parse().ok()
            }
        })
        .collect::<Option<Vec<f64>>>()?;

    let total = match values.as_slice() {
        [m, s] => m * 60.0 + s,
        [h, m, s] => h * 3600.0 + m * 60.0 + s,
        _ => return None,
    };
    Some(total.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_words() {
        assert_eq!(parse_duration("30 days"), Some(2_592_000));
        assert_eq!(parse_duration("6 hours"), Some(21_600));
        assert_eq!(parse_duration("90 seconds"), Some(90));
        assert_eq!(parse_duration("2 weeks"), Some(1_209_600));
    }

    #[test]
    fn test_compound() {
        assert_eq!(parse_duration("2h32m"), Some(9_120));
        assert_eq!(parse_duration("3d 2h 32m"), Some(268_320));
        assert_eq!(parse_duration("1 day and 6 hours"), Some(108_000));
    }

    #[test]
    fn test_fractional() {
        assert_eq!(parse_duration("1.5 minutes"), Some(90));
        assert_eq!(parse_duration("0.5h"), Some(1_800));
    }

    #[test]
    fn test_clock_forms() {
        assert_eq!(parse_duration("1:24"), Some(84));
        assert_eq!(parse_duration("2:04:13"), Some(7_453));
    }

    #[test]
    fn test_bare_number_is_seconds() {
        assert_eq!(parse_duration("15"), Some(15));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("not-a-duration"), None);
        assert_eq!(parse_duration("30 fortnights"), None);
        assert_eq!(parse_duration("-30 days"), None);
        assert_eq!(parse_duration("days 30"), None);
        assert_eq!(parse_duration("1:2:3:4"), None);
    }
}
