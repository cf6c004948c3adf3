//! Human-readable duration formatting
//!
//! Two flavours are provided: a fixed compact style (`"1h 1m 5s"`) used in
//! logs and usage summaries, and a small template language used for the
//! status line.

use std::time::Duration;

/// Format a duration into a compact human-readable string
///
/// Zero-valued units are omitted; a zero duration renders as `"0s"`.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "runtime")]
/// # {
/// use std::time::Duration;
///
/// use tickbridge_common::time::format::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(5)), "5s");
/// assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
/// assert_eq!(format_duration(Duration::from_secs(3600)), "1h");
/// assert_eq!(format_duration(Duration::from_secs(3665)), "1h 1m 5s");
/// # }
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();

    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, suffix)| format!("{value}{suffix}"))
        .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Unit {
    Second,
    Minute,
    Hour,
}

impl Unit {
    const fn from_char(c: char) -> Option<Self> {
        match c {
            'h' | 'H' => Some(Self::Hour),
            'm' => Some(Self::Minute),
            's' => Some(Self::Second),
            _ => None,
        }
    }

    const fn seconds(self) -> u64 {
        match self {
            Self::Hour => 3600,
            Self::Minute => 60,
            Self::Second => 1,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Literal(String),
    Unit { unit: Unit, width: usize },
}

fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '[' {
            // Bracketed text is copied verbatim; an unclosed bracket runs to the end.
            for inner in chars.by_ref() {
                if inner == ']' {
                    break;
                }
                literal.push(inner);
            }
            continue;
        }

        if let Some(unit) = Unit::from_char(c) {
            let mut width = 1;
            while chars.peek() == Some(&c) {
                chars.next();
                width += 1;
            }
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::Unit { unit, width });
            continue;
        }

        literal.push(c);
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// Format a duration with a template such as `"hh:mm:ss"` or `"m [minute]"`
///
/// Recognised tokens are `h`, `m` and `s`; repeating a token sets the minimum
/// zero-padded width. Text inside `[...]` is emitted verbatim, as is any
/// other character. The largest unit present absorbs everything above it, so
/// `"m"` for 2 hours renders `120`.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "runtime")]
/// # {
/// use std::time::Duration;
///
/// use tickbridge_common::time::format::format_duration_template;
///
/// assert_eq!(format_duration_template(Duration::from_secs(3725), "hh:mm:ss"), "01:02:05");
/// assert_eq!(format_duration_template(Duration::from_secs(3725), "m [minute]"), "62 minute");
/// # }
/// ```
pub fn format_duration_template(duration: Duration, template: &str) -> String {
    let tokens = tokenize(template);
    let total = duration.as_secs();
    let largest = tokens
        .iter()
        .filter_map(|token| match token {
            Token::Unit { unit, .. } => Some(*unit),
            Token::Literal(_) => None,
        })
        .max();

    tokens
        .iter()
        .map(|token| match token {
            Token::Literal(text) => text.clone(),
            Token::Unit { unit, width } => {
                let value = if Some(*unit) == largest {
                    total / unit.seconds()
                } else {
                    let above = match unit {
                        Unit::Hour => u64::MAX,
                        Unit::Minute => Unit::Hour.seconds(),
                        Unit::Second => Unit::Minute.seconds(),
                    };
                    (total % above) / unit.seconds()
                };
                format!("{value:0width$}")
            }
        })
        .collect()
}
