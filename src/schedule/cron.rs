// Cron field parsing: classifies each field into the few shapes the
// formatter can describe and leaves everything else to croner.

use std::str::FromStr;

use croner::Cron;

use crate::errors::RunAfterError;

/// Shape of a single cron field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `*`, `?` or `*/1`.
    Any,
    Value(u32),
    /// `*/N` with N > 1.
    Step(u32),
    /// Lists, ranges, names and other syntax the formatter does not describe.
    Complex,
}

struct Bounds {
    name: &'static str,
    min: u32,
    max: u32,
}

const SECONDS: Bounds = Bounds {
    name: "seconds",
    min: 0,
    max: 59,
};
const MINUTE: Bounds = Bounds {
    name: "minute",
    min: 0,
    max: 59,
};
const HOUR: Bounds = Bounds {
    name: "hour",
    min: 0,
    max: 23,
};
const DAY_OF_MONTH: Bounds = Bounds {
    name: "day-of-month",
    min: 1,
    max: 31,
};
const MONTH: Bounds = Bounds {
    name: "month",
    min: 1,
    max: 12,
};
// 7 is accepted as an alias for Sunday.
const DAY_OF_WEEK: Bounds = Bounds {
    name: "day-of-week",
    min: 0,
    max: 7,
};

/// A parsed five- or six-field cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronFields {
    pub seconds: Option<Field>,
    pub minute: Field,
    pub hour: Field,
    pub day_of_month: Field,
    pub month: Field,
    pub day_of_week: Field,
    expression: String,
}

impl CronFields {
    /// Parse an expression. Whitespace and letter case are not significant;
    /// `@daily`-style macros are expanded first.
    pub fn parse(expr: &str) -> Result<Self, RunAfterError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(RunAfterError::Cron("Cron expression is empty".to_string()));
        }

        let expanded = if trimmed.starts_with('@') {
            expand_macro(trimmed)?
        } else {
            trimmed
        };

        let tokens: Vec<String> = expanded
            .split_whitespace()
            .map(|t| t.to_ascii_uppercase())
            .collect();

        let (seconds, rest) = match tokens.len() {
            5 => (None, &tokens[..]),
            6 => (Some(parse_seconds(&tokens[0])?), &tokens[1..]),
            n => {
                return Err(RunAfterError::Cron(format!(
                    "Invalid cron expression '{}': expected 5 or 6 fields, found {}",
                    trimmed, n
                )))
            }
        };

        let fields = [
            parse_field(&rest[0], &MINUTE)?,
            parse_field(&rest[1], &HOUR)?,
            parse_field(&rest[2], &DAY_OF_MONTH)?,
            parse_field(&rest[3], &MONTH)?,
            parse_field(&rest[4], &DAY_OF_WEEK)?,
        ];

        let expression = fields
            .iter()
            .zip(rest)
            .map(|(field, token)| match field {
                Field::Value(v) => v.to_string(),
                _ if token == "?" => "*".to_string(),
                _ => token.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ");

        if fields.contains(&Field::Complex) {
            Cron::from_str(&expression).map_err(|e| {
                RunAfterError::Cron(format!("Invalid cron expression '{}': {}", trimmed, e))
            })?;
        }

        let [minute, hour, day_of_month, month, day_of_week] = fields;
        Ok(Self {
            seconds,
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
            expression,
        })
    }

    /// Normalized five-field form (seconds dropped), suitable for croner.
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

fn expand_macro(token: &str) -> Result<&'static str, RunAfterError> {
    match token.to_ascii_lowercase().as_str() {
        "@yearly" | "@annually" => Ok("0 0 1 1 *"),
        "@monthly" => Ok("0 0 1 * *"),
        "@weekly" => Ok("0 0 * * 0"),
        "@daily" | "@midnight" => Ok("0 0 * * *"),
        "@hourly" => Ok("0 * * * *"),
        _ => Err(RunAfterError::Cron(format!("Unknown cron macro '{}'", token))),
    }
}

fn parse_field(token: &str, bounds: &Bounds) -> Result<Field, RunAfterError> {
    if !token.is_ascii() {
        return Err(RunAfterError::Cron(format!(
            "Invalid {} field '{}'",
            bounds.name, token
        )));
    }

    if token == "*" || token == "?" {
        return Ok(Field::Any);
    }

    if let Some(step) = token.strip_prefix("*/") {
        let n = parse_step(step, bounds)?;
        return Ok(if n == 1 { Field::Any } else { Field::Step(n) });
    }

    if is_number(token) {
        let value = parse_value(token, bounds)?;
        // Sunday is 0 in every output.
        let value = if bounds.name == DAY_OF_WEEK.name && value == 7 {
            0
        } else {
            value
        };
        return Ok(Field::Value(value));
    }

    check_list(token, bounds)?;
    Ok(Field::Complex)
}

/// Shape check for lists, ranges and steps. Every list element, range end
/// and step must be present; numbers are checked against the field bounds.
/// Names and croner's `L`/`W`/`#` forms are left for croner to judge.
fn check_list(token: &str, bounds: &Bounds) -> Result<(), RunAfterError> {
    let invalid = || RunAfterError::Cron(format!("Invalid {} field '{}'", bounds.name, token));

    for part in token.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (part, None),
        };
        if let Some(step) = step {
            parse_step(step, bounds)?;
        }
        if range == "*" || range == "?" {
            continue;
        }

        let ends: Vec<&str> = range.split('-').collect();
        if ends.len() > 2 {
            return Err(invalid());
        }
        for end in &ends {
            if end.is_empty() || !end.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'#') {
                return Err(invalid());
            }
            if is_number(end) {
                parse_value(end, bounds)?;
            }
        }
        if let [lo, hi] = ends[..] {
            if is_number(lo) && is_number(hi) && parse_value(lo, bounds)? > parse_value(hi, bounds)? {
                return Err(RunAfterError::Cron(format!(
                    "Invalid {} range '{}'",
                    bounds.name, range
                )));
            }
        }
    }
    Ok(())
}

/// The seconds field never reaches croner, so only plain numbers are
/// allowed in its lists and ranges.
fn parse_seconds(token: &str) -> Result<Field, RunAfterError> {
    let field = parse_field(token, &SECONDS)?;
    if field == Field::Complex
        && !token
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b',' | b'-' | b'/' | b'*'))
    {
        return Err(RunAfterError::Cron(format!(
            "Invalid seconds field '{}'",
            token
        )));
    }
    Ok(field)
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_value(token: &str, bounds: &Bounds) -> Result<u32, RunAfterError> {
    let invalid = || RunAfterError::Cron(format!("Invalid {} value '{}'", bounds.name, token));
    if !is_number(token) {
        return Err(invalid());
    }
    let value: u32 = token.parse().map_err(|_| invalid())?;
    if value < bounds.min || value > bounds.max {
        return Err(RunAfterError::Cron(format!(
            "{} value {} is outside {}-{}",
            bounds.name, value, bounds.min, bounds.max
        )));
    }
    Ok(value)
}

fn parse_step(token: &str, bounds: &Bounds) -> Result<u32, RunAfterError> {
    let invalid = || RunAfterError::Cron(format!("Invalid {} step '{}'", bounds.name, token));
    if !is_number(token) {
        return Err(invalid());
    }
    let step: u32 = token.parse().map_err(|_| invalid())?;
    if step == 0 || step > bounds.max {
        return Err(RunAfterError::Cron(format!(
            "{} step {} is outside 1-{}",
            bounds.name, step, bounds.max
        )));
    }
    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_five_fields() {
        let fields = CronFields::parse("0 3 * * *").expect("parse");
        assert_eq!(fields.seconds, None);
        assert_eq!(fields.minute, Field::Value(0));
        assert_eq!(fields.hour, Field::Value(3));
        assert_eq!(fields.day_of_month, Field::Any);
        assert_eq!(fields.month, Field::Any);
        assert_eq!(fields.day_of_week, Field::Any);
        assert_eq!(fields.expression(), "0 3 * * *");
    }

    #[test]
    fn test_parse_six_fields_drops_seconds_from_expression() {
        let fields = CronFields::parse("15 0 3 * * *").expect("parse");
        assert_eq!(fields.seconds, Some(Field::Value(15)));
        assert_eq!(fields.expression(), "0 3 * * *");
    }

    #[test]
    fn test_parse_steps() {
        let fields = CronFields::parse("*/15 */1 * * *").expect("parse");
        assert_eq!(fields.minute, Field::Step(15));
        assert_eq!(fields.hour, Field::Any);
    }

    #[test]
    fn test_parse_sunday_alias() {
        let fields = CronFields::parse("0 9 * * 7").expect("parse");
        assert_eq!(fields.day_of_week, Field::Value(0));
        assert_eq!(fields.expression(), "0 9 * * 0");
    }

    #[test]
    fn test_parse_question_mark_is_any() {
        let fields = CronFields::parse("0 9 ? * 1").expect("parse");
        assert_eq!(fields.day_of_month, Field::Any);
        assert_eq!(fields.expression(), "0 9 * * 1");
    }

    #[test]
    fn test_parse_macros() {
        let fields = CronFields::parse("@DAILY").expect("parse");
        assert_eq!(fields.expression(), "0 0 * * *");
        assert!(CronFields::parse("@fortnightly").is_err());
    }

    #[test]
    fn test_parse_complex_fields() {
        let fields = CronFields::parse("0 9 * * mon-fri").expect("parse");
        assert_eq!(fields.day_of_week, Field::Complex);
        assert_eq!(fields.expression(), "0 9 * * MON-FRI");

        let fields = CronFields::parse("0,30 8-17 * * *").expect("parse");
        assert_eq!(fields.minute, Field::Complex);
        assert_eq!(fields.hour, Field::Complex);
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        for expr in ["not a cron", "* * * *", "0 0 3 * * * *"] {
            match CronFields::parse(expr).unwrap_err() {
                RunAfterError::Cron(msg) => assert!(msg.contains("fields"), "{}", msg),
                other => panic!("Expected Cron, got: {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        for expr in [
            "60 * * * *",
            "0 24 * * *",
            "0 3 0 * *",
            "0 3 32 * *",
            "0 3 * 13 *",
            "0 3 * * 8",
            "*/0 * * * *",
            "*/60 * * * *",
            "60 0 3 * * *",
            "99999999999 * * * *",
        ] {
            assert!(CronFields::parse(expr).is_err(), "{} should be rejected", expr);
        }
    }

    #[test]
    fn test_parse_seconds_lists() {
        let fields = CronFields::parse("0,30 * * * * *").expect("parse");
        assert_eq!(fields.seconds, Some(Field::Complex));
        assert!(CronFields::parse("10-70 * * * * *").is_err());
        assert!(CronFields::parse("40-10 * * * * *").is_err());
        assert!(CronFields::parse("x * * * * *").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_list_elements() {
        for expr in [
            ",,,, * * * *",
            "0, * * * *",
            "0 ,3 * * *",
            "0 1-,3 * * *",
            "0 -1 * * *",
            "0 1-2-3 * * *",
            "0 1/ * * *",
            "0 9 * * MON-",
        ] {
            assert!(CronFields::parse(expr).is_err(), "{} should be rejected", expr);
        }
    }

    #[test]
    fn test_parse_rejects_signed_numbers() {
        for expr in [
            "*/+5 * * * *",
            "+5 * * * *",
            "0 1-+3 * * *",
            "+5-+9 0 3 * * *",
            "+5 0 3 * * *",
        ] {
            assert!(CronFields::parse(expr).is_err(), "{} should be rejected", expr);
        }
    }

    #[test]
    fn test_parse_checks_list_bounds() {
        assert!(CronFields::parse("0 8-17 * * *").is_ok());
        assert!(CronFields::parse("0 9 * * 1-5").is_ok());
        assert!(CronFields::parse("0 8-25 * * *").is_err());
        assert!(CronFields::parse("0 17-8 * * *").is_err());
        assert!(CronFields::parse("0,15,99 * * * *").is_err());
        assert!(CronFields::parse("0 8-17/0 * * *").is_err());
    }

    #[test]
    fn test_parse_rejects_non_ascii() {
        assert!(CronFields::parse("０ ３ * * *").is_err());
        assert!(CronFields::parse("0 3 * * Mönday").is_err());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(CronFields::parse("").is_err());
        assert!(CronFields::parse("   \t ").is_err());
    }
}
