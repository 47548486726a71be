//! Cron month-field migration.
//!
//! v1 schedules used a 0-11 month convention, v2 uses the standard 1-12 one.
//! Only strictly numeric, single-value month fields are rewritten; wildcards,
//! lists, ranges and steps are left alone.

use regex::Regex;
use std::sync::LazyLock;

static CRON_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+\s+)(\S+\s+)(\S+\s+)(\S+\s+)(\S+\s*)(\S+\s*)?$")
        .expect("cron shape pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronArity {
    Five,
    Six,
}

impl CronArity {
    fn month_index(self) -> usize {
        match self {
            CronArity::Five => 3,
            CronArity::Six => 4,
        }
    }
}

/// A cron expression split into its trimmed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCron {
    fields: Vec<String>,
}

impl ParsedCron {
    pub fn arity(&self) -> CronArity {
        if self.fields.len() == 6 {
            CronArity::Six
        } else {
            CronArity::Five
        }
    }

    pub fn month_field(&self) -> &str {
        &self.fields[self.arity().month_index()]
    }

    /// The month field when it is a plain base-10 integer, without leading zeros.
    pub fn legacy_month(&self) -> Option<&str> {
        let month = self.month_field();
        if month.is_empty() || !month.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = month.trim_start_matches('0');
        Some(if trimmed.is_empty() { "0" } else { trimmed })
    }

    /// Rebuilds the expression with the month shifted to the 1-based convention.
    pub fn rewrite(&self) -> Option<String> {
        let shifted = increment_decimal(self.legacy_month()?);
        let idx = self.arity().month_index();
        let fields: Vec<&str> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| if i == idx { shifted.as_str() } else { f.as_str() })
            .collect();
        Some(fields.join(" "))
    }
}

/// Adds one to a string of ASCII digits. Works for any length.
fn increment_decimal(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    for b in out.iter_mut().rev() {
        if *b == b'9' {
            *b = b'0';
        } else {
            *b += 1;
            return String::from_utf8_lossy(&out).into_owned();
        }
    }
    out.insert(0, b'1');
    String::from_utf8_lossy(&out).into_owned()
}

/// Splits `expr` into 5 or 6 fields. `None` means the expression has a bad format.
pub fn classify(expr: &str) -> Option<ParsedCron> {
    let caps = CRON_SHAPE.captures(expr)?;
    let fields = caps
        .iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str().trim().to_string())
        .collect();
    Some(ParsedCron { fields })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronFinding {
    /// Not a 5 or 6 field expression. Needs a manual fix.
    BadFormat,
    /// Uses the 0-based month convention; `new_cron` is the corrected expression.
    BadMonth { new_cron: String },
    Ok,
}

pub fn inspect(expr: &str) -> CronFinding {
    match classify(expr) {
        None => CronFinding::BadFormat,
        Some(parsed) => match parsed.rewrite() {
            Some(new_cron) => CronFinding::BadMonth { new_cron },
            None => CronFinding::Ok,
        },
    }
}
