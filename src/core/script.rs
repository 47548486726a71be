//! Static checks for stored scripts.
//!
//! This is plain pattern matching on the source text, not parsing. Checks run in
//! order and stop at the first decisive one:
//! no hook definition, then hook arity, then deprecated `reporter.render` usage.

use regex::Regex;
use std::sync::LazyLock;

static HOOK_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*(?:beforeRender|afterRender)\s*\(([^)]*)\)").expect("hook pattern is valid")
});

static DEPRECATED_RENDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:req|request)\.reporter\.render").expect("render pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFinding {
    /// No `beforeRender`/`afterRender` hook found.
    Invalid,
    /// Hook found with fewer than two parameters.
    BadArgs,
    /// Calls `req.reporter.render` or `request.reporter.render`.
    UsingDeprecatedRender,
    Ok,
}

pub fn classify(source: &str) -> ScriptFinding {
    let Some(caps) = HOOK_DEFINITION.captures(source) else {
        return ScriptFinding::Invalid;
    };

    let params = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    if params.trim().is_empty() || params.split(',').count() < 2 {
        return ScriptFinding::BadArgs;
    }

    if DEPRECATED_RENDER.is_match(source) {
        return ScriptFinding::UsingDeprecatedRender;
    }

    ScriptFinding::Ok
}
