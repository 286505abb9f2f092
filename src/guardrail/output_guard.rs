//! Rule-based output guards
//!
//! Deterministic checks run before any message reaches the customer: a set
//! of named forbidden-content regexes, then a banned-term membership test.
//! Failure feedback describes the violation without repeating the matched
//! text, so the forbidden content can never leak through the feedback
//! itself.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

pub const VALIDATION_FAILED_MESSAGE: &str =
    "Message validation failed due to unwanted content.";

lazy_static! {
    /// Named forbidden-content rules, matched case-insensitively.
    static ref FORBIDDEN_RULES: Vec<(&'static str, Regex)> = vec![
        (
            "REMOVE_GATEWAY_LINKS",
            Regex::new(r"(?i)https?://\S*/gw/api/cbot(/\S*)?").expect("valid gateway rule"),
        ),
        (
            "REMOVE_INTERNAL_API_PATHS",
            Regex::new(r"(?i)\b(?:botapi|api)/(?:cbot|one)/[a-z0-9_]+").expect("valid path rule"),
        ),
    ];
}

/// Disallowed substrings, canonical lower case. The guard lower-cases the
/// message before testing, which covers every casing variant; spacing
/// variants of the internal agent names are listed explicitly.
pub const BANNED_TERMS: &[&str] = &[
    // Internal API parameter names
    "from_date",
    "to_date",
    "return_type",
    "statementtype",
    "documenttype",
    "exchange_seg",
    "year_type",
    "userid",
    "userrole",
    "clientid",
    "clientcode",
    "encclientcode",
    "encsessionno",
    "fromdate",
    "todate",
    "startdate",
    "enddate",
    "dpid",
    "portfoliono",
    "refno",
    "packetno",
    "ordertype",
    "linktype",
    "panornumber",
    "bacode",
    "mobileno",
    // Internal agent identities, spaced and unspaced
    "reportsagent",
    "reports agent",
    "accountagent",
    "account agent",
    "fundsagent",
    "funds agent",
    "tradingagent",
    "trading agent",
    "informationagent",
    "information agent",
    "depositoryagent",
    "depository agent",
    "dpagent",
    "dp agent",
    "supervisor agent",
];

/// Verdict of a rule-based guard check. `reason` is corrective feedback for
/// the owning agent, never shown to the end user and never echoing the
/// matched content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Pass,
    Fail { reason: String },
}

impl GuardVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, GuardVerdict::Pass)
    }
}

pub struct OutputGuard;

impl OutputGuard {
    /// Check a message against the named forbidden-content regexes.
    pub fn check_patterns(message: &str) -> GuardVerdict {
        for (rule_name, pattern) in FORBIDDEN_RULES.iter() {
            if pattern.is_match(message) {
                warn!(rule = rule_name, "Forbidden pattern detected in outbound message");
                return GuardVerdict::Fail {
                    reason: format!(
                        "{} Rule violated: {}. Remove the offending content and rephrase.",
                        VALIDATION_FAILED_MESSAGE, rule_name
                    ),
                };
            }
        }

        GuardVerdict::Pass
    }

    /// Check a message against the banned-term list, case-insensitively.
    pub fn check_banned_terms(message: &str) -> GuardVerdict {
        let lowered = message.to_lowercase();
        let hits = BANNED_TERMS
            .iter()
            .filter(|term| lowered.contains(*term))
            .count();

        if hits > 0 {
            warn!(count = hits, "Banned terms detected in outbound message");
            return GuardVerdict::Fail {
                reason: format!(
                    "{} {} disallowed internal term(s) detected. \
                     Rephrase without internal parameter names, endpoint paths, or system identifiers.",
                    VALIDATION_FAILED_MESSAGE, hits
                ),
            };
        }

        GuardVerdict::Pass
    }

    /// Run both rule-based checks in order, short-circuiting on failure.
    pub fn check(message: &str) -> GuardVerdict {
        let verdict = Self::check_patterns(message);
        if !verdict.passed() {
            return verdict;
        }

        let verdict = Self::check_banned_terms(message);
        if verdict.passed() {
            info!("Rule-based output guards passed");
        }
        verdict
    }
}
