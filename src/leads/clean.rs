//! Field cleaning and validation for candidate leads

use super::types::Lead;
use regex::Regex;
use std::sync::LazyLock;

static HONORIFIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(mr|mrs|ms|miss|mx|dr|prof|sir|madam|rev)\.?\s+")
        .expect("hardcoded regex pattern is valid")
});

static CORPORATE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[,\s]+(llc|l\.l\.c\.?|inc\.?|incorporated|ltd\.?|limited|corp\.?|corporation|co\.|gmbh|plc|llp|pty\.?\s+ltd\.?)$",
    )
    .expect("hardcoded regex pattern is valid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("hardcoded regex pattern is valid")
});

/// Why a cleaned candidate was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingName,
    NoContactChannel,
}

/// Normalizes lead fields
#[derive(Debug, Clone)]
pub struct LeadCleaner {
    min_phone_digits: usize,
}

impl Default for LeadCleaner {
    fn default() -> Self {
        Self::new(7)
    }
}

impl LeadCleaner {
    pub fn new(min_phone_digits: usize) -> Self {
        Self { min_phone_digits }
    }

    /// Cleans every field of `lead`
    ///
    /// Blank optional fields become `None`; an email that does not look like
    /// an address and a phone number with too few digits are dropped rather
    /// than kept malformed.
    pub fn clean(&self, lead: Lead) -> Lead {
        Lead {
            name: clean_name(&lead.name),
            title: clean_text(lead.title),
            company: clean_text(lead.company).map(|c| strip_corporate_suffix(&c)),
            email: lead.email.and_then(|e| clean_email(&e)),
            phone: lead.phone.and_then(|p| self.clean_phone(&p)),
            address: clean_text(lead.address),
            rating: lead.rating.filter(|r| r.is_finite() && *r >= 0.0),
            review_count: lead.review_count,
            category: clean_text(lead.category),
            website: clean_text(lead.website),
            hours: clean_text(lead.hours),
            source_url: lead.source_url.trim().to_string(),
        }
    }

    /// Checks a cleaned lead: it needs a name and an email or phone
    pub fn validate(&self, lead: &Lead) -> Result<(), Rejection> {
        if lead.name.is_empty() {
            return Err(Rejection::MissingName);
        }
        if lead.email.is_none() && lead.phone.is_none() {
            return Err(Rejection::NoContactChannel);
        }
        Ok(())
    }

    fn clean_phone(&self, raw: &str) -> Option<String> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        Some(digits).filter(|d| d.len() >= self.min_phone_digits)
    }
}

/// Trims, collapses whitespace and strips leading honorifics
pub fn clean_name(raw: &str) -> String {
    let mut name = collapse(raw);
    loop {
        let stripped = HONORIFIC.replace(&name, "").to_string();
        if stripped == name {
            return name;
        }
        name = stripped;
    }
}

/// Removes trailing corporate designators such as `, LLC` or `Inc.`
pub fn strip_corporate_suffix(raw: &str) -> String {
    let mut company = collapse(raw);
    loop {
        let stripped = CORPORATE_SUFFIX.replace(&company, "");
        let stripped = stripped.trim_end_matches([',', ' ']).to_string();
        if stripped == company || stripped.is_empty() {
            return company;
        }
        company = stripped;
    }
}

/// Lowercases an email and checks its shape
pub fn clean_email(raw: &str) -> Option<String> {
    let email = raw.trim().trim_start_matches("mailto:").trim().to_lowercase();
    Some(email).filter(|e| EMAIL.is_match(e))
}

fn clean_text(value: Option<String>) -> Option<String> {
    value.map(|v| collapse(&v)).filter(|v| !v.is_empty())
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
