//! Offline lead extraction
//!
//! Used when no classifier endpoint is configured and whenever the
//! classifier circuit is open. Leads are built from the email addresses in
//! the page text; names come from the mailbox or, for role mailboxes such as
//! `info@`, from the domain.

use super::classifier::{ContentClassifier, ClassifierError};
use super::types::Lead;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("hardcoded regex pattern is valid")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.-]?)?\(?\d{2,4}\)?[\s.-]?\d{3,4}[\s.-]?\d{3,4}\b")
        .expect("hardcoded regex pattern is valid")
});

/// Mailboxes that name a function, not a person
const ROLE_MAILBOXES: &[&str] = &[
    "info", "contact", "hello", "sales", "office", "admin", "support", "enquiries",
    "inquiries", "team", "mail", "booking", "bookings", "reception", "service", "help",
];

/// Addresses that are never leads
const IGNORED_MAILBOXES: &[&str] = &["noreply", "no-reply", "donotreply", "postmaster", "webmaster"];

const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];

/// Pulls leads out of page text with regular expressions
#[derive(Debug, Clone, Default)]
pub struct RegexLeadExtractor;

impl RegexLeadExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts one lead per distinct email address
    ///
    /// The first phone number on the page is attached to the first lead.
    pub fn extract(&self, text: &str) -> Vec<Lead> {
        let mut seen = HashSet::new();
        let mut leads: Vec<Lead> = EMAIL
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|email| is_contact_email(email) && seen.insert(email.clone()))
            .filter_map(|email| lead_from_email(&email))
            .collect();

        if let Some(first) = leads.first_mut() {
            first.phone = PHONE
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .find(|p| p.chars().filter(char::is_ascii_digit).count() >= 7);
        }

        leads
    }
}

fn is_contact_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !IGNORED_MAILBOXES.contains(&local)
        && !IMAGE_SUFFIXES.iter().any(|s| domain.ends_with(s))
        && !domain.starts_with("example.")
}

fn lead_from_email(email: &str) -> Option<Lead> {
    let (local, domain) = email.split_once('@')?;
    let company = domain_to_company_name(domain);

    let name = if ROLE_MAILBOXES.contains(&local) {
        company.clone()?
    } else {
        mailbox_to_name(local)?
    };

    Some(Lead {
        name,
        company,
        email: Some(email.to_string()),
        ..Default::default()
    })
}

/// `jane.doe` -> `Jane Doe`
fn mailbox_to_name(local: &str) -> Option<String> {
    let parts: Vec<String> = local
        .split(['.', '_', '-', '+'])
        .filter(|p| !p.is_empty() && p.chars().all(char::is_alphabetic))
        .map(capitalize)
        .collect();

    Some(parts.join(" ")).filter(|n| !n.is_empty())
}

/// `acme-roofing.co.uk` -> `Acme Roofing`
fn domain_to_company_name(domain: &str) -> Option<String> {
    let label = domain
        .trim_start_matches("www.")
        .split('.')
        .next()
        .filter(|l| !l.is_empty())?;

    let name = label
        .split(['-', '_'])
        .filter(|p| !p.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    Some(name).filter(|n| !n.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Classifier that never leaves the process
///
/// Lead extraction uses [`RegexLeadExtractor`]; relevance is scored by how
/// many keyword terms appear in the URL, title and snippet.
#[derive(Debug, Clone, Default)]
pub struct OfflineClassifier {
    extractor: RegexLeadExtractor,
}

impl OfflineClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentClassifier for OfflineClassifier {
    async fn classify_leads(&self, text: &str, _keyword: &str) -> Result<Vec<Lead>, ClassifierError> {
        Ok(self.extractor.extract(text))
    }

    async fn score_url_relevance(
        &self,
        url: &str,
        title: &str,
        snippet: &str,
        keyword: &str,
    ) -> Result<u8, ClassifierError> {
        Ok(keyword_score(url, title, snippet, keyword))
    }
}

/// 5 with no keyword; otherwise 1 plus 3 per matching term, capped at 10
fn keyword_score(url: &str, title: &str, snippet: &str, keyword: &str) -> u8 {
    let terms: Vec<String> = keyword
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .map(str::to_lowercase)
        .collect();
    if terms.is_empty() {
        return 5;
    }

    let haystack = format!("{} {} {}", url, title, snippet).to_lowercase();
    let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
    (1 + hits * 3).min(10) as u8
}
