use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A contact as handed over by the record store.
///
/// Records are values: a mutation produces a new `Record` that replaces the
/// old one, nothing edits a record in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Record {
    pub id: String,
    pub display_name: String,
    pub organization: Option<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub has_image: bool,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
}

impl Record {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            organization: None,
            phones: Vec::new(),
            emails: Vec::new(),
            has_image: false,
            created_at: None,
            modified_at: None,
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phones.push(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.emails.push(email.into());
        self
    }

    pub fn with_image(mut self) -> Self {
        self.has_image = true;
        self
    }

    /// Organization, treating a blank string the same as no organization.
    pub fn organization(&self) -> Option<&str> {
        self.organization
            .as_deref()
            .map(str::trim)
            .filter(|org| !org.is_empty())
    }

    /// Number of populated fields used to pick the primary record of a merge.
    pub fn completeness(&self) -> usize {
        self.phones.len() + self.emails.len() + usize::from(self.organization().is_some())
    }
}

/// Structured name as exchanged with the record store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NameComponents {
    pub given_name: String,
    pub family_name: String,
}

impl NameComponents {
    pub fn new(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        Self {
            given_name: given_name.into(),
            family_name: family_name.into(),
        }
    }

    /// Splits free text at the last whitespace run: "Mary Ann Smith" becomes
    /// given "Mary Ann", family "Smith". A single word is a given name.
    pub fn parse(full_name: &str) -> Self {
        let trimmed = full_name.trim();
        match trimmed.rsplit_once(char::is_whitespace) {
            Some((given, family)) => Self::new(given.trim_end(), family),
            None => Self::new(trimmed, ""),
        }
    }

    pub fn display_name(&self) -> String {
        match (self.given_name.is_empty(), self.family_name.is_empty()) {
            (false, false) => format!("{} {}", self.given_name, self.family_name),
            (false, true) => self.given_name.clone(),
            (true, false) => self.family_name.clone(),
            (true, true) => String::new(),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RecordsResponse {
    pub records: Vec<Record>,
}
