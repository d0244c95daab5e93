use anyhow::{Result, anyhow};
use std::collections::BTreeSet;

use super::utils::{normalize_email, valid_email};

/// The set of email addresses allowed to request admin magic links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminAllowList {
    emails: BTreeSet<String>,
}

impl AdminAllowList {
    /// Build the allow-list from raw addresses. Entries are normalized and deduplicated.
    ///
    /// # Errors
    /// Returns an error if the list is empty or an entry is not an email address.
    pub fn new<I, S>(emails: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for raw in emails {
            let email = normalize_email(raw.as_ref());
            if email.is_empty() {
                continue;
            }
            if !valid_email(&email) {
                return Err(anyhow!("Invalid admin email: {email}"));
            }
            set.insert(email);
        }

        let list = Self { emails: set };
        if list.is_empty() {
            return Err(anyhow!("At least one admin email is required"));
        }

        Ok(list)
    }

    /// Parse a comma separated list, as given on the command line.
    ///
    /// # Errors
    /// Same as [`AdminAllowList::new`].
    pub fn parse(csv: &str) -> Result<Self> {
        Self::new(csv.split(','))
    }

    /// Membership check on the normalized form of `email`.
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&normalize_email(email))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}
