use std::fmt;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::ValidicConfig;

/// Organization and access token for one request, after defaulting.
///
/// The per-call value wins over the configured one. Nothing is rejected
/// locally: an organization nobody supplied becomes an empty path segment and
/// a missing token is simply not sent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub organization_id: String,
    pub access_token: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn resolve(
        config: &ValidicConfig,
        organization_id: Option<&str>,
        access_token: Option<&str>,
    ) -> Self {
        let organization_id = organization_id
            .or(config.organization_id.as_deref())
            .unwrap_or_default()
            .to_owned();
        let access_token = access_token
            .map(str::to_owned)
            .or_else(|| {
                config
                    .access_token
                    .as_ref()
                    .map(|token| token.expose_secret().to_owned())
            });
        Self {
            organization_id,
            access_token,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("organization_id", &self.organization_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Account status filter for [`UserResource::list_users`](crate::UserResource::list_users).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters for listing an organization's users. Unset fields are not sent.
///
/// `status: None` lists every user regardless of status. Dates are passed
/// through as given (the API expects ISO 8601).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub status: Option<UserStatus>,
    /// Overrides the configured organization in the path; never sent as a parameter.
    pub organization_id: Option<String>,
    pub access_token: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl UserQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn organization_id(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    #[must_use]
    pub fn access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    #[must_use]
    pub fn start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: impl Into<String>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl fmt::Debug for UserQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserQuery")
            .field("status", &self.status)
            .field("organization_id", &self.organization_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .finish()
    }
}

/// Descriptive user attributes. Nothing is validated locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Caller-side identifier of the user
    pub uid: Option<String>,
    pub height: Option<i64>,
    pub weight: Option<String>,
    pub location: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<String>,
    pub country: Option<String>,
}

/// Per-call options for the user operations: credential overrides plus the
/// profile fields the operation sends.
///
/// Operations that only need credentials ignore the profile.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserOptions {
    pub organization_id: Option<String>,
    pub access_token: Option<String>,
    pub profile: UserProfile,
}

impl UserOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn organization_id(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    #[must_use]
    pub fn access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    #[must_use]
    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.profile.uid = Some(uid.into());
        self
    }

    #[must_use]
    pub fn height(mut self, height: i64) -> Self {
        self.profile.height = Some(height);
        self
    }

    #[must_use]
    pub fn weight(mut self, weight: impl Into<String>) -> Self {
        self.profile.weight = Some(weight.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.profile.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.profile.gender = Some(gender.into());
        self
    }

    #[must_use]
    pub fn birth_year(mut self, birth_year: impl Into<String>) -> Self {
        self.profile.birth_year = Some(birth_year.into());
        self
    }

    #[must_use]
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.profile.country = Some(country.into());
        self
    }

    #[must_use]
    pub fn profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }
}

impl fmt::Debug for UserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserOptions")
            .field("organization_id", &self.organization_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("profile", &self.profile)
            .finish()
    }
}
