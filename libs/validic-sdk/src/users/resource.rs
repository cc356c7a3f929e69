use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::config::ValidicConfig;
use crate::error::ValidicError;
use crate::transport::{Params, Transport};

use super::models::{Credentials, UserOptions, UserQuery};

/// Operations on an organization's users.
///
/// Each method sends exactly one request and returns the parsed response
/// unchanged; `Ok(None)` means the API answered without a value. Field values
/// are not validated locally, so remote rejections surface as
/// [`ValidicError::Http`]. Organization and user ids are percent-encoded into
/// a single path segment; an id of `.` or `..` is refused with
/// [`ValidicError::InvalidUrl`] before anything is sent.
///
/// ```ignore
/// let users = validic.users();
/// let created = users
///     .provision_user("patient-17", &UserOptions::new().height(180).gender("F"))
///     .await?;
/// ```
#[derive(Clone)]
pub struct UserResource {
    transport: Arc<dyn Transport>,
    config: Arc<ValidicConfig>,
}

impl UserResource {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: Arc<ValidicConfig>) -> Self {
        Self { transport, config }
    }

    /// List the organization's users.
    ///
    /// Sends only the filters that are set, plus the resolved access token.
    ///
    /// # Errors
    /// Returns the transport error unchanged
    pub async fn list_users(&self, query: &UserQuery) -> Result<Option<Value>, ValidicError> {
        let creds = self.credentials(
            query.organization_id.as_deref(),
            query.access_token.as_deref(),
        );

        let mut params = Params::new();
        if let Some(status) = query.status {
            params.insert("status".into(), status.as_str().into());
        }
        if let Some(token) = creds.access_token {
            params.insert("access_token".into(), token.into());
        }
        if let Some(start_date) = &query.start_date {
            params.insert("start_date".into(), start_date.as_str().into());
        }
        if let Some(end_date) = &query.end_date {
            params.insert("end_date".into(), end_date.as_str().into());
        }
        if let Some(offset) = query.offset {
            params.insert("offset".into(), offset.into());
        }
        if let Some(limit) = query.limit {
            params.insert("limit".into(), limit.into());
        }

        self.transport
            .get(&self.users_path(&creds.organization_id)?, &params)
            .await
    }

    /// Look up the user behind a user authentication token.
    ///
    /// The configured organization and access token are not involved.
    ///
    /// # Errors
    /// Returns the transport error unchanged
    pub async fn me(&self, authentication_token: &str) -> Result<Option<Value>, ValidicError> {
        let params = object(json!({ "authentication_token": authentication_token }));
        self.transport
            .get(&format!("/{}/me.json", self.config.api_version), &params)
            .await
    }

    /// Create a user with the caller-side identifier `uid`.
    ///
    /// Sends `height`, `gender`, `location` and `weight`. `birth_year` and
    /// `country` are accepted in `options` but not sent.
    ///
    /// # Errors
    /// Returns the transport error unchanged
    pub async fn provision_user(
        &self,
        uid: &str,
        options: &UserOptions,
    ) -> Result<Option<Value>, ValidicError> {
        let creds = self.credentials_for(options);
        let profile = &options.profile;
        let params = object(json!({
            "access_token": creds.access_token,
            "user": {
                "uid": uid,
                "profile": {
                    "height": profile.height,
                    "gender": profile.gender,
                    "location": profile.location,
                    "weight": profile.weight,
                },
            },
        }));

        self.transport
            .post(&self.users_path(&creds.organization_id)?, &params)
            .await
    }

    /// Update the user `user_id`.
    ///
    /// `user.uid` comes from `options`, not from `user_id`, so an update can
    /// change the caller-side identifier.
    ///
    /// # Errors
    /// Returns the transport error unchanged
    pub async fn update_user(
        &self,
        user_id: &str,
        options: &UserOptions,
    ) -> Result<Option<Value>, ValidicError> {
        let creds = self.credentials_for(options);
        let profile = &options.profile;
        let params = object(json!({
            "access_token": creds.access_token,
            "user": {
                "uid": profile.uid,
                "profile": {
                    "gender": profile.gender,
                    "location": profile.location,
                    "country": profile.country,
                    "birth_year": profile.birth_year,
                    "height": profile.height,
                    "weight": profile.weight,
                },
            },
        }));

        self.transport
            .put(&self.user_path(&creds.organization_id, user_id)?, &params)
            .await
    }

    /// # Errors
    /// Returns the transport error unchanged
    pub async fn suspend_user(
        &self,
        user_id: &str,
        options: &UserOptions,
    ) -> Result<Option<Value>, ValidicError> {
        self.set_suspended(user_id, options, true).await
    }

    /// # Errors
    /// Returns the transport error unchanged
    pub async fn unsuspend_user(
        &self,
        user_id: &str,
        options: &UserOptions,
    ) -> Result<Option<Value>, ValidicError> {
        self.set_suspended(user_id, options, false).await
    }

    /// Issue a new authentication token for the user.
    ///
    /// # Errors
    /// Returns the transport error unchanged
    pub async fn refresh_token(
        &self,
        user_id: &str,
        options: &UserOptions,
    ) -> Result<Option<Value>, ValidicError> {
        let creds = self.credentials_for(options);
        let path = format!(
            "/{}/organizations/{}/users/{}/refresh_token.json",
            self.config.api_version,
            path_segment(&creds.organization_id)?,
            path_segment(user_id)?,
        );
        let params = object(json!({ "access_token": creds.access_token }));
        self.transport.get(&path, &params).await
    }

    /// # Errors
    /// Returns the transport error unchanged
    pub async fn delete_user(
        &self,
        user_id: &str,
        options: &UserOptions,
    ) -> Result<Option<Value>, ValidicError> {
        let creds = self.credentials_for(options);
        let params = object(json!({ "access_token": creds.access_token }));
        self.transport
            .delete(&self.user_path(&creds.organization_id, user_id)?, &params)
            .await
    }

    async fn set_suspended(
        &self,
        user_id: &str,
        options: &UserOptions,
        suspend: bool,
    ) -> Result<Option<Value>, ValidicError> {
        let creds = self.credentials_for(options);
        let params = object(json!({
            "suspend": u8::from(suspend),
            "access_token": creds.access_token,
        }));
        self.transport
            .put(&self.user_path(&creds.organization_id, user_id)?, &params)
            .await
    }

    fn credentials(
        &self,
        organization_id: Option<&str>,
        access_token: Option<&str>,
    ) -> Credentials {
        Credentials::resolve(&self.config, organization_id, access_token)
    }

    fn credentials_for(&self, options: &UserOptions) -> Credentials {
        self.credentials(
            options.organization_id.as_deref(),
            options.access_token.as_deref(),
        )
    }

    fn users_path(&self, organization_id: &str) -> Result<String, ValidicError> {
        Ok(format!(
            "/{}/organizations/{}/users.json",
            self.config.api_version,
            path_segment(organization_id)?,
        ))
    }

    fn user_path(&self, organization_id: &str, user_id: &str) -> Result<String, ValidicError> {
        Ok(format!(
            "/{}/organizations/{}/users/{}.json",
            self.config.api_version,
            path_segment(organization_id)?,
            path_segment(user_id)?,
        ))
    }
}

/// Encode `value` as exactly one path segment.
///
/// URL parsing collapses `.` and `..` segments even when percent-encoded, so
/// those cannot be sent at all.
fn path_segment(value: &str) -> Result<Cow<'_, str>, ValidicError> {
    if value == "." || value == ".." {
        return Err(ValidicError::InvalidUrl {
            url: value.to_owned(),
            reason: "id must not be a relative path segment".to_owned(),
        });
    }
    Ok(urlencoding::encode(value))
}

fn object(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}
