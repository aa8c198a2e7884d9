//! User profiles.

use serde::{Deserialize, Serialize};
use takehome_common::{Result, TakeHomeError, Timestamp, UserId};

/// A user row. Created by the identity provider on login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// A user with only an id, timestamped now.
    pub fn new(id: UserId) -> Self {
        let now = takehome_common::now();
        Self {
            id,
            email: None,
            username: None,
            full_name: None,
            first_name: None,
            last_name: None,
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated profile update in place.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(first_name) = &update.first_name {
            self.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &update.last_name {
            self.last_name = Some(last_name.clone());
        }
        self.updated_at = takehome_common::now();
    }
}

/// Partial profile edit; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    /// Present fields must be non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.first_name.as_deref().is_some_and(str::is_empty) {
            return Err(TakeHomeError::validation("firstName must not be empty"));
        }
        if self.last_name.as_deref().is_some_and(str::is_empty) {
            return Err(TakeHomeError::validation("lastName must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_validation() {
        let ok = ProfileUpdate {
            first_name: Some("Ada".into()),
            last_name: None,
        };
        assert!(ok.validate().is_ok());
        assert!(ProfileUpdate::default().validate().is_ok());

        let empty_last = ProfileUpdate {
            first_name: Some("Ada".into()),
            last_name: Some(String::new()),
        };
        let err = empty_last.validate().unwrap_err();
        assert_eq!(err.to_string(), "lastName must not be empty");
    }

    #[test]
    fn test_apply_keeps_absent_fields() {
        let mut user = User::new(UserId::new("u1"));
        user.last_name = Some("Lovelace".into());

        user.apply(&ProfileUpdate {
            first_name: Some("Ada".into()),
            last_name: None,
        });

        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.last_name.as_deref(), Some("Lovelace"));
        assert!(user.updated_at >= user.created_at);
    }

    #[test]
    fn test_profile_update_from_camel_case_json() {
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"firstName":"Ada","lastName":"Lovelace"}"#).unwrap();
        assert_eq!(update.first_name.as_deref(), Some("Ada"));
        assert_eq!(update.last_name.as_deref(), Some("Lovelace"));
    }
}
