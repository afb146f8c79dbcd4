use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidateEmail, ValidationErrors};

use super::{Center, Record};
use crate::types::id::{marker::UserMarker, CenterId, Id, UserId};
use crate::types::Role;
use crate::util::{serde_ext::double_option, validator::FieldErrors, Sensitive};

static USERNAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9.\-_]*$").ok());

#[derive(Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(rename = "centro_id")]
    pub center_id: Option<CenterId>,
    #[serde(rename = "correo")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("center_id", &self.center_id)
            .finish_non_exhaustive()
    }
}

impl User {
    /// Doctors and employees must belong to a center.
    pub fn check_affiliation(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        if self.role.requires_center() {
            errors.check_required("centro_id", self.center_id.as_ref());
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "centro")]
    pub center: Option<Center>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: Sensitive<String>,
    #[serde(default = "NewUser::default_role")]
    pub role: Role,
    #[serde(rename = "centro_id", default)]
    pub center_id: Option<CenterId>,
    #[serde(rename = "correo", default)]
    pub email: Option<String>,
}

impl NewUser {
    const fn default_role() -> Role {
        Role::Empleado
    }
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        check_username(&mut errors, Some(&self.username));
        check_password(&mut errors, Some(&self.password));
        check_email(&mut errors, self.email.as_deref());
        if self.role.requires_center() {
            errors.check_required("centro_id", self.center_id.as_ref());
        }
        errors.into_result()
    }
}

/// Payload of the one-time bootstrap of the first administrator.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupAdmin {
    pub username: String,
    pub password: Sensitive<String>,
    #[serde(rename = "centro_id", default)]
    pub center_id: Option<CenterId>,
    #[serde(rename = "correo", default)]
    pub email: Option<String>,
}

impl SetupAdmin {
    #[must_use]
    pub fn into_new_user(self) -> NewUser {
        NewUser {
            username: self.username,
            password: self.password,
            role: Role::Admin,
            center_id: self.center_id,
            email: self.email,
        }
    }
}

/// A user ready to be stored, with its password already hashed.
#[derive(Clone)]
pub struct UserDraft {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub center_id: Option<CenterId>,
    pub email: Option<String>,
}

impl std::fmt::Debug for UserDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDraft")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Sensitive<String>>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(rename = "centro_id", default, deserialize_with = "double_option")]
    pub center_id: Option<Option<CenterId>>,
    #[serde(rename = "correo", default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
}

impl Validate for UserChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        check_username(&mut errors, self.username.as_deref());
        check_password(&mut errors, self.password.as_ref());
        check_email(&mut errors, self.email.as_ref().and_then(Option::as_deref));
        errors.into_result()
    }
}

impl UserChanges {
    /// Applies everything except the password, which has to be
    /// hashed by the caller first.
    pub fn apply(self, user: &mut User) -> Option<Sensitive<String>> {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(center_id) = self.center_id {
            user.center_id = center_id;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        self.password
    }
}

fn check_username(errors: &mut FieldErrors, username: Option<&str>) {
    let Some(username) = username else { return };
    errors.check_length("username", Some(username), 3, 100);

    let valid = USERNAME
        .as_ref()
        .map(|re| re.is_match(username))
        .unwrap_or_default();

    if !valid {
        errors.insert(
            "username",
            "pattern",
            "Username may only contain letters, digits, dots, dashes and underscores",
        );
    }
}

fn check_password(errors: &mut FieldErrors, password: Option<&Sensitive<String>>) {
    errors.check_length("password", password.map(Sensitive::as_str), 8, 128);
}

fn check_email(errors: &mut FieldErrors, email: Option<&str>) {
    let Some(email) = email else { return };
    errors.check_length("correo", Some(email), 1, 255);
    if !email.validate_email() {
        errors.insert("correo", "email", "Invalid email address");
    }
}

impl Record for User {
    type Marker = UserMarker;
    type New = UserDraft;

    fn id(&self) -> Id<UserMarker> {
        self.id
    }

    fn build(id: UserId, new: UserDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            username: new.username,
            password_hash: new.password_hash,
            role: new.role,
            center_id: new.center_id,
            email: new.email,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_user(value: serde_json::Value) -> NewUser {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn staff_roles_need_a_center() {
        let user = new_user(json!({
            "username": "dr.ruiz",
            "password": "supersecret",
            "role": "medico",
        }));
        let errors = user.validate().unwrap_err();
        assert!(errors.errors().contains_key("centro_id"));

        let admin = new_user(json!({
            "username": "root_admin",
            "password": "supersecret",
            "role": "admin",
        }));
        assert!(admin.validate().is_ok());
    }

    #[test]
    fn rejects_bad_username_password_and_email() {
        let user = new_user(json!({
            "username": ".x",
            "password": "short",
            "role": "admin",
            "correo": "not-an-email",
        }));
        let errors = user.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("correo"));
    }

    #[test]
    fn never_serializes_password_hash() {
        let user = User::build(
            UserId::new(1),
            UserDraft {
                username: "admin".into(),
                password_hash: "$argon2id$secret".into(),
                role: Role::Admin,
                center_id: None,
                email: Some("admin@hospital.test".into()),
            },
            Utc::now(),
        );

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["correo"], "admin@hospital.test");
        assert_eq!(value["role"], "admin");
        assert!(!format!("{user:?}").contains("secret"));
    }

    #[test]
    fn changes_return_password_for_hashing() {
        let mut user = User::build(
            UserId::new(1),
            UserDraft {
                username: "ana".into(),
                password_hash: "hash".into(),
                role: Role::Empleado,
                center_id: Some(CenterId::new(1)),
                email: None,
            },
            Utc::now(),
        );

        let changes: UserChanges = serde_json::from_value(json!({
            "role": "admin",
            "centro_id": null,
            "password": "a-new-password",
        }))
        .unwrap();
        assert!(changes.validate().is_ok());

        let password = changes.apply(&mut user);
        assert_eq!(password.unwrap().as_str(), "a-new-password");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.center_id, None);
        assert_eq!(user.password_hash, "hash");
        assert!(user.check_affiliation().is_ok());
    }
}
