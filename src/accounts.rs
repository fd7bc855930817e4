//! Account registration, login and API keys.
//!
//! The repository accepts any user it is given; uniqueness of usernames is
//! enforced here.

use imghost_common::clock::now_millis;
use imghost_common::tokens::generate_api_key;
use imghost_common::{Error, Result, UserId};
use imghost_store::bootstrap::ADMIN_USERNAME;
use imghost_store::credentials::{hash_password, verify_password};
use imghost_store::{EntityRepository, User, UserLevel, UserUpdate};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 30;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// The admin account is still using its bootstrap password.
    pub default_credentials: bool,
}

pub struct AccountService {
    repo: EntityRepository,
}

/// Trim and cap a submitted username.
fn normalize_username(raw: &str) -> String {
    raw.trim().chars().take(MAX_USERNAME_LEN).collect()
}

impl AccountService {
    pub fn new(repo: EntityRepository) -> Self {
        Self { repo }
    }

    /// Create a normal user. Fails with `Conflict` if the username is taken.
    pub fn register(&self, username: &str, password: &str) -> Result<User> {
        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(Error::invalid_input("username and password are required"));
        }
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(Error::invalid_input(format!(
                "username must be at least {MIN_USERNAME_LEN} characters"
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::invalid_input(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.repo.find_user_by_username(&username).is_some() {
            return Err(Error::conflict(format!("username {username} already exists")));
        }

        let user = User {
            id: UserId::generate(),
            username,
            password_hash: Some(hash_password(password)?),
            api_key: generate_api_key(),
            level: UserLevel::Normal,
            created_at: now_millis(),
        };
        self.repo.add_user(user.clone());

        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Check a username and password.
    ///
    /// A user without a stored password hash (an account created before
    /// passwords existed) adopts the password given at its first login.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(Error::invalid_input("username and password are required"));
        }

        let Some(mut user) = self.repo.find_user_by_username(&username) else {
            tracing::warn!(username = %username, "Login failed: unknown user");
            return Err(Error::unauthorized("unknown user"));
        };

        match &user.password_hash {
            Some(hash) => {
                if !verify_password(password, hash) {
                    tracing::warn!(username = %username, "Login failed: wrong password");
                    return Err(Error::unauthorized("wrong password"));
                }
            }
            None => {
                let hash = hash_password(password)?;
                let update = UserUpdate {
                    password_hash: Some(hash),
                    ..Default::default()
                };
                if let Some(updated) = self.repo.update_user(&user.id, update) {
                    user = updated;
                }
                tracing::info!(user_id = %user.id, "Initialised password on first login");
            }
        }

        let default_credentials = user.username == ADMIN_USERNAME && password == "admin";
        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(LoginOutcome {
            user,
            default_credentials,
        })
    }

    /// Replace a password after checking the current one.
    pub fn change_password(&self, id: &UserId, old: &str, new: &str) -> Result<()> {
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::invalid_input(format!(
                "new password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let user = self
            .repo
            .find_user_by_id(id)
            .ok_or_else(|| Error::not_found("user", id.as_str()))?;

        let matches = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(old, hash));
        if !matches {
            return Err(Error::unauthorized("wrong password"));
        }

        let update = UserUpdate {
            password_hash: Some(hash_password(new)?),
            ..Default::default()
        };
        self.repo.update_user(id, update);
        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }

    /// Resolve the user an API key belongs to.
    pub fn authenticate_api_key(&self, api_key: &str) -> Option<User> {
        if api_key.is_empty() {
            return None;
        }
        self.repo.find_user_by_api_key(api_key)
    }

    /// Issue a fresh API key, invalidating the old one.
    pub fn rotate_api_key(&self, id: &UserId) -> Result<String> {
        let api_key = generate_api_key();
        let update = UserUpdate {
            api_key: Some(api_key.clone()),
            ..Default::default()
        };
        self.repo
            .update_user(id, update)
            .ok_or_else(|| Error::not_found("user", id.as_str()))?;

        tracing::info!(user_id = %id, "Rotated API key");
        Ok(api_key)
    }
}
