use secrecy::SecretString;

use crate::error::{AppError, AppResult};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 8;

/// Login form input after trimming and format checks.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    /// Trim both fields and check their format. Failures are trusted errors
    /// whose message can be shown next to the form.
    pub fn parse(username: &str, password: &str) -> AppResult<Self> {
        let username = username.trim();
        let password = password.trim();

        let length = username.chars().count();
        if length < USERNAME_MIN {
            return Err(AppError::trusted(format!(
                "Username must be at least {USERNAME_MIN} characters"
            )));
        }
        if length > USERNAME_MAX {
            return Err(AppError::trusted(format!(
                "Username must be at most {USERNAME_MAX} characters"
            )));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::trusted(
                "Username may only contain letters, numbers, hyphens and underscores",
            ));
        }
        if password.chars().count() < PASSWORD_MIN {
            return Err(AppError::trusted(format!(
                "Password must be at least {PASSWORD_MIN} characters"
            )));
        }

        Ok(Self {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
        })
    }
}
