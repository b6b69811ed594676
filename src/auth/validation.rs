use crate::{auth::dto::CredentialsRequest, error::ApiError};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 80;
pub const PASSWORD_MIN: usize = 6;

/// Validated register input: the username is trimmed, the password untouched.
pub fn validate_registration(req: CredentialsRequest) -> Result<(String, String), ApiError> {
    let username = req.username.unwrap_or_default().trim().to_owned();
    let password = req.password.unwrap_or_default();

    if username.is_empty() {
        return Err(ApiError::Validation("Username is required".into()));
    }
    let len = username.chars().count();
    if len < USERNAME_MIN {
        return Err(ApiError::Validation(format!(
            "Username must be at least {USERNAME_MIN} characters long"
        )));
    }
    if len > USERNAME_MAX {
        return Err(ApiError::Validation(format!(
            "Username must be at most {USERNAME_MAX} characters long"
        )));
    }
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {PASSWORD_MIN} characters long"
        )));
    }
    Ok((username, password))
}

/// Login only checks presence; credentials are judged by the store.
pub fn validate_login(req: CredentialsRequest) -> Result<(String, String), ApiError> {
    let username = req.username.filter(|u| !u.is_empty());
    let password = req.password.filter(|p| !p.is_empty());
    match (username, password) {
        (None, _) => Err(ApiError::Validation("Username is required".into())),
        (_, None) => Err(ApiError::Validation("Password is required".into())),
        (Some(u), Some(p)) => Ok((u, p)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(username: Option<&str>, password: Option<&str>) -> CredentialsRequest {
        CredentialsRequest {
            username: username.map(str::to_owned),
            password: password.map(str::to_owned),
        }
    }

    fn message(err: ApiError) -> String {
        err.to_string().to_lowercase()
    }

    #[test]
    fn registration_trims_username() {
        let (u, p) = validate_registration(req(Some("  alice "), Some("pw123456"))).expect("valid");
        assert_eq!(u, "alice");
        assert_eq!(p, "pw123456");
    }

    #[test]
    fn registration_requires_both_fields() {
        let err = validate_registration(req(None, Some("pw123456"))).unwrap_err();
        assert!(message(err).contains("username"));
        let err = validate_registration(req(Some("   "), Some("pw123456"))).unwrap_err();
        assert!(message(err).contains("username"));
        let err = validate_registration(req(Some("alice"), None)).unwrap_err();
        assert!(message(err).contains("password"));
    }

    #[test]
    fn registration_length_rules() {
        let err = validate_registration(req(Some("ab"), Some("pw123456"))).unwrap_err();
        assert!(message(err).contains("at least 3 characters"));

        let long = "x".repeat(USERNAME_MAX + 1);
        let err = validate_registration(req(Some(&long), Some("pw123456"))).unwrap_err();
        assert!(message(err).contains("at most 80 characters"));

        let err = validate_registration(req(Some("alice"), Some("12345"))).unwrap_err();
        assert!(message(err).contains("at least 6 characters"));

        let exact = "y".repeat(USERNAME_MAX);
        assert!(validate_registration(req(Some(&exact), Some("123456"))).is_ok());
    }

    #[test]
    fn login_requires_presence_only() {
        assert!(validate_login(req(Some("a"), Some("b"))).is_ok());
        let err = validate_login(req(Some(""), Some("b"))).unwrap_err();
        assert!(message(err).contains("username"));
        let err = validate_login(req(Some("a"), None)).unwrap_err();
        assert!(message(err).contains("password"));
    }
}
