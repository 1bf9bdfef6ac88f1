//! Registration form validation.
//!
//! These checks run before any provider call. They are advisory: the
//! Identity Gateway applies its own password policy regardless.

use crate::error::ValidationError;
use crate::types::{EmergencyContact, MembershipTier, NewMember, ProfileChanges};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Raw registration form input.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Phone number (optional).
    pub phone: String,
    /// Requested tier; defaults to casual.
    pub membership_type: MembershipTier,
    /// Emergency contact name (optional).
    pub emergency_contact_name: String,
    /// Emergency contact phone (optional).
    pub emergency_contact_phone: String,
    /// Emergency contact relationship (optional).
    pub emergency_contact_relationship: String,
}

/// A form that passed validation.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    /// Trimmed email.
    pub email: String,
    /// Password, untouched.
    pub password: String,
    /// Profile fields for the member document.
    pub profile: NewMember,
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("membership_type", &self.membership_type)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for ValidRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidRegistration")
            .field("email", &self.email)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl RegistrationForm {
    /// Run the local checks in display order.
    ///
    /// Required fields are checked first, then the email shape, then the
    /// password confirmation, then the password length.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(&self) -> Result<ValidRegistration, ValidationError> {
        require("First name", &self.first_name)?;
        require("Last name", &self.last_name)?;
        require("Email", &self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::MissingField { field: "Password" });
        }

        let email = self.email.trim();
        check_email(email)?;

        check_password(&self.password, &self.confirm_password)?;

        let contact = EmergencyContact {
            name: self.emergency_contact_name.trim().to_string(),
            phone: self.emergency_contact_phone.trim().to_string(),
            relationship: self.emergency_contact_relationship.trim().to_string(),
        };

        Ok(ValidRegistration {
            email: email.to_string(),
            password: self.password.clone(),
            profile: NewMember {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                phone: self.phone.trim().to_string(),
                membership_type: self.membership_type,
                emergency_contact: contact.non_blank(),
            },
        })
    }
}

/// Password confirmation and length checks, in that order.
///
/// # Errors
///
/// [`ValidationError::PasswordMismatch`] or [`ValidationError::PasswordTooShort`].
pub fn check_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Email presence and shape check.
///
/// # Errors
///
/// [`ValidationError::MissingField`] or [`ValidationError::InvalidEmail`].
pub fn check_email(email: &str) -> Result<(), ValidationError> {
    require("Email", email)?;
    if looks_like_email(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Profile edits may not blank out a name.
///
/// # Errors
///
/// [`ValidationError::MissingField`] for a blank first or last name.
pub fn check_profile_changes(changes: &ProfileChanges) -> Result<(), ValidationError> {
    if let Some(first_name) = &changes.first_name {
        require("First name", first_name)?;
    }
    if let Some(last_name) = &changes.last_name {
        require("Last name", last_name)?;
    }
    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(())
    }
}

// Shape check only: one '@', non-empty local part, dotted domain, no spaces.
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            email: "alex@spelthornevc.test".to_string(),
            password: "setter42".to_string(),
            confirm_password: "setter42".to_string(),
            first_name: "Alex".to_string(),
            last_name: "Ward".to_string(),
            ..RegistrationForm::default()
        }
    }

    #[test]
    fn accepts_complete_form() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.email, "alex@spelthornevc.test");
        assert_eq!(valid.profile.display_name(), "Alex Ward");
        assert_eq!(valid.profile.membership_type, MembershipTier::Casual);
        assert_eq!(valid.profile.emergency_contact, None);
    }

    #[test]
    fn mismatch_is_reported_before_length() {
        let mut input = form();
        input.password = "abc".to_string();
        input.confirm_password = "abd".to_string();
        assert_eq!(input.validate(), Err(ValidationError::PasswordMismatch));
    }

    #[test]
    fn short_password_rejected() {
        let mut input = form();
        input.password = "abcde".to_string();
        input.confirm_password = "abcde".to_string();
        assert_eq!(
            input.validate(),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(check_password("ééééé", "ééééé").is_err());
        assert!(check_password("éééééé", "éééééé").is_ok());
    }

    #[test]
    fn debug_output_hides_passwords() {
        let rendered = format!("{:?} {:?}", form(), form().validate().unwrap());
        assert!(!rendered.contains("setter42"));
    }

    #[test]
    fn required_fields_in_order() {
        let mut input = form();
        input.first_name = "  ".to_string();
        input.email = String::new();
        assert_eq!(
            input.validate(),
            Err(ValidationError::MissingField { field: "First name" })
        );
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["alex", "alex@", "@club.test", "alex@club", "a b@club.test", "a@b@club.test"] {
            let mut input = form();
            input.email = email.to_string();
            assert_eq!(input.validate(), Err(ValidationError::InvalidEmail), "{email}");
        }
    }

    #[test]
    fn keeps_partial_emergency_contact() {
        let mut input = form();
        input.emergency_contact_name = "Pat Ward".to_string();
        let valid = input.validate().unwrap();
        let contact = valid.profile.emergency_contact.unwrap();
        assert_eq!(contact.name, "Pat Ward");
        assert!(contact.phone.is_empty());
    }

    #[test]
    fn profile_edit_cannot_blank_names() {
        let changes = ProfileChanges {
            last_name: Some(" ".to_string()),
            ..ProfileChanges::default()
        };
        assert_eq!(
            check_profile_changes(&changes),
            Err(ValidationError::MissingField { field: "Last name" })
        );
        assert!(check_profile_changes(&ProfileChanges::default()).is_ok());
    }

    proptest! {
        #[test]
        fn differing_confirmation_always_mismatch(
            password in "[a-zA-Z0-9]{0,20}",
            suffix in "[a-zA-Z0-9]{1,4}",
        ) {
            let mut input = form();
            input.password.clone_from(&password);
            input.confirm_password = format!("{password}{suffix}");
            if password.is_empty() {
                prop_assert_eq!(input.validate(), Err(ValidationError::MissingField { field: "Password" }));
            } else {
                prop_assert_eq!(input.validate(), Err(ValidationError::PasswordMismatch));
            }
        }

        #[test]
        fn short_matching_passwords_never_pass(password in "[a-zA-Z0-9]{1,5}") {
            prop_assert_eq!(
                check_password(&password, &password),
                Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LENGTH })
            );
        }

        #[test]
        fn long_matching_passwords_pass(password in "[a-zA-Z0-9!?]{6,40}") {
            let mut input = form();
            input.password.clone_from(&password);
            input.confirm_password.clone_from(&password);
            prop_assert!(input.validate().is_ok());
        }
    }
}
