use secrecy::SecretString;

/// Login credentials: user id, password and numeric PIN.
///
/// Used only to derive the profile's symmetric key and its DHT location
/// key, then re-derived on demand — never persisted anywhere. Losing them
/// makes the profile unrecoverable by design.
#[derive(Clone)]
pub struct UserCredentials {
    user_id: String,
    password: SecretString,
    pin: SecretString,
}

impl UserCredentials {
    pub fn new(
        user_id: impl Into<String>,
        password: impl Into<String>,
        pin: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            password: SecretString::from(password.into()),
            pin: SecretString::from(pin.into()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn pin(&self) -> &SecretString {
        &self.pin
    }
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("user_id", &self.user_id)
            .field("password", &"[REDACTED]")
            .field("pin", &"[REDACTED]")
            .finish()
    }
}
