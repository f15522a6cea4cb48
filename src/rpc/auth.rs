use std::fs;
use std::io;

use thiserror::Error;

/// Local credential problems, reported at start-up rather than per request.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("cannot read cookie file {path}, reason: {source}")]
    Cookie { path: String, source: io::Error },
    #[error("credentials must be in the form `user:passwd`")]
    InvalidSource,
}

/// RPC credentials, either given directly or read from the node's `.cookie` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    pub user: String,
    pub passwd: String,
}

impl Auth {
    pub fn new(user: &str, passwd: &str) -> Auth {
        Auth {
            user: user.to_owned(),
            passwd: passwd.to_owned(),
        }
    }

    pub fn from_cookie(cookie_path: &str) -> Result<Auth, AuthError> {
        let content = fs::read_to_string(cookie_path).map_err(|source| AuthError::Cookie {
            path: cookie_path.to_owned(),
            source,
        })?;
        content.trim_end().try_into()
    }

    pub fn header_value(&self) -> String {
        let auth_str = format!("{}:{}", self.user, self.passwd);
        format!("Basic {}", rbase64::encode(auth_str.as_bytes()))
    }
}

impl TryFrom<&str> for Auth {
    type Error = AuthError;

    fn try_from(value: &str) -> Result<Self, AuthError> {
        if let Some(pos) = value.find(':') {
            return Ok(Auth {
                user: value[0..pos].to_owned(),
                passwd: value[pos + 1..].to_owned(),
            });
        }
        Err(AuthError::InvalidSource)
    }
}

impl TryFrom<String> for Auth {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, AuthError> {
        TryInto::<Auth>::try_into(value.as_ref())
    }
}
