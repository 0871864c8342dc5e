//! Parameters the provider appends to the redirect URI.

use url::Url;

use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackParams {
    Code {
        code: String,
        state: String,
    },
    Error {
        error: String,
        description: Option<String>,
        state: Option<String>,
    },
}

impl CallbackParams {
    pub fn from_url(url: &Url) -> Result<Self, SessionError> {
        Self::from_pairs(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())))
    }

    /// An `error` parameter wins over `code` when both are present.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, SessionError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut code = None;
        let mut state = None;
        let mut error = None;
        let mut description = None;

        for (key, value) in pairs {
            match key.as_str() {
                "code" => code = Some(value),
                "state" => state = Some(value),
                "error" => error = Some(value),
                "error_description" => description = Some(value),
                _ => {}
            }
        }

        if let Some(error) = error {
            return Ok(Self::Error {
                error,
                description,
                state,
            });
        }

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or(SessionError::MalformedCallback("code"))?;
        let state = state
            .filter(|s| !s.is_empty())
            .ok_or(SessionError::MalformedCallback("state"))?;
        Ok(Self::Code { code, state })
    }

    pub fn state(&self) -> Option<&str> {
        match self {
            Self::Code { state, .. } => Some(state),
            Self::Error { state, .. } => state.as_deref(),
        }
    }
}
