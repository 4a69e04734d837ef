// ── Session ──
//
// Login and logout. The bearer token lives on the shared `ApiClient`, so
// every clone (the cache's fetcher included) is authenticated at once.

use secrecy::SecretString;
use tracing::info;

use medcart_api::{ApiClient, RequestOptions};

use crate::cache::Cache;
use crate::error::CoreError;
use crate::form::LoginInput;
use crate::model::{AuthToken, Role};
use crate::mutation::requests;

#[derive(Clone)]
pub struct Session {
    client: ApiClient,
    cache: Cache,
}

impl Session {
    pub fn new(client: ApiClient, cache: Cache) -> Self {
        Self { client, cache }
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.has_token()
    }

    /// Reuse a token saved from an earlier login.
    pub fn restore(&self, token: SecretString) {
        self.client.set_token(token);
    }

    /// Sign in and revalidate the current user.
    ///
    /// The returned token is already installed on the client; callers only
    /// need it to persist the session.
    pub async fn login(
        &self,
        role: Role,
        email: &str,
        password: &str,
    ) -> Result<AuthToken, CoreError> {
        let input = LoginInput {
            email: email.trim().to_owned(),
            password: password.to_owned(),
        };
        let request = requests::login(role, &input)?;

        let mut options = RequestOptions::new(request.method.clone());
        options.body.clone_from(&request.body);
        let value = self.client.fetch(&request.path, options).await?;

        let auth: AuthToken = serde_json::from_value(value).map_err(|e| CoreError::Decode {
            what: "login response".into(),
            message: e.to_string(),
        })?;

        self.client.set_token(auth.token.clone());
        drop(self.cache.invalidate(&request.affected));
        info!(%role, "signed in");
        Ok(auth)
    }

    /// Forget the token and every cached resource.
    pub fn logout(&self) {
        self.client.clear_token();
        self.cache.clear();
        info!("signed out");
    }
}
