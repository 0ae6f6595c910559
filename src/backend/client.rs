use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::authority::{SessionVerifier, Verdict};
use crate::backend::error::BackendError;
use crate::backend::models::{
    AccountsEnvelope, DataEnvelope, GameAccount, LoginResponse, OperatorUser, Transaction,
    TransactionsEnvelope,
};
use crate::gifts::GiftSlotStatus;

/// HTTP client for the gifting backend
pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(path)?)
    }

    fn get(&self, path: &str, token: &str) -> Result<RequestBuilder, BackendError> {
        Ok(self.client.get(self.endpoint(path)?).bearer_auth(token))
    }

    fn post(&self, path: &str, token: &str) -> Result<RequestBuilder, BackendError> {
        Ok(self.client.post(self.endpoint(path)?).bearer_auth(token))
    }

    /// Send a request and decode a JSON body, mapping error statuses
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("[Backend] Request failed with {}", status);
            return Err(BackendError::from_status(status, &body));
        }
        Ok(response.json::<T>().await?)
    }

    /// Exchange operator credentials for a session token.
    ///
    /// Returns `None` when the backend refuses the credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<String>, BackendError> {
        let request = self
            .client
            .post(self.endpoint("loginform")?)
            .form(&[("user", username), ("password", password)]);

        match self.fetch::<LoginResponse>(request).await {
            Ok(response) => Ok(response.token.filter(|t| !t.is_empty())),
            Err(BackendError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetch the gift-slot snapshot of one linked account.
    ///
    /// A reported failure or a malformed payload yields `None`.
    pub async fn gift_slot_status(
        &self,
        token: &str,
        account_id: &str,
    ) -> Result<Option<GiftSlotStatus>, BackendError> {
        let request = self
            .post("giftslotstatus", token)?
            .json(&json!({ "account_id": account_id }));
        let envelope: DataEnvelope = self.fetch(request).await?;

        if !envelope.success {
            warn!(
                "[Backend] Gift-slot status for {} unavailable: {}",
                account_id,
                envelope.error.as_deref().unwrap_or("no reason given")
            );
            return Ok(None);
        }
        Ok(envelope.data.and_then(GiftSlotStatus::from_value))
    }

    /// Linked accounts of the authenticated operator
    pub async fn own_accounts(&self, token: &str) -> Result<Vec<GameAccount>, BackendError> {
        let envelope: AccountsEnvelope = self.fetch(self.get("fortniteaccountsofuser", token)?).await?;
        Ok(accounts_of(envelope))
    }

    /// Every linked account (admin)
    pub async fn all_accounts(&self, token: &str) -> Result<Vec<GameAccount>, BackendError> {
        let envelope: AccountsEnvelope = self.fetch(self.get("allfortniteaccounts", token)?).await?;
        Ok(accounts_of(envelope))
    }

    pub async fn transactions(&self, token: &str) -> Result<Vec<Transaction>, BackendError> {
        let envelope: TransactionsEnvelope = self.fetch(self.get("transactions", token)?).await?;
        if !envelope.success {
            return Err(BackendError::Reported("transactions unavailable".to_string()));
        }
        Ok(envelope.transactions)
    }

    /// Operator accounts of the dashboard (admin)
    pub async fn operator_users(&self, token: &str) -> Result<Vec<OperatorUser>, BackendError> {
        self.fetch(self.get("getalluser", token)?).await
    }
}

fn accounts_of(envelope: AccountsEnvelope) -> Vec<GameAccount> {
    if !envelope.success {
        debug!("[Backend] Accounts envelope reported no success");
    }
    envelope.game_accounts.unwrap_or_default()
}

#[async_trait]
impl SessionVerifier for BackendClient {
    async fn verify(&self, token: &str) -> Result<Verdict, BackendError> {
        let response = self.get("protected", token)?.send().await?;
        if response.status() == StatusCode::OK {
            Ok(Verdict::Accepted)
        } else {
            info!("[Backend] /protected answered {}", response.status());
            Ok(Verdict::Rejected)
        }
    }
}
