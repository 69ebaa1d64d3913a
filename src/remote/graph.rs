//! Meta Graph API client: Facebook OAuth and WhatsApp Business lookups.
//!
//! Graph authenticates with an `access_token` query parameter rather than a
//! header, and wraps collections in `{"data": [...]}` envelopes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{extract_error_message, RemoteApiError, RemoteResult};
use crate::config::FacebookConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacebookProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<PictureEnvelope>,
}

impl FacebookProfile {
    pub fn picture_url(&self) -> Option<&str> {
        self.picture.as_ref().map(|p| p.data.url.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PictureEnvelope {
    pub data: PictureData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PictureData {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Business {
    pub id: String,
    pub name: String,
}

/// A WhatsApp Business Account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Waba {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhoneNumber {
    pub id: String,
    pub display_phone_number: String,
    pub verified_name: String,
    /// `VERIFIED`, `PENDING`, or `NOT_VERIFIED`.
    #[serde(default)]
    pub code_verification_status: Option<String>,
    #[serde(default)]
    pub quality_rating: Option<String>,
}

impl PhoneNumber {
    pub fn is_verified(&self) -> bool {
        self.code_verification_status.as_deref() == Some("VERIFIED")
    }
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Exchange an OAuth authorization code for a user access token.
    async fn exchange_code(&self, code: &str) -> RemoteResult<OAuthToken>;
    async fn profile(&self, access_token: &str) -> RemoteResult<FacebookProfile>;
    async fn businesses(&self, access_token: &str) -> RemoteResult<Vec<Business>>;
    async fn owned_wabas(&self, business_id: &str, access_token: &str) -> RemoteResult<Vec<Waba>>;
    async fn phone_numbers(&self, waba_id: &str, access_token: &str)
        -> RemoteResult<Vec<PhoneNumber>>;
    async fn phone_number(
        &self,
        phone_number_id: &str,
        access_token: &str,
    ) -> RemoteResult<PhoneNumber>;
}

pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    redirect_uri: String,
}

impl GraphClient {
    pub fn new(config: &FacebookConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.graph_base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            redirect_uri: config.oauth_redirect_uri.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> RemoteResult<T> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteApiError::Status {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn exchange_code(&self, code: &str) -> RemoteResult<OAuthToken> {
        let url = format!(
            "{}/oauth/access_token?client_id={}&client_secret={}&redirect_uri={}&code={}",
            self.base_url,
            urlencoding::encode(&self.app_id),
            urlencoding::encode(&self.app_secret),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(code),
        );
        self.get_json(url).await
    }

    async fn profile(&self, access_token: &str) -> RemoteResult<FacebookProfile> {
        let url = format!(
            "{}/me?fields=id,name,email,picture&access_token={}",
            self.base_url,
            urlencoding::encode(access_token),
        );
        self.get_json(url).await
    }

    async fn businesses(&self, access_token: &str) -> RemoteResult<Vec<Business>> {
        let url = format!(
            "{}/me/businesses?fields=id,name&access_token={}",
            self.base_url,
            urlencoding::encode(access_token),
        );
        let envelope: DataEnvelope<Business> = self.get_json(url).await?;
        Ok(envelope.data)
    }

    async fn owned_wabas(&self, business_id: &str, access_token: &str) -> RemoteResult<Vec<Waba>> {
        let url = format!(
            "{}/{}/owned_whatsapp_business_accounts?fields=id,name&access_token={}",
            self.base_url,
            business_id,
            urlencoding::encode(access_token),
        );
        let envelope: DataEnvelope<Waba> = self.get_json(url).await?;
        Ok(envelope.data)
    }

    async fn phone_numbers(
        &self,
        waba_id: &str,
        access_token: &str,
    ) -> RemoteResult<Vec<PhoneNumber>> {
        let url = format!(
            "{}/{}/phone_numbers?fields=id,display_phone_number,verified_name,code_verification_status,quality_rating&access_token={}",
            self.base_url,
            waba_id,
            urlencoding::encode(access_token),
        );
        let envelope: DataEnvelope<PhoneNumber> = self.get_json(url).await?;
        Ok(envelope.data)
    }

    async fn phone_number(
        &self,
        phone_number_id: &str,
        access_token: &str,
    ) -> RemoteResult<PhoneNumber> {
        let url = format!(
            "{}/{}?fields=id,display_phone_number,verified_name,code_verification_status,quality_rating&access_token={}",
            self.base_url,
            phone_number_id,
            urlencoding::encode(access_token),
        );
        self.get_json(url).await
    }
}

/// Facebook Login dialog URL the browser is redirected to.
pub fn login_dialog_url(config: &FacebookConfig, state: &str) -> String {
    let scopes = "email,public_profile,business_management,whatsapp_business_management";
    format!(
        "https://www.facebook.com/v23.0/dialog/oauth?client_id={}&redirect_uri={}&state={}&scope={}",
        urlencoding::encode(&config.app_id),
        urlencoding::encode(&config.oauth_redirect_uri),
        urlencoding::encode(state),
        urlencoding::encode(scopes),
    )
}
