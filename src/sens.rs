//! NCP SENS alimtalk delivery client. Requests are signed with HMAC-SHA256
//! over `"POST {uri}\n{timestamp_ms}\n{access_key}"`, base64-encoded, per the
//! API gateway's v2 signature scheme.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use sha2::Sha256;
use std::fmt;

use crate::config;

const SENS_API_BASE: &str = "https://sens.apigw.ntruss.com/";

type HmacSha256 = Hmac<Sha256>;

/// Delivery collaborator: sends one templated confirmation-link message.
/// `Ok(())` means the gateway accepted the message; any error is a per-customer
/// soft failure for the caller to log.
#[async_trait]
pub trait AlimtalkService: Send + Sync {
    async fn send(&self, phone: &str, customer_name: &str, confirm_link: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct SensClient {
    http: Client,
    base_url: Url,
    access_key: String,
    secret_key: String,
    service_id: String,
    channel_id: String,
    template_code: String,
}

impl fmt::Debug for SensClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensClient")
            .field("base_url", &self.base_url)
            .field("service_id", &self.service_id)
            .finish_non_exhaustive()
    }
}

impl SensClient {
    pub fn from_config(sens: &config::Sens) -> Self {
        let base_url = Url::parse(SENS_API_BASE).expect("valid default SENS URL");
        Self::with_base_url(sens, base_url)
    }

    pub fn with_base_url(sens: &config::Sens, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("draftbot/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            access_key: sens.access_key.clone(),
            secret_key: sens.secret_key.clone(),
            service_id: sens.service_id.clone(),
            channel_id: sens.channel_id.clone(),
            template_code: sens.template_code.clone(),
        }
    }

    fn message_uri(&self) -> String {
        format!("/alimtalk/v2/services/{}/messages", self.service_id)
    }
}

#[async_trait]
impl AlimtalkService for SensClient {
    async fn send(&self, phone: &str, customer_name: &str, confirm_link: &str) -> Result<()> {
        let uri = self.message_uri();
        let timestamp = Utc::now().timestamp_millis().to_string();
        let signature = make_signature(&self.secret_key, &self.access_key, &uri, &timestamp);

        let endpoint = self
            .base_url
            .join(uri.trim_start_matches('/'))
            .context("invalid SENS base URL")?;
        let body = build_message_request(
            &self.channel_id,
            &self.template_code,
            phone,
            customer_name,
            confirm_link,
        );

        let res = self
            .http
            .post(endpoint)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("x-ncp-apigw-timestamp", &timestamp)
            .header("x-ncp-iam-access-key", &self.access_key)
            .header("x-ncp-apigw-signature-v2", &signature)
            .json(&body)
            .send()
            .await
            .context("failed to reach SENS")?;

        // The gateway answers 202 on accepted dispatch.
        if res.status() != StatusCode::ACCEPTED {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("alimtalk send failed {}: {}", status, body));
        }
        Ok(())
    }
}

/// Base64 HMAC-SHA256 over the gateway's canonical signing string.
pub fn make_signature(secret_key: &str, access_key: &str, uri: &str, timestamp: &str) -> String {
    let message = format!("POST {uri}\n{timestamp}\n{access_key}");
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

pub fn build_message_request(
    channel_id: &str,
    template_code: &str,
    phone: &str,
    customer_name: &str,
    confirm_link: &str,
) -> Value {
    let content = format!(
        "Hello {customer_name}!\nThis week's blog drafts are ready.\n\n\
Open the link below to review and pick one.\n{confirm_link}\n\n\
If you don't choose within 3 days, the first draft is published automatically.",
    );
    json!({
        "plusFriendId": channel_id,
        "templateCode": template_code,
        "messages": [
            {
                "to": phone.replace('-', ""),
                "content": content,
                "buttons": [
                    {
                        "type": "WL",
                        "name": "Review drafts",
                        "linkMobile": confirm_link,
                        "linkPc": confirm_link,
                    }
                ]
            }
        ]
    })
}
