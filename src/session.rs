use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::error::SendError;

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// A message accepted by the delivery API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SentMessage {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Opens authenticated sessions against a delivery API.
pub trait Gateway: Send + Sync {
    fn open(
        &self,
        account_sid: &str,
        auth_token: &Secret<String>,
    ) -> Result<Box<dyn MessageSession>, SendError>;
}

/// A session bound to one set of credentials. Dropping it closes it.
#[async_trait]
pub trait MessageSession: Send + Sync {
    async fn send_message(
        &self,
        to: &str,
        from: &str,
        body: &str,
    ) -> Result<SentMessage, SendError>;
}

pub struct TwilioGateway {
    http: reqwest::Client,
    api_base: String,
}

impl TwilioGateway {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, SendError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

impl Gateway for TwilioGateway {
    fn open(
        &self,
        account_sid: &str,
        auth_token: &Secret<String>,
    ) -> Result<Box<dyn MessageSession>, SendError> {
        if account_sid.is_empty() || auth_token.expose_secret().is_empty() {
            return Err(SendError::MissingCredentials);
        }
        debug!("Opening delivery session for account {}", account_sid);
        Ok(Box::new(TwilioSession {
            http: self.http.clone(),
            messages_url: format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                self.api_base, account_sid
            ),
            account_sid: account_sid.to_string(),
            auth_token: Secret::new(auth_token.expose_secret().clone()),
        }))
    }
}

pub struct TwilioSession {
    http: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: Secret<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u32>,
    message: String,
}

#[async_trait]
impl MessageSession for TwilioSession {
    async fn send_message(
        &self,
        to: &str,
        from: &str,
        body: &str,
    ) -> Result<SentMessage, SendError> {
        let resp = self
            .http
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[("To", to), ("From", from), ("Body", body)])
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let (code, message) = match serde_json::from_str::<ApiError>(&text) {
                Ok(err) => (err.code, err.message),
                Err(_) => (None, text),
            };
            return Err(SendError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| SendError::Decode(e.to_string()))
    }
}

impl Drop for TwilioSession {
    fn drop(&mut self) {
        debug!("Closing delivery session for account {}", self.account_sid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(server: &mockito::Server) -> TwilioGateway {
        TwilioGateway::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    fn token(s: &str) -> Secret<String> {
        Secret::new(s.to_string())
    }

    #[test]
    fn open_requires_credentials() {
        let gw = TwilioGateway::new(DEFAULT_API_BASE, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            gw.open("", &token("tok")),
            Err(SendError::MissingCredentials)
        ));
        assert!(matches!(
            gw.open("AC123", &token("")),
            Err(SendError::MissingCredentials)
        ));
        assert!(gw.open("AC123", &token("tok")).is_ok());
    }

    #[tokio::test]
    async fn send_posts_form_with_basic_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            // base64("AC123:secret")
            .match_header("authorization", "Basic QUMxMjM6c2VjcmV0")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("To".into(), "whatsapp:+2".into()),
                mockito::Matcher::UrlEncoded("From".into(), "whatsapp:+1".into()),
                mockito::Matcher::UrlEncoded("Body".into(), "hello there".into()),
            ]))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sid":"SM1","status":"queued","to":"whatsapp:+2"}"#)
            .create_async()
            .await;

        let session = gateway(&server).open("AC123", &token("secret")).unwrap();
        let sent = session
            .send_message("whatsapp:+2", "whatsapp:+1", "hello there")
            .await
            .unwrap();

        assert_eq!(sent.sid, "SM1");
        assert_eq!(sent.status.as_deref(), Some("queued"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_errors_carry_twilio_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "code": 21211,
                    "message": "The 'To' number +2 is not a valid phone number.",
                    "status": 400
                })
                .to_string(),
            )
            .create_async()
            .await;

        let session = gateway(&server).open("AC123", &token("secret")).unwrap();
        let err = session.send_message("+2", "+1", "hi").await.unwrap_err();
        match err {
            SendError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, Some(21211));
                assert!(message.contains("not a valid phone number"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_is_kept_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let session = gateway(&server).open("AC123", &token("secret")).unwrap();
        let err = session.send_message("+2", "+1", "hi").await.unwrap_err();
        assert!(err.to_string().contains("(503): upstream unavailable"));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .with_status(201)
            .with_body("not json")
            .create_async()
            .await;

        let session = gateway(&server).open("AC123", &token("secret")).unwrap();
        let err = session.send_message("+2", "+1", "hi").await.unwrap_err();
        assert!(matches!(err, SendError::Decode(_)));
    }

    #[test]
    fn trailing_slash_in_base_is_ignored() {
        let gw = TwilioGateway::new("http://localhost:1/", Duration::from_secs(1)).unwrap();
        assert_eq!(gw.api_base, "http://localhost:1");
    }
}
