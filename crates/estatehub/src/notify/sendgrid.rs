use async_trait::async_trait;
use serde_json::json;

use super::mailer::{Delivery, EmailMessage, MailError, Mailer};

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// SendGrid v3 mail-send client.
#[derive(Debug, Clone)]
pub struct SendGridMailer {
    http: reqwest::Client,
    api_key: String,
    from: String,
    endpoint: String,
}

impl SendGridMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self::with_endpoint(api_key, from, SENDGRID_ENDPOINT.to_string())
    }

    pub fn with_endpoint(api_key: String, from: String, endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            from,
            endpoint,
        }
    }

    fn payload(&self, message: &EmailMessage) -> serde_json::Value {
        let mut content = Vec::new();
        if let Some(text) = &message.text {
            content.push(json!({ "type": "text/plain", "value": text }));
        }
        content.push(json!({ "type": "text/html", "value": message.html }));

        json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.from },
            "subject": message.subject,
            "content": content,
        })
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: EmailMessage) -> Result<Delivery, MailError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(&message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %message.to, subject = %message.subject, "email sent");
        Ok(Delivery::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> EmailMessage {
        EmailMessage {
            to: "builder@acme.in".to_string(),
            subject: "Your OTP".to_string(),
            html: "<p>123456</p>".to_string(),
            text: Some("123456".to_string()),
        }
    }

    #[tokio::test]
    async fn posts_message_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .and(header("authorization", "Bearer sg-key"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = SendGridMailer::with_endpoint(
            "sg-key".to_string(),
            "noreply@estatehub.com".to_string(),
            format!("{}/v3/mail/send", server.uri()),
        );
        let delivery = mailer.send(message()).await.expect("send succeeds");
        assert_eq!(delivery, Delivery::Sent);
    }

    #[tokio::test]
    async fn surfaces_provider_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let mailer = SendGridMailer::with_endpoint(
            "sg-key".to_string(),
            "noreply@estatehub.com".to_string(),
            format!("{}/v3/mail/send", server.uri()),
        );
        match mailer.send(message()).await {
            Err(MailError::Rejected { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn payload_puts_plain_text_first() {
        let mailer = SendGridMailer::new("k".to_string(), "from@estatehub.com".to_string());
        let payload = mailer.payload(&message());
        assert_eq!(payload["content"][0]["type"], "text/plain");
        assert_eq!(payload["content"][1]["type"], "text/html");
        assert_eq!(payload["personalizations"][0]["to"][0]["email"], "builder@acme.in");
    }
}
