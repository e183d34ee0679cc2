use crate::feeds::build_client;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tickerdash_domain::repositories::messaging::{MessagePayload, SelectionSender, SendResponse};
use tracing::Instrument;

/// Posts the selection as JSON to the messaging relay (`/send_whatsapp`).
pub struct HttpSelectionSender {
    url: String,
    client: Client,
}

impl HttpSelectionSender {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Result<Self, String> {
        Ok(Self {
            url: url.into(),
            client: build_client(timeout_ms)?,
        })
    }

    async fn post(&self, payload: &MessagePayload) -> Result<SendResponse, String> {
        let resp = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|err| format!("send request failed: {err}"))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| format!("failed to read send response: {err}"))?;
        parse_send_response(status.as_u16(), &body)
    }
}

/// The relay reports failures in the body, including on 4xx/5xx.
/// A non-JSON error body falls back to a synthetic error status.
pub fn parse_send_response(status: u16, body: &str) -> Result<SendResponse, String> {
    match serde_json::from_str::<SendResponse>(body) {
        Ok(parsed) => Ok(parsed),
        Err(_) if status >= 400 => Ok(SendResponse {
            status: "error".to_string(),
            message: Some(format!("messaging http error: status {status}")),
        }),
        Err(err) => Err(format!("failed to parse send response: {err}")),
    }
}

#[async_trait]
impl SelectionSender for HttpSelectionSender {
    async fn send(&self, payload: &MessagePayload) -> Result<SendResponse, String> {
        let span = tracing::info_span!(
            "infra.messaging.send",
            url = %self.url,
            rows = payload.rows.len()
        );
        async {
            let start = Instant::now();
            let result = self.post(payload).await;
            let result_label = match &result {
                Ok(resp) if resp.is_success() => "ok",
                Ok(_) => "rejected",
                Err(_) => "err",
            };
            metrics::counter!("tickerdash.messaging.sends_total", "result" => result_label)
                .increment(1);
            metrics::histogram!("tickerdash.messaging.send_ms", "result" => result_label)
                .record(start.elapsed().as_millis() as f64);
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::parse_send_response;

    #[test]
    fn error_body_is_read_on_failure_status() {
        let resp = parse_send_response(400, r#"{"status":"error","message":"No stock data selected"}"#)
            .expect("parsed");
        assert!(!resp.is_success());
        assert_eq!(resp.message.as_deref(), Some("No stock data selected"));
    }

    #[test]
    fn success_body_and_unparseable_bodies() {
        let ok = parse_send_response(200, r#"{"status":"success","sid":"SM123"}"#).expect("parsed");
        assert!(ok.is_success());

        let gateway = parse_send_response(502, "<html>Bad Gateway</html>").expect("synthetic");
        assert_eq!(gateway.status, "error");
        assert_eq!(
            gateway.message.as_deref(),
            Some("messaging http error: status 502")
        );

        assert!(parse_send_response(200, "ok").is_err());
    }
}
