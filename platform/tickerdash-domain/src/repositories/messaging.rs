use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub symbol: String,
    pub price: f64,
    pub datetime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub rows: Vec<MessageRow>,
}

impl MessagePayload {
    /// Human-readable body, one `SYMBOL | time | $price` line per row.
    pub fn body_text(&self) -> String {
        let lines: Vec<String> = self
            .rows
            .iter()
            .map(|r| format!("{} | {} | ${}", r.symbol, r.datetime, r.price))
            .collect();
        format!("📈 Selected Stock Data:\n{}", lines.join("\n"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl SendResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[async_trait]
pub trait SelectionSender: Send + Sync {
    async fn send(&self, payload: &MessagePayload) -> Result<SendResponse, String>;
}

#[cfg(test)]
mod tests {
    use super::{MessagePayload, MessageRow, SendResponse};

    #[test]
    fn body_text_lists_rows() {
        let payload = MessagePayload {
            rows: vec![
                MessageRow {
                    symbol: "AAPL".to_string(),
                    price: 187.5,
                    datetime: "10:00:05".to_string(),
                },
                MessageRow {
                    symbol: "MSFT".to_string(),
                    price: 410.0,
                    datetime: "10:00:05".to_string(),
                },
            ],
        };
        assert_eq!(
            payload.body_text(),
            "📈 Selected Stock Data:\nAAPL | 10:00:05 | $187.5\nMSFT | 10:00:05 | $410"
        );
    }

    #[test]
    fn send_response_parses_without_message() {
        let resp: SendResponse = serde_json::from_str(r#"{"status":"success","sid":"SM1"}"#)
            .expect("json");
        assert!(resp.is_success());
        assert_eq!(resp.message, None);
    }
}
