use serde::Serialize;
use tickerdash_domain::error::DashboardError;
use tickerdash_domain::services::time_format::date_time;
use tickerdash_domain::value_objects::symbol::Symbol;

pub const FETCH_ERROR_TEXT: &str = "Error fetching price. Please try again.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatAnswer {
    Price { symbol: Symbol, price: f64 },
    NotFound { symbol: Symbol },
    FetchError,
}

/// One exchange in the chat pane: the echoed question and the answer line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub user_line: String,
    pub reply_line: String,
    pub answer: ChatAnswer,
}

impl ChatReply {
    pub fn new(question: &str, answer: ChatAnswer, now_ms: i64) -> Self {
        let stamp = date_time(now_ms);
        let reply_line = match &answer {
            ChatAnswer::Price { symbol, price } => {
                format!("[{stamp}] {symbol} current price: ${price}")
            }
            ChatAnswer::NotFound { .. } => format!("[{stamp}] Symbol not found"),
            ChatAnswer::FetchError => FETCH_ERROR_TEXT.to_string(),
        };
        Self {
            user_line: format!("[{stamp}] You: {question}"),
            reply_line,
            answer,
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self.answer {
            ChatAnswer::Price { price, .. } => Some(price),
            _ => None,
        }
    }
}

/// Network trouble becomes the retry hint; everything else reads as "not found".
pub fn answer_for(symbol: Symbol, outcome: Result<Option<f64>, DashboardError>) -> ChatAnswer {
    match outcome {
        Ok(Some(price)) => ChatAnswer::Price { symbol, price },
        Ok(None) => ChatAnswer::NotFound { symbol },
        Err(DashboardError::NetworkFailure(_)) => ChatAnswer::FetchError,
        Err(_) => ChatAnswer::NotFound { symbol },
    }
}
