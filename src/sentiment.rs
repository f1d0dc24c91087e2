//! Game-over commentary
//!
//! After a session ends, an external generator is asked for a one-liner
//! about the result. The call is best effort: one attempt, awaited outside the
//! tick loop, and any failure turns into fixed fallback text.

use thiserror::Error;

/// Shown before the first session
pub const AWAITING_TEXT: &str = "Awaiting Order Initialization...";
/// Shown while the generator is working
pub const PENDING_TEXT: &str = "Liquidation event triggered.";
/// Used when the generator fails
pub const FALLBACK_TEXT: &str = "Liquidation imminent. Protocol error.";
/// Used when the generator answers with nothing
pub const EMPTY_TEXT: &str = "Market is volatile. Keep trading.";

/// Errors a sentiment generator can report
#[derive(Debug, Error)]
pub enum SentimentError {
    /// The request never reached the generator
    #[error("transport error: {0}")]
    Transport(String),

    /// The generator did not answer in time
    #[error("timed out after {ms} ms")]
    Timeout { ms: u64 },

    /// The generator answered with an error
    #[error("generator error {status}: {message}")]
    Api { status: u16, message: String },

    /// No generator is configured
    #[error("no sentiment generator available")]
    Unavailable,
}

/// The numbers a commentary request is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentRequest {
    pub final_score: u64,
    /// Best score before this session was recorded
    pub prior_high: u64,
}

/// An asynchronous commentary generator
pub trait SentimentSource {
    fn market_sentiment(
        &self,
        score: u64,
        high_score: u64,
    ) -> impl Future<Output = Result<String, SentimentError>>;
}

/// Ask `source` for commentary, substituting fallback text on failure
pub async fn resolve<S: SentimentSource>(source: &S, request: SentimentRequest) -> String {
    match source
        .market_sentiment(request.final_score, request.prior_high)
        .await
    {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                EMPTY_TEXT.to_string()
            } else {
                text.to_string()
            }
        }
        Err(e) => {
            log::warn!("Sentiment generator failed: {}", e);
            FALLBACK_TEXT.to_string()
        }
    }
}

/// Instructions handed to a remote text generator
pub fn prompt(score: u64, high_score: u64) -> String {
    format!(
        "You are a high-stakes, slightly toxic but charismatic perp trader. \
         A player just finished a round of HYSLASH.\n\
         Their score: {score}.\n\
         All-time high score: {high_score}.\n\n\
         Give a short (1-2 sentences) \"Market Sentiment\" commentary on their performance. \
         If the score is low, roast them for being mid-curve or getting liquidated. \
         If it is high, praise them as a giga-whale or LP king. \
         Use trading terms like purps, funding rates, L1, sub-millisecond, orders. \
         Keep it punchy for a social post."
    )
}

/// Offline generator that picks a canned line by performance
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedSentiment;

impl CannedSentiment {
    pub fn line(score: u64, high_score: u64) -> &'static str {
        if score == 0 {
            "Zero fills. Did you even connect your wallet?"
        } else if score >= high_score {
            "Giga-whale behaviour. The order book bows to you."
        } else if score * 2 >= high_score {
            "Respectable size, but funding rates ate your lunch."
        } else {
            "Mid-curve execution. Liquidated before the candle closed."
        }
    }
}

impl SentimentSource for CannedSentiment {
    async fn market_sentiment(&self, score: u64, high_score: u64) -> Result<String, SentimentError> {
        Ok(Self::line(score, high_score).to_string())
    }
}
