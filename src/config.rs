//! Configuration types.

use crate::error::ConfigError;

/// Engine configuration.
///
/// Defaults carry the production constants; `from_env()` applies
/// `OUTREACH_*` overrides for deployment-specific tuning.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Handle of the channel whose content is scanned (e.g. "@wiseoldowlshow").
    pub channel_handle: String,
    /// Call-to-action URL interpolated into every reply.
    pub outreach_url: String,
    /// Maximum replies posted per clock hour.
    pub hourly_limit: u32,
    /// Maximum replies posted per calendar day.
    pub daily_limit: u32,
    /// Comments shorter than this are skipped.
    pub min_comment_length: usize,
    /// Comments with more existing replies than this are skipped.
    pub max_existing_replies: u32,
    /// Pacing delay after each successful post, in minutes (min, max).
    pub pacing_minutes: (f64, f64),
    /// Keywords that make a comment worth replying to. Order matters:
    /// the first match in this order is the keyword used in the reply.
    pub keywords: Vec<String>,
    /// Days before the same author may be replied to again.
    pub cooldown_days: i64,
    /// How far back to enumerate content items, in days.
    pub lookback_days: i64,
    /// Maximum content items enumerated per run.
    pub max_items_per_run: u32,
    /// Maximum comments fetched per content item.
    pub max_comments_per_item: u32,
    /// Activity log retention (oldest entries dropped beyond this).
    pub activity_log_cap: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            channel_handle: "@wiseoldowlshow".to_string(),
            outreach_url: "https://tally.so/r/w4R8lb".to_string(),
            hourly_limit: 3,
            daily_limit: 15,
            min_comment_length: 5,
            max_existing_replies: 3,
            pacing_minutes: (5.0, 15.0),
            keywords: default_keywords(),
            cooldown_days: 7,
            lookback_days: 30,
            max_items_per_run: 50,
            max_comments_per_item: 50,
            activity_log_cap: 1000,
        }
    }
}

impl BotConfig {
    /// Build a config from defaults plus `OUTREACH_*` environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(handle) = std::env::var("OUTREACH_CHANNEL_HANDLE") {
            config.channel_handle = handle;
        }
        if let Ok(url) = std::env::var("OUTREACH_FORM_URL") {
            config.outreach_url = url;
        }
        if let Some(v) = env_parse("OUTREACH_HOURLY_LIMIT")? {
            config.hourly_limit = v;
        }
        if let Some(v) = env_parse("OUTREACH_DAILY_LIMIT")? {
            config.daily_limit = v;
        }
        if let Some(v) = env_parse("OUTREACH_MIN_COMMENT_LENGTH")? {
            config.min_comment_length = v;
        }
        if let Some(v) = env_parse("OUTREACH_MAX_EXISTING_REPLIES")? {
            config.max_existing_replies = v;
        }
        if let Some(v) = env_parse("OUTREACH_COOLDOWN_DAYS")? {
            config.cooldown_days = v;
        }
        if let Some(v) = env_parse("OUTREACH_LOOKBACK_DAYS")? {
            config.lookback_days = v;
        }
        if let Some(v) = env_parse("OUTREACH_MAX_ITEMS")? {
            config.max_items_per_run = v;
        }
        if let Some(min) = env_parse::<f64>("OUTREACH_PACING_MIN_MINUTES")? {
            config.pacing_minutes.0 = min;
        }
        if let Some(max) = env_parse::<f64>("OUTREACH_PACING_MAX_MINUTES")? {
            config.pacing_minutes.1 = max;
        }
        if let Ok(list) = std::env::var("OUTREACH_KEYWORDS") {
            config.keywords = list
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the run loop cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "OUTREACH_KEYWORDS".into(),
                message: "keyword list must not be empty".into(),
            });
        }
        if self.pacing_minutes.0 > self.pacing_minutes.1 || self.pacing_minutes.0 < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "OUTREACH_PACING_MIN_MINUTES".into(),
                message: format!(
                    "pacing range {}..{} is not a valid interval",
                    self.pacing_minutes.0, self.pacing_minutes.1
                ),
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

/// The production keyword list (mortgage/lending vertical).
fn default_keywords() -> Vec<String> {
    [
        "wealth",
        "renewal",
        "mortgage",
        "refinance",
        "equity",
        "money",
        "home",
        "purchase",
        "rate",
        "bank",
        "help",
        "loan",
        "lending",
        "credit",
        "debt",
        "payment",
        "interest",
        "approval",
        "qualify",
        "application",
        "broker",
        "lender",
        "closing",
        "downpayment",
        "preapproval",
        "amortization",
        "insurance",
        "property",
        "investment",
        "buyer",
        "seller",
        "realtor",
        "agent",
        "financing",
        "consolidation",
        "heloc",
        "line of credit",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_constants() {
        let config = BotConfig::default();
        assert_eq!(config.hourly_limit, 3);
        assert_eq!(config.daily_limit, 15);
        assert_eq!(config.min_comment_length, 5);
        assert_eq!(config.max_existing_replies, 3);
        assert_eq!(config.cooldown_days, 7);
        assert_eq!(config.pacing_minutes, (5.0, 15.0));
        assert_eq!(config.keywords.len(), 36);
        assert_eq!(config.keywords[0], "wealth");
    }

    #[test]
    fn keyword_order_is_stable() {
        let config = BotConfig::default();
        let renewal = config.keywords.iter().position(|k| k == "renewal").unwrap();
        let mortgage = config.keywords.iter().position(|k| k == "mortgage").unwrap();
        assert!(renewal < mortgage, "renewal must precede mortgage in list order");
    }

    #[test]
    fn empty_keywords_rejected() {
        let config = BotConfig {
            keywords: Vec::new(),
            ..BotConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_pacing_range_rejected() {
        let config = BotConfig {
            pacing_minutes: (10.0, 5.0),
            ..BotConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
