use std::path::PathBuf;

use crate::error::Result;

pub const NEWS_API_URL: &str = "https://newsapi.org/v2";
pub const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const RSS_SEARCH_URL: &str = "https://news.google.com/rss/search";

/// Lower bound passed to the RSS query's `after:` filter.
pub const RSS_QUERY_AFTER: &str = "2025-01-01";

/// Per-request HTTP timeout (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Courtesy delay between NewsAPI calls (milliseconds).
pub const NEWS_FETCH_DELAY_MS: u64 = 3_000;

/// How far back the news scraper looks on each run (days).
pub const NEWS_LOOKBACK_DAYS: i64 = 30;

/// NewsAPI source/domain allowlist, passed through verbatim.
pub const NEWS_SOURCES: &str =
    "handelsblatt,the-economist,business-insider,reuters,forbes,bloomberg,yahoo-finance";
pub const NEWS_DOMAINS: &str =
    "handelsblatt.de,businessinsider.de,reuters.com,forbes.com,bloomberg.com,finance.yahoo.com";

/// First run of the price scraper backfills from this date.
pub const DEFAULT_PRICE_START: (i32, u32, u32) = (2025, 1, 1);

/// Trailing windows for the derived feature columns (rows).
pub const SENTIMENT_WINDOW: usize = 7;
pub const VOLATILITY_WINDOW: usize = 7;
pub const ZSCORE_WINDOW: usize = 30;

/// Sentiment drop that trips the alert flag.
pub const ALERT_SENTIMENT_DROP: f64 = -0.3;

/// Maximum lag (rows) for the report's lagged cross-correlation.
pub const MAX_CORRELATION_LAG: i64 = 7;

/// Compound-score thresholds for the sentiment label.
pub mod label_thresholds {
    pub const POSITIVE_MIN: f64 = 0.1;
    pub const NEGATIVE_MAX: f64 = -0.1;
}

/// The tracked basket: (company name, Yahoo ticker).
pub const DAX_COMPANIES: &[(&str, &str)] = &[
    ("Adidas", "ADS.DE"),
    ("Airbus", "AIR.DE"),
    ("Allianz", "ALV.DE"),
    ("BASF", "BAS.DE"),
    ("Bayer", "BAYN.DE"),
    ("Beiersdorf", "BEI.DE"),
    ("BMW", "BMW.DE"),
    ("Brenntag", "BNR.DE"),
    ("Commerzbank", "CBK.DE"),
    ("Continental", "CON.DE"),
    ("Covestro", "1COV.DE"),
    ("Daimler Truck", "DTG.DE"),
    ("Delivery Hero", "DHER.DE"),
    ("Deutsche Bank", "DBK.DE"),
    ("Deutsche Börse", "DB1.DE"),
    ("Deutsche Post", "DHL.DE"),
    ("Deutsche Telekom", "DTE.DE"),
    ("Deutsche Wohnen", "DWNI.DE"),
    ("E.ON", "EOAN.DE"),
    ("Fresenius", "FRE.DE"),
    ("Fresenius Medical Care", "FME.DE"),
    ("Hannover Rück", "HNR1.DE"),
    ("Heidelberg Materials", "HEI.DE"),
    ("Hellofresh", "HFG.DE"),
    ("Henkel", "HEN3.DE"),
    ("Infineon", "IFX.DE"),
    ("Mercedes-Benz", "MBG.DE"),
    ("Merck", "MRK.DE"),
    ("MTU Aero Engines", "MTX.DE"),
    ("Münchener Rück", "MUV2.DE"),
    ("Porsche AG", "P911.DE"),
    ("Porsche SE", "PAH3.DE"),
    ("Qiagen", "QIA.DE"),
    ("Rheinmetall", "RHM.DE"),
    ("RWE", "RWE.DE"),
    ("SAP", "SAP.DE"),
    ("Sartorius", "SRT3.DE"),
    ("Siemens", "SIE.DE"),
    ("Siemens Energy", "ENR.DE"),
    ("Siemens Healthineers", "SHL.DE"),
    ("Volkswagen", "VOW3.DE"),
    ("Vonovia", "VNA.DE"),
    ("Zalando", "ZAL.DE"),
];

/// Runtime configuration, built once in main and passed into each stage.
/// All table paths derive from `data_dir` so a run can be pointed at any
/// directory without touching process-wide state.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_level: String,
    /// NewsAPI key (NEWS_API_KEY). With no key `scrape-news` is a no-op;
    /// the keyless `scrape-rss` stage still works.
    pub news_api_key: Option<String>,
    pub news_api_url: String,
    pub chart_api_url: String,
    pub rss_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            news_api_key: std::env::var("NEWS_API_KEY").ok().filter(|k| !k.is_empty()),
            news_api_url: std::env::var("NEWS_API_URL")
                .unwrap_or_else(|_| NEWS_API_URL.to_string()),
            chart_api_url: std::env::var("CHART_API_URL")
                .unwrap_or_else(|_| CHART_API_URL.to_string()),
            rss_url: std::env::var("RSS_URL").unwrap_or_else(|_| RSS_SEARCH_URL.to_string()),
        })
    }

    pub fn raw_data_dir(&self) -> PathBuf {
        self.data_dir.join("raw_data")
    }

    pub fn sentiment_dir(&self) -> PathBuf {
        self.data_dir.join("sentiment")
    }

    pub fn company_data_dir(&self) -> PathBuf {
        self.data_dir.join("company_data")
    }

    pub fn articles_file(&self) -> PathBuf {
        self.raw_data_dir().join("articles.csv")
    }

    pub fn prices_file(&self) -> PathBuf {
        self.raw_data_dir().join("stock_prices.csv")
    }

    pub fn full_sentiment_file(&self) -> PathBuf {
        self.sentiment_dir().join("full_sentiment.csv")
    }

    pub fn daily_sentiment_file(&self) -> PathBuf {
        self.sentiment_dir().join("daily_sentiment.csv")
    }

    pub fn weekly_sentiment_file(&self) -> PathBuf {
        self.sentiment_dir().join("weekly_sentiment.csv")
    }

    pub fn monthly_sentiment_file(&self) -> PathBuf {
        self.sentiment_dir().join("monthly_sentiment.csv")
    }
}
