pub const OPENAI_API_VERSION: &str = "2023-05-15";
pub const EMBEDDING_DEPLOYMENT: &str = "demo-embedding";
pub const CHAT_DEPLOYMENT: &str = "demo-alfredo";

pub const SEARCH_API_VERSION: &str = "2023-11-01";
pub const SEARCH_TOP_K: usize = 5;
/// Output size of text-embedding-ada-002.
pub const EMBEDDING_DIMENSIONS: usize = 1536;

// Free-tier (S0) embedding quota is 20 requests per minute.
pub const MAX_DOCUMENTS: usize = 10;
pub const CHUNK_SIZE: usize = 800;
pub const REQUEST_DELAY_SECS: f64 = 4.0;
pub const RATE_LIMIT_COOLDOWN_SECS: f64 = 60.0;
pub const ERROR_COOLDOWN_SECS: f64 = 10.0;
pub const VERIFICATION_QUERY: &str = "best wine";

pub const MAX_TOKENS: u32 = 500;
pub const TEMPERATURE: f64 = 0.7;
pub const SYSTEM_PROMPT: &str =
    "Assistant is a chatbot that helps you find the best wine for your taste.";

pub const HOST: &str = "0.0.0.0";
pub const PORT: u16 = 8000;

pub fn csv_candidates() -> Vec<String> {
    vec![
        "wine-ratings.csv".to_string(),
        "examples/1-setup-application/wine-ratings.csv".to_string(),
        "data/wine-ratings.csv".to_string(),
    ]
}

pub fn local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:8000".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:8000".to_string(),
    ]
}
