use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite catalog database.
    pub db_path: PathBuf,
    /// OpenAI API key for the recommender. Optional: the catalog and crawler
    /// work without it, and the recommend page reports its absence instead.
    pub openai_api_key: Option<String>,
    /// Bind address for the web server.
    pub bind_address: String,
}

impl Config {
    pub fn from_env() -> Self {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let db_path = env::var("CATALOG_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("toysrus.db"));

        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let bind_address =
            env::var("CATALOG_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

        Self {
            db_path,
            openai_api_key,
            bind_address,
        }
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/toy-catalog/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("toy-catalog").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}
