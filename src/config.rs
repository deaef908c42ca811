use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub geocoding: GeocodingConfig,
    /// Enables dangerous operations like reference import. Must never be true in production.
    pub test_mode: bool,
    /// Maximum request body size in bytes
    pub max_body_size: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Directory holding the embedded reference database
    pub data_dir: String,
    /// Optional JSON file with reference tables, loaded at startup
    pub reference_seed_file: Option<String>,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Azure,
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for local storage backend
    pub local_storage_path: String,
    /// Azure storage account name (required when backend is azure)
    pub azure_account: Option<String>,
    /// Base64 shared key for the storage account (required when backend is azure)
    pub azure_key: Option<String>,
    /// Bronze container name (required when backend is azure)
    pub bronze_container: Option<String>,
    /// Logical folder prefix for submission objects
    pub bronze_folder: String,
}

#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_storage_path: "./bronze".to_string(),
            azure_account: None,
            azure_key: None,
            bronze_container: None,
            bronze_folder: "vacancy-details".to_string(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let reference_seed_file = std::env::var("REFERENCE_SEED_FILE").ok();

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let max_body_size = std::env::var("MAX_BODY_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1024 * 1024); // 1MiB

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "azure" => StorageBackend::Azure,
            _ => StorageBackend::Local,
        };

        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./bronze".to_string());

        let azure_account = std::env::var("AZURE_STORAGE_ACCOUNT").ok();
        let azure_key = std::env::var("AZURE_STORAGE_KEY").ok();
        let bronze_container = std::env::var("BRONZE_CONTAINER").ok();
        let bronze_folder =
            std::env::var("BRONZE_FOLDER").unwrap_or_else(|_| "vacancy-details".to_string());

        let geocoding_enabled = std::env::var("GEOCODING_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        let geocoding_endpoint = std::env::var("GEOCODING_ENDPOINT")
            .unwrap_or_else(|_| "https://maps.googleapis.com/maps/api/geocode/json".to_string());
        let geocoding_api_key = std::env::var("GEOCODING_API_KEY").ok();

        let config = Config {
            server: ServerConfig {
                bind_address,
                data_dir,
                reference_seed_file,
            },
            storage: StorageConfig {
                backend: storage_backend,
                local_storage_path,
                azure_account,
                azure_key,
                bronze_container,
                bronze_folder,
            },
            geocoding: GeocodingConfig {
                enabled: geocoding_enabled,
                endpoint: geocoding_endpoint,
                api_key: geocoding_api_key,
            },
            test_mode,
            max_body_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.storage.backend, StorageBackend::Azure) {
            if self.storage.azure_account.is_none() {
                return Err(ConfigError::ValidationError(
                    "AZURE_STORAGE_ACCOUNT is required when STORAGE_BACKEND=azure".to_string(),
                ));
            }
            if self.storage.azure_key.is_none() {
                return Err(ConfigError::ValidationError(
                    "AZURE_STORAGE_KEY is required when STORAGE_BACKEND=azure".to_string(),
                ));
            }
            if self.storage.bronze_container.is_none() {
                return Err(ConfigError::ValidationError(
                    "BRONZE_CONTAINER is required when STORAGE_BACKEND=azure".to_string(),
                ));
            }
        }

        if self.geocoding.enabled && self.geocoding.api_key.is_none() {
            return Err(ConfigError::ValidationError(
                "GEOCODING_API_KEY is required unless GEOCODING_ENABLED=false".to_string(),
            ));
        }

        if self.storage.bronze_folder.is_empty() {
            return Err(ConfigError::ValidationError(
                "BRONZE_FOLDER cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
