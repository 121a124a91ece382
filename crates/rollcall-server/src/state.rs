use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use tracing::info;

use rollcall_core::auth::TokenService;
use rollcall_core::export::SheetsClient;
use rollcall_core::import::GeminiClient;
use rollcall_core::{RosterStore, TermCalendar};

use crate::config::Config;

/// Shared handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RosterStore>,
    pub tokens: Arc<TokenService>,
    pub calendar: Arc<TermCalendar>,
    pub gemini: Option<GeminiClient>,
    pub sheets: Option<Arc<SheetsClient>>,
}

impl AppState {
    pub fn new(store: RosterStore, tokens: TokenService, calendar: TermCalendar) -> Self {
        Self {
            store: Arc::new(store),
            tokens: Arc::new(tokens),
            calendar: Arc::new(calendar),
            gemini: None,
            sheets: None,
        }
    }

    pub fn with_gemini(mut self, client: GeminiClient) -> Self {
        self.gemini = Some(client);
        self
    }

    pub fn with_sheets(mut self, client: SheetsClient) -> Self {
        self.sheets = Some(Arc::new(client));
        self
    }

    /// Open the store, load the calendar and build the optional clients.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = RosterStore::open(&config.database_path).with_context(|| {
            format!("Failed to open database at {}", config.database_path.display())
        })?;

        let calendar = match &config.calendar_path {
            Some(path) => TermCalendar::load(path)?,
            None => TermCalendar::default(),
        };

        let tokens = TokenService::new(&config.jwt_secret, Duration::hours(config.token_ttl_hours));
        let mut state = Self::new(store, tokens, calendar);

        if let Some(key) = &config.gemini_api_key {
            let client = GeminiClient::new(key.clone(), config.gemini_model.clone());
            info!(model = client.model(), "Gemini import enabled");
            state = state.with_gemini(client);
        }
        if let Some(credentials) = &config.sheets_credentials {
            let client = SheetsClient::new(credentials.clone());
            info!(account = client.client_email(), "Google Sheets export enabled");
            state = state.with_sheets(client);
        }

        Ok(state)
    }
}
