pub mod clients;
pub mod invoices;
pub mod items;
pub mod pools;
pub mod settings;

use serde::Deserialize;

/// Query string for the autocomplete search endpoints.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}
