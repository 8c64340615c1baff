//! Domain models and request payloads.

mod client;
mod invoice;
mod item;
mod line_item;
mod settings;

pub use client::{Client, ClientPayload};
pub use invoice::{
    CreateInvoicePayload, CreatedInvoice, Invoice, InvoiceSummary, PaymentStatus,
    ReplaceInvoicePayload, UpdatePaymentPayload,
};
pub use item::{
    InventoryPool, Item, ItemPayload, ItemWithStock, PoolPayload, SetActivePayload,
};
pub use line_item::{LineItem, LineItemDetail, LineItemPayload};
pub use settings::{BusinessSettings, SettingsPayload};
