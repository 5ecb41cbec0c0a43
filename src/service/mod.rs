//! Service layer: the only callers of the store traits.

pub mod cart;
pub mod catalog;
pub mod orders;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use orders::{InvoiceConfig, OrderService};
