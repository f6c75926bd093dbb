//! PNCP API integration
//!
//! Wire types, modality codes and the HTTP client for the national
//! procurement portal.

pub mod modality;
pub mod models;
pub mod pncp;

pub use modality::Modality;
pub use models::{portal_link, FetchedProcurement, RawProcurement};
pub use pncp::{PncpClient, PncpError, ProcurementSource, SearchQuery};
