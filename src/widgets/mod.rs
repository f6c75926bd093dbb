//! Widget modules for dashboard pages

pub mod modality_chart;
pub mod procurement_table;
pub mod stat_card;

pub use modality_chart::ModalityChart;
pub use procurement_table::ProcurementTable;
pub use stat_card::StatCard;
