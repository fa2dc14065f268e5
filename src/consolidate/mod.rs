//! Record consolidation: merges contractor job spreadsheets into one table
//! and suppresses repeat inspections of the same work order.

mod aggregate;
mod dedup;
mod error;
mod record;
mod schema;
mod table;
mod work_order;

pub use aggregate::{JobSource, SourceSheet, aggregate, single_spreadsheet};
pub use dedup::{MIN_GAP_SECONDS, remove_close_inspections};
pub use error::ConsolidateError;
pub use record::{InspectionRecord, parse_inspection_date, parse_inspection_time};
pub use schema::{Column, headers, positional_row};
pub use table::ConsolidatedTable;
pub use work_order::WorkOrderPattern;
