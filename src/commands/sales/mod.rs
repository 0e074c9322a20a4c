pub mod create_sales_rfq_line_command;

pub use create_sales_rfq_line_command::{CreateSalesRfqLineCommand, SalesRfqLineForm};
