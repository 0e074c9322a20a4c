//! Service layer consumed by the HTTP handlers and the task worker.

pub mod items;
pub mod notes;
pub mod purchase_orders;
pub mod release;
pub mod sales;
pub mod saved_views;
pub mod schedule;
pub mod suppliers;
pub mod users;
