pub mod customer;
pub mod job_sheet;
pub mod payment;
pub mod status_history;
