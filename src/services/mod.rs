// Core services
pub mod job_sheets;
pub mod payments;

// Customer Management
pub mod customers;

pub use customers::CustomerService;
pub use job_sheets::JobSheetService;
pub use payments::PaymentService;
