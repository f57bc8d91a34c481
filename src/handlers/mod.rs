pub mod customers;
pub mod job_sheets;
pub mod payments;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub job_sheets: Arc<crate::services::JobSheetService>,
    pub payments: Arc<crate::services::PaymentService>,
    pub customers: Arc<crate::services::CustomerService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let job_sheets = Arc::new(crate::services::JobSheetService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let payments = Arc::new(crate::services::PaymentService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let customers = Arc::new(crate::services::CustomerService::new(
            db_pool,
            Some(event_sender),
        ));

        Self {
            job_sheets,
            payments,
            customers,
        }
    }
}
