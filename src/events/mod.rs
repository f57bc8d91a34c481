use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Job sheet events
    JobSheetCreated(Uuid),
    JobSheetUpdated(Uuid),
    JobSheetStatusChanged {
        job_sheet_id: Uuid,
        from_status: String,
        to_status: String,
    },

    // Payment events
    PaymentRecorded {
        payment_id: Uuid,
        job_sheet_id: Uuid,
        amount: Decimal,
    },

    // Customer events
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
}

// Function to process incoming events and distribute them to interested parties.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::JobSheetCreated(job_sheet_id) => {
                if let Err(e) = handle_job_sheet_created(job_sheet_id).await {
                    warn!(
                        "Failed to handle job sheet created event: job_sheet_id={}, error={}",
                        job_sheet_id, e
                    );
                }
            }
            Event::JobSheetUpdated(job_sheet_id) => {
                info!("Job sheet updated: {}", job_sheet_id);
            }
            Event::JobSheetStatusChanged {
                job_sheet_id,
                from_status,
                to_status,
            } => {
                info!(
                    "Job sheet {} moved from {} to {}",
                    job_sheet_id, from_status, to_status
                );
            }
            Event::PaymentRecorded {
                payment_id,
                job_sheet_id,
                amount,
            } => {
                info!(
                    "Payment {} of {} recorded against job sheet {}",
                    payment_id, amount, job_sheet_id
                );
            }
            Event::CustomerCreated(customer_id) => {
                info!("Customer created: {}", customer_id);
            }
            Event::CustomerUpdated(customer_id) => {
                info!("Customer updated: {}", customer_id);
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Handler functions for specific events
async fn handle_job_sheet_created(job_sheet_id: Uuid) -> Result<(), String> {
    // Intake notifications (SMS, receipt printing) hook in here once those
    // integrations land.
    info!("Processing job sheet created event for {}", job_sheet_id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_the_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender.send(Event::JobSheetCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::JobSheetCreated(received)) => assert_eq!(received, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_once_the_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let sender = EventSender::new(tx);
        let result = sender.send(Event::CustomerCreated(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
