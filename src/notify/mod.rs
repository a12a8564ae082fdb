//! Notification dispatch seam.
//!
//! Delivery itself (mail, chat, whatever) lives outside this crate. The
//! assignment engine calls this trait after a successful ownership change;
//! a failed dispatch is logged and swallowed, never rolled back into the
//! storage mutation that triggered it.

use async_trait::async_trait;
use log::info;

#[async_trait]
pub trait NotificationDispatch: Send + Sync {
    async fn ticket_assigned(
        &self,
        ticket_number: &str,
        subject: &str,
        recipient_email: &str,
        actor_name: &str,
        message: &str,
    ) -> anyhow::Result<()>;
}

/// Default dispatcher: writes the event to the log and nothing else.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationDispatch for LogNotifier {
    async fn ticket_assigned(
        &self,
        ticket_number: &str,
        subject: &str,
        recipient_email: &str,
        actor_name: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        info!("notify {recipient_email}: [{ticket_number}] {subject} ({actor_name}): {message}");
        Ok(())
    }
}
