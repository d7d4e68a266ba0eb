//! Notification Dispatcher
//!
//! Maps order events to notification/email sends and delivers them on a
//! detached task. Delivery is best-effort: failures are logged and never
//! surfaced to the operation that triggered them.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use shared::models::{ActorRole, Order, OrderStatus};
use thiserror::Error;

/// Delivery failure reported by a notifier or mailer
#[derive(Debug, Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

/// Notification priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// In-app notification send
#[derive(Debug, Clone)]
pub struct NotificationSend {
    /// Recipient user ID
    pub recipient: String,
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub priority: Priority,
}

/// Templated email send
#[derive(Debug, Clone)]
pub struct EmailSend {
    pub to: String,
    pub subject: String,
    pub template: &'static str,
    pub data: serde_json::Value,
}

/// One outbound side effect of an order event
#[derive(Debug, Clone)]
pub enum Outbound {
    Notification(NotificationSend),
    Email(EmailSend),
}

/// Order event driving notification side effects
#[derive(Debug, Clone)]
pub enum OrderEvent {
    Created,
    StatusUpdated { status: OrderStatus },
    PaymentCompleted,
    Cancelled { initiator: ActorRole },
    Refunded { amount: f64 },
}

/// Recipient context resolved by the orchestrator
#[derive(Debug, Clone)]
pub struct NotifyContext<'a> {
    pub order: &'a Order,
    pub buyer_email: &'a str,
    /// Owner user ID of the seller profile
    pub seller_user: &'a str,
    pub seller_email: &'a str,
}

/// In-app notification channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, send: NotificationSend) -> Result<(), NotifyError>;
}

/// Templated email channel
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, send: EmailSend) -> Result<(), NotifyError>;
}

fn order_data(order: &Order) -> serde_json::Value {
    json!({
        "order_id": order.id,
        "order_number": order.order_number,
        "total": order.total,
    })
}

/// Pure mapping from an order event to its outbound sends
pub fn build_messages(event: &OrderEvent, ctx: &NotifyContext<'_>) -> Vec<Outbound> {
    let order = ctx.order;
    let data = order_data(order);
    let number = &order.order_number;

    match event {
        OrderEvent::Created => vec![
            Outbound::Notification(NotificationSend {
                recipient: order.buyer.clone(),
                kind: "order_created",
                title: "Order Placed".to_string(),
                message: format!("Your order {} has been placed", number),
                data: data.clone(),
                priority: Priority::Normal,
            }),
            Outbound::Email(EmailSend {
                to: ctx.buyer_email.to_string(),
                subject: format!("Order Confirmation - {}", number),
                template: "order-placed",
                data: data.clone(),
            }),
            Outbound::Notification(NotificationSend {
                recipient: ctx.seller_user.to_string(),
                kind: "order_created",
                title: "New Order".to_string(),
                message: format!("You have received a new order {}", number),
                data: data.clone(),
                priority: Priority::High,
            }),
            Outbound::Email(EmailSend {
                to: ctx.seller_email.to_string(),
                subject: format!("New Order - {}", number),
                template: "new-order",
                data,
            }),
        ],
        OrderEvent::StatusUpdated { status } => {
            let mut sends = vec![Outbound::Notification(NotificationSend {
                recipient: order.buyer.clone(),
                kind: "order_status_updated",
                title: "Order Update".to_string(),
                message: format!("Your order {} is now {}", number, status),
                data: data.clone(),
                priority: Priority::Normal,
            })];
            let template = match status {
                OrderStatus::Shipped => Some("order-shipped"),
                OrderStatus::Delivered => Some("order-delivered"),
                OrderStatus::Completed => Some("order-completed"),
                _ => None,
            };
            if let Some(template) = template {
                sends.push(Outbound::Email(EmailSend {
                    to: ctx.buyer_email.to_string(),
                    subject: format!("Order {} - {}", number, status),
                    template,
                    data,
                }));
            }
            sends
        }
        OrderEvent::PaymentCompleted => vec![
            Outbound::Notification(NotificationSend {
                recipient: order.buyer.clone(),
                kind: "payment_completed",
                title: "Payment Received".to_string(),
                message: format!("Payment for order {} has been received", number),
                data: data.clone(),
                priority: Priority::Normal,
            }),
            Outbound::Notification(NotificationSend {
                recipient: ctx.seller_user.to_string(),
                kind: "payment_completed",
                title: "Payment Received".to_string(),
                message: format!("Payment for order {} has been received", number),
                data,
                priority: Priority::Normal,
            }),
        ],
        OrderEvent::Cancelled { initiator } => {
            // Notify whichever party did not initiate the cancellation
            let mut sends = Vec::new();
            if *initiator != ActorRole::Buyer {
                sends.push(Outbound::Notification(NotificationSend {
                    recipient: order.buyer.clone(),
                    kind: "order_cancelled",
                    title: "Order Cancelled".to_string(),
                    message: format!("Your order {} has been cancelled", number),
                    data: data.clone(),
                    priority: Priority::High,
                }));
            }
            if *initiator != ActorRole::Seller {
                sends.push(Outbound::Notification(NotificationSend {
                    recipient: ctx.seller_user.to_string(),
                    kind: "order_cancelled",
                    title: "Order Cancelled".to_string(),
                    message: format!("Order {} has been cancelled", number),
                    data,
                    priority: Priority::High,
                }));
            }
            sends
        }
        OrderEvent::Refunded { amount } => vec![
            Outbound::Notification(NotificationSend {
                recipient: order.buyer.clone(),
                kind: "order_refunded",
                title: "Refund Issued".to_string(),
                message: format!("A refund of {:.2} has been issued for order {}", amount, number),
                data: data.clone(),
                priority: Priority::High,
            }),
            Outbound::Email(EmailSend {
                to: ctx.buyer_email.to_string(),
                subject: format!("Refund Issued - {}", number),
                template: "order-refunded",
                data,
            }),
        ],
    }
}

/// Best-effort delivery of outbound sends on a detached task
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, mailer: Arc<dyn Mailer>) -> Self {
        Self { notifier, mailer }
    }

    /// Deliver all sends without blocking the caller
    ///
    /// Failures are logged and swallowed; the returned handle exists so
    /// tests can await completion.
    pub fn dispatch(&self, messages: Vec<Outbound>) -> tokio::task::JoinHandle<()> {
        let notifier = self.notifier.clone();
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            let sends = messages.into_iter().map(|outbound| {
                let notifier = notifier.clone();
                let mailer = mailer.clone();
                async move {
                    match outbound {
                        Outbound::Notification(send) => {
                            let recipient = send.recipient.clone();
                            let kind = send.kind;
                            if let Err(e) = notifier.notify(send).await {
                                tracing::warn!(
                                    error = %e,
                                    recipient = %recipient,
                                    kind = %kind,
                                    "notification delivery failed"
                                );
                            }
                        }
                        Outbound::Email(send) => {
                            let to = send.to.clone();
                            let template = send.template;
                            if let Err(e) = mailer.send(send).await {
                                tracing::warn!(
                                    error = %e,
                                    to = %to,
                                    template = %template,
                                    "email delivery failed"
                                );
                            }
                        }
                    }
                }
            });
            futures::future::join_all(sends).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;
    use shared::models::{Address, PaymentInfo, PaymentStatus};

    fn test_order() -> Order {
        Order {
            id: Some("order-1".to_string()),
            order_number: "ESM12345678".to_string(),
            buyer: "user-buyer".to_string(),
            seller: "seller-1".to_string(),
            items: Vec::new(),
            status: OrderStatus::Pending,
            billing_address: test_address(),
            shipping_address: None,
            payment: PaymentInfo {
                method: "card".to_string(),
                amount: 1180.0,
                currency: "INR".to_string(),
                status: PaymentStatus::Pending,
                transaction_id: None,
                paid_at: None,
                refund_amount: None,
                refund_reason: None,
                payout_status: None,
            },
            subtotal: 1000.0,
            tax: 180.0,
            shipping_fee: 0.0,
            discount: 0.0,
            total: 1180.0,
            platform_fee: 50.0,
            seller_payout: 950.0,
            coupon_code: None,
            notes: None,
            is_service_order: false,
            service_schedule: None,
            status_history: Vec::new(),
            cancellation_reason: None,
            tracking_info: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_address() -> Address {
        Address {
            full_name: "Test Buyer".to_string(),
            line1: "1 Main Road".to_string(),
            line2: None,
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: "411001".to_string(),
            country: "IN".to_string(),
            phone: None,
        }
    }

    fn ctx(order: &Order) -> NotifyContext<'_> {
        NotifyContext {
            order,
            buyer_email: "buyer@example.com",
            seller_user: "user-seller",
            seller_email: "seller@example.com",
        }
    }

    fn notifications(messages: &[Outbound]) -> Vec<&NotificationSend> {
        messages
            .iter()
            .filter_map(|m| match m {
                Outbound::Notification(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn emails(messages: &[Outbound]) -> Vec<&EmailSend> {
        messages
            .iter()
            .filter_map(|m| match m {
                Outbound::Email(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_created_notifies_both_parties() {
        let order = test_order();
        let messages = build_messages(&OrderEvent::Created, &ctx(&order));
        assert_eq!(messages.len(), 4);

        let notes = notifications(&messages);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].recipient, "user-buyer");
        assert_eq!(notes[0].title, "Order Placed");
        assert_eq!(notes[1].recipient, "user-seller");
        assert_eq!(notes[1].title, "New Order");

        let mails = emails(&messages);
        assert_eq!(mails[0].to, "buyer@example.com");
        assert_eq!(mails[0].template, "order-placed");
        assert_eq!(mails[1].to, "seller@example.com");
        assert_eq!(mails[1].template, "new-order");
    }

    #[test]
    fn test_status_update_email_only_for_fulfillment_statuses() {
        let order = test_order();
        for (status, expect_email) in [
            (OrderStatus::Processing, false),
            (OrderStatus::Confirmed, false),
            (OrderStatus::Shipped, true),
            (OrderStatus::Delivered, true),
            (OrderStatus::Completed, true),
        ] {
            let messages = build_messages(&OrderEvent::StatusUpdated { status }, &ctx(&order));
            assert_eq!(notifications(&messages).len(), 1);
            assert_eq!(emails(&messages).len(), usize::from(expect_email), "{}", status);
        }
    }

    #[test]
    fn test_cancelled_notifies_only_non_initiator() {
        let order = test_order();

        let by_buyer =
            build_messages(&OrderEvent::Cancelled { initiator: ActorRole::Buyer }, &ctx(&order));
        let notes = notifications(&by_buyer);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].recipient, "user-seller");

        let by_seller =
            build_messages(&OrderEvent::Cancelled { initiator: ActorRole::Seller }, &ctx(&order));
        let notes = notifications(&by_seller);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].recipient, "user-buyer");

        let by_admin =
            build_messages(&OrderEvent::Cancelled { initiator: ActorRole::Admin }, &ctx(&order));
        assert_eq!(notifications(&by_admin).len(), 2);
    }

    #[test]
    fn test_refunded_goes_to_buyer_with_email() {
        let order = test_order();
        let messages = build_messages(&OrderEvent::Refunded { amount: 500.0 }, &ctx(&order));
        let notes = notifications(&messages);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].recipient, "user-buyer");
        assert!(notes[0].message.contains("500.00"));
        assert_eq!(emails(&messages)[0].template, "order-refunded");
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _send: NotificationSend) -> Result<(), NotifyError> {
            Err(NotifyError("notification channel down".to_string()))
        }
    }

    struct RecordingMailer {
        sent: Mutex<Vec<EmailSend>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, send: EmailSend) -> Result<(), NotifyError> {
            self.sent.lock().push(send);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let mailer = Arc::new(RecordingMailer { sent: Mutex::new(Vec::new()) });
        let dispatcher = NotificationDispatcher::new(Arc::new(FailingNotifier), mailer.clone());

        let order = test_order();
        let messages = build_messages(&OrderEvent::Created, &ctx(&order));
        dispatcher.dispatch(messages).await.unwrap();

        // Notifications all failed, emails were still delivered
        assert_eq!(mailer.sent.lock().len(), 2);
    }
}
