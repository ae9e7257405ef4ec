//! Approval routing by item category

use crate::{config::ApprovalsConfig, models::Category};

#[derive(Clone)]
pub struct ApprovalRouter {
    config: ApprovalsConfig,
}

impl ApprovalRouter {
    pub fn new(config: ApprovalsConfig) -> Self {
        Self { config }
    }

    /// Approver queues a rental of this category must pass, in order.
    /// A blank queue id in configuration removes that gate.
    pub fn route(&self, category: Category) -> Vec<String> {
        let queue = match category {
            Category::Consumable => &self.config.consumable_queue,
            Category::Router | Category::Switch | Category::Wireless | Category::Transceiver => {
                &self.config.hardware_queue
            }
        };
        let queue = queue.trim();
        if queue.is_empty() {
            Vec::new()
        } else {
            vec![queue.to_string()]
        }
    }

    /// Mailbox notified about requests routed to `queue`, when configured
    pub fn queue_email(&self, queue: &str) -> Option<&str> {
        self.config
            .queue_emails
            .get(queue)
            .map(String::as_str)
            .filter(|e| !e.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumables_and_hardware_use_different_queues() {
        let router = ApprovalRouter::new(ApprovalsConfig::default());
        assert_eq!(router.route(Category::Consumable), vec!["product-team-manager"]);
        for category in [
            Category::Router,
            Category::Switch,
            Category::Wireless,
            Category::Transceiver,
        ] {
            assert_eq!(router.route(category), vec!["tech-manager"]);
        }
    }

    #[test]
    fn blank_queue_means_no_approval() {
        let router = ApprovalRouter::new(ApprovalsConfig {
            consumable_queue: " ".to_string(),
            ..ApprovalsConfig::default()
        });
        assert!(router.route(Category::Consumable).is_empty());
    }

    #[test]
    fn queue_email_lookup() {
        let mut config = ApprovalsConfig::default();
        config
            .queue_emails
            .insert("tech-manager".to_string(), "tech@example.com".to_string());
        let router = ApprovalRouter::new(config);
        assert_eq!(router.queue_email("tech-manager"), Some("tech@example.com"));
        assert_eq!(router.queue_email("product-team-manager"), None);
    }
}
