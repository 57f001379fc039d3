//! Attempt email link command handler.
//!
//! The chat front-end runs every inbound message through this handler
//! first: if the text looks like an email address, the user is trying to
//! link their payment identity. Anything that is not an email passes
//! through to the tutor untouched.

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementError, IdentityLink};
use crate::domain::foundation::{EmailAddress, UserId};
use crate::ports::EntitlementStore;

/// Command: a chat message that may be a link attempt.
#[derive(Debug, Clone)]
pub struct AttemptEmailLinkCommand {
    pub user_id: UserId,
    pub text: String,
}

/// What became of a message offered to the linker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptEmailLinkResult {
    /// The text was not an email; let the tutor answer it.
    NotAnEmail,
    /// Linked to an active subscription. Carries the reply to send.
    Linked { message: String },
    /// The email matched no subscriber, or one without paid access.
    /// Carries the reply to send.
    NotLinked { message: String },
}

/// Handler that links a chat user to a payment email.
pub struct AttemptEmailLinkHandler {
    store: Arc<dyn EntitlementStore>,
}

impl AttemptEmailLinkHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// Tries to interpret the message as a link attempt.
    ///
    /// Links only to subscribers whose status grants access; a cancelled
    /// subscriber's email gets a "not active" reply instead of a link.
    /// Repeating the same email is idempotent, and a new email simply
    /// replaces the old link (last link wins).
    pub async fn handle(
        &self,
        command: AttemptEmailLinkCommand,
    ) -> Result<AttemptEmailLinkResult, EntitlementError> {
        if !EmailAddress::is_valid_format(command.text.trim()) {
            return Ok(AttemptEmailLinkResult::NotAnEmail);
        }

        let email = EmailAddress::parse(&command.text)
            .map_err(|e| EntitlementError::validation("email", e.to_string()))?;

        let subscriber = self
            .store
            .get_subscriber(&email)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        let mut subscriber = match subscriber {
            Some(subscriber) => subscriber,
            None => {
                tracing::info!(user_id = %command.user_id, email = %email, "Link attempt: no subscriber for email");
                return Ok(AttemptEmailLinkResult::NotLinked {
                    message: format!(
                        "I couldn't find a subscription for {}. Check the email you \
                         paid with and try again.",
                        email
                    ),
                });
            }
        };

        if !subscriber.grants_access() {
            tracing::info!(
                user_id = %command.user_id,
                email = %email,
                status = ?subscriber.status,
                "Link attempt: subscription not active"
            );
            return Ok(AttemptEmailLinkResult::NotLinked {
                message: format!(
                    "The subscription for {} is not active. Renew it and send me \
                     the email again.",
                    email
                ),
            });
        }

        // Both directions are written so either lookup path finds the pair.
        subscriber.link_user(command.user_id.clone());
        self.store
            .put_subscriber(subscriber)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;
        self.store
            .put_link(IdentityLink::new(command.user_id.clone(), email.clone()))
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        tracing::info!(user_id = %command.user_id, email = %email, "User linked to subscription");
        Ok(AttemptEmailLinkResult::Linked {
            message: "Your subscription is linked. Enjoy your lessons!".to_string(),
        })
    }
}
