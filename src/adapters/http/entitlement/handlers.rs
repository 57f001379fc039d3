//! HTTP handlers for entitlement endpoints.
//!
//! These handlers connect axum routes to application layer command/query
//! handlers. The webhook handler is the one odd one out: it always
//! answers 200, because PayPal retries any other status and a retry storm
//! on a bad payload helps nobody.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::entitlement::{
    AddSubscriberCommand, AddSubscriberHandler, AttemptEmailLinkCommand, AttemptEmailLinkHandler,
    AttemptEmailLinkResult, CheckAccessHandler, CheckAccessQuery, ExtendTrialCommand,
    ExtendTrialHandler, GetEntitlementStatsHandler, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, ListSubscribersHandler, ListTrialsHandler, RecordActivityCommand,
    RecordActivityHandler, SubscriptionReconciler, TrialLifecycle, TrialPolicy,
};
use crate::application::handlers::entitlement::ActivityKind;
use crate::domain::entitlement::{AccessReason, EntitlementError};
use crate::domain::foundation::UserId;
use crate::ports::{AnalyticsSink, EntitlementStore, PaymentVerifier};

use super::dto::{
    AccessCheckResponse, AddSubscriberRequest, AdminMutationResponse, BotMessageRequest,
    BotMessageResponse, CheckAccessRequest, ErrorResponse, ExtendTrialRequest, StatsResponse,
    SubscriberResponse, TrialResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; everything inside is Arc-wrapped or cheap.
#[derive(Clone)]
pub struct EntitlementAppState {
    pub store: Arc<dyn EntitlementStore>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub verifier: Arc<dyn PaymentVerifier>,
    pub trial_policy: TrialPolicy,
}

impl EntitlementAppState {
    /// Create handlers on demand from the shared state.
    fn trial_lifecycle(&self) -> TrialLifecycle {
        TrialLifecycle::new(self.store.clone(), self.trial_policy.clone())
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.store.clone(), self.trial_lifecycle())
    }

    pub fn link_handler(&self) -> AttemptEmailLinkHandler {
        AttemptEmailLinkHandler::new(self.store.clone())
    }

    pub fn activity_handler(&self) -> RecordActivityHandler {
        RecordActivityHandler::new(self.trial_lifecycle(), self.analytics.clone())
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        let reconciler = Arc::new(SubscriptionReconciler::new(
            self.store.clone(),
            self.analytics.clone(),
        ));
        HandlePaymentWebhookHandler::new(reconciler, self.verifier.clone())
    }

    pub fn extend_trial_handler(&self) -> ExtendTrialHandler {
        ExtendTrialHandler::new(self.trial_lifecycle())
    }

    pub fn add_subscriber_handler(&self) -> AddSubscriberHandler {
        AddSubscriberHandler::new(self.store.clone())
    }

    pub fn stats_handler(&self) -> GetEntitlementStatsHandler {
        GetEntitlementStatsHandler::new(self.store.clone())
    }

    pub fn list_trials_handler(&self) -> ListTrialsHandler {
        ListTrialsHandler::new(self.store.clone())
    }

    pub fn list_subscribers_handler(&self) -> ListSubscribersHandler {
        ListSubscribersHandler::new(self.store.clone())
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, EntitlementApiError> {
    UserId::new(raw)
        .map_err(|e| EntitlementApiError(EntitlementError::validation("user_id", e.to_string())))
}

// ════════════════════════════════════════════════════════════════════════════════
// Bot Facade
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/bot/message - run one chat message through the entitlement
/// pipeline.
///
/// Order matters: a link attempt is honored even for users whose trial
/// already ran out, because linking is exactly what a lapsed user needs
/// to do. Only messages from allowed users count against the trial.
pub async fn handle_bot_message(
    State(state): State<EntitlementAppState>,
    Json(request): Json<BotMessageRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let user_id = parse_user_id(&request.user_id)?;

    let link_result = state
        .link_handler()
        .handle(AttemptEmailLinkCommand {
            user_id: user_id.clone(),
            text: request.text.clone(),
        })
        .await?;

    match link_result {
        AttemptEmailLinkResult::Linked { message } => {
            return Ok(Json(BotMessageResponse {
                respond: false,
                message: Some(message),
                reason: AccessReason::Subscription,
            }));
        }
        AttemptEmailLinkResult::NotLinked { message } => {
            // Still an email, so it was a link attempt; answer it as one
            // rather than forwarding an email address to the tutor.
            let verdict = state
                .check_access_handler()
                .handle(CheckAccessQuery {
                    user_id,
                    org_code: request.org_code,
                })
                .await;
            return Ok(Json(BotMessageResponse {
                respond: false,
                message: Some(message),
                reason: verdict.reason,
            }));
        }
        AttemptEmailLinkResult::NotAnEmail => {}
    }

    let verdict = state
        .check_access_handler()
        .handle(CheckAccessQuery {
            user_id: user_id.clone(),
            org_code: request.org_code,
        })
        .await;

    if !verdict.allowed {
        return Ok(Json(BotMessageResponse {
            respond: false,
            message: Some(verdict.message),
            reason: verdict.reason,
        }));
    }

    state
        .activity_handler()
        .handle(RecordActivityCommand {
            user_id,
            kind: ActivityKind::Message,
        })
        .await?;

    // A brand-new trial user gets the welcome text alongside the lesson.
    let message = match verdict.reason {
        AccessReason::NewTrial => Some(verdict.message),
        _ => None,
    };

    Ok(Json(BotMessageResponse {
        respond: true,
        message,
        reason: verdict.reason,
    }))
}

/// POST /api/entitlements/check - standalone access decision.
pub async fn check_access(
    State(state): State<EntitlementAppState>,
    Json(request): Json<CheckAccessRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let user_id = parse_user_id(&request.user_id)?;

    let verdict = state
        .check_access_handler()
        .handle(CheckAccessQuery {
            user_id,
            org_code: request.org_code,
        })
        .await;

    Ok(Json(AccessCheckResponse::from(verdict)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Ingress
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/paypal - handle PayPal webhook events.
///
/// Always returns 200 with an ack body; failures are logged server-side.
pub async fn handle_paypal_webhook(
    State(state): State<EntitlementAppState>,
    body: String,
) -> impl IntoResponse {
    let ack = state
        .webhook_handler()
        .handle(HandlePaymentWebhookCommand { body })
        .await;

    (StatusCode::OK, Json(ack))
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/admin/stats - aggregate counts.
pub async fn get_stats(
    State(state): State<EntitlementAppState>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let stats = state.stats_handler().handle().await?;
    Ok(Json(StatsResponse::from(stats)))
}

/// GET /api/admin/trials - all trial records.
pub async fn list_trials(
    State(state): State<EntitlementAppState>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let trials = state.list_trials_handler().handle().await?;
    let response: Vec<TrialResponse> = trials.into_iter().map(TrialResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/admin/subscribers - all subscriber records.
pub async fn list_subscribers(
    State(state): State<EntitlementAppState>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let subscribers = state.list_subscribers_handler().handle().await?;
    let response: Vec<SubscriberResponse> = subscribers
        .into_iter()
        .map(SubscriberResponse::from)
        .collect();
    Ok(Json(response))
}

/// POST /api/admin/trials/extend - push a trial's end date forward.
pub async fn extend_trial(
    State(state): State<EntitlementAppState>,
    Json(request): Json<ExtendTrialRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let user_id = parse_user_id(&request.user_id)?;

    let applied = state
        .extend_trial_handler()
        .handle(ExtendTrialCommand {
            user_id,
            extra_days: request.extra_days,
        })
        .await?;

    Ok(Json(AdminMutationResponse { applied }))
}

/// POST /api/admin/subscribers - manually record a subscriber.
pub async fn add_subscriber(
    State(state): State<EntitlementAppState>,
    Json(request): Json<AddSubscriberRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let applied = state
        .add_subscriber_handler()
        .handle(AddSubscriberCommand {
            email: request.email,
            subscription_id: request.subscription_id,
        })
        .await?;

    let status = if applied {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AdminMutationResponse { applied })))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts entitlement errors to HTTP responses.
pub struct EntitlementApiError(EntitlementError);

impl From<EntitlementError> for EntitlementApiError {
    fn from(err: EntitlementError) -> Self {
        Self(err)
    }
}

impl IntoResponse for EntitlementApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = match &self.0 {
            EntitlementError::ValidationFailed { .. } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED")
            }
            EntitlementError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = ErrorResponse::new(error_code, self.0.to_string());
        (status, Json(body)).into_response()
    }
}
