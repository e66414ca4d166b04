//! ConfirmPaymentHandler - Command handler for reconciling gateway callbacks.

use std::sync::Arc;

use tracing::{error, warn};

use crate::application::handlers::MAX_UPDATE_ATTEMPTS;
use crate::domain::event::{
    AdmitOutcome, AttendeeRecord, IntentState, RegistrationError, RegistrationEvent,
};
use crate::domain::foundation::{
    DomainEventId, ErrorCode, EventId, SerializableDomainEvent, Timestamp, UserId,
};
use crate::ports::{
    CallbackKind, EventPublisher, EventRepository, GatewayErrorCode, Notification,
    NotificationDispatcher, NotificationKind, PaymentGateway,
};

/// Command to process a gateway callback.
#[derive(Debug, Clone)]
pub struct ConfirmPaymentCommand {
    /// Raw callback payload.
    pub payload: Vec<u8>,
    /// Callback signature header.
    pub signature: String,
}

/// Result of callback processing.
#[derive(Debug, Clone)]
pub enum ConfirmPaymentResult {
    /// Payment confirmed and the registration seated.
    Seated { event_id: EventId, user_id: UserId },

    /// Duplicate confirmation; the registration was already seated.
    AlreadyProcessed,

    /// Payment failed; the intent was marked accordingly.
    PaymentMarkedFailed { reference: String },

    /// Callback acknowledged but no action taken.
    Acknowledged,

    /// Callback ignored (unknown type or unknown reference).
    Ignored,
}

/// Handler for payment reconciliation.
///
/// A callback is never trusted on its own: the gateway is consulted for
/// the authoritative intent status before any slot is granted. Capacity is
/// re-checked at confirmation time; a payment that arrives for a now-full
/// event is durably flagged and a compensating refund is attempted.
pub struct ConfirmPaymentHandler {
    repository: Arc<dyn EventRepository>,
    gateway: Arc<dyn PaymentGateway>,
    event_publisher: Arc<dyn EventPublisher>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl ConfirmPaymentHandler {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        gateway: Arc<dyn PaymentGateway>,
        event_publisher: Arc<dyn EventPublisher>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            repository,
            gateway,
            event_publisher,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmPaymentCommand,
    ) -> Result<ConfirmPaymentResult, RegistrationError> {
        // 1. Verify the callback signature and parse the event
        let callback = self
            .gateway
            .verify_callback(&cmd.payload, &cmd.signature)
            .await
            .map_err(|e| match e.code {
                GatewayErrorCode::InvalidCallback => {
                    RegistrationError::malformed_payload(e.message)
                }
                _ => e.into(),
            })?;

        // 2. Process based on callback kind
        match callback.kind {
            CallbackKind::PaymentSucceeded => self.handle_succeeded(&callback.reference).await,
            CallbackKind::PaymentFailed => self.handle_failed(&callback.reference).await,
            CallbackKind::RefundCompleted => Ok(ConfirmPaymentResult::Acknowledged),
            CallbackKind::Unknown(_) => Ok(ConfirmPaymentResult::Ignored),
        }
    }

    async fn handle_succeeded(
        &self,
        reference: &str,
    ) -> Result<ConfirmPaymentResult, RegistrationError> {
        // Authoritative status check with the gateway.
        let intent = self.gateway.fetch_intent(reference).await?;
        if !intent.status.is_success() {
            return Err(RegistrationError::payment_not_succeeded(
                reference,
                intent.status.display_name(),
            ));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;

            let mut event = self
                .repository
                .find_by_payment_reference(reference)
                .await?
                .ok_or_else(|| RegistrationError::intent_not_found(reference))?;
            let event_id = event.id;

            let record = event
                .intent_by_reference(reference)
                .ok_or_else(|| RegistrationError::intent_not_found(reference))?;
            let user_id = record.user_id.clone();

            // Already refunded or already seated: duplicate delivery.
            if record.state == IntentState::Refunded {
                return Ok(ConfirmPaymentResult::Acknowledged);
            }
            // An intent still owing a refund stays on the compensation
            // path; a redelivered success callback must not grab a seat
            // that freed up in the meantime.
            if record.refund_due {
                return Ok(ConfirmPaymentResult::Acknowledged);
            }
            if record.state == IntentState::Succeeded
                && event.active_attendee(&user_id).is_some()
            {
                return Ok(ConfirmPaymentResult::AlreadyProcessed);
            }

            let now = Timestamp::now();
            if let Some(record) = event.intent_by_reference_mut(reference) {
                record.mark_succeeded(now);
            }

            match event.admit(
                AttendeeRecord::paid(user_id.clone(), reference.to_string(), now),
                now,
            ) {
                AdmitOutcome::Admitted => {
                    match self.repository.update(&event).await {
                        Ok(()) => {
                            return self.finish_seated(event_id, user_id, reference, now).await
                        }
                        Err(e)
                            if e.code == ErrorCode::VersionConflict
                                && attempts < MAX_UPDATE_ATTEMPTS =>
                        {
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                AdmitOutcome::AlreadyAdmitted => {
                    if let Some(attendee) = event.active_attendee_mut(&user_id) {
                        attendee.mark_payment_completed(reference);
                    }
                    match self.repository.update(&event).await {
                        Ok(()) => return Ok(ConfirmPaymentResult::AlreadyProcessed),
                        Err(e)
                            if e.code == ErrorCode::VersionConflict
                                && attempts < MAX_UPDATE_ATTEMPTS =>
                        {
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                AdmitOutcome::Full => {
                    // Money taken, no seat: flag durably, then compensate.
                    if let Some(record) = event.intent_by_reference_mut(reference) {
                        record.flag_refund_due(now);
                    }
                    match self.repository.update(&event).await {
                        Ok(()) => {
                            return self
                                .finish_confirmed_but_full(event_id, user_id, reference, now)
                                .await
                        }
                        Err(e)
                            if e.code == ErrorCode::VersionConflict
                                && attempts < MAX_UPDATE_ATTEMPTS =>
                        {
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }
    }

    async fn finish_seated(
        &self,
        event_id: EventId,
        user_id: UserId,
        reference: &str,
        at: Timestamp,
    ) -> Result<ConfirmPaymentResult, RegistrationError> {
        self.event_publisher
            .publish_all(vec![
                RegistrationEvent::PaymentConfirmed {
                    id: DomainEventId::new(),
                    event_id,
                    user_id: user_id.clone(),
                    reference: reference.to_string(),
                    occurred_at: at,
                }
                .to_envelope(),
                RegistrationEvent::RegistrationConfirmed {
                    id: DomainEventId::new(),
                    event_id,
                    user_id: user_id.clone(),
                    payment_reference: Some(reference.to_string()),
                    occurred_at: at,
                }
                .to_envelope(),
            ])
            .await?;

        if let Err(e) = self
            .notifier
            .notify(Notification::new(
                user_id.clone(),
                event_id,
                NotificationKind::PaymentReceipt {
                    reference: reference.to_string(),
                },
            ))
            .await
        {
            warn!(user_id = %user_id, event_id = %event_id, error = %e,
                "payment receipt notification failed");
        }

        Ok(ConfirmPaymentResult::Seated { event_id, user_id })
    }

    async fn finish_confirmed_but_full(
        &self,
        event_id: EventId,
        user_id: UserId,
        reference: &str,
        at: Timestamp,
    ) -> Result<ConfirmPaymentResult, RegistrationError> {
        error!(event_id = %event_id, user_id = %user_id, reference = %reference,
            "payment confirmed for a full event, refund flagged");

        self.event_publisher
            .publish(
                RegistrationEvent::PaymentFlaggedForRefund {
                    id: DomainEventId::new(),
                    event_id,
                    user_id: user_id.clone(),
                    reference: reference.to_string(),
                    occurred_at: at,
                }
                .to_envelope(),
            )
            .await?;

        if let Err(e) = self
            .notifier
            .notify(Notification::new(
                user_id.clone(),
                event_id,
                NotificationKind::RefundPending {
                    reference: reference.to_string(),
                },
            ))
            .await
        {
            warn!(user_id = %user_id, event_id = %event_id, error = %e,
                "refund pending notification failed");
        }

        // Compensating refund. On failure the refund_due flag remains set
        // for the next reconciliation or an operator.
        match self.gateway.refund(reference).await {
            Ok(_) => {
                self.mark_refunded(reference, &user_id, event_id).await?;
            }
            Err(e) => {
                error!(reference = %reference, error = %e, "compensating refund failed");
            }
        }

        Err(RegistrationError::confirmed_but_full(reference))
    }

    async fn mark_refunded(
        &self,
        reference: &str,
        user_id: &UserId,
        event_id: EventId,
    ) -> Result<(), RegistrationError> {
        let mut attempts = 0;
        let refunded_at = loop {
            attempts += 1;

            let mut event = self
                .repository
                .find_by_payment_reference(reference)
                .await?
                .ok_or_else(|| RegistrationError::intent_not_found(reference))?;

            let now = Timestamp::now();
            if let Some(record) = event.intent_by_reference_mut(reference) {
                record.mark_refunded(now);
            }

            match self.repository.update(&event).await {
                Ok(()) => break now,
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        self.event_publisher
            .publish(
                RegistrationEvent::PaymentRefunded {
                    id: DomainEventId::new(),
                    event_id,
                    user_id: user_id.clone(),
                    reference: reference.to_string(),
                    occurred_at: refunded_at,
                }
                .to_envelope(),
            )
            .await?;
        Ok(())
    }

    async fn handle_failed(
        &self,
        reference: &str,
    ) -> Result<ConfirmPaymentResult, RegistrationError> {
        let mut attempts = 0;
        loop {
            attempts += 1;

            let mut event = match self
                .repository
                .find_by_payment_reference(reference)
                .await?
            {
                Some(event) => event,
                // A failure callback for a reference we never recorded.
                None => return Ok(ConfirmPaymentResult::Ignored),
            };

            let now = Timestamp::now();
            if let Some(record) = event.intent_by_reference_mut(reference) {
                record.mark_failed(now);
            }

            match self.repository.update(&event).await {
                Ok(()) => {
                    return Ok(ConfirmPaymentResult::PaymentMarkedFailed {
                        reference: reference.to_string(),
                    })
                }
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
