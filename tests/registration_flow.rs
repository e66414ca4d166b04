//! Integration tests for the registration lifecycle.
//!
//! These tests wire the command handlers over shared in-memory adapters and
//! exercise the end-to-end flows:
//! 1. Free event: create, register, waitlist, cancel, promote, check in
//! 2. Paid event: intent creation, callback reconciliation, refund
//! 3. Capacity under concurrency and the confirmed-but-full compensation path
//!
//! Uses in-memory implementations to test the flows without external dependencies.

use std::sync::Arc;

use gatherly::adapters::gateway::MockPaymentGateway;
use gatherly::adapters::memory::{
    InMemoryEventPublisher, InMemoryEventRepository, InMemoryUserDirectory,
};
use gatherly::adapters::notify::TracingNotifier;
use gatherly::application::handlers::checkin::{
    IssueTokenCommand, IssueTokenHandler, ValidateTokenCommand, ValidateTokenHandler,
};
use gatherly::application::handlers::event::{CreateEventCommand, CreateEventHandler};
use gatherly::application::handlers::payment::{
    ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentResult,
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, RefundPaymentCommand,
    RefundPaymentHandler,
};
use gatherly::application::handlers::registration::{
    CancelRegistrationCommand, CancelRegistrationHandler, RegisterCommand, RegisterHandler,
    RegisterOutcome,
};
use gatherly::application::handlers::waitlist::{
    JoinWaitlistCommand, JoinWaitlistHandler, PromoteWaitlistCommand, PromoteWaitlistHandler,
};
use gatherly::domain::event::RegistrationError;
use gatherly::domain::foundation::{EventId, Timestamp, UserId};
use gatherly::ports::{CallbackKind, EventRepository, IntentStatus};

const OFFER_WINDOW_HOURS: i64 = 24;

// =============================================================================
// Test Infrastructure
// =============================================================================

/// All handlers wired over one shared set of in-memory adapters.
struct App {
    repository: Arc<InMemoryEventRepository>,
    gateway: Arc<MockPaymentGateway>,
    publisher: Arc<InMemoryEventPublisher>,
    create_event: CreateEventHandler,
    register: Arc<RegisterHandler>,
    cancel: CancelRegistrationHandler,
    join_waitlist: JoinWaitlistHandler,
    promote: PromoteWaitlistHandler,
    create_intent: CreatePaymentIntentHandler,
    confirm: ConfirmPaymentHandler,
    refund: RefundPaymentHandler,
    issue_token: IssueTokenHandler,
    validate_token: ValidateTokenHandler,
}

impl App {
    fn new(users: &[&str]) -> Self {
        let repository = Arc::new(InMemoryEventRepository::new());
        let gateway = Arc::new(MockPaymentGateway::new());
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let notifier = Arc::new(TracingNotifier::new());

        let directory = Arc::new(InMemoryUserDirectory::new());
        for id in users {
            directory.add_user(user(id), format!("{}@example.com", id));
        }

        Self {
            create_event: CreateEventHandler::new(repository.clone(), publisher.clone()),
            register: Arc::new(RegisterHandler::new(
                repository.clone(),
                directory.clone(),
                publisher.clone(),
                notifier.clone(),
            )),
            cancel: CancelRegistrationHandler::new(
                repository.clone(),
                publisher.clone(),
                notifier.clone(),
                OFFER_WINDOW_HOURS,
            ),
            join_waitlist: JoinWaitlistHandler::new(
                repository.clone(),
                directory.clone(),
                publisher.clone(),
            ),
            promote: PromoteWaitlistHandler::new(
                repository.clone(),
                publisher.clone(),
                notifier.clone(),
                OFFER_WINDOW_HOURS,
            ),
            create_intent: CreatePaymentIntentHandler::new(
                repository.clone(),
                directory.clone(),
                gateway.clone(),
                publisher.clone(),
            ),
            confirm: ConfirmPaymentHandler::new(
                repository.clone(),
                gateway.clone(),
                publisher.clone(),
                notifier.clone(),
            ),
            refund: RefundPaymentHandler::new(
                repository.clone(),
                gateway.clone(),
                publisher.clone(),
                notifier,
                OFFER_WINDOW_HOURS,
            ),
            issue_token: IssueTokenHandler::new(repository.clone()),
            validate_token: ValidateTokenHandler::new(
                repository.clone(),
                directory,
                publisher.clone(),
            ),
            repository,
            gateway,
            publisher,
        }
    }

    async fn create_free_event(&self, capacity: u32) -> EventId {
        self.create_event
            .handle(CreateEventCommand {
                title: "Rust Meetup".to_string(),
                capacity,
                price_minor: None,
                currency: None,
            })
            .await
            .unwrap()
            .event
            .id
    }

    async fn create_paid_event(&self, capacity: u32) -> EventId {
        self.create_event
            .handle(CreateEventCommand {
                title: "RustConf".to_string(),
                capacity,
                price_minor: Some(50_00),
                currency: Some("usd".to_string()),
            })
            .await
            .unwrap()
            .event
            .id
    }

    async fn register(&self, event_id: EventId, user_id: &str) -> RegisterOutcome {
        self.register
            .handle(RegisterCommand {
                event_id,
                user_id: user(user_id),
            })
            .await
            .unwrap()
    }

    /// Walks a user through the paid path up to a verified seat: intent
    /// creation, gateway success, signed confirmation callback.
    async fn pay_and_confirm(&self, event_id: EventId, user_id: &str) -> ConfirmPaymentResult {
        let intent = self
            .create_intent
            .handle(CreatePaymentIntentCommand {
                event_id,
                user_id: user(user_id),
            })
            .await
            .unwrap();
        self.gateway
            .set_intent_status(&intent.reference, IntentStatus::Succeeded);
        self.confirm
            .handle(succeeded_callback(&intent.reference))
            .await
            .unwrap()
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn succeeded_callback(reference: &str) -> ConfirmPaymentCommand {
    ConfirmPaymentCommand {
        payload: MockPaymentGateway::callback_payload(CallbackKind::PaymentSucceeded, reference),
        signature: MockPaymentGateway::VALID_SIGNATURE.to_string(),
    }
}

// =============================================================================
// Free Event Lifecycle
// =============================================================================

#[tokio::test]
async fn free_event_lifecycle_from_creation_to_check_in() {
    let app = App::new(&["alice", "bob", "carol"]);
    let event_id = app.create_free_event(2).await;

    // Fill the event.
    app.register(event_id, "alice").await;
    app.register(event_id, "bob").await;

    // Carol queues behind the full event.
    let joined = app
        .join_waitlist
        .handle(JoinWaitlistCommand {
            event_id,
            user_id: user("carol"),
        })
        .await
        .unwrap();
    assert_eq!(joined.position, 1);

    // Alice cancels; carol gets the offer for the freed slot.
    let cancelled = app
        .cancel
        .handle(CancelRegistrationCommand {
            event_id,
            user_id: user("alice"),
        })
        .await
        .unwrap();
    assert_eq!(cancelled.offered, vec![user("carol")]);

    // Carol accepts by registering; the slot is hers and the queue empties.
    app.register(event_id, "carol").await;
    let stored = app.repository.find_by_id(&event_id).await.unwrap().unwrap();
    assert_eq!(stored.admitted_count(), 2);
    assert!(stored.waitlist.is_empty());

    // Bob checks in at the door with a freshly issued token.
    let token = app
        .issue_token
        .handle(IssueTokenCommand {
            event_id,
            user_id: user("bob"),
        })
        .await
        .unwrap();
    let checked_in = app
        .validate_token
        .handle(ValidateTokenCommand {
            encoded: token.encoded,
        })
        .await
        .unwrap();
    assert_eq!(checked_in.user_id, user("bob"));

    let types: Vec<String> = app
        .publisher
        .published()
        .iter()
        .map(|e| e.event_type.clone())
        .collect();
    assert_eq!(
        types,
        vec![
            "event.created.v1",
            "registration.confirmed.v1",
            "registration.confirmed.v1",
            "waitlist.joined.v1",
            "registration.cancelled.v1",
            "waitlist.offer_extended.v1",
            "registration.confirmed.v1",
            "checkin.completed.v1",
        ]
    );
}

#[tokio::test]
async fn waitlist_is_rejected_until_the_event_fills() {
    let app = App::new(&["alice", "bob"]);
    let event_id = app.create_free_event(2).await;

    app.register(event_id, "alice").await;

    let err = app
        .join_waitlist
        .handle(JoinWaitlistCommand {
            event_id,
            user_id: user("bob"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::EventNotFull { .. }));
}

#[tokio::test]
async fn expired_offer_requeues_and_next_in_line_is_offered() {
    let app = App::new(&["alice", "bob", "carol"]);
    let event_id = app.create_free_event(1).await;

    app.register(event_id, "alice").await;
    for waiting in ["bob", "carol"] {
        app.join_waitlist
            .handle(JoinWaitlistCommand {
                event_id,
                user_id: user(waiting),
            })
            .await
            .unwrap();
    }

    // Bob receives the offer for alice's slot but never acts on it.
    app.cancel
        .handle(CancelRegistrationCommand {
            event_id,
            user_id: user("alice"),
        })
        .await
        .unwrap();

    // Age bob's offer past the window.
    let mut stored = app.repository.find_by_id(&event_id).await.unwrap().unwrap();
    stored.waitlist[0].offered_at = Some(Timestamp::now().add_hours(-OFFER_WINDOW_HOURS - 1));
    app.repository.update(&stored).await.unwrap();

    // The promotion pass requeues bob and offers carol the slot.
    let pass = app
        .promote
        .handle(PromoteWaitlistCommand { event_id })
        .await
        .unwrap();
    assert_eq!(pass.offered, vec![user("carol")]);

    let stored = app.repository.find_by_id(&event_id).await.unwrap().unwrap();
    assert_eq!(stored.waitlist_position(&user("carol")), Some(1));
    assert_eq!(stored.waitlist_position(&user("bob")), Some(2));
}

#[tokio::test]
async fn concurrent_registrations_never_exceed_capacity() {
    let users = ["u1", "u2", "u3", "u4", "u5", "u6"];
    let app = App::new(&users);
    let event_id = app.create_free_event(3).await;

    let mut tasks = Vec::new();
    for id in users {
        let handler = app.register.clone();
        tasks.push(tokio::spawn(async move {
            handler
                .handle(RegisterCommand {
                    event_id,
                    user_id: user(id),
                })
                .await
        }));
    }

    let mut admitted = 0;
    let mut turned_away = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(RegistrationError::EventFull { .. }) => turned_away += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(admitted, 3);
    assert_eq!(turned_away, 3);

    let stored = app.repository.find_by_id(&event_id).await.unwrap().unwrap();
    assert_eq!(stored.admitted_count(), 3);
}

// =============================================================================
// Paid Event Lifecycle
// =============================================================================

#[tokio::test]
async fn paid_ticket_lifecycle_through_refund() {
    let app = App::new(&["alice", "bob"]);
    let event_id = app.create_paid_event(1).await;

    // Registration only returns a payment directive.
    let outcome = app.register(event_id, "alice").await;
    assert!(matches!(
        outcome,
        RegisterOutcome::PaymentRequired {
            amount_minor: 5000,
            ..
        }
    ));
    let stored = app.repository.find_by_id(&event_id).await.unwrap().unwrap();
    assert_eq!(stored.admitted_count(), 0);

    // Payment confirmation seats alice.
    let result = app.pay_and_confirm(event_id, "alice").await;
    assert!(matches!(result, ConfirmPaymentResult::Seated { .. }));
    let stored = app.repository.find_by_id(&event_id).await.unwrap().unwrap();
    assert_eq!(stored.admitted_count(), 1);

    // Bob queues behind the now-full event.
    app.join_waitlist
        .handle(JoinWaitlistCommand {
            event_id,
            user_id: user("bob"),
        })
        .await
        .unwrap();

    // Refunding alice frees the slot and extends bob an offer.
    let refunded = app
        .refund
        .handle(RefundPaymentCommand {
            event_id,
            user_id: user("alice"),
        })
        .await
        .unwrap();
    assert_eq!(refunded.offered, vec![user("bob")]);
    assert_eq!(app.gateway.refunds().len(), 1);

    let stored = app.repository.find_by_id(&event_id).await.unwrap().unwrap();
    assert_eq!(stored.admitted_count(), 0);
    assert!(stored.active_attendee(&user("alice")).is_none());

    // Alice can come back after the refund.
    let outcome = app.register(event_id, "alice").await;
    assert!(matches!(outcome, RegisterOutcome::PaymentRequired { .. }));
}

#[tokio::test]
async fn duplicate_confirmation_callback_is_idempotent() {
    let app = App::new(&["alice"]);
    let event_id = app.create_paid_event(5).await;
    app.register(event_id, "alice").await;

    let intent = app
        .create_intent
        .handle(CreatePaymentIntentCommand {
            event_id,
            user_id: user("alice"),
        })
        .await
        .unwrap();
    app.gateway
        .set_intent_status(&intent.reference, IntentStatus::Succeeded);

    let first = app
        .confirm
        .handle(succeeded_callback(&intent.reference))
        .await
        .unwrap();
    let second = app
        .confirm
        .handle(succeeded_callback(&intent.reference))
        .await
        .unwrap();

    assert!(matches!(first, ConfirmPaymentResult::Seated { .. }));
    assert!(matches!(second, ConfirmPaymentResult::AlreadyProcessed));

    let stored = app.repository.find_by_id(&event_id).await.unwrap().unwrap();
    assert_eq!(stored.admitted_count(), 1);
}

#[tokio::test]
async fn payment_for_a_seat_lost_in_the_meantime_is_refunded() {
    let app = App::new(&["alice", "bob"]);
    let event_id = app.create_paid_event(1).await;

    // Both buyers open intents while the last seat is still free.
    let alice_intent = app
        .create_intent
        .handle(CreatePaymentIntentCommand {
            event_id,
            user_id: user("alice"),
        })
        .await
        .unwrap();
    let bob_intent = app
        .create_intent
        .handle(CreatePaymentIntentCommand {
            event_id,
            user_id: user("bob"),
        })
        .await
        .unwrap();
    assert_ne!(alice_intent.reference, bob_intent.reference);

    // Alice's payment lands first and takes the seat.
    app.gateway
        .set_intent_status(&alice_intent.reference, IntentStatus::Succeeded);
    app.confirm
        .handle(succeeded_callback(&alice_intent.reference))
        .await
        .unwrap();

    // Bob paid for a seat that no longer exists: flagged and refunded.
    app.gateway
        .set_intent_status(&bob_intent.reference, IntentStatus::Succeeded);
    let err = app
        .confirm
        .handle(succeeded_callback(&bob_intent.reference))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::ConfirmedButFull { .. }));
    assert!(err.is_invariant_violation());
    assert_eq!(app.gateway.refunds(), vec![bob_intent.reference]);

    let stored = app.repository.find_by_id(&event_id).await.unwrap().unwrap();
    assert_eq!(stored.admitted_count(), 1);
    assert!(stored.active_attendee(&user("alice")).is_some());
    assert!(stored.active_attendee(&user("bob")).is_none());
}

// =============================================================================
// Check-in
// =============================================================================

#[tokio::test]
async fn check_in_token_is_single_use_across_handlers() {
    let app = App::new(&["alice"]);
    let event_id = app.create_free_event(5).await;
    app.register(event_id, "alice").await;

    let token = app
        .issue_token
        .handle(IssueTokenCommand {
            event_id,
            user_id: user("alice"),
        })
        .await
        .unwrap();

    app.validate_token
        .handle(ValidateTokenCommand {
            encoded: token.encoded.clone(),
        })
        .await
        .unwrap();

    let err = app
        .validate_token
        .handle(ValidateTokenCommand {
            encoded: token.encoded,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::AlreadyUsed { .. }));
}

#[tokio::test]
async fn reissued_token_revokes_the_previous_one() {
    let app = App::new(&["alice"]);
    let event_id = app.create_free_event(5).await;
    app.register(event_id, "alice").await;

    let first = app
        .issue_token
        .handle(IssueTokenCommand {
            event_id,
            user_id: user("alice"),
        })
        .await
        .unwrap();
    let second = app
        .issue_token
        .handle(IssueTokenCommand {
            event_id,
            user_id: user("alice"),
        })
        .await
        .unwrap();

    // The stale ticket no longer matches.
    let err = app
        .validate_token
        .handle(ValidateTokenCommand {
            encoded: first.encoded,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::TokenMismatch));

    // The fresh one does.
    app.validate_token
        .handle(ValidateTokenCommand {
            encoded: second.encoded,
        })
        .await
        .unwrap();
}
