//! Event dispatch: the single entry point the transport layer calls.
//!
//! Every inbound event is first inspected against the session store to find
//! the user's current state; the matching component advances its state
//! machine. Button presses carry their own addressing (a chat id) and route
//! regardless of session state. Menu commands are accepted only from Idle,
//! so entering one workflow while inside another requires cancelling first.
//!
//! Unexpected failures leave Session and ChatSession rows unchanged (every
//! transition either completes fully against the store or not at all) and
//! surface a generic retry message to the acting user.

use tandem_types::error::{BookingError, PairingError, RepositoryError};
use tandem_types::event::{ButtonTag, Event, InboundEvent, Keyboard, OutboundMessage};
use tandem_types::session::{Session, SessionPayload, SessionState};
use tandem_types::user::Role;
use thiserror::Error;

use crate::booking::BookingService;
use crate::booking::step::prompt;
use crate::menu::{RoleResolution, RoleRouter, menu_for, menu_message};
use crate::notify::NotificationDelivery;
use crate::pairing::PairingService;
use crate::repository::booking::BookingRepository;
use crate::repository::chat::ChatRepository;
use crate::repository::notification::NotificationRepository;
use crate::repository::user::UserRepository;
use crate::session::{SessionStore, reset_preserving_role};
use crate::transport::Transport;

use std::sync::Arc;

/// Menu command strings, matched verbatim against inbound text.
pub mod commands {
    pub const CONTACT_PROVIDER: &str = "Contact provider";
    pub const NEW_BOOKING: &str = "New booking";
    pub const END_CHAT: &str = "End chat";
    pub const CANCEL: &str = "Back to menu";
}

/// Failure of an event dispatch after the per-component recovery paths.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Pairing(#[from] PairingError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// The session orchestration engine.
///
/// Generic over the repository, session store, and transport traits; the
/// application layer pins them to concrete implementations.
pub struct Engine<S, C, N, B, U, T> {
    sessions: S,
    transport: Arc<T>,
    pairing: PairingService<C, U, S, T>,
    booking: BookingService<B, U, C, N, S>,
    router: RoleRouter<N>,
    delivery: NotificationDelivery<N, T>,
}

impl<S, C, N, B, U, T> Engine<S, C, N, B, U, T>
where
    S: SessionStore + Clone,
    C: ChatRepository + Clone,
    N: NotificationRepository + Clone,
    B: BookingRepository,
    U: UserRepository + Clone,
    T: Transport,
{
    pub fn new(
        sessions: S,
        chats: C,
        notifications: N,
        bookings: B,
        users: U,
        transport: Arc<T>,
    ) -> Self {
        let pairing = PairingService::new(
            chats.clone(),
            users.clone(),
            sessions.clone(),
            transport.clone(),
        );
        let booking = BookingService::new(
            bookings,
            users,
            chats,
            notifications.clone(),
            sessions.clone(),
        );
        let router = RoleRouter::new(notifications.clone());
        let delivery = NotificationDelivery::new(notifications, transport.clone());
        Self { sessions, transport, pairing, booking, router, delivery }
    }

    /// Handle one inbound event.
    ///
    /// Never propagates an error to the caller: the webhook must ack
    /// regardless, so failures are logged and answered with a retry notice.
    pub async fn handle_event(&self, envelope: InboundEvent) {
        let user_id = envelope.user_id;
        if let Err(err) = self.dispatch(user_id, &envelope.event).await {
            tracing::error!(event_id = %envelope.id, user_id, error = %err, "event dispatch failed");
            let _ = self
                .transport
                .send(
                    user_id,
                    &OutboundMessage::text("Something went wrong. Please try again."),
                )
                .await;
        }
    }

    /// Called once per successful login: render queued notifications, then
    /// reset the session to Idle with the role recorded, then show the menu.
    pub async fn on_authenticated(&self, user_id: i64, role: Role) -> Result<(), EngineError> {
        let rendered = self.delivery.deliver_pending(user_id, role).await?;
        if rendered > 0 {
            tracing::debug!(user_id, %role, rendered, "delivered queued notifications");
        }

        self.sessions.clear(user_id).await?;
        self.sessions
            .set(user_id, SessionState::Idle, SessionPayload::new().with_role(role))
            .await?;

        let welcome = match role {
            Role::Client => "✅ Welcome! You're logged in as a client.",
            Role::Provider => "✅ Welcome! You're logged in as a provider.",
        };
        let _ = self
            .transport
            .send(user_id, &OutboundMessage::text(welcome).with_keyboard(menu_for(role)))
            .await;
        Ok(())
    }

    async fn dispatch(&self, user_id: i64, event: &Event) -> Result<(), EngineError> {
        if let Event::Button { data } = event {
            return self.handle_button(user_id, *data).await;
        }

        let session = self.sessions.get(user_id).await?;
        match session.state {
            SessionState::Idle => self.handle_idle(user_id, event, &session).await,

            SessionState::AwaitingProviderCode => match event {
                Event::Text { text } if text == commands::CANCEL => {
                    self.cancel_to_menu(user_id).await
                }
                Event::Text { text } => {
                    self.pairing.submit_code(user_id, text).await?;
                    Ok(())
                }
                _ => {
                    let _ = self
                        .transport
                        .send(
                            user_id,
                            &OutboundMessage::text("Enter the provider's 6-digit code:"),
                        )
                        .await;
                    Ok(())
                }
            },

            SessionState::InChat => match event {
                Event::Text { text } if text == commands::END_CHAT => {
                    self.pairing.close(user_id).await?;
                    Ok(())
                }
                _ => {
                    self.pairing.relay(user_id, event).await?;
                    Ok(())
                }
            },

            SessionState::Booking(step) => match event {
                Event::Text { text } if text == commands::CANCEL => {
                    self.cancel_to_menu(user_id).await
                }
                Event::Text { text } => {
                    let replies = self.booking.advance(user_id, step, &session, text).await?;
                    self.send_all(user_id, replies).await;
                    Ok(())
                }
                _ => {
                    let _ = self
                        .transport
                        .send(user_id, &OutboundMessage::text(prompt(step)))
                        .await;
                    Ok(())
                }
            },
        }
    }

    async fn handle_idle(
        &self,
        user_id: i64,
        event: &Event,
        session: &Session,
    ) -> Result<(), EngineError> {
        match event {
            Event::Text { text } if text == commands::CONTACT_PROVIDER => {
                self.pairing.start_contact(user_id).await?;
                Ok(())
            }
            Event::Text { text } if text == commands::NEW_BOOKING => {
                let replies = self.booking.start(user_id).await?;
                self.send_all(user_id, replies).await;
                Ok(())
            }
            _ => self.show_menu(user_id, session).await,
        }
    }

    async fn handle_button(&self, user_id: i64, tag: ButtonTag) -> Result<(), EngineError> {
        match tag {
            ButtonTag::AcceptChat(chat_id) => {
                self.pairing.accept(user_id, chat_id).await?;
                Ok(())
            }
            ButtonTag::RejectChat(chat_id) => {
                self.pairing.reject(user_id, chat_id).await?;
                Ok(())
            }
            ButtonTag::BookingOfferAccepted(chat_id) => {
                match self.booking.start_from_offer(user_id, chat_id).await {
                    Ok(replies) => {
                        self.send_all(user_id, replies).await;
                        Ok(())
                    }
                    Err(BookingError::ChatNotFound) => {
                        let _ = self
                            .transport
                            .send(user_id, &OutboundMessage::text("Chat not found."))
                            .await;
                        Ok(())
                    }
                    Err(err) => Err(err.into()),
                }
            }
            ButtonTag::BookingOfferDeclined => {
                // The offer only ever goes to a provider.
                self.sessions
                    .set(
                        user_id,
                        SessionState::Idle,
                        SessionPayload::new().with_role(Role::Provider),
                    )
                    .await?;
                let _ = self.transport.send(user_id, &menu_message(Role::Provider)).await;
                Ok(())
            }
        }
    }

    /// Global cancel: drop all uncommitted work, keep the role, show the menu.
    async fn cancel_to_menu(&self, user_id: i64) -> Result<(), EngineError> {
        let role = reset_preserving_role(&self.sessions, user_id).await?;
        match role {
            Some(role) => {
                let _ = self.transport.send(user_id, &menu_message(role)).await;
            }
            None => {
                let session = self.sessions.get(user_id).await?;
                self.show_menu(user_id, &session).await?;
            }
        }
        Ok(())
    }

    async fn show_menu(&self, user_id: i64, session: &Session) -> Result<(), EngineError> {
        match self.router.resolve(user_id, session).await? {
            RoleResolution::Menu(role) => {
                let _ = self.transport.send(user_id, &menu_message(role)).await;
            }
            RoleResolution::Ask { client_count, provider_count } => {
                let _ = self
                    .transport
                    .send(
                        user_id,
                        &OutboundMessage::text("Choose a role to continue:")
                            .with_keyboard(Keyboard::RoleSelect { client_count, provider_count }),
                    )
                    .await;
            }
        }
        Ok(())
    }

    async fn send_all(&self, user_id: i64, replies: Vec<OutboundMessage>) {
        for message in replies {
            if let Err(err) = self.transport.send(user_id, &message).await {
                tracing::warn!(user_id, error = %err, "reply send failed");
            }
        }
    }
}
