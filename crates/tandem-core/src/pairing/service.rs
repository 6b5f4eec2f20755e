//! Two-party chat pairing state machine.
//!
//! Lifecycle: `RequestPending -> Active -> Closed`, plus terminal `Rejected`.
//! A pairing spans two independently-scheduled users, so every state-changing
//! operation goes through a compare-and-verify repository update: the row
//! must still have the expected id, owner, and status or the operation
//! reports stale and changes nothing. All failure branches (stale reference,
//! unreachable counterpart, self-pairing, malformed/unknown code) are
//! recovered locally: the acting user is told what happened and lands back
//! in an interactive state.

use tandem_types::error::{PairingError, SendError};
use tandem_types::event::{ButtonTag, Event, InlineButton, Keyboard, OutboundMessage};
use tandem_types::session::{SessionPayload, SessionState};
use tandem_types::user::{Role, is_valid_public_code};

use crate::menu::{menu_for, menu_message};
use crate::repository::chat::ChatRepository;
use crate::repository::user::UserRepository;
use crate::session::{SessionStore, reset_preserving_role};
use crate::transport::Transport;

use std::sync::Arc;

const STALE_CHAT: &str = "This chat is no longer available.";

/// Coordinates the live-chat pairing between a client and a provider.
pub struct PairingService<C, U, S, T> {
    chats: C,
    users: U,
    sessions: S,
    transport: Arc<T>,
}

impl<C, U, S, T> PairingService<C, U, S, T>
where
    C: ChatRepository,
    U: UserRepository,
    S: SessionStore,
    T: Transport,
{
    pub fn new(chats: C, users: U, sessions: S, transport: Arc<T>) -> Self {
        Self { chats, users, sessions, transport }
    }

    /// Client pressed "Contact provider": start collecting the provider code.
    ///
    /// Precondition: no live chat for this client. On violation the client is
    /// told and no row is created.
    pub async fn start_contact(&self, client_id: i64) -> Result<(), PairingError> {
        if self.chats.live_chat_for(client_id, Role::Client).await?.is_some() {
            let _ = self
                .transport
                .send(
                    client_id,
                    &OutboundMessage::text("You already have an active chat with a provider."),
                )
                .await;
            return Ok(());
        }

        self.sessions
            .set(
                client_id,
                SessionState::AwaitingProviderCode,
                SessionPayload::new().with_role(Role::Client),
            )
            .await?;
        let _ = self
            .transport
            .send(
                client_id,
                &OutboundMessage::text("Enter the provider's 6-digit code:")
                    .with_keyboard(Keyboard::CancelOnly),
            )
            .await;
        Ok(())
    }

    /// Client submitted a provider code: validate, create the pairing, and
    /// deliver the accept/reject prompt to the provider.
    ///
    /// If the provider is unreachable the pairing is closed immediately and
    /// the client informed -- the provider never saw the request, so this
    /// failure stays one-sided.
    pub async fn submit_code(&self, client_id: i64, input: &str) -> Result<(), PairingError> {
        let provider = match self.resolve_provider_code(client_id, input).await {
            Ok(provider) => provider,
            Err(err) => {
                let reply = match &err {
                    PairingError::MalformedCode(_) => "Invalid code format. Enter 6 digits:",
                    PairingError::UnknownCode(_) => "No provider found with that code. Try again:",
                    PairingError::SelfPairing => {
                        "You can't open a chat with yourself. Enter another code:"
                    }
                    _ => return Err(err),
                };
                let _ = self.transport.send(client_id, &OutboundMessage::text(reply)).await;
                return Ok(());
            }
        };

        let chat = self.chats.create(client_id, provider.user_id).await?;
        tracing::info!(chat_id = chat.id, client_id, provider_id = provider.user_id, "chat requested");

        let client_code = self
            .users
            .get(client_id)
            .await?
            .map(|u| u.public_code)
            .unwrap_or_else(|| "??????".to_string());
        let request = OutboundMessage::text(format!(
            "🔔 Chat request from client (code {client_code}). Accept?"
        ))
        .with_keyboard(Keyboard::Inline {
            buttons: vec![
                InlineButton::new("Accept", ButtonTag::AcceptChat(chat.id)),
                InlineButton::new("Decline", ButtonTag::RejectChat(chat.id)),
            ],
        });

        if let Err(err) = self.transport.send(provider.user_id, &request).await {
            tracing::info!(chat_id = chat.id, error = %err, "chat request undeliverable");
            self.chats.close(chat.id).await?;
            reset_preserving_role(&self.sessions, client_id).await?;
            let _ = self
                .transport
                .send(
                    client_id,
                    &OutboundMessage::text(
                        "Could not deliver the request: the provider has blocked the bot.",
                    )
                    .with_keyboard(Keyboard::ClientMenu),
                )
                .await;
            return Ok(());
        }

        // The client enters the chat right away; anything they type before
        // the provider answers is relayed as chat traffic.
        self.sessions
            .set(
                client_id,
                SessionState::InChat,
                SessionPayload::new()
                    .with_role(Role::Client)
                    .with_chat_id(chat.id)
                    .with_counterpart_id(provider.user_id),
            )
            .await?;
        let _ = self
            .transport
            .send(
                client_id,
                &OutboundMessage::text(
                    "Request sent. You can message the provider now; press \"End chat\" to stop.",
                )
                .with_keyboard(Keyboard::ChatActive),
            )
            .await;
        Ok(())
    }

    /// Validate a submitted provider code: format, existence, not-self.
    async fn resolve_provider_code(
        &self,
        client_id: i64,
        input: &str,
    ) -> Result<tandem_types::user::User, PairingError> {
        let code = input.trim();
        if !is_valid_public_code(code) {
            return Err(PairingError::MalformedCode(code.to_string()));
        }
        let Some(provider) = self.users.find_by_public_code(code).await? else {
            return Err(PairingError::UnknownCode(code.to_string()));
        };
        if provider.user_id == client_id {
            return Err(PairingError::SelfPairing);
        }
        Ok(provider)
    }

    /// Provider accepted a chat request.
    pub async fn accept(&self, provider_id: i64, chat_id: i64) -> Result<(), PairingError> {
        if !self.chats.activate(chat_id, provider_id).await? {
            let _ = self.transport.send(provider_id, &OutboundMessage::text(STALE_CHAT)).await;
            return Ok(());
        }

        let chat = self
            .chats
            .get(chat_id)
            .await?
            .ok_or(PairingError::StaleChat)?;
        tracing::info!(chat_id, provider_id, client_id = chat.client_id, "chat accepted");

        // Tell the client first; if they are unreachable the pairing dies here.
        let accepted = OutboundMessage::text(
            "✅ The provider accepted your request! You can now message each other.",
        );
        match self.transport.send(chat.client_id, &accepted).await {
            Ok(()) => {}
            Err(SendError::Unreachable) => {
                self.chats.close(chat_id).await?;
                reset_preserving_role(&self.sessions, chat.client_id).await?;
                let _ = self
                    .transport
                    .send(
                        provider_id,
                        &OutboundMessage::text("The client has blocked the bot. Chat closed.")
                            .with_keyboard(Keyboard::ProviderMenu),
                    )
                    .await;
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(chat_id, error = %err, "accept notice to client failed");
            }
        }

        // Record the counterpart on both sides so plain messages relay.
        self.sessions
            .set(
                chat.client_id,
                SessionState::InChat,
                SessionPayload::new()
                    .with_role(Role::Client)
                    .with_chat_id(chat_id)
                    .with_counterpart_id(provider_id),
            )
            .await?;
        self.sessions
            .set(
                provider_id,
                SessionState::InChat,
                SessionPayload::new()
                    .with_role(Role::Provider)
                    .with_chat_id(chat_id)
                    .with_counterpart_id(chat.client_id),
            )
            .await?;

        let _ = self
            .transport
            .send(
                provider_id,
                &OutboundMessage::text(
                    "✅ You accepted the request. Press \"End chat\" to stop.",
                )
                .with_keyboard(Keyboard::ChatActive),
            )
            .await;
        Ok(())
    }

    /// Provider rejected a chat request.
    pub async fn reject(&self, provider_id: i64, chat_id: i64) -> Result<(), PairingError> {
        if !self.chats.reject(chat_id, provider_id).await? {
            let _ = self.transport.send(provider_id, &OutboundMessage::text(STALE_CHAT)).await;
            return Ok(());
        }

        let chat = self.chats.get(chat_id).await?;
        tracing::info!(chat_id, provider_id, "chat rejected");

        if let Some(chat) = chat {
            // The client entered the chat at request time; pull them back out.
            reset_preserving_role(&self.sessions, chat.client_id).await?;
            let _ = self
                .transport
                .send(
                    chat.client_id,
                    &OutboundMessage::text("❌ The provider declined your request.")
                        .with_keyboard(Keyboard::ClientMenu),
                )
                .await;
        }

        let _ = self
            .transport
            .send(provider_id, &OutboundMessage::text("Request declined."))
            .await;
        Ok(())
    }

    /// Forward a text or photo to the counterpart recorded in the sender's
    /// session, with a role-identifying prefix.
    ///
    /// An unreachable counterpart turns into an implicit close: the chat row
    /// is closed, both sessions leave the in-chat state, and only the sender
    /// is told -- the other side cannot be reached anyway.
    pub async fn relay(&self, sender_id: i64, event: &Event) -> Result<(), PairingError> {
        let session = self.sessions.get(sender_id).await?;
        let sender_role = session.payload.role().unwrap_or(Role::Client);

        let Some(counterpart_id) = session.payload.counterpart_id() else {
            reset_preserving_role(&self.sessions, sender_id).await?;
            let _ = self
                .transport
                .send(
                    sender_id,
                    &OutboundMessage::text("Session error, returning to menu.")
                        .with_keyboard(menu_for(sender_role)),
                )
                .await;
            return Ok(());
        };

        let prefix = match sender_role {
            Role::Client => "Message from client:",
            Role::Provider => "Message from provider:",
        };
        let message = match event {
            Event::Text { text } => OutboundMessage::text(format!("{prefix}\n\n{text}")),
            Event::Photo { file_id, caption } => {
                let caption = match caption {
                    Some(caption) => format!("{prefix}\n\n{caption}"),
                    None => prefix.to_string(),
                };
                OutboundMessage::photo(file_id.clone(), caption)
            }
            Event::Button { .. } => return Ok(()),
        };

        match self.transport.send(counterpart_id, &message).await {
            Ok(()) => Ok(()),
            Err(SendError::Unreachable) => {
                if let Some(chat_id) = session.payload.chat_id() {
                    self.chats.close(chat_id).await?;
                    tracing::info!(chat_id, sender_id, "chat closed: counterpart unreachable");
                }
                reset_preserving_role(&self.sessions, sender_id).await?;
                if counterpart_id != sender_id {
                    reset_preserving_role(&self.sessions, counterpart_id).await?;
                }
                let ended = match sender_role {
                    Role::Client => "The provider has blocked the bot. Chat ended.",
                    Role::Provider => "The client has blocked the bot. Chat ended.",
                };
                let _ = self
                    .transport
                    .send(
                        sender_id,
                        &OutboundMessage::text(ended).with_keyboard(menu_for(sender_role)),
                    )
                    .await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(sender_id, counterpart_id, error = %err, "relay send failed");
                Ok(())
            }
        }
    }

    /// Explicit close by either side.
    ///
    /// Idempotent: closing a chat that is already terminal informs the actor
    /// but re-triggers no side effects. A fresh close clears both sessions
    /// (roles preserved), tells the client the chat ended, and offers the
    /// provider a booking prefilled with this client.
    pub async fn close(&self, user_id: i64) -> Result<(), PairingError> {
        let session = self.sessions.get(user_id).await?;
        let sender_role = session.payload.role().unwrap_or(Role::Client);

        let Some(chat_id) = session.payload.chat_id() else {
            reset_preserving_role(&self.sessions, user_id).await?;
            let _ = self.transport.send(user_id, &menu_message(sender_role)).await;
            return Ok(());
        };

        let newly_closed = self.chats.close(chat_id).await?;
        let chat = self.chats.get(chat_id).await?;

        // Both participants leave the in-chat state; roles survive.
        reset_preserving_role(&self.sessions, user_id).await?;
        if let Some(counterpart_id) = chat.as_ref().and_then(|c| c.counterpart_of(user_id)) {
            if counterpart_id != user_id {
                reset_preserving_role(&self.sessions, counterpart_id).await?;
            }
        }

        let _ = self
            .transport
            .send(
                user_id,
                &OutboundMessage::text("You left the chat.").with_keyboard(menu_for(sender_role)),
            )
            .await;

        if !newly_closed {
            return Ok(());
        }
        let Some(chat) = chat else {
            return Ok(());
        };
        tracing::info!(chat_id, user_id, "chat closed");

        if user_id != chat.client_id {
            let _ = self
                .transport
                .send(
                    chat.client_id,
                    &OutboundMessage::text("The chat with the provider has ended.")
                        .with_keyboard(Keyboard::ClientMenu),
                )
                .await;
        }

        let client_name = self
            .users
            .get(chat.client_id)
            .await?
            .and_then(|u| u.display_name())
            .unwrap_or_else(|| "the client".to_string());
        let offer = OutboundMessage::text(format!(
            "Chat with {client_name} ended.\nCreate a booking for this client?"
        ))
        .with_keyboard(Keyboard::Inline {
            buttons: vec![
                InlineButton::new("Yes", ButtonTag::BookingOfferAccepted(chat.id)),
                InlineButton::new("No", ButtonTag::BookingOfferDeclined),
            ],
        });
        let _ = self.transport.send(chat.provider_id, &offer).await;
        Ok(())
    }
}
