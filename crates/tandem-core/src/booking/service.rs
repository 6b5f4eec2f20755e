//! Booking workflow service.
//!
//! Drives the `CollectingCounterpart? -> ... -> CollectingComments -> commit`
//! pipeline. The counterpart step is skipped whenever the session payload
//! already carries one (an active chat pairing or the post-chat offer put it
//! there). Replies are returned to the caller for delivery to the acting
//! provider; the counterpart is never messaged directly -- commit informs
//! both parties through the notification queue, since the counterpart may be
//! offline.

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use tandem_types::booking::{Booking, NewBooking};
use tandem_types::chat::ChatState;
use tandem_types::error::BookingError;
use tandem_types::event::{Keyboard, OutboundMessage};
use tandem_types::session::{BookingStep, Session, SessionPayload, SessionState, keys};
use tandem_types::user::Role;

use crate::menu::menu_message;
use crate::notify::truncate_body;
use crate::repository::booking::BookingRepository;
use crate::repository::chat::ChatRepository;
use crate::repository::notification::NotificationRepository;
use crate::repository::user::UserRepository;
use crate::session::SessionStore;

use super::step::{collect, next_step, parse_booking_date, prompt};

/// Orchestrates the booking data-collection pipeline for a provider.
pub struct BookingService<B, U, C, N, S> {
    bookings: B,
    users: U,
    chats: C,
    notifications: N,
    sessions: S,
}

impl<B, U, C, N, S> BookingService<B, U, C, N, S>
where
    B: BookingRepository,
    U: UserRepository,
    C: ChatRepository,
    N: NotificationRepository,
    S: SessionStore,
{
    pub fn new(bookings: B, users: U, chats: C, notifications: N, sessions: S) -> Self {
        Self { bookings, users, chats, notifications, sessions }
    }

    /// Provider pressed "New booking" from the menu.
    ///
    /// The counterpart step is skipped when the payload already names a
    /// client or when the provider has a live active chat to take it from.
    pub async fn start(&self, provider_id: i64) -> Result<Vec<OutboundMessage>, BookingError> {
        let session = self.sessions.get(provider_id).await?;

        if session.payload.counterpart_id().is_some() {
            self.sessions
                .set(
                    provider_id,
                    SessionState::Booking(BookingStep::CollectingServiceName),
                    SessionPayload::new().with_role(Role::Provider),
                )
                .await?;
            return Ok(vec![entry_prompt(BookingStep::CollectingServiceName)]);
        }

        if let Some(chat) = self.chats.live_chat_for(provider_id, Role::Provider).await? {
            if chat.state == ChatState::Active {
                self.sessions
                    .set(
                        provider_id,
                        SessionState::Booking(BookingStep::CollectingServiceName),
                        SessionPayload::new()
                            .with_role(Role::Provider)
                            .with_counterpart_id(chat.client_id)
                            .with(keys::FROM_CHAT, json!(true)),
                    )
                    .await?;
                return Ok(vec![entry_prompt(BookingStep::CollectingServiceName)]);
            }
        }

        self.sessions
            .set(
                provider_id,
                SessionState::Booking(BookingStep::CollectingCounterpart),
                SessionPayload::new().with_role(Role::Provider),
            )
            .await?;
        Ok(vec![entry_prompt(BookingStep::CollectingCounterpart)])
    }

    /// Provider accepted the post-chat booking offer: prefill the client from
    /// the chat row and start at the service-name step.
    ///
    /// The chat must belong to the acting provider; a stale or foreign chat
    /// id reads as not found.
    pub async fn start_from_offer(
        &self,
        provider_id: i64,
        chat_id: i64,
    ) -> Result<Vec<OutboundMessage>, BookingError> {
        let chat = self
            .chats
            .get(chat_id)
            .await?
            .filter(|c| c.provider_id == provider_id)
            .ok_or(BookingError::ChatNotFound)?;

        self.sessions
            .set(
                provider_id,
                SessionState::Booking(BookingStep::CollectingServiceName),
                SessionPayload::new()
                    .with_role(Role::Provider)
                    .with_counterpart_id(chat.client_id)
                    .with(keys::FROM_CHAT, json!(true)),
            )
            .await?;
        Ok(vec![entry_prompt(BookingStep::CollectingServiceName)])
    }

    /// Feed one input into the current step.
    ///
    /// Invalid input re-prompts the same step and discards nothing; valid
    /// input merges its patch and advances. The final step commits.
    pub async fn advance(
        &self,
        provider_id: i64,
        step: BookingStep,
        session: &Session,
        input: &str,
    ) -> Result<Vec<OutboundMessage>, BookingError> {
        if step == BookingStep::CollectingCounterpart {
            return self.resolve_counterpart(provider_id, input).await;
        }

        let patch = match collect(step, input) {
            Ok(patch) => patch,
            Err(err) => return Ok(vec![OutboundMessage::text(err.reprompt())]),
        };

        let Some(next) = next_step(step) else {
            return self.commit(provider_id, session, input).await;
        };

        let mut replies = Vec::new();
        if next == BookingStep::CollectingTime {
            // The date just landed; surface that day's schedule as advisory
            // context before asking for a time.
            if let Ok(date) = parse_booking_date(input) {
                let existing = self.bookings.on_date(provider_id, date).await?;
                replies.push(OutboundMessage::text(render_schedule(&existing)));
            }
        }

        self.sessions
            .set(provider_id, SessionState::Booking(next), patch)
            .await?;
        replies.push(entry_prompt(next));
        Ok(replies)
    }

    /// Counterpart step: validate the code format, then resolve it.
    async fn resolve_counterpart(
        &self,
        provider_id: i64,
        input: &str,
    ) -> Result<Vec<OutboundMessage>, BookingError> {
        if let Err(err) = collect(BookingStep::CollectingCounterpart, input) {
            return Ok(vec![
                OutboundMessage::text(err.reprompt()).with_keyboard(Keyboard::CancelOnly),
            ]);
        }

        let Some(client) = self.users.find_by_public_code(input.trim()).await? else {
            return Ok(vec![
                OutboundMessage::text("No client found with that code. Try again:")
                    .with_keyboard(Keyboard::CancelOnly),
            ]);
        };

        self.sessions
            .set(
                provider_id,
                SessionState::Booking(BookingStep::CollectingServiceName),
                SessionPayload::new()
                    .with_counterpart_id(client.user_id)
                    .with(keys::FROM_CHAT, json!(false)),
            )
            .await?;
        Ok(vec![entry_prompt(BookingStep::CollectingServiceName)])
    }

    /// Final step: persist the booking and queue the record notice for both
    /// parties, then return to the menu with the role preserved.
    async fn commit(
        &self,
        provider_id: i64,
        session: &Session,
        comments_input: &str,
    ) -> Result<Vec<OutboundMessage>, BookingError> {
        let comments = match comments_input.trim() {
            "-" => "No comments".to_string(),
            other => other.to_string(),
        };

        let payload = &session.payload;
        let client_id = payload
            .counterpart_id()
            .ok_or(BookingError::Incomplete(keys::COUNTERPART_ID))?;
        let service = payload
            .get_str(keys::SERVICE)
            .ok_or(BookingError::Incomplete(keys::SERVICE))?
            .to_string();
        let cost = payload
            .get_i64(keys::COST)
            .ok_or(BookingError::Incomplete(keys::COST))?;
        let address = payload
            .get_str(keys::ADDRESS)
            .ok_or(BookingError::Incomplete(keys::ADDRESS))?
            .to_string();
        let date: NaiveDate = payload
            .get_str(keys::DATE)
            .and_then(|s| s.parse().ok())
            .ok_or(BookingError::Incomplete(keys::DATE))?;
        let time = payload
            .get_str(keys::TIME)
            .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M").ok())
            .ok_or(BookingError::Incomplete(keys::TIME))?;

        let booking = self
            .bookings
            .create(&NewBooking {
                provider_id,
                client_id,
                service: service.clone(),
                cost,
                address: address.clone(),
                date,
                time,
                comments: comments.clone(),
            })
            .await?;
        tracing::info!(booking_id = booking.id, provider_id, client_id, "booking committed");

        let client = self.users.get(client_id).await?;
        let client_name = client
            .as_ref()
            .and_then(|u| u.display_name())
            .unwrap_or_else(|| "Client".to_string());
        let client_code = client
            .as_ref()
            .map(|u| u.public_code.clone())
            .unwrap_or_else(|| "??????".to_string());

        let record = format!(
            "📄 <b>New booking</b>\n\n\
             🔹 Service: {service}\n\
             🔹 Cost: {cost}\n\
             🔹 Client: {client_name} (code {client_code})\n\
             🔹 Address: {address}\n\
             🔹 Date: {date}\n\
             🔹 Time: {time}\n\
             🔹 Comments: {comments}",
            date = date.format("%d.%m.%Y"),
            time = time.format("%H:%M"),
        );
        let record = truncate_body(&record);

        self.notifications
            .enqueue(provider_id, Role::Provider, &record)
            .await?;
        if client_id != provider_id {
            self.notifications
                .enqueue(client_id, Role::Client, &record)
                .await?;
        }

        let role = payload.role().unwrap_or(Role::Provider);
        self.sessions.clear(provider_id).await?;
        self.sessions
            .set(provider_id, SessionState::Idle, SessionPayload::new().with_role(role))
            .await?;

        let confirmation = if client_id != provider_id {
            "✅ Booking saved. The client will see it at their next client login."
        } else {
            "✅ Booking saved."
        };
        Ok(vec![OutboundMessage::text(confirmation), menu_message(role)])
    }
}

/// Entering prompt for a step, with the cancel keyboard attached.
fn entry_prompt(step: BookingStep) -> OutboundMessage {
    OutboundMessage::text(prompt(step)).with_keyboard(Keyboard::CancelOnly)
}

/// Advisory schedule for a date; informational only.
fn render_schedule(existing: &[Booking]) -> String {
    if existing.is_empty() {
        return "No bookings on this date yet.".to_string();
    }
    let mut out = String::from("Already booked on this date:\n");
    for booking in existing {
        out.push_str(&format!(
            "• {} — {}\n",
            booking.time.format("%H:%M"),
            booking.service
        ));
    }
    out
}
