//! In-process fakes for core service tests.
//!
//! The fakes mirror the SQLite implementations' observable semantics: the
//! chat repository's compare-and-verify updates report whether the row
//! transitioned, the notification queue is FIFO by insertion, and the
//! transport can simulate unreachable recipients and markup rejection per
//! user.

use chrono::Utc;
use tandem_types::booking::{Booking, BookingStatus, NewBooking};
use tandem_types::chat::{ChatSession, ChatState};
use tandem_types::error::{RepositoryError, SendError};
use tandem_types::event::{OutboundMessage, ParseMode};
use tandem_types::notification::Notification;
use tandem_types::user::{Role, User};

use crate::repository::booking::BookingRepository;
use crate::repository::chat::ChatRepository;
use crate::repository::notification::NotificationRepository;
use crate::repository::user::UserRepository;
use crate::transport::Transport;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TransportState {
    sent: Vec<(i64, OutboundMessage)>,
    unreachable: HashSet<i64>,
    reject_markup: HashSet<i64>,
}

/// Records successful sends; can simulate per-user failures.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<TransportState>>,
}

impl FakeTransport {
    pub fn mark_unreachable(&self, user_id: i64) {
        self.state.lock().unwrap().unreachable.insert(user_id);
    }

    /// Make every HTML-mode send to this user fail with `InvalidMarkup`.
    pub fn reject_markup_for(&self, user_id: i64) {
        self.state.lock().unwrap().reject_markup.insert(user_id);
    }

    pub fn sent_to(&self, user_id: i64) -> Vec<OutboundMessage> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn texts_to(&self, user_id: i64) -> Vec<String> {
        self.sent_to(user_id).into_iter().map(|m| m.text).collect()
    }

    pub fn clear_sent(&self) {
        self.state.lock().unwrap().sent.clear();
    }
}

impl Transport for FakeTransport {
    async fn send(&self, user_id: i64, message: &OutboundMessage) -> Result<(), SendError> {
        let mut state = self.state.lock().unwrap();
        if state.unreachable.contains(&user_id) {
            return Err(SendError::Unreachable);
        }
        if state.reject_markup.contains(&user_id) && message.parse_mode == Some(ParseMode::Html) {
            return Err(SendError::InvalidMarkup);
        }
        state.sent.push((user_id, message.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Chat repository
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ChatTable {
    next_id: i64,
    rows: Vec<ChatSession>,
}

#[derive(Clone, Default)]
pub struct FakeChatRepo {
    table: Arc<Mutex<ChatTable>>,
}

impl FakeChatRepo {
    pub fn count(&self) -> usize {
        self.table.lock().unwrap().rows.len()
    }
}

impl ChatRepository for FakeChatRepo {
    async fn create(
        &self,
        client_id: i64,
        provider_id: i64,
    ) -> Result<ChatSession, RepositoryError> {
        let mut table = self.table.lock().unwrap();
        table.next_id += 1;
        let now = Utc::now();
        let chat = ChatSession {
            id: table.next_id,
            client_id,
            provider_id,
            state: ChatState::RequestPending,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(chat.clone());
        Ok(chat)
    }

    async fn get(&self, chat_id: i64) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .table
            .lock()
            .unwrap()
            .rows
            .iter()
            .find(|c| c.id == chat_id)
            .cloned())
    }

    async fn live_chat_for(
        &self,
        user_id: i64,
        role: Role,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .table
            .lock()
            .unwrap()
            .rows
            .iter()
            .find(|c| {
                let participant = match role {
                    Role::Client => c.client_id,
                    Role::Provider => c.provider_id,
                };
                participant == user_id && !c.state.is_terminal()
            })
            .cloned())
    }

    async fn activate(&self, chat_id: i64, provider_id: i64) -> Result<bool, RepositoryError> {
        let mut table = self.table.lock().unwrap();
        match table.rows.iter_mut().find(|c| {
            c.id == chat_id && c.provider_id == provider_id && c.state == ChatState::RequestPending
        }) {
            Some(chat) => {
                chat.state = ChatState::Active;
                chat.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reject(&self, chat_id: i64, provider_id: i64) -> Result<bool, RepositoryError> {
        let mut table = self.table.lock().unwrap();
        match table.rows.iter_mut().find(|c| {
            c.id == chat_id && c.provider_id == provider_id && c.state == ChatState::RequestPending
        }) {
            Some(chat) => {
                chat.state = ChatState::Rejected;
                chat.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn close(&self, chat_id: i64) -> Result<bool, RepositoryError> {
        let mut table = self.table.lock().unwrap();
        match table
            .rows
            .iter_mut()
            .find(|c| c.id == chat_id && !c.state.is_terminal())
        {
            Some(chat) => {
                chat.state = ChatState::Closed;
                chat.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Notification repository
// ---------------------------------------------------------------------------

#[derive(Default)]
struct NotificationTable {
    next_id: i64,
    rows: Vec<Notification>,
}

#[derive(Clone, Default)]
pub struct FakeNotificationRepo {
    table: Arc<Mutex<NotificationTable>>,
}

impl NotificationRepository for FakeNotificationRepo {
    async fn enqueue(&self, user_id: i64, role: Role, body: &str) -> Result<(), RepositoryError> {
        let mut table = self.table.lock().unwrap();
        table.next_id += 1;
        let id = table.next_id;
        table.rows.push(Notification {
            id,
            user_id,
            role,
            body: body.to_string(),
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn pending(&self, user_id: i64, role: Role) -> Result<Vec<Notification>, RepositoryError> {
        let mut rows: Vec<Notification> = self
            .table
            .lock()
            .unwrap()
            .rows
            .iter()
            .filter(|n| n.user_id == user_id && n.role == role && !n.is_read)
            .cloned()
            .collect();
        rows.sort_by_key(|n| n.id);
        Ok(rows)
    }

    async fn mark_read(&self, user_id: i64, role: Role) -> Result<(), RepositoryError> {
        for row in self.table.lock().unwrap().rows.iter_mut() {
            if row.user_id == user_id && row.role == role {
                row.is_read = true;
            }
        }
        Ok(())
    }

    async fn unread_count(&self, user_id: i64, role: Role) -> Result<u64, RepositoryError> {
        Ok(self
            .table
            .lock()
            .unwrap()
            .rows
            .iter()
            .filter(|n| n.user_id == user_id && n.role == role && !n.is_read)
            .count() as u64)
    }
}

// ---------------------------------------------------------------------------
// Booking repository
// ---------------------------------------------------------------------------

#[derive(Default)]
struct BookingTable {
    next_id: i64,
    rows: Vec<Booking>,
}

#[derive(Clone, Default)]
pub struct FakeBookingRepo {
    table: Arc<Mutex<BookingTable>>,
}

impl BookingRepository for FakeBookingRepo {
    async fn create(&self, booking: &NewBooking) -> Result<Booking, RepositoryError> {
        let mut table = self.table.lock().unwrap();
        table.next_id += 1;
        let row = Booking {
            id: table.next_id,
            provider_id: booking.provider_id,
            client_id: booking.client_id,
            service: booking.service.clone(),
            cost: booking.cost,
            address: booking.address.clone(),
            date: booking.date,
            time: booking.time,
            comments: booking.comments.clone(),
            status: BookingStatus::Active,
            created_at: Utc::now(),
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn on_date(
        &self,
        provider_id: i64,
        date: chrono::NaiveDate,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let mut rows: Vec<Booking> = self
            .table
            .lock()
            .unwrap()
            .rows
            .iter()
            .filter(|b| {
                b.provider_id == provider_id
                    && b.date == date
                    && b.status != BookingStatus::Cancelled
            })
            .cloned()
            .collect();
        rows.sort_by_key(|b| b.time);
        Ok(rows)
    }

    async fn complete(&self, booking_id: i64, provider_id: i64) -> Result<bool, RepositoryError> {
        let mut table = self.table.lock().unwrap();
        match table.rows.iter_mut().find(|b| {
            b.id == booking_id && b.provider_id == provider_id && b.status == BookingStatus::Active
        }) {
            Some(booking) => {
                booking.status = BookingStatus::Completed;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn cancel(&self, booking_id: i64, provider_id: i64) -> Result<bool, RepositoryError> {
        let mut table = self.table.lock().unwrap();
        match table.rows.iter_mut().find(|b| {
            b.id == booking_id && b.provider_id == provider_id && b.status == BookingStatus::Active
        }) {
            Some(booking) => {
                booking.status = BookingStatus::Cancelled;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// User repository
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct FakeUserRepo {
    rows: Arc<Mutex<HashMap<i64, User>>>,
}

impl FakeUserRepo {
    pub fn add(
        &self,
        user_id: i64,
        public_code: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) {
        self.rows.lock().unwrap().insert(
            user_id,
            User {
                user_id,
                public_code: public_code.to_string(),
                credential_hash: "hash".to_string(),
                first_name: first_name.map(str::to_string),
                last_name: last_name.map(str::to_string),
                created_at: Utc::now(),
            },
        );
    }
}

impl UserRepository for FakeUserRepo {
    async fn create(&self, user_id: i64, credential_hash: &str) -> Result<User, RepositoryError> {
        let user = User {
            user_id,
            public_code: format!("{:06}", user_id.rem_euclid(1_000_000)),
            credential_hash: credential_hash.to_string(),
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
        };
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&user_id) {
            return Err(RepositoryError::Conflict(format!("user {user_id} exists")));
        }
        rows.insert(user_id, user.clone());
        Ok(user)
    }

    async fn get(&self, user_id: i64) -> Result<Option<User>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(&user_id).cloned())
    }

    async fn find_by_public_code(&self, code: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.public_code == code)
            .cloned())
    }
}
