//! Message DTOs - Data Transfer Objects for messages

use crate::engine::AnnotatedMessage;
use crate::entities::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Message without annotations
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageDTO {
    pub id: i64,
    pub body: String,
    pub sender: i64,
    pub thread: i64,
    pub sent_at: DateTime<Utc>,
}

impl From<Message> for MessageDTO {
    fn from(value: Message) -> Self {
        Self {
            id: value.message_id,
            body: value.body,
            sender: value.sender_id,
            thread: value.thread_id,
            sent_at: value.sent_at,
        }
    }
}

/// Message with read and notification annotations
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ComplexMessageDTO {
    pub id: i64,
    pub body: String,
    pub sender: i64,
    pub thread: i64,
    pub sent_at: DateTime<Utc>,
    pub is_notification: bool,
    pub readers: Vec<i64>,
}

impl From<AnnotatedMessage> for ComplexMessageDTO {
    fn from(value: AnnotatedMessage) -> Self {
        // annotations that were not computed serialize as "no"
        let is_notification = value.is_notification.unwrap_or(false);
        let readers = value
            .readers
            .map(|readers| readers.into_iter().collect())
            .unwrap_or_default();
        let message = value.message;

        Self {
            id: message.message_id,
            body: message.body,
            sender: message.sender_id,
            thread: message.thread_id,
            sent_at: message.sent_at,
            is_notification,
            readers,
        }
    }
}

/// One page of messages of a thread
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessagesPageDTO {
    pub count: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<ComplexMessageDTO>,
}

/// Body of `POST /messages/{thread_id}`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct PostMessageDTO {
    #[validate(length(min = 1, message = "Message body must not be empty"))]
    pub body: String,
}

/// DTO to create a new message (without message_id)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateMessageDTO {
    pub thread_id: i64,
    pub sender_id: i64,

    #[validate(length(min = 1, message = "Message body must not be empty"))]
    pub body: String,

    pub sent_at: DateTime<Utc>,
}
