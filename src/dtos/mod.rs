//! DTOs module - Data Transfer Objects
//!
//! Creation/update DTOs consumed by the repositories, and the wire shapes used
//! by the HTTP adapter. DTOs keep the external representation apart from the
//! entities.

pub mod message;
pub mod notification;
pub mod participant;
pub mod participation;
pub mod query;
pub mod thread;

// Re-exports
pub use message::{ComplexMessageDTO, CreateMessageDTO, MessageDTO, MessagesPageDTO, PostMessageDTO};
pub use notification::NotificationCheckDTO;
pub use participant::ParticipantDTO;
pub use participation::CreateParticipationDTO;
pub use query::{LatestMessagesQuery, PageQuery};
pub use thread::{
    AddParticipantsDTO, CreateThreadDTO, CreateThreadRequestDTO, RemovableParticipantsDTO,
    RemoveParticipantDTO, ThreadDTO, UpdateThreadDTO, UpdateThreadRequestDTO,
};
