//! MessageRepository - Immutable messages and the per-thread aggregates

use super::{Create, Read};
use crate::dtos::CreateMessageDTO;
use crate::entities::Message;
use chrono::{DateTime, Utc};
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct MessageRepository {
    connection_pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Number of messages the sender posted at or after `since`
    #[instrument(skip(self))]
    pub async fn count_sent_since(&self, sender_id: &i64, since: &DateTime<Utc>) -> Result<i64, Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE sender_id = ? AND sent_at >= ?",
        )
        .bind(sender_id)
        .bind(since)
        .fetch_one(&self.connection_pool)
        .await?;

        debug!("Sender posted {} messages in the window", count);
        Ok(count)
    }

    /// All messages of a thread, newest first
    #[instrument(skip(self))]
    pub async fn find_many_by_thread_id(&self, thread_id: &i64) -> Result<Vec<Message>, Error> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT message_id, thread_id, sender_id, body, sent_at
            FROM messages
            WHERE thread_id = ?
            ORDER BY message_id DESC
            "#,
        )
        .bind(thread_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(messages)
    }

    /// The message with the highest id of each given thread, newest first.
    /// Threads without messages contribute nothing.
    #[instrument(skip(self, thread_ids), fields(count = thread_ids.len()))]
    pub async fn find_latest_per_thread(&self, thread_ids: &[i64]) -> Result<Vec<Message>, Error> {
        if thread_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT message_id, thread_id, sender_id, body, sent_at
            FROM messages
            WHERE message_id IN (
                SELECT MAX(message_id) FROM messages WHERE thread_id IN ("#,
        );
        let mut separated = query_builder.separated(", ");
        for thread_id in thread_ids {
            separated.push_bind(*thread_id);
        }
        separated.push_unseparated(") GROUP BY thread_id) ORDER BY message_id DESC");

        let messages = query_builder
            .build_query_as::<Message>()
            .fetch_all(&self.connection_pool)
            .await?;

        debug!("Found latest message for {} threads", messages.len());
        Ok(messages)
    }
}

impl Create<Message, CreateMessageDTO> for MessageRepository {
    #[instrument(skip(self, data), fields(thread_id = %data.thread_id, sender_id = %data.sender_id))]
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, Error> {
        debug!("Creating new message");
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (thread_id, sender_id, body, sent_at)
            VALUES (?, ?, ?, ?)
            RETURNING message_id, thread_id, sender_id, body, sent_at
            "#,
        )
        .bind(data.thread_id)
        .bind(data.sender_id)
        .bind(&data.body)
        .bind(data.sent_at)
        .fetch_one(&self.connection_pool)
        .await?;

        info!("Message created with id {}", message.message_id);
        Ok(message)
    }
}

impl Read<Message, i64> for MessageRepository {
    #[instrument(skip(self), fields(message_id = %id))]
    async fn read(&self, id: &i64) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(
            "SELECT message_id, thread_id, sender_id, body, sent_at FROM messages WHERE message_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::connect_in_memory;
    use crate::dtos::CreateThreadDTO;
    use crate::repositories::ThreadRepository;
    use chrono::Duration;

    async fn setup() -> sqlx::Result<(MessageRepository, ThreadRepository)> {
        let pool = connect_in_memory().await?;
        Ok((MessageRepository::new(pool.clone()), ThreadRepository::new(pool)))
    }

    async fn post(
        repo: &MessageRepository,
        thread_id: i64,
        sender_id: i64,
        sent_at: DateTime<Utc>,
    ) -> sqlx::Result<Message> {
        repo.create(&CreateMessageDTO {
            thread_id,
            sender_id,
            body: "hello".to_string(),
            sent_at,
        })
        .await
    }

    #[tokio::test]
    async fn test_count_sent_since_uses_the_window() -> sqlx::Result<()> {
        let (messages, threads) = setup().await?;
        let (thread, _) = threads
            .create_with_participants(&CreateThreadDTO::default(), &[1, 2], Utc::now())
            .await?;
        let now = Utc::now();

        post(&messages, thread.thread_id, 1, now - Duration::hours(30)).await?;
        post(&messages, thread.thread_id, 1, now - Duration::hours(2)).await?;
        post(&messages, thread.thread_id, 1, now).await?;
        post(&messages, thread.thread_id, 2, now).await?;

        let count = messages.count_sent_since(&1, &(now - Duration::hours(24))).await?;
        assert_eq!(count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_latest_per_thread_orders_by_id() -> sqlx::Result<()> {
        let (messages, threads) = setup().await?;
        let (first, _) = threads
            .create_with_participants(&CreateThreadDTO::default(), &[1, 2], Utc::now())
            .await?;
        let (second, _) = threads
            .create_with_participants(&CreateThreadDTO::default(), &[1, 3], Utc::now())
            .await?;
        let (empty, _) = threads
            .create_with_participants(&CreateThreadDTO::default(), &[1, 4], Utc::now())
            .await?;
        let now = Utc::now();

        post(&messages, first.thread_id, 1, now).await?;
        let m2 = post(&messages, second.thread_id, 3, now).await?;
        let m3 = post(&messages, first.thread_id, 2, now).await?;

        let latest = messages
            .find_latest_per_thread(&[first.thread_id, second.thread_id, empty.thread_id])
            .await?;

        assert_eq!(latest, vec![m3, m2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_thread_messages_are_newest_first() -> sqlx::Result<()> {
        let (messages, threads) = setup().await?;
        let (thread, _) = threads
            .create_with_participants(&CreateThreadDTO::default(), &[1, 2], Utc::now())
            .await?;

        let m1 = post(&messages, thread.thread_id, 1, Utc::now()).await?;
        let m2 = post(&messages, thread.thread_id, 2, Utc::now()).await?;

        assert_eq!(messages.find_many_by_thread_id(&thread.thread_id).await?, vec![m2, m1.clone()]);
        assert_eq!(messages.read(&m1.message_id).await?, Some(m1));
        assert!(messages.find_many_by_thread_id(&999).await?.is_empty());
        Ok(())
    }
}
