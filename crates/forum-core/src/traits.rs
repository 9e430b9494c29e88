use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;

use crate::{
    Answer, Evaluation, Notification, Prediction, Question, ReputationAdjustment, SentimentLabel,
    Stock, StoreError,
};

/// Insert events for one collection, delivered in store order.
///
/// A per-event decode failure surfaces as an `Err` item; the stream itself
/// stays open. Failing to open the feed at all is the only fatal case.
pub type DocumentFeed<T> = BoxStream<'static, Result<T, StoreError>>;

/// Store contract for the settlement engine.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// All unevaluated predictions whose target date is at or before `now`.
    /// Undecodable documents are skipped, not fatal to the scan.
    async fn due_predictions(&self, now: DateTime<Utc>) -> Result<Vec<Prediction>, StoreError>;

    async fn find_stock(&self, id: ObjectId) -> Result<Option<Stock>, StoreError>;

    /// Mark a prediction evaluated with its terminal outcome.
    async fn record_evaluation(
        &self,
        prediction_id: ObjectId,
        evaluation: &Evaluation,
    ) -> Result<(), StoreError>;

    /// Apply counter increments to a user. Increment-only.
    async fn apply_reputation(
        &self,
        user_id: ObjectId,
        adjustment: &ReputationAdjustment,
    ) -> Result<(), StoreError>;

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError>;
}

/// Store contract for the sentiment engine.
#[async_trait]
pub trait SentimentStore: Send + Sync {
    async fn find_stock(&self, id: ObjectId) -> Result<Option<Stock>, StoreError>;

    async fn find_question(&self, id: ObjectId) -> Result<Option<Question>, StoreError>;

    /// Overwrite a stock's smoothed sentiment fields.
    async fn set_stock_sentiment(
        &self,
        stock_id: ObjectId,
        score: f64,
        label: SentimentLabel,
    ) -> Result<(), StoreError>;

    async fn question_feed(&self) -> Result<DocumentFeed<Question>, StoreError>;

    async fn answer_feed(&self) -> Result<DocumentFeed<Answer>, StoreError>;
}
