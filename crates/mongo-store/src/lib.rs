//! MongoDB implementation of the forum store contracts.
//!
//! Point reads and writes go through typed collections; the discussion-item
//! feeds are change streams filtered to insert events.

use async_trait::async_trait;
use bson::doc;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use mongodb::options::FullDocumentType;
use mongodb::{Client, Collection, Database};
use serde::de::DeserializeOwned;

use forum_core::{
    Answer, DocumentFeed, Evaluation, Notification, Prediction, Question, ReputationAdjustment,
    SentimentLabel, SentimentStore, SettlementStore, Stock, StoreError,
};

/// Database used when the connection string does not name one.
pub const DEFAULT_DATABASE: &str = "stockforumx";

/// Shared handle to the forum's document store.
#[derive(Clone)]
pub struct MongoForumStore {
    db: Database,
}

impl MongoForumStore {
    /// Connect to the store. The database comes from the URI path, falling
    /// back to [`DEFAULT_DATABASE`].
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        let db = client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE));
        Ok(Self { db })
    }

    /// Round-trip connectivity check, used as a startup gate.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        Ok(())
    }

    pub fn database_name(&self) -> &str {
        self.db.name()
    }

    fn predictions(&self) -> Collection<Prediction> {
        self.db.collection("predictions")
    }

    fn stocks(&self) -> Collection<Stock> {
        self.db.collection("stocks")
    }

    fn questions(&self) -> Collection<Question> {
        self.db.collection("questions")
    }

    fn notifications(&self) -> Collection<Notification> {
        self.db.collection("notifications")
    }

    async fn find_stock_by_id(&self, id: ObjectId) -> Result<Option<Stock>, StoreError> {
        self.stocks()
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| StoreError::Query(format!("stock {id}: {e}")))
    }

    /// Open a change stream over one collection, narrowed to insert events
    /// and mapped to the inserted documents.
    async fn insert_feed<T>(&self, collection: &str) -> Result<DocumentFeed<T>, StoreError>
    where
        T: DeserializeOwned + Unpin + Send + Sync + 'static,
    {
        let stream = self
            .db
            .collection::<T>(collection)
            .watch()
            .pipeline([doc! { "$match": { "operationType": "insert" } }])
            .full_document(FullDocumentType::UpdateLookup)
            .await
            .map_err(|e| StoreError::Subscribe(format!("{collection}: {e}")))?;

        Ok(stream
            .map(|event| match event {
                Ok(event) => event
                    .full_document
                    .ok_or_else(|| StoreError::Decode("insert event without document".into())),
                Err(e) => Err(StoreError::Decode(e.to_string())),
            })
            .boxed())
    }
}

#[async_trait]
impl SettlementStore for MongoForumStore {
    async fn due_predictions(&self, now: DateTime<Utc>) -> Result<Vec<Prediction>, StoreError> {
        let filter = doc! {
            "isEvaluated": false,
            "targetDate": { "$lte": bson::DateTime::from_chrono(now) },
        };
        let mut cursor = self
            .predictions()
            .find(filter)
            .await
            .map_err(|e| StoreError::Query(format!("due predictions: {e}")))?;

        let mut due = Vec::new();
        while let Some(item) = cursor.next().await {
            match item {
                Ok(prediction) => due.push(prediction),
                // One malformed document must not abort the whole sweep.
                Err(e) => tracing::warn!("skipping undecodable prediction: {e}"),
            }
        }
        Ok(due)
    }

    async fn find_stock(&self, id: ObjectId) -> Result<Option<Stock>, StoreError> {
        self.find_stock_by_id(id).await
    }

    async fn record_evaluation(
        &self,
        prediction_id: ObjectId,
        evaluation: &Evaluation,
    ) -> Result<(), StoreError> {
        self.predictions()
            .update_one(
                doc! { "_id": prediction_id },
                doc! { "$set": {
                    "isEvaluated": true,
                    "isCorrect": evaluation.is_correct,
                    "actualPrice": evaluation.actual_price,
                }},
            )
            .await
            .map_err(|e| StoreError::Write(format!("prediction {prediction_id}: {e}")))?;
        Ok(())
    }

    async fn apply_reputation(
        &self,
        user_id: ObjectId,
        adjustment: &ReputationAdjustment,
    ) -> Result<(), StoreError> {
        self.db
            .collection::<bson::Document>("users")
            .update_one(
                doc! { "_id": user_id },
                doc! { "$inc": {
                    "reputation": adjustment.reputation,
                    "totalPredictions": adjustment.total_predictions,
                    "accuratePredictions": adjustment.accurate_predictions,
                }},
            )
            .await
            .map_err(|e| StoreError::Write(format!("user {user_id}: {e}")))?;
        Ok(())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        self.notifications()
            .insert_one(notification)
            .await
            .map_err(|e| StoreError::Write(format!("notification: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl SentimentStore for MongoForumStore {
    async fn find_stock(&self, id: ObjectId) -> Result<Option<Stock>, StoreError> {
        self.find_stock_by_id(id).await
    }

    async fn find_question(&self, id: ObjectId) -> Result<Option<Question>, StoreError> {
        self.questions()
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| StoreError::Query(format!("question {id}: {e}")))
    }

    async fn set_stock_sentiment(
        &self,
        stock_id: ObjectId,
        score: f64,
        label: SentimentLabel,
    ) -> Result<(), StoreError> {
        self.stocks()
            .update_one(
                doc! { "_id": stock_id },
                doc! { "$set": {
                    "sentimentScore": score,
                    "sentimentLabel": label.as_str(),
                }},
            )
            .await
            .map_err(|e| StoreError::Write(format!("stock {stock_id}: {e}")))?;
        Ok(())
    }

    async fn question_feed(&self) -> Result<DocumentFeed<Question>, StoreError> {
        self.insert_feed("questions").await
    }

    async fn answer_feed(&self) -> Result<DocumentFeed<Answer>, StoreError> {
        self.insert_feed("answers").await
    }
}
