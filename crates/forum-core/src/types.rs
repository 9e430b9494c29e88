use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reputation awarded for a correct prediction.
pub const REPUTATION_REWARD: i32 = 25;
/// Reputation deducted for an incorrect prediction.
pub const REPUTATION_PENALTY: i32 = 10;

/// Kind of wager a prediction makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionType {
    /// The stock will reach a specific target price.
    Price,
    /// The stock will move in a given direction from its initial price.
    Direction,
}

impl PredictionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionType::Price => "price",
            PredictionType::Direction => "direction",
        }
    }
}

/// Direction of a directional prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// A user-submitted prediction, as read back for settlement.
///
/// `isCorrect`/`actualPrice` are written exactly once at settlement (see
/// [`Evaluation`]) and never read here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub stock_id: ObjectId,
    pub user_id: ObjectId,
    pub prediction_type: PredictionType,
    /// Set when `prediction_type` is `price`.
    #[serde(default)]
    pub target_price: Option<f64>,
    /// Set when `prediction_type` is `direction`.
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub target_date: DateTime<Utc>,
    /// Price at creation time. Immutable.
    pub initial_price: f64,
    pub is_evaluated: bool,
}

/// Terminal settlement outcome written onto a prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub is_correct: bool,
    /// The stock's current price at evaluation time.
    pub actual_price: f64,
}

/// Increment-only counter deltas applied to a user at settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReputationAdjustment {
    pub reputation: i32,
    pub total_predictions: i32,
    pub accurate_predictions: i32,
}

impl ReputationAdjustment {
    pub fn for_outcome(is_correct: bool) -> Self {
        Self {
            reputation: if is_correct {
                REPUTATION_REWARD
            } else {
                -REPUTATION_PENALTY
            },
            total_predictions: 1,
            accurate_predictions: i32::from(is_correct),
        }
    }
}

/// A listed stock. `currentPrice` is maintained by the application layer
/// and read-only to both engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub symbol: String,
    pub current_price: f64,
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub sentiment_label: Option<SentimentLabel>,
}

/// Bucketed description of a smoothed sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Bullish,
    #[serde(rename = "Somewhat Bullish")]
    SomewhatBullish,
    Neutral,
    #[serde(rename = "Somewhat Bearish")]
    SomewhatBearish,
    Bearish,
}

impl SentimentLabel {
    /// Derive the label from a smoothed score in [0, 100].
    ///
    /// Branch order matters: both bullish checks are tried before either
    /// bearish check, so scores in (40, 60] land on Neutral.
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            SentimentLabel::Bullish
        } else if score > 60.0 {
            SentimentLabel::SomewhatBullish
        } else if score < 20.0 {
            SentimentLabel::Bearish
        } else if score < 40.0 {
            SentimentLabel::SomewhatBearish
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "Bullish",
            SentimentLabel::SomewhatBullish => "Somewhat Bullish",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::SomewhatBearish => "Somewhat Bearish",
            SentimentLabel::Bearish => "Bearish",
        }
    }
}

/// Notification category. The settlement engine only emits `System`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    System,
}

/// A notification delivered to a user's inbox. Insert-only from this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipient: ObjectId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub content: String,
    pub is_read: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Build an unread system notification stamped with the current time.
    pub fn system(recipient: ObjectId, content: String) -> Self {
        let now = Utc::now();
        Self {
            recipient,
            kind: NotificationKind::System,
            content,
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A forum question. Owns its stock reference directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub stock_id: ObjectId,
    pub title: String,
    pub content: String,
}

/// A forum answer. Reaches its stock through the parent question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub question_id: ObjectId,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_boundaries() {
        let cases = [
            (10.0, SentimentLabel::Bearish),
            (19.0, SentimentLabel::Bearish),
            (20.0, SentimentLabel::SomewhatBearish),
            (39.0, SentimentLabel::SomewhatBearish),
            (40.0, SentimentLabel::Neutral),
            (50.0, SentimentLabel::Neutral),
            (60.0, SentimentLabel::Neutral),
            (61.0, SentimentLabel::SomewhatBullish),
            (80.0, SentimentLabel::SomewhatBullish),
            (81.0, SentimentLabel::Bullish),
            (100.0, SentimentLabel::Bullish),
        ];
        for (score, expected) in cases {
            assert_eq!(
                SentimentLabel::from_score(score),
                expected,
                "score {score}"
            );
        }
    }

    #[test]
    fn label_wire_form_uses_display_strings() {
        let label = bson::to_bson(&SentimentLabel::SomewhatBullish).unwrap();
        assert_eq!(label, bson::Bson::String("Somewhat Bullish".into()));

        let parsed: SentimentLabel =
            bson::from_bson(bson::Bson::String("Somewhat Bearish".into())).unwrap();
        assert_eq!(parsed, SentimentLabel::SomewhatBearish);
    }

    #[test]
    fn reputation_adjustment_per_outcome() {
        let correct = ReputationAdjustment::for_outcome(true);
        assert_eq!(correct.reputation, 25);
        assert_eq!(correct.total_predictions, 1);
        assert_eq!(correct.accurate_predictions, 1);

        let incorrect = ReputationAdjustment::for_outcome(false);
        assert_eq!(incorrect.reputation, -10);
        assert_eq!(incorrect.total_predictions, 1);
        assert_eq!(incorrect.accurate_predictions, 0);
    }

    #[test]
    fn prediction_decodes_store_field_names() {
        let doc = bson::doc! {
            "_id": ObjectId::new(),
            "stockId": ObjectId::new(),
            "userId": ObjectId::new(),
            "predictionType": "direction",
            "direction": "down",
            "targetDate": bson::DateTime::now(),
            "initialPrice": 50.0,
            "isEvaluated": false,
        };
        let prediction: Prediction = bson::from_document(doc).unwrap();
        assert_eq!(prediction.prediction_type, PredictionType::Direction);
        assert_eq!(prediction.direction, Some(Direction::Down));
        assert_eq!(prediction.target_price, None);
        assert!(!prediction.is_evaluated);
    }

    #[test]
    fn notification_starts_unread_and_system() {
        let notification = Notification::system(ObjectId::new(), "hello".into());
        assert!(!notification.is_read);
        assert_eq!(notification.kind, NotificationKind::System);

        let doc = bson::to_document(&notification).unwrap();
        assert_eq!(doc.get_str("type").unwrap(), "SYSTEM");
        assert!(doc.get_datetime("createdAt").is_ok());
    }
}
