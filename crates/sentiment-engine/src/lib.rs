//! Scores newly posted discussion items and folds the result into each
//! stock's smoothed sentiment metric.

use std::sync::Arc;

use bson::oid::ObjectId;
use futures_util::StreamExt;
use tokio::sync::watch;

use forum_core::{Answer, DocumentFeed, Question, SentimentLabel, SentimentStore, StoreError};

pub mod scorer;
pub use scorer::{KeywordScorer, BEARISH_WORDS, BULLISH_WORDS};


/// Weight kept from the previous smoothed score.
const SMOOTHING_RETAINED: f64 = 0.7;
/// Weight given to the new raw reading.
const SMOOTHING_APPLIED: f64 = 0.3;
/// Raw reading for a keyword score of zero.
const NEUTRAL_BASELINE: f64 = 50.0;
/// Raw-reading shift per net keyword hit.
const POINTS_PER_KEYWORD: f64 = 10.0;

/// Fold one keyword score into a smoothed sentiment reading.
///
/// Exponential moving average toward `50 + score*10`, clamped to [0, 100].
pub fn next_sentiment(old_score: f64, keyword_score: i32) -> (f64, SentimentLabel) {
    let raw = NEUTRAL_BASELINE + f64::from(keyword_score) * POINTS_PER_KEYWORD;
    let smoothed = (old_score * SMOOTHING_RETAINED + raw * SMOOTHING_APPLIED).clamp(0.0, 100.0);
    (smoothed, SentimentLabel::from_score(smoothed))
}

pub struct SentimentEngine<S> {
    store: Arc<S>,
    scorer: KeywordScorer,
}

impl<S> SentimentEngine<S>
where
    S: SentimentStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_scorer(store, KeywordScorer::new())
    }

    pub fn with_scorer(store: Arc<S>, scorer: KeywordScorer) -> Self {
        Self { store, scorer }
    }

    /// Open both discussion feeds and consume them until shutdown.
    ///
    /// Failing to open either feed is fatal and propagates; after that,
    /// every per-event failure is logged and skipped. The two watchers run
    /// as independent tasks, each internally sequential.
    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> Result<(), StoreError> {
        let questions = self.store.question_feed().await?;
        let answers = self.store.answer_feed().await?;
        tracing::info!("sentiment engine started, watching questions and answers");

        let question_task = tokio::spawn({
            let engine = Arc::clone(&self);
            let shutdown = shutdown.clone();
            async move { engine.consume_questions(questions, shutdown).await }
        });
        let answer_task = tokio::spawn({
            let engine = Arc::clone(&self);
            async move { engine.consume_answers(answers, shutdown).await }
        });

        let (questions, answers) = tokio::join!(question_task, answer_task);
        questions.map_err(|e| StoreError::Subscribe(format!("question watcher failed: {e}")))?;
        answers.map_err(|e| StoreError::Subscribe(format!("answer watcher failed: {e}")))?;
        tracing::info!("sentiment engine stopped");
        Ok(())
    }

    /// Process question insert events one at a time until shutdown or feed end.
    pub async fn consume_questions(
        &self,
        mut feed: DocumentFeed<Question>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                event = feed.next() => match event {
                    Some(Ok(question)) => self.process_question(&question).await,
                    Some(Err(e)) => tracing::warn!("question event dropped: {e}"),
                    None => {
                        tracing::warn!("question feed closed");
                        break;
                    }
                }
            }
        }
    }

    /// Process answer insert events one at a time until shutdown or feed end.
    pub async fn consume_answers(
        &self,
        mut feed: DocumentFeed<Answer>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                event = feed.next() => match event {
                    Some(Ok(answer)) => self.process_answer(&answer).await,
                    Some(Err(e)) => tracing::warn!("answer event dropped: {e}"),
                    None => {
                        tracing::warn!("answer feed closed");
                        break;
                    }
                }
            }
        }
    }

    /// A question names its stock directly; title and content both count.
    pub async fn process_question(&self, question: &Question) {
        let text = format!("{} {}", question.title, question.content);
        self.fold_into_stock(question.stock_id, &text).await;
    }

    /// An answer reaches its stock through the parent question. A missing
    /// parent drops the event.
    pub async fn process_answer(&self, answer: &Answer) {
        let question = match self.store.find_question(answer.question_id).await {
            Ok(Some(question)) => question,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(
                    question = %answer.question_id,
                    "question lookup failed, dropping answer: {e}"
                );
                return;
            }
        };
        self.fold_into_stock(question.stock_id, &answer.content).await;
    }

    async fn fold_into_stock(&self, stock_id: ObjectId, text: &str) {
        let keyword_score = self.scorer.score(text);
        tracing::debug!(stock = %stock_id, keyword_score, "scored discussion text");

        let stock = match self.store.find_stock(stock_id).await {
            Ok(Some(stock)) => stock,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(stock = %stock_id, "stock lookup failed: {e}");
                return;
            }
        };

        let (score, label) = next_sentiment(stock.sentiment_score, keyword_score);
        match self.store.set_stock_sentiment(stock_id, score, label).await {
            Ok(()) => {
                tracing::debug!(
                    symbol = %stock.symbol,
                    score,
                    label = label.as_str(),
                    "sentiment updated"
                );
            }
            Err(e) => tracing::warn!(symbol = %stock.symbol, "failed to update sentiment: {e}"),
        }
    }
}
