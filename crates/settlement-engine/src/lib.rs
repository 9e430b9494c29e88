//! Resolves due predictions against live prices and applies the reputation
//! and notification side effects.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use forum_core::{
    Direction, Evaluation, Notification, Prediction, PredictionType, ReputationAdjustment,
    SettlementStore,
};


pub struct SettlementEngine<S> {
    store: Arc<S>,
}

impl<S: SettlementStore> SettlementEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Sweep immediately, then once per `period` until shutdown.
    ///
    /// Sweeps never overlap: the next tick is not taken until the previous
    /// sweep finishes, and ticks missed during an overrun are absorbed.
    pub async fn run(&self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            period_secs = period.as_secs(),
            "settlement engine started, scanning for pending predictions"
        );
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => self.run_sweep(Utc::now()).await,
            }
        }
        tracing::info!("settlement engine stopped");
    }

    /// Settle every unevaluated prediction due at or before `now`.
    pub async fn run_sweep(&self, now: DateTime<Utc>) {
        let due = match self.store.due_predictions(now).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!("failed to fetch due predictions: {e}");
                return;
            }
        };
        if due.is_empty() {
            tracing::debug!("no due predictions");
            return;
        }

        tracing::info!(count = due.len(), "settling due predictions");
        for prediction in &due {
            self.settle(prediction).await;
        }
    }

    async fn settle(&self, prediction: &Prediction) {
        let stock = match self.store.find_stock(prediction.stock_id).await {
            Ok(Some(stock)) => stock,
            Ok(None) => {
                tracing::warn!(stock = %prediction.stock_id, "stock not found, skipping prediction");
                return;
            }
            Err(e) => {
                tracing::warn!(stock = %prediction.stock_id, "stock lookup failed, skipping prediction: {e}");
                return;
            }
        };

        let is_correct = classify_outcome(prediction, stock.current_price);
        let adjustment = ReputationAdjustment::for_outcome(is_correct);
        let outcome = if is_correct { "CORRECT" } else { "INCORRECT" };

        tracing::info!(
            kind = prediction.prediction_type.as_str(),
            symbol = %stock.symbol,
            user = %prediction.user_id,
            outcome,
            "resolving prediction"
        );

        // Three independent writes, each fire-and-forget. Once the first one
        // lands the prediction is out of the due set for good, so a failure
        // further down is dropped rather than retried.
        let evaluation = Evaluation {
            is_correct,
            actual_price: stock.current_price,
        };
        if let Err(e) = self
            .store
            .record_evaluation(prediction.id, &evaluation)
            .await
        {
            tracing::warn!(prediction = %prediction.id, "failed to record evaluation: {e}");
        }

        if let Err(e) = self
            .store
            .apply_reputation(prediction.user_id, &adjustment)
            .await
        {
            tracing::warn!(user = %prediction.user_id, "failed to adjust reputation: {e}");
        }

        let content = format!(
            "Your {} prediction for {} was {}! {} points.",
            prediction.prediction_type.as_str(),
            stock.symbol,
            outcome,
            adjustment.reputation
        );
        let notification = Notification::system(prediction.user_id, content);
        if let Err(e) = self.store.insert_notification(&notification).await {
            tracing::warn!(user = %prediction.user_id, "failed to insert notification: {e}");
        }
    }
}

/// Classify a due prediction against the stock's current price.
///
/// Price targets are judged at evaluation time only, not against any
/// intra-interval peak. Directional predictions use strict comparison, so
/// an unchanged price is incorrect either way. A price target exactly equal
/// to the initial price satisfies neither branch and resolves incorrect.
pub fn classify_outcome(prediction: &Prediction, current_price: f64) -> bool {
    match prediction.prediction_type {
        PredictionType::Price => {
            let target = prediction.target_price.unwrap_or(prediction.initial_price);
            if target > prediction.initial_price {
                current_price >= target
            } else if target < prediction.initial_price {
                current_price <= target
            } else {
                false
            }
        }
        PredictionType::Direction => match prediction.direction {
            Some(Direction::Up) => current_price > prediction.initial_price,
            Some(Direction::Down) => current_price < prediction.initial_price,
            None => false,
        },
    }
}
