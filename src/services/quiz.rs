/// Server-held quiz flows
///
/// Each flow walks `Answering → LoadingInitial → ShowingResults ⇄
/// LoadingMore`, and `restart` drops it back to `Answering` with an empty
/// session. A flow has one writer at a time: asking for a round while one is
/// loading is a conflict. Rounds run to completion even if the requesting
/// client goes away; a restart while loading makes the late result stale,
/// and it is discarded.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{MergeMode, ResolvedItem, Session},
    services::{
        accumulator,
        recommendations::{intent_from_tags, RecommendationPipeline, RoundOutcome},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    Answering,
    LoadingInitial,
    ShowingResults,
    LoadingMore,
}

impl QuizState {
    pub fn is_loading(self) -> bool {
        matches!(self, QuizState::LoadingInitial | QuizState::LoadingMore)
    }
}

#[derive(Debug, Clone)]
struct QuizFlow {
    state: QuizState,
    session: Session,
    intent: Option<String>,
    summary: String,
    clarification: Option<String>,
    /// Bumped on restart so in-flight rounds can tell they are stale
    epoch: u64,
    last_active: DateTime<Utc>,
}

impl QuizFlow {
    fn new() -> Self {
        Self {
            state: QuizState::Answering,
            session: Session::new(),
            intent: None,
            summary: String::new(),
            clarification: None,
            epoch: 0,
            last_active: Utc::now(),
        }
    }

    fn view(&self, id: Uuid) -> QuizView {
        QuizView {
            id,
            state: self.state,
            summary: self.summary.clone(),
            clarification: self.clarification.clone(),
            movies: self.session.accumulated_items.clone(),
            excluded_titles: self.session.exclusion_titles(),
            rounds: self.session.rounds,
        }
    }
}

/// Client-facing snapshot of a quiz flow
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub id: Uuid,
    pub state: QuizState,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification: Option<String>,
    pub movies: Vec<ResolvedItem>,
    pub excluded_titles: Vec<String>,
    pub rounds: u32,
}

/// A round that has been admitted and must be finished with [`SessionStore::finish_round`]
#[derive(Debug, Clone)]
pub struct RoundTicket {
    pub id: Uuid,
    pub epoch: u64,
    pub mode: MergeMode,
    pub intent: String,
    pub exclusions: Vec<String>,
}

/// In-memory quiz flows keyed by id
#[derive(Clone)]
pub struct SessionStore {
    flows: Arc<RwLock<HashMap<Uuid, QuizFlow>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            flows: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn create(&self) -> QuizView {
        let id = Uuid::new_v4();
        let flow = QuizFlow::new();
        let view = flow.view(id);
        self.flows.write().await.insert(id, flow);

        tracing::info!(quiz_id = %id, "Quiz flow created");
        view
    }

    pub async fn view(&self, id: Uuid) -> AppResult<QuizView> {
        let flows = self.flows.read().await;
        flows
            .get(&id)
            .map(|flow| flow.view(id))
            .ok_or_else(|| not_found(id))
    }

    /// Ends the flow entirely
    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        self.flows
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| not_found(id))?;

        tracing::info!(quiz_id = %id, "Quiz flow removed");
        Ok(())
    }

    /// Discards the session and returns the flow to `Answering`
    pub async fn restart(&self, id: Uuid) -> AppResult<QuizView> {
        let mut flows = self.flows.write().await;
        let flow = flows.get_mut(&id).ok_or_else(|| not_found(id))?;

        let epoch = flow.epoch + 1;
        *flow = QuizFlow { epoch, ..QuizFlow::new() };

        tracing::info!(quiz_id = %id, epoch, "Quiz flow restarted");
        Ok(flow.view(id))
    }

    /// Admits a round, moving the flow into its loading state
    ///
    /// `Some(intent)` starts the initial round from `Answering`; `None` asks
    /// for more from `ShowingResults`, reusing the stored intent.
    pub async fn begin_round(&self, id: Uuid, intent: Option<String>) -> AppResult<RoundTicket> {
        let mut flows = self.flows.write().await;
        let flow = flows.get_mut(&id).ok_or_else(|| not_found(id))?;

        if flow.state.is_loading() {
            return Err(AppError::Conflict(
                "a round is already loading for this quiz".to_string(),
            ));
        }

        let (mode, intent) = match (flow.state, intent) {
            (QuizState::Answering, Some(intent)) => (MergeMode::Replace, intent),
            (QuizState::ShowingResults, None) => {
                let intent = flow.intent.clone().ok_or_else(|| {
                    AppError::Internal("quiz is showing results without an intent".to_string())
                })?;
                (MergeMode::Append, intent)
            }
            (QuizState::Answering, None) => {
                return Err(AppError::Conflict(
                    "quiz has no results yet; complete it first".to_string(),
                ))
            }
            (_, Some(_)) => {
                return Err(AppError::Conflict(
                    "quiz is already complete; restart it to answer again".to_string(),
                ))
            }
            (state, None) => {
                return Err(AppError::Conflict(format!(
                    "cannot load more while {:?}",
                    state
                )))
            }
        };

        flow.state = match mode {
            MergeMode::Replace => QuizState::LoadingInitial,
            MergeMode::Append => QuizState::LoadingMore,
        };
        flow.last_active = Utc::now();

        let exclusions = match mode {
            MergeMode::Replace => Vec::new(),
            MergeMode::Append => flow.session.exclusion_titles(),
        };

        Ok(RoundTicket {
            id,
            epoch: flow.epoch,
            mode,
            intent,
            exclusions,
        })
    }

    /// Applies a round's outcome, or rolls the state back if it failed
    pub async fn finish_round(
        &self,
        ticket: RoundTicket,
        outcome: AppResult<RoundOutcome>,
    ) -> AppResult<QuizView> {
        let mut flows = self.flows.write().await;
        let flow = flows.get_mut(&ticket.id).ok_or_else(|| not_found(ticket.id))?;

        if flow.epoch != ticket.epoch {
            tracing::info!(quiz_id = %ticket.id, "Discarding round result from before a restart");
            return Err(AppError::Conflict(
                "quiz was restarted while loading".to_string(),
            ));
        }

        let settled = match ticket.mode {
            MergeMode::Replace => QuizState::Answering,
            MergeMode::Append => QuizState::ShowingResults,
        };
        flow.last_active = Utc::now();

        match outcome {
            Err(e) => {
                flow.state = settled;
                Err(e)
            }
            Ok(RoundOutcome::Clarification { question }) => {
                flow.state = settled;
                flow.clarification = Some(question);
                Ok(flow.view(ticket.id))
            }
            Ok(RoundOutcome::Recommendations { summary, items }) => {
                let session = std::mem::take(&mut flow.session);
                flow.session = accumulator::merge(session, items, ticket.mode);
                flow.summary = summary;
                flow.clarification = None;
                if ticket.mode == MergeMode::Replace {
                    flow.intent = Some(ticket.intent);
                }
                flow.state = QuizState::ShowingResults;
                Ok(flow.view(ticket.id))
            }
        }
    }

    /// Drops idle flows; loading flows are left alone
    pub async fn purge_expired(&self) -> usize {
        let cutoff = Utc::now() - self.ttl;
        let mut flows = self.flows.write().await;
        let before = flows.len();
        flows.retain(|_, flow| flow.state.is_loading() || flow.last_active > cutoff);
        before - flows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.flows.read().await.is_empty()
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("quiz {} not found", id))
}

/// Quiz flows wired to the recommendation pipeline
#[derive(Clone)]
pub struct QuizService {
    store: SessionStore,
    pipeline: RecommendationPipeline,
}

impl QuizService {
    pub fn new(store: SessionStore, pipeline: RecommendationPipeline) -> Self {
        Self { store, pipeline }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Runs the initial round from the quiz's tags (replace mode)
    pub async fn complete(&self, id: Uuid, tags: &[String]) -> AppResult<QuizView> {
        let intent = intent_from_tags(tags)?;
        let ticket = self.store.begin_round(id, Some(intent)).await?;
        self.run(ticket).await
    }

    /// Runs a "show more" round excluding everything shown so far (append mode)
    pub async fn more(&self, id: Uuid) -> AppResult<QuizView> {
        let ticket = self.store.begin_round(id, None).await?;
        self.run(ticket).await
    }

    /// The round runs on its own task so a dropped request cannot strand the
    /// flow in a loading state
    async fn run(&self, ticket: RoundTicket) -> AppResult<QuizView> {
        let service = self.clone();
        let task = tokio::spawn(async move {
            tracing::info!(
                quiz_id = %ticket.id,
                mode = ?ticket.mode,
                excluded = ticket.exclusions.len(),
                "Quiz round started"
            );
            let outcome = service
                .pipeline
                .run_round(&ticket.intent, &ticket.exclusions)
                .await;
            service.store.finish_round(ticket, outcome).await
        });

        task.await
            .map_err(|e| AppError::Internal(format!("quiz round task failed: {}", e)))?
    }
}

/// Periodically purges idle quiz flows
pub fn spawn_expiry_sweeper(store: SessionStore, every: StdDuration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = store.purge_expired().await;
            if purged > 0 {
                tracing::info!(purged, "Expired idle quiz flows");
            }
        }
    })
}
