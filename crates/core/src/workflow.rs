use crate::fallback::FallbackResponder;
use crate::generator::AnswerGenerator;
use crate::grader::RelevanceGrader;
use crate::rewriter::QueryRewriter;
use crate::traits::{ChatModel, DocumentStore, WebSearchModel};
use crate::{GradeError, PipelineAnswer, PipelineError, PipelineOptions, WorkflowState};
use tracing::{debug, info, warn};

/// States of one corrective-RAG invocation. Decide is the only conditional
/// edge; Rewrite leads unconditionally into Fallback (a single correction
/// attempt, never a second retrieval).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Init,
    Retrieve,
    Grade,
    Decide,
    Generate,
    Rewrite,
    Fallback,
    Done,
}

/// Coordinates retrieval, per-document grading, grounded generation and the
/// rewrite-plus-web-search fallback into one request/response cycle.
///
/// Generic over the document store, the grading (filter) model, the basic
/// rewrite/generation model and the web-search model, so tests can swap in
/// fakes at every seam.
pub struct CorrectiveWorkflow<S, F, B, W>
where
    S: DocumentStore,
    F: ChatModel,
    B: ChatModel,
    W: WebSearchModel,
{
    store: S,
    grader: RelevanceGrader<F>,
    rewriter: QueryRewriter<B>,
    generator: AnswerGenerator<B>,
    fallback: FallbackResponder<W>,
    top_k: usize,
}

impl<S, F, B, W> CorrectiveWorkflow<S, F, B, W>
where
    S: DocumentStore + Send + Sync,
    F: ChatModel + Send + Sync,
    B: ChatModel + Clone + Send + Sync,
    W: WebSearchModel + Send + Sync,
{
    pub fn new(
        store: S,
        filter_model: F,
        basic_model: B,
        web_model: W,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            grader: RelevanceGrader::new(filter_model, options.grade_interval),
            rewriter: QueryRewriter::new(basic_model.clone()),
            generator: AnswerGenerator::new(basic_model),
            fallback: FallbackResponder::new(web_model),
            top_k: options.top_k,
        }
    }

    /// Runs one query through the state machine. Each external call is
    /// attempted exactly once; there are no retries on any path.
    pub async fn run(&self, query: &str) -> Result<PipelineAnswer, PipelineError> {
        let mut state = WorkflowState::new(query);
        let mut stage = Stage::Init;

        while stage != Stage::Done {
            stage = self.step(stage, &mut state).await?;
        }

        Ok(PipelineAnswer {
            response: state.response,
            metadata: state.response_metadata,
        })
    }

    async fn step(&self, stage: Stage, state: &mut WorkflowState) -> Result<Stage, PipelineError> {
        match stage {
            Stage::Init => {
                self.grader
                    .ensure_configured()
                    .and_then(|_| self.rewriter.ensure_configured())
                    .and_then(|_| self.fallback.ensure_configured())
                    .map_err(|error| PipelineError::Configuration(error.to_string()))?;
                Ok(Stage::Retrieve)
            }

            Stage::Retrieve => {
                state.candidate_documents = self
                    .store
                    .search(&state.query, self.top_k)
                    .await
                    .map_err(PipelineError::Retrieval)?;
                debug!(
                    candidates = state.candidate_documents.len(),
                    "retrieved candidate documents"
                );
                Ok(Stage::Grade)
            }

            Stage::Grade => {
                // Strictly sequential: the grader's limiter enforces the
                // provider's inter-call spacing, and parallel grading would
                // defeat it.
                let mut survivors = Vec::new();
                for document in &state.candidate_documents {
                    match self.grader.grade(document, &state.query).await {
                        Ok(verdict) if verdict.is_relevant() => survivors.push(document.clone()),
                        Ok(_) => {}
                        Err(GradeError::Verdict { raw }) => {
                            warn!(raw = %raw, "excluding document with unparseable relevance verdict");
                        }
                        Err(GradeError::Backend(source)) => {
                            return Err(PipelineError::ModelCall {
                                stage: "grade",
                                source,
                            });
                        }
                    }
                }
                state.filtered_documents = survivors;
                Ok(Stage::Decide)
            }

            Stage::Decide => {
                if state.filtered_documents.is_empty() {
                    Ok(Stage::Rewrite)
                } else {
                    Ok(Stage::Generate)
                }
            }

            Stage::Generate => {
                let answer = self
                    .generator
                    .generate(&state.query, &state.filtered_documents)
                    .await
                    .map_err(|source| PipelineError::ModelCall {
                        stage: "generate",
                        source,
                    })?;
                state.response = answer.response;
                state.response_metadata = Some(answer.metadata);
                Ok(Stage::Done)
            }

            Stage::Rewrite => {
                let rewritten = self
                    .rewriter
                    .rewrite(&state.query)
                    .await
                    .map_err(|source| PipelineError::ModelCall {
                        stage: "rewrite",
                        source,
                    })?;
                info!(rewritten = %rewritten, "no relevant documents survived, query rewritten");
                state.query = rewritten;
                Ok(Stage::Fallback)
            }

            Stage::Fallback => {
                state.response = self
                    .fallback
                    .respond(&state.query)
                    .await
                    .map_err(|source| PipelineError::ModelCall {
                        stage: "fallback",
                        source,
                    })?;
                state.response_metadata = None;
                Ok(Stage::Done)
            }

            Stage::Done => Ok(Stage::Done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::FALLBACK_PREAMBLE;
    use crate::{BackendError, Document};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeStore {
        documents: Vec<Document>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for FakeStore {
        async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<Document>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.documents.clone())
        }
    }

    /// Pops one scripted reply per call; repeats the last reply once the
    /// script is exhausted.
    #[derive(Clone, Default)]
    struct ScriptedChatModel {
        replies: Arc<Mutex<VecDeque<String>>>,
        humans: Arc<Mutex<Vec<String>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedChatModel {
        fn with_replies(replies: &[&str]) -> Self {
            Self {
                replies: Arc::new(Mutex::new(
                    replies.iter().map(|reply| reply.to_string()).collect(),
                )),
                humans: Arc::new(Mutex::new(Vec::new())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChatModel {
        async fn complete(&self, _system: &str, human: &str) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.humans.lock().unwrap().push(human.to_string());
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                Ok(replies.pop_front().unwrap_or_default())
            } else {
                Ok(replies.front().cloned().unwrap_or_default())
            }
        }
    }

    #[derive(Clone)]
    struct FailingChatModel;

    #[async_trait]
    impl ChatModel for FailingChatModel {
        async fn complete(&self, _system: &str, _human: &str) -> Result<String, BackendError> {
            Err(BackendError::EmptyCompletion("fake-gateway".to_string()))
        }
    }

    #[derive(Clone)]
    struct MisconfiguredModel;

    #[async_trait]
    impl ChatModel for MisconfiguredModel {
        async fn complete(&self, _system: &str, _human: &str) -> Result<String, BackendError> {
            unreachable!("Init must abort before any model call")
        }

        fn ensure_configured(&self) -> Result<(), BackendError> {
            Err(BackendError::MissingCredentials("fake-gateway".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct FakeWebModel {
        seen: Arc<Mutex<Vec<String>>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WebSearchModel for FakeWebModel {
        async fn search_complete(&self, message: &str) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(message.to_string());
            Ok("web search answer".to_string())
        }
    }

    fn options() -> PipelineOptions {
        PipelineOptions {
            top_k: 5,
            grade_interval: Duration::ZERO,
        }
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("Cairo University faculties overview.")
                .with_metadata("source", "https://cu.edu.eg/faculties")
                .with_metadata("university_name", "Cairo University"),
            Document::new("Helwan University dormitory rules.")
                .with_metadata("source", "https://helwan.edu.eg/dorms")
                .with_metadata("university_name", "Helwan University"),
            Document::new("Cairo University admission requirements.")
                .with_metadata("source", "https://cu.edu.eg/admission")
                .with_metadata("university_name", "Cairo University"),
        ]
    }

    #[tokio::test]
    async fn survivors_keep_retrieval_order_and_feed_generation() {
        let store = FakeStore {
            documents: corpus(),
            ..Default::default()
        };
        let filter = ScriptedChatModel::with_replies(&[
            r#"{"binary_score": "yes"}"#,
            r#"{"binary_score": "no"}"#,
            r#"{"binary_score": "yes"}"#,
        ]);
        let basic = ScriptedChatModel::with_replies(&["Cairo University has many faculties."]);
        let web = FakeWebModel::default();

        let workflow =
            CorrectiveWorkflow::new(store, filter.clone(), basic.clone(), web.clone(), options());
        let answer = workflow.run("what faculties does Cairo University have?").await.unwrap();

        assert_eq!(answer.response, "Cairo University has many faculties.");
        let metadata = answer.metadata.expect("grounded path must attach metadata");
        // Documents 1 and 3 survive, in retrieval order.
        assert_eq!(
            metadata.sources,
            vec!["https://cu.edu.eg/faculties", "https://cu.edu.eg/admission"]
        );
        assert_eq!(metadata.university_names, vec!["Cairo University"]);

        assert_eq!(filter.call_count(), 3);
        // Generation only, never the web fallback.
        assert_eq!(basic.call_count(), 1);
        assert_eq!(web.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_retrieval_skips_grading_and_falls_back_once() {
        let store = FakeStore::default();
        let filter = ScriptedChatModel::with_replies(&[]);
        let basic = ScriptedChatModel::with_replies(&["Egyptian university admission dates"]);
        let web = FakeWebModel::default();

        let workflow =
            CorrectiveWorkflow::new(store, filter.clone(), basic.clone(), web.clone(), options());
        let answer = workflow.run("when do applications open?").await.unwrap();

        assert!(answer.metadata.is_none());
        assert!(answer.response.starts_with(FALLBACK_PREAMBLE));
        assert!(answer.response.ends_with("web search answer"));

        // No candidates means not a single grading call.
        assert_eq!(filter.call_count(), 0);
        assert_eq!(web.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fallback_receives_the_rewritten_query_not_the_original() {
        let store = FakeStore {
            documents: corpus(),
            ..Default::default()
        };
        // Everything graded irrelevant, then a rewrite with fresh keywords.
        let filter = ScriptedChatModel::with_replies(&[r#"{"binary_score": "no"}"#]);
        let basic = ScriptedChatModel::with_replies(&["zagazig university student housing"]);
        let web = FakeWebModel::default();

        let workflow =
            CorrectiveWorkflow::new(store, filter, basic.clone(), web.clone(), options());
        let answer = workflow
            .run("do you happen to know anything about places students can live?")
            .await
            .unwrap();

        assert!(answer.metadata.is_none());
        assert_eq!(web.calls.load(Ordering::SeqCst), 1);

        // The rewriter saw the original question.
        let humans = basic.humans.lock().unwrap();
        assert!(humans[0].contains("places students can live"));

        // The web model saw keywords of the rewrite, nothing of the original.
        let seen = web.seen.lock().unwrap();
        assert!(seen[0].contains("zagazig"));
        assert!(!seen[0].contains("happen"));
    }

    #[tokio::test]
    async fn unparseable_verdict_excludes_only_that_document() {
        let store = FakeStore {
            documents: corpus(),
            ..Default::default()
        };
        let filter = ScriptedChatModel::with_replies(&[
            r#"{"binary_score": "yes"}"#,
            "I think it is relevant, yes!",
            r#"{"binary_score": "yes"}"#,
        ]);
        let basic = ScriptedChatModel::with_replies(&["grounded answer"]);
        let web = FakeWebModel::default();

        let workflow =
            CorrectiveWorkflow::new(store, filter.clone(), basic, web.clone(), options());
        let answer = workflow.run("student housing?").await.unwrap();

        // Documents 1 and 3 graded normally; document 2 dropped.
        assert_eq!(filter.call_count(), 3);
        let metadata = answer.metadata.unwrap();
        assert_eq!(
            metadata.sources,
            vec!["https://cu.edu.eg/faculties", "https://cu.edu.eg/admission"]
        );
        assert_eq!(web.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn grading_transport_failure_aborts_the_invocation() {
        let store = FakeStore {
            documents: corpus(),
            ..Default::default()
        };
        let basic = ScriptedChatModel::with_replies(&["unused"]);
        let web = FakeWebModel::default();

        let workflow = CorrectiveWorkflow::new(store, FailingChatModel, basic, web, options());
        let error = workflow.run("anything").await.unwrap_err();

        assert!(matches!(
            error,
            PipelineError::ModelCall { stage: "grade", .. }
        ));
        assert!(error.is_model_failure());
    }

    #[tokio::test]
    async fn misconfigured_models_abort_before_retrieval() {
        let store = FakeStore {
            documents: corpus(),
            ..Default::default()
        };
        let basic = ScriptedChatModel::with_replies(&["unused"]);
        let web = FakeWebModel::default();

        let workflow = CorrectiveWorkflow::new(store, MisconfiguredModel, basic, web, options());

        let result = workflow.run("anything").await;
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
        assert_eq!(workflow.store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reruns_with_deterministic_models_agree_on_membership() {
        let store = FakeStore {
            documents: corpus(),
            ..Default::default()
        };
        // A single scripted reply repeats forever, so both runs grade
        // every document the same way.
        let filter = ScriptedChatModel::with_replies(&[r#"{"binary_score": "yes"}"#]);
        let basic = ScriptedChatModel::with_replies(&["same answer"]);
        let web = FakeWebModel::default();

        let workflow = CorrectiveWorkflow::new(store, filter, basic, web, options());

        let first = workflow.run("faculties?").await.unwrap();
        let second = workflow.run("faculties?").await.unwrap();

        assert_eq!(first.metadata, second.metadata);
        assert_eq!(first.response, second.response);
    }
}
