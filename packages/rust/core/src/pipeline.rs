//! End-to-end run: question → title → body sections → document → file.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use tracing::{info, instrument};

use stackpost_completion::{CompletionClient, generate_section};
use stackpost_questions::{QuestionSource, select_topic};
use stackpost_shared::{
    AppConfig, GeneratedSection, Post, Result, SectionKind, Stage, StackpostError, Topic,
};

use crate::{document, writer};

/// Per-run inputs that are not part of the config file.
#[derive(Debug, Clone)]
pub struct GeneratePostOptions {
    /// Current instant, used for the search window.
    pub now: DateTime<Utc>,
    /// Local calendar date of the run; the post is dated the day before.
    pub today: NaiveDate,
    /// Assemble the document but skip the file write.
    pub dry_run: bool,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct GeneratePostResult {
    /// Where the post was (or, for a dry run, would have been) written.
    pub path: PathBuf,
    /// Post title as it appears in the front matter.
    pub title: String,
    /// The question the post is about.
    pub topic: Topic,
    /// The assembled markdown document.
    pub document: String,
    /// Whether the file was actually written.
    pub written: bool,
    /// Tokens used across all completions.
    pub total_tokens: u64,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, stage: Stage, detail: &str);
    /// Called after each section is generated.
    fn section_generated(&self, section: &GeneratedSection, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &GeneratePostResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _stage: Stage, _detail: &str) {}
    fn section_generated(&self, _section: &GeneratedSection, _current: usize, _total: usize) {}
    fn done(&self, _result: &GeneratePostResult) {}
}

/// Run the full pipeline once.
///
/// 1. Select a topic (random tag, search, random question)
/// 2. Generate the title, then the three body sections from that title
/// 3. Assemble the markdown document
/// 4. Write `{yesterday}-{slug}.md` into the posts directory
///
/// Every stage returns early on failure, so nothing is written unless all
/// four completions succeed.
#[instrument(skip_all, fields(dry_run = options.dry_run))]
pub async fn generate_post<R: Rng + Send + ?Sized>(
    config: &AppConfig,
    questions: &dyn QuestionSource,
    completions: &dyn CompletionClient,
    rng: &mut R,
    options: &GeneratePostOptions,
    progress: &dyn ProgressReporter,
) -> Result<GeneratePostResult> {
    let start = Instant::now();

    // --- Stage 1: Question ---
    progress.phase(Stage::SelectQuestion, "Selecting a question");
    let topic = select_topic(&config.questions, questions, rng, options.now).await?;

    // --- Stage 2: Sections ---
    progress.phase(Stage::Generate, "Generating post");
    let total = SectionKind::ALL.len();

    let title = generate(config, completions, SectionKind::Title, &topic.title).await?;
    progress.section_generated(&title, 1, total);

    let common_errors =
        generate(config, completions, SectionKind::CommonErrors, &title.text).await?;
    progress.section_generated(&common_errors, 2, total);

    let error_body = generate(config, completions, SectionKind::ErrorBody, &title.text).await?;
    progress.section_generated(&error_body, 3, total);

    let recommended_sites =
        generate(config, completions, SectionKind::RecommendedSites, &title.text).await?;
    progress.section_generated(&recommended_sites, 4, total);

    let post = Post {
        title,
        common_errors,
        error_body,
        recommended_sites,
    };

    // --- Stage 3: Document ---
    progress.phase(Stage::Assemble, "Assembling document");
    let document = document::assemble(&config.output, &topic.tags, &post);
    let post_title = document::strip_quotes(&post.title.text);
    let filename = writer::post_filename(writer::yesterday(options.today), &post_title);
    let posts_dir = PathBuf::from(&config.output.posts_dir);
    let path = posts_dir.join(&filename);

    // --- Stage 4: Write ---
    let written = if options.dry_run {
        info!(path = %path.display(), "dry run, skipping write");
        false
    } else {
        progress.phase(Stage::Write, "Writing post");
        writer::write_post(&posts_dir, &filename, &document)?;
        true
    };

    let result = GeneratePostResult {
        path,
        title: post_title,
        topic,
        document,
        written,
        total_tokens: post.total_tokens(),
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        path = %result.path.display(),
        total_tokens = result.total_tokens,
        elapsed_ms = result.elapsed.as_millis(),
        "post pipeline complete"
    );

    Ok(result)
}

async fn generate(
    config: &AppConfig,
    client: &dyn CompletionClient,
    kind: SectionKind,
    subject: &str,
) -> Result<GeneratedSection> {
    generate_section(client, &config.completion, kind, subject)
        .await
        .map_err(|e| StackpostError::completion(kind, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use stackpost_completion::{Completion, CompletionRequest, CompletionResult};
    use stackpost_questions::{Question, QuestionResult, SearchRequest};
    use stackpost_shared::{CompletionError, QuestionError};

    struct FakeQuestions {
        items: Vec<Question>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl QuestionSource for FakeQuestions {
        async fn fetch_questions(&self, _request: &SearchRequest) -> QuestionResult<Vec<Question>> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.items.clone())
        }
    }

    struct FakeCompletions {
        responses: Mutex<VecDeque<CompletionResult<Completion>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeCompletions {
        fn new(responses: Vec<CompletionResult<Completion>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionClient for FakeCompletions {
        async fn complete(&self, request: &CompletionRequest) -> CompletionResult<Completion> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::Network("no more responses".into())))
        }
    }

    fn ok(text: &str, tokens: u64) -> CompletionResult<Completion> {
        Ok(Completion {
            text: text.into(),
            total_tokens: tokens,
        })
    }

    fn question() -> Question {
        Question {
            title: "async function returns undefined instead of value".into(),
            tags: vec!["javascript".into(), "async-await".into()],
            link: Some("https://stackoverflow.com/q/1".into()),
            score: 120,
            question_id: Some(1),
        }
    }

    fn config_in(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.questions.tags = vec!["javascript".into()];
        config.output.posts_dir = dir.to_string_lossy().to_string();
        config
    }

    fn options(dry_run: bool) -> GeneratePostOptions {
        GeneratePostOptions {
            now: Utc::now(),
            today: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            dry_run,
        }
    }

    fn happy_responses() -> Vec<CompletionResult<Completion>> {
        vec![
            ok("\n\nWhy is my async function returning undefined?\n", 30),
            ok("## Common errors\nForgetting to `await` the promise.", 1500),
            ok("# Fixing it\nStep 1: add `await`.", 1800),
            ok("Recommended sites\n- https://developer.mozilla.org", 80),
        ]
    }

    #[tokio::test]
    async fn full_run_writes_post() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let questions = FakeQuestions {
            items: vec![question()],
            calls: Mutex::new(0),
        };
        let completions = FakeCompletions::new(happy_responses());
        let mut rng = StdRng::seed_from_u64(11);

        let result = generate_post(
            &config,
            &questions,
            &completions,
            &mut rng,
            &options(false),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert!(result.written);
        assert_eq!(
            result.path.file_name().unwrap().to_str().unwrap(),
            "2024-03-14-why-is-my-async-function-returning-undefined.md"
        );
        assert_eq!(result.total_tokens, 3410);

        let content = std::fs::read_to_string(&result.path).unwrap();
        assert_eq!(content, result.document);
        assert!(content.starts_with(
            "---\nlayout: post\ntitle: \"Why is my async function returning undefined?\"\ntags: ['javascript', 'async-await']\n---\n"
        ));
        assert!(content.contains("Forgetting to `await` the promise."));
        assert!(!content.contains("## Common errors"));
        assert!(!content.contains("# Fixing it"));
        assert!(content.contains("Recommended sites\n- https://developer.mozilla.org"));
    }

    #[tokio::test]
    async fn body_prompts_use_generated_title() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let questions = FakeQuestions {
            items: vec![question()],
            calls: Mutex::new(0),
        };
        let completions = FakeCompletions::new(happy_responses());
        let mut rng = StdRng::seed_from_u64(5);

        generate_post(&config, &questions, &completions, &mut rng, &options(true), &SilentProgress)
            .await
            .unwrap();

        let requests = completions.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert!(requests[0].prompt.contains("async function returns undefined instead of value"));
        assert_eq!(
            requests.iter().map(|r| r.max_tokens).collect::<Vec<_>>(),
            vec![100, 2500, 2500, 400]
        );
        for req in &requests[1..] {
            assert!(req.prompt.contains("Why is my async function returning undefined?"));
        }
    }

    #[tokio::test]
    async fn auth_failure_on_title_stops_before_body() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let questions = FakeQuestions {
            items: vec![question()],
            calls: Mutex::new(0),
        };
        let completions = FakeCompletions::new(vec![Err(CompletionError::Auth(
            "Incorrect API key provided".into(),
        ))]);
        let mut rng = StdRng::seed_from_u64(1);

        let err = generate_post(
            &config,
            &questions,
            &completions,
            &mut rng,
            &options(false),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            StackpostError::Completion {
                section: SectionKind::Title,
                source: CompletionError::Auth(_)
            }
        ));
        assert_eq!(completions.request_count(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn no_questions_skips_generation() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let questions = FakeQuestions {
            items: vec![],
            calls: Mutex::new(0),
        };
        let completions = FakeCompletions::new(happy_responses());
        let mut rng = StdRng::seed_from_u64(1);

        let err = generate_post(
            &config,
            &questions,
            &completions,
            &mut rng,
            &options(false),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            StackpostError::Questions(QuestionError::NoQuestions { .. })
        ));
        assert!(err.to_string().contains("no questions found"));
        assert_eq!(*questions.calls.lock().unwrap(), 1);
        assert_eq!(completions.request_count(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failure_mid_body_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let questions = FakeQuestions {
            items: vec![question()],
            calls: Mutex::new(0),
        };
        let mut responses = happy_responses();
        responses[2] = Err(CompletionError::Api {
            status: 500,
            message: "server error".into(),
        });
        let completions = FakeCompletions::new(responses);
        let mut rng = StdRng::seed_from_u64(1);

        let err = generate_post(
            &config,
            &questions,
            &completions,
            &mut rng,
            &options(false),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert_eq!(err.stage(), Stage::Generate);
        assert!(err.to_string().contains("error body"));
        assert_eq!(completions.request_count(), 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn dry_run_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let questions = FakeQuestions {
            items: vec![question()],
            calls: Mutex::new(0),
        };
        let completions = FakeCompletions::new(happy_responses());
        let mut rng = StdRng::seed_from_u64(1);

        let result = generate_post(
            &config,
            &questions,
            &completions,
            &mut rng,
            &options(true),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert!(!result.written);
        assert!(!result.path.exists());
        assert!(result.document.contains("layout: post"));
    }

    #[tokio::test]
    async fn missing_posts_dir_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir.path().join("missing"));
        let questions = FakeQuestions {
            items: vec![question()],
            calls: Mutex::new(0),
        };
        let completions = FakeCompletions::new(happy_responses());
        let mut rng = StdRng::seed_from_u64(1);

        let err = generate_post(
            &config,
            &questions,
            &completions,
            &mut rng,
            &options(false),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert_eq!(err.stage(), Stage::Write);
    }
}
