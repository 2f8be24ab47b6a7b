//! Random tag and question selection.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{info, instrument};

use stackpost_shared::{QuestionError, QuestionsConfig, Topic};

use crate::{Question, QuestionResult, QuestionSource, SearchRequest};

/// Choose one non-blank tag uniformly at random.
pub fn choose_tag<'a, R: Rng + ?Sized>(tags: &'a [String], rng: &mut R) -> QuestionResult<&'a str> {
    let candidates: Vec<&str> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();

    candidates.choose(rng).copied().ok_or(QuestionError::NoTags)
}

/// Pick one question uniformly from the whole result set.
///
/// The index is always drawn from `0..items.len()`, never from a fixed range.
pub fn pick_question<'a, R: Rng + ?Sized>(items: &'a [Question], rng: &mut R) -> Option<&'a Question> {
    if items.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..items.len());
    items.get(index)
}

/// Run the whole selection stage: tag, search, pick, convert to a [`Topic`].
#[instrument(skip_all)]
pub async fn select_topic<R: Rng + Send + ?Sized>(
    config: &QuestionsConfig,
    source: &dyn QuestionSource,
    rng: &mut R,
    now: DateTime<Utc>,
) -> QuestionResult<Topic> {
    let tag = choose_tag(&config.tags, rng)?.to_string();
    info!(%tag, "selected tag");

    let request = SearchRequest::new(tag.clone(), config, now);
    let items = source.fetch_questions(&request).await?;

    let question = pick_question(&items, rng).ok_or(QuestionError::NoQuestions { tag })?;

    let topic = Topic {
        title: decode_entities(&question.title),
        tags: question.tags.clone(),
        link: question.link.clone(),
        score: question.score,
    };

    info!(title = %topic.title, score = topic.score, "selected topic");
    Ok(topic)
}

/// Decode the HTML entities Stack Exchange uses in titles.
///
/// Handles the named entities `&amp; &lt; &gt; &quot; &apos;` and numeric
/// references (`&#39;`, `&#x27;`). Anything else is left as-is.
pub fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
