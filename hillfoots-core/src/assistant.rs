//! Language-model port and the features built on it: the daily
//! inspiration shown on the home page and mission statement polishing.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{ParishError, ParishResult};
use crate::store::{Collection, Store};

/// A text-generation backend.
///
/// Implementations report rate limiting as [`ParishError::Quota`] so callers
/// can back off for the rest of the day.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> ParishResult<String>;

    /// Generate a JSON value matching `schema`.
    async fn generate_json(&self, prompt: &str, schema: Value) -> ParishResult<Value>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspiration {
    pub message: String,
    pub reference: String,
    pub verse_text: String,
}

impl Inspiration {
    pub fn fallback() -> Self {
        Inspiration {
            message: "When the weight of the world feels heavy, remember that you don't have to \
                      carry it alone. Strength often comes in the quiet moments of turning your \
                      worries over to a higher peace."
                .to_string(),
            reference: "Matthew 11:28".to_string(),
            verse_text: "Come to me, all you who are weary and burdened, and I will give you rest."
                .to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedInspiration {
    date: NaiveDate,
    #[serde(flatten)]
    inspiration: Inspiration,
}

const INSPIRATION_PROMPT: &str = "Provide a unique, uplifting inspirational message (2-3 \
sentences) that addresses common daily struggles like stress, anxiety, grief, loneliness, or \
doubt. The tone should be compassionate and grounded. Support this message with a relevant \
Bible reference and the text of the verse itself. Return as JSON with keys: \"message\", \
\"reference\", \"verseText\".";

fn inspiration_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "message": {
                "type": "string",
                "description": "The core inspirational message addressing common struggles"
            },
            "reference": {
                "type": "string",
                "description": "The Bible reference (e.g., Matthew 11:28)"
            },
            "verseText": {
                "type": "string",
                "description": "The actual text of the referenced verse"
            }
        },
        "required": ["message", "reference", "verseText"]
    })
}

fn cached_for<S: Store>(store: &S, today: NaiveDate) -> Option<Inspiration> {
    let rows = store.get(Collection::Inspiration).ok()?;
    let cached: CachedInspiration = serde_json::from_value(rows.into_iter().last()?)
        .map_err(|e| tracing::warn!("ignoring unreadable inspiration cache: {e}"))
        .ok()?;

    (cached.date == today).then_some(cached.inspiration)
}

fn cache<S: Store>(store: &mut S, today: NaiveDate, inspiration: &Inspiration) {
    let row = CachedInspiration {
        date: today,
        inspiration: inspiration.clone(),
    };

    let result = serde_json::to_value(&row)
        .map_err(ParishError::from)
        .and_then(|row| store.replace(Collection::Inspiration, vec![row]));

    if let Err(e) = result {
        tracing::warn!("could not cache inspiration: {e}");
    }
}

async fn fetch_inspiration<A: Assistant + ?Sized>(assistant: &A) -> ParishResult<Inspiration> {
    let value = assistant
        .generate_json(INSPIRATION_PROMPT, inspiration_schema())
        .await?;
    let inspiration: Inspiration = serde_json::from_value(value)
        .map_err(|e| ParishError::Assistant(format!("Malformed inspiration: {e}")))?;

    if inspiration.message.trim().is_empty() {
        return Err(ParishError::Assistant("Empty response from assistant".into()));
    }
    Ok(inspiration)
}

/// Today's inspiration, generated at most once per day.
///
/// Failures fall back to a built-in message. A quota error also caches the
/// fallback so the backend is not asked again until tomorrow.
pub async fn daily_inspiration<A, S>(assistant: &A, store: &mut S, today: NaiveDate) -> Inspiration
where
    A: Assistant + ?Sized,
    S: Store,
{
    if let Some(inspiration) = cached_for(store, today) {
        tracing::debug!(%today, "using cached inspiration");
        return inspiration;
    }

    match fetch_inspiration(assistant).await {
        Ok(inspiration) => {
            cache(store, today, &inspiration);
            inspiration
        }
        Err(ParishError::Quota(message)) => {
            tracing::warn!("assistant quota exceeded, caching fallback for {today}: {message}");
            let fallback = Inspiration::fallback();
            cache(store, today, &fallback);
            fallback
        }
        Err(e) => {
            tracing::error!("error fetching inspiration: {e}");
            Inspiration::fallback()
        }
    }
}

/// Ask the assistant to polish a mission statement. Returns `current`
/// unchanged when the assistant fails or answers with nothing.
pub async fn refine_mission<A: Assistant + ?Sized>(assistant: &A, current: &str) -> String {
    let prompt = format!(
        "Current mission statement: \"{current}\". Please refine this to be more professional, \
         welcoming, and focused on the unity of Dollar and Muckhart churches. Keep it concise."
    );

    match assistant.generate_text(&prompt).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => current.to_string(),
        Err(e) => {
            tracing::error!("error refining mission: {e}");
            current.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Ok(Value),
        Text(&'static str),
        Quota,
        Fail,
    }

    struct FakeAssistant {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FakeAssistant {
        fn new(reply: Reply) -> Self {
            FakeAssistant {
                reply,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn answer(&self) -> ParishResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Ok(value) => Ok(value.clone()),
                Reply::Text(text) => Ok(Value::String(text.to_string())),
                Reply::Quota => Err(ParishError::Quota("429 RESOURCE_EXHAUSTED".into())),
                Reply::Fail => Err(ParishError::Assistant("backend unavailable".into())),
            }
        }
    }

    #[async_trait]
    impl Assistant for FakeAssistant {
        async fn generate_text(&self, _prompt: &str) -> ParishResult<String> {
            self.answer()
                .map(|v| v.as_str().unwrap_or_default().to_string())
        }

        async fn generate_json(&self, _prompt: &str, _schema: Value) -> ParishResult<Value> {
            self.answer()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
    }

    fn psalm() -> Value {
        json!({
            "message": "You are not alone today.",
            "reference": "Psalm 23:4",
            "verseText": "I will fear no evil, for you are with me."
        })
    }

    #[tokio::test]
    async fn test_inspiration_is_cached_for_the_day() {
        let assistant = FakeAssistant::new(Reply::Ok(psalm()));
        let mut store = MemoryStore::new();

        let first = daily_inspiration(&assistant, &mut store, today()).await;
        let second = daily_inspiration(&assistant, &mut store, today()).await;

        assert_eq!(first.reference, "Psalm 23:4");
        assert_eq!(first, second);
        assert_eq!(assistant.calls(), 1);

        let tomorrow = today().succ_opt().unwrap();
        daily_inspiration(&assistant, &mut store, tomorrow).await;
        assert_eq!(assistant.calls(), 2);
    }

    #[tokio::test]
    async fn test_quota_error_caches_fallback() {
        let assistant = FakeAssistant::new(Reply::Quota);
        let mut store = MemoryStore::new();

        let first = daily_inspiration(&assistant, &mut store, today()).await;
        let second = daily_inspiration(&assistant, &mut store, today()).await;

        assert_eq!(first, Inspiration::fallback());
        assert_eq!(second, Inspiration::fallback());
        assert_eq!(assistant.calls(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_do_not_cache() {
        let assistant = FakeAssistant::new(Reply::Fail);
        let mut store = MemoryStore::new();

        let first = daily_inspiration(&assistant, &mut store, today()).await;
        daily_inspiration(&assistant, &mut store, today()).await;

        assert_eq!(first.reference, "Matthew 11:28");
        assert_eq!(assistant.calls(), 2);
        assert!(store.get(Collection::Inspiration).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_falls_back() {
        let assistant = FakeAssistant::new(Reply::Ok(json!({"message": "hi"})));
        let mut store = MemoryStore::new();

        let inspiration = daily_inspiration(&assistant, &mut store, today()).await;
        assert_eq!(inspiration, Inspiration::fallback());
    }

    #[tokio::test]
    async fn test_refine_mission() {
        let current = "We are two churches.";

        let polished = FakeAssistant::new(Reply::Text("  Two churches, one parish family.\n"));
        assert_eq!(refine_mission(&polished, current).await, "Two churches, one parish family.");

        let empty = FakeAssistant::new(Reply::Text(""));
        assert_eq!(refine_mission(&empty, current).await, current);

        let failing = FakeAssistant::new(Reply::Fail);
        assert_eq!(refine_mission(&failing, current).await, current);
    }
}
