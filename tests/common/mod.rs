//! Shared test utilities: scripted collaborators for the dialog core

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aikya::dialog::{DialogOrchestrator, DialogTiming};
use aikya::news::{MAX_NEWS_ITEMS, NewsArticle, NewsRegionResolver, NewsService};
use aikya::voice::{SpeechBackend, SpeechController, VoiceCatalog};
use aikya::{ChatService, Error, Result};
use async_trait::async_trait;

/// How the scripted chat service answers
#[derive(Debug, Clone)]
pub enum ChatScript {
    /// `**Echo:** <prompt>`
    Echo,
    /// Always fail
    Fail,
}

/// Chat service answering from a script, with optional per-call delays
pub struct ScriptedChat {
    script: ChatScript,
    delays: Mutex<VecDeque<Duration>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedChat {
    pub fn echo() -> Arc<Self> {
        Self::new(ChatScript::Echo, Vec::new())
    }

    pub fn failing() -> Arc<Self> {
        Self::new(ChatScript::Fail, Vec::new())
    }

    /// Echo, sleeping `delays[i]` before answering call `i`
    pub fn echo_with_delays(delays: Vec<Duration>) -> Arc<Self> {
        Self::new(ChatScript::Echo, delays)
    }

    fn new(script: ChatScript, delays: Vec<Duration>) -> Arc<Self> {
        Arc::new(Self {
            script,
            delays: Mutex::new(delays.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatService for ScriptedChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.script {
            ChatScript::Echo => Ok(format!("**Echo:** {prompt}")),
            ChatScript::Fail => Err(Error::Chat("scripted failure".to_string())),
        }
    }
}

/// News service returning `articles` stories and recording lookup keys
pub struct CountingNews {
    articles: usize,
    delay: Option<Duration>,
    codes: Mutex<Vec<String>>,
}

impl CountingNews {
    pub fn with_articles(articles: usize) -> Arc<Self> {
        Arc::new(Self {
            articles,
            delay: None,
            codes: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            articles: 1,
            delay: Some(delay),
            codes: Mutex::new(Vec::new()),
        })
    }

    pub fn codes(&self) -> Vec<String> {
        self.codes.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsService for CountingNews {
    async fn latest(&self, country: &str) -> Result<Vec<NewsArticle>> {
        self.codes.lock().unwrap().push(country.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok((0..self.articles)
            .map(|i| NewsArticle {
                title: Some(format!("Headline {i}")),
                description: Some(format!("Summary {i}")),
                link: Some(format!("https://news.example/{i}")),
                ..NewsArticle::default()
            })
            .collect())
    }
}

/// Speech backend that takes `duration` per utterance and tracks overlap
pub struct RecordingSpeech {
    duration: Duration,
    spoken: Mutex<Vec<String>>,
    playing: AtomicUsize,
    max_playing: AtomicUsize,
}

struct Playing<'a>(&'a AtomicUsize);

impl Drop for Playing<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecordingSpeech {
    pub fn new(duration: Duration) -> Arc<Self> {
        Arc::new(Self {
            duration,
            spoken: Mutex::new(Vec::new()),
            playing: AtomicUsize::new(0),
            max_playing: AtomicUsize::new(0),
        })
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn max_playing(&self) -> usize {
        self.max_playing.load(Ordering::SeqCst)
    }

    pub fn playing(&self) -> usize {
        self.playing.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechBackend for RecordingSpeech {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn speak(&self, text: &str, _voice_id: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        let now = self.playing.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_playing.fetch_max(now, Ordering::SeqCst);
        let _playing = Playing(&self.playing);
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}

/// Default timing: 75ms reveal, 20s service timeout, 300ms speech delay
pub fn timing() -> DialogTiming {
    DialogTiming {
        reveal_interval: Duration::from_millis(75),
        service_timeout: Duration::from_secs(20),
        speech_delay: Duration::from_millis(300),
    }
}

/// Build an orchestrator over scripted collaborators
pub fn dialog(
    chat: &Arc<ScriptedChat>,
    news: &Arc<CountingNews>,
    speech: Option<&Arc<RecordingSpeech>>,
) -> DialogOrchestrator {
    let chat: Arc<dyn ChatService> = chat.clone();
    let news: Arc<dyn NewsService> = news.clone();
    let backend = speech.map(|s| s.clone() as Arc<dyn SpeechBackend>);
    let controller = SpeechController::new(backend, VoiceCatalog::default(), "en-US-AriaNeural");

    DialogOrchestrator::new(
        chat,
        NewsRegionResolver::new(news, MAX_NEWS_ITEMS),
        Arc::new(controller),
        timing(),
    )
}

/// Sleep long enough for `tokens` tokens to be revealed
pub async fn settle_reveal(tokens: usize) {
    let per_token = timing().reveal_interval;
    let tokens = u32::try_from(tokens).unwrap();
    tokio::time::sleep(per_token * tokens + Duration::from_millis(10)).await;
}
