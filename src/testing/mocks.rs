use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::answer::AnswerClient;
use crate::core::error::{AcquireError, AcquireFailure, AnswerError};
use crate::core::lock::lock_mutex;
use crate::core::{EncodedImage, FacingMode, FrameCodec, MediaType, RawImage, SourceProvider, VideoSource};

pub struct MockSource {
    id: String,
    mode: FacingMode,
    live: bool,
    picture: RawImage,
    live_handles: Option<Arc<AtomicUsize>>,
}

impl MockSource {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            mode: FacingMode::User,
            live: true,
            picture: RawImage {
                width: 2,
                height: 2,
                rgb: vec![127; 2 * 2 * 3],
            },
            live_handles: None,
        }
    }

    pub fn with_picture(mut self, picture: RawImage) -> Self {
        self.picture = picture;
        self
    }
}

impl VideoSource for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn mode(&self) -> FacingMode {
        self.mode
    }

    fn grab(&mut self) -> Option<RawImage> {
        self.live.then(|| self.picture.clone())
    }

    fn stop(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if let Some(live_handles) = &self.live_handles {
            live_handles.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// Provider with scripted acquisition failures and a live-handle counter
/// for leak checks.
#[derive(Default)]
pub struct MockProvider {
    acquired: AtomicU64,
    live_handles: Arc<AtomicUsize>,
    failures: Mutex<VecDeque<AcquireFailure>>,
    modes: Mutex<Vec<FacingMode>>,
    delay: Mutex<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, reason: AcquireFailure) {
        lock_mutex(&self.failures, "MockProvider::fail_next").push_back(reason);
    }

    /// Every acquisition blocks this long first, like a permission prompt.
    pub fn set_acquire_delay(&self, delay: Duration) {
        *lock_mutex(&self.delay, "MockProvider::set_acquire_delay") = delay;
    }

    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn live_handles(&self) -> usize {
        self.live_handles.load(Ordering::SeqCst)
    }

    /// Modes of all successful acquisitions, in order.
    pub fn modes(&self) -> Vec<FacingMode> {
        lock_mutex(&self.modes, "MockProvider::modes").clone()
    }
}

impl SourceProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn acquire(&self, mode: FacingMode) -> Result<Box<dyn VideoSource>, AcquireError> {
        let delay = *lock_mutex(&self.delay, "MockProvider::acquire");
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if let Some(reason) = lock_mutex(&self.failures, "MockProvider::acquire").pop_front() {
            return Err(AcquireError::new(reason, "scripted failure"));
        }

        let n = self.acquired.fetch_add(1, Ordering::SeqCst) + 1;
        self.live_handles.fetch_add(1, Ordering::SeqCst);
        lock_mutex(&self.modes, "MockProvider::acquire").push(mode);

        let mut source = MockSource::new(&format!("mock:{}#{}", mode, n));
        source.mode = mode;
        source.live_handles = Some(self.live_handles.clone());
        Ok(Box::new(source))
    }
}

#[derive(Debug, Clone)]
pub enum Step {
    Image(Vec<u8>),
    Unavailable,
    /// Image that takes the given time to produce.
    Slow(Duration, Vec<u8>),
}

impl Step {
    pub fn image(payload: &[u8]) -> Self {
        Step::Image(payload.to_vec())
    }
}

/// Codec that plays back a script of outcomes. A stopped source is always
/// unavailable and does not consume a step. Once the script runs out the
/// codec either reports unavailable or, when endless, keeps producing
/// numbered images.
pub struct ScriptedCodec {
    steps: VecDeque<Step>,
    endless: bool,
    produced: u64,
    sources: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCodec {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            endless: false,
            produced: 0,
            sources: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn endless() -> Self {
        Self {
            endless: true,
            ..Self::new(Vec::new())
        }
    }

    /// Ids of the sources each image was captured from.
    pub fn source_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.sources.clone()
    }

    fn produce(&mut self, source: &dyn VideoSource, payload: Vec<u8>) -> Option<EncodedImage> {
        self.produced += 1;
        lock_mutex(&self.sources, "ScriptedCodec::produce").push(source.id().to_string());
        Some(EncodedImage::new(MediaType::Jpeg, payload))
    }
}

impl FrameCodec for ScriptedCodec {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capture(&mut self, source: &mut dyn VideoSource) -> Option<EncodedImage> {
        source.grab()?;

        match self.steps.pop_front() {
            Some(Step::Image(payload)) => self.produce(source, payload),
            Some(Step::Slow(delay, payload)) => {
                std::thread::sleep(delay);
                self.produce(source, payload)
            }
            Some(Step::Unavailable) => None,
            None if self.endless => {
                let payload = format!("frame-{}", self.produced + 1).into_bytes();
                self.produce(source, payload)
            }
            None => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnswerCall {
    pub question: String,
    pub images: Vec<EncodedImage>,
}

pub struct MockAnswerClient {
    reply: Result<String, String>,
    calls: Mutex<Vec<AnswerCall>>,
}

impl MockAnswerClient {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<AnswerCall> {
        lock_mutex(&self.calls, "MockAnswerClient::calls").clone()
    }
}

impl AnswerClient for MockAnswerClient {
    fn answer(&self, question: &str, images: &[EncodedImage]) -> Result<String, AnswerError> {
        lock_mutex(&self.calls, "MockAnswerClient::answer").push(AnswerCall {
            question: question.to_string(),
            images: images.to_vec(),
        });
        self.reply.clone().map_err(AnswerError::Transport)
    }
}
