//! In-memory stand-ins for every collaborator trait, used by unit tests.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::llm_client::{CompletionRequest, LanguageModel, LlmError};
use crate::media::{AudioFormat, Label, LabelDetector, MediaError, ObjectStore, Transcriber};
use crate::messaging::{FetchedMedia, MediaFetcher, MessagingError, Notifier};
use crate::models::chat::{ChatEntryRow, Role};
use crate::models::reminder::ReminderRow;
use crate::models::user::UserRow;
use crate::queue::{JobQueue, JobSource, QueueError, RawJob, WorkerJob};
use crate::store::{ChatStore, StoreError};

fn db_error() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserRow>>,
    chat: Mutex<Vec<ChatEntryRow>>,
    reminders: Mutex<BTreeMap<String, ReminderRow>>,
    failing_seconds: Mutex<HashSet<i64>>,
    fail_writes: AtomicBool,
    reminder_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write (user, chat, reminder) fails from now on.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Reminder lookups for this exact second fail.
    pub fn fail_reminder_query_at(&self, second: i64) {
        self.failing_seconds.lock().unwrap().insert(second);
    }

    pub fn seed_chat(&self, phone_number: &str, timestamp_ms: i64, role: Role, message: &str) {
        self.chat.lock().unwrap().push(ChatEntryRow {
            phone_number: phone_number.to_string(),
            timestamp_ms,
            role: role.as_str().to_string(),
            message: message.to_string(),
        });
    }

    pub fn seed_reminder(&self, reminder: ReminderRow) {
        self.reminders
            .lock()
            .unwrap()
            .insert(reminder.reminder_id.clone(), reminder);
    }

    pub fn user(&self, phone_number: &str) -> Option<UserRow> {
        self.users.lock().unwrap().get(phone_number).cloned()
    }

    /// History for a sender in insertion order.
    pub fn chat_for(&self, phone_number: &str) -> Vec<(Role, String)> {
        self.chat
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.phone_number == phone_number)
            .map(|e| (e.role(), e.message.clone()))
            .collect()
    }

    pub fn reminders(&self) -> Vec<ReminderRow> {
        self.reminders.lock().unwrap().values().cloned().collect()
    }

    pub fn reminder_queries(&self) -> usize {
        self.reminder_queries.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(db_error())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn upsert_user(&self, phone_number: &str, now: i64) -> Result<UserRow, StoreError> {
        self.check_write()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .entry(phone_number.to_string())
            .and_modify(|u| u.last_interaction = now)
            .or_insert_with(|| UserRow {
                phone_number: phone_number.to_string(),
                created_at: now,
                last_interaction: now,
            })
            .clone())
    }

    async fn append_chat(
        &self,
        phone_number: &str,
        timestamp_ms: i64,
        role: Role,
        message: &str,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        self.seed_chat(phone_number, timestamp_ms, role, message);
        Ok(())
    }

    async fn recent_chat(
        &self,
        phone_number: &str,
        limit: i64,
    ) -> Result<Vec<ChatEntryRow>, StoreError> {
        let chat = self.chat.lock().unwrap();
        // Newest first; later insertions win ties, like `ORDER BY timestamp_ms DESC, id DESC`.
        let mut entries: Vec<(usize, &ChatEntryRow)> = chat
            .iter()
            .enumerate()
            .filter(|(_, e)| e.phone_number == phone_number)
            .collect();
        entries.sort_by(|(ia, a), (ib, b)| b.timestamp_ms.cmp(&a.timestamp_ms).then(ib.cmp(ia)));
        Ok(entries
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn put_reminder(&self, reminder: &ReminderRow) -> Result<(), StoreError> {
        self.check_write()?;
        self.seed_reminder(reminder.clone());
        Ok(())
    }

    async fn reminders_at(&self, remind_at: i64) -> Result<Vec<ReminderRow>, StoreError> {
        self.reminder_queries.fetch_add(1, Ordering::SeqCst);
        if self.failing_seconds.lock().unwrap().contains(&remind_at) {
            return Err(db_error());
        }
        Ok(self
            .reminders
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.remind_at == remind_at)
            .cloned()
            .collect())
    }

    async fn delete_reminder(&self, reminder_id: &str) -> Result<bool, StoreError> {
        self.check_write()?;
        Ok(self.reminders.lock().unwrap().remove(reminder_id).is_some())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Language model
// ────────────────────────────────────────────────────────────────────────────

pub struct ScriptedModel {
    reply: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(LlmError::Api {
                status: 529,
                message: "Overloaded".to_string(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Queue
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingQueue {
    jobs: Mutex<Vec<WorkerJob>>,
    fail: AtomicBool,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let queue = Self::default();
        queue.fail.store(true, Ordering::SeqCst);
        queue
    }

    pub fn jobs(&self) -> Vec<WorkerJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: WorkerJob) -> Result<(), QueueError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(QueueError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

fn redis_down() -> QueueError {
    QueueError::Redis(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection reset",
    )))
}

/// Plays back scripted pops (`None` = Redis error), then idles for the
/// requested timeout on every further call.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Option<RawJob>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Option<RawJob>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobSource for ScriptedSource {
    async fn next_job(&self, timeout_secs: u64) -> Result<Option<RawJob>, QueueError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Some(raw)) => Ok(Some(raw)),
            Some(None) => Err(redis_down()),
            None => {
                tokio::time::sleep(std::time::Duration::from_secs(timeout_secs)).await;
                Ok(None)
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Messaging
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every attempt but reports failure.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, body: &str) -> Result<(), MessagingError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(MessagingError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(())
    }
}

pub struct StaticFetcher {
    media: Option<FetchedMedia>,
    fetched: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn serving(bytes: &'static [u8], content_type: &str) -> Self {
        Self {
            media: Some(FetchedMedia {
                bytes: Bytes::from_static(bytes),
                content_type: Some(content_type.to_string()),
            }),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            media: None,
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, MessagingError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.media.clone().ok_or_else(|| MessagingError::Api {
            status: 404,
            message: "The requested resource was not found".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Media services
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<Vec<(String, usize, String)>>,
}

impl MemoryObjectStore {
    pub const BUCKET: &'static str = "test-bucket";

    pub fn new() -> Self {
        Self::default()
    }

    /// `(key, size, content_type)` per stored object.
    pub fn objects(&self) -> Vec<(String, usize, String)> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        Self::BUCKET
    }

    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), MediaError> {
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), bytes.len(), content_type.to_string()));
        Ok(())
    }
}

pub struct StaticLabels {
    labels: Option<Vec<Label>>,
    calls: Mutex<Vec<(String, String, i32, f32)>>,
}

impl StaticLabels {
    pub fn returning(names: &[&str]) -> Self {
        Self {
            labels: Some(
                names
                    .iter()
                    .map(|n| Label {
                        name: n.to_string(),
                        confidence: 95.0,
                    })
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            labels: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(bucket, key, max_labels, min_confidence)` per call.
    pub fn calls(&self) -> Vec<(String, String, i32, f32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LabelDetector for StaticLabels {
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
        max_labels: i32,
        min_confidence: f32,
    ) -> Result<Vec<Label>, MediaError> {
        self.calls.lock().unwrap().push((
            bucket.to_string(),
            key.to_string(),
            max_labels,
            min_confidence,
        ));
        self.labels
            .clone()
            .ok_or_else(|| MediaError::Vision("InvalidImageFormatException".to_string()))
    }
}

pub struct StaticTranscriber {
    transcript: Option<String>,
    calls: Mutex<Vec<(String, AudioFormat)>>,
}

impl StaticTranscriber {
    pub fn hearing(transcript: &str) -> Self {
        Self {
            transcript: Some(transcript.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            transcript: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, AudioFormat)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for StaticTranscriber {
    async fn transcribe(
        &self,
        _bucket: &str,
        key: &str,
        format: AudioFormat,
    ) -> Result<String, MediaError> {
        self.calls.lock().unwrap().push((key.to_string(), format));
        self.transcript
            .clone()
            .ok_or_else(|| MediaError::Transcription("job failed".to_string()))
    }
}
