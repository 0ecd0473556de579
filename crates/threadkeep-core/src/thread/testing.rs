//! In-memory storage unit and fixtures for core tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use threadkeep_types::error::ThreadStoreError;
use threadkeep_types::message::{Message, MessagePart, MessageRole};

use super::store::{ThreadStore, UnitFactory};

pub(crate) fn text_message(id: &str, created_at: &str, text: &str) -> Message {
    Message {
        id: id.to_string(),
        role: MessageRole::User,
        parts: vec![MessagePart::text(text)],
        created_at: created_at.to_string(),
        metadata: None,
    }
}

/// Vec-backed unit. `save_messages` yields between clearing and refilling so
/// that any missing serialization would expose the empty intermediate state.
#[derive(Default)]
pub(crate) struct MemoryUnit {
    messages: Arc<Mutex<Vec<Message>>>,
    closes: Option<Arc<AtomicUsize>>,
}

impl MemoryUnit {
    fn sorted(&self) -> Vec<Message> {
        let mut messages = self.messages.lock().unwrap().clone();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        messages
    }
}

impl ThreadStore for MemoryUnit {
    async fn get_messages(&self) -> Result<Vec<Message>, ThreadStoreError> {
        Ok(self.sorted())
    }

    async fn append_message(&self, message: &Message) -> Result<(), ThreadStoreError> {
        let mut messages = self.messages.lock().unwrap();
        if messages.iter().any(|m| m.id == message.id) {
            return Err(ThreadStoreError::DuplicateId(message.id.clone()));
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn save_messages(&self, messages: &[Message]) -> Result<(), ThreadStoreError> {
        self.messages.lock().unwrap().clear();
        tokio::task::yield_now().await;
        self.messages.lock().unwrap().extend_from_slice(messages);
        Ok(())
    }

    async fn delete_message(&self, id: &str) -> Result<(), ThreadStoreError> {
        self.messages.lock().unwrap().retain(|m| m.id != id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), ThreadStoreError> {
        self.messages.lock().unwrap().clear();
        Ok(())
    }

    async fn message_count(&self) -> Result<u64, ThreadStoreError> {
        Ok(self.messages.lock().unwrap().len() as u64)
    }

    async fn close(&self) {
        if let Some(closes) = &self.closes {
            closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Factory handing out `MemoryUnit`s, counting opens and closes. Messages
/// persist per thread id across reopen. Ids listed in `failing` refuse to
/// open until removed.
#[derive(Default)]
pub(crate) struct MemoryFactory {
    pub opens: AtomicUsize,
    pub closes: Arc<AtomicUsize>,
    pub failing: Mutex<Vec<String>>,
    stored: Mutex<HashMap<String, Arc<Mutex<Vec<Message>>>>>,
}

impl UnitFactory for MemoryFactory {
    type Unit = MemoryUnit;

    async fn open(&self, thread_id: &str) -> Result<MemoryUnit, ThreadStoreError> {
        tokio::task::yield_now().await;
        if self.failing.lock().unwrap().iter().any(|id| id == thread_id) {
            return Err(ThreadStoreError::StorageUnavailable(format!(
                "cannot open {thread_id}"
            )));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        let messages = Arc::clone(
            self.stored
                .lock()
                .unwrap()
                .entry(thread_id.to_string())
                .or_default(),
        );
        Ok(MemoryUnit {
            messages,
            closes: Some(Arc::clone(&self.closes)),
        })
    }
}
