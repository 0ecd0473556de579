//! Single-owner actor serializing every operation on one thread.
//!
//! The actor task owns the thread's storage unit. Callers hold a cloneable
//! [`ThreadHandle`] that sends commands over a bounded `mpsc` mailbox and
//! awaits the result on a `oneshot` reply channel. Commands are processed one
//! at a time in receipt order, so multi-statement operations such as
//! `save_messages` are never observed half-done by another caller.
//!
//! The actor runs until every handle is dropped, then closes its unit. An
//! actor spawned with an idle policy also asks to be retired after a quiet
//! period; the locator agrees only when no caller holds a handle.

use std::sync::Arc;
use std::time::Duration;

use threadkeep_types::error::ThreadStoreError;
use threadkeep_types::message::Message;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::store::ThreadStore;

type Reply<T> = oneshot::Sender<Result<T, ThreadStoreError>>;

/// Asked by an idle actor. Returns `true` once its last outside handle has
/// been released, after which the mailbox drains and the actor stops.
pub(crate) type RetireFn = Box<dyn Fn() -> bool + Send + Sync + 'static>;

/// Idle shutdown for a resident actor.
pub(crate) struct IdlePolicy {
    pub timeout: Duration,
    pub retire: RetireFn,
}

/// A request to a thread actor.
enum ThreadCommand {
    GetMessages { reply: Reply<Vec<Message>> },
    Append { message: Message, reply: Reply<()> },
    Save { messages: Vec<Message>, reply: Reply<()> },
    Delete { id: String, reply: Reply<()> },
    Clear { reply: Reply<()> },
    Count { reply: Reply<u64> },
}

impl ThreadCommand {
    fn name(&self) -> &'static str {
        match self {
            ThreadCommand::GetMessages { .. } => "get_messages",
            ThreadCommand::Append { .. } => "append_message",
            ThreadCommand::Save { .. } => "save_messages",
            ThreadCommand::Delete { .. } => "delete_message",
            ThreadCommand::Clear { .. } => "clear",
            ThreadCommand::Count { .. } => "message_count",
        }
    }
}

/// Handle to the actor owning one thread's storage unit.
///
/// Cheap to clone; every clone talks to the same actor.
#[derive(Clone)]
pub struct ThreadHandle {
    thread_id: Arc<str>,
    sender: mpsc::Sender<ThreadCommand>,
}

impl ThreadHandle {
    /// Spawn an actor owning `unit` and return a handle to it.
    ///
    /// Must be called from within a tokio runtime. The actor stops when the
    /// last handle is dropped.
    pub fn spawn<S>(thread_id: impl Into<Arc<str>>, unit: S, mailbox_capacity: usize) -> Self
    where
        S: ThreadStore + 'static,
    {
        Self::spawn_with(thread_id, unit, mailbox_capacity, None)
    }

    pub(crate) fn spawn_with<S>(
        thread_id: impl Into<Arc<str>>,
        unit: S,
        mailbox_capacity: usize,
        idle: Option<IdlePolicy>,
    ) -> Self
    where
        S: ThreadStore + 'static,
    {
        let thread_id = thread_id.into();
        let (sender, receiver) = mpsc::channel(mailbox_capacity.max(1));
        tokio::spawn(run_actor(Arc::clone(&thread_id), unit, receiver, idle));
        Self { thread_id, sender }
    }

    /// The thread identifier this handle addresses.
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Whether two handles address the same actor.
    pub fn same_unit(&self, other: &ThreadHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Whether this is the only live handle to its actor.
    pub(crate) fn is_sole_handle(&self) -> bool {
        self.sender.strong_count() == 1
    }

    pub async fn get_messages(&self) -> Result<Vec<Message>, ThreadStoreError> {
        self.request(|reply| ThreadCommand::GetMessages { reply })
            .await
    }

    pub async fn append_message(&self, message: Message) -> Result<(), ThreadStoreError> {
        self.request(|reply| ThreadCommand::Append { message, reply })
            .await
    }

    pub async fn save_messages(&self, messages: Vec<Message>) -> Result<(), ThreadStoreError> {
        self.request(|reply| ThreadCommand::Save { messages, reply })
            .await
    }

    pub async fn delete_message(&self, id: impl Into<String>) -> Result<(), ThreadStoreError> {
        let id = id.into();
        self.request(|reply| ThreadCommand::Delete { id, reply })
            .await
    }

    pub async fn clear(&self) -> Result<(), ThreadStoreError> {
        self.request(|reply| ThreadCommand::Clear { reply }).await
    }

    pub async fn message_count(&self) -> Result<u64, ThreadStoreError> {
        self.request(|reply| ThreadCommand::Count { reply }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> ThreadCommand,
    ) -> Result<T, ThreadStoreError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make(reply))
            .await
            .map_err(|_| self.stopped())?;
        response.await.map_err(|_| self.stopped())?
    }

    fn stopped(&self) -> ThreadStoreError {
        ThreadStoreError::StorageUnavailable(format!(
            "actor for thread '{}' has stopped",
            self.thread_id
        ))
    }
}

async fn run_actor<S: ThreadStore>(
    thread_id: Arc<str>,
    unit: S,
    mut receiver: mpsc::Receiver<ThreadCommand>,
    idle: Option<IdlePolicy>,
) {
    debug!(thread_id = %thread_id, "thread actor started");

    loop {
        let next = match &idle {
            Some(policy) => match tokio::time::timeout(policy.timeout, receiver.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    if (policy.retire)() {
                        debug!(thread_id = %thread_id, "retiring idle thread actor");
                    }
                    continue;
                }
            },
            None => receiver.recv().await,
        };
        let Some(command) = next else { break };

        let op = command.name();
        let failed = match command {
            ThreadCommand::GetMessages { reply } => respond(reply, unit.get_messages().await),
            ThreadCommand::Append { message, reply } => {
                respond(reply, unit.append_message(&message).await)
            }
            ThreadCommand::Save { messages, reply } => {
                respond(reply, unit.save_messages(&messages).await)
            }
            ThreadCommand::Delete { id, reply } => respond(reply, unit.delete_message(&id).await),
            ThreadCommand::Clear { reply } => respond(reply, unit.clear().await),
            ThreadCommand::Count { reply } => respond(reply, unit.message_count().await),
        };
        if let Some(err) = failed {
            warn!(thread_id = %thread_id, op, error = %err, "thread operation failed");
        }
    }

    unit.close().await;
    debug!(thread_id = %thread_id, "thread actor stopped");
}

/// Send the result back; a caller that stopped waiting just misses it.
/// Returns the error, if any, for logging.
fn respond<T>(reply: Reply<T>, result: Result<T, ThreadStoreError>) -> Option<ThreadStoreError> {
    let err = result.as_ref().err().cloned();
    let _ = reply.send(result);
    err
}
