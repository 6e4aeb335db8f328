//! User-facing notices emitted by background work.
//!
//! Debounced flushes and listener callbacks have no caller to return an error
//! to, so they surface failures (and the occasional success confirmation)
//! through this channel for whatever front end is attached.

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NoticeSender {
    tx: mpsc::UnboundedSender<UserNotice>,
}

impl NoticeSender {
    /// Report a failure. Dropped silently if nobody is listening.
    pub fn alert(&self, message: impl Into<String>) {
        let _ = self.tx.send(UserNotice {
            kind: NoticeKind::Error,
            message: message.into(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        let _ = self.tx.send(UserNotice {
            kind: NoticeKind::Success,
            message: message.into(),
        });
    }
}

pub fn notice_channel() -> (NoticeSender, mpsc::UnboundedReceiver<UserNotice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notices_arrive_in_order() {
        let (sender, mut rx) = notice_channel();
        sender.alert("save failed");
        sender.success("saved");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, NoticeKind::Error);
        assert_eq!(first.message, "save failed");
        assert_eq!(rx.recv().await.unwrap().kind, NoticeKind::Success);
    }

    #[test]
    fn send_without_receiver_is_ignored() {
        let (sender, rx) = notice_channel();
        drop(rx);
        sender.alert("nobody home");
    }
}
