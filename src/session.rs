use crate::client::RecommendationService;
use crate::conversation::{Conversation, Message};
use tracing::{debug, info};

/// A single chat session: one conversation and the service answering it.
///
/// The session is an ordinary value owned by whoever drives it; nothing about
/// it is global, so independent sessions can coexist.
pub struct ChatSession<S> {
    conversation: Conversation,
    service: S,
}

impl<S: RecommendationService> ChatSession<S> {
    pub fn new(greeting: impl Into<String>, service: S) -> Self {
        Self {
            conversation: Conversation::new(greeting),
            service,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Submit `text` and wait for the reply.
    ///
    /// Returns the appended assistant message, or `None` when the submission
    /// was ignored (blank text or a reply still outstanding).
    pub async fn submit(&mut self, text: &str) -> Option<&Message> {
        let Some(turn) = self.conversation.submit_user_message(text) else {
            debug!("submission ignored");
            return None;
        };

        info!(history_len = turn.history.len(), "awaiting recommendation");
        let outcome = self.service.recommend(&turn).await;

        // The gate was set by the accepted submission above.
        self.conversation.receive_reply(outcome).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ReplyOutcome, TransportError, UNREACHABLE_MESSAGE};
    use crate::conversation::{Author, Turn};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Scripted {
        Payload(&'static str),
        Error(&'static str),
        Unreachable,
    }

    /// Answers turns from a script and records what it was asked
    struct ScriptedService {
        script: Mutex<VecDeque<Scripted>>,
        seen: Mutex<Vec<Turn>>,
    }

    impl ScriptedService {
        fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RecommendationService for ScriptedService {
        async fn recommend(&self, turn: &Turn) -> ReplyOutcome {
            self.seen.lock().unwrap().push(turn.clone());
            match self.script.lock().unwrap().pop_front() {
                Some(Scripted::Payload(text)) => ReplyOutcome::Payload(text.to_string()),
                Some(Scripted::Error(text)) => ReplyOutcome::ServiceError(text.to_string()),
                Some(Scripted::Unreachable) | None => {
                    ReplyOutcome::TransportFailure(TransportError::Malformed("no scripted reply"))
                }
            }
        }
    }

    #[tokio::test]
    async fn one_round_trip_yields_three_messages() {
        let mut session = ChatSession::new("Hello!", ScriptedService::new([Scripted::Payload("Try 'Dune'.")]));
        assert_eq!(session.conversation().len(), 1);

        let reply = session.submit("something like Dune").await.unwrap();
        assert_eq!(reply.author, Author::Assistant);
        assert_eq!(reply.content, "Try 'Dune'.");

        let conversation = session.conversation();
        assert_eq!(conversation.len(), 3);
        assert!(!conversation.is_pending());
        let authors: Vec<Author> = conversation.messages().iter().map(|m| m.author).collect();
        assert_eq!(authors, vec![Author::Assistant, Author::User, Author::Assistant]);
    }

    #[tokio::test]
    async fn assistant_count_tracks_accepted_submissions() {
        let service = ScriptedService::new([
            Scripted::Payload("a1"),
            Scripted::Error("model unavailable"),
            Scripted::Unreachable,
        ]);
        let mut session = ChatSession::new("Hello!", service);

        let inputs = ["q1", "   ", "q2", "", "q3", "\t"];
        let mut accepted = 0;
        for input in inputs {
            if session.submit(input).await.is_some() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 3);

        let conversation = session.conversation();
        let users = conversation.messages().iter().filter(|m| m.is_user()).count();
        let assistants = conversation.messages().iter().filter(|m| !m.is_user()).count();
        assert_eq!(users, 3);
        // the seeded greeting is the extra assistant message
        assert_eq!(assistants, users + 1);

        let contents: Vec<&str> = conversation.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents[2], "a1");
        assert_eq!(contents[4], "Sorry, there was an error: model unavailable");
        assert_eq!(contents[6], UNREACHABLE_MESSAGE);
        assert!(!conversation.is_pending());
    }

    #[tokio::test]
    async fn service_sees_growing_history_without_greeting() {
        let service = ScriptedService::new([
            Scripted::Payload("a1"),
            Scripted::Payload("a2"),
            Scripted::Payload("a3"),
        ]);
        let mut session = ChatSession::new("Hello!", service);
        for query in ["q1", "q2", "q3"] {
            session.submit(query).await.unwrap();
        }

        let seen = session.service.seen.lock().unwrap();
        let lengths: Vec<usize> = seen.iter().map(|turn| turn.history.len()).collect();
        assert_eq!(lengths, vec![0, 2, 4]);
        assert!(seen[2].history.iter().all(|entry| entry.content != "Hello!"));
        assert_eq!(seen[2].query, "q3");
    }

    #[tokio::test]
    async fn blank_submission_never_reaches_the_service() {
        let mut session = ChatSession::new("Hello!", ScriptedService::new([]));
        assert!(session.submit("  \n ").await.is_none());
        assert!(session.service.seen.lock().unwrap().is_empty());
        assert_eq!(session.conversation().len(), 1);
    }
}
