//! Bounded per-role conversation memory.

use std::collections::VecDeque;

use artreal_core::{RoleId, Turn, TurnBody};
use artreal_llm::chat::types::ChatMessage;

/// The last `capacity` turns a role has observed.
#[derive(Clone, Debug)]
pub struct BufferedContext {
    capacity: usize,
    turns: VecDeque<Turn>,
}

impl BufferedContext {
    /// Empty buffer holding at most `capacity` turns.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            turns: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Append a turn, evicting the oldest when full.
    pub fn push(&mut self, turn: Turn) {
        if self.turns.len() == self.capacity {
            let _ = self.turns.pop_front();
        }
        self.turns.push_back(turn);
        self.drop_orphan_results();
    }

    /// Replace the contents, keeping only the newest `capacity` turns.
    pub fn replace(&mut self, turns: Vec<Turn>) {
        let skip = turns.len().saturating_sub(self.capacity);
        self.turns = turns.into_iter().skip(skip).collect();
        self.drop_orphan_results();
    }

    /// Copy of the buffered turns, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// Number of buffered turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Results whose calls were evicted cannot be sent to the model.
    fn drop_orphan_results(&mut self) {
        while self
            .turns
            .front()
            .is_some_and(|t| matches!(t.body, TurnBody::ToolResults { .. }))
        {
            let _ = self.turns.pop_front();
        }
    }

    /// Render the buffer as chat messages from `owner`'s point of view.
    ///
    /// The owner's own output becomes assistant messages; everyone else
    /// speaks as a named user. Tool calls without a following result batch
    /// are sent as plain text, since the service rejects unanswered calls.
    pub fn to_messages(&self, owner: RoleId) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.turns.len());
        for (idx, turn) in self.turns.iter().enumerate() {
            let own = turn.author.role() == Some(owner);
            match &turn.body {
                TurnBody::Text { text } => {
                    if own {
                        messages.push(ChatMessage::assistant(text.clone()));
                    } else {
                        messages.push(ChatMessage::user(text.clone(), Some(turn.author.as_str())));
                    }
                }
                TurnBody::ToolCalls { calls, text } => {
                    let answered = self.turns.get(idx + 1).is_some_and(|next| {
                        matches!(next.body, TurnBody::ToolResults { .. })
                    });
                    if own && answered && !calls.is_empty() {
                        messages.push(ChatMessage::assistant_tool_calls(calls, text.clone()));
                    } else if let Some(text) = text {
                        if own {
                            messages.push(ChatMessage::assistant(text.clone()));
                        } else {
                            messages.push(ChatMessage::user(text.clone(), Some(turn.author.as_str())));
                        }
                    }
                }
                TurnBody::ToolResults { results } => {
                    let follows_calls = idx
                        .checked_sub(1)
                        .and_then(|prev| self.turns.get(prev))
                        .is_some_and(|prev| {
                            prev.author.role() == Some(owner)
                                && matches!(&prev.body, TurnBody::ToolCalls { calls, .. } if !calls.is_empty())
                        });
                    if follows_calls {
                        messages.extend(
                            results
                                .iter()
                                .map(|r| ChatMessage::tool(r.call_id.clone(), r.content.clone())),
                        );
                    }
                }
            }
        }
        messages
    }
}
