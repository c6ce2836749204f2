//! Bounded conversation history with a pinned system directive.

use crate::{Message, ToolCall};

/// Ordered message log. Index 0 is always the system directive.
///
/// Every append trims the log to `max_history` messages by evicting the
/// oldest non-system messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    max_history: usize,
}

impl ConversationHistory {
    /// `max_history` is clamped to at least 1.
    pub fn new(system_prompt: impl Into<String>, max_history: usize) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            max_history: max_history.max(1),
        }
    }

    /// Replace the history with a single system message.
    pub fn reset(&mut self, system_prompt: impl Into<String>) {
        self.messages = vec![Message::system(system_prompt)];
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.push(Message::user(text));
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.push(Message::assistant(text));
    }

    pub fn append_tool_result(&mut self, tool_name: impl Into<String>, text: impl Into<String>) {
        self.push(Message::tool(tool_name, text));
    }

    /// Append the model's tool-requesting reply verbatim.
    pub fn append_model_tool_request(&mut self, content: impl Into<String>, tool_calls: Vec<ToolCall>) {
        self.push(Message::Assistant {
            content: content.into(),
            tool_calls,
        });
    }

    /// Keep message 0 plus the most recent `max_history - 1` messages.
    pub fn trim(&mut self) {
        if self.messages.len() > self.max_history {
            let excess = self.messages.len() - self.max_history;
            self.messages.drain(1..1 + excess);
        }
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: the system directive is never evicted.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn system_prompt(&self) -> &str {
        self.messages.first().map(Message::content).unwrap_or_default()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.trim();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn new_history_holds_only_system() {
        let history = ConversationHistory::new("sys", 10);
        assert_eq!(history.len(), 1);
        assert_eq!(history.messages()[0].role(), Role::System);
        assert_eq!(history.system_prompt(), "sys");
    }

    #[test]
    fn length_is_min_of_appends_plus_one_and_cap() {
        for cap in 1..=6 {
            for n in 0..=12 {
                let mut history = ConversationHistory::new("sys", cap);
                for i in 0..n {
                    match i % 3 {
                        0 => history.append_user(format!("u{i}")),
                        1 => history.append_assistant(format!("a{i}")),
                        _ => history.append_tool_result("t", format!("r{i}")),
                    }
                }
                assert_eq!(history.len(), (n + 1).min(cap), "cap={cap} n={n}");
                assert_eq!(history.messages()[0].role(), Role::System);
            }
        }
    }

    #[test]
    fn trimming_keeps_most_recent() {
        let mut history = ConversationHistory::new("sys", 3);
        for i in 0..5 {
            history.append_user(format!("m{i}"));
        }
        let contents: Vec<_> = history.messages().iter().map(Message::content).collect();
        assert_eq!(contents, ["sys", "m3", "m4"]);
    }

    #[test]
    fn zero_cap_is_clamped_to_one() {
        let mut history = ConversationHistory::new("sys", 0);
        history.append_user("hello");
        assert_eq!(history.max_history(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.system_prompt(), "sys");
    }

    #[test]
    fn reset_leaves_single_system_message() {
        let mut history = ConversationHistory::new("old", 10);
        history.append_user("a");
        history.append_assistant("b");
        history.reset("new");
        assert_eq!(history.len(), 1);
        assert_eq!(history.messages()[0], Message::system("new"));
    }

    #[test]
    fn model_tool_request_is_kept_verbatim() {
        let mut history = ConversationHistory::new("sys", 10);
        let call = ToolCall {
            name: "list_database_tables".into(),
            arguments: Default::default(),
        };
        history.append_model_tool_request("", vec![call.clone()]);
        assert_eq!(
            history.snapshot()[1],
            Message::Assistant {
                content: String::new(),
                tool_calls: vec![call],
            }
        );
    }
}
