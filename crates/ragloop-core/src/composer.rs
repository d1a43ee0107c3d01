//! Prompt assembly under a character budget.

use ragloop_memory::TurnPair;
use ragloop_protocol::RetrievedPassage;
use serde::{Deserialize, Serialize};

/// Counts of what the composer dropped to fit the budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationReport {
    /// Web passages removed, lowest-ranked first.
    pub dropped_web: usize,
    /// Local passages removed, lowest-ranked first.
    pub dropped_local: usize,
    /// History pairs removed, oldest first.
    pub dropped_history_pairs: usize,
    /// The prompt still exceeds the budget after every allowed drop.
    pub over_budget: bool,
}

impl TruncationReport {
    /// Whether anything was dropped.
    pub fn truncated(&self) -> bool {
        self.dropped_web + self.dropped_local + self.dropped_history_pairs > 0
    }
}

/// Prompt text plus the context that made it in.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    pub text: String,
    pub included_local: Vec<RetrievedPassage>,
    pub included_web: Vec<RetrievedPassage>,
    pub included_history_pairs: usize,
    pub truncation: TruncationReport,
}

impl ComposedPrompt {
    /// Prompt length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Builds the synthesis prompt from instructions, history, passages, and the question.
///
/// Sections appear in this order: instructions, history (oldest first), local
/// passages, web passages, question. When the rendered prompt exceeds the
/// budget, context is dropped in this order until it fits:
///
/// 1. web passages, lowest-ranked first
/// 2. local passages ranked beyond `top_k`
/// 3. history pairs, oldest first, keeping the most recent pair
/// 4. local passages within `top_k`, lowest-ranked first, keeping the top one
///
/// The question, the most recent history pair and the highest-ranked local
/// passage are never dropped. A prompt that still does not fit is returned
/// with `over_budget` set.
#[derive(Debug, Clone)]
pub struct ContextComposer {
    instructions: String,
    budget_chars: usize,
    top_k: usize,
}

impl ContextComposer {
    pub fn new(instructions: impl Into<String>, budget_chars: usize, top_k: usize) -> Self {
        Self {
            instructions: instructions.into(),
            budget_chars,
            top_k,
        }
    }

    pub fn budget_chars(&self) -> usize {
        self.budget_chars
    }

    /// Compose a prompt, dropping context as needed to fit the budget.
    pub fn compose(
        &self,
        query: &str,
        local: &[RetrievedPassage],
        web: &[RetrievedPassage],
        history: &[TurnPair],
    ) -> ComposedPrompt {
        let mut local = local.to_vec();
        let mut web = web.to_vec();
        let mut history = history.to_vec();
        let mut report = TruncationReport::default();
        let mut text = self.render(query, &local, &web, &history);

        while self.over(&text) && !web.is_empty() {
            web.pop();
            report.dropped_web += 1;
            text = self.render(query, &local, &web, &history);
        }
        while self.over(&text) && local.len() > self.top_k {
            local.pop();
            report.dropped_local += 1;
            text = self.render(query, &local, &web, &history);
        }
        while self.over(&text) && history.len() > 1 {
            history.remove(0);
            report.dropped_history_pairs += 1;
            text = self.render(query, &local, &web, &history);
        }
        while self.over(&text) && local.len() > 1 {
            local.pop();
            report.dropped_local += 1;
            text = self.render(query, &local, &web, &history);
        }
        report.over_budget = self.over(&text);

        ComposedPrompt {
            text,
            included_local: local,
            included_web: web,
            included_history_pairs: history.len(),
            truncation: report,
        }
    }

    fn over(&self, text: &str) -> bool {
        text.chars().count() > self.budget_chars
    }

    fn render(
        &self,
        query: &str,
        local: &[RetrievedPassage],
        web: &[RetrievedPassage],
        history: &[TurnPair],
    ) -> String {
        let mut sections = Vec::new();
        let instructions = self.instructions.trim();
        if !instructions.is_empty() {
            sections.push(instructions.to_string());
        }
        if !history.is_empty() {
            sections.push(render_history(history));
        }
        if !local.is_empty() {
            sections.push(render_passages("## Context", local));
        }
        if !web.is_empty() {
            sections.push(render_passages("## Web results", web));
        }
        sections.push(format!("## Question\n{query}"));
        sections.join("\n\n")
    }
}

fn render_history(history: &[TurnPair]) -> String {
    let mut out = String::from("## Conversation so far");
    for pair in history {
        out.push_str("\nUser: ");
        out.push_str(pair.question());
        out.push_str("\nAssistant: ");
        out.push_str(pair.answer());
    }
    out
}

fn render_passages(heading: &str, passages: &[RetrievedPassage]) -> String {
    let mut out = heading.to_string();
    for (idx, passage) in passages.iter().enumerate() {
        let label = match passage.similarity_score {
            Some(score) => format!("[{}] {} (score {score:.2})", idx + 1, passage.source_id),
            None => format!("[{}] {}", idx + 1, passage.source_id),
        };
        out.push('\n');
        out.push_str(&label);
        out.push('\n');
        out.push_str(passage.text.trim());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{ContextComposer, TruncationReport};
    use pretty_assertions::assert_eq;
    use ragloop_memory::TurnPair;
    use ragloop_protocol::RetrievedPassage;

    fn local(count: usize, len: usize) -> Vec<RetrievedPassage> {
        (0..count)
            .map(|idx| {
                let score = 0.9 - idx as f32 / 100.0;
                RetrievedPassage::local("l".repeat(len), format!("doc-{idx}"), score)
            })
            .collect()
    }

    fn web(count: usize, len: usize) -> Vec<RetrievedPassage> {
        (0..count)
            .map(|idx| RetrievedPassage::web("w".repeat(len), format!("https://site/{idx}")))
            .collect()
    }

    fn history(count: usize, len: usize) -> Vec<TurnPair> {
        (0..count)
            .map(|idx| TurnPair::new(format!("Q{idx}{}", "q".repeat(len)), format!("A{idx}")))
            .collect()
    }

    #[test]
    fn sections_appear_in_order() {
        let composer = ContextComposer::new("Be brief.", 10_000, 5);
        let prompt = composer.compose(
            "What is ragloop?",
            &local(1, 10),
            &web(1, 10),
            &[TurnPair::new("Earlier?", "Yes.")],
        );
        let text = &prompt.text;
        let positions: Vec<usize> = [
            "Be brief.",
            "## Conversation so far",
            "## Context",
            "## Web results",
            "## Question\nWhat is ragloop?",
        ]
        .iter()
        .map(|marker| text.find(marker).expect("section present"))
        .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
        assert_eq!(prompt.truncation, TruncationReport::default());
    }

    #[test]
    fn empty_sections_are_omitted() {
        let composer = ContextComposer::new("", 1_000, 5);
        let prompt = composer.compose("Hi?", &[], &[], &[]);
        assert_eq!(prompt.text, "## Question\nHi?");
    }

    #[test]
    fn drops_web_before_local() {
        let composer = ContextComposer::new("", 700, 5);
        let prompt = composer.compose("q", &local(2, 200), &web(3, 200), &[]);
        assert_eq!(prompt.included_web.len(), 0);
        assert_eq!(prompt.included_local.len(), 2);
        assert_eq!(prompt.truncation.dropped_web, 3);
        assert_eq!(prompt.truncation.dropped_local, 0);
        assert!(prompt.char_len() <= 700);
    }

    #[test]
    fn web_is_dropped_lowest_ranked_first() {
        let composer = ContextComposer::new("", 600, 5);
        let prompt = composer.compose("q", &[], &web(3, 200), &[]);
        let ids: Vec<&str> = prompt
            .included_web
            .iter()
            .map(|p| p.source_id.as_str())
            .collect();
        assert_eq!(ids, vec!["https://site/0", "https://site/1"]);
    }

    #[test]
    fn drops_local_beyond_top_k_before_history() {
        let composer = ContextComposer::new("", 600, 2);
        let prompt = composer.compose("q", &local(4, 200), &[], &history(2, 10));
        let ids: Vec<&str> = prompt
            .included_local
            .iter()
            .map(|p| p.source_id.as_str())
            .collect();
        assert_eq!(ids, vec!["doc-0", "doc-1"]);
        assert_eq!(prompt.truncation.dropped_local, 2);
        assert_eq!(prompt.included_history_pairs, 2);
    }

    #[test]
    fn history_is_trimmed_before_top_k_passages() {
        let composer = ContextComposer::new("", 350, 5);
        let prompt = composer.compose("q", &local(1, 100), &web(1, 100), &history(4, 100));
        assert_eq!(prompt.truncation.dropped_web, 1);
        assert_eq!(prompt.truncation.dropped_history_pairs, 3);
        assert_eq!(prompt.truncation.dropped_local, 0);
        assert_eq!(prompt.included_local.len(), 1);
        assert_eq!(prompt.included_history_pairs, 1);
        assert_eq!(prompt.truncation.over_budget, false);
        assert!(prompt.text.contains("## Context"));
        assert!(prompt.text.contains("A3"));
        assert!(!prompt.text.contains("A2"));
    }

    #[test]
    fn top_k_passages_go_only_after_history_is_exhausted() {
        let composer = ContextComposer::new("", 340, 5);
        let prompt = composer.compose("q", &local(3, 100), &[], &history(3, 10));
        let ids: Vec<&str> = prompt
            .included_local
            .iter()
            .map(|p| p.source_id.as_str())
            .collect();
        assert_eq!(prompt.truncation.dropped_history_pairs, 2);
        assert_eq!(prompt.truncation.dropped_local, 1);
        assert_eq!(ids, vec!["doc-0", "doc-1"]);
        assert!(prompt.char_len() <= 340);
    }

    #[test]
    fn over_budget_keeps_question_latest_pair_and_top_passage() {
        let composer = ContextComposer::new("", 10, 5);
        let question = "a question that is much longer than ten characters";
        let prompt = composer.compose(question, &local(2, 5), &[], &history(2, 5));
        assert_eq!(prompt.truncation.over_budget, true);
        assert!(prompt.text.contains(question));
        assert_eq!(prompt.included_history_pairs, 1);
        let ids: Vec<&str> = prompt
            .included_local
            .iter()
            .map(|p| p.source_id.as_str())
            .collect();
        assert_eq!(ids, vec!["doc-0"]);
    }

    #[test]
    fn budget_is_measured_in_characters() {
        let composer = ContextComposer::new("", 40, 5);
        let question = "é".repeat(20);
        let prompt = composer.compose(&question, &[], &[], &[]);
        assert_eq!(prompt.truncation.over_budget, false);
        assert!(prompt.text.len() > 40);
    }
}
