//! Synthesis request: the merge prompt injected into the sink.
//!
//! The rendered layout is consumed downstream, including the
//! `**[N: Source Title/URL]**` and `**[N]**` citation forms it asks for.

use super::cycle::Cycle;
use crate::core::slot::SlotId;
use serde::Serialize;

/// Horizontal rule between response sections
const SECTION_RULE: &str = "\n\n---\n\n";

/// One numbered response in the synthesis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    /// 1-based window number, in slot order over contributing responses
    pub window: usize,
    pub slot: SlotId,
    pub provider_name: String,
    pub text: String,
}

/// The merge prompt for one cycle (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisRequest {
    pub contributions: Vec<Contribution>,
    pub question: String,
}

impl SynthesisRequest {
    /// Build from collected responses; `None` when nothing was collected
    pub fn from_cycle(cycle: &Cycle) -> Option<Self> {
        if cycle.is_empty() {
            return None;
        }

        let contributions = cycle
            .responses()
            .enumerate()
            .map(|(i, (slot, collected))| Contribution {
                window: i + 1,
                slot,
                provider_name: collected.provider.display_name().to_string(),
                text: collected.response.text.clone(),
            })
            .collect();

        Some(Self {
            contributions,
            question: cycle.question().unwrap_or_default().to_string(),
        })
    }

    pub fn window_count(&self) -> usize {
        self.contributions.len()
    }

    /// Render the request text sent verbatim to the sink
    pub fn render(&self) -> String {
        let mut prompt = format!(
            "Below are responses from {} AI assistant windows to the same question. \
             Synthesize them into a single merged answer.\n\nWindow mapping:\n",
            self.window_count()
        );

        for c in &self.contributions {
            prompt.push_str(&format!(
                "- Window {}: {} ({})\n",
                c.window,
                c.provider_name,
                c.slot.display_name()
            ));
        }

        prompt.push_str(
            "\nCitation rules:\n\
             1. For claims backed by a source found in the responses, cite as **[N: Source Title/URL]**, where N is the window number.\n\
             2. For analytical claims without an external source, cite as **[N]**.\n\
             3. Always format citations in bold.\n\
             4. Preserve the original sources (titles and URLs) found in the responses.\n\n",
        );

        let sections: Vec<String> = self
            .contributions
            .iter()
            .map(|c| format!("Response from Window {}:\n{}", c.window, c.text))
            .collect();
        prompt.push_str(&sections.join(SECTION_RULE));
        prompt.push_str(SECTION_RULE);

        prompt.push_str("Original question:\n");
        prompt.push_str(&self.question);
        prompt.push_str(
            "\n\nWrite one merged answer to the original question that combines the \
             strongest points from every window and follows the citation rules above.",
        );

        prompt
    }
}
