//! The instruction sent to the model on every refresh.
//!
//! The prompt pins down scope (region, last 24 hours, no sport), source
//! priority, relevance rules and the exact JSON envelope that
//! `parse_breakdown` expects.

use std::fmt::Write;

/// Outlets the model is told to check first, in priority order.
pub const DEFAULT_PREFERRED_SOURCES: &[&str] = &[
    "https://www.newswire.lk",
    "https://www.ft.lk",
    "https://www.dailymirror.lk",
    "http://www.tamilnet.com/",
    "http://www.colombopage.com",
    "http://newsfirst.lk/",
    "http://groundviews.org/",
    "http://island.lk/",
    "http://vikalpa.org/",
    "http://lankatruth.com/",
    "http://srilankawatch.com/",
    "http://www.asiantribune.com/",
    "http://sundaytimes.lk/",
    "http://dailynews.lk/",
    "http://news.lk/",
    "http://thesundayleader.lk/",
    "http://sundayobserver.lk/",
    "http://lankaweb.com/",
    "http://rivira.lk/",
    "http://adaderana.lk/",
    "http://digathanews.com/",
    "http://onlanka.com/",
    "http://sirasa.com/",
    "http://www.elankanews.com/",
    "http://www.itn.lk/",
    "http://www.rupavahini.lk/",
    "http://www.slbc.lk/",
    "http://www.sriexpress.com/",
    "http://tamilguardian.com/",
    "http://roar.media/",
    "http://www.divaina.com/",
    "http://www.lakbima.lk/",
    "http://www.lankadeepa.lk/",
    "http://onlineuthayan.com/",
    "http://www.virakesari.lk/",
    "http://www.theacademic.org/",
    "http://lankanewspapers.com/",
    "http://www.lankapage.com/",
    "http://www.srilankanewslive.com/",
    "http://www.srilankannews.net/",
    "http://maatram.org/",
];

/// Inputs that vary the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    /// Geographic topic, e.g. "Sri Lanka".
    pub region: String,
    /// Outlets to check first, highest priority first.
    pub preferred_sources: Vec<String>,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            region: "Sri Lanka".to_string(),
            preferred_sources: DEFAULT_PREFERRED_SOURCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Build the full instruction text.
pub fn build_prompt(options: &PromptOptions) -> String {
    let region = options.region.trim();
    let mut prompt = String::with_capacity(4096);

    let _ = writeln!(
        prompt,
        "Generate a thematic breakdown of all major news stories related to {region} in the past 24 hours."
    );
    prompt.push_str(
        "Each theme must contain at least two stories. Generate as many distinct themes as possible, \
         provided there is enough relevant news content to support them.\n",
    );
    prompt.push_str(
        "All generated text, including titles, summaries, and contexts, must be written in UK English \
         (e.g., use 'summarise' instead of 'summarize', 'colour' instead of 'color', \
         'normalisation' instead of 'normalization').\n",
    );
    prompt.push_str(
        "Exclude any sports-related news or updates. The articles can be from both foreign and \
         domestic media outlets.\n",
    );

    if !options.preferred_sources.is_empty() {
        prompt.push_str(
            "When searching for information, you MUST first check and give priority to news articles \
             and related content published on the following websites:\n",
        );
        for source in &options.preferred_sources {
            let _ = writeln!(prompt, "- {}", source.trim());
        }
    }

    prompt.push('\n');
    prompt.push_str(
        "First, provide a top-level \"overview\" as a short, bulleted list (3-5 points) summarising \
         the most critical developments.\n\n",
    );
    prompt.push_str(
        "Then, provide a \"themes\" section. For each story within a theme, provide a title, a concise \
         one-sentence summary, a direct URL to the source article, and if it's a significant \
         development, a brief context of what it follows up on. To establish this context, actively \
         look for related articles from previous days or weeks (e.g., from archives) to create a clear \
         timeline. The context must be grounded in verifiable prior events; do not speculate or create \
         weak connections.\n",
    );
    prompt.push_str(
        "Do not repeat stories across different themes. Group related stories under a clear, \
         overarching theme title.\n",
    );
    prompt.push_str(
        "Crucially, every story within a theme must be directly and strongly relevant to the theme's \
         title. For example, a news story about government visa policies for foreign nationals does \
         not belong under a theme titled \"Maritime and Environmental Accountability\".\n\n",
    );
    prompt.push_str(
        "IMPORTANT: Format your entire response as a single JSON object inside a markdown code block \
         (```json ... ```).\n",
    );
    prompt.push_str("The JSON object must have two top-level keys:\n");
    prompt.push_str(
        "1. \"overview\": an array of strings, where each string is a bullet point for the summary.\n",
    );
    prompt.push_str("2. \"themes\": an array of theme objects.\n");
    prompt.push_str(
        "Each theme object must have \"themeTitle\" (string) and \"stories\" (an array of story objects).\n",
    );
    prompt.push_str(
        "Each story object must have \"title\" (string), \"summary\" (string), \"url\" (string, a direct \
         link to the source news article), and \"context\" (string, can be an empty string if not \
         applicable).\n",
    );

    prompt
}
