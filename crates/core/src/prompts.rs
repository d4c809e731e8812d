//! The fixed, ordered catalog of evaluation prompts.
//!
//! A prompt's ID is its 1-based position in the catalog. IDs are only a
//! display convenience; ratings are grouped and looked up by prompt text.

/// Built-in evaluation prompts, grouped by what they exercise.
pub const DEFAULT_PROMPTS: &[&str] = &[
    // Specific font / foundry name
    "fonts from helvetica",
    "Show me all fonts from Colophon Foundry",
    // Known references and similar fonts
    "What are some free alternatives to Proxima Nova?",
    "Show me fonts that feel like Gotham but are not as wide",
    // Font characteristics / style
    "Show me a heavy, condensed display font",
    "Recommend an organic, rounded sans-serif",
    // Use case / task based
    "What are good fonts for typesetting a print-on-demand novel?",
    "Suggest fonts for the user interface of a mobile banking app",
    "I need a font for the packaging of a craft beer brand",
    "What are the best fonts for a professional resume?",
    "Show me fonts suitable for a museum wall text",
    "Find a font for wayfinding signage in a large hospital",
    "I'm looking for a font for a children's picture book",
    "What fonts work well for a podcast cover art?",
    "Suggest a typeface for the credits sequence of a documentary film",
    "I need a font for the body copy of a long-form academic paper",
    // Mood / brand personality
    "Find fonts that feel trustworthy and institutional for a bank's website",
    "I need a font that looks luxurious and premium for a fashion brand",
    "Show me fonts that feel friendly and approachable for a healthcare provider",
    "Suggest a font with a playful and bubbly personality for a kids' toy brand",
    "I'm looking for a font that is bold and action-oriented for a fitness app",
    "Find fonts that feel earthy and organic for a sustainability-focused company",
    "Show me fonts that are experimental and edgy for a disruptive tech startup",
    "I need a font that feels neutral and understated for a wellness app",
    "Suggest a typeface that feels rebellious and rule-breaking",
    "Find fonts with a hand-crafted touch for an artisanal goods shop",
];

/// Ordered prompt catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCatalog {
    prompts: Vec<String>,
}

impl PromptCatalog {
    pub fn new(prompts: Vec<String>) -> Self {
        Self { prompts }
    }

    /// 1-based position of `prompt`, or `None` if it is not in the catalog.
    pub fn prompt_id(&self, prompt: &str) -> Option<u32> {
        self.prompts
            .iter()
            .position(|p| p == prompt)
            .and_then(|i| u32::try_from(i + 1).ok())
    }

    /// Prompt text for a 1-based ID.
    pub fn get(&self, prompt_id: u32) -> Option<&str> {
        let index = usize::try_from(prompt_id).ok()?.checked_sub(1)?;
        self.prompts.get(index).map(String::as_str)
    }

    pub fn contains(&self, prompt: &str) -> bool {
        self.prompt_id(prompt).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prompts.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect())
    }
}
