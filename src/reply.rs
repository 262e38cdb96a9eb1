//! Reply text generation.
//!
//! Deterministic template lookup with `{keyword}` / `{url}` interpolation.
//! Questions always get the question template; statements pick one of two
//! equivalent templates at random (50/50) to reduce pattern detectability.
//! The rng is injected and seedable so tests can pin the choice.

use rand::Rng;
use rand::rngs::StdRng;

use crate::pipeline::types::Classification;

const QUESTION_TEMPLATE: &str = "Great question about {keyword}! We'd be happy to help you \
     explore your options. Feel free to reach out: {url}";

const STATEMENT_TEMPLATE_A: &str = "That's a common concern with {keyword}. Our team \
     specializes in finding the right solutions. Contact us here: {url}";

const STATEMENT_TEMPLATE_B: &str = "Happy to help with your {keyword} questions! We work with \
     clients in similar situations daily. Get in touch: {url}";

/// Builds outreach reply text from a matched keyword and classification.
pub struct ResponseGenerator {
    outreach_url: String,
    rng: StdRng,
}

impl ResponseGenerator {
    pub fn new(outreach_url: impl Into<String>, rng: StdRng) -> Self {
        Self {
            outreach_url: outreach_url.into(),
            rng,
        }
    }

    /// Produce the reply text. Plain text; any transport escaping is the
    /// platform collaborator's concern.
    pub fn generate(&mut self, keyword: &str, classification: Classification) -> String {
        let template = match classification {
            Classification::Question => QUESTION_TEMPLATE,
            Classification::Statement => {
                if self.rng.gen_bool(0.5) {
                    STATEMENT_TEMPLATE_A
                } else {
                    STATEMENT_TEMPLATE_B
                }
            }
        };
        template
            .replace("{keyword}", keyword)
            .replace("{url}", &self.outreach_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn generator(seed: u64) -> ResponseGenerator {
        ResponseGenerator::new("https://example.test/contact", StdRng::seed_from_u64(seed))
    }

    #[test]
    fn question_always_uses_question_template() {
        for seed in 0..8 {
            let text = generator(seed).generate("renewal", Classification::Question);
            assert!(text.starts_with("Great question about renewal!"));
            assert!(text.ends_with("https://example.test/contact"));
        }
    }

    #[test]
    fn interpolation_fills_both_placeholders() {
        let text = generator(0).generate("heloc", Classification::Question);
        assert!(!text.contains("{keyword}"));
        assert!(!text.contains("{url}"));
        assert!(text.contains("heloc"));
        assert!(text.contains("https://example.test/contact"));
    }

    #[test]
    fn statement_picks_one_of_two_templates() {
        let text = generator(42).generate("equity", Classification::Statement);
        let is_a = text.starts_with("That's a common concern with equity.");
        let is_b = text.starts_with("Happy to help with your equity questions!");
        assert!(is_a || is_b);
    }

    #[test]
    fn statement_selection_is_deterministic_per_seed() {
        let first = generator(7).generate("debt", Classification::Statement);
        let second = generator(7).generate("debt", Classification::Statement);
        assert_eq!(first, second);
    }

    #[test]
    fn statement_selection_varies_across_draws() {
        // With a fixed seed, 32 draws from one generator hit both templates.
        let mut generator = generator(1);
        let mut saw_a = false;
        let mut saw_b = false;
        for _ in 0..32 {
            let text = generator.generate("rate", Classification::Statement);
            saw_a |= text.starts_with("That's a common concern");
            saw_b |= text.starts_with("Happy to help");
        }
        assert!(saw_a && saw_b);
    }
}
