//! Personality trait inference from free text
//!
//! Descriptions are scanned against a categorized trait dictionary. Each
//! trait lists its synonyms (the canonical word first); a synonym counts when
//! it appears as a whole word. Per trait:
//!
//! `score = hits * 0.3 + 0.4 (canonical word hit) + 0.3 (two or more hits)`
//!
//! Traits are ranked by score, ties keeping dictionary order.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Padding used when the description yields too few traits
pub const FALLBACK_TRAITS: [&str; 3] = ["determined", "capable", "complex"];

/// Minimum number of traits a draft carries
pub const MIN_TRAITS: usize = 3;

/// Most traits taken from a description scan
pub const MAX_INFERRED_TRAITS: usize = 7;

/// Size of a padded trait list
const PADDED_TRAITS: usize = 5;

type Category = (&'static str, &'static [(&'static str, &'static [&'static str])]);

/// Trait dictionary, by category
pub const PERSONALITY_DESCRIPTORS: &[Category] = &[
    (
        "social",
        &[
            ("extroverted", &["extroverted", "extrovert", "outgoing", "sociable", "gregarious", "social"]),
            ("introverted", &["introverted", "introvert", "reserved", "withdrawn", "solitary", "private"]),
            ("charismatic", &["charismatic", "charming", "magnetic", "captivating", "alluring", "enchanting"]),
            ("friendly", &["friendly", "warm", "welcoming", "approachable", "amiable", "cordial"]),
            ("aloof", &["aloof", "distant", "detached", "cold", "standoffish", "remote"]),
        ],
    ),
    (
        "emotional",
        &[
            ("passionate", &["passionate", "fervent", "ardent", "intense", "fiery", "zealous"]),
            ("calm", &["calm", "composed", "serene", "tranquil", "peaceful", "collected"]),
            ("emotional", &["emotional", "sensitive", "empathetic", "feeling", "sympathetic"]),
            ("stoic", &["stoic", "unemotional", "impassive", "unflappable", "controlled"]),
            ("optimistic", &["optimistic", "hopeful", "positive", "upbeat", "cheerful", "bright"]),
            ("pessimistic", &["pessimistic", "cynical", "negative", "gloomy", "doubtful", "skeptical"]),
            ("anxious", &["anxious", "nervous", "worried", "apprehensive", "tense", "uneasy"]),
        ],
    ),
    (
        "behavioral",
        &[
            ("energetic", &["energetic", "active", "dynamic", "vigorous", "lively", "spirited"]),
            ("lazy", &["lazy", "idle", "sluggish", "lethargic", "inactive", "indolent"]),
            ("adventurous", &["adventurous", "daring", "bold", "fearless", "audacious", "venturesome"]),
            ("cautious", &["cautious", "careful", "wary", "prudent", "circumspect", "guarded"]),
            ("impulsive", &["impulsive", "spontaneous", "rash", "hasty", "reckless", "impetuous"]),
            ("methodical", &["methodical", "systematic", "organized", "meticulous", "deliberate"]),
            ("playful", &["playful", "fun-loving", "mischievous", "lighthearted", "whimsical"]),
            ("serious", &["serious", "grave", "solemn", "earnest", "sober", "stern"]),
        ],
    ),
    (
        "moral",
        &[
            ("kind", &["kind", "benevolent", "compassionate", "caring", "gentle", "tender"]),
            ("cruel", &["cruel", "ruthless", "heartless", "merciless", "brutal", "savage"]),
            ("honest", &["honest", "truthful", "sincere", "genuine", "trustworthy", "forthright"]),
            ("deceitful", &["deceitful", "dishonest", "lying", "manipulative", "cunning", "scheming"]),
            ("loyal", &["loyal", "faithful", "devoted", "dedicated", "steadfast", "true"]),
            ("treacherous", &["treacherous", "disloyal", "unfaithful", "traitorous", "backstabbing"]),
            ("just", &["just", "fair", "righteous", "moral", "ethical", "principled"]),
            ("corrupt", &["corrupt", "immoral", "unethical", "dishonest", "crooked"]),
        ],
    ),
    (
        "intellectual",
        &[
            ("intelligent", &["intelligent", "smart", "clever", "bright", "brilliant", "genius"]),
            ("wise", &["wise", "sage", "insightful", "perceptive", "astute", "shrewd"]),
            ("creative", &["creative", "imaginative", "inventive", "innovative", "artistic", "original"]),
            ("analytical", &["analytical", "logical", "rational", "systematic", "methodical"]),
            ("curious", &["curious", "inquisitive", "interested", "questioning", "probing"]),
            ("ignorant", &["ignorant", "naive", "uninformed", "unaware", "clueless"]),
            ("strategic", &["strategic", "tactical", "calculating", "planning", "shrewd"]),
        ],
    ),
    (
        "strength",
        &[
            ("brave", &["brave", "courageous", "fearless", "valiant", "heroic", "gallant", "bold"]),
            ("cowardly", &["cowardly", "timid", "fearful", "afraid", "scared", "spineless"]),
            ("confident", &["confident", "self-assured", "poised", "assertive", "bold", "sure"]),
            ("insecure", &["insecure", "uncertain", "doubtful", "hesitant", "self-conscious"]),
            ("determined", &["determined", "resolute", "persistent", "tenacious", "steadfast"]),
            ("weak-willed", &["weak-willed", "irresolute", "indecisive", "wavering", "vacillating"]),
            ("disciplined", &["disciplined", "controlled", "restrained", "self-controlled"]),
            ("undisciplined", &["undisciplined", "uncontrolled", "wild", "unrestrained"]),
        ],
    ),
    (
        "leadership",
        &[
            ("leader", &["leader", "commanding", "authoritative", "dominant", "powerful"]),
            ("follower", &["follower", "submissive", "obedient", "compliant", "subservient"]),
            ("independent", &["independent", "self-reliant", "autonomous", "self-sufficient"]),
            ("dependent", &["dependent", "reliant", "needy", "clinging"]),
            ("ambitious", &["ambitious", "driven", "motivated", "aspiring", "goal-oriented"]),
            ("humble", &["humble", "modest", "unassuming", "meek", "unpretentious"]),
            ("arrogant", &["arrogant", "proud", "haughty", "conceited", "egotistical", "vain"]),
        ],
    ),
    (
        "temperament",
        &[
            ("patient", &["patient", "tolerant", "forbearing", "understanding", "lenient"]),
            ("impatient", &["impatient", "restless", "eager", "hurried", "hasty"]),
            ("aggressive", &["aggressive", "hostile", "combative", "belligerent", "violent"]),
            ("peaceful", &["peaceful", "gentle", "mild", "non-violent", "pacific"]),
            ("stubborn", &["stubborn", "obstinate", "headstrong", "inflexible", "unyielding"]),
            ("flexible", &["flexible", "adaptable", "versatile", "accommodating", "adjustable"]),
            ("forgiving", &["forgiving", "merciful", "lenient", "pardoning", "compassionate"]),
            ("vengeful", &["vengeful", "vindictive", "spiteful", "retaliatory", "unforgiving"]),
        ],
    ),
    (
        "relationship",
        &[
            ("romantic", &["romantic", "loving", "affectionate", "tender", "amorous", "passionate"]),
            ("protective", &["protective", "guarding", "defensive", "watchful", "sheltering"]),
            ("jealous", &["jealous", "envious", "possessive", "covetous", "resentful"]),
            ("supportive", &["supportive", "encouraging", "helpful", "nurturing", "caring"]),
            ("competitive", &["competitive", "rival", "challenging", "antagonistic"]),
            ("cooperative", &["cooperative", "collaborative", "team-oriented", "helpful"]),
        ],
    ),
    (
        "unique",
        &[
            ("eccentric", &["eccentric", "quirky", "unusual", "odd", "peculiar", "unconventional"]),
            ("mysterious", &["mysterious", "enigmatic", "cryptic", "secretive", "elusive"]),
            ("charming", &["charming", "delightful", "engaging", "winning", "appealing"]),
            ("intimidating", &["intimidating", "frightening", "menacing", "threatening", "scary"]),
            ("sophisticated", &["sophisticated", "refined", "cultured", "elegant", "polished"]),
            ("rebellious", &["rebellious", "defiant", "disobedient", "contrary", "insurgent"]),
        ],
    ),
];

struct TraitPattern {
    name: &'static str,
    synonyms: Vec<(&'static str, Regex)>,
}

static TRAIT_PATTERNS: Lazy<Vec<TraitPattern>> = Lazy::new(|| {
    PERSONALITY_DESCRIPTORS
        .iter()
        .flat_map(|&(_, traits)| traits.iter())
        .map(|&(name, synonyms)| TraitPattern {
            name,
            synonyms: synonyms
                .iter()
                .filter_map(|syn| {
                    Regex::new(&format!(r"\b{}\b", regex::escape(syn)))
                        .ok()
                        .map(|re| (*syn, re))
                })
                .collect(),
        })
        .collect()
});

/// Score every dictionary trait against `description`
///
/// Returns traits with a nonzero score, best first. A trait listed under
/// several categories is scored once, at its first position.
pub fn score_traits(description: &str) -> Vec<(&'static str, f32)> {
    let text = description.to_lowercase();
    let mut seen = HashSet::new();
    let mut scored: Vec<(&'static str, f32)> = TRAIT_PATTERNS
        .iter()
        .filter(|pattern| seen.insert(pattern.name))
        .filter_map(|pattern| {
            let mut hits = 0u32;
            let mut canonical = false;
            for (synonym, re) in &pattern.synonyms {
                if re.is_match(&text) {
                    hits += 1;
                    canonical |= *synonym == pattern.name;
                }
            }
            if hits == 0 {
                return None;
            }

            let mut score = hits as f32 * 0.3;
            if canonical {
                score += 0.4;
            }
            if hits >= 2 {
                score += 0.3;
            }
            Some((pattern.name, score.min(1.0)))
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}

/// Personality traits for a description
///
/// Up to seven ranked traits when at least three match; otherwise whatever
/// matched, padded with the generic fallback traits to five.
pub fn infer_traits(description: &str) -> Vec<String> {
    let ranked: Vec<String> = score_traits(description)
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();

    if ranked.len() >= MIN_TRAITS {
        return ranked.into_iter().take(MAX_INFERRED_TRAITS).collect();
    }

    pad_traits(ranked, PADDED_TRAITS)
}

/// Append fallback traits (skipping ones already present) up to `target`
pub fn pad_traits(mut traits: Vec<String>, target: usize) -> Vec<String> {
    for fallback in FALLBACK_TRAITS {
        if traits.len() >= target {
            break;
        }
        if !traits.iter().any(|t| t.eq_ignore_ascii_case(fallback)) {
            traits.push(fallback.to_string());
        }
    }
    traits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_and_synonym_scoring() {
        // "loyal" canonical + "devoted" synonym: 2 * 0.3 + 0.4 + 0.3 capped at 1.0
        // "brave" via "courageous" only: 0.3
        let scored = score_traits("A loyal and devoted friend who is courageous.");
        let loyal = scored.iter().find(|(t, _)| *t == "loyal").unwrap();
        let brave = scored.iter().find(|(t, _)| *t == "brave").unwrap();

        assert!((loyal.1 - 1.0).abs() < 1e-6);
        assert!((brave.1 - 0.3).abs() < 1e-6);
        assert_eq!(scored[0].0, "loyal");
    }

    #[test]
    fn test_whole_word_matching() {
        // "justice" must not match "just", "unkind" must not match "kind"
        let scored = score_traits("He fights for justice and is never unkind");
        assert!(scored.iter().all(|(t, _)| *t != "just" && *t != "kind"));
    }

    #[test]
    fn test_hyphenated_synonyms() {
        let scored = score_traits("A fun-loving prankster");
        assert!(scored.iter().any(|(t, _)| *t == "playful"));
    }

    #[test]
    fn test_ranked_traits_capped_at_seven() {
        let description = "Loyal, brave, kind, honest, calm, curious, creative, \
                           ambitious, stubborn and playful.";
        let traits = infer_traits(description);
        assert_eq!(traits.len(), MAX_INFERRED_TRAITS);
    }

    #[test]
    fn test_no_matches_pads_with_fallback() {
        let traits = infer_traits("Lives in a village near the forest.");
        assert_eq!(traits, vec!["determined", "capable", "complex"]);
    }

    #[test]
    fn test_padding_skips_duplicates() {
        let traits = infer_traits("A determined young ninja.");
        assert_eq!(traits, vec!["determined", "capable", "complex"]);

        let traits = infer_traits("A loyal and determined young ninja.");
        assert_eq!(traits.len(), 4);
        assert_eq!(
            traits.iter().filter(|t| t.as_str() == "determined").count(),
            1
        );
    }
}
