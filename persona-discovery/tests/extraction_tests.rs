//! Character extractor integration tests

mod helpers;

use async_trait::async_trait;
use helpers::{naruto_candidate, ScriptedGeneration};
use persona_discovery::extraction::{
    CharacterDraft, CharacterExtractor, ExtractionError, GenerationError, GenerationOptions,
    GenerationOutput, GenerationService,
};
use persona_discovery::types::{SearchResult, SourceMetadata};
use std::sync::Arc;
use std::time::Duration;

fn extractor(generation: ScriptedGeneration) -> (CharacterExtractor, Arc<ScriptedGeneration>) {
    let generation = Arc::new(generation);
    (CharacterExtractor::new(generation.clone()), generation)
}

fn unstructured() -> SearchResult {
    SearchResult::new("wikipedia", "Ada_Lovelace", "Ada Lovelace")
        .with_description("English mathematician and writer, chiefly known for her work on the Analytical Engine.")
}

#[tokio::test]
async fn test_structured_candidate_maps_without_generation() {
    let (extractor, generation) = extractor(ScriptedGeneration::new());

    let draft = extractor
        .extract(&naruto_candidate("anilist"), Some("roleplay"))
        .await
        .unwrap();

    assert_eq!(draft.name, "Naruto Uzumaki");
    assert_eq!(draft.age, Some(17));
    assert_eq!(draft.gender.as_deref(), Some("male"));
    assert!((3..=7).contains(&draft.personality.len()), "{:?}", draft.personality);
    assert!(draft.metadata.confidence >= 0.5);
    assert!(draft.metadata.has_structured_data);
    assert_eq!(draft.metadata.source, "anilist");
    assert!(draft.background.ends_with("From Naruto."));
    assert!(generation.prompts().is_empty());
}

#[tokio::test]
async fn test_trait_floor_without_dictionary_matches() {
    let (extractor, _) = extractor(ScriptedGeneration::new());
    let candidate = SearchResult::new("tmdb", "1", "Zyx")
        .with_description("Qwerty uiop asdf.")
        .with_metadata(SourceMetadata {
            occupation: Some("clerk".to_string()),
            ..Default::default()
        });

    let draft = extractor.extract(&candidate, None).await.unwrap();
    assert!(draft.personality.len() >= 3);
    assert!(draft.personality.contains(&"determined".to_string()));
}

#[tokio::test]
async fn test_confidence_floor_for_structured_inputs() {
    let (extractor, _) = extractor(ScriptedGeneration::new());
    let long = "Long text. ".repeat(40);
    let descriptions = ["x", "A short one.", long.as_str()];

    for description in descriptions {
        let candidate = SearchResult::new("mal", "1", "N")
            .with_description(description)
            .with_metadata(SourceMetadata {
                gender: Some("female".to_string()),
                ..Default::default()
            });
        let draft = extractor.extract(&candidate, None).await.unwrap();
        assert!(
            draft.metadata.confidence >= 0.2 && draft.metadata.confidence <= 1.0,
            "confidence {} for {:?}",
            draft.metadata.confidence,
            description
        );
    }
}

#[tokio::test]
async fn test_unstructured_candidate_uses_generation() {
    let reply = "Here you go:\n```json\n{\"personality\": [\"analytical\", \"imaginative\"], \
                 \"occupation\": \"mathematician\", \"age\": 36, \
                 \"background\": \"Daughter of Lord Byron who wrote the first published algorithm.\"}\n```";
    let (extractor, generation) = extractor(ScriptedGeneration::new().reply(reply));

    let draft = extractor
        .extract(&unstructured(), Some("professional"))
        .await
        .unwrap();

    assert_eq!(draft.occupation.as_deref(), Some("mathematician"));
    assert_eq!(draft.age, Some(36));
    assert_eq!(draft.personality.len(), 3, "padded to the trait floor");
    assert_eq!(draft.personality[..2], ["analytical", "imaginative"]);
    assert!(draft.ai_generated_fields.contains(&"occupation".to_string()));
    assert!(!draft.metadata.has_structured_data);
    assert_eq!(draft.metadata.confidence, 0.5);

    let prompts = generation.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Ada Lovelace"));
    assert!(prompts[0].contains("professional"));
}

#[tokio::test]
async fn test_generation_failure_falls_back_to_basic_draft() {
    let (extractor, _) = extractor(
        ScriptedGeneration::new().fail(GenerationError::Failed("quota exceeded".to_string())),
    );

    let draft = extractor.extract(&unstructured(), None).await.unwrap();
    assert_eq!(draft.personality, vec!["mysterious", "interesting", "unique"]);
    assert_eq!(draft.metadata.confidence, 0.3);
    assert!(draft.background.starts_with("English mathematician"));
}

#[tokio::test]
async fn test_unparseable_generation_falls_back_to_basic_draft() {
    let (extractor, _) = extractor(ScriptedGeneration::new().reply("Sorry, I can't do that."));

    let draft = extractor.extract(&unstructured(), None).await.unwrap();
    assert_eq!(draft.metadata.confidence, 0.3);
    assert_eq!(draft.personality.len(), 3);
}

struct HangingGeneration;

#[async_trait]
impl GenerationService for HangingGeneration {
    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GenerationOutput, GenerationError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(GenerationOutput::default())
    }
}

#[tokio::test(start_paused = true)]
async fn test_generation_timeout_falls_back_to_basic_draft() {
    let extractor = CharacterExtractor::new(Arc::new(HangingGeneration))
        .with_generation_timeout(Duration::from_secs(1));

    let draft = extractor.extract(&unstructured(), None).await.unwrap();
    assert_eq!(draft.metadata.confidence, 0.3);
}

#[tokio::test]
async fn test_blank_name_is_rejected() {
    let (extractor, _) = extractor(ScriptedGeneration::new());
    let candidate = SearchResult::new("mal", "1", "   ").with_description("Nameless.");

    let result = extractor.extract(&candidate, None).await;
    assert!(matches!(result, Err(ExtractionError::MissingName(id)) if id == "mal:1"));
}

#[tokio::test]
async fn test_batch_continues_past_failures() {
    let (extractor, _) = extractor(ScriptedGeneration::new());
    let batch = vec![
        naruto_candidate("anilist"),
        SearchResult::new("mal", "2", "").with_description("Broken entry."),
        naruto_candidate("mal"),
    ];

    let drafts = extractor.extract_batch(&batch, Some("roleplay")).await;
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].metadata.source, "anilist");
    assert_eq!(drafts[1].metadata.source, "mal");
}

#[tokio::test]
async fn test_enhance_fills_gaps_and_raises_confidence() {
    let reply = r#"{"personality": ["curious", "brilliant", "stubborn", "kind", "witty"],
                    "background": "Raised by her mother, Ada was tutored in mathematics from an early age and went on to collaborate with Charles Babbage.",
                    "likes": ["poetry"]}"#;
    let (extractor, generation) = extractor(ScriptedGeneration::new().reply(reply));
    let thin = CharacterDraft {
        name: "Ada Lovelace".to_string(),
        personality: vec!["curious".to_string()],
        background: "Mathematician.".to_string(),
        metadata: persona_discovery::extraction::DraftMetadata {
            confidence: 0.4,
            ..Default::default()
        },
        ..Default::default()
    };

    let enhanced = extractor.enhance(thin).await;
    assert_eq!(enhanced.personality.len(), 5);
    assert!(enhanced.background.contains("Babbage"));
    assert_eq!(enhanced.likes, vec!["poetry"]);
    assert!((enhanced.metadata.confidence - 0.6).abs() < 1e-5);
    assert!(generation.prompts()[0].contains("Ada Lovelace"));
}

#[tokio::test]
async fn test_enhance_skips_complete_drafts_and_survives_failure() {
    let (extractor, generation) = extractor(ScriptedGeneration::new());

    let complete = CharacterDraft {
        name: "Naruto Uzumaki".to_string(),
        personality: ["loyal", "brave", "energetic", "stubborn", "kind"]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        background: "b".repeat(150),
        metadata: persona_discovery::extraction::DraftMetadata {
            has_structured_data: true,
            confidence: 0.8,
            ..Default::default()
        },
        ..Default::default()
    };
    assert_eq!(extractor.enhance(complete.clone()).await, complete);
    assert!(generation.prompts().is_empty());

    // Script is empty, so the service fails and the draft comes back unchanged
    let thin = CharacterDraft {
        name: "Someone".to_string(),
        ..Default::default()
    };
    assert_eq!(extractor.enhance(thin.clone()).await, thin);
}
