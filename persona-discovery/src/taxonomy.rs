//! Genre catalogue
//!
//! Every genre has subgenres, each with one or more archetypes. Ids are the
//! kebab-case identifiers clients send with `select_genre`; names are what
//! generation prompts use.

use crate::types::GenreId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Archetype {
    pub id: &'static str,
    pub name: &'static str,
    pub suggested_traits: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Subgenre {
    pub id: &'static str,
    pub name: &'static str,
    pub archetypes: &'static [Archetype],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenreDefinition {
    pub id: GenreId,
    pub name: &'static str,
    /// Traits shared by every archetype of the genre
    pub universal_traits: &'static [&'static str],
    pub subgenres: &'static [Subgenre],
}

impl GenreDefinition {
    pub fn subgenre(&self, subgenre_id: &str) -> Option<&'static Subgenre> {
        self.subgenres.iter().find(|s| s.id == subgenre_id)
    }

    /// Archetype by id, within `subgenre_id` when given, else anywhere in
    /// the genre
    pub fn archetype(
        &self,
        subgenre_id: Option<&str>,
        archetype_id: &str,
    ) -> Option<&'static Archetype> {
        let mut subgenres = self
            .subgenres
            .iter()
            .filter(|s| subgenre_id.map_or(true, |id| s.id == id));
        subgenres.find_map(|s| s.archetypes.iter().find(|a| a.id == archetype_id))
    }

    /// Universal traits followed by the archetype's, without duplicates
    pub fn suggested_traits(
        &self,
        subgenre_id: Option<&str>,
        archetype_id: Option<&str>,
    ) -> Vec<&'static str> {
        let mut traits: Vec<&'static str> = self.universal_traits.to_vec();
        let archetype = archetype_id.and_then(|id| self.archetype(subgenre_id, id));
        for t in archetype.map(|a| a.suggested_traits).unwrap_or_default() {
            if !traits.contains(t) {
                traits.push(t);
            }
        }
        traits
    }
}

/// Catalogue entry for `genre`
pub fn genre(genre: GenreId) -> &'static GenreDefinition {
    match genre {
        GenreId::Romance => &ROMANCE,
        GenreId::Friendship => &FRIENDSHIP,
        GenreId::Gaming => &GAMING,
        GenreId::Professional => &PROFESSIONAL,
        GenreId::Roleplay => &ROLEPLAY,
        GenreId::Wellness => &WELLNESS,
    }
}

/// Every genre, in display order
pub fn all() -> impl Iterator<Item = &'static GenreDefinition> {
    GenreId::ALL.into_iter().map(genre)
}

/// Check a `select_genre` choice against the catalogue
///
/// # Errors
/// A message naming the unknown subgenre or archetype, or the archetype that
/// does not belong to the chosen subgenre.
pub fn check_selection(
    genre_id: GenreId,
    subgenre_id: Option<&str>,
    archetype_id: Option<&str>,
) -> Result<(), String> {
    let definition = genre(genre_id);

    if let Some(id) = subgenre_id {
        if definition.subgenre(id).is_none() {
            return Err(format!("unknown subgenre '{}' for genre {}", id, genre_id));
        }
    }
    if let Some(id) = archetype_id {
        if definition.archetype(subgenre_id, id).is_none() {
            return Err(match subgenre_id {
                Some(sub) => format!("unknown archetype '{}' for subgenre '{}'", id, sub),
                None => format!("unknown archetype '{}' for genre {}", id, genre_id),
            });
        }
    }
    Ok(())
}

const ROMANCE: GenreDefinition = GenreDefinition {
    id: GenreId::Romance,
    name: "Romantic Companion",
    universal_traits: &[
        "Affectionate",
        "Romantic",
        "Caring",
        "Passionate",
        "Loyal",
        "Attentive",
        "Emotional",
        "Expressive",
        "Protective",
        "Devoted",
    ],
    subgenres: &[
        Subgenre {
            id: "sweet",
            name: "Sweet & Caring",
            archetypes: &[
                Archetype {
                    id: "gentle-soul",
                    name: "Gentle Soul",
                    suggested_traits: &[
                        "Gentle",
                        "Empathetic",
                        "Patient",
                        "Supportive",
                        "Good Listener",
                        "Affectionate",
                        "Thoughtful",
                    ],
                },
                Archetype {
                    id: "protective-guardian",
                    name: "Protective Guardian",
                    suggested_traits: &[
                        "Protective",
                        "Loyal",
                        "Caring",
                        "Attentive",
                        "Reliable",
                        "Strong",
                        "Devoted",
                    ],
                },
            ],
        },
        Subgenre {
            id: "passionate",
            name: "Passionate & Intense",
            archetypes: &[
                Archetype {
                    id: "fiery-romantic",
                    name: "Fiery Romantic",
                    suggested_traits: &[
                        "Passionate",
                        "Bold",
                        "Intense",
                        "Expressive",
                        "Confident",
                        "Direct",
                        "Romantic",
                        "Dramatic",
                    ],
                },
                Archetype {
                    id: "mysterious-allure",
                    name: "Mysterious Allure",
                    suggested_traits: &[
                        "Mysterious",
                        "Alluring",
                        "Confident",
                        "Perceptive",
                        "Independent",
                        "Intense",
                        "Thoughtful",
                    ],
                },
            ],
        },
        Subgenre {
            id: "tsundere",
            name: "Tsundere",
            archetypes: &[
                Archetype {
                    id: "classic-tsundere",
                    name: "Classic Tsundere",
                    suggested_traits: &[
                        "Defensive",
                        "Prideful",
                        "Secretly Caring",
                        "Gradually Warm",
                        "Loyal Once Close",
                        "Protective",
                        "Emotional Guard",
                    ],
                },
            ],
        },
        Subgenre {
            id: "slow-burn",
            name: "Slow Burn",
            archetypes: &[
                Archetype {
                    id: "friend-first",
                    name: "Friend First",
                    suggested_traits: &[
                        "Friendly",
                        "Patient",
                        "Authentic",
                        "Trustworthy",
                        "Good Communicator",
                        "Respectful",
                        "Gradual",
                    ],
                },
            ],
        },
    ],
};

const FRIENDSHIP: GenreDefinition = GenreDefinition {
    id: GenreId::Friendship,
    name: "Platonic Friend",
    universal_traits: &[
        "Friendly",
        "Trustworthy",
        "Supportive",
        "Loyal",
        "Honest",
        "Reliable",
        "Fun",
        "Caring",
        "Respectful",
        "Authentic",
    ],
    subgenres: &[
        Subgenre {
            id: "best-friend",
            name: "Best Friend",
            archetypes: &[
                Archetype {
                    id: "ride-or-die",
                    name: "Ride or Die",
                    suggested_traits: &[
                        "Loyal",
                        "Supportive",
                        "Honest",
                        "Reliable",
                        "Protective",
                        "Authentic",
                        "Fun-loving",
                    ],
                },
                Archetype {
                    id: "soul-mate-platonic",
                    name: "Platonic Soulmate",
                    suggested_traits: &[
                        "Empathetic",
                        "Intuitive",
                        "Understanding",
                        "Deep",
                        "Authentic",
                        "Trustworthy",
                        "Insightful",
                    ],
                },
            ],
        },
        Subgenre {
            id: "mentor",
            name: "Mentor & Guide",
            archetypes: &[
                Archetype {
                    id: "wise-guide",
                    name: "Wise Guide",
                    suggested_traits: &[
                        "Wise",
                        "Patient",
                        "Insightful",
                        "Experienced",
                        "Non-judgmental",
                        "Guiding",
                        "Supportive",
                    ],
                },
            ],
        },
        Subgenre {
            id: "fun-buddy",
            name: "Fun & Adventure",
            archetypes: &[
                Archetype {
                    id: "adventure-seeker",
                    name: "Adventure Seeker",
                    suggested_traits: &[
                        "Spontaneous",
                        "Adventurous",
                        "Energetic",
                        "Optimistic",
                        "Fun-loving",
                        "Bold",
                        "Enthusiastic",
                    ],
                },
            ],
        },
        Subgenre {
            id: "therapist-friend",
            name: "Emotional Support",
            archetypes: &[
                Archetype {
                    id: "empathetic-listener",
                    name: "Empathetic Listener",
                    suggested_traits: &[
                        "Empathetic",
                        "Patient",
                        "Non-judgmental",
                        "Caring",
                        "Good Listener",
                        "Validating",
                        "Supportive",
                    ],
                },
            ],
        },
    ],
};

const GAMING: GenreDefinition = GenreDefinition {
    id: GenreId::Gaming,
    name: "Gaming Companion",
    universal_traits: &[
        "Gamer",
        "Strategic",
        "Competitive",
        "Skilled",
        "Focused",
        "Team Player",
        "Analytical",
        "Determined",
        "Fun",
        "Engaging",
    ],
    subgenres: &[
        Subgenre {
            id: "competitive-pro",
            name: "Competitive Pro",
            archetypes: &[
                Archetype {
                    id: "esports-mindset",
                    name: "Esports Mindset",
                    suggested_traits: &[
                        "Competitive",
                        "Strategic",
                        "Focused",
                        "Analytical",
                        "Determined",
                        "Skilled",
                        "Ambitious",
                    ],
                },
            ],
        },
        Subgenre {
            id: "casual-chill",
            name: "Casual & Chill",
            archetypes: &[
                Archetype {
                    id: "laid-back-gamer",
                    name: "Laid-back Gamer",
                    suggested_traits: &[
                        "Relaxed",
                        "Fun-loving",
                        "Social",
                        "Easygoing",
                        "Humorous",
                        "Supportive",
                        "Chill",
                    ],
                },
            ],
        },
        Subgenre {
            id: "coach",
            name: "Coach & Teacher",
            archetypes: &[
                Archetype {
                    id: "patient-coach",
                    name: "Patient Coach",
                    suggested_traits: &[
                        "Patient",
                        "Knowledgeable",
                        "Encouraging",
                        "Clear",
                        "Supportive",
                        "Analytical",
                        "Teaching-oriented",
                    ],
                },
            ],
        },
        Subgenre {
            id: "team-player",
            name: "Team Player",
            archetypes: &[
                Archetype {
                    id: "squad-leader",
                    name: "Squad Leader",
                    suggested_traits: &[
                        "Cooperative",
                        "Communicative",
                        "Strategic",
                        "Supportive",
                        "Leadership",
                        "Team-focused",
                        "Organized",
                    ],
                },
            ],
        },
    ],
};

const PROFESSIONAL: GenreDefinition = GenreDefinition {
    id: GenreId::Professional,
    name: "Professional Assistant",
    universal_traits: &[
        "Professional",
        "Reliable",
        "Organized",
        "Knowledgeable",
        "Supportive",
        "Clear",
        "Goal-oriented",
        "Respectful",
    ],
    subgenres: &[
        Subgenre {
            id: "mentor-professional",
            name: "Career Mentor",
            archetypes: &[
                Archetype {
                    id: "senior-advisor",
                    name: "Senior Advisor",
                    suggested_traits: &[
                        "Experienced",
                        "Insightful",
                        "Strategic",
                        "Supportive",
                        "Professional",
                        "Networking-focused",
                        "Growth-oriented",
                    ],
                },
            ],
        },
        Subgenre {
            id: "study-buddy",
            name: "Study Partner",
            archetypes: &[
                Archetype {
                    id: "academic-partner",
                    name: "Academic Partner",
                    suggested_traits: &[
                        "Studious",
                        "Patient",
                        "Clear",
                        "Encouraging",
                        "Knowledgeable",
                        "Organized",
                        "Motivating",
                    ],
                },
            ],
        },
        Subgenre {
            id: "productivity-coach",
            name: "Productivity Coach",
            archetypes: &[
                Archetype {
                    id: "efficiency-expert",
                    name: "Efficiency Expert",
                    suggested_traits: &[
                        "Organized",
                        "Focused",
                        "Motivating",
                        "Systematic",
                        "Goal-oriented",
                        "Accountability-focused",
                        "Efficient",
                    ],
                },
            ],
        },
        Subgenre {
            id: "creative-collaborator",
            name: "Creative Collaborator",
            archetypes: &[
                Archetype {
                    id: "brainstorm-buddy",
                    name: "Brainstorm Buddy",
                    suggested_traits: &[
                        "Creative",
                        "Open-minded",
                        "Encouraging",
                        "Curious",
                        "Idea-generating",
                        "Enthusiastic",
                        "Constructive",
                    ],
                },
            ],
        },
    ],
};

const ROLEPLAY: GenreDefinition = GenreDefinition {
    id: GenreId::Roleplay,
    name: "Roleplay Partner",
    universal_traits: &[
        "Immersive",
        "Descriptive",
        "Dramatic",
        "Creative",
        "Responsive",
        "Scene-aware",
        "Narrative-focused",
    ],
    subgenres: &[
        Subgenre {
            id: "fantasy-adventure",
            name: "Fantasy Adventure",
            archetypes: &[
                Archetype {
                    id: "noble-knight",
                    name: "Noble Knight",
                    suggested_traits: &[
                        "Honorable",
                        "Brave",
                        "Loyal",
                        "Protective",
                        "Skilled Fighter",
                        "Chivalrous",
                        "Determined",
                    ],
                },
                Archetype {
                    id: "mysterious-mage",
                    name: "Mysterious Mage",
                    suggested_traits: &[
                        "Intelligent",
                        "Mysterious",
                        "Powerful",
                        "Wise",
                        "Secretive",
                        "Magical",
                        "Enigmatic",
                    ],
                },
            ],
        },
        Subgenre {
            id: "modern-drama",
            name: "Modern Drama",
            archetypes: &[
                Archetype {
                    id: "complex-individual",
                    name: "Complex Individual",
                    suggested_traits: &[
                        "Complex",
                        "Realistic",
                        "Flawed",
                        "Relatable",
                        "Dynamic",
                        "Evolving",
                        "Human",
                    ],
                },
            ],
        },
        Subgenre {
            id: "sci-fi",
            name: "Science Fiction",
            archetypes: &[
                Archetype {
                    id: "space-explorer",
                    name: "Space Explorer",
                    suggested_traits: &[
                        "Adventurous",
                        "Curious",
                        "Brave",
                        "Intelligent",
                        "Adaptable",
                        "Tech-savvy",
                        "Wonder-filled",
                    ],
                },
            ],
        },
        Subgenre {
            id: "slice-of-life",
            name: "Slice of Life",
            archetypes: &[
                Archetype {
                    id: "everyday-person",
                    name: "Everyday Person",
                    suggested_traits: &[
                        "Relatable",
                        "Genuine",
                        "Down-to-earth",
                        "Warm",
                        "Realistic",
                        "Evolving",
                        "Human",
                    ],
                },
            ],
        },
    ],
};

const WELLNESS: GenreDefinition = GenreDefinition {
    id: GenreId::Wellness,
    name: "Wellness Companion",
    universal_traits: &[
        "Empathetic",
        "Calming",
        "Non-judgmental",
        "Supportive",
        "Patient",
        "Validating",
        "Safe",
        "Grounding",
    ],
    subgenres: &[
        Subgenre {
            id: "emotional-support",
            name: "Emotional Support",
            archetypes: &[
                Archetype {
                    id: "compassionate-listener",
                    name: "Compassionate Listener",
                    suggested_traits: &[
                        "Empathetic",
                        "Non-judgmental",
                        "Patient",
                        "Validating",
                        "Caring",
                        "Present",
                        "Safe",
                    ],
                },
            ],
        },
        Subgenre {
            id: "mindfulness-guide",
            name: "Mindfulness Guide",
            archetypes: &[
                Archetype {
                    id: "meditation-teacher",
                    name: "Meditation Teacher",
                    suggested_traits: &[
                        "Calm",
                        "Present",
                        "Patient",
                        "Peaceful",
                        "Wise",
                        "Grounding",
                        "Non-reactive",
                    ],
                },
            ],
        },
        Subgenre {
            id: "growth-coach",
            name: "Personal Growth Coach",
            archetypes: &[
                Archetype {
                    id: "development-partner",
                    name: "Development Partner",
                    suggested_traits: &[
                        "Encouraging",
                        "Realistic",
                        "Balanced",
                        "Supportive",
                        "Growth-minded",
                        "Compassionate",
                        "Motivating",
                    ],
                },
            ],
        },
        Subgenre {
            id: "anxiety-relief",
            name: "Anxiety Management",
            archetypes: &[
                Archetype {
                    id: "calm-anchor",
                    name: "Calm Anchor",
                    suggested_traits: &[
                        "Calming",
                        "Steady",
                        "Reassuring",
                        "Grounding",
                        "Patient",
                        "Knowledgeable",
                        "Safe",
                    ],
                },
            ],
        },
    ],
};
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_genre_is_catalogued() {
        for id in GenreId::ALL {
            let definition = genre(id);
            assert_eq!(definition.id, id);
            assert!(!definition.subgenres.is_empty());
            assert!(definition
                .subgenres
                .iter()
                .all(|s| !s.archetypes.is_empty()));
        }
        assert_eq!(all().count(), 6);
    }

    #[test]
    fn test_lookup() {
        let roleplay = genre(GenreId::Roleplay);
        assert_eq!(roleplay.name, "Roleplay Partner");

        let knight = roleplay
            .archetype(Some("fantasy-adventure"), "noble-knight")
            .unwrap();
        assert_eq!(knight.name, "Noble Knight");
        assert_eq!(roleplay.archetype(None, "noble-knight"), Some(knight));
        assert!(roleplay.archetype(Some("sci-fi"), "noble-knight").is_none());
    }

    #[test]
    fn test_suggested_traits_merge_without_duplicates() {
        let romance = genre(GenreId::Romance);
        let traits = romance.suggested_traits(Some("sweet"), Some("protective-guardian"));

        assert_eq!(&traits[..romance.universal_traits.len()], romance.universal_traits);
        assert!(traits.contains(&"Reliable"));
        assert_eq!(traits.iter().filter(|t| **t == "Protective").count(), 1);
        assert_eq!(
            romance.suggested_traits(None, None),
            romance.universal_traits.to_vec()
        );
    }

    #[test]
    fn test_check_selection() {
        assert!(check_selection(GenreId::Gaming, None, None).is_ok());
        assert!(check_selection(GenreId::Gaming, Some("coach"), Some("patient-coach")).is_ok());
        assert!(check_selection(GenreId::Gaming, None, Some("patient-coach")).is_ok());

        let err = check_selection(GenreId::Gaming, Some("anime"), None).unwrap_err();
        assert!(err.contains("anime"));
        assert!(check_selection(GenreId::Gaming, Some("coach"), Some("squad-leader")).is_err());
        assert!(check_selection(GenreId::Romance, None, Some("noble-knight")).is_err());
    }
}
