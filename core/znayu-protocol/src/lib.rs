pub mod ids;
pub mod morphology;

// Re-export core types for convenience
pub use ids::{ChapterId, ExerciseId, LexemeId, PackId, RuleId, SectionId};
pub use morphology::*;

pub mod model;
pub use model::*;

pub mod exercise;
pub use exercise::*;

pub mod curriculum;
pub use curriculum::{Curriculum, CurriculumError};

#[cfg(test)]
mod tests {
    use super::*;
    use rkyv::{from_bytes, to_bytes};

    #[test]
    fn test_enum_serialization() {
        let original = SectionType::MixedReview;

        let bytes = to_bytes::<_, 256>(&original).expect("Failed to serialize SectionType");
        let deserialized: SectionType = from_bytes(&bytes).expect("Failed to deserialize SectionType");

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_id_layout() {
        // LexemeId(u32) should be exactly 4 bytes
        assert_eq!(core::mem::size_of::<LexemeId>(), 4);
        assert_eq!(core::mem::size_of::<Option<LexemeId>>(), 8);
    }

    #[test]
    fn test_bundled_curriculum_is_consistent() {
        let curriculum = Curriculum::bundled().expect("bundled curriculum parses");
        curriculum.validate().expect("no dangling references");
        assert!(curriculum.chapter_by_number(18).is_some());
        assert!(curriculum.grammar_rule(RuleId(18)).is_some());
    }

    #[test]
    fn test_packs_unlock_with_their_chapter() {
        let curriculum = Curriculum::bundled().unwrap();
        let active = [PackId(1), PackId(2), PackId(99)];
        let early: Vec<PackId> = curriculum.active_packs(&active, 3).iter().map(|p| p.id).collect();
        assert_eq!(early, vec![PackId(1)]);
        assert_eq!(curriculum.active_packs(&active, 18).len(), 2);

        let learned = curriculum.learned_lexemes(3, &active);
        assert!(learned.iter().any(|l| l.id == LexemeId(100)));
        assert!(learned.iter().all(|l| l.id != LexemeId(2000)));
    }

    #[test]
    fn test_archive_round_trip() {
        let curriculum = Curriculum::bundled().unwrap();
        let bytes = curriculum.to_archive().unwrap();
        let restored = Curriculum::from_archive(&bytes).unwrap();
        assert_eq!(curriculum, restored);
    }

    #[test]
    fn test_corrupt_archive_is_rejected() {
        let err = Curriculum::from_archive(&[0xff; 7]).unwrap_err();
        assert!(matches!(err, CurriculumError::Archive(_)));
    }

    #[test]
    fn test_rule_case_detection() {
        let cases = CaseSet::from_rule_name("Genitive Case: Possession");
        assert_eq!(cases, CaseSet::GENITIVE);
        assert_eq!(cases.preferred_case(), Case::Genitive);

        let mixed = CaseSet::from_rule_name("Accusative vs Prepositional");
        assert_eq!(mixed.preferred_case(), Case::Prepositional);
        assert_eq!(CaseSet::from_rule_name("Verb Conjugation"), CaseSet::empty());
    }

    #[test]
    fn test_section_falls_back_to_chapter_union() {
        let section = |id: u32, lexemes: &[u32]| Section {
            id: SectionId(id),
            name: String::new(),
            kind: SectionType::Vocabulary,
            lexeme_ids: lexemes.iter().copied().map(LexemeId).collect(),
            rule_ids: vec![],
            letters: vec![],
            order: id,
        };
        let chapter = Chapter {
            id: ChapterId(9),
            number: 9,
            title: "Test".into(),
            title_native: None,
            lexeme_ids: vec![],
            rule_ids: vec![],
            sections: vec![section(1, &[1, 2]), section(2, &[2, 3])],
        };
        assert_eq!(chapter.scope_lexeme_ids(), vec![LexemeId(1), LexemeId(2), LexemeId(3)]);
    }

    #[test]
    fn test_exercise_json_shape() {
        let exercise = Exercise::new(
            ExerciseId(7),
            ExerciseKind::FillInBlank {
                sentence_part1: "Я читаю".into(),
                sentence_part2: "(I read a book)".into(),
                correct_answer: "книгу".into(),
            },
        );
        let json = serde_json::to_value(&exercise).unwrap();
        assert_eq!(json["type"], "FILL_IN_BLANK");
        assert_eq!(json["correct_answer"], "книгу");
        let back: Exercise = serde_json::from_value(json).unwrap();
        assert_eq!(back, exercise);
    }

    #[test]
    fn test_missed_question_classification() {
        let exercise = Exercise::new(
            ExerciseId(3),
            ExerciseKind::FillInBlank {
                sentence_part1: "Это машина".into(),
                sentence_part2: String::new(),
                correct_answer: "города".into(),
            },
        )
        .with_rules([RuleId(18)]);
        let missed = MissedQuestion::now(&exercise);
        assert_eq!(missed.concept_type, Some(ConceptType::Grammar));
        assert_eq!(missed.grammar_rule_id, Some(RuleId(18)));
    }

    #[test]
    fn test_well_formed_multiple_choice() {
        let mc = |options: &[&str]| {
            Exercise::new(
                ExerciseId(1),
                ExerciseKind::MultipleChoice {
                    prompt: "дом".into(),
                    options: options.iter().map(|s| s.to_string()).collect(),
                    correct_answer: "house".into(),
                    audio: None,
                },
            )
        };
        assert!(mc(&["house", "cat", "dog", "tea"]).is_well_formed());
        assert!(!mc(&["house", "cat", "cat", "tea"]).is_well_formed());
        assert!(!mc(&["car", "cat", "dog", "tea"]).is_well_formed());
    }
}
