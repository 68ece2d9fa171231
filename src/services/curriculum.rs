use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::services::pronunciation::{score_pronunciation, PronunciationScore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    Word,
    Sentence,
    Paragraph,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    pub hindi: &'static str,
    pub english: &'static str,
    /// Romanized form a transcript is graded against.
    pub pronunciation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningLevel {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub challenges: Vec<Challenge>,
    pub is_unlocked: bool,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    MultipleChoice,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub correct_answer: &'static str,
    pub hint: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonExample {
    pub hindi: &'static str,
    pub transliteration: &'static str,
    pub english: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonContent {
    pub introduction: &'static str,
    pub examples: &'static [LessonExample],
    pub exercises: &'static [Exercise],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub level: u32,
    pub xp_reward: u32,
    #[serde(skip)]
    pub content: LessonContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurriculumError {
    #[error("learning level {0} does not exist")]
    UnknownLevel(u32),
    #[error("challenge {index} is out of range for level {level_id}")]
    ChallengeOutOfRange { level_id: u32, index: usize },
    #[error("learning level {0} is locked, complete the previous level first")]
    LevelLocked(u32),
    #[error("lesson {0} does not exist")]
    UnknownLesson(String),
    #[error("exercise {exercise_id} does not exist in lesson {lesson_id}")]
    UnknownExercise {
        lesson_id: String,
        exercise_id: String,
    },
    #[error("lesson {0} is locked, complete the previous lesson first")]
    LessonLocked(String),
}

const fn challenge(
    id: u32,
    kind: ChallengeKind,
    hindi: &'static str,
    english: &'static str,
    pronunciation: &'static str,
) -> Challenge {
    Challenge {
        id,
        kind,
        hindi,
        english,
        pronunciation,
    }
}

pub fn learning_levels() -> Vec<LearningLevel> {
    use ChallengeKind::*;

    vec![
        LearningLevel {
            id: 1,
            name: "Basic Words",
            description: "Learn essential Hindi words",
            is_unlocked: true,
            is_completed: false,
            challenges: vec![
                challenge(1, Word, "नमस्ते", "Hello", "Namaste"),
                challenge(2, Word, "धन्यवाद", "Thank you", "Dhanyavaad"),
                challenge(3, Word, "हाँ", "Yes", "Haan"),
                challenge(4, Word, "नहीं", "No", "Nahi"),
                challenge(5, Word, "माफ़ कीजिए", "Sorry", "Maaf kijiye"),
            ],
        },
        LearningLevel {
            id: 2,
            name: "Simple Sentences",
            description: "Practice basic Hindi sentences",
            is_unlocked: false,
            is_completed: false,
            challenges: vec![
                challenge(1, Sentence, "आप कैसे हैं?", "How are you?", "Aap kaise hain?"),
                challenge(
                    2,
                    Sentence,
                    "मेरा नाम राहुल है।",
                    "My name is Rahul.",
                    "Mera naam Rahul hai.",
                ),
                challenge(
                    3,
                    Sentence,
                    "मुझे हिंदी सीखना है।",
                    "I want to learn Hindi.",
                    "Mujhe Hindi seekhna hai.",
                ),
            ],
        },
        LearningLevel {
            id: 3,
            name: "Paragraphs",
            description: "Master longer Hindi passages",
            is_unlocked: false,
            is_completed: false,
            challenges: vec![challenge(
                1,
                Paragraph,
                concat!(
                    "नमस्ते! मेरा नाम अमित है। मैं भारत से हूँ। ",
                    "मुझे हिंदी बोलना पसंद है। मैं एक छात्र हूँ और मैं विज्ञान पढ़ता हूँ।",
                ),
                concat!(
                    "Hello! My name is Amit. I am from India. I like speaking Hindi. ",
                    "I am a student and I study science.",
                ),
                concat!(
                    "Namaste! Mera naam Amit hai. Main Bharat se hoon. ",
                    "Mujhe Hindi bolna pasand hai. ",
                    "Main ek chhatra hoon aur main vigyan padhta hoon.",
                ),
            )],
        },
    ]
}

const fn example(
    hindi: &'static str,
    transliteration: &'static str,
    english: &'static str,
) -> LessonExample {
    LessonExample {
        hindi,
        transliteration,
        english,
    }
}

const fn multiple_choice(
    id: &'static str,
    question: &'static str,
    options: &'static [&'static str],
    correct_answer: &'static str,
    hint: &'static str,
) -> Exercise {
    Exercise {
        id,
        kind: ExerciseKind::MultipleChoice,
        question,
        options,
        correct_answer,
        hint,
    }
}

pub const LESSON_CATALOG: &[Lesson] = &[
    Lesson {
        id: "vowels-1",
        title: "Hindi Vowels - Part 1",
        description: "Learn the first set of Hindi vowels",
        level: 1,
        xp_reward: 10,
        content: LessonContent {
            introduction: "Hindi has 11 vowels. Each vowel has two forms: an independent form \
                and a dependent form. Let's start with the first 5 vowels.",
            examples: &[
                example("अ", "a", "Short \"a\" as in \"America\""),
                example("आ", "aa", "Long \"a\" as in \"father\""),
                example("इ", "i", "Short \"i\" as in \"it\""),
                example("ई", "ee", "Long \"i\" as in \"machine\""),
                example("उ", "u", "Short \"u\" as in \"put\""),
            ],
            exercises: &[
                multiple_choice(
                    "vowels-1-ex1",
                    "Which of these is the Hindi vowel \"aa\"?",
                    &["अ", "आ", "इ", "ई"],
                    "आ",
                    "It looks like अ but with an extra vertical line",
                ),
                multiple_choice(
                    "vowels-1-ex2",
                    "What is the English equivalent sound for \"इ\"?",
                    &[
                        "Long \"a\" as in \"father\"",
                        "Short \"a\" as in \"America\"",
                        "Short \"i\" as in \"it\"",
                        "Long \"i\" as in \"machine\"",
                    ],
                    "Short \"i\" as in \"it\"",
                    "It's similar to the \"i\" in \"it\" or \"bit\"",
                ),
            ],
        },
    },
    Lesson {
        id: "vowels-2",
        title: "Hindi Vowels - Part 2",
        description: "Learn the second set of Hindi vowels",
        level: 1,
        xp_reward: 10,
        content: LessonContent {
            introduction: "Now let's continue with the remaining Hindi vowels.",
            examples: &[
                example("ऊ", "oo", "Long \"u\" as in \"boot\""),
                example("ए", "e", "Long \"a\" as in \"cake\""),
                example("ऐ", "ai", "\"ai\" as in \"bat\""),
                example("ओ", "o", "Long \"o\" as in \"boat\""),
                example("औ", "au", "\"au\" as in \"caught\""),
            ],
            exercises: &[
                multiple_choice(
                    "vowels-2-ex1",
                    "Which of these is the Hindi vowel \"e\"?",
                    &["ऊ", "ए", "ऐ", "ओ"],
                    "ए",
                    "This vowel looks like a curved line with a small diagonal line at the top",
                ),
                multiple_choice(
                    "vowels-2-ex2",
                    "What is the English equivalent sound for \"औ\"?",
                    &[
                        "Long \"o\" as in \"boat\"",
                        "\"au\" as in \"caught\"",
                        "\"ai\" as in \"bat\"",
                        "Long \"u\" as in \"boot\"",
                    ],
                    "\"au\" as in \"caught\"",
                    "It sounds similar to \"ow\" sound in \"how\" or \"cow\"",
                ),
            ],
        },
    },
    Lesson {
        id: "consonants-1",
        title: "Hindi Consonants - Part 1",
        description: "Learn the first set of Hindi consonants",
        level: 1,
        xp_reward: 15,
        content: LessonContent {
            introduction: "Hindi has 33 consonants. Let's start with the first 5 consonants, \
                which are called \"ka-varga\" (क-वर्ग).",
            examples: &[
                example("क", "ka", "k as in \"kite\""),
                example("ख", "kha", "kh as in \"khaki\""),
                example("ग", "ga", "g as in \"go\""),
                example("घ", "gha", "gh as in \"ghost\""),
                example("ङ", "nga", "ng as in \"sing\""),
            ],
            exercises: &[
                multiple_choice(
                    "consonants-1-ex1",
                    "Which of these is the Hindi consonant \"ga\"?",
                    &["क", "ख", "ग", "घ"],
                    "ग",
                    "This consonant looks like a backward \"3\" with a vertical line",
                ),
                multiple_choice(
                    "consonants-1-ex2",
                    "What is the English equivalent sound for \"क\"?",
                    &[
                        "k as in \"kite\"",
                        "g as in \"go\"",
                        "kh as in \"khaki\"",
                        "ng as in \"sing\"",
                    ],
                    "k as in \"kite\"",
                    "It's the basic \"k\" sound like in \"keep\" or \"key\"",
                ),
            ],
        },
    },
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStatus {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub completed: bool,
    pub locked: bool,
    pub active: bool,
}

/// A lesson together with the material needed to study it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDetail {
    #[serde(flatten)]
    pub status: LessonStatus,
    pub content: LessonContent,
}

fn status_at(catalog: &[Lesson], index: usize, completed: &BTreeSet<String>) -> LessonStatus {
    let lesson = &catalog[index];
    let is_completed = completed.contains(lesson.id);
    let locked = index > 0 && !completed.contains(catalog[index - 1].id);
    LessonStatus {
        lesson: lesson.clone(),
        completed: is_completed,
        locked,
        active: !is_completed && !locked,
    }
}

/// A lesson is locked until the one before it in catalog order is completed.
pub fn lesson_statuses(catalog: &[Lesson], completed: &BTreeSet<String>) -> Vec<LessonStatus> {
    (0..catalog.len())
        .map(|index| status_at(catalog, index, completed))
        .collect()
}

pub fn lesson_detail(
    catalog: &[Lesson],
    lesson_id: &str,
    completed: &BTreeSet<String>,
) -> Result<LessonDetail, CurriculumError> {
    let index = catalog
        .iter()
        .position(|lesson| lesson.id == lesson_id)
        .ok_or_else(|| CurriculumError::UnknownLesson(lesson_id.to_string()))?;

    let status = status_at(catalog, index, completed);
    Ok(LessonDetail {
        content: status.lesson.content.clone(),
        status,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub exercise_id: &'static str,
    pub correct: bool,
    pub correct_answer: &'static str,
    pub feedback: String,
}

/// Checks a chosen option against an exercise of an unlocked lesson.
///
/// The comparison is exact: options are served verbatim and the client sends
/// one back.
pub fn check_answer(
    detail: &LessonDetail,
    exercise_id: &str,
    answer: &str,
) -> Result<AnswerResult, CurriculumError> {
    let lesson_id = detail.status.lesson.id;
    if detail.status.locked {
        return Err(CurriculumError::LessonLocked(lesson_id.to_string()));
    }

    let exercise = detail
        .content
        .exercises
        .iter()
        .find(|exercise| exercise.id == exercise_id)
        .ok_or_else(|| CurriculumError::UnknownExercise {
            lesson_id: lesson_id.to_string(),
            exercise_id: exercise_id.to_string(),
        })?;

    let correct = answer == exercise.correct_answer;
    let feedback = if correct {
        "Correct! Well done!".to_string()
    } else {
        format!("Incorrect. The correct answer is \"{}\"", exercise.correct_answer)
    };

    Ok(AnswerResult {
        exercise_id: exercise.id,
        correct,
        correct_answer: exercise.correct_answer,
        feedback,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttemptOutcome {
    Retry,
    #[serde(rename_all = "camelCase")]
    Advance { next_index: usize },
    LevelCompleted,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    #[serde(flatten)]
    pub score: PronunciationScore,
    pub outcome: AttemptOutcome,
    pub feedback: String,
}

/// Grades one spoken attempt at `level.challenges[index]`.
pub fn evaluate_attempt(
    level: &LearningLevel,
    index: usize,
    transcript: &str,
) -> Result<AttemptResult, CurriculumError> {
    let challenge = level
        .challenges
        .get(index)
        .ok_or(CurriculumError::ChallengeOutOfRange {
            level_id: level.id,
            index,
        })?;

    let score = score_pronunciation(transcript, challenge.pronunciation);

    let (outcome, feedback) = if !score.accepted {
        (
            AttemptOutcome::Retry,
            format!(
                "Good try! The correct pronunciation is \"{}\". Let's try again.",
                challenge.pronunciation
            ),
        )
    } else if index + 1 < level.challenges.len() {
        (
            AttemptOutcome::Advance {
                next_index: index + 1,
            },
            format!(
                "Great job! Your pronunciation was good. \"{}\" means \"{}\".",
                challenge.hindi, challenge.english
            ),
        )
    } else {
        (
            AttemptOutcome::LevelCompleted,
            format!(
                "Congratulations! You've completed the \"{}\" level!",
                level.name
            ),
        )
    };

    Ok(AttemptResult {
        score,
        outcome,
        feedback,
    })
}

/// Unlock/completion state over the ordered level list.
#[derive(Debug, Clone)]
pub struct LevelBoard {
    levels: Vec<LearningLevel>,
}

impl Default for LevelBoard {
    fn default() -> Self {
        Self::new(learning_levels())
    }
}

impl LevelBoard {
    pub fn new(levels: Vec<LearningLevel>) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &[LearningLevel] {
        &self.levels
    }

    pub fn level(&self, id: u32) -> Result<&LearningLevel, CurriculumError> {
        self.levels
            .iter()
            .find(|level| level.id == id)
            .ok_or(CurriculumError::UnknownLevel(id))
    }

    /// The level to play, refused while it is still locked.
    pub fn start(&self, id: u32) -> Result<&LearningLevel, CurriculumError> {
        let level = self.level(id)?;
        if !level.is_unlocked {
            return Err(CurriculumError::LevelLocked(id));
        }
        Ok(level)
    }

    /// Marks `id` completed and unlocks the level that follows it.
    pub fn complete_level(&mut self, id: u32) -> Result<(), CurriculumError> {
        let position = self
            .levels
            .iter()
            .position(|level| level.id == id)
            .ok_or(CurriculumError::UnknownLevel(id))?;

        if !self.levels[position].is_unlocked {
            return Err(CurriculumError::LevelLocked(id));
        }

        self.levels[position].is_completed = true;
        if let Some(next) = self.levels.get_mut(position + 1) {
            next.is_unlocked = true;
        }
        Ok(())
    }

    /// Replays completions, so a board can be rebuilt from a list of level ids.
    pub fn with_completed(completed: impl IntoIterator<Item = u32>) -> Self {
        let mut board = Self::default();
        let mut pending: Vec<u32> = completed.into_iter().collect();
        pending.sort_unstable();
        for id in pending {
            if let Err(err) = board.complete_level(id) {
                tracing::debug!(level_id = id, error = %err, "skipping completion replay");
            }
        }
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_first_level_unlocked() {
        let levels = learning_levels();
        assert!(levels[0].is_unlocked);
        assert!(levels[1..].iter().all(|level| !level.is_unlocked));
    }

    #[test]
    fn test_lesson_locking_follows_catalog_order() {
        let completed: BTreeSet<String> = ["vowels-1".to_string()].into_iter().collect();
        let statuses = lesson_statuses(LESSON_CATALOG, &completed);

        assert!(statuses[0].completed && !statuses[0].active);
        assert!(!statuses[1].locked && statuses[1].active);
        assert!(statuses[2].locked && !statuses[2].active);
    }

    #[test]
    fn test_first_lesson_never_locked() {
        let statuses = lesson_statuses(LESSON_CATALOG, &BTreeSet::new());
        assert!(!statuses[0].locked);
        assert!(statuses[0].active);
    }

    #[test]
    fn test_accepted_attempt_advances() {
        let board = LevelBoard::default();
        let level = board.start(1).unwrap();
        let result = evaluate_attempt(level, 0, "namaste").unwrap();

        assert!(result.score.accepted);
        assert_eq!(result.outcome, AttemptOutcome::Advance { next_index: 1 });
        assert!(result.feedback.starts_with("Great job!"));
    }

    #[test]
    fn test_rejected_attempt_retries() {
        let board = LevelBoard::default();
        let level = board.level(1).unwrap();
        let result = evaluate_attempt(level, 1, "shukriya").unwrap();

        assert_eq!(result.outcome, AttemptOutcome::Retry);
        assert!(result.feedback.contains("Dhanyavaad"));
    }

    #[test]
    fn test_last_challenge_completes_level() {
        let board = LevelBoard::default();
        let level = board.level(2).unwrap();
        let result = evaluate_attempt(level, 2, "mujhe hindi seekhna hai").unwrap();

        assert_eq!(result.outcome, AttemptOutcome::LevelCompleted);
    }

    #[test]
    fn test_out_of_range_challenge() {
        let board = LevelBoard::default();
        let level = board.level(3).unwrap();
        let err = evaluate_attempt(level, 1, "namaste").unwrap_err();
        assert_eq!(
            err,
            CurriculumError::ChallengeOutOfRange {
                level_id: 3,
                index: 1
            }
        );
    }

    #[test]
    fn test_locked_level_refused() {
        let board = LevelBoard::default();
        assert_eq!(board.start(2).unwrap_err(), CurriculumError::LevelLocked(2));
        assert_eq!(board.level(9).unwrap_err(), CurriculumError::UnknownLevel(9));
    }

    #[test]
    fn test_completion_unlocks_next_level() {
        let mut board = LevelBoard::default();
        board.complete_level(1).unwrap();

        assert!(board.level(1).unwrap().is_completed);
        assert!(board.start(2).is_ok());
        assert!(board.start(3).is_err());
    }

    #[test]
    fn test_with_completed_replays_in_order() {
        let board = LevelBoard::with_completed([2, 1]);
        assert!(board.level(2).unwrap().is_completed);
        assert!(board.level(3).unwrap().is_unlocked);
    }

    #[test]
    fn test_completing_last_level() {
        let mut board = LevelBoard::with_completed([1, 2]);
        board.complete_level(3).unwrap();
        assert!(board.levels().iter().all(|level| level.is_completed));
    }

    #[test]
    fn test_every_exercise_answer_is_an_option() {
        for lesson in LESSON_CATALOG {
            for exercise in lesson.content.exercises {
                assert!(exercise.options.contains(&exercise.correct_answer), "{}", exercise.id);
            }
        }
    }

    #[test]
    fn test_lesson_detail_carries_status() {
        let detail = lesson_detail(LESSON_CATALOG, "vowels-2", &BTreeSet::new()).unwrap();
        assert!(detail.status.locked);
        assert_eq!(detail.content.exercises.len(), 2);

        let err = lesson_detail(LESSON_CATALOG, "grammar-1", &BTreeSet::new()).unwrap_err();
        assert_eq!(err, CurriculumError::UnknownLesson("grammar-1".to_string()));
    }

    #[test]
    fn test_check_answer_grades_exactly() {
        let completed: BTreeSet<String> =
            ["vowels-1", "vowels-2"].into_iter().map(String::from).collect();
        let detail = lesson_detail(LESSON_CATALOG, "consonants-1", &completed).unwrap();
        assert!(!detail.status.locked);

        let right = check_answer(&detail, "consonants-1-ex2", "k as in \"kite\"").unwrap();
        assert!(right.correct);
        assert_eq!(right.feedback, "Correct! Well done!");

        let wrong = check_answer(&detail, "consonants-1-ex1", "क").unwrap();
        assert!(!wrong.correct);
        assert_eq!(wrong.feedback, "Incorrect. The correct answer is \"ग\"");
    }

    #[test]
    fn test_check_answer_refuses_locked_and_unknown() {
        let locked = lesson_detail(LESSON_CATALOG, "vowels-2", &BTreeSet::new()).unwrap();
        assert_eq!(
            check_answer(&locked, "vowels-2-ex1", "ए").unwrap_err(),
            CurriculumError::LessonLocked("vowels-2".to_string())
        );

        let open = lesson_detail(LESSON_CATALOG, "vowels-1", &BTreeSet::new()).unwrap();
        assert!(matches!(
            check_answer(&open, "vowels-1-ex3", "अ").unwrap_err(),
            CurriculumError::UnknownExercise { .. }
        ));
    }
}
