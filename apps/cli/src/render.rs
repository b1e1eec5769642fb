use std::fmt::Write as _;

use parla_domain::Accent;
use parla_tutor::{
    ActiveExercise, CardSide, Exercise, ExerciseAction, ExerciseEvent, ExerciseKind, ResultView,
    SessionSummary,
};

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(ExerciseAction),
    /// Typed answer: replace the input, then submit it.
    Answer(String),
    /// Mark the current flashcard as known.
    Done,
    Help,
    Quit,
}

pub fn parse_command(line: &str, kind: ExerciseKind) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let command = match line {
        ":q" | ":quit" => Command::Quit,
        ":h" | ":help" => Command::Help,
        ":n" | ":next" => Command::Action(ExerciseAction::Next),
        ":p" | ":prev" => Command::Action(ExerciseAction::Previous),
        ":r" | ":reveal" => Command::Action(ExerciseAction::Reveal),
        ":reset" => Command::Action(ExerciseAction::Reset),
        ":f" | ":flip" => Command::Action(ExerciseAction::Flip),
        ":a" | ":again" => Command::Action(ExerciseAction::Replay),
        ":done" => Command::Done,
        _ => return parse_answer(line, kind),
    };
    Some(command)
}

fn parse_answer(line: &str, kind: ExerciseKind) -> Option<Command> {
    match kind {
        ExerciseKind::Typing => Some(Command::Answer(line.to_string())),
        ExerciseKind::MultipleChoice | ExerciseKind::Listening => {
            let number: usize = line.parse().ok()?;
            number
                .checked_sub(1)
                .map(|index| Command::Action(ExerciseAction::Select(index)))
        }
        ExerciseKind::Unscramble => {
            let (unpick, digits) = match line.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            let index = digits.parse::<usize>().ok()?.checked_sub(1)?;
            Some(Command::Action(if unpick {
                ExerciseAction::Unpick(index)
            } else {
                ExerciseAction::Pick(index)
            }))
        }
        ExerciseKind::Flashcard => None,
    }
}

pub fn help(kind: ExerciseKind) -> &'static str {
    match kind {
        ExerciseKind::Flashcard => ":f flip, :n next, :p previous, :done mark known, :q quit",
        ExerciseKind::MultipleChoice => "type an option number, :n next, :p previous, :q quit",
        ExerciseKind::Listening => {
            "type an option number, :a play again, :n next, :p previous, :q quit"
        }
        ExerciseKind::Typing => "type the word, :r reveal, :n next, :p previous, :q quit",
        ExerciseKind::Unscramble => {
            "N picks letter N, -N returns assembled letter N, :reset, :r reveal, :n next, :q quit"
        }
    }
}

/// Renders the current screen of the active exercise.
pub fn render_exercise(exercise: &ActiveExercise) -> String {
    let mut out = String::new();
    let inner = exercise.as_exercise();
    let Some(item) = inner.current_item() else {
        return "(nothing to show)".to_string();
    };
    let _ = writeln!(
        out,
        "[{}/{}] score {}",
        inner.position() + 1,
        inner.len(),
        inner.score()
    );
    match exercise {
        ActiveExercise::Flashcard(cards) => match cards.side() {
            CardSide::Front => {
                let _ = write!(out, "  {}", item.term);
                if let Some(ipa) = &item.ipa {
                    let _ = write!(out, "  /{ipa}/");
                }
            }
            CardSide::Back => {
                let _ = write!(out, "  {}", item.meaning);
                for example in &item.examples {
                    let _ = write!(out, "\n    e.g. {}", example.sentence);
                }
            }
        },
        ActiveExercise::Choice(choice) => {
            let _ = writeln!(out, "  {}", choice.mode().prompt(item));
            if let Some(unit) = choice.unit() {
                for (i, option) in unit.options.iter().enumerate() {
                    let marker = match (unit.answered_index(), unit.correct_index()) {
                        (Some(_), Some(right)) if right == i => " ✓",
                        (Some(picked), _) if picked == i => " ✗",
                        _ => "",
                    };
                    let _ = writeln!(out, "  {}. {}{marker}", i + 1, choice.mode().option_label(option));
                }
            }
        }
        ActiveExercise::Typing(typing) => {
            let _ = write!(out, "  {} ({} letters)", item.meaning, item.term.chars().count());
            if let Some(unit) = typing.unit() {
                if unit.is_revealed() {
                    let _ = write!(out, "\n  answer: {}", item.term);
                }
            }
        }
        ActiveExercise::Unscramble(unscramble) => {
            let _ = writeln!(out, "  {}", item.meaning);
            if let Some(unit) = unscramble.unit() {
                let pool: Vec<String> = unit
                    .pool()
                    .iter()
                    .enumerate()
                    .map(|(i, letter)| format!("{}:{letter}", i + 1))
                    .collect();
                let _ = writeln!(out, "  letters: {}", pool.join(" "));
                let _ = write!(out, "  built:   {}", unit.assembled_text());
            }
        }
    }
    out.trim_end().to_string()
}

/// One line per event worth telling the user about.
pub fn describe_event(event: &ExerciseEvent, accent: Accent) -> Option<String> {
    match event {
        ExerciseEvent::Answered { correct: true, .. } => Some("correct!".to_string()),
        ExerciseEvent::Answered { correct: false, .. } => Some("not quite.".to_string()),
        ExerciseEvent::Rejected {
            near_miss: true, ..
        } => Some("close, check the spelling and try again".to_string()),
        ExerciseEvent::Rejected { .. } => Some("wrong, try again".to_string()),
        ExerciseEvent::PlayAudio { url: Some(url), .. } => Some(format!("♪ {url} ({accent:?})")),
        ExerciseEvent::PlayAudio { url: None, .. } => Some("♪ (no recording)".to_string()),
        ExerciseEvent::Finished => Some("all items done.".to_string()),
        ExerciseEvent::Presented { .. } => None,
    }
}

pub fn render_summary(summary: &SessionSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} session summary", summary.kind);
    let _ = writeln!(
        out,
        "  answered {} ({} correct, {:.0}% accuracy), {} retries",
        summary.answered,
        summary.correct,
        summary.accuracy * 100.0,
        summary.rejected
    );
    let _ = writeln!(out, "  best streak {}", summary.best_streak);
    let _ = write!(out, "  completion {}%", summary.completion_percentage);
    if summary.pronunciation_attempts > 0 {
        let _ = write!(
            out,
            "\n  pronunciation: {} attempts, mean {}",
            summary.pronunciation_attempts,
            parla_tutor::format_score(summary.mean_pronunciation)
        );
    }
    out
}

pub fn render_result(view: &ResultView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.word);
    for line in &view.scores {
        let tier = line.tier.map(|tier| format!(" ({tier})")).unwrap_or_default();
        let _ = writeln!(out, "  {:<12} {}{tier}", line.label, line.display);
    }
    for syllable in &view.syllables {
        let label = syllable.grapheme.as_deref().unwrap_or(&syllable.ipa);
        let _ = writeln!(out, "  [{label}] {}", syllable.display);
        for phoneme in &syllable.phonemes {
            let tier = phoneme
                .tier
                .map(|tier| tier.to_string())
                .unwrap_or_else(|| "?".to_string());
            let _ = write!(out, "    /{}/ {} {tier}", phoneme.target, phoneme.display);
            if phoneme.produced != phoneme.target {
                let _ = write!(out, " heard /{}/", phoneme.produced);
            }
            if phoneme.mismatch {
                let _ = write!(out, " [service tag disagrees]");
            }
            if !phoneme.feedback.is_empty() {
                let _ = write!(out, " - {}", phoneme.feedback);
            }
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parla_domain::{
        Phoneme, PhonemeResult, PronunciationResult, PronunciationScores, Syllable, VocabularyItem,
    };
    use parla_tutor::{ChoiceExercise, ChoiceMode, PracticeConfig, ResultInterpreter, TierThresholds};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn choice_numbers_are_one_based() {
        assert_eq!(
            parse_command("2", ExerciseKind::MultipleChoice),
            Some(Command::Action(ExerciseAction::Select(1)))
        );
        assert_eq!(parse_command("0", ExerciseKind::Listening), None);
        assert_eq!(parse_command("two", ExerciseKind::MultipleChoice), None);
    }

    #[test]
    fn unscramble_distinguishes_pick_and_unpick() {
        assert_eq!(
            parse_command("3", ExerciseKind::Unscramble),
            Some(Command::Action(ExerciseAction::Pick(2)))
        );
        assert_eq!(
            parse_command("-1", ExerciseKind::Unscramble),
            Some(Command::Action(ExerciseAction::Unpick(0)))
        );
    }

    #[test]
    fn typing_treats_text_as_an_answer() {
        assert_eq!(
            parse_command("  Apple ", ExerciseKind::Typing),
            Some(Command::Answer("Apple".into()))
        );
        assert_eq!(
            parse_command(":r", ExerciseKind::Typing),
            Some(Command::Action(ExerciseAction::Reveal))
        );
        assert_eq!(parse_command("   ", ExerciseKind::Typing), None);
    }

    #[test]
    fn listening_screen_hides_the_written_term() {
        let items = [
            ("w1", "apple", "a red fruit"),
            ("w2", "river", "flowing water"),
            ("w3", "chair", "a seat"),
        ]
        .into_iter()
        .map(|(id, term, meaning)| Arc::new(VocabularyItem::new(id, term, meaning)))
        .collect();
        let exercise = ActiveExercise::Choice(ChoiceExercise::new(
            ChoiceMode::Listening,
            items,
            &PracticeConfig::default(),
            StdRng::seed_from_u64(3),
        ));
        let term = exercise.as_exercise().current_item().unwrap().term.clone();
        let screen = render_exercise(&exercise);
        assert!(screen.contains("Listen and choose the meaning"));
        assert!(!screen.contains(&term), "{screen}");
        assert_eq!(
            parse_command(":a", ExerciseKind::Listening),
            Some(Command::Action(ExerciseAction::Replay))
        );
    }

    #[test]
    fn result_rendering_marks_missing_scores_and_mismatches() {
        let result = PronunciationResult {
            scores: PronunciationScores {
                overall: None,
                accuracy: Some(72.0),
                fluency: Some(90.0),
                completeness: Some(100.0),
            },
            syllables: vec![Syllable {
                ipa: "wɔː".into(),
                grapheme: Some("wa".into()),
                accuracy: Some(72.0),
                phonemes: vec![Phoneme {
                    target: "ɔː".into(),
                    alt_ph: Some("ɑ".into()),
                    accuracy: Some(50.0),
                    result: PhonemeResult::Perfect,
                    feedback: String::new(),
                }],
            }],
        };
        let view = ResultInterpreter::new(TierThresholds::default()).interpret("water", &result);
        let text = render_result(&view);
        assert!(text.contains("overall      N/A"));
        assert!(text.contains("fluency      90 (good)"));
        assert!(text.contains("heard /ɑ/"));
        assert!(text.contains("[service tag disagrees]"));
    }
}
