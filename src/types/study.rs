//! AI study artifacts: summaries, quizzes, flashcards, answers

use serde::{Deserialize, Serialize};

/// Response of `POST /documents/:id/summarize/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
}

/// A single multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
}

/// The backend nests the question list one level deep: `{ questions: { questions: [...] } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestions {
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

/// Response of `POST /documents/:id/generate-quiz/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub questions: QuizQuestions,
}

impl Quiz {
    pub fn items(&self) -> &[QuizQuestion] {
        &self.questions.questions
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<QuizQuestion> {
        &mut self.questions.questions
    }
}

/// A two-sided study card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(default)]
    pub id: Option<u64>,
    pub front: String,
    pub back: String,
}

/// Response of `POST /documents/:id/generate-flashcards/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardDeck {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

/// Response of `POST /documents/:id/qna/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub question: Option<String>,
    pub answer: String,
}

/// Response of `POST /documents/:id/retry-extraction/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRetry {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_parses_nested_question_list() {
        let json = r#"{
            "id": 4,
            "document": 9,
            "title": "Cells",
            "questions": { "questions": [
                { "question": "What is ATP?", "options": ["a", "b"], "answer": "a" }
            ] },
            "created_at": "2024-03-01T10:00:00Z"
        }"#;
        let quiz: Quiz = serde_json::from_str(json).unwrap();
        assert_eq!(quiz.items().len(), 1);
        assert_eq!(quiz.items()[0].options, vec!["a", "b"]);
    }

    #[test]
    fn flashcards_tolerate_missing_ids() {
        let json = r#"{ "flashcards": [ { "front": "Q", "back": "A" } ] }"#;
        let deck: FlashcardDeck = serde_json::from_str(json).unwrap();
        assert_eq!(deck.flashcards.len(), 1);
        assert!(deck.flashcards[0].id.is_none());
    }
}
