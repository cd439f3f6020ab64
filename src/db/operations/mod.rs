pub mod boards;
pub mod content;
pub mod expressions;
pub mod grammar;
pub mod lessons;
pub mod vocabulary;

pub use boards::{Board, BoardFilter, BoardPatch, BoardType, NewBoard};
pub use content::ContentKind;
pub use expressions::{Expression, ExpressionFilter, ExpressionPatch, NewExpression};
pub use grammar::{Grammar, GrammarFilter, GrammarPatch, NewGrammar};
pub use lessons::{Lesson, LessonPatch, NewLesson};
pub use vocabulary::{NewVocabulary, Vocabulary, VocabularyFilter, VocabularyMeaning, VocabularyPatch};
