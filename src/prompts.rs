//! Prompt builders and role instructions for each quiz operation.
//!
//! Question styles are data: `QUESTION_TEMPLATES` is the only place that
//! needs to change to add a variant.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

pub const EXPLANATION_SYSTEM: &str =
    "You are a helpful Python tutor that explains programming concepts clearly and concisely.";

pub const QUESTION_SYSTEM: &str = "You are a helpful assistant that generates Python quiz questions similar to college CS exams. \
Generate ONLY the question itself without providing any answers, solutions, or explanations. The student should solve it themselves. \
For code comprehension questions, provide clear, runnable code. For function-writing questions, specify exact requirements and examples.";

pub const GRADING_SYSTEM: &str = "You are a helpful Python tutor that validates student answers. You MUST respond in this exact format:\n\n\
Line 1: Either 'CORRECT' or 'INCORRECT' (nothing else on this line)\n\
Line 2 onwards: Explanation\n\n\
For multiple-choice questions, accept answers in any format: just the letter (a/A), letter with parenthesis (A)), or the full option text. \
For code questions, be lenient with style differences (spacing, variable names) but strict about logic. \
For code comprehension questions, accept equivalent answers.";

pub const FOLLOW_UP_SYSTEM: &str =
    "You are a helpful assistant that answers follow-up questions about Python programming.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStyle {
    CodeWriting,
    MultipleChoice,
    FillInTheBlank,
    OutputPrediction,
    TrueFalse,
    Conceptual,
    CodeComprehension,
    CodeReasoning,
    FunctionWriting,
    ExecutionTracing,
    InputSpecification,
}

/// One question style and the function that renders its prompt
#[derive(Debug, Clone, Copy)]
pub struct QuestionTemplate {
    pub style: QuestionStyle,
    render: fn(&str) -> String,
}

impl QuestionTemplate {
    pub fn render(&self, topic: &str) -> String {
        (self.render)(topic)
    }
}

pub static QUESTION_TEMPLATES: &[QuestionTemplate] = &[
    QuestionTemplate {
        style: QuestionStyle::CodeWriting,
        render: |topic: &str| {
            format!(
                "Generate a short coding question about Python '{topic}'. Ask the student to write a small code snippet \
                 or complete a function with specific requirements. ONLY provide the question, do NOT include the answer or solution."
            )
        },
    },
    QuestionTemplate {
        style: QuestionStyle::MultipleChoice,
        render: |topic: &str| {
            format!(
                "Create a multiple-choice question about Python '{topic}' that tests understanding of syntax or definitions. \
                 Provide ONLY the question with answer choices (A, B, C, D), do NOT reveal which answer is correct. \
                 At the end, add 'Answer with the letter of your choice (e.g., A, B, C, or D).'"
            )
        },
    },
    QuestionTemplate {
        style: QuestionStyle::FillInTheBlank,
        render: |topic: &str| {
            format!(
                "Write a fill-in-the-blank question about Python '{topic}' focusing on a specific syntax or concept. \
                 ONLY provide the question with blanks, do NOT provide the answer."
            )
        },
    },
    QuestionTemplate {
        style: QuestionStyle::OutputPrediction,
        render: |topic: &str| {
            format!(
                "Generate a 'what will be the output' question about Python '{topic}' with a small code example. \
                 Ask what the output will be, but do NOT provide the actual answer."
            )
        },
    },
    QuestionTemplate {
        style: QuestionStyle::TrueFalse,
        render: |topic: &str| {
            format!(
                "Create a true/false question about Python '{topic}'. State the claim and ask if it's true or false, \
                 but do NOT provide the answer or explanation."
            )
        },
    },
    QuestionTemplate {
        style: QuestionStyle::Conceptual,
        render: |topic: &str| {
            format!(
                "Ask a conceptual question about Python '{topic}' that requires a short answer explaining how something works. \
                 ONLY ask the question, do NOT provide the answer."
            )
        },
    },
    QuestionTemplate {
        style: QuestionStyle::CodeComprehension,
        render: |topic: &str| {
            format!(
                "Provide a Python code snippet about '{topic}' (5-10 lines) and ask the student to analyze what it does \
                 or what value it returns for specific inputs. Do NOT provide the answer. Format: Show the code, then ask \
                 'What does this function return when called with [specific inputs]?'"
            )
        },
    },
    QuestionTemplate {
        style: QuestionStyle::CodeReasoning,
        render: |topic: &str| {
            format!(
                "Show a Python function related to '{topic}' and ask a multiple-choice question about its behavior or a \
                 statement that must be true about its inputs/outputs. Provide choices A, B, C, D. Do NOT reveal the answer."
            )
        },
    },
    QuestionTemplate {
        style: QuestionStyle::FunctionWriting,
        render: |topic: &str| {
            format!(
                "Create a function-writing question about '{topic}'. Specify: function name, parameters, return type, \
                 and specific behavior requirements. Include 1-2 example calls with expected outputs. Ask student to \
                 implement the function. Do NOT provide the solution."
            )
        },
    },
    QuestionTemplate {
        style: QuestionStyle::ExecutionTracing,
        render: execution_tracing_prompt,
    },
    QuestionTemplate {
        style: QuestionStyle::InputSpecification,
        render: |topic: &str| {
            format!(
                "Show a Python function related to '{topic}' and ask: 'Provide specific input values that would make \
                 this function return [True/False/a specific value]'. Do NOT give the answer, just pose the question \
                 with the function code."
            )
        },
    },
];

/// Recursion topics get a call-tracing question; everything else gets a
/// generic step-by-step execution question.
fn execution_tracing_prompt(topic: &str) -> String {
    if topic.to_lowercase().contains("recurs") {
        format!(
            "For the topic '{topic}', if it involves recursion, provide a recursive function and ask about its execution: \
             'How many times is the function called?' or 'What is the order of operations?' or 'What is the base case \
             reached first?'. Make it multiple choice with options A, B, C, D. Do NOT reveal the answer."
        )
    } else {
        format!(
            "Create a step-by-step execution question about '{topic}'. Show code and ask what happens at each step or \
             what the final result is. Multiple choice format with A, B, C, D."
        )
    }
}

/// Pick a template uniformly at random
pub fn choose_question_template<R: Rng + ?Sized>(rng: &mut R) -> &'static QuestionTemplate {
    QUESTION_TEMPLATES
        .choose(rng)
        .unwrap_or(&QUESTION_TEMPLATES[0])
}

pub fn explanation_prompt(topic: &str) -> String {
    format!(
        "Explain what '{topic}' is in Python programming. Describe its purpose, what it does, and why it's important. \
         Keep it concise (2-3 sentences) and beginner-friendly."
    )
}

/// Grading prompt shared by both providers, so the local model is held to
/// the same first-line verdict format as the primary.
pub fn grading_prompt(topic: &str, question: &str, answer: &str) -> String {
    format!(
        "Python topic: {topic}\n\
         Question: {question}\n\n\
         Student's answer: {answer}\n\n\
         Validate if the student's answer is correct. For multiple-choice questions, the student might answer with just \
         a letter (like 'b' or 'B'), so check if their answer matches the correct option by letter. For coding questions, \
         verify the logic is correct even if formatting differs slightly. For analysis questions, check if the reasoning \
         is sound.\n\n\
         Respond in this format:\n\
         Line 1: ONLY 'CORRECT' or 'INCORRECT'\n\
         Line 2 onwards: a brief explanation, including the correct answer with proper code formatting if the student is wrong.\n\n\
         Example:\n\
         INCORRECT\n\
         Correct answer:\n\
         ```python\n\
         def example():\n    return True\n\
         ```\n\
         Explanation: The student's answer is incorrect because..."
    )
}

pub fn follow_up_prompt(topic: &str, question: &str, answer: &str, follow_up: &str) -> String {
    format!(
        "A student is learning about the Python topic '{topic}'.\n\
         They were asked the question: '{question}'.\n\
         They answered: '{answer}'.\n\
         Now, they have a follow-up question: '{follow_up}'.\n\n\
         Please provide a helpful and concise answer to the student's follow-up question."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_every_template_mentions_topic() {
        for template in QUESTION_TEMPLATES {
            let prompt = template.render("list comprehensions");
            assert!(
                prompt.contains("list comprehensions"),
                "{:?} prompt does not embed the topic",
                template.style
            );
        }
    }

    #[test]
    fn test_templates_cover_distinct_styles() {
        let styles: HashSet<_> = QUESTION_TEMPLATES.iter().map(|t| t.style).collect();
        assert_eq!(styles.len(), QUESTION_TEMPLATES.len());
        assert_eq!(QUESTION_TEMPLATES.len(), 11);
    }

    #[test]
    fn test_tracing_template_switches_on_recursion() {
        let recursive = execution_tracing_prompt("Tail Recursion");
        assert!(recursive.contains("How many times is the function called?"));

        let iterative = execution_tracing_prompt("generators");
        assert!(iterative.contains("step-by-step execution question"));
        assert!(!iterative.contains("How many times"));
    }

    #[test]
    fn test_selection_reaches_every_template() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..2_000 {
            seen.insert(choose_question_template(&mut rng).style);
        }
        assert_eq!(seen.len(), QUESTION_TEMPLATES.len());
    }

    #[test]
    fn test_grading_prompt_embeds_inputs_and_verdict_format() {
        let prompt = grading_prompt("recursion", "What is a base case?", "The stopping condition");
        assert!(prompt.contains("Python topic: recursion"));
        assert!(prompt.contains("Question: What is a base case?"));
        assert!(prompt.contains("Student's answer: The stopping condition"));
        assert!(prompt.contains("'CORRECT' or 'INCORRECT'"));
    }

    #[test]
    fn test_follow_up_prompt_embeds_context() {
        let prompt = follow_up_prompt("functions", "Q?", "A.", "Why?");
        assert!(prompt.contains("'functions'"));
        assert!(prompt.contains("They were asked the question: 'Q?'"));
        assert!(prompt.contains("They answered: 'A.'"));
        assert!(prompt.contains("follow-up question: 'Why?'"));
    }
}
