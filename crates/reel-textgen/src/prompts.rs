//! Prompt templates for the two generation steps.

/// Build the summarization prompt from ordered user answers.
pub fn summarization_prompt(answers: &[String]) -> String {
    let formatted = answers
        .iter()
        .enumerate()
        .map(|(i, answer)| format!("Q{}: {}", i + 1, answer))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Transform these user answers into a short, inspiring story:

{formatted}

Create a narrative that:
- Connects all answers into a cohesive story
- Is emotional and uplifting
- Uses vivid, visual language
- Is 150-200 words
- Ends with hope or motivation

Focus on storytelling and creating an engaging narrative suitable for video production."#
    )
}

/// Build the video production prompt from a confirmed summary.
pub fn video_prompt(summary: &str) -> String {
    format!(
        r#"You are a video concept artist who turns a short heartfelt story into a picture-book-style animation brief. Extract the core emotions, symbolic imagery, and key events from the story below and write a video production prompt in a warm, dreamlike, illustrative style.

Visual directives:
- Soft watercolor or pastel fairy-tale aesthetic
- Express emotion through color, light, and abstract shapes
- Output a single cohesive paragraph, specific and lyrical, ready for a video generation model

Story:
{summary}"#
    )
}
