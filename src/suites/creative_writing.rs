//! Creative writing prompts

use std::sync::Arc;

use crate::assertions::{contains, length_between, word_count, AssertionError, Judge, JudgePreset};
use crate::models::{Message, PromptSpec, Suite};

pub const NAME: &str = "Creative Writing";

pub fn suite(judge: Option<&Arc<Judge>>) -> Result<Suite, AssertionError> {
    Ok(Suite::new(NAME)
        .with_description(
            "Test prompts for creative writing tasks including story generation, dialogue, and poetry",
        )
        .with_timeout_ms(30_000)
        .with_parallel(true)
        .with_prompt(story_opening(judge)?)
        .with_prompt(character_dialogue(judge)?)
        .with_prompt(poem_haiku(judge)?))
}

fn story_opening(judge: Option<&Arc<Judge>>) -> Result<PromptSpec, AssertionError> {
    let mut prompt = PromptSpec::new(
        "story-opening",
        "Story Opening Generator",
        "Write an engaging opening paragraph for a mystery story set in a small coastal town. \
         Include a sense of foreboding and introduce a main character.",
    )
    .with_description("Generate an engaging opening paragraph for a mystery story")
    .assert(length_between(200, 800))
    .assert(word_count(30, Some(150)))
    .assert(contains("mystery", false))
    .assert(contains("town", false));

    if let Some(judge) = judge {
        prompt = prompt
            .assert(judge.preset(JudgePreset::CreativeAndOriginal, None)?)
            .assert(judge.preset(JudgePreset::FollowsInstructions, None)?);
    }
    Ok(prompt)
}

fn character_dialogue(judge: Option<&Arc<Judge>>) -> Result<PromptSpec, AssertionError> {
    let mut prompt = PromptSpec::new(
        "character-dialogue",
        "Character Dialogue",
        "Write a dialogue between a detective and a suspicious shopkeeper. The detective is \
         investigating a recent theft, and the shopkeeper is nervous but trying to appear helpful.",
    )
    .with_description("Generate realistic dialogue between two characters")
    .with_message(Message::system(
        "You are a creative writing assistant. Focus on creating realistic, character-driven \
         dialogue that reveals personality and advances the plot.",
    ))
    .assert(contains("detective", false))
    .assert(contains("shopkeeper", false))
    // speech marks
    .assert(contains("\"", true))
    .assert(word_count(50, Some(200)));

    if let Some(judge) = judge {
        prompt = prompt
            .assert(judge.preset(JudgePreset::WritingQuality, None)?)
            .assert(judge.ask(
                "Does the dialogue give the detective and the shopkeeper distinct voices, \
                 with the shopkeeper coming across as nervous but helpful?",
            ));
    }
    Ok(prompt)
}

fn poem_haiku(judge: Option<&Arc<Judge>>) -> Result<PromptSpec, AssertionError> {
    let mut prompt = PromptSpec::new(
        "poem-haiku",
        "Haiku Generator",
        "Write a haiku about autumn leaves falling. Follow the traditional 5-7-5 syllable structure.",
    )
    .with_description("Generate a haiku about nature")
    .assert(contains("autumn", false))
    .assert(contains("leaves", false))
    .assert(word_count(8, Some(15)))
    .assert(length_between(30, 100));

    if let Some(judge) = judge {
        prompt = prompt.assert(judge.ask(
            "Is the response a haiku of three lines following a 5-7-5 syllable structure?",
        ));
    }
    Ok(prompt)
}
