//! Code generation prompts

use std::sync::Arc;

use crate::assertions::{contains, is_valid_json, matches_regex, AssertionError, Judge, JudgePreset};
use crate::models::{PromptSpec, Suite};

pub const NAME: &str = "Code Generation";

pub fn suite(judge: Option<&Arc<Judge>>) -> Result<Suite, AssertionError> {
    Ok(Suite::new(NAME)
        .with_description(
            "Test prompts for various code generation tasks across different programming languages",
        )
        .with_timeout_ms(45_000)
        .with_parallel(true)
        .with_prompt(python_function(judge)?)
        .with_prompt(json_schema(judge)?)
        .with_prompt(sql_query(judge)?)
        .with_prompt(react_component(judge)?))
}

fn python_function(judge: Option<&Arc<Judge>>) -> Result<PromptSpec, AssertionError> {
    let mut prompt = PromptSpec::new(
        "python-function",
        "Python Function Generator",
        "Write a Python function that calculates the factorial of a number. Include proper \
         docstring documentation and handle edge cases.",
    )
    .with_description("Generate a Python function with proper documentation")
    .assert(contains("def", true))
    .assert(contains("factorial", false))
    // docstring
    .assert(contains("\"\"\"", true))
    .assert(contains("return", true))
    .assert(matches_regex(r"def\s+\w+\s*\(")?);

    if let Some(judge) = judge {
        prompt = prompt
            .assert(judge.preset(JudgePreset::CorrectCodeSyntax, Some("Python"))?)
            .assert(judge.preset(JudgePreset::ProperDocumentation, None)?);
    }
    Ok(prompt)
}

fn json_schema(judge: Option<&Arc<Judge>>) -> Result<PromptSpec, AssertionError> {
    let mut prompt = PromptSpec::new(
        "json-schema",
        "JSON Schema Generator",
        "Create a JSON schema for validating user profile data with fields: name (required \
         string), age (optional integer 0-120), email (required email format), and hobbies \
         (optional array of strings).",
    )
    .with_description("Generate a valid JSON schema")
    .assert(is_valid_json())
    .assert(contains("\"type\"", true))
    .assert(contains("\"properties\"", true))
    .assert(contains("\"required\"", true))
    .assert(contains("name", false))
    .assert(contains("email", false));

    if let Some(judge) = judge {
        prompt = prompt.assert(judge.preset(JudgePreset::FollowsInstructions, None)?);
    }
    Ok(prompt)
}

fn sql_query(judge: Option<&Arc<Judge>>) -> Result<PromptSpec, AssertionError> {
    let mut prompt = PromptSpec::new(
        "sql-query",
        "SQL Query Generator",
        "Write a SQL query to find all customers who have made purchases in the last 30 days, \
         including their total purchase amount. Assume tables: customers (id, name, email), \
         orders (id, customer_id, order_date, total_amount).",
    )
    .with_description("Generate a SQL query with proper syntax")
    .assert(contains("SELECT", false))
    .assert(contains("FROM", false))
    .assert(contains("JOIN", false))
    .assert(contains("WHERE", false))
    .assert(contains("customers", false))
    .assert(contains("orders", false))
    .assert(matches_regex(r"(?i)SELECT\s+.*\s+FROM")?);

    if let Some(judge) = judge {
        prompt = prompt.assert(judge.preset(JudgePreset::CorrectCodeSyntax, Some("SQL"))?);
    }
    Ok(prompt)
}

fn react_component(judge: Option<&Arc<Judge>>) -> Result<PromptSpec, AssertionError> {
    let mut prompt = PromptSpec::new(
        "react-component",
        "React Component Generator",
        "Create a React functional component called 'UserCard' that displays user information \
         (name, email, avatar). Use TypeScript and include proper prop types.",
    )
    .with_description("Generate a React functional component")
    .assert(contains("interface", true))
    .assert(contains("UserCard", true))
    .assert(contains("React", true))
    .assert(contains("export", true))
    // arrow function component
    .assert(matches_regex(r"const\s+\w+.*=.*=>")?)
    .assert(contains("name", false))
    .assert(contains("email", false));

    if let Some(judge) = judge {
        prompt = prompt
            .assert(judge.preset(JudgePreset::CodeBestPractices, Some("React"))?)
            .assert(judge.preset(JudgePreset::CompleteAndFunctional, None)?);
    }
    Ok(prompt)
}
