//! Prompt templates
//!
//! All prompts frame answers from the organisation's perspective; the
//! organisation description itself comes from configuration, not code.

/// System prompt for knowledge-base answers
pub const ANSWER_SYSTEM_PROMPT: &str = "\
You are the organisation's AI assistant for its knowledge base.

Rules:
1. Answer based on the provided context and conversation history
2. Frame responses from the organisation's perspective
3. Be consistent with previous answers in this conversation
4. Be professional, knowledgeable, and solution-oriented
5. Cite sources when possible
6. If the context does not contain the answer, say so rather than inventing one";

/// System prompt for project generation
pub const PROJECT_SYSTEM_PROMPT: &str =
    "You are a conservation project designer. Output only valid JSON.";

/// Build the user prompt for a knowledge-base answer
pub fn answer_prompt(
    org_context: &str,
    context: &str,
    question: &str,
    conversation_history: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("=== ORGANISATION CONTEXT ===\n");
    prompt.push_str(org_context);
    prompt.push_str("\n=== END ORGANISATION CONTEXT ===\n");

    if !conversation_history.is_empty() {
        prompt.push_str(conversation_history);
    }

    prompt.push_str("\nRetrieved Context:\n");
    prompt.push_str(context);
    prompt.push_str("\n\nCurrent Question: ");
    prompt.push_str(question);

    let mut instructions = vec!["Answer using the retrieved context"];
    if !conversation_history.is_empty() {
        instructions[0] = "Answer using the retrieved context AND the conversation history";
        instructions.push("Be consistent with previous answers in this conversation");
    }
    instructions.push("Frame your response from the organisation's perspective");
    instructions.push("Be specific and cite sources when available");

    prompt.push_str("\n\nInstructions:\n");
    for (i, instruction) in instructions.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, instruction));
    }
    prompt.push_str("\nResponse:");

    prompt
}

/// Build the user prompt for a grant pitch answer
pub fn pitch_prompt(
    org_context: &str,
    project_block: &str,
    context: &str,
    grant_focus: &str,
    conversation_history: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("=== ORGANISATION CONTEXT ===\n");
    prompt.push_str(org_context);
    prompt.push_str("\n=== END ORGANISATION CONTEXT ===\n");

    if !conversation_history.is_empty() {
        prompt.push_str(conversation_history);
    }

    prompt.push_str("\nProject:\n");
    prompt.push_str(project_block);

    prompt.push_str("\n\nRetrieved Context:\n");
    prompt.push_str(context);

    prompt.push_str("\n\nGrant Focus: ");
    prompt.push_str(grant_focus);

    prompt.push_str(
        "\n\nWrite a concise grant pitch that connects the project above to the \
         grant focus, grounded in the retrieved context. Highlight measurable \
         outcomes and the organisation's capabilities.\n\nPitch:",
    );

    prompt
}

/// Build the generation prompt for a hypothetical project
pub fn project_generation_prompt(
    org_context: &str,
    grant_focus: &str,
    grant_requirements: &str,
) -> String {
    format!(
        "You are helping the organisation draft a project proposal for a \
         conservation grant.\n\n\
         GRANT FOCUS: {grant_focus}\n\n\
         GRANT REQUIREMENTS:\n{grant_requirements}\n\n\
         ORGANISATION CAPABILITIES:\n{org_context}\n\n\
         Generate a realistic, achievable project proposal that:\n\
         1. Directly addresses the grant's focus area\n\
         2. Uses the organisation's actual capabilities\n\
         3. Has measurable outcomes\n\
         4. Is achievable within 1-2 years\n\n\
         Output as JSON (no markdown, just pure JSON):\n\
         {{\n  \"name\": \"Professional project name\",\n  \
         \"focus_areas\": [\"area1\", \"area2\"],\n  \
         \"target_species\": [\"species1\", \"species2\"],\n  \
         \"location\": \"Specific location or region\",\n  \
         \"description\": \"2-3 sentence project description\",\n  \
         \"methodology\": \"Brief methodology\",\n  \
         \"expected_outcomes\": [\"outcome1\", \"outcome2\", \"outcome3\"]\n\
         }}"
    )
}
