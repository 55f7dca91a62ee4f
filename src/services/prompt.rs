//! Prompt construction for recipe assembly and translation.

use crate::recipe::Locale;

pub const SYSTEM_PROMPT: &str =
    "You turn cooking videos into clear recipes. Follow the formatting rules exactly.";

pub fn build_assembly_prompt(description: &str, transcript: &str, locale: Locale) -> String {
    format!(
        "Your task is to assemble a recipe given the following description and transcription of a short video.
Description: {description}
Transcription: {transcript}

Use the following template
<Recipe Title>
<Ingredients>
<Instructions>
with appropriate formatting.

Given those, please provide a concise step-by-step recipe with a title, ingredients, and instructions in {language}.
The recipe should be generic, with no hashtags, mentions, or other social media-specific content.

Use Telegram-compliant HTML formatting. Only use options from this ruleset:
<b>bold</b>
<i>italic</i>
<u>underline</u>
<s>strikethrough</s>

DO NOT USE ANY TAGS OTHER THAN THOSE LISTED ABOVE.
DO NOT USE ANY OTHER FORMATTING.
YOU CAN USE EMOJI.
USE DASHES (-) FOR LISTS INSTEAD OF <ul> TAGS.",
        language = locale.english_name(),
    )
}

pub fn build_translation_prompt(recipe: &str, from: Locale, to: Locale) -> String {
    format!(
        "This is a generated recipe written in {from}. Please translate it to {to} and send back only the translation.
Preserve the formatting, HTML tags, emoji and structure.

{recipe}",
        from = from.english_name(),
        to = to.english_name(),
    )
}

/// Strips a surrounding Markdown code fence some models wrap HTML in.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
