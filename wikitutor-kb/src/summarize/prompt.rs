//! Summary prompt construction

use crate::schema::Level;

/// Reader-specific rewriting instruction for one level
pub fn level_instruction(level: Level) -> &'static str {
    match level {
        Level::Basic => {
            "Rewrite the text so that young learners in grades 3-5 can easily read and \
             understand it. Use simple words, short sentences and clear explanations. Replace \
             difficult words with familiar ones and break complex ideas into small, engaging \
             steps, using relatable examples or comparisons where they help. Keep it short."
        }
        Level::Intermediate => {
            "Rewrite the text for high school students (grades 9-12). Keep the key ideas and \
             important details, but simplify highly technical terms and complex sentence \
             structures. Assume some background knowledge while still explaining advanced \
             concepts clearly, in a conversational yet informative tone."
        }
        Level::Advanced => {
            "Summarize the text for readers at the master's degree level. Maintain academic \
             rigor while staying clear and concise. Preserve complex terminology, explain it \
             precisely where needed, and focus on deeper insights, nuanced interpretations and \
             contextual significance in formal, structured language."
        }
    }
}

/// One combined prompt asking for every level at once as a JSON object
pub fn build_summary_prompt(text: &str) -> String {
    let mut prompt = String::from("Summarize this Wikipedia article at three levels:\n\n");

    for level in Level::ALL {
        prompt.push_str(&format!("{}: {}\n\n", capitalize(level.as_str()), level_instruction(level)));
    }

    prompt.push_str("Article:\n");
    prompt.push_str(text.trim());
    prompt.push_str(
        "\n\nReturn the summaries as a JSON object with \"basic\", \"intermediate\", and \
         \"advanced\" keys whose values are strings.\n\nDo not preamble.",
    );
    prompt
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
