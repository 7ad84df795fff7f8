//! Prompt builders for the form-filling oracle.

pub const FORM_SYSTEM: &str = "You are an expert assistant for completing job application forms. \
Your task is to analyze a form field and produce the most appropriate answer \
based on the applicant's information.";

/// Free-text field prompt: the answer is typed verbatim into the input.
pub fn build_text_prompt(context: &str, label: &str) -> String {
    format!(
        "Applicant information (JSON):\n{context}\n\n\
         Form field label: \"{label}\"\n\n\
         Rules:\n\
         - Reply with ONLY the value to type into the field, no explanation.\n\
         - If the field asks for a number (years, salary, quantity), reply with a plain number.\n\
         - If the applicant information does not cover the question, give a short, \
           safe, professional answer.\n\
         - Never reply with an empty string."
    )
}

/// Multiple-choice prompt: the answer must be one of the option values.
pub fn build_multiple_choice_prompt(context: &str, label: &str, options: &[String]) -> String {
    let listed = options
        .iter()
        .map(|o| format!("- {o}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Applicant information (JSON):\n{context}\n\n\
         Form field label: \"{label}\"\n\
         Available options:\n{listed}\n\n\
         Rules:\n\
         - Reply with EXACTLY one of the listed options, character for character.\n\
         - No explanation, no punctuation around the option.\n\
         - Pick the option that best matches the applicant's information; when in \
           doubt prefer the most employable answer."
    )
}
