//! Prompt templates and sampling settings for each post section.

use stackpost_shared::SectionKind;

/// Per-section sampling settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Drop the first generated line (the model tends to open with a heading).
    pub drop_first_line: bool,
}

/// Settings used when requesting `kind`.
pub fn settings(kind: SectionKind) -> SectionSettings {
    match kind {
        SectionKind::Title => SectionSettings {
            max_tokens: 100,
            temperature: 0.2,
            drop_first_line: false,
        },
        SectionKind::CommonErrors | SectionKind::ErrorBody => SectionSettings {
            max_tokens: 2500,
            temperature: 0.5,
            drop_first_line: true,
        },
        SectionKind::RecommendedSites => SectionSettings {
            max_tokens: 400,
            temperature: 0.5,
            drop_first_line: false,
        },
    }
}

/// Build the prompt for `kind`.
///
/// `subject` is the raw question title for [`SectionKind::Title`] and the
/// generated post title for every other section.
pub fn build_prompt(kind: SectionKind, subject: &str) -> String {
    match kind {
        SectionKind::Title => title_prompt(subject),
        SectionKind::CommonErrors => common_errors_prompt(subject),
        SectionKind::ErrorBody => error_body_prompt(subject),
        SectionKind::RecommendedSites => recommended_sites_prompt(subject),
    }
}

fn title_prompt(question: &str) -> String {
    format!(
        "{question} is about an error in \"https://stackoverflow.com/\".\n\
         Read it and replace it with the appropriate title.\n\
         Do not use like \"Blog title: \", just give me a title\n"
    )
}

fn common_errors_prompt(title: &str) -> String {
    format!(
        "{title} is a question about what error.\n\
         Write a subheading at the top for what you're going to write about.\n\
         Generate an article about {title}, but do not include any conclusions or summaries in your response.\n\
         Please stop generating text when you encounter the words \"Conclusion\" or \"Summary\" or \"In conclusion\" or \"In summary\".\n\
         Write down at least two common mistakes or why you're getting these errors.\n\
         Use Highlight, Bold, Italic and Apostrophe for Emphasis to keywords.\n\
         Put the javascript or typescript code to make it easier to understand in the middle of the description.\n\
         And explain each example in code as long as possible.\n\
         Write that code using language with related to error.\n\
         Make it at least 10 paragraphs long, the average person would have to read for 20 minutes.\n\
         The people reading this are developers in their 20s and 30s, so we need to explain it with code based.\n\
         All posts should be written in markdown format.\n"
    )
}

fn error_body_prompt(title: &str) -> String {
    format!(
        "I need a error handling blog post.\n\
         {title} is the title of the question about what error.\n\
         Skip the title and go straight to the body of the post.\n\
         Use Highlight, Bold, Italic and Apostrophe for Emphasis to keywords.\n\
         When it comes to this error, Write in such detail that people will see this and all the errors will be resolved.\n\
         Write a step-by-step solution to this error.\n\
         Put the javascript or typescript code to make it easier to understand in the middle of the description.\n\
         And explain each example in code as long as possible.\n\
         The people reading this are developers in their 20s and 30s, so we need to explain it with code based.\n\
         Make it at least 20 paragraphs long, the average person would have to read for 35 minutes.\n\
         All posts should be written in markdown format.\n"
    )
}

fn recommended_sites_prompt(title: &str) -> String {
    format!(
        "Recommend a few official sites to read about {title}.\n\
         At the top, write the title \"Recommended sites\".\n\
         Write it in MD format, leaving only the URL address.\n\
         Refer users to sites that don't have 404 errors when they visit. A site that is actually usable.\n"
    )
}
