//! Markdown document rendering for the harvested questions.
//!
//! One section per record under a fixed document header. Records with an
//! empty title are skipped entirely (they carry no usable content), and the
//! comments block is gated behind the `-c` flag.

use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::Question;

const SEPARATOR: &str = "----------------------------------------";

/// Render the full document as a string.
pub fn questions_to_markdown(questions: &[Question], include_comments: bool) -> String {
    let mut md = String::new();
    md.push_str("# Exam Topics Questions\n\n");
    md.push_str("@thatonecodes\n\n");

    for question in questions {
        if question.title.is_empty() {
            continue;
        }

        md.push_str(&format!("## {}\n\n", question.title));
        md.push_str(&format!("{}\n\n", question.header));

        if !question.content.is_empty() {
            md.push_str(&format!("{}\n\n", question.content));
        }

        for choice in &question.choices {
            md.push_str(&format!("{choice}\n\n"));
        }

        md.push_str(&format!("**Answer: {}**\n\n", question.answer));
        md.push_str(&format!("**Timestamp: {}**\n\n", question.timestamp));
        md.push_str(&format!("[View on ExamTopics]({})\n\n", question.link));

        if include_comments {
            md.push_str(&format!("Comments: {}\n", question.comments));
        }

        md.push_str(&format!("{SEPARATOR}\n\n"));
    }

    md
}

/// Render and write the document to `path`. A write failure here is fatal
/// to the run.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn write_questions(
    questions: &[Question],
    path: &str,
    include_comments: bool,
) -> Result<(), Box<dyn Error>> {
    let md = questions_to_markdown(questions, include_comments);
    fs::write(path, md).await?;
    info!(count = questions.len(), "wrote Markdown document");
    Ok(())
}
