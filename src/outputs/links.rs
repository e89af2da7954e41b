//! Side artifact: one fully-qualified source URL per record.

use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::Question;

/// Write each record's source link to `path`, one per line, in final
/// output order.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn save_links(questions: &[Question], path: &str) -> Result<(), Box<dyn Error>> {
    let mut contents = String::new();
    for question in questions {
        contents.push_str(&question.link);
        contents.push('\n');
    }

    fs::write(path, contents).await?;
    info!(count = questions.len(), "saved question links");
    Ok(())
}
