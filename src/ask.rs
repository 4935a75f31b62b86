//! `rag ask`: answer a question about one indexed document.

use anyhow::Result;

use readme_rag_core::answer::{answer_question, AskRequest};

use crate::config::Config;
use crate::services::Services;

pub async fn run_ask(
    config: &Config,
    question: &str,
    file_name: &str,
    top_k: Option<usize>,
    show_sources: bool,
) -> Result<()> {
    let services = Services::from_config(config).await?;

    let mut request = AskRequest::new(question, file_name);
    request.top_k = top_k.unwrap_or(config.index.top_k);

    let answer = answer_question(
        &request,
        services.embedder.as_ref(),
        services.index.as_ref(),
        services.generator.as_ref(),
    )
    .await?;

    println!("{}", answer.response.trim_end());

    if show_sources {
        println!();
        println!("sources ({}):", answer.sources.len());
        for m in &answer.sources {
            println!(
                "  {:.4}  {}#{}  {}",
                m.score, m.metadata.file_name, m.metadata.chunk_id, m.id
            );
        }
    }
    Ok(())
}
