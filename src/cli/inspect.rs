//! Tree and show commands - read-only repository inspection

use crate::cli::context::{CommandContext, RepoArgs};
use anstream::{print, println};
use draftsmith::error::{Error, Result};

/// List every file path on a branch
pub async fn run_tree(repo: &RepoArgs, base: Option<&str>) -> Result<()> {
    let ctx = CommandContext::new(repo).await?;
    let branch = ctx.base_branch(base);

    for path in ctx.platform.list_files(&branch).await? {
        println!("{path}");
    }
    Ok(())
}

/// Print a file's decoded content
pub async fn run_show(repo: &RepoArgs, path: &str, git_ref: Option<&str>) -> Result<()> {
    let ctx = CommandContext::new(repo).await?;
    let branch = ctx.base_branch(git_ref);

    let content = ctx
        .platform
        .read_file(&branch, path)
        .await?
        .ok_or_else(|| Error::NotFound {
            path: path.to_string(),
        })?;
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}
