use anyhow::Result;

use super::Context;

pub async fn list(ctx: &Context) -> Result<()> {
    let app = ctx.open().await?;
    let projects = app.store().preferences().recent_projects;
    if projects.is_empty() {
        println!("No recent projects.");
    }
    for (i, path) in projects.iter().enumerate() {
        println!("{:>2}. {}", i + 1, path);
    }
    Ok(())
}

pub async fn add(ctx: &Context, path: &str) -> Result<()> {
    let app = ctx.open().await?;
    app.store().add_recent_project(path);
    app.persist().await?;
    println!("Added {}", path);
    Ok(())
}
