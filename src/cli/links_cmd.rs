//! `sentra links`: scan a page for policy/terms links.

use crate::cli::load_page;
use crate::detect::links::scan_policy_links;
use anyhow::Result;

pub async fn run(source: &str, page_url: Option<&str>, json: bool) -> Result<()> {
    let page = load_page(source, page_url).await?;
    let links = scan_policy_links(&page);

    if json {
        println!("{}", serde_json::to_string_pretty(&links)?);
        return Ok(());
    }

    if links.is_empty() {
        println!("No policy links found.");
        return Ok(());
    }
    for link in &links {
        println!("  {}  {}", link.url, link.text);
    }
    Ok(())
}
