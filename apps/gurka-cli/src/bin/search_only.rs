use std::env;
use gurka_core::config::Config;
use gurka_text::ReportSearchEngine;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <product> <query>", args[0]);
        eprintln!("Example: {} Shop '@smoke'", args[0]);
        std::process::exit(1);
    }
    let product = &args[1];
    let query_text = args[2..].join(" ");
    let config = Config::load()?;
    let engine = ReportSearchEngine::from_config(&config)?;
    println!("🔍 gurka-search\n==============");
    println!("Product: {}", product); println!("Query: {}", query_text); println!("Index root: {}", config.index_dir().display());
    let response = engine.search(product, &query_text);
    println!("\n🔍 Found {} results for: \"{}\"", response.results.len(), query_text);
    for (i, result) in response.results.iter().enumerate() {
        println!("\n  {}. score={:.4}  type={}  matched={}  file={}", i + 1, result.score, result.doc_type, result.matched_field, result.file_name);
        println!("     {}", result.title);
        if let Some(status) = &result.status { println!("     status: {}", status); }
        if !result.tags.is_empty() { println!("     tags: {}", result.tags.join(" ")); }
        if let Some(parent) = &result.parent_feature_name { println!("     feature: {}", parent); }
        println!("     📝 {}", result.content.lines().next().unwrap_or_default());
    }
    match response.first_feature_id {
        Some(id) => println!("\nFirst feature: {}", id),
        None => println!("\nFirst feature: none"),
    }
    Ok(())
}
