use std::{env, path::PathBuf};
use gurka_core::config::Config;
use gurka_core::discovery::{latest_run, unique_product_names};
use gurka_core::traits::ReportIndexer;
use gurka_text::TantivyReportIndexer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut reports_dir = None; let mut only_product: Option<String> = None;
    let mut i = 0; while i < args.len() { match args[i].as_str() {
        "--product" | "-p" => { if i + 1 < args.len() { only_product = Some(args[i + 1].clone()); i += 1; } else { eprintln!("Error: --product requires a name"); std::process::exit(1); } }
        _ if !args[i].starts_with('-') => reports_dir = Some(PathBuf::from(&args[i])),
        other => { eprintln!("Unknown flag: {}", other); std::process::exit(2); } } i += 1; }
    let reports_dir = reports_dir.unwrap_or_else(|| config.reports_dir());
    let index_root = config.index_dir();
    println!("Gurka report indexer\n====================");
    println!("Reports directory: {}", reports_dir.display()); println!("Index root: {}", index_root.display());
    let products = match only_product { Some(p) => vec![p], None => unique_product_names(&reports_dir) };
    if products.is_empty() { println!("No reports found."); return Ok(()); }
    let mut indexed = 0usize;
    for product in &products {
        let Some((report, run)) = latest_run(&reports_dir, product) else { warn!(product = %product, "no readable report"); continue; };
        let indexer = match TantivyReportIndexer::create_for_product(&index_root, product) {
            Ok(indexer) => indexer,
            Err(e) => { warn!(product = %product, error = %e, "skipping product"); continue; }
        };
        let count = indexer.index_testrun(&run, &report.file_name, product)?;
        info!(product = %product, report = %report.file_name, "product indexed");
        println!("📊 {}: {} documents from {} → {}", product, count, report.file_name, indexer.dir().display());
        indexed += 1;
    }
    println!("\n✅ Indexed {} of {} products", indexed, products.len());
    println!("💡 To search, use: cargo run --bin gurka-search '<product>' '<query>'");
    Ok(())
}
