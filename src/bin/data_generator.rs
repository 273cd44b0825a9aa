//! Writes a synthetic superstore CSV for benchmarks and demos.
//!
//! Usage: `data_generator [OUTPUT] [ROWS]` (defaults: `data/superstore_synthetic.csv`,
//! 1_000_000 rows).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use rand::Rng;

const CATEGORIES: [(&str, &[&str]); 3] = [
    ("Furniture", &["Chair", "Bookcase", "Table", "Furnishings"]),
    ("Office Supplies", &["Binder", "Paper", "Storage", "Art", "Labels"]),
    ("Technology", &["Phone", "Copier", "Accessory", "Machine"]),
];
const BRANDS: [&str; 8] = [
    "Acme", "Hon", "Avery", "Xerox", "Canon", "Logitech", "Bush", "Staples",
];
const YEARS: std::ops::RangeInclusive<i64> = 2014..=2017;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let path = PathBuf::from(
        args.next()
            .unwrap_or_else(|| "data/superstore_synthetic.csv".to_string()),
    );
    let rows: usize = match args.next() {
        Some(n) => n.parse().context("ROWS must be a positive integer")?,
        None => 1_000_000,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "Year,Category,Product Name,Sales,Profit,Order ID,Days to ship")?;

    let mut rng = rand::rng();
    let mut order = 0usize;
    for i in 0..rows {
        // Orders span one to three lines
        if i == 0 || rng.random_range(0..3) == 0 {
            order += 1;
        }
        let year = rng.random_range(YEARS);
        let (category, kinds) = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
        let kind = kinds[rng.random_range(0..kinds.len())];
        let brand = BRANDS[rng.random_range(0..BRANDS.len())];
        let model = rng.random_range(100..1000);
        let sales: f64 = rng.random_range(1.0..2500.0);
        let margin: f64 = rng.random_range(-0.5..0.5);

        // Every fifth product name carries a comma and quotes to exercise quoting
        let name = if model % 5 == 0 {
            format!("\"{brand} {kind} {model}, \"\"Deluxe\"\"\"")
        } else {
            format!("{brand} {kind} {model}")
        };

        writeln!(
            writer,
            "{year},{category},{name},{sales:.2},{:.4},CA-{year}-{order:07},{}",
            sales * margin,
            rng.random_range(0..8)
        )?;
    }
    writer.flush()?;

    println!("Sample CSV generated: {} ({rows} rows)", path.display());
    Ok(())
}
