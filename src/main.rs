#![allow(clippy::result_large_err)]

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::fs::File;
use std::path::PathBuf;
use taxbill::{
    config::{database, settings},
    core::{
        direction::{Direction, DirectionFilter},
        export, import, invoice, line_item, report, sequence,
    },
    errors::Result,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Tax invoice bookkeeping: imports, numbering and supply reports.
#[derive(Parser, Debug)]
#[command(name = "taxbill", version, about)]
struct Cli {
    /// Settings file with line-item defaults
    #[arg(long, global = true, default_value = settings::DEFAULT_SETTINGS_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database schema.
    Init,
    /// Import outward invoices from a CSV file.
    Import {
        #[arg(long)]
        business_id: i64,
        #[arg(long)]
        file: PathBuf,
    },
    /// Suggest the next invoice number for the current fiscal year.
    NextNumber {
        #[arg(long)]
        business_id: i64,
        #[arg(long, default_value = "outward")]
        direction: Direction,
    },
    /// Print an invoice's totals.
    Summary {
        #[arg(long)]
        invoice_id: i64,
    },
    /// Write one CSV report per business.
    Report {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: String,
        /// outward, inward or both
        #[arg(long, default_value = "both")]
        direction: DirectionFilter,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Line-item defaults
    let settings = settings::load_settings_or_default(&cli.config)
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Database
    let database_url = database::get_database_url()
        .inspect_err(|e| error!("Invalid DATABASE_URL: {}", e))?;
    database::ensure_sqlite_directory(&database_url)?;
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    match cli.command {
        Commands::Init => {
            info!("Database schema ready at {}", database_url);
        }
        Commands::Import { business_id, file } => {
            let reader = File::open(&file)?;
            let summary =
                import::import_csv(&db, business_id, reader, &settings.defaults).await?;
            println!(
                "Created {} invoice(s) with {} line item(s)",
                summary.invoices_created, summary.line_items_created
            );
            for message in &summary.errors {
                println!("  {message}");
            }
        }
        Commands::NextNumber {
            business_id,
            direction,
        } => {
            let next = sequence::next_invoice_number(&db, business_id, direction).await?;
            println!("{next}");
        }
        Commands::Summary { invoice_id } => {
            let summary = invoice::get_invoice_summary(&db, invoice_id).await?;
            println!("Invoice {}", summary.invoice_number);
            println!("  Items:              {}", summary.total_items);
            println!("  Amount without tax: {}", summary.amount_without_tax);
            println!("  Origin tax:         {}", summary.origin_tax);
            println!("  Destination tax:    {}", summary.destination_tax);
            println!("  Cross tax:          {}", summary.cross_tax);
            println!("  Total tax:          {}", summary.total_tax);
            println!("  Total:              {}", summary.total_amount);
            println!("  Round off:          {}", summary.round_off);
            println!("  Rounded total:      {}", summary.rounded_total);

            for item in line_item::get_line_items_for_invoice(&db, invoice_id).await? {
                let unit = item.unit()?;
                let grams = match (item.quantity_in_grams()?, item.rate_per_gram()?) {
                    (Some(quantity), Some(rate)) => format!(" ({quantity} g at {rate} / g)"),
                    _ => String::new(),
                };
                println!(
                    "  - {}: {} at {}{}",
                    item.product_name,
                    unit.quantity_label(*item.quantity),
                    unit.rate_label(*item.rate),
                    grams
                );
            }
        }
        Commands::Report {
            start,
            end,
            direction,
            out,
        } => {
            let (start, end) = report::parse_date_range(&start, &end)?;
            let sections = report::generate_report(&db, start, end, direction).await?;
            if sections.is_empty() {
                warn!("No invoices found between {} and {}", start, end);
                return Ok(());
            }

            std::fs::create_dir_all(&out)?;
            let file_name = export::report_file_name(start, end);
            for business_sections in sections.chunk_by(|a, b| a.business_id == b.business_id) {
                let Some(first) = business_sections.first() else {
                    continue;
                };
                let sheet = export::sheet_name(&first.business_name).replace(['/', '\\'], "_");
                let path = out.join(format!("{sheet}_{file_name}"));
                export::write_business_sheet(File::create(&path)?, business_sections)?;
                info!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}

