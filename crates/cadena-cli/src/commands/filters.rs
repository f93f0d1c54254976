//! Filter listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use cadena_core::FilterFlags;
use cadena_registry::{DEFAULT_RESAMPLER, FilterCatalog, FilterCategory, FilterDescriptor};
use clap::Args;
use serde::Serialize;

#[derive(Args)]
pub struct FiltersArgs {
    /// Show details for a specific filter
    #[arg(value_name = "FILTER")]
    filter: Option<String>,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct FilterJson<'a> {
    name: &'a str,
    title: &'a str,
    category: &'a str,
    description: &'a str,
    params: &'a [&'a str],
    converts_formats: bool,
    once_per_chain: bool,
}

impl<'a> From<&'a FilterDescriptor> for FilterJson<'a> {
    fn from(d: &'a FilterDescriptor) -> Self {
        Self {
            name: d.name(),
            title: d.title,
            category: d.category.name(),
            description: d.info.description,
            params: d.params(),
            converts_formats: d.info.test_conversion.is_some(),
            once_per_chain: d.info.flags.contains(FilterFlags::NOT_REENTRANT),
        }
    }
}

pub fn run(args: FiltersArgs) -> anyhow::Result<()> {
    let catalog = FilterCatalog::new();

    if let Some(name) = &args.filter {
        let filter = catalog
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown filter: {}", name))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&FilterJson::from(filter))?);
        } else {
            print_details(filter);
        }
        return Ok(());
    }

    if args.json {
        let all: Vec<FilterJson> = catalog.all_filters().into_iter().map(Into::into).collect();
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    println!("Available Filters");
    println!("=================");
    for category in FilterCategory::ALL {
        let filters = catalog.filters_in_category(category);
        if filters.is_empty() {
            continue;
        }
        println!();
        println!("{}", category.name());
        for filter in filters {
            println!("  {:10} - {}", filter.name(), filter.info.description);
        }
    }
    println!();
    println!("Use 'cadena filters <name>' for parameter details.");
    Ok(())
}

fn print_details(filter: &FilterDescriptor) {
    println!("{} ({})", filter.name(), filter.title);
    println!("{}", "=".repeat(filter.name().len() + filter.title.len() + 3));
    println!();
    println!("{}", filter.info.description);
    println!();
    println!("Category: {}", filter.category.name());
    if filter.info.test_conversion.is_some() {
        println!("Inserted automatically for sample format conversions.");
    }
    if filter.name() == DEFAULT_RESAMPLER {
        println!("Inserted automatically for channel layout and rate changes.");
    }
    if filter.info.flags.contains(FilterFlags::NOT_REENTRANT) {
        println!("Only one instance is allowed per chain.");
    }
    println!();

    if filter.params().is_empty() {
        println!("No parameters.");
        println!();
        println!("Example usage:");
        println!();
        println!(
            "  cadena negotiate --input 48000:stereo:float --af {}",
            filter.name()
        );
        return;
    }

    println!("Parameters (in positional order):");
    println!();
    println!("  {:3}  {}", "#", "Name");
    println!("  {:3}  {}", "-", "----");
    for (i, param) in filter.params().iter().enumerate() {
        println!("  {:3}  {}", i + 1, param);
    }
    println!();
    println!("Example usage:");
    println!();
    println!(
        "  cadena negotiate --input 48000:stereo:float --af \"{}={}=<value>\"",
        filter.name(),
        filter.params()[0]
    );
}
