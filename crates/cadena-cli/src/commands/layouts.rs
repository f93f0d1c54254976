//! Channel layout listing command.

use cadena_core::{ChannelMap, STANDARD_LAYOUTS, Speaker};
use clap::Args;

#[derive(Args)]
pub struct LayoutsArgs {
    /// List speaker names and wave-extensible ids instead of layouts
    #[arg(long)]
    speakers: bool,

    /// Describe one channel map (name, speaker list, count or unknownN)
    #[arg(value_name = "MAP", conflicts_with = "speakers")]
    map: Option<String>,
}

pub fn run(args: LayoutsArgs) -> anyhow::Result<()> {
    if let Some(text) = &args.map {
        let map: ChannelMap = text.parse()?;
        println!("{map}");
        println!("  speakers:  {}", map.to_human_string());
        println!("  channels:  {}", map.len());
        match map.waveext_mask() {
            Some(mask) => println!("  waveext:   0x{mask:x}"),
            None => println!("  waveext:   no"),
        }
        println!(
            "  order:     {}",
            if map.is_waveext_order() {
                "wave-extensible"
            } else {
                "custom"
            }
        );
        return Ok(());
    }

    if args.speakers {
        println!("Speakers");
        println!("========");
        println!();
        for speaker in Speaker::ALL {
            println!(
                "  {:3}  {:5}  {}",
                speaker.id(),
                speaker.short_name(),
                speaker.long_name()
            );
        }
        return Ok(());
    }

    println!("Standard Layouts");
    println!("================");
    println!();
    for (name, speakers) in STANDARD_LAYOUTS.iter().skip(1) {
        let count = if speakers.is_empty() {
            0
        } else {
            speakers.split('-').count()
        };
        println!("  {name:12} {count}ch  {speakers}");
    }
    println!();
    println!("Layouts may also be written as speaker lists (fl-fr-lfe),");
    println!("channel counts (6) or unknownN.");
    Ok(())
}
