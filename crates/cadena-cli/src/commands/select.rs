//! Channel map selection command.

use cadena_config::parse_layout_list;
use cadena_core::{ChannelMap, ChannelMapSelector};
use clap::Args;

#[derive(Args)]
pub struct SelectArgs {
    /// Channel map the source produces
    #[arg(value_name = "MAP")]
    map: String,

    /// Comma separated layouts the sink accepts
    #[arg(short, long, value_name = "LAYOUTS")]
    allow: Option<String>,

    /// Accept any layout
    #[arg(long)]
    any: bool,

    /// Accept any layout in wave-extensible order
    #[arg(long)]
    waveext: bool,

    /// Accept the default layouts for 1 to 8 channels
    #[arg(long)]
    defaults: bool,

    /// Pick a layout with this many channels (for sinks that only report a count)
    #[arg(long, value_name = "N")]
    channels: Option<usize>,
}

pub fn run(args: SelectArgs) -> anyhow::Result<()> {
    let map: ChannelMap = args.map.parse()?;

    let mut selector = ChannelMapSelector::new();
    if args.any {
        selector.allow_any();
    }
    if args.waveext {
        selector.allow_waveext();
    }
    if args.defaults {
        selector.allow_waveext_defaults();
    }
    if let Some(list) = &args.allow {
        for allowed in parse_layout_list(list)? {
            selector.add_map(&allowed);
        }
    }

    let picked = match args.channels {
        Some(count) => selector.default_for(&map, count),
        None => selector.adjust(&map),
    };
    let Some(picked) = picked else {
        anyhow::bail!("No acceptable layout for {map}");
    };

    tracing::debug!("select: {map} -> {picked}");
    if picked == map {
        println!("{picked} (accepted)");
    } else {
        println!("{picked}");
    }
    Ok(())
}
