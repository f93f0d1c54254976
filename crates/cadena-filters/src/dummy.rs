//! Pass-through filter.

use cadena_core::{AudioFrame, Command, Filter, FilterError, FilterFlags, FilterInfo, FilterIo, Reply};

/// Registry entry for [`Dummy`].
pub const INFO: FilterInfo = FilterInfo {
    name: "dummy",
    description: "Passes audio through unchanged",
    flags: FilterFlags::NONE,
    params: &[],
    test_conversion: None,
};

/// Accepts any format, including passthrough, and forwards frames as-is.
#[derive(Debug, Default)]
pub struct Dummy;

impl Dummy {
    /// Creates the filter.
    pub fn new() -> Self {
        Self
    }
}

impl Filter for Dummy {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                io.set_output(*input);
                Reply::Ok
            }
            Command::Reset => Reply::Ok,
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(
        &mut self,
        io: &mut FilterIo,
        frame: Option<AudioFrame>,
    ) -> Result<(), FilterError> {
        if let Some(frame) = frame {
            io.push_output(frame);
        }
        Ok(())
    }
}
